use serde::{Deserialize, Serialize};

use crate::domain::allocator_config::{AllocatorConfig, DEFAULT_HEAVY_USE_FRACTION, DEFAULT_SLICE, SliceStrategy, TieBreak};
use crate::domain::billing::{PercentileRule, Rounding};
use crate::domain::visit_order::VisitOrderKind;

/// Optional tuning file. Every field may be omitted.
#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TuningDto {
    pub slice: Option<SliceDto>,
    pub heavy_use_fraction: Option<f64>,
    pub heavy_bandwidth_threshold: Option<u64>,
    pub tie_break: Option<TieBreakDto>,
    pub visit_order: Option<VisitOrderDto>,
    pub seed: Option<u64>,
    pub billing: Option<BillingDto>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum SliceDto {
    Fixed { size: u64 },
    Adaptive,
}

#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TieBreakDto {
    LowestIndex,
    HighestIndex,
}

#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VisitOrderDto {
    Chronological,
    DescendingDemand,
    Shuffled,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingDto {
    pub percentile: f64,
    pub rounding: RoundingDto,
}

#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RoundingDto {
    Ceil,
    Floor,
}

impl TuningDto {
    pub fn allocator_config(&self) -> AllocatorConfig {
        AllocatorConfig {
            slice: match self.slice {
                Some(SliceDto::Fixed { size }) => SliceStrategy::Fixed(size),
                Some(SliceDto::Adaptive) => SliceStrategy::Adaptive,
                None => SliceStrategy::Fixed(DEFAULT_SLICE),
            },
            heavy_use_fraction: self.heavy_use_fraction.unwrap_or(DEFAULT_HEAVY_USE_FRACTION),
            heavy_bandwidth_threshold: self.heavy_bandwidth_threshold.unwrap_or(0),
            tie_break: match self.tie_break {
                Some(TieBreakDto::HighestIndex) => TieBreak::HighestIndex,
                Some(TieBreakDto::LowestIndex) | None => TieBreak::LowestIndex,
            },
        }
    }

    /// A shuffled order without a seed uses seed 0, never an unseeded source.
    pub fn visit_order(&self) -> VisitOrderKind {
        match self.visit_order {
            Some(VisitOrderDto::DescendingDemand) => VisitOrderKind::DescendingDemand,
            Some(VisitOrderDto::Shuffled) => VisitOrderKind::Shuffled { seed: self.seed.unwrap_or(0) },
            Some(VisitOrderDto::Chronological) | None => VisitOrderKind::Chronological,
        }
    }

    pub fn percentile_rule(&self) -> PercentileRule {
        match &self.billing {
            Some(billing) => PercentileRule {
                percentile: billing.percentile,
                rounding: match billing.rounding {
                    RoundingDto::Ceil => Rounding::Ceil,
                    RoundingDto::Floor => Rounding::Floor,
                },
            },
            None => PercentileRule::default(),
        }
    }
}
