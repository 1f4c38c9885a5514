pub mod allocation;
pub mod allocator;
pub mod allocator_config;
pub mod billing;
pub mod capacity_ledger;
pub mod problem;
pub mod reachability;
pub mod scheduler;
pub mod scoreboard;
pub mod utils;
pub mod visit_order;
