use crate::domain::utils::id::{ClientIndex, ClientTag, IdIndex, ServerIndex, ServerTag};
use crate::error::{Error, Result};

/// One timeslot of the demand history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandRow {
    /// Opaque timestamp label from the input.
    pub label: String,
    /// Demand per client, indexed by `ClientIndex`.
    pub values: Vec<u64>,
}

impl DemandRow {
    pub fn new(label: impl Into<String>, values: Vec<u64>) -> Self {
        DemandRow { label: label.into(), values }
    }

    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }

    pub fn get(&self, client: ClientIndex) -> u64 {
        self.values[client.index]
    }
}

/// Demand per (timeslot, client), rows in original temporal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemandMatrix {
    rows: Vec<DemandRow>,
}

impl DemandMatrix {
    pub fn new(rows: Vec<DemandRow>) -> Self {
        DemandMatrix { rows }
    }

    pub fn num_of_timeslots(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, timeslot: usize) -> &DemandRow {
        &self.rows[timeslot]
    }

    pub fn rows(&self) -> &[DemandRow] {
        &self.rows
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(DemandRow::total).sum()
    }
}

/// Static per-server capacity, indexed by `ServerIndex`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacityTable {
    capacities: Vec<u64>,
}

impl CapacityTable {
    pub fn new(capacities: Vec<u64>) -> Self {
        CapacityTable { capacities }
    }

    pub fn get(&self, server: ServerIndex) -> u64 {
        self.capacities[server.index]
    }

    pub fn len(&self) -> usize {
        self.capacities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capacities.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.capacities
    }
}

/// Latency per (server, client).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QosTable {
    /// `latency[server][client]`
    latency: Vec<Vec<u32>>,
}

impl QosTable {
    pub fn new(latency: Vec<Vec<u32>>) -> Self {
        QosTable { latency }
    }

    pub fn latency(&self, server: ServerIndex, client: ClientIndex) -> u32 {
        self.latency[server.index][client.index]
    }

    pub fn num_of_servers(&self) -> usize {
        self.latency.len()
    }
}

/// The immutable input of a scheduling run.
///
/// Constructed only through [`ProblemInstance::new`], which checks that every
/// table agrees on the client and server sets. The core never sees tables
/// that fail this check.
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    pub clients: IdIndex<ClientTag>,
    pub servers: IdIndex<ServerTag>,
    pub demand: DemandMatrix,
    pub capacity: CapacityTable,
    pub qos: QosTable,
    pub qos_constraint: u32,
}

impl ProblemInstance {
    pub fn new(
        clients: IdIndex<ClientTag>,
        servers: IdIndex<ServerTag>,
        demand: DemandMatrix,
        capacity: CapacityTable,
        qos: QosTable,
        qos_constraint: u32,
    ) -> Result<Self> {
        if capacity.len() != servers.len() {
            return Err(Error::InconsistentInput(format!(
                "Capacity table has {} entries but {} servers are known.",
                capacity.len(),
                servers.len()
            )));
        }

        if qos.num_of_servers() != servers.len() {
            return Err(Error::InconsistentInput(format!("QoS table has {} rows but {} servers are known.", qos.num_of_servers(), servers.len())));
        }

        for (server, row) in qos.latency.iter().enumerate() {
            if row.len() != clients.len() {
                return Err(Error::InconsistentInput(format!(
                    "QoS row of server '{}' has {} columns but {} clients are known.",
                    servers.id_of(ServerIndex::new(server)),
                    row.len(),
                    clients.len()
                )));
            }
        }

        for (timeslot, row) in demand.rows().iter().enumerate() {
            if row.values.len() != clients.len() {
                return Err(Error::InconsistentInput(format!(
                    "Demand timeslot {} ('{}') has {} columns but {} clients are known.",
                    timeslot,
                    row.label,
                    row.values.len(),
                    clients.len()
                )));
            }
        }

        Ok(ProblemInstance { clients, servers, demand, capacity, qos, qos_constraint })
    }

    pub fn num_of_timeslots(&self) -> usize {
        self.demand.num_of_timeslots()
    }
}
