use crate::domain::problem::QosTable;
use crate::domain::utils::id::{ClientIndex, ServerIndex};

/// For each client, the servers whose latency is strictly below the QoS
/// constraint. Built once per run, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityTable {
    /// `reachable[client]`, servers in ascending index order.
    reachable: Vec<Vec<ServerIndex>>,
}

impl ReachabilityTable {
    pub fn build(qos: &QosTable, num_of_clients: usize, qos_constraint: u32) -> Self {
        let mut reachable = vec![Vec::new(); num_of_clients];

        for server in 0..qos.num_of_servers() {
            let server = ServerIndex::new(server);
            for (client, servers) in reachable.iter_mut().enumerate() {
                if qos.latency(server, ClientIndex::new(client)) < qos_constraint {
                    servers.push(server);
                }
            }
        }

        ReachabilityTable { reachable }
    }

    pub fn reachable(&self, client: ClientIndex) -> &[ServerIndex] {
        &self.reachable[client.index]
    }

    pub fn is_reachable(&self, client: ClientIndex, server: ServerIndex) -> bool {
        self.reachable[client.index].binary_search(&server).is_ok()
    }

    /// Clients without a single eligible server.
    pub fn isolated_clients(&self) -> impl Iterator<Item = ClientIndex> + '_ {
        self.reachable.iter().enumerate().filter(|(_, servers)| servers.is_empty()).map(|(client, _)| ClientIndex::new(client))
    }
}
