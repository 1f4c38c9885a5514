use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use crate::domain::problem::{CapacityTable, DemandMatrix, DemandRow, ProblemInstance, QosTable};
use crate::domain::utils::id::{ClientIndex, ClientTag, IdIndex, ServerIndex, ServerTag};
use crate::error::{Error, Result};

pub const DEMAND_FILE: &str = "demand.csv";
pub const BANDWIDTH_FILE: &str = "site_bandwidth.csv";
pub const QOS_FILE: &str = "qos.csv";
pub const CONFIG_FILE: &str = "config.ini";

const CONFIG_SECTION: &str = "config";
const QOS_CONSTRAINT_KEY: &str = "qos_constraint";

/// Raw demand table: client ids from the header and one row per timeslot.
#[derive(Debug, Clone)]
pub struct DemandCsv {
    pub clients: Vec<String>,
    pub rows: Vec<DemandRow>,
}

/// Raw QoS table: client ids from the header and one latency row per server.
#[derive(Debug, Clone)]
pub struct QosCsv {
    pub clients: Vec<String>,
    pub rows: Vec<(String, Vec<u32>)>,
}

/// Loads and validates all input tables from `data_dir`.
pub fn load_problem(data_dir: &Path) -> Result<ProblemInstance> {
    log::info!("Loading problem instance from '{}'.", data_dir.display());

    let demand = read_demand(open(data_dir, DEMAND_FILE)?, DEMAND_FILE)?;
    let bandwidth = read_bandwidth(open(data_dir, BANDWIDTH_FILE)?, BANDWIDTH_FILE)?;
    let qos = read_qos(open(data_dir, QOS_FILE)?, QOS_FILE)?;
    let qos_constraint = read_qos_constraint(BufReader::new(open(data_dir, CONFIG_FILE)?))?;

    let instance = assemble(demand, bandwidth, qos, qos_constraint)?;
    log::info!(
        "Loaded {} clients, {} servers, {} timeslots (QoS constraint {}).",
        instance.clients.len(),
        instance.servers.len(),
        instance.num_of_timeslots(),
        instance.qos_constraint
    );

    Ok(instance)
}

fn open(data_dir: &Path, file_name: &str) -> Result<File> {
    let path = data_dir.join(file_name);
    File::open(&path).map_err(|e| {
        log::error!("Cannot open '{}': {}", path.display(), e);
        Error::IoError(e)
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().trim(csv::Trim::All).flexible(true).from_reader(reader)
}

fn parse_cell<T: FromStr>(cell: &str, file: &str, row: usize, column: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    if cell.starts_with('-') {
        return Err(Error::MalformedCell { file: file.to_string(), row, message: format!("negative value '{}' in column '{}'", cell, column) });
    }

    cell.parse::<T>().map_err(|e| Error::MalformedCell { file: file.to_string(), row, message: format!("'{}' in column '{}': {}", cell, column, e) })
}

/// Header `<name>,<client ids...>`, rows `<timestamp>,<demand...>`.
pub fn read_demand<R: Read>(reader: R, file: &str) -> Result<DemandCsv> {
    let mut reader = csv_reader(reader);
    let clients: Vec<String> = reader.headers()?.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let row = row + 1;

        if record.len() != clients.len() + 1 {
            return Err(Error::InconsistentInput(format!(
                "'{}' row {} has {} demand values but the header names {} clients.",
                file,
                row,
                record.len().saturating_sub(1),
                clients.len()
            )));
        }

        let label = record.get(0).unwrap_or_default().to_string();
        let values =
            record.iter().skip(1).zip(&clients).map(|(cell, client)| parse_cell::<u64>(cell, file, row, client)).collect::<Result<Vec<u64>>>()?;

        rows.push(DemandRow::new(label, values));
    }

    Ok(DemandCsv { clients, rows })
}

/// Header `site_name,bandwidth`, rows `<server id>,<capacity>`.
pub fn read_bandwidth<R: Read>(reader: R, file: &str) -> Result<Vec<(String, u64)>> {
    let mut reader = csv_reader(reader);
    let mut servers = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let row = row + 1;

        match (record.get(0), record.get(1)) {
            (Some(server), Some(cell)) if record.len() == 2 => {
                let capacity = parse_cell::<u64>(cell, file, row, "bandwidth")?;
                if capacity == 0 {
                    log::warn!("Server '{}' has zero capacity and will never receive demand.", server);
                }
                servers.push((server.to_string(), capacity));
            }
            _ => {
                return Err(Error::MalformedCell {
                    file: file.to_string(),
                    row,
                    message: format!("expected '<server>,<bandwidth>', got {} fields", record.len()),
                });
            }
        }
    }

    Ok(servers)
}

/// Header `<name>,<client ids...>`, rows `<server id>,<latency...>`.
pub fn read_qos<R: Read>(reader: R, file: &str) -> Result<QosCsv> {
    let mut reader = csv_reader(reader);
    let clients: Vec<String> = reader.headers()?.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let row = row + 1;

        if record.len() != clients.len() + 1 {
            return Err(Error::InconsistentInput(format!(
                "'{}' row {} has {} latency values but the header names {} clients.",
                file,
                row,
                record.len().saturating_sub(1),
                clients.len()
            )));
        }

        let server = record.get(0).unwrap_or_default().to_string();
        let latencies =
            record.iter().skip(1).zip(&clients).map(|(cell, client)| parse_cell::<u32>(cell, file, row, client)).collect::<Result<Vec<u32>>>()?;

        rows.push((server, latencies));
    }

    Ok(QosCsv { clients, rows })
}

/// Reads `qos_constraint` from the `[config]` section of an ini file.
pub fn read_qos_constraint<R: BufRead>(reader: R) -> Result<u32> {
    let mut section = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            section = name.trim().to_string();
            continue;
        }

        if section != CONFIG_SECTION {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == QOS_CONSTRAINT_KEY {
                let value = value.trim();
                return value
                    .parse::<u32>()
                    .map_err(|e| Error::ConfigError(format!("Invalid {} '{}' in {}: {}", QOS_CONSTRAINT_KEY, value, CONFIG_FILE, e)));
            }
        }
    }

    Err(Error::ConfigError(format!("Missing '{}' in section [{}] of {}.", QOS_CONSTRAINT_KEY, CONFIG_SECTION, CONFIG_FILE)))
}

/// Interns ids and cross-checks the raw tables.
///
/// Clients are indexed in demand-header order, servers in bandwidth-file
/// order. QoS columns and rows may come in any order and are re-mapped.
pub fn assemble(demand: DemandCsv, bandwidth: Vec<(String, u64)>, qos: QosCsv, qos_constraint: u32) -> Result<ProblemInstance> {
    let clients: IdIndex<ClientTag> = IdIndex::from_ids(demand.clients)?;
    let servers: IdIndex<ServerTag> = IdIndex::from_ids(bandwidth.iter().map(|(server, _)| server.clone()))?;
    let capacity = CapacityTable::new(bandwidth.into_iter().map(|(_, capacity)| capacity).collect());

    // column_map[qos column] = client index
    let mut column_map = Vec::with_capacity(qos.clients.len());
    let mut client_seen = vec![false; clients.len()];
    for client in &qos.clients {
        match clients.index_of(client) {
            Some(index) if !client_seen[index.index] => {
                client_seen[index.index] = true;
                column_map.push(index.index);
            }
            Some(_) => return Err(Error::InconsistentInput(format!("Client '{}' appears twice in the {} header.", client, QOS_FILE))),
            None => return Err(Error::InconsistentInput(format!("Client '{}' in {} is not part of {}.", client, QOS_FILE, DEMAND_FILE))),
        }
    }
    if let Some(missing) = client_seen.iter().position(|seen| !seen) {
        return Err(Error::InconsistentInput(format!(
            "Client '{}' has demand but no column in {}.",
            clients.id_of(ClientIndex::new(missing)),
            QOS_FILE
        )));
    }

    let mut latency: Vec<Option<Vec<u32>>> = vec![None; servers.len()];
    for (server, row) in qos.rows {
        let index = servers
            .index_of(&server)
            .ok_or_else(|| Error::InconsistentInput(format!("Server '{}' in {} is not part of {}.", server, QOS_FILE, BANDWIDTH_FILE)))?;

        if latency[index.index].is_some() {
            return Err(Error::InconsistentInput(format!("Server '{}' appears twice in {}.", server, QOS_FILE)));
        }

        let mut mapped = vec![0; clients.len()];
        for (value, client) in row.into_iter().zip(&column_map) {
            mapped[*client] = value;
        }
        latency[index.index] = Some(mapped);
    }

    let mut qos_rows = Vec::with_capacity(servers.len());
    for (server, row) in latency.into_iter().enumerate() {
        match row {
            Some(row) => qos_rows.push(row),
            None => {
                return Err(Error::InconsistentInput(format!(
                    "Server '{}' has a capacity but no row in {}.",
                    servers.id_of(ServerIndex::new(server)),
                    QOS_FILE
                )));
            }
        }
    }

    ProblemInstance::new(clients, servers, DemandMatrix::new(demand.rows), capacity, QosTable::new(qos_rows), qos_constraint)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMAND: &str = "mtime,A,B\n2021-11-01T00:00,10,20\r\n2021-11-01T00:05,0,7\n";
    const BANDWIDTH: &str = "site_name,bandwidth\nS1,100\nS2,50\n";
    // Columns deliberately in a different order than the demand header.
    const QOS: &str = "site_name,B,A\nS2,5,5\nS1,20,5\n";
    const CONFIG: &str = "[config]\nqos_constraint=10\n";

    fn load(demand: &str, bandwidth: &str, qos: &str) -> Result<ProblemInstance> {
        assemble(
            read_demand(demand.as_bytes(), DEMAND_FILE)?,
            read_bandwidth(bandwidth.as_bytes(), BANDWIDTH_FILE)?,
            read_qos(qos.as_bytes(), QOS_FILE)?,
            read_qos_constraint(CONFIG.as_bytes())?,
        )
    }

    #[test]
    fn test_load_and_remap_qos_columns() {
        let instance = load(DEMAND, BANDWIDTH, QOS).unwrap();
        let (a, b) = (instance.clients.index_of("A").unwrap(), instance.clients.index_of("B").unwrap());
        let (s1, s2) = (instance.servers.index_of("S1").unwrap(), instance.servers.index_of("S2").unwrap());

        assert_eq!(instance.num_of_timeslots(), 2);
        assert_eq!(instance.demand.row(0).label, "2021-11-01T00:00");
        assert_eq!(instance.demand.row(0).get(b), 20);
        assert_eq!(instance.capacity.get(s2), 50);
        assert_eq!(instance.qos.latency(s1, b), 20);
        assert_eq!(instance.qos.latency(s1, a), 5);
        assert_eq!(instance.qos.latency(s2, ClientIndex::new(0)), 5);
        assert_eq!(instance.qos_constraint, 10);
        assert_eq!(s1, ServerIndex::new(0));
    }

    #[test]
    fn test_unknown_qos_client_is_rejected() {
        let qos = "site_name,B,C\nS2,5,5\nS1,20,5\n";
        assert!(matches!(load(DEMAND, BANDWIDTH, qos), Err(Error::InconsistentInput(_))));
    }

    #[test]
    fn test_missing_qos_server_is_rejected() {
        let qos = "site_name,B,A\nS2,5,5\n";
        assert!(matches!(load(DEMAND, BANDWIDTH, qos), Err(Error::InconsistentInput(_))));
    }

    #[test]
    fn test_unknown_qos_server_is_rejected() {
        let qos = "site_name,B,A\nS2,5,5\nS1,20,5\nS3,1,1\n";
        assert!(matches!(load(DEMAND, BANDWIDTH, qos), Err(Error::InconsistentInput(_))));
    }

    #[test]
    fn test_ragged_demand_row_is_rejected() {
        let demand = "mtime,A,B\n2021-11-01T00:00,10\n";
        assert!(matches!(read_demand(demand.as_bytes(), DEMAND_FILE), Err(Error::InconsistentInput(_))));
    }

    #[test]
    fn test_negative_capacity_is_rejected() {
        let bandwidth = "site_name,bandwidth\nS1,-100\n";
        assert!(matches!(read_bandwidth(bandwidth.as_bytes(), BANDWIDTH_FILE), Err(Error::MalformedCell { row: 1, .. })));
    }

    #[test]
    fn test_non_numeric_demand_is_rejected() {
        let demand = "mtime,A\n2021-11-01T00:00,ten\n";
        assert!(matches!(read_demand(demand.as_bytes(), DEMAND_FILE), Err(Error::MalformedCell { .. })));
    }

    #[test]
    fn test_qos_constraint_parsing() {
        assert_eq!(read_qos_constraint("; comment\n[config]\r\nqos_constraint = 400\r\n".as_bytes()).unwrap(), 400);
        assert!(matches!(read_qos_constraint("[config]\n".as_bytes()), Err(Error::ConfigError(_))));
        assert!(matches!(read_qos_constraint("[other]\nqos_constraint=4\n".as_bytes()), Err(Error::ConfigError(_))));
        assert!(matches!(read_qos_constraint("[config]\nqos_constraint=-4\n".as_bytes()), Err(Error::ConfigError(_))));
    }
}
