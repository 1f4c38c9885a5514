use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::allocation::AllocationMatrix;
use crate::domain::problem::ProblemInstance;
use crate::error::Result;

/// Writes the allocation in the `<client>:<server,bw>,<server,bw>` line
/// format, one line per (timeslot, client).
///
/// Timeslots appear in original order, clients and servers sorted by id.
/// Lines are separated by `\n` without a trailing newline.
pub fn write_solution<W: Write>(writer: &mut W, instance: &ProblemInstance, allocation: &AllocationMatrix) -> Result<()> {
    let mut first_line = true;

    for timeslot in allocation.timeslots() {
        for &client in instance.clients.sorted_by_id() {
            if !first_line {
                writeln!(writer)?;
            }
            first_line = false;

            write!(writer, "{}:", instance.clients.id_of(client))?;

            let grants = timeslot.grants(client);
            let mut first_grant = true;
            for &server in instance.servers.sorted_by_id() {
                let Some(bandwidth) = grants.get(&server) else {
                    continue;
                };
                if !first_grant {
                    write!(writer, ",")?;
                }
                first_grant = false;
                write!(writer, "<{},{}>", instance.servers.id_of(server), bandwidth)?;
            }
        }
    }

    Ok(())
}

pub fn write_solution_file(path: &Path, instance: &ProblemInstance, allocation: &AllocationMatrix) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    write_solution(&mut writer, instance, allocation)?;
    writer.flush()?;

    log::info!("Wrote solution for {} timeslots to '{}'.", allocation.len(), path.display());
    Ok(())
}

/// Renders the solution into a string.
pub fn render_solution(instance: &ProblemInstance, allocation: &AllocationMatrix) -> Result<String> {
    let mut buffer = Vec::new();
    write_solution(&mut buffer, instance, allocation)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
