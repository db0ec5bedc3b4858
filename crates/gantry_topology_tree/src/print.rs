//! Human-readable rendering of topology snapshots.

use std::fmt::Write;

use gantry_hostlist::HostSet;
use gantry_topology_types::{TopologyError, TopologyRecord, TopologySnapshot};
use tracing::error;

#[cfg(test)]
#[path = "print_test.rs"]
mod print_test;

/// Environment variable limiting the rendered line length.
pub const TOPO_LEN_ENV: &str = "SLURM_TOPO_LEN";

/// Renders snapshot records one line per switch, with optional filtering by
/// switch name and node membership. The line-length limit is resolved once
/// at construction.
#[derive(Clone, Debug, Default)]
pub struct TopologyPrinter {
    max_line_len: Option<usize>,
}

impl TopologyPrinter {
    pub fn new(max_line_len: Option<usize>) -> Self {
        Self { max_line_len }
    }

    /// Reads the line-length limit from `SLURM_TOPO_LEN`. Values that do not
    /// parse as an unsigned integer disable truncation.
    pub fn from_env() -> Self {
        Self::new(std::env::var(TOPO_LEN_ENV).ok().and_then(|value| value.parse().ok()))
    }

    /// Renders the records of `snapshot` that pass the filters. A record
    /// matches when its name equals `unit` (if given) and its node set
    /// contains every node of `nodes_list` (if given). Zero matches logs a
    /// descriptive error but still succeeds with empty output.
    pub fn print(
        &self,
        snapshot: &TopologySnapshot,
        nodes_list: Option<&str>,
        unit: Option<&str>,
    ) -> Result<String, TopologyError> {
        let nodes_list = nodes_list.filter(|list| !list.is_empty());
        let unit = unit.filter(|name| !name.is_empty());
        let mut out = String::new();

        if nodes_list.is_none() && unit.is_none() {
            if snapshot.records.is_empty() {
                error!("No topology information available");
                return Ok(out);
            }
            for record in &snapshot.records {
                self.print_record(record, &mut out);
            }
            return Ok(out);
        }

        // Search for matching switch name and node names.
        let mut match_count = 0usize;
        for record in &snapshot.records {
            if let Some(unit) = unit {
                if record.name != unit {
                    continue;
                }
            }
            if let Some(nodes_list) = nodes_list {
                if record.nodes.is_empty() {
                    continue;
                }
                let members = HostSet::from_expr(&record.nodes)?;
                if !members.contains_all(nodes_list)? {
                    continue;
                }
            }
            match_count += 1;
            self.print_record(record, &mut out);
        }

        if match_count == 0 {
            error!(
                "Topology information contains no switch{}{}",
                unit.map(|name| format!(" named {name}")).unwrap_or_default(),
                nodes_list.map(|list| format!(" with nodes {list}")).unwrap_or_default(),
            );
        }
        Ok(out)
    }

    fn print_record(&self, record: &TopologyRecord, out: &mut String) {
        let mut line = format!(
            "SwitchName={} Level={} LinkSpeed={}",
            record.name, record.level, record.link_speed
        );
        if !record.nodes.is_empty() {
            let _ = write!(line, " Nodes={}", record.nodes);
        }
        if !record.switches.is_empty() {
            let _ = write!(line, " Switches={}", record.switches);
        }
        if let Some(max) = self.max_line_len {
            if let Some((cut, _)) = line.char_indices().nth(max) {
                line.truncate(cut);
            }
        }
        out.push_str(&line);
        out.push('\n');
    }
}
