//! Resident memory of the current process from `/proc/self/status`.

use std::path::PathBuf;

use cap_std::{ambient_authority, fs::Dir};

use crate::domain::ports::{MemoryUsageProbe, SystemUsageError};

const STATUS_FILE: &str = "status";
const RSS_FIELD: &str = "VmRSS:";

/// Parses `VmRSS` out of a procfs status file.
#[derive(Debug, Clone)]
pub struct ProcMemoryProbe {
    proc_dir: PathBuf,
}

impl Default for ProcMemoryProbe {
    fn default() -> Self {
        Self::new("/proc/self")
    }
}

impl ProcMemoryProbe {
    /// Probe reading `<proc_dir>/status`.
    pub fn new(proc_dir: impl Into<PathBuf>) -> Self {
        Self {
            proc_dir: proc_dir.into(),
        }
    }
}

/// Resident set size in bytes from the text of a procfs status file.
fn parse_resident_bytes(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with(RSS_FIELD))?;
    let mut parts = line[RSS_FIELD.len()..].split_whitespace();
    let value: u64 = parts.next()?.parse().ok()?;
    match parts.next() {
        Some("kB") => value.checked_mul(1024),
        None => Some(value),
        Some(_) => None,
    }
}

impl MemoryUsageProbe for ProcMemoryProbe {
    fn resident_bytes(&self) -> Result<u64, SystemUsageError> {
        let status = Dir::open_ambient_dir(&self.proc_dir, ambient_authority())
            .and_then(|dir| dir.read_to_string(STATUS_FILE))
            .map_err(|error| SystemUsageError::unavailable(error.to_string()))?;
        parse_resident_bytes(&status)
            .ok_or_else(|| SystemUsageError::unavailable("VmRSS missing from process status"))
    }
}
