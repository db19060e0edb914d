use std::process::{Command, Stdio};

use tracing::{info, warn};

/// Whether an optional external tool can be used in this environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Available,
    Unavailable(String),
}

impl Capability {
    /// Probe a CLI tool by running `<cmd> --version`.
    pub fn probe_command(cmd: &str) -> Self {
        let status = Command::new(cmd)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => {
                info!("Capability probe: {} available", cmd);
                Capability::Available
            }
            Ok(s) => {
                warn!("Capability probe: {} exited with {}", cmd, s);
                Capability::Unavailable(format!("{} exited with {}", cmd, s))
            }
            Err(e) => {
                warn!("Capability probe: {} not runnable: {}", cmd, e);
                Capability::Unavailable(format!("{} not runnable: {}", cmd, e))
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available)
    }
}
