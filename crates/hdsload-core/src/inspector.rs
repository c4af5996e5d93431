//! Bootstrap inspection via the packager's `--inspect-bootstrap` mode.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::PollError;
use crate::services::RunTableInspector;

/// Runs `<packager> --inspect-bootstrap --input-file=<path>` and returns stdout.
#[derive(Debug, Clone)]
pub struct PackagerInspector {
    packager: String,
}

impl PackagerInspector {
    pub fn new(packager: impl Into<String>) -> Self {
        Self {
            packager: packager.into(),
        }
    }
}

impl RunTableInspector for PackagerInspector {
    fn inspect(&self, bootstrap_path: &Path) -> Result<String, PollError> {
        let output = Command::new(&self.packager)
            .arg("--inspect-bootstrap")
            .arg(format!("--input-file={}", bootstrap_path.display()))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| PollError::Inspect(format!("spawn {}: {}", self.packager, e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PollError::Inspect(format!(
                "{} exited with {} for {}: {}",
                self.packager,
                output.status,
                bootstrap_path.display(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
