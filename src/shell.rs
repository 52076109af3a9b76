/* src/shell.rs */

// Shell helper for invoking the framework build command.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::ui::{self, DIM, RESET};

/// Run a shell command, bail on failure (shows both stdout and stderr on error).
pub(crate) fn run_command(base_dir: &Path, command: &str, label: &str) -> Result<()> {
  ui::detail(&format!("{DIM}{command}{RESET}"));
  let output = Command::new("sh")
    .args(["-c", command])
    .current_dir(base_dir)
    .output()
    .with_context(|| format!("failed to run {label}"))?;
  if !output.status.success() {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut msg = format!("{label} exited with status {}", output.status);
    if !stderr.is_empty() {
      msg.push('\n');
      msg.push_str(&stderr);
    }
    if !stdout.is_empty() {
      msg.push('\n');
      msg.push_str(&stdout);
    }
    bail!("{msg}");
  }
  Ok(())
}
