//! In-place updates of `KEY=value` lines in an existing `.env` file

use anyhow::{Context, Result, bail};
use std::path::Path;

/// Set `key` to `value`, replacing an existing assignment or appending one.
/// The file must already exist.
pub fn set_key(path: &Path, key: &str, value: &str) -> Result<()> {
    if !path.is_file() {
        bail!(".env file not found at {}", path.display());
    }

    let contents = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut replaced = false;
    let mut lines: Vec<String> = contents
        .lines()
        .map(|line| {
            if !replaced && assigns(line, key) {
                replaced = true;
                format!("{}={}", key, value)
            } else {
                line.to_string()
            }
        })
        .collect();

    if !replaced {
        lines.push(format!("{}={}", key, value));
    }

    let mut updated = lines.join("\n");
    updated.push('\n');

    std::fs::write(path, updated).with_context(|| format!("Failed to write {}", path.display()))
}

/// Whether a line assigns `key`, allowing an `export ` prefix
fn assigns(line: &str, key: &str) -> bool {
    let trimmed = line.trim_start();
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed).trim_start();
    trimmed
        .strip_prefix(key)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}
