pub mod jsonl;

use crate::errors::Result;
use std::path::Path;

/// Ensure directory exists; create recursively if missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}
