use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::fault::{E_ALL, Failure};

/// Settings a bootstrap file can define before generation starts.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Bootstrap {
    /// Error-reporting mask applied to runtime warnings and errors.
    pub error_reporting: u32,
    /// Values for bare identifiers used in annotations.
    pub constants: IndexMap<String, String>,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Bootstrap {
            error_reporting: E_ALL,
            constants: IndexMap::new(),
        }
    }
}

/// Whether `path` can be opened for reading.
pub fn is_readable(path: &Path) -> bool {
    fs::File::open(path).is_ok() && path.is_file()
}

/// Loads a bootstrap file.
///
/// # Errors
/// Returns [`Failure::Bootstrap`] when the file cannot be read or is not a
/// valid bootstrap document.
pub fn load(path: &Path) -> Result<Bootstrap, Failure> {
    let invalid = |reason: String| Failure::Bootstrap {
        path: path.display().to_string(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let boot: Bootstrap = toml::from_str(&text).map_err(|e| invalid(e.message().to_string()))?;
    tracing::debug!(
        path = %path.display(),
        constants = boot.constants.len(),
        "bootstrap loaded"
    );
    Ok(boot)
}
