use std::path::Path;

use anyhow::Result;

use crate::fault::Failure;

pub mod json;
pub mod yaml;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Resolves a `--format` value for a target path; `auto` looks at the
    /// extension.
    ///
    /// # Errors
    /// Returns [`Failure::UnsupportedFormat`] for anything but
    /// `yaml`/`yml`/`json`/`auto`.
    pub fn resolve(format: &str, path: &Path) -> Result<Self> {
        match format.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "auto" => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_ascii_lowercase);
                Ok(if ext.as_deref() == Some("json") {
                    Format::Json
                } else {
                    Format::Yaml
                })
            }
            other => Err(Failure::UnsupportedFormat(other.to_string()).into()),
        }
    }
}
