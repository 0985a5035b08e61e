use anyhow::{Context, Result};

use crate::types::OpenApi;

pub fn format(api: &OpenApi) -> Result<String> {
    serde_yaml::to_string(api).context("serialize yaml")
}
