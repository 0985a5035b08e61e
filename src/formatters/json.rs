use anyhow::{Context, Result};

use crate::types::OpenApi;

pub fn format(api: &OpenApi) -> Result<String> {
    serde_json::to_string_pretty(api).context("serialize json")
}
