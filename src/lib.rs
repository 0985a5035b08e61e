//! Generate OpenAPI documents from annotated Rust sources.

pub mod analyzer;
pub mod annotations;
pub mod bootstrap;
pub mod cli;
pub mod fault;
pub mod formatters;
pub mod generator;
pub mod logger;
pub mod processors;
pub mod traversal;
pub mod types;
