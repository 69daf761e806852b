// file: src/tools/mod.rs
// description: tool catalog and executor module exports
// reference: internal module structure

pub mod catalog;
pub mod executor;

pub use catalog::{ToolKind, resolve_tool, tool_catalog};
pub use executor::{ArgValue, ToolArguments, ToolExecution, ToolExecutor, parse_iso_datetime};
