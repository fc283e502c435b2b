//! CLI command implementations

pub(crate) mod audit;
pub(crate) mod check_tools;
pub(crate) mod common;
pub(crate) mod fetch;
pub(crate) mod graph;
