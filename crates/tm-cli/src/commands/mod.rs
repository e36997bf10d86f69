//! CLI command implementations

pub(crate) mod common;
pub(crate) mod migrate;
pub(crate) mod pending;
pub(crate) mod status;
