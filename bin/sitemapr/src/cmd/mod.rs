//! CLI command implementations

pub mod check;
pub mod export;
pub mod ping;
pub mod serve;
