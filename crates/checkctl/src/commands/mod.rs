//! CLI subcommands

pub mod checks;
pub mod resolve;
pub mod slo;
