//! Subcommands of the `nudge` binary.

pub mod plans;
pub mod schedule;
pub mod seed_store;
pub mod simulate;
