//! Active-inference scheduling of walking challenges
//!
//! This crate provides:
//! - Day discretisation and step-count position levels
//! - Dirichlet pseudo-counts over position transitions
//! - Enumeration of challenge action plans and expected-free-energy selection
//! - A scheduling assistant behind a challenge-store port, with in-memory and
//!   MessagePack adapters
//! - A simulation harness against synthetic users

pub mod action_plan;
pub mod activity;
pub mod adapters;
pub mod app;
pub mod assistant;
pub mod challenge;
pub mod cli;
pub mod efe;
pub mod error;
pub mod logging;
pub mod ports;
pub mod position;
pub mod position_prior;
pub mod pseudo_counts;
pub mod simulation;
pub mod timestep;
pub mod utils;

pub use action_plan::{ActionPlan, ActionPlanGenerator, ChallengeWindow};
pub use assistant::{Assistant, ScheduleOutcome};
pub use error::{Error, Result};
pub use pseudo_counts::PseudoCounts;
