//! CLI infrastructure for the nudge scheduler
//!
//! This module provides the command-line interface for inspecting candidate
//! plans, simulating the assistant and scheduling against a store file.

pub mod commands;
pub mod config;
pub mod output;
