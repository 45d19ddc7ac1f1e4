//! Ports (trait boundaries) for external dependencies.
//!
//! The scheduling domain owns these traits; the adapters module implements
//! them for concrete storage, and the CLI implements the observer.

pub mod challenge_store;
pub mod observer;

pub use challenge_store::ChallengeStore;
pub use observer::{NullObserver, SimulationObserver};
