//! Application layer: configuration and the dependency container.
//!
//! ```text
//! App ──owns──▶ Arc<dyn ChallengeStore>   (InMemoryStore | MsgPackStore)
//!  │
//!  └─creates──▶ Assistant ──reads/commits through──▶ ChallengeStore
//! ```
//!
//! # Usage
//!
//! ```
//! use nudge::adapters::InMemoryStore;
//! use nudge::app::{App, AssistantConfig};
//!
//! let app = App::for_testing()
//!     .with_store(InMemoryStore::new())
//!     .with_config(AssistantConfig::default().with_n_timestep(48))
//!     .build();
//! let assistant = app.assistant()?;
//! assert_eq!(assistant.discretizer().n_timestep(), 48);
//! # Ok::<(), nudge::Error>(())
//! ```

pub mod config;
pub mod container;

pub use config::{AssistantConfig, KernelPriorConfig};
pub use container::{App, AppBuilder};
