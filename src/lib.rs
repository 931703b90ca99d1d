//! # plexus
//!
//! A sparsely, randomly connected network of scalar neurons that fire
//! asynchronously and adapt their inbound weights with a local, per-fire
//! update rule. No batches, no epochs, no global backprop.
//!
//! ## Quick Start
//!
//! ```
//! use plexus::prelude::*;
//!
//! let cfg = NetworkConfig::with_size(50, 5, 5)
//!     .with_connectivity(0.1)
//!     .with_seed(42);
//! let mut network = Network::new(cfg).unwrap();
//!
//! network.load(&[0.1, 0.2, 0.3, 0.4, 0.5], Some(&[1.0, 0.0, 1.0, 0.0, 1.0])).unwrap();
//! network.run_waves(20);
//!
//! let output = network.output();
//! assert_eq!(output.len(), 5);
//! ```
//!
//! For continuous background execution hand the network to
//! [`runner::NetworkRunner::ignite`].
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialization/deserialization
//!
//! ## Modules
//!
//! - [`network`]: Population, roles and the control surface
//! - [`wiring`]: Random subscription graph
//! - [`firing`]: Activation and the local weight update
//! - [`scheduler`]: Random and wave propagation
//! - [`runner`]: Background worker
//! - [`observer`]: Read-only snapshots for visualizers

#[path = "core/error.rs"]
pub mod error;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/neuron.rs"]
pub mod neuron;

#[path = "core/network.rs"]
pub mod network;

#[path = "core/wiring.rs"]
pub mod wiring;

#[path = "core/firing.rs"]
pub mod firing;

#[path = "core/scheduler.rs"]
pub mod scheduler;

#[path = "core/runner.rs"]
pub mod runner;

pub mod observer;

/// Prelude module for convenient imports.
///
/// ```
/// use plexus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{FiringMode, NetworkConfig};
    pub use crate::error::{NetworkError, VectorKind};
    pub use crate::network::{Diagnostics, Network};
    pub use crate::neuron::{NeuronId, Potential, Role, Weight};
    pub use crate::observer::{NetworkAdapter, NetworkSnapshot};
    pub use crate::runner::NetworkRunner;
    pub use crate::scheduler::{TickOutcome, TickReport};
}
