//! Mine Pump Environment Abstraction Layer
//!
//! This crate is the boundary between the mine pump core and whatever drives
//! it. It holds the vocabulary both sides share:
//! - **Capabilities**: the optional behavior units a product is built from
//! - **Stimuli**: what the driver asks to happen on one step
//! - **Decisions**: the opaque `choose() -> bool` source the driver consults
//!
//! By routing every nondeterministic choice through a `DecisionSource`,
//! any run becomes reproducible from its seed.
//!
//! # Example
//!
//! ```ignore
//! use minepump_env::{CapabilitySet, DecisionSource, Stimuli};
//!
//! fn next_stimuli<D: DecisionSource>(caps: &CapabilitySet, decisions: &mut D) -> Stimuli {
//!     Stimuli {
//!         raise_water: decisions.choose(),
//!         toggle_methane: decisions.choose(),
//!         ..Stimuli::none()
//!     }
//! }
//! ```

mod context;
mod types;
mod error;
mod entropy_impl;

pub use context::DecisionSource;
pub use types::{Capability, CapabilitySet, Stimuli};
pub use error::EnvError;
pub use entropy_impl::EntropyDecisions;
