//! Error types for the mine pump driver boundary.

use crate::types::Capability;
use thiserror::Error;

/// Errors raised when a driver hands malformed input to the core boundary.
///
/// The core itself is total; these are rejected before a step runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// Capability name could not be parsed
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// Start and stop were both requested in the same step
    #[error("Conflicting stimuli: start and stop issued in the same step")]
    ConflictingStimuli,

    /// A command was issued whose capability is not part of the product
    #[error("Command '{command}' requires capability '{capability}'")]
    CapabilityDisabled {
        command: &'static str,
        capability: Capability,
    },
}

impl EnvError {
    /// Creates an unknown-capability error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownCapability(name.into())
    }

    /// Creates a disabled-capability error.
    pub fn disabled(command: &'static str, capability: Capability) -> Self {
        Self::CapabilityDisabled {
            command,
            capability,
        }
    }
}
