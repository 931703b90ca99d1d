use crate::neuron::NeuronId;

/// Result type alias using [`NetworkError`].
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Which externally supplied vector failed a shape check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    Input,
    Target,
}

impl core::fmt::Display for VectorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            VectorKind::Input => f.write_str("input"),
            VectorKind::Target => f.write_str("target"),
        }
    }
}

/// Errors raised by network construction and control operations.
///
/// All of them are local to the call that produced them. None of them
/// stops a running scheduler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    /// An input/target vector length disagrees with the sensory/motor population.
    #[error("{vector} vector has {actual} values but the network expects {expected}")]
    ShapeMismatch {
        vector: VectorKind,
        expected: usize,
        actual: usize,
    },

    /// More sensory/motor neurons were requested than eligible neurons exist.
    #[error("requested {requested} role neurons but only {available} are eligible")]
    EmptyPopulation { requested: usize, available: usize },

    /// Activation or weight update produced a non-finite value.
    #[error("numeric instability while firing neuron {neuron}")]
    NumericInstability { neuron: NeuronId },

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// A manual subscription would break the graph's role rules.
    #[error("cannot subscribe {target} to {from}: {reason}")]
    InvalidEdge {
        target: NeuronId,
        from: NeuronId,
        reason: &'static str,
    },

    /// No neuron with this id exists.
    #[error("unknown neuron {0}")]
    UnknownNeuron(NeuronId),
}

impl NetworkError {
    /// Recoverable errors leave the network untouched and can be retried
    /// with corrected arguments.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NetworkError::ShapeMismatch { .. }
                | NetworkError::NumericInstability { .. }
                | NetworkError::UnknownNeuron(_)
        )
    }
}
