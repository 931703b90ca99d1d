use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable arena index of a neuron inside its network.
pub type NeuronId = usize;

/// Connection weight.
pub type Weight = f64;

/// Activation value, in (0,1) once a neuron has fired.
pub type Potential = f64;

/// Pre-activation sums are saturated to this magnitude before the logistic.
///
/// `sigmoid(±30)` is still strictly inside (0,1) in f64.
pub const PREACTIVATION_LIMIT: f64 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Role {
    #[default]
    Interneuron,
    /// Potential set externally by `load`; never fires.
    Sensory,
    /// Sink only; read by `output`.
    Motor,
}

#[derive(Debug, Clone)]
pub struct Neuron {
    pub(crate) role: Role,
    pub(crate) potential: Potential,
    pub(crate) desired_potential: Option<Potential>,

    // Inbound edges: source -> weight.
    pub(crate) subscriptions: BTreeMap<NeuronId, Weight>,
    // Reverse index of who subscribes to this neuron.
    pub(crate) publications: BTreeSet<NeuronId>,

    pub(crate) fire_counter: u64,
    pub(crate) ban_counter: usize,

    // Layout for observers only.
    pub(crate) position: (f32, f32),
}

impl Neuron {
    pub(crate) fn new(potential: Potential) -> Self {
        Self {
            role: Role::Interneuron,
            potential,
            desired_potential: None,
            subscriptions: BTreeMap::new(),
            publications: BTreeSet::new(),
            fire_counter: 0,
            ban_counter: 0,
            position: (0.0, 0.0),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn potential(&self) -> Potential {
        self.potential
    }

    pub fn desired_potential(&self) -> Option<Potential> {
        self.desired_potential
    }

    pub fn subscriptions(&self) -> &BTreeMap<NeuronId, Weight> {
        &self.subscriptions
    }

    pub fn weight_from(&self, source: NeuronId) -> Option<Weight> {
        self.subscriptions.get(&source).copied()
    }

    pub fn publications(&self) -> &BTreeSet<NeuronId> {
        &self.publications
    }

    pub fn fire_counter(&self) -> u64 {
        self.fire_counter
    }

    pub fn ban_counter(&self) -> usize {
        self.ban_counter
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn is_sensory(&self) -> bool {
        self.role == Role::Sensory
    }

    pub fn is_motor(&self) -> bool {
        self.role == Role::Motor
    }
}

/// Logistic activation with saturated input.
#[inline]
pub fn activation(x: f64) -> Potential {
    let x = x.clamp(-PREACTIVATION_LIMIT, PREACTIVATION_LIMIT);
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid derivative evaluated at an already-activated potential.
#[inline]
pub fn derivative(potential: Potential) -> f64 {
    potential * (1.0 - potential)
}
