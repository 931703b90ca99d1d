use core::ops::Range;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::NetworkConfig;
use crate::error::{NetworkError, Result, VectorKind};
use crate::neuron::{Neuron, NeuronId, Potential, Role};
use crate::scheduler::SchedulerState;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostics {
    pub neuron_count: usize,
    pub connection_count: usize,
    pub fire_counter: u64,
    pub wave_counter: u64,
    pub initiated_neurons: usize,
    pub avg_abs_weight: f64,
    pub pending_queue: usize,
    pub frozen: bool,
}

/// A sparse, randomly wired population of scalar neurons.
///
/// Neurons live in one arena and refer to each other by [`NeuronId`].
/// All mutation goes through `&mut self`; sharing with a background worker
/// is done by [`crate::runner::NetworkRunner`].
pub struct Network {
    pub(crate) cfg: NetworkConfig,
    pub(crate) neurons: Vec<Neuron>,

    // Role partitions, in pick order for sensory/motor.
    pub(crate) sensory: Vec<NeuronId>,
    pub(crate) motor: Vec<NeuronId>,
    pub(crate) nonsensory: Vec<NeuronId>,
    pub(crate) nonmotor: Vec<NeuronId>,
    pub(crate) interneurons: Vec<NeuronId>,

    pub(crate) rng: StdRng,

    pub(crate) connectivity: usize,
    pub(crate) connectivity_sqrt: usize,
    pub(crate) motor_fire_rate: usize,

    pub(crate) fire_counter: u64,
    pub(crate) wave_counter: u64,
    pub(crate) initiated_neurons: usize,

    pub(crate) frozen: bool,
    pub(crate) scheduler: SchedulerState,

    // Output snapshot taken at the last wave boundary.
    pub(crate) output: Vec<Potential>,
}

impl Network {
    pub fn new(cfg: NetworkConfig) -> Result<Self> {
        cfg.validate().map_err(NetworkError::InvalidConfig)?;

        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let neurons: Vec<Neuron> = (0..cfg.size)
            .map(|_| Neuron::new(rng.gen_range(0.0..=1.0)))
            .collect();
        info!(
            size = cfg.size,
            connectivity = cfg.connectivity(),
            precision = cfg.precision,
            "neurons created"
        );

        let mut network = Self {
            cfg,
            neurons,
            sensory: Vec::new(),
            motor: Vec::new(),
            nonsensory: Vec::new(),
            nonmotor: Vec::new(),
            interneurons: Vec::new(),
            rng,
            connectivity: cfg.connectivity(),
            connectivity_sqrt: cfg.connectivity_sqrt(),
            motor_fire_rate: 1,
            fire_counter: 0,
            wave_counter: 0,
            initiated_neurons: 0,
            frozen: false,
            scheduler: SchedulerState::default(),
            output: Vec::new(),
        };

        network.sensory = network.pick_role(Role::Sensory, cfg.input_dim)?;
        network.motor = network.pick_role(Role::Motor, cfg.output_dim)?;
        network.refresh_role_indices();

        network.wire();
        network.layout();

        Ok(network)
    }

    /// Assign `count` randomly chosen interneurons to `role`.
    fn pick_role(&mut self, role: Role, count: usize) -> Result<Vec<NeuronId>> {
        let available: Vec<NeuronId> = self
            .neurons
            .iter()
            .enumerate()
            .filter(|(_, n)| n.role == Role::Interneuron)
            .map(|(i, _)| i)
            .collect();
        if count > available.len() {
            return Err(NetworkError::EmptyPopulation {
                requested: count,
                available: available.len(),
            });
        }

        let picked: Vec<NeuronId> = index::sample(&mut self.rng, available.len(), count)
            .into_iter()
            .map(|k| available[k])
            .collect();
        for &id in &picked {
            self.neurons[id].role = role;
        }
        info!(count, ?role, "role neurons picked");
        Ok(picked)
    }

    pub(crate) fn refresh_role_indices(&mut self) {
        let ids_where = |pred: fn(Role) -> bool| -> Vec<NeuronId> {
            self.neurons
                .iter()
                .enumerate()
                .filter(|(_, n)| pred(n.role))
                .map(|(i, _)| i)
                .collect()
        };
        let nonsensory = ids_where(|r| r != Role::Sensory);
        let nonmotor = ids_where(|r| r != Role::Motor);
        let interneurons = ids_where(|r| r == Role::Interneuron);

        self.nonsensory = nonsensory;
        self.nonmotor = nonmotor;
        self.interneurons = interneurons;

        // Throttles motor firing relative to the rest of the population.
        self.motor_fire_rate = if self.motor.is_empty() {
            1
        } else {
            ((self.nonsensory.len() as f64 / self.motor.len() as f64).sqrt() as usize).max(1)
        };
    }

    /// Place neurons in three columns: sensory, interneurons (jittered), motor.
    fn layout(&mut self) {
        let s = self.sensory.len() as f32;

        let mut y = 0.0f32;
        for &id in &self.sensory {
            y += 1.0;
            self.neurons[id].position = (1.0, y);
        }

        self.place_interneurons(0);

        let x = 1.0 + 2.0 * s;
        y = (s - self.motor.len() as f32) / 2.0;
        for &id in &self.motor {
            y += 1.0;
            self.neurons[id].position = (x, y);
        }
    }

    /// Jitter interneurons `from..` into the middle column.
    fn place_interneurons(&mut self, from: usize) {
        let s = self.sensory.len() as f32;
        let spread = s / 1.5;
        let x = 1.0 + s;
        let y0 = (s - self.interneurons.len() as f32) / 2.0;

        for k in from..self.interneurons.len() {
            let id = self.interneurons[k];
            let jitter = self.rng.gen_range(-spread..=spread);
            self.neurons[id].position = (x + jitter, y0 + (k + 1) as f32);
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.cfg
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        self.neurons.get(id)
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn sensory_neurons(&self) -> &[NeuronId] {
        &self.sensory
    }

    pub fn motor_neurons(&self) -> &[NeuronId] {
        &self.motor
    }

    pub fn interneurons(&self) -> &[NeuronId] {
        &self.interneurons
    }

    pub fn connectivity(&self) -> usize {
        self.connectivity
    }

    pub fn connectivity_sqrt(&self) -> usize {
        self.connectivity_sqrt
    }

    pub fn motor_fire_rate(&self) -> usize {
        self.motor_fire_rate
    }

    pub fn fire_counter(&self) -> u64 {
        self.fire_counter
    }

    pub fn wave_counter(&self) -> u64 {
        self.wave_counter
    }

    pub fn initiated_neurons(&self) -> usize {
        self.initiated_neurons
    }

    /// Assign an input vector to the sensory neurons and, optionally, a
    /// target vector to the motor neurons.
    ///
    /// Without a target every non-sensory learning target is cleared.
    /// Both lengths are checked before anything is written.
    pub fn load(&mut self, input: &[Potential], target: Option<&[Potential]>) -> Result<()> {
        if input.len() != self.sensory.len() {
            return Err(NetworkError::ShapeMismatch {
                vector: VectorKind::Input,
                expected: self.sensory.len(),
                actual: input.len(),
            });
        }
        if let Some(target) = target {
            if target.len() != self.motor.len() {
                return Err(NetworkError::ShapeMismatch {
                    vector: VectorKind::Target,
                    expected: self.motor.len(),
                    actual: target.len(),
                });
            }
        }

        for (&id, &value) in self.sensory.iter().zip(input) {
            self.neurons[id].potential = value;
        }

        match target {
            None => {
                for &id in &self.nonsensory {
                    self.neurons[id].desired_potential = None;
                }
            }
            Some(target) => {
                for (&id, &value) in self.motor.iter().zip(target) {
                    self.neurons[id].desired_potential = Some(value);
                }
            }
        }
        Ok(())
    }

    /// Current motor potentials rounded to the configured precision.
    pub fn output(&self) -> Vec<Potential> {
        self.motor
            .iter()
            .map(|&id| round_to(self.neurons[id].potential, self.cfg.precision))
            .collect()
    }

    /// Output snapshot taken at the most recent wave boundary.
    pub fn last_output(&self) -> &[Potential] {
        &self.output
    }

    /// Append `count` fresh interneurons and wire every unsubscribed neuron.
    ///
    /// Existing subscriptions are left untouched.
    pub fn add_neurons(&mut self, count: usize) -> Range<NeuronId> {
        let start = self.neurons.len();
        let placed = self.interneurons.len();
        self.neurons.reserve(count);
        for _ in 0..count {
            let potential = self.rng.gen_range(0.0..=1.0);
            self.neurons.push(Neuron::new(potential));
        }
        self.refresh_role_indices();
        self.wire();
        self.place_interneurons(placed);

        info!(count, total = self.neurons.len(), "neurons added");
        start..self.neurons.len()
    }

    /// Pause propagation. State is kept.
    pub fn freeze(&mut self) {
        if !self.frozen {
            self.frozen = true;
            info!("network is now frozen");
        }
    }

    /// Resume propagation after [`Network::freeze`].
    pub fn resume(&mut self) {
        if self.frozen {
            self.frozen = false;
            info!("network resumed");
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let mut connection_count = 0usize;
        let mut weight_sum = 0.0f64;
        for n in &self.neurons {
            connection_count += n.subscriptions.len();
            weight_sum += n.subscriptions.values().map(|w| w.abs()).sum::<f64>();
        }
        let avg_abs_weight = if connection_count > 0 {
            weight_sum / connection_count as f64
        } else {
            0.0
        };

        Diagnostics {
            neuron_count: self.neurons.len(),
            connection_count,
            fire_counter: self.fire_counter,
            wave_counter: self.wave_counter,
            initiated_neurons: self.initiated_neurons,
            avg_abs_weight,
            pending_queue: self.scheduler.pending(),
            frozen: self.frozen,
        }
    }
}

pub(crate) fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FiringMode;

    fn small(seed: u64) -> Network {
        let cfg = NetworkConfig::with_size(50, 5, 5)
            .with_connectivity(0.1)
            .with_seed(seed);
        Network::new(cfg).unwrap()
    }

    #[test]
    fn roles_are_disjoint_and_sized() {
        let net = small(1);
        assert_eq!(net.sensory_neurons().len(), 5);
        assert_eq!(net.motor_neurons().len(), 5);
        assert_eq!(net.interneurons().len(), 40);
        for &id in net.sensory_neurons() {
            assert_eq!(net.neuron(id).unwrap().role(), Role::Sensory);
            assert!(!net.motor_neurons().contains(&id));
        }
        for &id in net.motor_neurons() {
            assert_eq!(net.neuron(id).unwrap().role(), Role::Motor);
        }
    }

    #[test]
    fn oversized_role_request_is_empty_population() {
        let cfg = NetworkConfig::with_size(8, 5, 5).with_seed(1);
        match Network::new(cfg) {
            Err(NetworkError::EmptyPopulation {
                requested,
                available,
            }) => {
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("construction should fail"),
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = NetworkConfig::with_size(8, 2, 2).with_connectivity(2.0);
        assert!(matches!(
            Network::new(cfg),
            Err(NetworkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_sets_sensory_potentials_exactly() {
        let mut net = small(2);
        let input = [0.1, 0.2, 0.3, 0.4, 0.123456789];
        net.load(&input, None).unwrap();
        for (k, &id) in net.sensory_neurons().iter().enumerate() {
            assert_eq!(net.neuron(id).unwrap().potential(), input[k]);
        }
    }

    #[test]
    fn load_with_wrong_shape_changes_nothing() {
        let mut net = small(3);
        let before: Vec<(Potential, Option<Potential>)> = net
            .neurons()
            .iter()
            .map(|n| (n.potential(), n.desired_potential()))
            .collect();

        let err = net.load(&[0.5; 4], None).unwrap_err();
        assert_eq!(
            err,
            NetworkError::ShapeMismatch {
                vector: VectorKind::Input,
                expected: 5,
                actual: 4
            }
        );
        let err = net.load(&[0.5; 5], Some(&[1.0; 6])).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::ShapeMismatch {
                vector: VectorKind::Target,
                ..
            }
        ));

        let after: Vec<(Potential, Option<Potential>)> = net
            .neurons()
            .iter()
            .map(|n| (n.potential(), n.desired_potential()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn load_target_then_clear() {
        let mut net = small(4);
        net.load(&[0.5; 5], Some(&[0.0, 0.25, 0.5, 0.75, 1.0]))
            .unwrap();
        let motors = net.motor_neurons().to_vec();
        assert_eq!(net.neuron(motors[1]).unwrap().desired_potential(), Some(0.25));

        net.load(&[0.5; 5], None).unwrap();
        for &id in &net.nonsensory {
            assert!(net.neuron(id).unwrap().desired_potential().is_none());
        }
    }

    #[test]
    fn output_is_rounded() {
        let mut net = small(5);
        net.cfg.precision = 1;
        let m = net.motor_neurons()[0];
        net.neurons[m].potential = 0.6789;
        assert_eq!(net.output()[0], 0.7);
        assert_eq!(round_to(0.123456, 3), 0.123);
    }

    #[test]
    fn add_neurons_keeps_existing_subscriptions() {
        let mut net = small(6);
        let before: Vec<_> = net
            .neurons()
            .iter()
            .map(|n| n.subscriptions().clone())
            .collect();

        let added = net.add_neurons(10);
        assert_eq!(added, 50..60);
        assert_eq!(net.len(), 60);
        assert_eq!(net.interneurons().len(), 50);

        for (id, subs) in before.iter().enumerate() {
            if !subs.is_empty() {
                assert_eq!(net.neuron(id).unwrap().subscriptions(), subs);
            }
        }
        for id in added {
            assert_eq!(net.neuron(id).unwrap().role(), Role::Interneuron);
        }
    }

    #[test]
    fn add_neurons_keeps_existing_positions() {
        let mut net = small(8);
        let before: Vec<(f32, f32)> = net.neurons().iter().map(|n| n.position()).collect();

        let added = net.add_neurons(10);
        for (id, pos) in before.iter().enumerate() {
            assert_eq!(net.neuron(id).unwrap().position(), *pos);
        }

        // New interneurons land in the jittered middle column.
        let s = net.sensory_neurons().len() as f32;
        for id in added {
            let (x, _) = net.neuron(id).unwrap().position();
            assert!((x - (1.0 + s)).abs() <= s / 1.5 + 1e-4);
        }
    }

    #[test]
    fn freeze_and_resume_toggle() {
        let mut net = small(7);
        assert!(!net.is_frozen());
        net.freeze();
        assert!(net.is_frozen());
        assert!(net.diagnostics().frozen);
        net.resume();
        assert!(!net.is_frozen());
    }

    #[test]
    fn motor_fire_rate_follows_population() {
        let cfg = NetworkConfig::with_size(50, 5, 5)
            .with_mode(FiringMode::Random)
            .with_seed(8);
        let net = Network::new(cfg).unwrap();
        // floor(sqrt(45 / 5)) = 3
        assert_eq!(net.motor_fire_rate(), 3);
    }
}
