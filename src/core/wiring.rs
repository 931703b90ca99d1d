//! Random sparse subscription graph.
//!
//! Every non-sensory neuron reads from a normally distributed number of
//! distinct non-motor neurons. Edges are stored on the target
//! (`subscriptions`) and mirrored on the source (`publications`).

use rand::seq::index;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, info};

use crate::error::{NetworkError, Result};
use crate::network::Network;
use crate::neuron::{NeuronId, Role, Weight};

impl Network {
    /// Wire every non-sensory neuron whose subscription map is empty.
    ///
    /// Returns how many neurons were wired by this call.
    pub fn wire(&mut self) -> usize {
        let mut wired = 0;
        for id in 0..self.neurons.len() {
            if self.neurons[id].role == Role::Sensory {
                continue;
            }
            if self.partially_subscribe(id) {
                wired += 1;
                debug!(initiated = self.initiated_neurons, "neuron wired");
            }
        }
        if wired > 0 {
            info!(wired, initiated = self.initiated_neurons, "subscriptions initiated");
        }
        wired
    }

    /// Draw inbound edges for one neuron. No-op if it already has any.
    fn partially_subscribe(&mut self, id: NeuronId) -> bool {
        if !self.neurons[id].subscriptions.is_empty() {
            return false;
        }

        let pool = self.nonmotor.len();
        let sample_len = self.draw_in_degree().min(pool);
        let elected = index::sample(&mut self.rng, pool, sample_len);

        for k in elected.into_iter() {
            let source = self.nonmotor[k];
            if source == id {
                continue;
            }
            let weight: Weight = self.rng.gen_range(-1.0..=1.0);
            self.link(id, source, weight);
        }
        self.initiated_neurons += 1;
        true
    }

    /// Normal(connectivity, sqrt(connectivity)) truncated toward zero, floored at 0.
    fn draw_in_degree(&mut self) -> usize {
        let mean = self.connectivity as f64;
        let std_dev = self.connectivity_sqrt as f64;
        let sample = match Normal::new(mean, std_dev) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => mean,
        };
        (sample as i64).max(0) as usize
    }

    fn link(&mut self, target: NeuronId, source: NeuronId, weight: Weight) {
        self.neurons[target].subscriptions.insert(source, weight);
        self.neurons[source].publications.insert(target);
    }

    /// Add (or overwrite) a single edge `source -> target`.
    ///
    /// Follows the same rules as random wiring: no self edges, motor neurons
    /// are never sources and sensory neurons never subscribe.
    pub fn subscribe(&mut self, target: NeuronId, source: NeuronId, weight: Weight) -> Result<()> {
        let target_role = self
            .neurons
            .get(target)
            .ok_or(NetworkError::UnknownNeuron(target))?
            .role;
        let source_role = self
            .neurons
            .get(source)
            .ok_or(NetworkError::UnknownNeuron(source))?
            .role;

        let reason = if target == source {
            Some("self subscription")
        } else if source_role == Role::Motor {
            Some("motor neurons are sinks")
        } else if target_role == Role::Sensory {
            Some("sensory neurons do not subscribe")
        } else if !weight.is_finite() {
            Some("weight must be finite")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(NetworkError::InvalidEdge {
                target,
                from: source,
                reason,
            });
        }

        self.link(target, source, weight);
        Ok(())
    }

    /// Drop every edge in the graph. Potentials and targets are kept.
    pub fn reset_topology(&mut self) {
        for neuron in &mut self.neurons {
            neuron.subscriptions.clear();
            neuron.publications.clear();
        }
        self.scheduler.clear_queue();
        info!("all the subscriptions are now broken");
    }
}
