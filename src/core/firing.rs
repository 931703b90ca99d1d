use crate::error::{NetworkError, Result};
use crate::network::Network;
use crate::neuron::{activation, derivative, NeuronId, Potential, Role, Weight};

/// Scale of the fire counter in the decay exponent.
const DECAY_FIRES_PER_STEP: f64 = 1000.0;

enum Learning {
    None,
    // Target reached exactly: drop it, leave weights alone.
    Reconciled,
    // (source, new weight, source's new desired potential)
    Adjust(Vec<(NeuronId, Weight, Potential)>),
}

impl Network {
    /// Recompute a neuron's potential from its inputs and, when it carries a
    /// learning target, nudge its inbound weights and hand a one-hop target
    /// to each of its sources.
    ///
    /// Sensory neurons are left untouched. Nothing is committed when the
    /// computation turns non-finite.
    pub fn fire(&mut self, id: NeuronId) -> Result<()> {
        let neuron = self.neurons.get(id).ok_or(NetworkError::UnknownNeuron(id))?;
        if neuron.role == Role::Sensory {
            return Ok(());
        }

        let total: f64 = neuron
            .subscriptions
            .iter()
            .map(|(&source, &weight)| self.neurons[source].potential * weight)
            .sum();
        if !total.is_finite() {
            return Err(NetworkError::NumericInstability { neuron: id });
        }
        let potential = activation(total);

        // The global counter is bumped by this fire before decay is applied.
        let fires = self.fire_counter + 1;

        let learning = match neuron.desired_potential {
            None => Learning::None,
            Some(desired) => {
                let loss = potential - desired;
                if loss == 0.0 {
                    Learning::Reconciled
                } else {
                    // Overshoot pushes down.
                    let sign = if loss > 0.0 { -1.0 } else { 1.0 };
                    let magnitude =
                        loss * loss * self.cfg.decay_factor.powf(fires as f64 / DECAY_FIRES_PER_STEP);

                    let mut updates = Vec::with_capacity(neuron.subscriptions.len());
                    for (&source, &weight) in &neuron.subscriptions {
                        let source_potential = self.neurons[source].potential;
                        let slope = derivative(source_potential);
                        let new_weight = weight + magnitude * sign * slope;
                        let source_target = source_potential + sign * slope;
                        if !new_weight.is_finite() || !source_target.is_finite() {
                            return Err(NetworkError::NumericInstability { neuron: id });
                        }
                        updates.push((source, new_weight, source_target));
                    }
                    Learning::Adjust(updates)
                }
            }
        };

        self.fire_counter = fires;
        let neuron = &mut self.neurons[id];
        neuron.potential = potential;
        neuron.fire_counter += 1;

        match learning {
            Learning::None => {}
            Learning::Reconciled => neuron.desired_potential = None,
            Learning::Adjust(updates) => {
                for (source, weight, source_target) in updates {
                    if let Some(w) = self.neurons[id].subscriptions.get_mut(&source) {
                        *w = weight;
                    }
                    self.neurons[source].desired_potential = Some(source_target);
                }
            }
        }
        Ok(())
    }
}
