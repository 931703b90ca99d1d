use hashbrown::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::network::{Diagnostics, Network};
use crate::neuron::{NeuronId, Potential, Role, Weight};

/// Read-only view of one neuron for visualization.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeuronView {
    pub id: NeuronId,
    pub role: Role,
    pub position: (f32, f32),
    pub potential: Potential,
}

/// A read-only snapshot of the network for visualizers.
///
/// Design intent:
/// - Observers cannot mutate or steer the network.
/// - Snapshotting is *on-demand* and allocates; the scheduler tick is unchanged.
/// - Weights are advisory: a snapshot taken through a shared handle may lag
///   the worker by a tick.
#[derive(Debug, Clone)]
pub struct NetworkSnapshot {
    pub neurons: Vec<NeuronView>,
    /// `(source, target) -> weight`
    pub connections: HashMap<(NeuronId, NeuronId), Weight>,
    pub diagnostics: Diagnostics,
}

impl NetworkSnapshot {
    pub fn positions(&self) -> impl Iterator<Item = (NeuronId, (f32, f32))> + '_ {
        self.neurons.iter().map(|n| (n.id, n.position))
    }

    /// Edges as a sorted list, handy for serialization and stable output.
    pub fn edge_list(&self) -> Vec<(NeuronId, NeuronId, Weight)> {
        let mut edges: Vec<_> = self
            .connections
            .iter()
            .map(|(&(source, target), &w)| (source, target, w))
            .collect();
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        edges
    }
}

pub struct NetworkAdapter<'a> {
    network: &'a Network,
}

impl<'a> NetworkAdapter<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self { network }
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        let neurons = self
            .network
            .neurons()
            .iter()
            .enumerate()
            .map(|(id, n)| NeuronView {
                id,
                role: n.role(),
                position: n.position(),
                potential: n.potential(),
            })
            .collect();

        let mut connections = HashMap::new();
        for (target, n) in self.network.neurons().iter().enumerate() {
            for (&source, &w) in n.subscriptions() {
                connections.insert((source, target), w);
            }
        }

        NetworkSnapshot {
            neurons,
            connections,
            diagnostics: self.network.diagnostics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;

    #[test]
    fn snapshot_mirrors_network() {
        let cfg = NetworkConfig::with_size(40, 4, 3)
            .with_connectivity(0.1)
            .with_seed(51);
        let net = Network::new(cfg).unwrap();
        let snap = NetworkAdapter::new(&net).snapshot();

        assert_eq!(snap.neurons.len(), 40);
        assert_eq!(snap.connections.len(), snap.diagnostics.connection_count);
        for ((source, target), w) in &snap.connections {
            assert_eq!(net.neuron(*target).unwrap().weight_from(*source), Some(*w));
        }
        let edges = snap.edge_list();
        assert!(edges.windows(2).all(|e| (e[0].0, e[0].1) < (e[1].0, e[1].1)));
    }

    #[test]
    fn layout_uses_role_columns() {
        let cfg = NetworkConfig::with_size(40, 4, 3)
            .with_connectivity(0.1)
            .with_seed(52);
        let net = Network::new(cfg).unwrap();
        let snap = NetworkAdapter::new(&net).snapshot();

        for view in &snap.neurons {
            match view.role {
                Role::Sensory => assert_eq!(view.position.0, 1.0),
                Role::Motor => assert_eq!(view.position.0, 9.0),
                Role::Interneuron => {
                    assert!(view.position.0 >= 5.0 - 4.0 / 1.5 - 1e-4);
                    assert!(view.position.0 <= 5.0 + 4.0 / 1.5 + 1e-4);
                }
            }
        }
        assert_eq!(snap.positions().count(), 40);
    }
}
