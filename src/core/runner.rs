//! Continuous background execution of a [`Network`].
//!
//! One worker thread owns the firing. Foreground calls share the network
//! through a mutex, so every control operation lands between two ticks and
//! the worker never sees a half-written input or target vector.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::network::{Diagnostics, Network};
use crate::neuron::{NeuronId, Potential};
use crate::observer::{NetworkAdapter, NetworkSnapshot};

pub struct NetworkRunner {
    network: Arc<Mutex<Network>>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl NetworkRunner {
    /// Move `network` onto a worker thread and start propagating.
    pub fn ignite(network: Network) -> std::io::Result<Self> {
        let interval = Duration::from_millis(network.config().tick_interval_ms);
        let network = Arc::new(Mutex::new(network));
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker = {
            let network = Arc::clone(&network);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("plexus-scheduler".into())
                .spawn(move || run_worker(network, shutdown, interval))?
        };
        info!("network has been ignited");

        Ok(Self {
            network,
            shutdown,
            worker: Some(worker),
        })
    }

    /// Pause propagation. When this returns no tick is in flight.
    pub fn freeze(&self) {
        self.network.lock().freeze();
    }

    pub fn resume(&self) {
        self.network.lock().resume();
    }

    pub fn is_frozen(&self) -> bool {
        self.network.lock().is_frozen()
    }

    pub fn load(&self, input: &[Potential], target: Option<&[Potential]>) -> Result<()> {
        self.network.lock().load(input, target)
    }

    pub fn output(&self) -> Vec<Potential> {
        self.network.lock().output()
    }

    pub fn last_output(&self) -> Vec<Potential> {
        self.network.lock().last_output().to_vec()
    }

    pub fn add_neurons(&self, count: usize) -> core::ops::Range<NeuronId> {
        self.network.lock().add_neurons(count)
    }

    pub fn reset_topology(&self) {
        self.network.lock().reset_topology();
    }

    pub fn wire(&self) -> usize {
        self.network.lock().wire()
    }

    pub fn wave_counter(&self) -> u64 {
        self.network.lock().wave_counter()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.network.lock().diagnostics()
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        let network = self.network.lock();
        NetworkAdapter::new(&network).snapshot()
    }

    /// Run `f` with exclusive access to the network, between two ticks.
    pub fn with_network<T>(&self, f: impl FnOnce(&mut Network) -> T) -> T {
        f(&mut *self.network.lock())
    }

    /// Stop the worker and hand the network back.
    ///
    /// `None` only if the worker thread panicked while holding its handle.
    pub fn shutdown(mut self) -> Option<Network> {
        self.stop_worker();
        let network = Arc::clone(&self.network);
        drop(self);
        Arc::try_unwrap(network).ok().map(Mutex::into_inner)
    }

    fn stop_worker(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("scheduler worker panicked");
            }
        }
    }
}

impl Drop for NetworkRunner {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn run_worker(network: Arc<Mutex<Network>>, shutdown: Arc<AtomicBool>, interval: Duration) {
    debug!(?interval, "scheduler worker started");
    while !shutdown.load(Ordering::Acquire) {
        {
            let mut network = network.lock();
            network.tick();
        }
        // Cooperative throttle, not a real-time guarantee.
        thread::sleep(interval);
    }
    debug!("scheduler worker stopped");
}
