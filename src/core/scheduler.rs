//! Propagation scheduler.
//!
//! `Network::tick` runs one scheduling step to completion and returns. A
//! caller (background worker, tokio task, benchmark or test) decides the
//! cadence.

use std::collections::BTreeSet;

use hashbrown::HashSet;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, trace, warn};

use crate::config::FiringMode;
use crate::network::Network;
use crate::neuron::{NeuronId, Role};

/// Per-network propagation state carried between ticks.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    // Neurons to fire on the next wave-mode tick.
    next_queue: BTreeSet<NeuronId>,
    // Neurons fired during the current wave.
    ban_list: HashSet<NeuronId>,
    // Motor fires since the last random-mode output snapshot.
    motor_fire_counter: usize,
}

impl SchedulerState {
    pub fn pending(&self) -> usize {
        self.next_queue.len()
    }

    pub(crate) fn clear_queue(&mut self) {
        self.next_queue.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Successful fires during this tick.
    pub fired: usize,
    /// Fires that raised a numeric fault and were skipped.
    pub faults: usize,
    /// A wave boundary (output snapshot) happened during this tick.
    pub wave_boundary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Frozen,
    Ran(TickReport),
}

impl Network {
    /// Run one scheduling step in the configured firing mode.
    pub fn tick(&mut self) -> TickOutcome {
        if self.frozen {
            return TickOutcome::Frozen;
        }
        let report = match self.cfg.mode {
            FiringMode::Random => self.tick_random(),
            FiringMode::Wave => self.tick_wave(),
        };
        TickOutcome::Ran(report)
    }

    /// Run up to `ticks` steps; stops early if frozen. Returns steps run.
    pub fn run_ticks(&mut self, ticks: usize) -> usize {
        for done in 0..ticks {
            if self.tick() == TickOutcome::Frozen {
                return done;
            }
        }
        ticks
    }

    /// Tick until the wave counter has advanced by `waves`.
    ///
    /// Returns the number of ticks it took, or fewer waves if the network
    /// got frozen.
    pub fn run_waves(&mut self, waves: u64) -> usize {
        let target = self.wave_counter + waves;
        let mut ticks = 0;
        while self.wave_counter < target {
            if self.tick() == TickOutcome::Frozen {
                break;
            }
            ticks += 1;
        }
        ticks
    }

    fn tick_random(&mut self) -> TickReport {
        let mut report = TickReport::default();

        let Some(&id) = self.nonsensory.choose(&mut self.rng) else {
            return report;
        };
        if self.neurons[id].role == Role::Motor {
            if self.rng.gen_range(1..=self.motor_fire_rate) != 1 {
                return report;
            }
            self.scheduler.motor_fire_counter += 1;
        }

        self.fire_reporting(id, &mut report);

        if self.scheduler.motor_fire_counter >= self.motor.len() {
            self.complete_wave();
            self.scheduler.motor_fire_counter = 0;
            report.wave_boundary = true;
        }
        report
    }

    fn tick_wave(&mut self) -> TickReport {
        let mut report = TickReport::default();

        if self.scheduler.next_queue.is_empty() {
            for k in 0..self.motor.len() {
                let id = self.motor[k];
                self.fire_reporting(id, &mut report);
            }
            for &id in &self.scheduler.ban_list {
                self.neurons[id].ban_counter = 0;
            }
            self.scheduler.ban_list.clear();
            self.complete_wave();
            report.wave_boundary = true;

            for &id in &self.sensory {
                self.scheduler
                    .next_queue
                    .extend(self.neurons[id].publications.iter().copied());
            }
        }

        let limit = self.connectivity_sqrt;
        let mut working: Vec<NeuronId> = core::mem::take(&mut self.scheduler.next_queue)
            .into_iter()
            .filter(|id| {
                !(self.scheduler.ban_list.contains(id) && self.neurons[*id].ban_counter > limit)
            })
            .collect();
        working.shuffle(&mut self.rng);

        for id in working {
            let neuron = &self.neurons[id];
            if neuron.ban_counter > limit || neuron.role == Role::Motor {
                continue;
            }
            let fired = self.fire_reporting(id, &mut report);
            self.scheduler.ban_list.insert(id);
            self.neurons[id].ban_counter += 1;
            if fired {
                self.scheduler
                    .next_queue
                    .extend(self.neurons[id].publications.iter().copied());
            }
        }
        report
    }

    /// Fire one neuron inside a tick. A fault only skips that neuron.
    fn fire_reporting(&mut self, id: NeuronId, report: &mut TickReport) -> bool {
        match self.fire(id) {
            Ok(()) => {
                report.fired += 1;
                true
            }
            Err(e) => {
                warn!(neuron = id, error = %e, "fire skipped");
                report.faults += 1;
                false
            }
        }
    }

    fn complete_wave(&mut self) {
        self.output = self.output();
        self.wave_counter += 1;
        if self.cfg.report_output {
            info!(wave = self.wave_counter, output = ?self.output, "wave output");
        } else {
            trace!(wave = self.wave_counter, output = ?self.output, "wave output");
        }
    }
}
