use std::collections::VecDeque;

use crate::{
    params::{NeuronParams, StdpParams},
    synapse::Synapse,
    util::{compute_stdp, decay_towards_rest},
};

pub const SPIKE_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct Neuron {
    params: NeuronParams,
    potential: f64,
    spiked: bool,
    spike_count: usize,
    last_spike_time: Option<usize>,
    spike_history: VecDeque<usize>,
    outgoing: Vec<Synapse>,
}

/// Emitted by a neuron that crossed threshold. Yields `(target, weight)` for every
/// outgoing synapse, to be delivered within the same step.
#[derive(Debug, Clone)]
pub struct Spike<T: Iterator<Item = (usize, f64)>>(pub T);

impl Neuron {
    pub fn new(params: NeuronParams) -> Self {
        Self {
            params,
            potential: params.resting_potential,
            spiked: false,
            spike_count: 0,
            last_spike_time: None,
            spike_history: VecDeque::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn params(&self) -> &NeuronParams {
        &self.params
    }

    pub fn potential(&self) -> f64 {
        self.potential
    }

    pub fn spiked(&self) -> bool {
        self.spiked
    }

    pub fn spike_count(&self) -> usize {
        self.spike_count
    }

    pub fn last_spike_time(&self) -> Option<usize> {
        self.last_spike_time
    }

    /// Most recent spike times, oldest first. Kept for inspection only; the learning rule
    /// reads `last_spike_time` alone.
    pub fn spike_history(&self) -> &VecDeque<usize> {
        &self.spike_history
    }

    pub fn connections(&self) -> &[Synapse] {
        &self.outgoing
    }

    pub fn connection_count(&self) -> usize {
        self.outgoing.len()
    }

    pub(crate) fn add_connection(&mut self, target: usize, weight: f64) {
        match self.outgoing.iter_mut().find(|syn| syn.target == target) {
            Some(syn) => syn.weight = weight,
            None => self.outgoing.push(Synapse::new(target, weight)),
        }
    }

    pub(crate) fn remove_connection(&mut self, target: usize) -> bool {
        let len_before = self.outgoing.len();
        self.outgoing.retain(|syn| syn.target != target);
        self.outgoing.len() != len_before
    }

    pub(crate) fn apply_input(&mut self, current: f64) {
        self.potential += current;
    }

    pub(crate) fn receive_spike(&mut self, weight: f64) {
        self.potential += weight;
    }

    /// Advances one time unit. The threshold is checked before decay; a spiking
    /// neuron resets to rest and skips decay for this step.
    pub(crate) fn step(&mut self) -> Option<Spike<impl Iterator<Item = (usize, f64)> + '_>> {
        self.spiked = false;

        if self.potential >= self.params.threshold {
            self.spiked = true;
            self.spike_count += 1;
            self.potential = self.params.resting_potential;

            Some(Spike(
                self.outgoing.iter().map(|syn| (syn.target, syn.weight)),
            ))
        } else {
            self.potential = decay_towards_rest(self.potential, &self.params);
            None
        }
    }

    pub(crate) fn record_spike_time(&mut self, t: usize) {
        if !self.spiked {
            return;
        }

        self.last_spike_time = Some(t);

        if self.spike_history.len() == SPIKE_HISTORY_CAPACITY {
            self.spike_history.pop_front();
        }
        self.spike_history.push_back(t);
    }

    /// Pairs this neuron's last spike with the last spike of each target and adjusts the
    /// corresponding weight. `last_spike_times` must already reflect the current step.
    /// Returns the number of synapses whose weight was touched.
    pub(crate) fn update_stdp(
        &mut self,
        last_spike_times: &[Option<usize>],
        learning_rate: f64,
        stdp_params: &StdpParams,
    ) -> usize {
        let t_pre = match self.last_spike_time {
            Some(t_pre) => t_pre,
            None => return 0,
        };

        let mut update_count = 0;

        for syn in &mut self.outgoing {
            if let Some(t_post) = last_spike_times.get(syn.target).copied().flatten() {
                let weight_change = compute_stdp(t_pre, t_post, learning_rate, stdp_params);
                if weight_change != 0.0 {
                    syn.apply_weight_change(weight_change, stdp_params);
                    update_count += 1;
                }
            }
        }

        update_count
    }

    pub(crate) fn reset(&mut self) {
        self.potential = self.params.resting_potential;
        self.spiked = false;
        self.spike_count = 0;
        self.last_spike_time = None;
        self.spike_history.clear();
    }
}

impl Default for Neuron {
    fn default() -> Self {
        Self::new(NeuronParams::default())
    }
}
