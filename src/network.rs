use log::{debug, trace};
use simple_error::{try_with, SimpleError};

use crate::{
    neuron::{Neuron, Spike},
    params::{self, NeuronParams, StdpParams},
};

/// Fixed-size arena of neurons. Indices are the only identity a neuron has, both in memory
/// and in persisted snapshots.
#[derive(Debug, Clone)]
pub struct Network {
    neurons: Vec<Neuron>,
    stdp_params: StdpParams,
}

impl Network {
    pub fn new(num_neurons: usize) -> Self {
        Self::build(num_neurons, NeuronParams::default(), StdpParams::default())
    }

    pub fn with_params(
        num_neurons: usize,
        neuron_params: NeuronParams,
        stdp_params: StdpParams,
    ) -> Result<Self, SimpleError> {
        try_with!(
            params::validate_neuron_params(&neuron_params),
            "invalid neuron parameters"
        );
        try_with!(
            params::validate_stdp_params(&stdp_params),
            "invalid stdp parameters"
        );

        Ok(Self::build(num_neurons, neuron_params, stdp_params))
    }

    fn build(num_neurons: usize, neuron_params: NeuronParams, stdp_params: StdpParams) -> Self {
        Self {
            neurons: (0..num_neurons).map(|_| Neuron::new(neuron_params)).collect(),
            stdp_params,
        }
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    pub fn stdp_params(&self) -> &StdpParams {
        &self.stdp_params
    }

    pub fn get_neuron(&self, nid: usize) -> Option<&Neuron> {
        self.neurons.get(nid)
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn connection_count(&self) -> usize {
        self.neurons.iter().map(Neuron::connection_count).sum()
    }

    pub fn spiking_neurons(&self) -> impl Iterator<Item = usize> + '_ {
        self.neurons
            .iter()
            .enumerate()
            .filter(|(_, neuron)| neuron.spiked())
            .map(|(nid, _)| nid)
    }

    /// Adds a synapse or overwrites the weight of an existing one. Self-loops and
    /// out-of-range indices are ignored.
    pub fn connect(&mut self, from: usize, to: usize, weight: f64) {
        if from == to || from >= self.len() || to >= self.len() {
            debug!("ignoring connection {} -> {}", from, to);
            return;
        }

        self.neurons[from].add_connection(to, weight);
    }

    pub fn remove_connection(&mut self, from: usize, to: usize) -> bool {
        match self.neurons.get_mut(from) {
            Some(neuron) => neuron.remove_connection(to),
            None => false,
        }
    }

    pub fn apply_input(&mut self, nid: usize, current: f64) {
        match self.neurons.get_mut(nid) {
            Some(neuron) => neuron.apply_input(current),
            None => debug!("ignoring input for invalid neuron id {}", nid),
        }
    }

    /// Rate coding: injects `values[i] * scale` into neuron `i` for every `i` below
    /// `input_layer_size`. Excess values are dropped.
    pub fn apply_inputs(&mut self, values: &[f64], scale: f64, input_layer_size: usize) {
        for (nid, value) in values.iter().enumerate().take(input_layer_size) {
            self.apply_input(nid, value * scale);
        }
    }

    /// One time step without learning. Returns the ids of neurons that spiked, ascending.
    pub fn update(&mut self) -> Vec<usize> {
        let mut spiking_nids = Vec::new();
        let mut synaptic_transmission_count = 0;

        for nid in 0..self.neurons.len() {
            let (head, tail) = self.neurons.split_at_mut(nid);
            let Some((neuron, tail)) = tail.split_first_mut() else {
                break;
            };

            if let Some(Spike(transmissions)) = neuron.step() {
                spiking_nids.push(nid);

                for (target, weight) in transmissions {
                    let post_syn_neuron = if target < nid {
                        &mut head[target]
                    } else {
                        &mut tail[target - nid - 1]
                    };
                    post_syn_neuron.receive_spike(weight);
                    synaptic_transmission_count += 1;
                }
            }
        }

        trace!(
            "{} spikes, {} synaptic transmissions",
            spiking_nids.len(),
            synaptic_transmission_count
        );

        spiking_nids
    }

    /// One time step followed by spike-time bookkeeping and the STDP pass. Each phase
    /// completes for the whole population before the next begins.
    pub fn update_with_learning(&mut self, time_step: usize, learning_rate: f64) -> Vec<usize> {
        let spiking_nids = self.update();

        for &nid in &spiking_nids {
            self.neurons[nid].record_spike_time(time_step);
        }

        let last_spike_times: Vec<_> = self.neurons.iter().map(Neuron::last_spike_time).collect();
        let stdp_params = self.stdp_params;

        let weight_update_count: usize = self
            .neurons
            .iter_mut()
            .map(|neuron| neuron.update_stdp(&last_spike_times, learning_rate, &stdp_params))
            .sum();

        trace!("t = {}: {} weight updates", time_step, weight_update_count);

        spiking_nids
    }

    pub fn reset(&mut self) {
        self.neurons.iter_mut().for_each(Neuron::reset);
    }
}
