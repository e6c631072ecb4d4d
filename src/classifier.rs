use itertools::Itertools;
use log::{debug, info};
use rand::{distributions::Uniform, prelude::Distribution, seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use simple_error::{try_with, SimpleError};

use crate::{
    network::Network,
    params::{self, ExperimentParams, NeuronParams, SimulationParams, StdpParams, TopologyParams},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub pixels: Vec<f64>,
    pub label: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: usize,
    pub output_spikes: Vec<usize>,
}

impl Prediction {
    fn from_output_spikes(output_spikes: Vec<usize>) -> Self {
        // first index wins on ties
        let label = output_spikes
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|(_, spike_count)| **spike_count)
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        Self {
            label,
            output_spikes,
        }
    }

    /// Squared error between the one-hot target and the per-step output firing rates.
    pub fn loss(&self, target_label: usize, num_steps: usize) -> f64 {
        self.output_spikes
            .iter()
            .enumerate()
            .map(|(idx, spike_count)| {
                let target = if idx == target_label { 1.0 } else { 0.0 };
                let actual = *spike_count as f64 / num_steps as f64;
                (target - actual).powi(2)
            })
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpochStats {
    pub correct: usize,
    pub total: usize,
    pub total_loss: f64,
}

impl EpochStats {
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    pub fn average_loss(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.total_loss / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    num_classes: usize,
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            counts: vec![0; num_classes * num_classes],
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Labels outside the class range are not counted.
    pub fn record(&mut self, actual: usize, predicted: usize) {
        if actual < self.num_classes && predicted < self.num_classes {
            self.counts[actual * self.num_classes + predicted] += 1;
        } else {
            debug!(
                "not recording out of range pair actual={} predicted={}",
                actual, predicted
            );
        }
    }

    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        if actual < self.num_classes && predicted < self.num_classes {
            self.counts[actual * self.num_classes + predicted]
        } else {
            0
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|class| self.get(class, class)).sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// `None` for classes without samples.
    pub fn per_class_accuracy(&self) -> Vec<Option<f64>> {
        (0..self.num_classes)
            .map(|actual| {
                let row_total: usize = (0..self.num_classes)
                    .map(|predicted| self.get(actual, predicted))
                    .sum();
                if row_total == 0 {
                    None
                } else {
                    Some(ratio(self.get(actual, actual), row_total))
                }
            })
            .collect()
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Fully connects every layer to the next one with weights drawn uniformly from the
/// configured initial range. Neurons are laid out layer by layer, input layer first.
pub fn build_layered_network<R: Rng>(
    topology: &TopologyParams,
    neuron_params: NeuronParams,
    stdp_params: StdpParams,
    rng: &mut R,
) -> Result<Network, SimpleError> {
    try_with!(
        params::validate_topology_params(topology),
        "invalid topology parameters"
    );

    let mut network = Network::with_params(topology.total_neurons(), neuron_params, stdp_params)?;
    let weight_dist = Uniform::new(topology.initial_weight_min, topology.initial_weight_max);

    let layer_sizes = topology.layer_sizes();
    let layer_starts: Vec<usize> = layer_sizes
        .iter()
        .scan(0, |start, size| {
            let layer_start = *start;
            *start += size;
            Some(layer_start)
        })
        .collect();

    for ((from_start, from_size), (to_start, to_size)) in layer_starts
        .iter()
        .zip(&layer_sizes)
        .tuple_windows()
    {
        for from in *from_start..from_start + from_size {
            for to in *to_start..to_start + to_size {
                network.connect(from, to, weight_dist.sample(rng));
            }
        }
    }

    debug!(
        "built layered network {:?} with {} synapses",
        layer_sizes,
        network.connection_count()
    );

    Ok(network)
}

/// Rate-coded pattern classifier: pixel intensities are injected once as current into the
/// input layer, the network runs for a fixed number of steps and the output neuron with
/// the most spikes names the class.
#[derive(Debug, Clone)]
pub struct Classifier {
    network: Network,
    topology: TopologyParams,
    simulation_params: SimulationParams,
}

impl Classifier {
    pub fn new(
        network: Network,
        topology: TopologyParams,
        simulation_params: SimulationParams,
    ) -> Result<Self, SimpleError> {
        try_with!(
            params::validate_simulation_params(&simulation_params),
            "invalid simulation parameters"
        );

        if network.len() != topology.total_neurons() {
            return Err(SimpleError::new(format!(
                "network has {} neurons but topology requires {}",
                network.len(),
                topology.total_neurons()
            )));
        }

        Ok(Self {
            network,
            topology,
            simulation_params,
        })
    }

    pub fn from_params<R: Rng>(params: &ExperimentParams, rng: &mut R) -> Result<Self, SimpleError> {
        try_with!(
            params::validate_experiment_params(params),
            "invalid experiment parameters"
        );

        let network = build_layered_network(
            &params.topology_params,
            params.neuron_params,
            params.stdp_params,
            rng,
        )?;

        Self::new(
            network,
            params.topology_params.clone(),
            params.simulation_params.clone(),
        )
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    pub fn topology(&self) -> &TopologyParams {
        &self.topology
    }

    pub fn simulation_params(&self) -> &SimulationParams {
        &self.simulation_params
    }

    pub fn present(&mut self, pixels: &[f64], learn: bool) -> Prediction {
        self.present_observed(pixels, learn, |_, _| {})
    }

    /// Like `present`, calling `on_step` with the step index and the network state after
    /// every step.
    pub fn present_observed<F>(
        &mut self,
        pixels: &[f64],
        learn: bool,
        mut on_step: F,
    ) -> Prediction
    where
        F: FnMut(usize, &Network),
    {
        let num_steps = self.simulation_params.num_steps;
        let output_start = self.topology.output_start();
        let output_size = self.topology.output_size;
        let learning_rate = self.network.stdp_params().learning_rate;

        self.network.reset();
        self.network.apply_inputs(
            pixels,
            self.simulation_params.input_scale,
            self.topology.input_size,
        );

        let mut output_spikes = vec![0; output_size];

        for step in 0..num_steps {
            let spiking_nids = if learn {
                self.network.update_with_learning(step, learning_rate)
            } else {
                self.network.update()
            };

            for nid in spiking_nids {
                if nid >= output_start {
                    output_spikes[nid - output_start] += 1;
                }
            }

            on_step(step, &self.network);
        }

        Prediction::from_output_spikes(output_spikes)
    }

    pub fn predict(&mut self, pixels: &[f64]) -> Prediction {
        self.present(pixels, false)
    }

    pub fn train_sample(&mut self, sample: &Sample) -> Prediction {
        self.present(&sample.pixels, self.simulation_params.learn)
    }

    pub fn train_epoch<R: Rng>(&mut self, samples: &mut [Sample], rng: &mut R) -> EpochStats {
        samples.shuffle(rng);

        let mut stats = EpochStats::default();

        for sample in samples.iter() {
            let prediction = self.train_sample(sample);

            if prediction.label == sample.label {
                stats.correct += 1;
            }
            stats.total += 1;
            stats.total_loss += prediction.loss(sample.label, self.simulation_params.num_steps);
        }

        info!(
            "epoch: accuracy {:.2}% ({}/{}), average loss {:.4}",
            stats.accuracy() * 100.0,
            stats.correct,
            stats.total,
            stats.average_loss()
        );

        stats
    }

    pub fn evaluate(&mut self, samples: &[Sample]) -> ConfusionMatrix {
        let mut confusion = ConfusionMatrix::new(self.topology.output_size);

        for sample in samples {
            let prediction = self.predict(&sample.pixels);
            confusion.record(sample.label, prediction.label);
        }

        info!(
            "evaluation: accuracy {:.2}% ({}/{})",
            confusion.accuracy() * 100.0,
            confusion.correct(),
            samples.len()
        );

        confusion
    }
}
