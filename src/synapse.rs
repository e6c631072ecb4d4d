use crate::params::StdpParams;

/// Directed weighted edge. The target is an index into the owning network's neuron arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Synapse {
    pub target: usize,
    pub weight: f64,
}

impl Synapse {
    pub fn new(target: usize, weight: f64) -> Self {
        Self { target, weight }
    }

    /// Potentiation is capped at `max_weight`, depression floored at `min_weight`.
    /// The opposite bound is left alone, so weights set out of range by `connect` persist.
    pub fn apply_weight_change(&mut self, weight_change: f64, stdp_params: &StdpParams) {
        if weight_change > 0.0 {
            self.weight = (self.weight + weight_change).min(stdp_params.max_weight);
        } else if weight_change < 0.0 {
            self.weight = (self.weight + weight_change).max(stdp_params.min_weight);
        }
    }
}
