use crate::params::{NeuronParams, StdpParams};

pub fn decay_towards_rest(potential: f64, neuron_params: &NeuronParams) -> f64 {
    neuron_params.resting_potential
        + (potential - neuron_params.resting_potential) * neuron_params.decay_factor
}

/// Weight change for a synapse given the most recent pre- and post-synaptic spike times.
/// Positive for pre before post, negative for post before pre, zero for coinciding spikes.
pub fn compute_stdp(
    t_pre: usize,
    t_post: usize,
    learning_rate: f64,
    stdp_params: &StdpParams,
) -> f64 {
    let dt = t_post as i64 - t_pre as i64;
    let dt_f = dt as f64;

    if dt > 0 {
        learning_rate * (-dt_f / stdp_params.tau_plus).exp()
    } else if dt < 0 {
        -learning_rate * (dt_f / stdp_params.tau_minus).exp()
    } else {
        0.0
    }
}

pub fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
