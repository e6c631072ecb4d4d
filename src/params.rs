use serde::{Deserialize, Serialize};
use simple_error::SimpleError;

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentParams {
    pub topology_params: TopologyParams,
    pub neuron_params: NeuronParams,
    pub stdp_params: StdpParams,
    pub simulation_params: SimulationParams,
    pub seed: Option<u64>,
}

impl ExperimentParams {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SimpleError> {
        let params: Self = serde_yaml::from_str(yaml).map_err(SimpleError::from)?;
        validate_experiment_params(&params)?;
        Ok(params)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimpleError> {
        let params: Self = serde_json::from_str(json).map_err(SimpleError::from)?;
        validate_experiment_params(&params)?;
        Ok(params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeuronParams {
    pub threshold: f64,
    pub resting_potential: f64,
    pub decay_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StdpParams {
    pub learning_rate: f64,
    pub tau_plus: f64,
    pub tau_minus: f64,
    pub min_weight: f64,
    pub max_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParams {
    pub num_steps: usize,
    pub input_scale: f64,
    pub learn: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyParams {
    pub input_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub output_size: usize,
    pub initial_weight_min: f64,
    pub initial_weight_max: f64,
}

impl TopologyParams {
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_sizes.len() + 2);
        sizes.push(self.input_size);
        sizes.extend_from_slice(&self.hidden_sizes);
        sizes.push(self.output_size);
        sizes
    }

    pub fn total_neurons(&self) -> usize {
        self.layer_sizes().iter().sum()
    }

    pub fn output_start(&self) -> usize {
        self.total_neurons() - self.output_size
    }
}

impl Default for NeuronParams {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            resting_potential: 0.0,
            decay_factor: 0.9,
        }
    }
}

impl Default for StdpParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            tau_plus: 20.0,
            tau_minus: 20.0,
            min_weight: 0.0,
            max_weight: 1.0,
        }
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_steps: 20,
            input_scale: 2.0,
            learn: true,
        }
    }
}

impl Default for TopologyParams {
    fn default() -> Self {
        Self {
            input_size: 49,
            hidden_sizes: vec![50],
            output_size: 10,
            initial_weight_min: 0.1,
            initial_weight_max: 0.3,
        }
    }
}

pub fn validate_experiment_params(params: &ExperimentParams) -> Result<(), SimpleError> {
    validate_topology_params(&params.topology_params)?;
    validate_neuron_params(&params.neuron_params)?;
    validate_stdp_params(&params.stdp_params)?;
    validate_simulation_params(&params.simulation_params)?;
    Ok(())
}

pub fn validate_neuron_params(neuron_params: &NeuronParams) -> Result<(), SimpleError> {
    if neuron_params.decay_factor <= 0.0 || neuron_params.decay_factor >= 1.0 {
        return Err(SimpleError::new("decay_factor must be in (0, 1)"));
    }

    if neuron_params.threshold <= neuron_params.resting_potential {
        return Err(SimpleError::new(
            "threshold must be greater than resting_potential",
        ));
    }

    Ok(())
}

pub fn validate_stdp_params(stdp_params: &StdpParams) -> Result<(), SimpleError> {
    if stdp_params.tau_plus <= 0.0 {
        return Err(SimpleError::new("tau_plus must be strictly positive"));
    }

    if stdp_params.tau_minus <= 0.0 {
        return Err(SimpleError::new("tau_minus must be strictly positive"));
    }

    if stdp_params.learning_rate < 0.0 {
        return Err(SimpleError::new("learning_rate must not be negative"));
    }

    if stdp_params.min_weight > stdp_params.max_weight {
        return Err(SimpleError::new(
            "min_weight must not be greater than max_weight",
        ));
    }

    Ok(())
}

pub fn validate_simulation_params(simulation_params: &SimulationParams) -> Result<(), SimpleError> {
    if simulation_params.num_steps == 0 {
        return Err(SimpleError::new("num_steps must be strictly positive"));
    }

    Ok(())
}

pub fn validate_topology_params(topology_params: &TopologyParams) -> Result<(), SimpleError> {
    if topology_params.input_size == 0 {
        return Err(SimpleError::new("input_size must be strictly positive"));
    }

    if topology_params.output_size == 0 {
        return Err(SimpleError::new("output_size must be strictly positive"));
    }

    if topology_params.hidden_sizes.contains(&0) {
        return Err(SimpleError::new("hidden layers must not be empty"));
    }

    // the span must be finite too, weights are sampled uniformly from it
    let weight_span = topology_params.initial_weight_max - topology_params.initial_weight_min;
    if !topology_params.initial_weight_min.is_finite()
        || !topology_params.initial_weight_max.is_finite()
        || !weight_span.is_finite()
    {
        return Err(SimpleError::new("initial weight bounds must be finite"));
    }

    if topology_params.initial_weight_min >= topology_params.initial_weight_max {
        return Err(SimpleError::new(
            "initial_weight_min must be less than initial_weight_max",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_error(result: Result<(), SimpleError>, message: &str) {
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().as_str(), message);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_experiment_params(&ExperimentParams::default()).is_ok());
    }

    #[test]
    fn zero_decay_factor() {
        let mut params = NeuronParams::default();
        params.decay_factor = 0.0;
        assert_error(
            validate_neuron_params(&params),
            "decay_factor must be in (0, 1)",
        );
    }

    #[test]
    fn unit_decay_factor() {
        let mut params = NeuronParams::default();
        params.decay_factor = 1.0;
        assert_error(
            validate_neuron_params(&params),
            "decay_factor must be in (0, 1)",
        );
    }

    #[test]
    fn threshold_at_rest() {
        let mut params = NeuronParams::default();
        params.resting_potential = 1.0;
        assert_error(
            validate_neuron_params(&params),
            "threshold must be greater than resting_potential",
        );
    }

    #[test]
    fn zero_tau_plus() {
        let mut params = StdpParams::default();
        params.tau_plus = 0.0;
        assert_error(
            validate_stdp_params(&params),
            "tau_plus must be strictly positive",
        );
    }

    #[test]
    fn negative_tau_minus() {
        let mut params = StdpParams::default();
        params.tau_minus = -1.0;
        assert_error(
            validate_stdp_params(&params),
            "tau_minus must be strictly positive",
        );
    }

    #[test]
    fn negative_learning_rate() {
        let mut params = StdpParams::default();
        params.learning_rate = -0.01;
        assert_error(
            validate_stdp_params(&params),
            "learning_rate must not be negative",
        );
    }

    #[test]
    fn inverted_weight_bounds() {
        let mut params = StdpParams::default();
        params.min_weight = 2.0;
        assert_error(
            validate_stdp_params(&params),
            "min_weight must not be greater than max_weight",
        );
    }

    #[test]
    fn zero_num_steps() {
        let mut params = SimulationParams::default();
        params.num_steps = 0;
        assert_error(
            validate_simulation_params(&params),
            "num_steps must be strictly positive",
        );
    }

    #[test]
    fn empty_hidden_layer() {
        let mut params = TopologyParams::default();
        params.hidden_sizes = vec![10, 0];
        assert_error(
            validate_topology_params(&params),
            "hidden layers must not be empty",
        );
    }

    #[test]
    fn inverted_initial_weight_range() {
        let mut params = TopologyParams::default();
        params.initial_weight_min = 0.3;
        params.initial_weight_max = 0.1;
        assert_error(
            validate_topology_params(&params),
            "initial_weight_min must be less than initial_weight_max",
        );
    }

    #[test]
    fn non_finite_initial_weight_bounds() {
        let mut params = TopologyParams::default();
        params.initial_weight_min = f64::NAN;
        assert_error(
            validate_topology_params(&params),
            "initial weight bounds must be finite",
        );

        let mut params = TopologyParams::default();
        params.initial_weight_max = f64::INFINITY;
        assert_error(
            validate_topology_params(&params),
            "initial weight bounds must be finite",
        );

        let mut params = TopologyParams::default();
        params.initial_weight_min = -f64::MAX;
        params.initial_weight_max = f64::MAX;
        assert_error(
            validate_topology_params(&params),
            "initial weight bounds must be finite",
        );
    }

    #[test]
    fn layer_layout() {
        let params = TopologyParams {
            input_size: 4,
            hidden_sizes: vec![3, 2],
            output_size: 2,
            ..TopologyParams::default()
        };

        assert_eq!(params.layer_sizes(), vec![4, 3, 2, 2]);
        assert_eq!(params.total_neurons(), 11);
        assert_eq!(params.output_start(), 9);
    }

    #[test]
    fn yaml_round_trip_with_validation() {
        let yaml = r#"
topology_params:
  input_size: 49
  hidden_sizes: [20]
  output_size: 10
  initial_weight_min: 0.1
  initial_weight_max: 0.3
neuron_params:
  threshold: 1.0
  resting_potential: 0.0
  decay_factor: 0.9
stdp_params:
  learning_rate: 0.02
  tau_plus: 20.0
  tau_minus: 25.0
  min_weight: 0.0
  max_weight: 1.0
simulation_params:
  num_steps: 30
  input_scale: 2.0
  learn: true
seed: 7
"#;
        let params = ExperimentParams::from_yaml_str(yaml).unwrap();
        assert_eq!(params.topology_params.hidden_sizes, vec![20]);
        assert_eq!(params.simulation_params.num_steps, 30);
        assert_eq!(params.seed, Some(7));

        let invalid = yaml.replace("decay_factor: 0.9", "decay_factor: 1.5");
        let result = ExperimentParams::from_yaml_str(&invalid);
        assert_eq!(
            result.unwrap_err().as_str(),
            "decay_factor must be in (0, 1)"
        );
    }
}
