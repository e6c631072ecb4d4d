use lifnet::params::ExperimentParams;

pub fn get_scenario_params() -> ExperimentParams {
    let params_yaml_str = r#"
topology_params:
  input_size: 49
  hidden_sizes:
  - 50
  output_size: 10
  initial_weight_min: 0.1
  initial_weight_max: 0.3
neuron_params:
  threshold: 1.0
  resting_potential: 0.0
  decay_factor: 0.9
stdp_params:
  learning_rate: 0.01
  tau_plus: 20.0
  tau_minus: 20.0
  min_weight: 0.0
  max_weight: 1.0
simulation_params:
  num_steps: 20
  input_scale: 2.0
  learn: true
seed: 42
"#;

    ExperimentParams::from_yaml_str(params_yaml_str).unwrap()
}
