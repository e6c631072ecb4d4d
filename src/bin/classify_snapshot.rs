use lifnet::{classifier::Classifier, network::Network};

#[path = "../scenario_params.rs"]
mod scenario_params;

#[path = "../digit_patterns.rs"]
mod digit_patterns;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(snapshot_path) = std::env::args().nth(1) else {
        eprintln!("Usage: classify_snapshot <trained_network.json>");
        std::process::exit(2);
    };

    let params = scenario_params::get_scenario_params();

    let network = match Network::load_with_params(
        &snapshot_path,
        params.neuron_params,
        params.stdp_params,
    ) {
        Ok(network) => network,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    let mut classifier = match Classifier::new(
        network,
        params.topology_params.clone(),
        params.simulation_params.clone(),
    ) {
        Ok(classifier) => classifier,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    let test_data = digit_patterns::synthetic_dataset(10, params.seed.unwrap_or(0));
    let confusion = classifier.evaluate(&test_data);

    println!("accuracy: {:.2}%", confusion.accuracy() * 100.0);

    for (digit, accuracy) in confusion.per_class_accuracy().into_iter().enumerate() {
        match accuracy {
            Some(accuracy) => println!("...digit {}: {:.2}%", digit, accuracy * 100.0),
            None => println!("...digit {}: no samples", digit),
        }
    }
}
