use std::time::Instant;

use lifnet::classifier::Classifier;
use log::info;
use rand::{rngs::StdRng, SeedableRng};

#[path = "../scenario_params.rs"]
mod scenario_params;

#[path = "../digit_patterns.rs"]
mod digit_patterns;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let out_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("trained_network.json"));

    let params = scenario_params::get_scenario_params();
    let seed = params.seed.unwrap_or(0);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut classifier = Classifier::from_params(&params, &mut rng).unwrap();
    let mut training_data = digit_patterns::synthetic_dataset(20, seed);
    let test_data = digit_patterns::synthetic_dataset(5, seed.wrapping_add(1));

    info!(
        "training on {} samples, network of {} neurons and {} synapses",
        training_data.len(),
        classifier.network().len(),
        classifier.network().connection_count()
    );

    let wall_start = Instant::now();
    let epochs = 10;

    for epoch in 0..epochs {
        let stats = classifier.train_epoch(&mut training_data, &mut rng);
        eprintln!(
            "Epoch {}/{}: accuracy {:.2}%, average loss {:.4}",
            epoch + 1,
            epochs,
            stats.accuracy() * 100.0,
            stats.average_loss()
        );
    }

    eprintln!("Training took {:.3} s", wall_start.elapsed().as_secs_f64());

    let confusion = classifier.evaluate(&test_data);
    eprintln!("Test accuracy: {:.2}%", confusion.accuracy() * 100.0);

    if let Err(err) = classifier.network().save(&out_path) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    eprintln!("Network saved to {}", out_path);
}
