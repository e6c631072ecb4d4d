use lifnet::{
    classifier::Classifier,
    network::Network,
    params::SimulationParams,
    state_snapshot::StepRecorder,
};

#[path = "../scenario_params.rs"]
mod scenario_params;

#[path = "../digit_patterns.rs"]
mod digit_patterns;

fn exit_with_usage() -> ! {
    eprintln!("Usage: simulate_spiking <trained_network.json> [digit] [num_steps] [output_base]");
    std::process::exit(2);
}

fn parse_arg<T: std::str::FromStr>(arg: Option<String>, default: T) -> T {
    match arg {
        Some(text) => text.parse().unwrap_or_else(|_| exit_with_usage()),
        None => default,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = std::env::args().skip(1);
    let Some(snapshot_path) = args.next() else {
        exit_with_usage();
    };
    let digit: usize = parse_arg(args.next(), 0);
    let num_steps: usize = parse_arg(args.next(), 30);
    let output_base = args
        .next()
        .unwrap_or_else(|| format!("simulation_digit{}", digit));

    if digit >= digit_patterns::NUM_DIGITS || num_steps == 0 {
        exit_with_usage();
    }

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

    let simulation_params = SimulationParams {
        num_steps,
        ..params.simulation_params.clone()
    };

    let mut classifier =
        match Classifier::new(network, params.topology_params.clone(), simulation_params) {
            Ok(classifier) => classifier,
            Err(err) => {
                eprintln!("Error: {}", err);
                std::process::exit(1);
            }
        };

    let pixels = digit_patterns::digit_pattern(digit, 0, params.seed.unwrap_or(0));
    let mut recorder = StepRecorder::new(&output_base);

    let prediction = classifier.present_observed(&pixels, false, |step, network| {
        recorder.record(step, network);
    });

    let written = match recorder.finish() {
        Ok(written) => written,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    println!(
        "digit {} classified as {}, output spikes {:?}",
        digit, prediction.label, prediction.output_spikes
    );

    if let (Some(first), Some(last)) = (written.first(), written.last()) {
        println!(
            "wrote {} step snapshots: {} to {}",
            written.len(),
            first.display(),
            last.display()
        );
    }
}
