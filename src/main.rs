use std::time::Duration;

use plexus::prelude::*;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h" || args[1] == "help") {
        print_help();
        return;
    }
    if args.len() >= 2 && args[1] == "background" {
        if let Err(e) = run_background_demo() {
            eprintln!("background demo failed: {e}");
            std::process::exit(1);
        }
        return;
    }

    if args.len() >= 2 {
        eprintln!("Unknown command: {}", args[1]);
        print_help();
        std::process::exit(2);
    }

    if let Err(e) = run_training_demo() {
        eprintln!("training demo failed: {e}");
        std::process::exit(1);
    }
}

fn print_help() {
    println!("plexus - asynchronous sparse network with local learning");
    println!();
    println!("Usage:");
    println!("  plexus              train a small network on two patterns (deterministic)");
    println!("  plexus background   same patterns, propagated by the background worker");
    println!("  plexus help         show this message");
}

// Two input patterns, each mapped to the complementary output pattern.
const PATTERNS: [([f64; 4], [f64; 2]); 2] = [
    ([1.0, 1.0, 0.0, 0.0], [1.0, 0.0]),
    ([0.0, 0.0, 1.0, 1.0], [0.0, 1.0]),
];

fn demo_config() -> NetworkConfig {
    NetworkConfig::with_size(120, 4, 2)
        .with_connectivity(0.08)
        .with_precision(2)
        .with_decay_factor(0.999)
        .with_seed(7)
}

fn run_training_demo() -> Result<(), NetworkError> {
    let mut network = Network::new(demo_config())?;
    let diag = network.diagnostics();
    println!(
        "{} neurons, {} connections, mean |w| {:.3}",
        diag.neuron_count, diag.connection_count, diag.avg_abs_weight
    );

    for round in 0..30 {
        for (input, target) in &PATTERNS {
            network.load(input, Some(&target[..]))?;
            network.run_waves(5);
        }
        if round % 10 == 9 {
            println!("round {:>2}: {}", round + 1, evaluate(&mut network)?);
        }
    }

    let diag = network.diagnostics();
    println!(
        "fires: {}  waves: {}  mean |w| {:.3}",
        diag.fire_counter, diag.wave_counter, diag.avg_abs_weight
    );
    Ok(())
}

/// Present each pattern without a target and report the outputs.
fn evaluate(network: &mut Network) -> Result<String, NetworkError> {
    let mut parts = Vec::new();
    for (input, target) in &PATTERNS {
        network.load(input, None)?;
        network.run_waves(3);
        parts.push(format!("{:?} -> {:?} (want {:?})", input, network.output(), target));
    }
    Ok(parts.join("  "))
}

fn run_background_demo() -> Result<(), Box<dyn std::error::Error>> {
    let runner = NetworkRunner::ignite(Network::new(demo_config())?)?;

    for _ in 0..10 {
        for (input, target) in &PATTERNS {
            runner.load(input, Some(&target[..]))?;
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    runner.freeze();
    for (input, _) in &PATTERNS {
        runner.load(input, None)?;
        runner.resume();
        std::thread::sleep(Duration::from_millis(20));
        runner.freeze();
        println!("{:?} -> {:?}", input, runner.output());
    }

    let diag = runner.diagnostics();
    println!("fires: {}  waves: {}", diag.fire_counter, diag.wave_counter);
    Ok(())
}
