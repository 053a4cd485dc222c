// Scenario Runner - Load and execute scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/nominal.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/nominal.yaml --seed 0x1234...

use std::env;
use std::fs;
use std::path::Path;

use log::info;
use simple_logger::SimpleLogger;

use wsn_sim::{ConfigError, PropagationModel, SimConfig, Simulation};

/// Scenario file format
#[derive(Debug, serde::Deserialize)]
struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    meta: ScenarioMeta,

    /// Configuration overrides, anything missing keeps its default
    #[serde(default)]
    config: SimConfig,

    /// Hex seed; a random one is drawn when absent
    #[serde(default)]
    seed: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
    hypothesis: Option<String>,
}

fn main() {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED_HEX]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/nominal.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/nominal.yaml --seed 0x123456...", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);

    // Parse optional seed
    let seed: Option<[u8; 32]> = if args.len() >= 4 && args[2] == "--seed" {
        Some(parse_seed_hex(&args[3]).unwrap_or_else(|e| {
            eprintln!("Invalid hex seed: {}", e);
            std::process::exit(1);
        }))
    } else {
        None
    };

    let outcome = if path.is_file() {
        run_scenario_file(path, seed)
    } else if path.is_dir() {
        run_scenario_directory(path, seed)
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_scenario_directory(dir: &Path, seed: Option<[u8; 32]>) -> Result<(), ConfigError> {
    let mut scenarios = Vec::new();

    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        let ext = path.extension().and_then(|s| s.to_str());
        if ext == Some("yaml") || ext == Some("yml") {
            scenarios.push(path);
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        std::process::exit(1);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO RUNNER - Multiple Scenarios                  ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Found {} scenario(s) to run\n", scenarios.len());

    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        run_scenario_file(scenario_path, seed)?;
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  All scenarios complete!                               ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    Ok(())
}

fn run_scenario_file(path: &Path, seed: Option<[u8; 32]>) -> Result<(), ConfigError> {
    info!("Loading scenario from: {}", path.display());

    let yaml_content = fs::read_to_string(path)?;
    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content)?;

    // Print scenario header
    println!("\n╔════════════════════════════════════════════════════════╗");
    match scenario.meta.name {
        Some(ref name) => println!("║  {}", name),
        None => println!(
            "║  Scenario: {}",
            path.file_stem().and_then(|s| s.to_str()).unwrap_or("?")
        ),
    }
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    let mut config = scenario.config;
    // command line seed wins over the file
    config.rng_seed = match (seed, scenario.seed.as_deref()) {
        (Some(seed), _) => Some(seed),
        (None, Some(hex)) => Some(parse_seed_hex(hex).unwrap_or_else(|e| {
            eprintln!("Invalid hex seed in {}: {}", path.display(), e);
            std::process::exit(1);
        })),
        (None, None) => None,
    };

    println!("Configuration:");
    println!("  Nodes: {}", config.num_nodes);
    println!("  Area: {} m", config.area_size);
    println!("  Horizon: {} us", config.sim_duration_us);
    println!(
        "  Jammer: r={} m at ({}, {}), against {:?}",
        config.jammer.radius, config.jammer.center.x, config.jammer.center.y, config.jammer.jam_against
    );
    println!(
        "  Crypto: aes={} us, hmac={} us",
        config.crypto.aes_delay_us, config.crypto.hmac_delay_us
    );
    let model = match &config.propagation.model {
        PropagationModel::Channel => "channel".to_string(),
        PropagationModel::Fixed { delay_us } => format!("fixed {} us", delay_us),
        PropagationModel::GraphSampled { sampler } => {
            format!("graph sampled ({} nodes)", sampler.num_nodes)
        }
    };
    println!("  Propagation: {}", model);
    println!("\nStarting simulation...\n");

    let mut sim = Simulation::new(config)?;
    let result = sim.run()?;

    result.print_summary();

    println!("\n✓ Scenario complete!\n");
    Ok(())
}

/// Exactly 64 hex digits, optionally prefixed with `0x`.
fn parse_seed_hex(hex: &str) -> Result<[u8; 32], String> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.len() != 64 {
        return Err(format!("expected 64 hex digits, got {}", digits.len()));
    }

    let mut seed = [0u8; 32];
    hex::decode_to_slice(digits, &mut seed).map_err(|e| e.to_string())?;
    Ok(seed)
}
