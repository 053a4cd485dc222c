use log::info;
use rand::Rng;
use simple_logger::SimpleLogger;

use wsn_sim::{SimConfig, Simulation};

fn main() {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    info!("starting");

    let mut seed = [0u8; 32];
    rand::thread_rng().fill(&mut seed);

    // nominal scenario: 10 nodes, 2 km area, one hour
    let config = SimConfig {
        rng_seed: Some(seed),
        ..Default::default()
    };

    let result = Simulation::new(config).and_then(|mut sim| sim.run());
    match result {
        Ok(result) => {
            result.print_summary();
            info!("let seed = {:?};", seed);
            info!("Delivered packets: {}", result.packet_stats.delivered);
            match result.packet_stats.mean_latency_us {
                Some(mean) => info!("Average latency: {:.2} µs", mean),
                None => info!("Average latency: n/a (nothing delivered)"),
            }
        }
        Err(e) => {
            eprintln!("simulation failed: {}", e);
            std::process::exit(1);
        }
    }
}
