//! # wsn_sim - Battlefield Wireless Sensor Network Simulation
//!
//! A discrete-event simulation of a battlefield sensor network. Nodes
//! periodically generate packets that pass through encryption,
//! authentication and radio propagation stages before being checked against
//! a circular jamming zone; a global clock rotates key epochs on a jittered
//! interval. Every packet outcome is logged for later analysis.
//!
//! ## Core Components
//!
//! - **Scheduler**: virtual clock plus a `(due_time, sequence)` ordered event
//!   queue driving cooperative processes
//! - **GlobalClock**: periodic key rotation process
//! - **Node**: per-device packet cycle, an explicit phase machine
//! - **Jammer**: stateless spatial predicate
//! - **PacketLog**: append-only packet records with aggregate queries
//! - **Simulation**: owns all of the above and runs to the horizon
//!
//! ```no_run
//! use wsn_sim::{SimConfig, Simulation};
//!
//! let config = SimConfig {
//!     rng_seed: Some([42u8; 32]),
//!     ..Default::default()
//! };
//! let mut sim = Simulation::new(config).unwrap();
//! let result = sim.run().unwrap();
//! result.print_summary();
//! ```
//!
//! Propagation delay is pluggable through [`DelayProvider`]: the default
//! channel model, a fixed override, or latencies sampled from a multi-hop
//! radio graph ([`wsn_graph_latency`]). Crypto stage costs can be measured on
//! the host with [`wsn_crypto_timing`].

pub mod wsn_interface;
pub mod wsn_error;
pub mod wsn_config;
pub mod wsn_scheduler;
pub mod wsn_clock;
pub mod wsn_jammer;
pub mod wsn_propagation;
pub mod wsn_node;
pub mod wsn_logger;
pub mod wsn_simulation;

// External collaborators
pub mod wsn_graph_latency;
pub mod wsn_crypto_timing;

// Re-export commonly used types
pub use wsn_config::{
    CryptoDelayConfig, JamTarget, JammerConfig, KeyRotationConfig, PropagationConfig,
    PropagationModel, SimConfig,
};
pub use wsn_error::{ConfigError, Result};
pub use wsn_interface::{
    Event, EventSink, KeyEpoch, Location, NoOpSink, NodeId, PacketRecord, SimTime,
};
pub use wsn_logger::PacketLog;
pub use wsn_propagation::{ChannelModel, DelayProvider, FixedDelay};
pub use wsn_simulation::{PacketStats, SimResult, Simulation};
