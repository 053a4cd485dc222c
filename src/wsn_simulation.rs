// Simulation: wires scheduler, clock, jammer, nodes and logger together

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::wsn_clock::{GlobalClock, KeySchedule};
use crate::wsn_config::{PropagationModel, SimConfig};
use crate::wsn_error::Result;
use crate::wsn_graph_latency::GraphDelayProvider;
use crate::wsn_interface::{EventSink, KeyEpoch, Location, LoggingEventSink, NoOpSink, SimTime};
use crate::wsn_jammer::Jammer;
use crate::wsn_logger::PacketLog;
use crate::wsn_node::{Node, NodeParams};
use crate::wsn_propagation::{ChannelModel, DelayProvider, FixedDelay};
use crate::wsn_scheduler::Scheduler;

/// Services shared by all processes. Only the currently resumed process
/// touches it, so nothing here needs locking.
pub struct SimContext {
    pub jammer: Jammer,
    pub logger: PacketLog,
    pub keys: KeySchedule,
    pub propagation: Box<dyn DelayProvider>,
    pub event_sink: Box<dyn EventSink>,
}

impl SimContext {
    pub fn new(
        jammer: Jammer,
        propagation: Box<dyn DelayProvider>,
        event_sink: Box<dyn EventSink>,
    ) -> Self {
        Self {
            jammer,
            logger: PacketLog::new(),
            keys: KeySchedule::new(),
            propagation,
            event_sink,
        }
    }
}

pub struct Simulation {
    config: SimConfig,
    seed_used: [u8; 32],
    scheduler: Scheduler<SimContext>,
    context: SimContext,
    node_locations: Vec<Location>,
}

impl Simulation {
    /// Validate the configuration and build every process. Nothing runs yet.
    pub fn new(config: SimConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Like [`Simulation::new`] but with a caller supplied propagation model,
    /// overriding `config.propagation.model`.
    pub fn with_delay_provider(config: SimConfig, provider: Box<dyn DelayProvider>) -> Result<Self> {
        Self::build(config, Some(provider))
    }

    fn build(config: SimConfig, provider: Option<Box<dyn DelayProvider>>) -> Result<Self> {
        config.validate()?;

        let seed = config.resolve_seed();
        let mut rng = StdRng::from_seed(seed);

        // every process owns a generator split off the master seed
        let clock_rng = StdRng::seed_from_u64(rng.next_u64());
        let params = NodeParams::from_config(&config);
        let nodes: Vec<Node> = (0..config.num_nodes)
            .map(|id| Node::new(id as u32, params, StdRng::seed_from_u64(rng.next_u64())))
            .collect();
        let mut provider_rng = StdRng::seed_from_u64(rng.next_u64());

        let propagation = match provider {
            Some(provider) => provider,
            None => Self::delay_provider(&config, &mut provider_rng)?,
        };

        let event_sink: Box<dyn EventSink> = if config.enable_event_logging {
            Box::new(LoggingEventSink::new(true))
        } else {
            Box::new(NoOpSink)
        };
        let context = SimContext::new(Jammer::from_config(&config.jammer), propagation, event_sink);

        let node_locations = nodes.iter().map(|n| n.location()).collect();

        let mut scheduler = Scheduler::new();
        for node in nodes {
            scheduler.spawn(Box::new(node));
        }
        scheduler.spawn(Box::new(GlobalClock::new(&config.key_rotation, clock_rng)));

        Ok(Self {
            config,
            seed_used: seed,
            scheduler,
            context,
            node_locations,
        })
    }

    fn delay_provider(config: &SimConfig, rng: &mut StdRng) -> Result<Box<dyn DelayProvider>> {
        Ok(match &config.propagation.model {
            PropagationModel::Channel => Box::new(ChannelModel::from_config(&config.propagation)?),
            PropagationModel::Fixed { delay_us } => Box::new(FixedDelay(*delay_us)),
            PropagationModel::GraphSampled { sampler } => {
                Box::new(GraphDelayProvider::new(sampler, rng)?)
            }
        })
    }

    /// Run to the configured horizon, export CSV if requested, and summarise.
    pub fn run(&mut self) -> Result<SimResult> {
        log::info!(
            "running {} nodes for {}us (jammer r={}m at ({}, {}))",
            self.config.num_nodes,
            self.config.sim_duration_us,
            self.config.jammer.radius,
            self.config.jammer.center.x,
            self.config.jammer.center.y
        );

        self.scheduler
            .run(self.config.sim_duration_us, &mut self.context);

        log::info!(
            "horizon reached at {}us after {} resumptions, {} packets logged",
            self.scheduler.now(),
            self.scheduler.resumed(),
            self.context.logger.len()
        );

        if let Some(path) = &self.config.csv_output_path {
            self.context.logger.write_csv(path)?;
            log::info!("packet records written to {}", path);
        }

        Ok(self.build_result())
    }

    pub fn logger(&self) -> &PacketLog {
        &self.context.logger
    }

    pub fn key_rotations(&self) -> &[KeyEpoch] {
        self.context.keys.rotations()
    }

    pub fn node_locations(&self) -> &[Location] {
        &self.node_locations
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn seed_used(&self) -> [u8; 32] {
        self.seed_used
    }

    fn build_result(&self) -> SimResult {
        let logger = &self.context.logger;

        let mut delivered_per_node = vec![0usize; self.config.num_nodes];
        for record in logger.delivered() {
            if let Some(count) = delivered_per_node.get_mut(record.node as usize) {
                *count += 1;
            }
        }

        let total = logger.len();
        let delivered = logger.delivered_count();
        let delivery_ratio = if total > 0 {
            delivered as f64 / total as f64
        } else {
            0.0
        };

        SimResult {
            seed_used: self.seed_used,
            sim_duration_us: self.config.sim_duration_us,
            num_nodes: self.config.num_nodes,
            packet_stats: PacketStats {
                total,
                delivered,
                jammed: total - delivered,
                delivery_ratio,
                mean_latency_us: logger.mean_latency(),
                latency_range_us: logger.latency_range(),
            },
            key_rotations: self.context.keys.rotations().len(),
            events_resumed: self.scheduler.resumed(),
            delivered_per_node,
        }
    }
}

/// Simulation result
#[derive(Debug, Clone)]
pub struct SimResult {
    pub seed_used: [u8; 32],
    pub sim_duration_us: SimTime,
    pub num_nodes: usize,
    pub packet_stats: PacketStats,
    pub key_rotations: usize,
    pub events_resumed: u64,
    pub delivered_per_node: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketStats {
    pub total: usize,
    pub delivered: usize,
    pub jammed: usize,
    pub delivery_ratio: f64,
    /// over delivered packets only
    pub mean_latency_us: Option<f64>,
    pub latency_range_us: Option<(SimTime, SimTime)>,
}

impl SimResult {
    /// Print a summary of the simulation results
    pub fn print_summary(&self) {
        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║        Battlefield WSN Simulation Results              ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Configuration:");
        println!("  Seed: {:?}", self.seed_used);
        println!("  Nodes: {}", self.num_nodes);
        println!("  Horizon: {}us\n", self.sim_duration_us);

        let stats = &self.packet_stats;
        println!("Packet Statistics:");
        println!("  Total packets: {}", stats.total);
        println!("  Delivered packets: {}", stats.delivered);
        println!("  Jammed packets: {}", stats.jammed);
        println!("  Delivery ratio: {:.1}%", stats.delivery_ratio * 100.0);
        match stats.mean_latency_us {
            Some(mean) => println!("  Average latency: {:.2} µs", mean),
            None => println!("  Average latency: n/a"),
        }
        if let Some((min, max)) = stats.latency_range_us {
            println!("  Latency range: {} - {} µs", min, max);
        }
        println!();

        println!("Scheduler:");
        println!("  Key rotations: {}", self.key_rotations);
        println!("  Events resumed: {}", self.events_resumed);
        if !self.delivered_per_node.is_empty() {
            let min = self.delivered_per_node.iter().min().copied().unwrap_or(0);
            let max = self.delivered_per_node.iter().max().copied().unwrap_or(0);
            println!("  Delivered per node: min={}, max={}", min, max);
        }
        println!();
    }
}
