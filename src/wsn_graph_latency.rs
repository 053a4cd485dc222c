//! Graph-based latency sampler
//!
//! Scatters nodes over a square area and connects them with two link
//! families: a short-range, low-latency mesh (ESP-NOW class radios) and a
//! long-range, high-latency backhaul (LoRa class radios). Each edge weight is
//! `base + per_meter * distance + N(0, jitter_sd)` milliseconds. Random node
//! pairs are then routed over the cheapest path in the preferred graph.
//!
//! The resulting (distance, latency) table can stand in for the channel model
//! as a propagation [`DelayProvider`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::wsn_error::{ConfigError, Result};
use crate::wsn_interface::{Location, SimTime};
use crate::wsn_node::random_location;
use crate::wsn_propagation::DelayProvider;

/// Latency profile of one link family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkProfile {
    pub range_m: f64,
    pub base_ms: f64,
    pub per_meter_ms: f64,
    pub jitter_sd_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphLatencyConfig {
    pub num_nodes: usize,
    pub area_size: f64,
    pub short_range: LinkProfile,
    pub long_range: LinkProfile,
    /// number of random pairs to route
    pub samples: usize,
}

impl Default for GraphLatencyConfig {
    fn default() -> Self {
        Self {
            num_nodes: 50,
            area_size: 2000.0,
            short_range: LinkProfile {
                range_m: 300.0,
                base_ms: 20.0,
                per_meter_ms: 0.05,
                jitter_sd_ms: 2.0,
            },
            long_range: LinkProfile {
                range_m: 8000.0,
                base_ms: 200.0,
                per_meter_ms: 0.01,
                jitter_sd_ms: 5.0,
            },
            samples: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    ShortRange,
    LongRange,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::ShortRange => write!(f, "ESP-NOW"),
            LinkKind::LongRange => write!(f, "LoRa"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    pub src: usize,
    pub dst: usize,
    pub distance_m: f64,
    pub link: LinkKind,
    pub latency_ms: f64,
}

/// Routed pairs plus the number of pairs with no path in either graph.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    pub samples: Vec<LatencySample>,
    pub unreachable: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkSummary {
    pub link: LinkKind,
    pub count: usize,
    pub mean_latency_ms: f64,
    pub mean_distance_m: f64,
}

// ============================================================================
// Weighted graph
// ============================================================================

struct LinkGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
}

#[derive(Copy, Clone, PartialEq)]
struct Frontier {
    cost: f64,
    node: usize,
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl LinkGraph {
    fn new(nodes: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); nodes],
        }
    }

    fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        self.adjacency[a].push((b, weight));
        self.adjacency[b].push((a, weight));
    }

    /// Dijkstra; `None` when `to` is unreachable from `from`.
    fn shortest_path(&self, from: usize, to: usize) -> Option<f64> {
        let mut best = vec![f64::INFINITY; self.adjacency.len()];
        let mut heap = BinaryHeap::new();
        best[from] = 0.0;
        heap.push(Frontier {
            cost: 0.0,
            node: from,
        });

        while let Some(Frontier { cost, node }) = heap.pop() {
            if node == to {
                return Some(cost);
            }
            if cost > best[node] {
                continue;
            }
            for &(next, weight) in &self.adjacency[node] {
                let candidate = cost + weight;
                if candidate < best[next] {
                    best[next] = candidate;
                    heap.push(Frontier {
                        cost: candidate,
                        node: next,
                    });
                }
            }
        }
        None
    }
}

// ============================================================================
// Sampler
// ============================================================================

pub struct GraphLatencySampler {
    positions: Vec<Location>,
    short_range_m: f64,
    short: LinkGraph,
    long: LinkGraph,
}

fn jitter(profile: &LinkProfile, name: &'static str) -> Result<Normal<f64>> {
    Normal::new(0.0, profile.jitter_sd_ms).map_err(|e| ConfigError::InvalidDistribution {
        name,
        reason: e.to_string(),
    })
}

fn link_latency(profile: &LinkProfile, distance: f64, noise: &Normal<f64>, rng: &mut StdRng) -> f64 {
    // negative weights would break shortest-path search
    (profile.base_ms + profile.per_meter_ms * distance + noise.sample(rng)).max(0.0)
}

impl GraphLatencySampler {
    /// Place the nodes and build both link graphs.
    pub fn new(config: &GraphLatencyConfig, rng: &mut StdRng) -> Result<Self> {
        if !(config.area_size.is_finite() && config.area_size > 0.0) {
            return Err(ConfigError::InvalidArea(config.area_size));
        }
        let short_noise = jitter(&config.short_range, "short-range link jitter")?;
        let long_noise = jitter(&config.long_range, "long-range link jitter")?;

        let positions: Vec<Location> = (0..config.num_nodes)
            .map(|_| random_location(rng, config.area_size))
            .collect();

        let mut short = LinkGraph::new(positions.len());
        let mut long = LinkGraph::new(positions.len());
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let distance = positions[i].distance(&positions[j]);
                if distance <= config.short_range.range_m {
                    let weight = link_latency(&config.short_range, distance, &short_noise, rng);
                    short.add_edge(i, j, weight);
                }
                if distance <= config.long_range.range_m {
                    let weight = link_latency(&config.long_range, distance, &long_noise, rng);
                    long.add_edge(i, j, weight);
                }
            }
        }

        Ok(Self {
            positions,
            short_range_m: config.short_range.range_m,
            short,
            long,
        })
    }

    pub fn positions(&self) -> &[Location] {
        &self.positions
    }

    /// Route one pair. Short range is used only when the endpoints are within
    /// short radio range of each other and a short-range path exists.
    pub fn route(&self, src: usize, dst: usize) -> Option<LatencySample> {
        let distance_m = self.positions.get(src)?.distance(self.positions.get(dst)?);

        let short = if distance_m <= self.short_range_m {
            self.short.shortest_path(src, dst)
        } else {
            None
        };
        let (link, latency_ms) = match short {
            Some(latency) => (LinkKind::ShortRange, latency),
            None => (LinkKind::LongRange, self.long.shortest_path(src, dst)?),
        };

        Some(LatencySample {
            src,
            dst,
            distance_m,
            link,
            latency_ms,
        })
    }

    /// Route `count` random pairs of distinct nodes.
    pub fn sample(&self, count: usize, rng: &mut StdRng) -> SampleSet {
        let mut set = SampleSet::default();
        if self.positions.len() < 2 {
            return set;
        }

        for _ in 0..count {
            let pair = rand::seq::index::sample(rng, self.positions.len(), 2);
            match self.route(pair.index(0), pair.index(1)) {
                Some(sample) => set.samples.push(sample),
                None => set.unreachable += 1,
            }
        }
        set
    }
}

/// Per-link count and means, ordered short range first.
pub fn summarize(samples: &[LatencySample]) -> Vec<LinkSummary> {
    let mut totals: HashMap<LinkKind, (usize, f64, f64)> = HashMap::new();
    for s in samples {
        let entry = totals.entry(s.link).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += s.latency_ms;
        entry.2 += s.distance_m;
    }

    let mut summary: Vec<LinkSummary> = totals
        .into_iter()
        .map(|(link, (count, latency, distance))| LinkSummary {
            link,
            count,
            mean_latency_ms: latency / count as f64,
            mean_distance_m: distance / count as f64,
        })
        .collect();
    summary.sort_by_key(|s| s.link);
    summary
}

// ============================================================================
// Delay provider
// ============================================================================

/// Answers with the sampled latency whose pair distance is nearest the query.
#[derive(Debug, Clone)]
pub struct GraphDelayProvider {
    // (distance_m, latency_us), sorted by distance
    table: Vec<(f64, SimTime)>,
}

impl GraphDelayProvider {
    pub fn new(config: &GraphLatencyConfig, rng: &mut StdRng) -> Result<Self> {
        let sampler = GraphLatencySampler::new(config, rng)?;
        let set = sampler.sample(config.samples, rng);
        log::info!(
            "graph latency table: {} samples, {} unreachable pairs",
            set.samples.len(),
            set.unreachable
        );
        Self::from_samples(&set.samples)
    }

    pub fn from_samples(samples: &[LatencySample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(ConfigError::EmptyLatencyTable);
        }
        let mut table: Vec<(f64, SimTime)> = samples
            .iter()
            .map(|s| (s.distance_m, (s.latency_ms * 1000.0).max(0.0) as SimTime))
            .collect();
        table.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn lookup(&self, distance_m: f64) -> SimTime {
        let idx = self.table.partition_point(|(d, _)| *d < distance_m);
        let above = self.table.get(idx);
        let below = idx.checked_sub(1).and_then(|i| self.table.get(i));
        match (below, above) {
            (Some(b), Some(a)) => {
                if distance_m - b.0 <= a.0 - distance_m {
                    b.1
                } else {
                    a.1
                }
            }
            (Some(b), None) => b.1,
            (None, Some(a)) => a.1,
            (None, None) => 0,
        }
    }
}

impl DelayProvider for GraphDelayProvider {
    fn delay_us(&self, distance_m: f64, _rng: &mut StdRng) -> SimTime {
        self.lookup(distance_m)
    }
}
