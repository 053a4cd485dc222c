//! Sensor node process
//!
//! Each node repeats one packet cycle forever:
//! sleep -> encrypt -> authenticate -> propagate -> jam check -> log.
//! The cycle is an explicit phase machine; every phase transition is a
//! suspension handed back to the scheduler, so a node never has more than one
//! packet in flight.

use rand::rngs::StdRng;
use rand::Rng;

use crate::wsn_config::{JamTarget, SimConfig};
use crate::wsn_interface::{EpochIndex, Event, Location, NodeId, PacketRecord, SimTime};
use crate::wsn_scheduler::{Process, Resume};
use crate::wsn_simulation::SimContext;

const MAC_KEY_CONTEXT: &str = "wsn_sim packet mac v1";

/// Per-node cycle parameters, copied out of the simulation config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeParams {
    pub gap_us: (SimTime, SimTime),
    pub aes_delay_us: SimTime,
    pub hmac_delay_us: SimTime,
    pub area_size: f64,
    pub jam_against: JamTarget,
}

impl NodeParams {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            gap_us: config.packet_gap_us,
            aes_delay_us: config.crypto.aes_delay_us,
            hmac_delay_us: config.crypto.hmac_delay_us,
            area_size: config.area_size,
            jam_against: config.jammer.jam_against,
        }
    }
}

/// Where the node is in its packet cycle; each variant is a suspension point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodePhase {
    /// spawned, not yet resumed
    Idle,
    Sleeping,
    Encrypting {
        start: SimTime,
    },
    Authenticating {
        start: SimTime,
    },
    Propagating {
        start: SimTime,
        reference: Location,
        key_epoch: EpochIndex,
        digest: [u8; 32],
    },
}

pub struct Node {
    id: NodeId,
    location: Location,
    params: NodeParams,
    rng: StdRng,
    phase: NodePhase,
    seq: u64,
}

impl Node {
    /// Create a node at a uniformly sampled location inside the area.
    pub fn new(id: NodeId, params: NodeParams, mut rng: StdRng) -> Self {
        let location = random_location(&mut rng, params.area_size);
        Self::with_location(id, location, params, rng)
    }

    pub fn with_location(id: NodeId, location: Location, params: NodeParams, rng: StdRng) -> Self {
        Self {
            id,
            location,
            params,
            rng,
            phase: NodePhase::Idle,
            seq: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn phase(&self) -> NodePhase {
        self.phase
    }

    /// Packets completed so far
    pub fn packets_sent(&self) -> u64 {
        self.seq
    }

    fn sleep(&mut self) -> Resume {
        let (min_gap, max_gap) = self.params.gap_us;
        let gap = self.rng.gen_range(min_gap..=max_gap);
        self.phase = NodePhase::Sleeping;
        Resume::After(gap)
    }

    /// Keyed digest of the (conceptually encrypted) payload under the key of
    /// the current epoch. Bookkeeping only.
    fn authenticate(&self, key_epoch: EpochIndex) -> [u8; 32] {
        let key = blake3::derive_key(MAC_KEY_CONTEXT, &key_epoch.to_le_bytes());
        let mut payload = [0u8; 12];
        payload[..4].copy_from_slice(&self.id.to_le_bytes());
        payload[4..].copy_from_slice(&self.seq.to_le_bytes());
        *blake3::keyed_hash(&key, &payload).as_bytes()
    }

    fn finish(
        &mut self,
        now: SimTime,
        ctx: &mut SimContext,
        start: SimTime,
        reference: Location,
        key_epoch: EpochIndex,
        digest: [u8; 32],
    ) {
        let target = match self.params.jam_against {
            JamTarget::FixedLocation => self.location,
            JamTarget::FreshRandomLocation => reference,
        };
        let success = !ctx.jammer.jammed(&target);
        let latency_us = now - start;

        ctx.logger.log(PacketRecord {
            node: self.id,
            seq: self.seq,
            start_time: start,
            end_time: now,
            latency_us,
            success,
            key_epoch,
            digest,
        });

        let event = if success {
            Event::PacketDelivered {
                seq: self.seq,
                latency_us,
            }
        } else {
            Event::PacketJammed {
                seq: self.seq,
                latency_us,
            }
        };
        ctx.event_sink.log(now, Some(self.id), event);
        self.seq += 1;
    }
}

impl Process<SimContext> for Node {
    fn resume(&mut self, now: SimTime, ctx: &mut SimContext) -> Resume {
        match self.phase {
            NodePhase::Idle => self.sleep(),
            NodePhase::Sleeping => {
                ctx.event_sink
                    .log(now, Some(self.id), Event::PacketGenerated { seq: self.seq });
                self.phase = NodePhase::Encrypting { start: now };
                Resume::After(self.params.aes_delay_us)
            }
            NodePhase::Encrypting { start } => {
                self.phase = NodePhase::Authenticating { start };
                Resume::After(self.params.hmac_delay_us)
            }
            NodePhase::Authenticating { start } => {
                let key_epoch = ctx.keys.current();
                let digest = self.authenticate(key_epoch);
                let reference = random_location(&mut self.rng, self.params.area_size);
                let distance = self.location.distance(&reference);
                let delay = ctx.propagation.delay_us(distance, &mut self.rng);
                self.phase = NodePhase::Propagating {
                    start,
                    reference,
                    key_epoch,
                    digest,
                };
                Resume::After(delay)
            }
            NodePhase::Propagating {
                start,
                reference,
                key_epoch,
                digest,
            } => {
                self.finish(now, ctx, start, reference, key_epoch, digest);
                self.sleep()
            }
        }
    }
}

pub fn random_location(rng: &mut StdRng, area_size: f64) -> Location {
    Location::new(rng.gen_range(0.0..area_size), rng.gen_range(0.0..area_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wsn_jammer::Jammer;
    use crate::wsn_propagation::FixedDelay;
    use rand::SeedableRng;

    fn params(gap: SimTime) -> NodeParams {
        NodeParams {
            gap_us: (gap, gap),
            aes_delay_us: 150,
            hmac_delay_us: 200,
            area_size: 100.0,
            jam_against: JamTarget::FixedLocation,
        }
    }

    fn context(radius: f64, propagation_us: SimTime) -> SimContext {
        SimContext::new(
            Jammer::new(Location::new(0.0, 0.0), radius, -90.0),
            Box::new(FixedDelay(propagation_us)),
            Box::new(crate::wsn_interface::NoOpSink),
        )
    }

    #[test]
    fn test_cycle_walks_every_phase() {
        let mut ctx = context(0.0, 7);
        let mut node = Node::with_location(1, Location::new(5.0, 5.0), params(1000), StdRng::seed_from_u64(1));

        assert_eq!(node.resume(0, &mut ctx), Resume::After(1000));
        assert_eq!(node.phase(), NodePhase::Sleeping);

        assert_eq!(node.resume(1000, &mut ctx), Resume::After(150));
        assert_eq!(node.phase(), NodePhase::Encrypting { start: 1000 });

        assert_eq!(node.resume(1150, &mut ctx), Resume::After(200));
        assert_eq!(node.phase(), NodePhase::Authenticating { start: 1000 });

        assert_eq!(node.resume(1350, &mut ctx), Resume::After(7));
        assert!(matches!(node.phase(), NodePhase::Propagating { start: 1000, .. }));
        assert!(ctx.logger.is_empty());

        assert_eq!(node.resume(1357, &mut ctx), Resume::After(1000));
        assert_eq!(node.phase(), NodePhase::Sleeping);
        assert_eq!(node.packets_sent(), 1);

        let record = ctx.logger.records()[0];
        assert_eq!(record.start_time, 1000);
        assert_eq!(record.end_time, 1357);
        assert_eq!(record.latency_us, 357);
        assert!(record.success);
        assert_eq!(record.key_epoch, 0);
    }

    #[test]
    fn test_jammed_at_fixed_location() {
        let mut ctx = context(50.0, 0);
        let mut node = Node::with_location(2, Location::new(10.0, 10.0), params(10), StdRng::seed_from_u64(2));

        let mut now = 0;
        while ctx.logger.is_empty() {
            match node.resume(now, &mut ctx) {
                Resume::After(delay) => now += delay,
                Resume::Done => unreachable!(),
            }
        }
        assert!(!ctx.logger.records()[0].success);
    }

    #[test]
    fn test_digest_depends_on_key_epoch() {
        let node = Node::with_location(3, Location::new(1.0, 1.0), params(10), StdRng::seed_from_u64(3));
        assert_eq!(node.authenticate(0), node.authenticate(0));
        assert_ne!(node.authenticate(0), node.authenticate(1));
    }

    #[test]
    fn test_random_location_inside_area() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..1000 {
            let loc = random_location(&mut rng, 250.0);
            assert!((0.0..250.0).contains(&loc.x));
            assert!((0.0..250.0).contains(&loc.y));
        }
    }
}
