use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::wsn_interface::{PacketRecord, SimTime};

/// Append-only sink of packet outcomes, in completion order.
#[derive(Debug, Default, Clone)]
pub struct PacketLog {
    records: Vec<PacketRecord>,
}

impl PacketLog {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn log(&mut self, record: PacketRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[PacketRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn delivered(&self) -> impl Iterator<Item = &PacketRecord> {
        self.records.iter().filter(|r| r.success)
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered().count()
    }

    pub fn jammed_count(&self) -> usize {
        self.records.len() - self.delivered_count()
    }

    /// Mean latency over delivered packets; `None` when nothing was delivered.
    pub fn mean_latency(&self) -> Option<f64> {
        let (count, total) = self
            .delivered()
            .fold((0usize, 0u128), |(n, sum), r| (n + 1, sum + r.latency_us as u128));
        if count == 0 {
            None
        } else {
            Some(total as f64 / count as f64)
        }
    }

    /// (min, max) latency over delivered packets
    pub fn latency_range(&self) -> Option<(SimTime, SimTime)> {
        self.delivered().fold(None, |acc, r| match acc {
            None => Some((r.latency_us, r.latency_us)),
            Some((lo, hi)) => Some((lo.min(r.latency_us), hi.max(r.latency_us))),
        })
    }

    /// Export all records as CSV.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_csv_to(&mut writer)?;
        writer.flush()
    }

    pub fn write_csv_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "node,seq,start_us,end_us,latency_us,success,key_epoch")?;
        for r in &self.records {
            writeln!(
                writer,
                "{},{},{},{},{},{},{}",
                r.node, r.seq, r.start_time, r.end_time, r.latency_us, r.success, r.key_epoch
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(node: u32, latency_us: SimTime, success: bool) -> PacketRecord {
        PacketRecord {
            node,
            seq: 0,
            start_time: 100,
            end_time: 100 + latency_us,
            latency_us,
            success,
            key_epoch: 0,
            digest: [0u8; 32],
        }
    }

    #[test]
    fn test_empty_log() {
        let log = PacketLog::new();
        assert!(log.is_empty());
        assert_eq!(log.delivered_count(), 0);
        assert_eq!(log.mean_latency(), None);
        assert_eq!(log.latency_range(), None);
    }

    #[test]
    fn test_aggregates_only_count_delivered() {
        let mut log = PacketLog::new();
        log.log(record(0, 350, true));
        log.log(record(1, 10_000, false));
        log.log(record(2, 450, true));

        assert_eq!(log.len(), 3);
        assert_eq!(log.delivered_count(), 2);
        assert_eq!(log.jammed_count(), 1);
        assert_eq!(log.mean_latency(), Some(400.0));
        assert_eq!(log.latency_range(), Some((350, 450)));
    }

    #[test]
    fn test_records_keep_append_order() {
        let mut log = PacketLog::new();
        for node in [3, 1, 2] {
            log.log(record(node, 1, true));
        }
        let nodes: Vec<u32> = log.records().iter().map(|r| r.node).collect();
        assert_eq!(nodes, vec![3, 1, 2]);
    }

    #[test]
    fn test_csv_export() {
        let mut log = PacketLog::new();
        log.log(record(4, 350, true));
        log.log(record(5, 400, false));

        let mut out = Vec::new();
        log.write_csv_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "node,seq,start_us,end_us,latency_us,success,key_epoch");
        assert_eq!(lines[1], "4,0,100,450,350,true,0");
        assert_eq!(lines[2], "5,0,100,500,400,false,0");
    }
}
