//! Run and characterization reports with JSON/CSV export.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::characterize::CharacteristicFunction;
use crate::types::{Cycle, Direction, StreamId};

/// Outcome of one driver invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Clock cycles advanced during the run
    pub cycles: Cycle,

    /// Output values the run waited for
    pub target_count: usize,

    /// Transfers accepted per input stream
    pub input_transfers: IndexMap<StreamId, u64>,

    /// Transfers captured per output stream
    pub output_transfers: IndexMap<StreamId, u64>,
}

impl RunReport {
    /// Total values captured across all output streams.
    pub fn captured(&self) -> u64 {
        self.output_transfers.values().sum()
    }

    /// Total values consumed across all input streams.
    pub fn consumed(&self) -> u64 {
        self.input_transfers.values().sum()
    }

    /// Exports the report to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Per-stream line of a characterization report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub stream: StreamId,
    pub direction: Direction,
    /// Transfers observed in one period
    pub transactions: Cycle,
    pub padding: Cycle,
}

/// Summary of one successful characterization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterizationReport {
    /// Node name
    pub node: String,

    /// Characterization period
    pub period: Cycle,

    /// Lower bound the period was checked against
    pub expected_cycles: Cycle,

    /// Cycles the run actually took
    pub cycles: Cycle,

    /// Tracked streams, inputs first
    pub streams: Vec<StreamSummary>,
}

impl CharacterizationReport {
    /// Builds the report from a run and the curves derived from it.
    pub fn new(
        node: &str,
        expected_cycles: Cycle,
        run: &RunReport,
        characteristic: &CharacteristicFunction,
    ) -> Self {
        let inputs = characteristic
            .inputs
            .iter()
            .map(|(id, chrc)| (id, Direction::Input, chrc));
        let outputs = characteristic
            .outputs
            .iter()
            .map(|(id, chrc)| (id, Direction::Output, chrc));
        let streams = inputs
            .chain(outputs)
            .map(|(id, direction, chrc)| StreamSummary {
                stream: id.clone(),
                direction,
                transactions: chrc.transactions_per_period(),
                padding: chrc.padding,
            })
            .collect();

        Self {
            node: node.to_string(),
            period: characteristic.period,
            expected_cycles,
            cycles: run.cycles,
            streams,
        }
    }

    /// Idle cycles between the end of the run and the end of the period.
    pub fn slack(&self) -> Cycle {
        self.period.saturating_sub(self.cycles)
    }

    /// Exports the report to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports the report to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Exports the per-stream lines to CSV.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("node,stream,direction,period,cycles,transactions,padding\n");

        for s in &self.streams {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                self.node, s.stream, s.direction, self.period, self.cycles, s.transactions, s.padding,
            ));
        }

        csv
    }

    /// Exports the per-stream lines to a CSV file.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }

    /// Writes a human-readable summary to a writer.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "=== Characterization: {} ===", self.node)?;
        writeln!(w, "Period: {}", self.period)?;
        writeln!(w, "Expected cycles: {}", self.expected_cycles)?;
        writeln!(w, "Run cycles: {} (slack {})", self.cycles, self.slack())?;
        writeln!(w)?;

        for s in &self.streams {
            writeln!(
                w,
                "  {:<6} {}: {} transfers/period, {} padded",
                s.direction, s.stream, s.transactions, s.padding
            )?;
        }

        Ok(())
    }

    /// Returns a summary string.
    pub fn summary(&self) -> String {
        let mut buf = Vec::new();
        if self.write_summary(&mut buf).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Exports the curves of a characteristic function to CSV.
///
/// One row per cycle index, one column per stream.
pub fn curves_to_csv(characteristic: &CharacteristicFunction) -> String {
    let columns: Vec<(&StreamId, &[Cycle])> = characteristic
        .inputs
        .iter()
        .chain(characteristic.outputs.iter())
        .map(|(id, chrc)| (id, chrc.curve.as_slice()))
        .collect();

    let mut csv = String::from("cycle");
    for (id, _) in &columns {
        csv.push(',');
        csv.push_str(id);
    }
    csv.push('\n');

    for t in 0..2 * characteristic.period as usize {
        csv.push_str(&t.to_string());
        for (_, curve) in &columns {
            csv.push(',');
            if let Some(v) = curve.get(t) {
                csv.push_str(&v.to_string());
            }
        }
        csv.push('\n');
    }

    csv
}

/// A simple timer for measuring wall-clock time.
#[derive(Debug)]
pub struct Timer {
    start: std::time::Instant,
}

impl Timer {
    /// Starts a new timer.
    pub fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Returns elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

/// Counters of a batch characterization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Nodes that received new curves
    pub derived: usize,

    /// Nodes skipped because they were already characterized
    pub skipped: usize,

    /// Nodes whose characterization failed
    pub failed: usize,

    /// Total driver cycles across derived nodes
    pub total_cycles: Cycle,

    /// Wall-clock time of the batch
    pub wall_time_ms: f64,
}

impl BatchStats {
    /// Nodes processed in total.
    pub fn processed(&self) -> usize {
        self.derived + self.skipped + self.failed
    }

    /// Exports the counters to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::TransactionTrace;

    fn sample() -> (RunReport, CharacteristicFunction) {
        let mut inputs = IndexMap::new();
        inputs.insert("in0".to_string(), TransactionTrace::from(vec![1, 1, 0]));
        let mut outputs = IndexMap::new();
        outputs.insert("out".to_string(), TransactionTrace::from(vec![0, 1, 1]));
        let chrc = CharacteristicFunction::from_traces(4, &inputs, &outputs);

        let mut run = RunReport {
            cycles: 3,
            target_count: 2,
            ..RunReport::default()
        };
        run.input_transfers.insert("in0".to_string(), 2);
        run.output_transfers.insert("out".to_string(), 2);
        (run, chrc)
    }

    #[test]
    fn test_run_report_totals() {
        let (run, _) = sample();
        assert_eq!(run.captured(), 2);
        assert_eq!(run.consumed(), 2);
        assert!(run.to_json().unwrap().contains("\"cycles\": 3"));
    }

    #[test]
    fn test_characterization_report() {
        let (run, chrc) = sample();
        let report = CharacterizationReport::new("echo", 2, &run, &chrc);

        assert_eq!(report.period, 4);
        assert_eq!(report.slack(), 1);
        assert_eq!(report.streams.len(), 2);
        assert_eq!(report.streams[0].direction, Direction::Input);
        assert_eq!(report.streams[0].transactions, 2);
        assert_eq!(report.streams[1].padding, 1);
    }

    #[test]
    fn test_report_csv_export() {
        let (run, chrc) = sample();
        let csv = CharacterizationReport::new("echo", 2, &run, &chrc).to_csv();
        assert!(csv.starts_with("node,stream,direction"));
        assert!(csv.contains("echo,in0,input,4,3,2,1"));
        assert!(csv.contains("echo,out,output,4,3,2,1"));
    }

    #[test]
    fn test_summary_output() {
        let (run, chrc) = sample();
        let summary = CharacterizationReport::new("echo", 2, &run, &chrc).summary();
        assert!(summary.contains("Characterization: echo"));
        assert!(summary.contains("Period: 4"));
    }

    #[test]
    fn test_curves_csv() {
        let (_, chrc) = sample();
        let csv = curves_to_csv(&chrc);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "cycle,in0,out");
        assert_eq!(lines[1], "0,1,0");
        assert_eq!(lines[8], "7,4,4");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn test_batch_stats() {
        let stats = BatchStats {
            derived: 2,
            skipped: 1,
            failed: 1,
            ..BatchStats::default()
        };
        assert_eq!(stats.processed(), 4);
    }
}
