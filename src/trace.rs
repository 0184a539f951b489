//! VCD waveform recording of the driven stream signals.
//!
//! When a trace path is configured, the driver opens a [`WaveformTrace`] at
//! the start of a run, records the data/valid/ready levels of every stream
//! once per cycle (at the sampling point before the clock edge) and closes
//! the file when the run ends, whether it completed or aborted.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SimResult;
use crate::model::HardwareModel;
use crate::stream::{StreamSet, StreamSignal};
use crate::types::{Cycle, SignalValue};

const TOP_MODULE: &str = "axisim";
const VCD_HEADER: &str = "axisim stream trace";
const DATA_WIDTH: u32 = SignalValue::BITS;

/// An open VCD file tracing one driver run.
pub struct WaveformTrace {
    writer: vcd::Writer<fs::File>,
    path: PathBuf,
    /// Id codes per stream, in `StreamSignal::ALL` order
    ids: Vec<[vcd::IdCode; 3]>,
    /// Last written level per stream signal; unchanged levels are skipped
    last: Vec<[Option<SignalValue>; 3]>,
    next_timestamp: Cycle,
}

impl WaveformTrace {
    /// Creates the file at `path` and declares one scope per stream.
    pub fn create(path: impl AsRef<Path>, streams: &StreamSet) -> SimResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = fs::File::create(&path)?;
        let mut writer = vcd::Writer::new(file);

        writer.comment(VCD_HEADER)?;
        writer.timescale(1, vcd::TimescaleUnit::NS)?;
        writer.add_module(TOP_MODULE)?;
        let mut ids = Vec::with_capacity(streams.len());
        for port in streams.iter() {
            writer.add_module(&port.id)?;
            let data = writer.add_wire(DATA_WIDTH, StreamSignal::Data.suffix())?;
            let valid = writer.add_wire(1, StreamSignal::Valid.suffix())?;
            let ready = writer.add_wire(1, StreamSignal::Ready.suffix())?;
            writer.upscope()?;
            ids.push([data, valid, ready]);
        }
        writer.upscope()?;
        writer.enddefinitions()?;

        debug!("VCD trace opened at {}", path.display());
        Ok(Self {
            writer,
            path,
            last: vec![[None; 3]; ids.len()],
            ids,
            next_timestamp: 0,
        })
    }

    /// Records the levels of every stream signal during `cycle`.
    pub fn record(
        &mut self,
        cycle: Cycle,
        model: &dyn HardwareModel,
        streams: &StreamSet,
    ) -> SimResult<()> {
        self.writer.timestamp(cycle)?;
        for (index, port) in streams.iter().enumerate() {
            for (slot, signal) in StreamSignal::ALL.iter().enumerate() {
                let value = model.read(port.signal(*signal))?;
                if self.last[index][slot] == Some(value) {
                    continue;
                }
                let id = self.ids[index][slot];
                match signal {
                    StreamSignal::Data => self.writer.change_vector(id, &to_bits(value))?,
                    _ => self.writer.change_scalar(id, to_scalar(value))?,
                }
                self.last[index][slot] = Some(value);
            }
        }
        self.next_timestamp = cycle + 1;
        Ok(())
    }

    /// Returns the path of the trace file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the closing timestamp and closes the file.
    pub fn finish(mut self) -> SimResult<()> {
        self.writer.timestamp(self.next_timestamp)?;
        debug!(
            "VCD trace closed at {} after {} cycles",
            self.path.display(),
            self.next_timestamp
        );
        Ok(())
    }
}

impl std::fmt::Debug for WaveformTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveformTrace")
            .field("path", &self.path)
            .field("streams", &self.ids.len())
            .field("next_timestamp", &self.next_timestamp)
            .finish()
    }
}

fn to_scalar(value: SignalValue) -> vcd::Value {
    if value != 0 {
        vcd::Value::V1
    } else {
        vcd::Value::V0
    }
}

/// MSB-first bit vector of a data word.
fn to_bits(value: SignalValue) -> Vec<vcd::Value> {
    (0..DATA_WIDTH)
        .rev()
        .map(|bit| to_scalar((value >> bit) & 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::IoDict;
    use crate::models::EchoPipeline;
    use crate::stream::SignalNaming;

    #[test]
    fn test_to_bits_msb_first() {
        let bits = to_bits(5);
        assert_eq!(bits.len(), 64);
        assert_eq!(bits[63], vcd::Value::V1);
        assert_eq!(bits[62], vcd::Value::V0);
        assert_eq!(bits[61], vcd::Value::V1);
        assert!(bits[..61].iter().all(|b| *b == vcd::Value::V0));
    }

    #[test]
    fn test_trace_file_contents() {
        let naming = SignalNaming::default();
        let mut model = EchoPipeline::new(&naming, 1);
        let io = IoDict::new().with_input("in0", vec![1]).with_output("out");
        let streams = StreamSet::from_io(&io, &naming);

        let path = std::env::temp_dir().join("axisim_trace_unit.vcd");
        let mut trace = WaveformTrace::create(&path, &streams).unwrap();
        model.write("in0_V_TVALID", 1).unwrap();
        trace.record(0, &model, &streams).unwrap();
        model.advance_clock();
        trace.record(1, &model, &streams).unwrap();
        trace.finish().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("$scope module in0 $end"));
        assert!(contents.contains("TVALID"));
        assert!(contents.contains("#2"));
        let _ = std::fs::remove_file(&path);
    }
}
