use std::io::Write;

use crate::{core::TraceRecord, error::Result};

/// Receives one record per completed dispatch step, in time order.
pub trait TraceSink {
    fn record(&mut self, record: TraceRecord) -> Result<()>;
}

impl TraceSink for Vec<TraceRecord> {
    fn record(&mut self, record: TraceRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn record(&mut self, _record: TraceRecord) -> Result<()> {
        Ok(())
    }
}

/// Tab-separated `time  busy  queue_len` rows, starting with an all-zero row.
pub struct TsvTrace<W: Write> {
    out: W,
}

impl<W: Write> TsvTrace<W> {
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "0\t0\t0")?;
        Ok(Self { out })
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> TraceSink for TsvTrace<W> {
    fn record(&mut self, record: TraceRecord) -> Result<()> {
        writeln!(
            self.out,
            "{:.4}\t{}\t{}",
            record.time,
            u8::from(record.busy),
            record.queue_len
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsv_rows_match_queue_log_format() {
        let mut trace = TsvTrace::new(Vec::new()).unwrap();
        trace
            .record(TraceRecord {
                time: 10.3,
                busy: false,
                queue_len: 0,
            })
            .unwrap();
        trace
            .record(TraceRecord {
                time: 11.25,
                busy: true,
                queue_len: 3,
            })
            .unwrap();

        let out = String::from_utf8(trace.finish().unwrap()).unwrap();
        assert_eq!(out, "0\t0\t0\n10.3000\t0\t0\n11.2500\t1\t3\n");
    }
}
