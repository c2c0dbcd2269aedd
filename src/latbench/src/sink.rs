use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{Pattern, SampleResult};

/// Which columns `flush` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// PayloadSize,LatencyMs,Success,Pattern
    Minimal,
    /// inserts RequestTimestamp,ResponseTimestamp before Pattern
    Timestamps,
}

impl Schema {
    fn header(&self) -> &'static str {
        match self {
            Schema::Minimal => "PayloadSize,LatencyMs,Success,Pattern",
            Schema::Timestamps => {
                "PayloadSize,LatencyMs,Success,RequestTimestamp,ResponseTimestamp,Pattern"
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("results already flushed")]
    AlreadyFlushed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accumulates samples in dispatch order and writes them out once, to
/// `benchmark_results_<pattern>.csv` under the output directory.
pub struct ResultSink {
    pattern: Pattern,
    output_dir: PathBuf,
    schema: Schema,
    results: Vec<SampleResult>,
    flushed: bool,
}

impl ResultSink {
    pub fn new<P: AsRef<Path>>(pattern: Pattern, output_dir: P, schema: Schema) -> Self {
        ResultSink {
            pattern,
            output_dir: output_dir.as_ref().to_path_buf(),
            schema,
            results: Vec::new(),
            flushed: false,
        }
    }

    pub fn record(&mut self, result: SampleResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[SampleResult] {
        &self.results
    }

    /// Serialize all recorded samples and return where they were written.
    /// One shot: a second flush is an error, nothing is rewritten.
    pub fn flush(&mut self) -> Result<PathBuf, SinkError> {
        if self.flushed {
            return Err(SinkError::AlreadyFlushed);
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("benchmark_results_{}.csv", self.pattern));

        let mut file = BufWriter::new(File::create(&path)?);
        writeln!(file, "{}", self.schema.header())?;
        for result in &self.results {
            writeln!(file, "{}", format_row(result, self.schema))?;
        }
        file.flush()?;

        self.flushed = true;
        Ok(path)
    }
}

fn format_row(r: &SampleResult, schema: Schema) -> String {
    match schema {
        Schema::Minimal => format!(
            "{},{:.6},{},{}",
            r.payload_size, r.latency_ms, r.success as u8, r.pattern
        ),
        Schema::Timestamps => format!(
            "{},{:.6},{},{},{},{}",
            r.payload_size,
            r.latency_ms,
            r.success as u8,
            r.request_timestamp,
            r.response_timestamp,
            r.pattern
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(success: bool) -> SampleResult {
        SampleResult {
            payload_size: 64,
            latency_ms: 1.2345678,
            success,
            pattern: Pattern::Direct,
            request_timestamp: 111,
            response_timestamp: 222,
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("latbench-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn row_formats() {
        assert_eq!(format_row(&sample(true), Schema::Minimal), "64,1.234568,1,direct");
        assert_eq!(
            format_row(&sample(false), Schema::Timestamps),
            "64,1.234568,0,111,222,direct"
        );
    }

    #[test]
    fn flush_writes_once() {
        let dir = scratch_dir("flush");
        let mut sink = ResultSink::new(Pattern::Direct, &dir, Schema::Minimal);
        sink.record(sample(true));
        sink.record(sample(false));

        let path = sink.flush().unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "benchmark_results_direct.csv"
        );

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "PayloadSize,LatencyMs,Success,Pattern");
        assert_eq!(lines[1], "64,1.234568,1,direct");
        assert_eq!(lines[2], "64,1.234568,0,direct");

        match sink.flush() {
            Err(SinkError::AlreadyFlushed) => {}
            other => panic!("expected AlreadyFlushed, got {:?}", other.map(|p| p.display().to_string())),
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
