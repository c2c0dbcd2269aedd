use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod caller;
pub mod message;
pub mod sink;
pub mod stats;
pub mod sweep;
pub mod topology;
pub mod worker;

pub use tcpmsg::Node;

/// Communication pattern of one benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    /// one sample -> one worker, chosen by round-robin
    Direct,
    /// one sample -> every worker, contacted one after another
    Sequential,
    /// one sample -> first worker, which relays along its configured chain
    TwoHop,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Direct => "direct",
            Pattern::Sequential => "sequential",
            Pattern::TwoHop => "twohop",
        }
    }

    pub fn describe(&self, num_workers: usize) -> String {
        match self {
            Pattern::Direct => format!("head -> worker (round-robin across {} workers)", num_workers),
            Pattern::Sequential => format!(
                "head -> worker1 -> ack -> head -> worker2 -> ... ({} workers)",
                num_workers
            ),
            Pattern::TwoHop => {
                "head -> worker1 -> next hops -> ack -> head (chain set on the workers)".to_owned()
            }
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown pattern (expect direct|sequential|twohop): {0}")]
pub struct ParsePatternError(pub String);

impl std::str::FromStr for Pattern {
    type Err = ParsePatternError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Pattern::Direct),
            "sequential" => Ok(Pattern::Sequential),
            "twohop" => Ok(Pattern::TwoHop),
            other => Err(ParsePatternError(other.to_owned())),
        }
    }
}

/// One measured sample. Never mutated after the topology produced it; the
/// sink persists samples in the order they were dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResult {
    pub payload_size: usize,
    pub latency_ms: f64,
    pub success: bool,
    pub pattern: Pattern,
    /// send time of the (first) call, nanoseconds since the unix epoch
    pub request_timestamp: i64,
    /// worker-side stamp of the (last) response, 0 when the call never
    /// completed
    pub response_timestamp: i64,
}
