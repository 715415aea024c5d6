//! Relational backends for first-match.
//!
//! Every backend expresses the same query over Arrow frames: equality
//! join on `key`, filter `timestamp_right < timestamp`, group by `a_idx`
//! keeping the minimum `b_idx`, sort by `a_idx`. They differ in how the
//! query is executed.
//!
//! - [`eager`] -- materialized join and Arrow compute kernels
//! - [`lazy`] -- logical plan with an optimizer and `explain`
//! - [`streaming`] -- bounded-memory chunked execution
//! - [`asof`] -- nearest-preceding join (unverified)

pub mod asof;
pub mod eager;
pub mod frame;
pub mod lazy;
pub mod ops;
pub mod streaming;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::stream::EventStream;
use crate::table::MatchTable;

pub use asof::AsofBackend;
pub use eager::EagerBackend;
pub use lazy::{LazyBackend, LazyQuery, LogicalPlan};
pub use streaming::{ChunkSource, IpcSource, MemorySource, StreamingBackend};

/// Default rows per chunk for the streaming backend.
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// A first-match executor.
pub trait JoinBackend {
    fn name(&self) -> &'static str;

    /// Whether results are expected to equal the oracle's. A divergence
    /// from a verified backend is an error; from an unverified one it is
    /// only reported.
    fn verified(&self) -> bool {
        true
    }

    fn execute(&self, a: &EventStream, b: &EventStream) -> Result<MatchTable>;
}

/// Backend selector used by configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Eager,
    Lazy,
    Streaming,
    Asof,
}

impl BackendKind {
    pub const ALL: [Self; 4] = [Self::Eager, Self::Lazy, Self::Streaming, Self::Asof];

    /// Instantiate the backend. `chunk_size` only affects streaming.
    ///
    /// # Errors
    ///
    /// [`crate::error::MatchError::InvalidChunkSize`] for a zero chunk
    /// size on the streaming backend.
    pub fn build(self, chunk_size: usize) -> Result<Box<dyn JoinBackend>> {
        let backend: Box<dyn JoinBackend> = match self {
            Self::Eager => Box::new(EagerBackend),
            Self::Lazy => Box::new(LazyBackend::default()),
            Self::Streaming => Box::new(StreamingBackend::new(chunk_size)?),
            Self::Asof => Box::new(AsofBackend),
        };
        Ok(backend)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eager => write!(f, "eager"),
            Self::Lazy => write!(f, "lazy"),
            Self::Streaming => write!(f, "streaming"),
            Self::Asof => write!(f, "asof"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "eager" => Ok(Self::Eager),
            "lazy" => Ok(Self::Lazy),
            "streaming" => Ok(Self::Streaming),
            "asof" => Ok(Self::Asof),
            other => Err(format!(
                "unknown backend '{other}' (expected eager, lazy, streaming or asof)"
            )),
        }
    }
}
