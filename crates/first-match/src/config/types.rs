use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backend::{BackendKind, DEFAULT_CHUNK_SIZE};
use crate::io::ColumnNames;
use crate::kernels::bucket_index::DEFAULT_MAX_LOOKUP_ENTRIES;
use crate::kernels::oracle::DEFAULT_ORACLE_MAX_PAIRS;
use crate::kernels::{IndexLimits, KernelBackend};
use crate::pipeline::{CorrelateOptions, OrderingMode};

/// A correlation job, as read from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub inputs: Inputs,
    #[serde(default)]
    pub columns: ColumnNames,
    #[serde(default)]
    pub kernel: KernelSection,
    #[serde(default)]
    pub limits: LimitsSection,
    /// Relational backends to cross-check against the kernel.
    #[serde(default)]
    pub backends: Vec<BackendKind>,
    #[serde(default)]
    pub streaming: StreamingSection,
    #[serde(default)]
    pub verify: VerifySection,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inputs {
    pub a: PathBuf,
    pub b: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelSection {
    pub backend: KernelBackend,
    pub ordering: OrderingMode,
    pub threads: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    pub max_lookup_entries: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_lookup_entries: DEFAULT_MAX_LOOKUP_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSection {
    pub chunk_size: usize,
}

impl Default for StreamingSection {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifySection {
    /// Compare the kernel with the brute-force oracle.
    pub oracle: bool,
    /// Largest `|A| * |B|` the oracle may be asked to scan.
    pub max_pairs: u64,
}

impl Default for VerifySection {
    fn default() -> Self {
        Self {
            oracle: false,
            max_pairs: u64::try_from(DEFAULT_ORACLE_MAX_PAIRS).unwrap_or(u64::MAX),
        }
    }
}

impl JobConfig {
    pub fn correlate_options(&self) -> CorrelateOptions {
        CorrelateOptions {
            backend: self.kernel.backend,
            ordering: self.kernel.ordering,
            threads: self.kernel.threads,
            limits: IndexLimits {
                max_lookup_entries: self.limits.max_lookup_entries,
            },
            key_range: None,
        }
    }
}
