//! Index, kernel, and oracle implementations.
//!
//! - [`bucket_index`] -- stable key-sorted index of stream B
//! - [`first_match`] -- head-only kernel, scan fallback, and PTX source
//! - [`oracle`] -- exhaustive reference (ground truth)

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::needless_raw_string_hashes
)]

pub mod bucket_index;
pub mod first_match;
pub mod oracle;

use serde::{Deserialize, Serialize};

use crate::stream::{Key, Timestamp};

pub use bucket_index::{BucketIndex, IndexLimits, IndexOptions};

/// Host execution variant for the match kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelBackend {
    /// Sequential reference loop.
    Scalar,
    /// rayon data-parallel loop.
    #[default]
    Parallel,
}

impl std::fmt::Display for KernelBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

impl std::str::FromStr for KernelBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scalar" => Ok(Self::Scalar),
            "parallel" => Ok(Self::Parallel),
            other => Err(format!(
                "unknown kernel backend '{other}' (expected scalar or parallel)"
            )),
        }
    }
}

/// Head-only kernel dispatch.
///
/// # Panics
///
/// Panics if `a_keys`, `a_times` and `output` differ in length.
pub fn dispatch_head_only(
    backend: KernelBackend,
    a_keys: &[Key],
    a_times: &[Timestamp],
    index: &BucketIndex,
    output: &mut [i64],
) {
    match backend {
        KernelBackend::Scalar => first_match::first_match_scalar(a_keys, a_times, index, output),
        KernelBackend::Parallel => {
            first_match::first_match_parallel(a_keys, a_times, index, output);
        }
    }
}

/// Scan-fallback kernel dispatch.
///
/// # Panics
///
/// Same as [`dispatch_head_only`].
pub fn dispatch_scan(
    backend: KernelBackend,
    a_keys: &[Key],
    a_times: &[Timestamp],
    index: &BucketIndex,
    output: &mut [i64],
) {
    match backend {
        KernelBackend::Scalar => {
            first_match::first_match_scan_scalar(a_keys, a_times, index, output);
        }
        KernelBackend::Parallel => {
            first_match::first_match_scan_parallel(a_keys, a_times, index, output);
        }
    }
}
