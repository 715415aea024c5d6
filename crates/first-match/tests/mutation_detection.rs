//! Mutation detection: deliberately broken kernels must be caught.
//!
//! Each mutant is a per-bucket probe run through the real bucket index.
//! The harness must find a divergent row against the oracle, which shows
//! the equivalence checks would catch the same bug in a real kernel.

mod common;

use first_match::equivalence::compare_tables;
use first_match::kernels::oracle::first_match_oracle;
use first_match::stream::{EventStream, Timestamp};
use first_match::table::UNMATCHED;

use common::{run_variant, scenarios};

include!("includes/mutation_kernels.rs");
