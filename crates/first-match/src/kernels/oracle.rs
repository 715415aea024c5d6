//! Brute-force first-match oracle.
//!
//! For each A-event, scan B in arrival order and take the first event with
//! an equal key and a strictly smaller timestamp. O(|A|·|B|), no index and
//! no ordering precondition. This is the ground truth every other
//! implementation is certified against; it is not a production path.

use crate::error::{MatchError, Result};
use crate::stream::EventStream;
use crate::table::{MatchTable, UNMATCHED};

/// Default ceiling on `|A| * |B|` for [`first_match_oracle_checked`].
pub const DEFAULT_ORACLE_MAX_PAIRS: u128 = 10_000_000_000;

/// Exhaustive first match (ground truth).
pub fn first_match_oracle(a: &EventStream, b: &EventStream) -> MatchTable {
    let mut slots = vec![UNMATCHED; a.len()];
    for (slot, (&a_key, &a_time)) in slots.iter_mut().zip(a.keys().iter().zip(a.timestamps())) {
        *slot = b
            .keys()
            .iter()
            .zip(b.timestamps())
            .position(|(&b_key, &b_time)| b_key == a_key && b_time < a_time)
            .map_or(UNMATCHED, |j| j as i64);
    }
    MatchTable::from_slots(slots)
}

/// [`first_match_oracle`] guarded by a pair-count ceiling.
///
/// # Errors
///
/// [`MatchError::Capacity`] if `|A| * |B| > max_pairs`.
pub fn first_match_oracle_checked(
    a: &EventStream,
    b: &EventStream,
    max_pairs: u128,
) -> Result<MatchTable> {
    let pairs = a.len() as u128 * b.len() as u128;
    if pairs > max_pairs {
        return Err(MatchError::Capacity {
            what: "oracle comparisons",
            requested: pairs,
            limit: max_pairs,
        });
    }
    Ok(first_match_oracle(a, b))
}
