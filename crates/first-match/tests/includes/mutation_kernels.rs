fn correct(times: &[Timestamp], idx: &[u32], t: Timestamp) -> i64 {
    times.iter().position(|&b| b < t).map_or(UNMATCHED, |j| i64::from(idx[j]))
}

fn non_strict(times: &[Timestamp], idx: &[u32], t: Timestamp) -> i64 {
    times.iter().position(|&b| b <= t).map_or(UNMATCHED, |j| i64::from(idx[j]))
}

fn nearest(times: &[Timestamp], idx: &[u32], t: Timestamp) -> i64 {
    times
        .iter()
        .zip(idx)
        .filter(|&(&b, _)| b < t)
        .max_by_key(|&(&b, &i)| (b, i))
        .map_or(UNMATCHED, |(_, &i)| i64::from(i))
}

fn last_arrival(times: &[Timestamp], idx: &[u32], t: Timestamp) -> i64 {
    times.iter().rposition(|&b| b < t).map_or(UNMATCHED, |j| i64::from(idx[j]))
}

fn head_ignoring_time(_times: &[Timestamp], idx: &[u32], _t: Timestamp) -> i64 {
    idx.first().map_or(UNMATCHED, |&i| i64::from(i))
}

/// Prediction: the unmutated probe passes every scenario.
/// If fails: the mutation harness itself is broken.
#[test]
fn correct_probe_survives() {
    for (a, b, _) in scenarios() {
        assert_eq!(compare_tables(&first_match_oracle(&a, &b), &run_variant(&a, &b, correct)), None);
    }
}

/// Prediction: a `<=` comparison is caught on an equal-timestamp pair.
/// If fails: the test inputs never exercise timestamp ties.
#[test]
fn non_strict_comparison_is_caught() {
    let a = EventStream::from_rows(&[(2, 20), (4, 8)]);
    let b = EventStream::from_rows(&[(4, 3), (2, 20)]);
    let m = compare_tables(&first_match_oracle(&a, &b), &run_variant(&a, &b, non_strict)).unwrap();
    assert_eq!(m.a_idx, 0);
    assert_eq!(m.expected, None);
    assert_eq!(m.actual, Some(1));
}

/// Prediction: picking the nearest preceding event is caught by scenario 1.
/// If fails: first-match and nearest-match coincide on the inputs.
#[test]
fn nearest_instead_of_earliest_is_caught() {
    let (a, b, _) = scenarios().remove(0);
    let m = compare_tables(&first_match_oracle(&a, &b), &run_variant(&a, &b, nearest)).unwrap();
    assert_eq!((m.a_idx, m.expected, m.actual), (0, Some(0), Some(1)));
}

/// Prediction: picking the last qualifying arrival is caught.
/// If fails: buckets never hold two qualifying events.
#[test]
fn last_arrival_is_caught() {
    let a = EventStream::from_rows(&[(9, 100), (9, 100)]);
    let b = EventStream::from_rows(&[(9, 60), (9, 40), (9, 80)]);
    let m = compare_tables(&first_match_oracle(&a, &b), &run_variant(&a, &b, last_arrival)).unwrap();
    assert_eq!((m.a_idx, m.expected, m.actual), (0, Some(0), Some(2)));
}

/// Prediction: dropping the time predicate is caught by scenario 2.
/// If fails: no scenario has a later-only candidate.
#[test]
fn missing_time_predicate_is_caught() {
    let (a, b, _) = scenarios().remove(1);
    let m = compare_tables(&first_match_oracle(&a, &b), &run_variant(&a, &b, head_ignoring_time)).unwrap();
    assert_eq!((m.a_idx, m.expected, m.actual), (0, None, Some(0)));
}
