/// Prediction: on scenario 1 the as-of backend returns the nearest
/// preceding event (b_idx 1) where the oracle returns the earliest
/// (b_idx 0), and the harness names a_idx 0.
/// If fails: as-of suddenly agrees, or the harness misreports the row.
#[test]
fn asof_diverges_on_scenario_one() {
    let (a, b, _) = scenarios().remove(0);
    let oracle = first_match_oracle(&a, &b);
    let asof = AsofBackend.execute(&a, &b).unwrap();
    let m = compare_tables(&oracle, &asof).unwrap();
    assert_eq!((m.a_idx, m.expected, m.actual), (0, Some(0), Some(1)));

    let err = verify_backend(&AsofBackend, &a, &b, &oracle).unwrap_err();
    assert!(matches!(err, MatchError::Divergence { a_idx: 0, .. }));
}

/// Prediction: the as-of backend is reported, not failed, by the harness.
/// If fails: an unverified backend is treated as a certified one.
#[test]
fn asof_divergence_is_not_a_failure() {
    let (a, b, _) = scenarios().remove(0);
    let oracle = first_match_oracle(&a, &b);
    let backends: Vec<Box<dyn JoinBackend>> = vec![Box::new(AsofBackend)];
    let checks = check_backends(&backends, &a, &b, &oracle).unwrap();
    assert!(!checks[0].verified);
    assert!(!checks[0].is_equivalent());
    assert!(!checks[0].is_failure());
}

/// Prediction: a tie at the A timestamp makes as-of drop the row even
/// though an earlier strict predecessor exists.
/// If fails: as-of falls back past the filtered neighbor.
#[test]
fn asof_loses_rows_on_equal_timestamp_neighbors() {
    let a = EventStream::from_rows(&[(3, 50)]);
    let b = EventStream::from_rows(&[(3, 10), (3, 50)]);
    assert_eq!(first_match_oracle(&a, &b).get(0), Some(0));
    assert_eq!(AsofBackend.execute(&a, &b).unwrap().get(0), None);
}

/// Prediction: as-of agrees when every key has at most one candidate.
/// If fails: as-of is wrong even where nearest and earliest coincide.
#[test]
fn asof_agrees_with_single_candidates() {
    let a = EventStream::from_rows(&[(1, 10), (2, 10), (3, 10)]);
    let b = EventStream::from_rows(&[(1, 5), (2, 20), (3, 9)]);
    assert_equivalent("asof single", &first_match_oracle(&a, &b), &AsofBackend.execute(&a, &b).unwrap());
}
