/// Prediction: every kernel variant and the oracle give the expected
/// pairs on the three reference scenarios.
/// If fails: a variant disagrees on first-arrival or strictness semantics.
#[test]
fn reference_scenarios_all_variants() {
    for (i, (a, b, expected)) in scenarios().into_iter().enumerate() {
        let oracle = first_match_oracle(&a, &b);
        assert_eq!(oracle.pairs().collect::<Vec<_>>(), expected, "oracle, scenario {i}");
        for parallel in [false, true] {
            let t = head_only(&a, &b, parallel);
            assert_equivalent(&format!("head-only parallel={parallel} scenario {i}"), &oracle, &t);
        }
        let index = BucketIndex::build(&b).unwrap().with_prefix_minima();
        let mut scan = vec![UNMATCHED; a.len()];
        first_match_scan_scalar(a.keys(), a.timestamps(), &index, &mut scan);
        assert_equivalent(&format!("scan scenario {i}"), &oracle, &MatchTable::from_slots(scan));
    }
}

/// Prediction: with B empty, every A-event is unmatched.
/// If fails: the kernel reads an empty index as populated.
#[test]
fn empty_b_leaves_everything_unmatched() {
    let a = EventStream::from_rows(&[(0, 1), (1, 2), (-3, 100)]);
    let t = head_only(&a, &EventStream::empty(), true);
    assert_eq!(t.len(), 3);
    assert_eq!(t.matched_count(), 0);
}

/// Prediction: A keys outside B's key range are unmatched, never an
/// out-of-bounds access.
/// If fails: the dense lookup is not bounds-checked.
#[test]
fn keys_outside_b_range_are_unmatched() {
    let b = EventStream::from_rows(&[(10, 1), (12, 1)]);
    let a = EventStream::from_rows(&[(i32::MIN, 5), (9, 5), (11, 5), (13, 5), (i32::MAX, 5), (10, 5)]);
    for parallel in [false, true] {
        let t = head_only(&a, &b, parallel);
        assert_eq!(t.pairs().collect::<Vec<_>>(), vec![(5, 0)]);
    }
}

/// Prediction: an index widened to the union of A's and B's key ranges
/// gives the same table as B's own range.
/// If fails: widening shifts bucket offsets.
#[test]
fn widened_index_matches_narrow_index() {
    let a = EventStream::from_rows(&[(-4, 50), (0, 50), (3, 50), (99, 50)]);
    let b = EventStream::from_rows(&[(0, 10), (3, 20), (3, 5)]);
    let (lo, hi) = union_key_range(a.key_range(), b.key_range()).unwrap();
    let wide = correlate(
        &a,
        &b,
        &CorrelateOptions {
            key_range: Some((lo, hi)),
            ordering: OrderingMode::Scan,
            ..CorrelateOptions::default()
        },
        &mut NoopTimer,
    )
    .unwrap();
    assert_equivalent("widened", &first_match_oracle(&a, &b), &wide);
}

/// Prediction: an A-event whose timestamp equals every candidate's is
/// unmatched.
/// If fails: the kernel uses `<=`.
#[test]
fn equal_timestamps_never_match() {
    let a = EventStream::from_rows(&[(7, 30)]);
    let b = EventStream::from_rows(&[(7, 30), (7, 30)]);
    assert_eq!(head_only(&a, &b, false).matched_count(), 0);
    assert_eq!(first_match_oracle(&a, &b).matched_count(), 0);
}

/// Prediction: the linear scan and the prefix-minimum binary search agree
/// on a B whose buckets are in reverse time order.
/// If fails: the running-minimum search picks a later arrival.
#[test]
fn scan_variants_agree_on_reversed_buckets() {
    let b = EventStream::from_rows(&[(1, 90), (2, 50), (1, 70), (1, 10), (2, 5)]);
    let a = EventStream::from_rows(&[(1, 100), (1, 80), (1, 20), (1, 5), (2, 60), (2, 6)]);
    let index = BucketIndex::build(&b).unwrap().with_prefix_minima();
    let mut linear = vec![UNMATCHED; a.len()];
    let mut binary = vec![UNMATCHED; a.len()];
    first_match_linear_scan(a.keys(), a.timestamps(), &index, &mut linear);
    first_match_scan_parallel(a.keys(), a.timestamps(), &index, &mut binary);
    assert_eq!(linear, binary);
    assert_eq!(linear, vec![0, 2, 3, UNMATCHED, 1, 4]);
}
