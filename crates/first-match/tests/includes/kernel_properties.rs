proptest! {
    /// Prediction: for time-ordered B, scalar and parallel head-only
    /// kernels equal the oracle on every A.
    /// If fails: the bucket head is not the earliest qualifying arrival.
    #[test]
    fn head_only_equals_oracle_on_sorted_b(
        a in arb_stream(60, 8, 400),
        b in arb_sorted_stream(60, 8, 15),
    ) {
        let oracle = first_match_oracle(&a, &b);
        for parallel in [false, true] {
            let t = head_only(&a, &b, parallel);
            prop_assert_eq!(compare_tables(&oracle, &t), None, "parallel={}", parallel);
        }
    }
}

proptest! {
    /// Prediction: the scan fallback equals the oracle for any B.
    /// If fails: the fallback depends on time order it does not check.
    #[test]
    fn scan_equals_oracle_on_any_b(
        a in arb_stream(50, 6, 100),
        b in arb_stream(50, 6, 100),
    ) {
        let oracle = first_match_oracle(&a, &b);
        let scan = correlate(
            &a,
            &b,
            &CorrelateOptions { ordering: OrderingMode::Scan, ..CorrelateOptions::default() },
            &mut NoopTimer,
        )
        .unwrap();
        prop_assert_eq!(compare_tables(&oracle, &scan), None);
    }
}

proptest! {
    /// Prediction: validated mode either equals the oracle or refuses B.
    /// If fails: validation accepts a B on which the head-only kernel is
    /// wrong.
    #[test]
    fn validated_is_exact_or_refuses(
        a in arb_stream(40, 5, 100),
        b in arb_stream(40, 5, 100),
    ) {
        let result = correlate(
            &a,
            &b,
            &CorrelateOptions { ordering: OrderingMode::Validated, ..CorrelateOptions::default() },
            &mut NoopTimer,
        );
        if let Ok(t) = result {
            prop_assert_eq!(compare_tables(&first_match_oracle(&a, &b), &t), None);
        } else {
            prop_assert!(!b.is_time_ordered());
        }
    }
}

proptest! {
    /// Prediction: building the index twice, or sequentially and in
    /// parallel, yields identical arrays.
    /// If fails: the build is order-dependent or the parallel sort is
    /// unstable.
    #[test]
    fn index_build_is_deterministic(b in arb_stream(200, 30, 1000)) {
        let first = BucketIndex::build(&b).unwrap();
        prop_assert_eq!(&first, &BucketIndex::build(&b).unwrap());
        prop_assert_eq!(&first, &BucketIndex::build_parallel(&b).unwrap());
        let with_minima = BucketIndex::build_with(
            &b,
            &IndexOptions { parallel: true, prefix_minima: true, ..IndexOptions::default() },
        )
        .unwrap();
        prop_assert_eq!(with_minima.sorted_original_indices(), first.sorted_original_indices());
    }
}

proptest! {
    /// Prediction: every bucket lists its key's B rows in arrival order and
    /// the buckets partition B.
    /// If fails: the permutation is not stable or runs overlap.
    #[test]
    fn buckets_partition_b_in_arrival_order(b in arb_stream(120, 10, 50)) {
        let index = BucketIndex::build(&b).unwrap();
        let mut seen = 0;
        for (key, bucket) in index.buckets() {
            let rows = &index.sorted_original_indices()[bucket.start..bucket.start + bucket.count];
            prop_assert!(rows.windows(2).all(|w| w[0] < w[1]));
            for &r in rows {
                prop_assert_eq!(b.keys()[r as usize], key);
            }
            seen += bucket.count;
        }
        prop_assert_eq!(seen, b.len());
    }
}
