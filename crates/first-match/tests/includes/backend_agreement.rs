fn verified_backends(chunk_size: usize) -> Vec<Box<dyn JoinBackend>> {
    vec![
        Box::new(EagerBackend),
        Box::new(LazyBackend { optimize: false }),
        Box::new(LazyBackend { optimize: true }),
        Box::new(StreamingBackend::new(chunk_size).unwrap()),
    ]
}

/// Prediction: every verified backend reproduces the reference scenarios.
/// If fails: a backend's join, filter or grouping deviates.
#[test]
fn verified_backends_on_reference_scenarios() {
    for (i, (a, b, expected)) in scenarios().into_iter().enumerate() {
        for backend in verified_backends(1) {
            let t = backend.execute(&a, &b).unwrap();
            assert_eq!(t.pairs().collect::<Vec<_>>(), expected, "{} scenario {i}", backend.name());
        }
    }
}

proptest! {
    /// Prediction: eager, lazy (optimized and not) and streaming equal the
    /// oracle on any A and B.
    /// If fails: a backend keeps a later arrival or a non-strict match.
    #[test]
    fn verified_backends_equal_oracle(
        a in arb_stream(40, 6, 80),
        b in arb_stream(40, 6, 80),
        chunk in 1usize..16,
    ) {
        let oracle = first_match_oracle(&a, &b);
        for backend in verified_backends(chunk) {
            prop_assert!(verify_backend(backend.as_ref(), &a, &b, &oracle).is_ok(), "{}", backend.name());
        }
    }
}

proptest! {
    /// Prediction: on time-ordered B the kernel and every verified backend
    /// produce the same table.
    /// If fails: the kernel and the relational formulation disagree.
    #[test]
    fn kernel_equals_backends_on_sorted_b(
        a in arb_stream(60, 10, 300),
        b in arb_sorted_stream(60, 10, 10),
    ) {
        let kernel = correlate(&a, &b, &CorrelateOptions::default(), &mut NoopTimer).unwrap();
        let checks = check_backends(&verified_backends(7), &a, &b, &kernel).unwrap();
        for check in checks {
            prop_assert!(check.is_equivalent(), "{}", check);
        }
    }
}

/// Prediction: the streaming result does not depend on chunk size.
/// If fails: an A row is matched from a later B chunk than its first
/// survivor.
#[test]
fn streaming_is_chunk_size_invariant() {
    let a = EventStream::from_rows(&(0..97).map(|i| (i % 5, i64::from(i) * 3)).collect::<Vec<_>>());
    let b = EventStream::from_rows(&(0..83).map(|i| ((i * 7) % 5, i64::from((i * 37) % 250))).collect::<Vec<_>>());
    let reference = EagerBackend.execute(&a, &b).unwrap();
    for chunk in [1, 2, 3, 10, 82, 83, 84, 97, 1_000] {
        let t = StreamingBackend::new(chunk).unwrap().execute(&a, &b).unwrap();
        assert_equivalent(&format!("streaming chunk={chunk}"), &reference, &t);
    }
}

/// Prediction: streaming over IPC files equals streaming in memory.
/// If fails: row offsets are lost between file batches.
#[test]
fn streaming_over_files_equals_memory() {
    let dir = tempfile::tempdir().unwrap();
    let names = ColumnNames::new("value", "timestamp");
    let a = EventStream::from_rows(&(0..50).map(|i| (i % 4, i64::from(i))).collect::<Vec<_>>());
    let b = EventStream::from_rows(&(0..40).map(|i| (i % 3, i64::from(40 - i))).collect::<Vec<_>>());
    write_stream_ipc(&dir.path().join("a.arrow"), &a, &names, 9).unwrap();
    write_stream_ipc(&dir.path().join("b.arrow"), &b, &names, 11).unwrap();
    let backend = StreamingBackend::new(4).unwrap();
    let from_files = backend
        .execute_ipc(&dir.path().join("a.arrow"), &dir.path().join("b.arrow"), &names)
        .unwrap();
    assert_eq!(from_files, backend.execute(&a, &b).unwrap());
    assert_equivalent("files vs oracle", &first_match_oracle(&a, &b), &from_files);
}

/// Prediction: the optimizer collapses the canonical plan to a single
/// probe over the two scans.
/// If fails: a rewrite rule no longer fires.
#[test]
fn optimizer_collapses_canonical_plan() {
    let plan = optimize(LogicalPlan::first_match());
    assert_eq!(LogicalPlan::first_match().node_count(), 6);
    assert_eq!(plan.node_count(), 3);
    assert!(matches!(plan, LogicalPlan::FirstMatchProbe { .. }));
}

/// Prediction: every backend kind builds, and a zero chunk size only
/// fails for streaming.
/// If fails: the registry and the streaming guard disagree.
#[test]
fn registry_builds_every_kind() {
    for kind in BackendKind::ALL {
        assert!(kind.build(5).is_ok());
        let zero = kind.build(0);
        if kind == BackendKind::Streaming {
            assert!(matches!(zero, Err(MatchError::InvalidChunkSize)));
        } else {
            assert!(zero.is_ok());
        }
    }
}
