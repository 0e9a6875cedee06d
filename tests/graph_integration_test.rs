//! End-to-end tests of graph discovery, partitioning, and ordering against
//! the crate's public API, using the in-memory [`FakeIntrospector`] fixture
//! instead of a live Postgres instance — the same no-network-in-tests
//! convention described in `SPEC_FULL.md`. Mirrors the teacher's
//! `graph_integration_test.rs` in spirit: drive the whole pipeline for a
//! handful of realistic schema shapes and assert on the final artifacts.

use pgslice::csv_writer::{self, CsvWriter};
use pgslice::db::fake::{int_col, nullable_int_col, FakeIntrospector, FakeTable};
use pgslice::graph::{outsider_topo_sort, partition, topo_sort, GraphBuilder};
use tempfile::tempdir;

fn pos(order: &[pgslice::schema::TableId], state: &pgslice::graph::GraphState, name: &str) -> usize {
    let id = state.id_of(name).unwrap();
    order.iter().position(|&t| t == id).unwrap()
}

/// Spec §8.4 scenario 1: chain A -> B -> C, single row threaded through by
/// id. Nothing references A, so `partition()` (a BFS over `inv` from root)
/// only ever reaches A itself — A is the sole direct descendant, and B, C
/// are both outsiders (B is referenced by nothing the root can see, C by
/// B). The global topological order still places C before B before A.
#[tokio::test]
async fn chain_a_to_b_to_c_orders_parents_first() {
    let introspector = FakeIntrospector::new()
        .table(
            "a",
            FakeTable {
                columns: vec![int_col("id"), int_col("b_id")],
                foreign_keys: vec![("b_id".into(), "b".into(), "id".into())],
            },
        )
        .table(
            "b",
            FakeTable {
                columns: vec![int_col("id"), int_col("c_id")],
                foreign_keys: vec![("c_id".into(), "c".into(), "id".into())],
            },
        )
        .table(
            "c",
            FakeTable {
                columns: vec![int_col("id")],
                foreign_keys: vec![],
            },
        );

    let (state, root) = GraphBuilder::discover(&introspector, "a").await.unwrap();
    let p = partition(&state, root).unwrap();
    assert_eq!(p.direct_descendants.len(), 1);
    assert!(p.direct_descendants.contains(&root));
    assert_eq!(p.outsiders.len(), 2);

    let order = topo_sort(&state.reached, &state.deps, &state.inv).unwrap();
    assert_eq!(order.len(), 3);
    assert!(pos(&order, &state, "c") < pos(&order, &state, "b"));
    assert!(pos(&order, &state, "b") < pos(&order, &state, "a"));

    // B and C are both outsiders here. C's WHERE clause (spec §4.5.1) needs
    // B's parsed CSV already on disk (B references C), so the outsider
    // extraction order must put B before C — the reverse of the
    // parents-first global order above (where C, the parent, sorts first).
    let outsider_order = outsider_topo_sort(&p.outsiders, &state.deps, &state.inv).unwrap();
    assert_eq!(outsider_order.len(), 2);
    assert!(pos(&outsider_order, &state, "b") < pos(&outsider_order, &state, "c"));
}

/// Regression test for the outsider-ordering bug: extracting outsiders in
/// the plain parents-first `topo_sort` order would process C before B, so
/// C's WHERE clause would read B's parsed CSV before B has been written —
/// yielding zero seed values and an empty `c.csv`. Simulates the on-disk
/// dataflow by hand (no live database) and confirms the fix makes C see
/// B's seed values.
#[tokio::test]
async fn outsider_extraction_order_lets_each_table_see_its_dependants_seed_values() {
    let introspector = FakeIntrospector::new()
        .table(
            "a",
            FakeTable {
                columns: vec![int_col("id"), int_col("b_id")],
                foreign_keys: vec![("b_id".into(), "b".into(), "id".into())],
            },
        )
        .table(
            "b",
            FakeTable {
                columns: vec![int_col("id"), int_col("c_id")],
                foreign_keys: vec![("c_id".into(), "c".into(), "id".into())],
            },
        )
        .table(
            "c",
            FakeTable {
                columns: vec![int_col("id")],
                foreign_keys: vec![],
            },
        );

    let (state, root) = GraphBuilder::discover(&introspector, "a").await.unwrap();
    let p = partition(&state, root).unwrap();
    let outsider_order = outsider_topo_sort(&p.outsiders, &state.deps, &state.inv).unwrap();
    assert_eq!(outsider_order, vec![state.id_of("b").unwrap(), state.id_of("c").unwrap()]);

    let dir = tempdir().unwrap();
    let b = state.id_of("b").unwrap();
    let c = state.id_of("c").unwrap();

    // Process B first, exactly as `outsider_order` dictates. Its own
    // dependant (A) hasn't been simulated here, so its disjunction is
    // empty — that's fine, A is a direct descendant extracted in the
    // earlier descendant pass in a real run.
    let b_clause = pgslice::search::outsider_where(&state, b, dir.path()).unwrap();
    assert_eq!(b_clause, "WHERE 1 = 2");

    // B writes its parsed projection (carrying the `c_id` column C will
    // need) before C is processed.
    std::fs::create_dir_all(pgslice::search::table_dir(dir.path(), "b")).unwrap();
    let mut w = CsvWriter::create(&pgslice::search::parsed_path(dir.path(), "b")).unwrap();
    w.write_row(["id", "c_id"]).unwrap();
    w.write_row(["5", "77"]).unwrap();
    w.finish().unwrap();

    // Now C is processed second. Its WHERE clause must see B's freshly
    // written `c_id` values — this is exactly what the buggy
    // parents-first ordering (processing C before B) would miss.
    let c_clause = pgslice::search::outsider_where(&state, c, dir.path()).unwrap();
    assert_eq!(c_clause, "WHERE 1 = 2 OR \"id\" IN (77)");
}

/// Spec §8.4 scenario 2: diamond — A references B and C, both reference D.
/// Nothing references A, so (as in the chain scenario above) A is the only
/// direct descendant and B, C, D are all outsiders. The global order still
/// places D before both B and C, which precede A; but the outsider
/// extraction order reverses that for D specifically, since D's WHERE
/// clause needs both B's and C's parsed CSVs already on disk.
#[tokio::test]
async fn diamond_places_shared_parent_before_both_branches() {
    let introspector = FakeIntrospector::new()
        .table(
            "a",
            FakeTable {
                columns: vec![int_col("id"), int_col("b_id"), int_col("c_id")],
                foreign_keys: vec![
                    ("b_id".into(), "b".into(), "id".into()),
                    ("c_id".into(), "c".into(), "id".into()),
                ],
            },
        )
        .table(
            "b",
            FakeTable {
                columns: vec![int_col("id"), int_col("d_id")],
                foreign_keys: vec![("d_id".into(), "d".into(), "id".into())],
            },
        )
        .table(
            "c",
            FakeTable {
                columns: vec![int_col("id"), int_col("d_id")],
                foreign_keys: vec![("d_id".into(), "d".into(), "id".into())],
            },
        )
        .table(
            "d",
            FakeTable {
                columns: vec![int_col("id")],
                foreign_keys: vec![],
            },
        );

    let (state, root) = GraphBuilder::discover(&introspector, "a").await.unwrap();
    assert_eq!(state.reached.len(), 4);
    let p = partition(&state, root).unwrap();
    assert_eq!(p.direct_descendants.len(), 1);
    assert!(p.direct_descendants.contains(&root));
    assert_eq!(p.outsiders.len(), 3);

    let order = topo_sort(&state.reached, &state.deps, &state.inv).unwrap();
    assert!(pos(&order, &state, "d") < pos(&order, &state, "b"));
    assert!(pos(&order, &state, "d") < pos(&order, &state, "c"));
    assert!(pos(&order, &state, "b") < pos(&order, &state, "a"));
    assert!(pos(&order, &state, "c") < pos(&order, &state, "a"));

    // B, C, D are all outsiders. D's WHERE clause needs both B's and C's
    // parsed CSVs already written (both reference D), so the outsider
    // extraction order must put B and C before D — the reverse of D's
    // position in the global order above.
    let outsider_order = outsider_topo_sort(&p.outsiders, &state.deps, &state.inv).unwrap();
    assert_eq!(outsider_order.len(), 3);
    assert!(pos(&outsider_order, &state, "b") < pos(&outsider_order, &state, "d"));
    assert!(pos(&outsider_order, &state, "c") < pos(&outsider_order, &state, "d"));
}

/// Spec §8.4 scenario 3: X references root R (direct descendant) and also
/// references Y, which is otherwise unreached from R — Y is an outsider,
/// extracted using X's parsed CSV as the seed.
#[tokio::test]
async fn outsider_table_is_extracted_from_descendants_parsed_csv() {
    let introspector = FakeIntrospector::new()
        .table(
            "r",
            FakeTable {
                columns: vec![int_col("id")],
                foreign_keys: vec![],
            },
        )
        .table(
            "x",
            FakeTable {
                columns: vec![int_col("id"), int_col("r_id"), int_col("y_id")],
                foreign_keys: vec![
                    ("r_id".into(), "r".into(), "id".into()),
                    ("y_id".into(), "y".into(), "id".into()),
                ],
            },
        )
        .table(
            "y",
            FakeTable {
                columns: vec![int_col("id")],
                foreign_keys: vec![],
            },
        );

    let (state, root) = GraphBuilder::discover(&introspector, "r").await.unwrap();
    let p = partition(&state, root).unwrap();

    let x = state.id_of("x").unwrap();
    let y = state.id_of("y").unwrap();
    assert!(p.direct_descendants.contains(&x));
    assert!(p.outsiders.contains(&y));

    // Simulate the data-search phase's file dataflow without a live
    // database: write x's parsed projection by hand, then build y's
    // outsider WHERE clause from it and confirm it reads x's seed values.
    let dir = tempdir().unwrap();
    let x_dir = pgslice::search::table_dir(dir.path(), "x");
    std::fs::create_dir_all(&x_dir).unwrap();
    let mut w = CsvWriter::create(&pgslice::search::parsed_path(dir.path(), "x")).unwrap();
    w.write_row(["y_id"]).unwrap();
    w.write_row(["101"]).unwrap();
    w.write_row(["102"]).unwrap();
    w.finish().unwrap();

    let clause = pgslice::search::outsider_where(&state, y, dir.path()).unwrap();
    assert_eq!(clause, "WHERE 1 = 2 OR \"id\" IN (101, 102)");
}

/// Spec §8.3 boundary case: a table with no inbound FK edges yields only
/// itself as a direct descendant and no outsiders.
#[tokio::test]
async fn root_with_no_inbound_edges_has_only_itself() {
    let introspector = FakeIntrospector::new().table(
        "standalone",
        FakeTable {
            columns: vec![int_col("id")],
            foreign_keys: vec![],
        },
    );

    let (state, root) = GraphBuilder::discover(&introspector, "standalone")
        .await
        .unwrap();
    let p = partition(&state, root).unwrap();
    assert_eq!(p.direct_descendants.len(), 1);
    assert!(p.outsiders.is_empty());

    let order = topo_sort(&state.reached, &state.deps, &state.inv).unwrap();
    assert_eq!(order, vec![root]);
}

/// Spec §8.3 boundary case: a genuine two-table cycle (not self-reference)
/// is reported as a fatal cycle error, never silently truncated.
#[tokio::test]
async fn cycle_in_fk_graph_is_reported_not_silently_dropped() {
    let introspector = FakeIntrospector::new()
        .table(
            "a",
            FakeTable {
                columns: vec![int_col("id"), nullable_int_col("b_id")],
                foreign_keys: vec![("b_id".into(), "b".into(), "id".into())],
            },
        )
        .table(
            "b",
            FakeTable {
                columns: vec![int_col("id"), nullable_int_col("a_id")],
                foreign_keys: vec![("a_id".into(), "a".into(), "id".into())],
            },
        );

    let (state, _root) = GraphBuilder::discover(&introspector, "a").await.unwrap();
    let err = topo_sort(&state.reached, &state.deps, &state.inv).unwrap_err();
    assert!(matches!(err, pgslice::error::SliceError::Cycle(2, 2)));
}

/// Spec §8.1 "Projection completeness": the parsed CSV has exactly
/// raw-row-count + 1 lines (header plus one line per row), and round-trips
/// the values written.
#[tokio::test]
async fn parsed_projection_line_count_matches_raw_row_count_plus_header() {
    let dir = tempdir().unwrap();
    let raw_path = dir.path().join("t.csv");
    let parsed_path = dir.path().join("t_parsed.csv");

    let mut raw = CsvWriter::create(&raw_path).unwrap();
    for i in 0..5 {
        raw.write_row([i.to_string(), format!("v{i}")]).unwrap();
    }
    raw.finish().unwrap();

    let column_names = vec!["id".to_string(), "val".to_string()];
    let needed = vec!["id".to_string()];
    let count =
        csv_writer::write_parsed_projection(&raw_path, &parsed_path, &column_names, &needed)
            .unwrap();
    assert_eq!(count, Some(5));

    let contents = std::fs::read_to_string(&parsed_path).unwrap();
    let line_count = contents.lines().count();
    assert_eq!(line_count, 5 + 1);
}
