use std::sync::atomic::Ordering;
use std::sync::Arc;

use sombra_cursor::{
    CounterMetrics, Cursor, CursorOptions, Dir, LabelId, MemStore, MemStoreBuilder, NodeId,
    PropKeyId, PropValue, PropValueOwned, RelId, RelationshipCursor, Result, SombraError,
    Statement, TypeId,
};

const KNOWS: TypeId = TypeId(1);
const LIKES: TypeId = TypeId(2);

fn statement(builder: MemStoreBuilder) -> Statement {
    Statement::new(Arc::new(builder.build()), CursorOptions::default())
}

fn counted(builder: MemStoreBuilder) -> (Statement, Arc<CounterMetrics>) {
    let metrics = Arc::new(CounterMetrics::default());
    let opts = CursorOptions::default().metrics(metrics.clone());
    (Statement::new(Arc::new(builder.build()), opts), metrics)
}

fn rel_ids(cursor: &mut RelationshipCursor<'_>) -> Result<Vec<RelId>> {
    let mut out = Vec::new();
    while cursor.next()? {
        out.push(cursor.id());
    }
    Ok(out)
}

fn setup_star_graph(
    neighbor_count: usize,
    dense: bool,
) -> Result<(MemStoreBuilder, NodeId, Vec<NodeId>)> {
    let mut builder = MemStore::builder();
    let center = if dense {
        builder.dense_node(&[LabelId(1)])?
    } else {
        builder.node(&[LabelId(1)])?
    };
    let mut neighbors = Vec::with_capacity(neighbor_count);
    for _ in 0..neighbor_count {
        let node = builder.node(&[LabelId(2)])?;
        builder.relationship(center, node, KNOWS)?;
        neighbors.push(node);
    }
    Ok((builder, center, neighbors))
}

#[test]
fn node_cursor_reports_resolved_id() -> Result<()> {
    let mut builder = MemStore::builder();
    builder.node(&[])?;
    let second = builder.node(&[LabelId(3)])?;
    let stmt = statement(builder);

    let node = stmt.node(second)?;
    assert_eq!(node.id(), second);
    assert_eq!(node.record().id, second);
    assert!(!node.is_dense());
    node.labels()?.close();
    assert_eq!(node.id(), second);
    Ok(())
}

#[test]
fn missing_node_is_not_found() -> Result<()> {
    let mut builder = MemStore::builder();
    builder.node(&[])?;
    let stmt = statement(builder);

    assert!(matches!(stmt.node(NodeId(42)), Err(SombraError::NotFound(_))));
    Ok(())
}

#[test]
fn labels_are_ascending_and_repeatable() -> Result<()> {
    let mut builder = MemStore::builder();
    let node = builder.node(&[LabelId(9), LabelId(2), LabelId(5), LabelId(2)])?;
    let stmt = statement(builder);
    let node = stmt.node(node)?;

    for _ in 0..2 {
        let mut labels = node.labels()?;
        let mut seen = Vec::new();
        while labels.next()? {
            seen.push(labels.label());
        }
        assert_eq!(seen, vec![LabelId(2), LabelId(5), LabelId(9)]);
        labels.close();
    }
    Ok(())
}

#[test]
fn label_seek_stops_on_match_or_overshoot() -> Result<()> {
    let mut builder = MemStore::builder();
    let node = builder.node(&[LabelId(1), LabelId(4), LabelId(8)])?;
    let stmt = statement(builder);
    let node = stmt.node(node)?;

    let mut labels = node.labels()?;
    assert!(labels.seek(LabelId(4))?);
    assert_eq!(labels.label(), LabelId(4));
    assert!(!labels.seek(LabelId(6))?);
    assert_eq!(labels.label(), LabelId(8));
    assert!(!labels.next()?);
    Ok(())
}

#[test]
fn many_labels_spill_to_dynamic_array() -> Result<()> {
    let ids: Vec<LabelId> = (0..40).map(|i| LabelId(i * 3 + 1)).collect();
    let mut builder = MemStore::builder();
    let node = builder.node(&ids)?;
    let (stmt, metrics) = counted(builder);
    let node = stmt.node(node)?;

    let mut labels = node.labels()?;
    let mut seen = Vec::new();
    while labels.next()? {
        seen.push(labels.label());
    }
    assert_eq!(seen, ids);
    assert_eq!(metrics.dynamic_records.load(Ordering::Relaxed), 1);
    Ok(())
}

#[test]
fn node_without_labels_yields_nothing() -> Result<()> {
    let mut builder = MemStore::builder();
    let node = builder.node(&[])?;
    let stmt = statement(builder);

    let mut labels = stmt.node(node)?.labels()?;
    assert!(!labels.next()?);
    assert!(!labels.next()?);
    Ok(())
}

#[test]
fn property_chain_is_walked_in_order() -> Result<()> {
    let mut builder = MemStore::builder();
    let node = builder.node(&[])?;
    builder.node_property(node, PropKeyId(1), PropValue::Int(7))?;
    builder.node_property(node, PropKeyId(2), PropValue::Str("short"))?;
    builder.node_property(node, PropKeyId(3), PropValue::Bool(true))?;
    let stmt = statement(builder);

    let mut props = stmt.node(node)?.properties()?;
    let mut seen = Vec::new();
    while props.next()? {
        seen.push((props.key(), props.value_owned()));
    }
    assert_eq!(
        seen,
        vec![
            (PropKeyId(1), PropValueOwned::Int(7)),
            (PropKeyId(2), PropValueOwned::Str("short".into())),
            (PropKeyId(3), PropValueOwned::Bool(true)),
        ]
    );
    Ok(())
}

#[test]
fn node_without_properties_yields_nothing() -> Result<()> {
    let mut builder = MemStore::builder();
    let node = builder.node(&[])?;
    let stmt = statement(builder);

    let mut props = stmt.node(node)?.properties()?;
    assert!(!props.next()?);
    Ok(())
}

#[test]
fn long_values_are_read_from_overflow_records() -> Result<()> {
    let long = "a property string that does not fit the inline slot".repeat(4);
    let blob: Vec<u8> = (0..=255).collect();
    let mut builder = MemStore::builder();
    let node = builder.node(&[])?;
    builder.node_property(node, PropKeyId(1), PropValue::Str(&long))?;
    builder.node_property(node, PropKeyId(2), PropValue::Bytes(&blob))?;
    let (stmt, metrics) = counted(builder);

    let mut props = stmt.node(node)?.properties()?;
    assert!(props.next()?);
    assert_eq!(props.row().value(), PropValue::Str(&long));
    assert!(props.next()?);
    assert_eq!(props.row().value(), PropValue::Bytes(&blob));
    assert!(!props.next()?);
    assert_eq!(metrics.dynamic_records.load(Ordering::Relaxed), 2);
    Ok(())
}

#[test]
fn property_seek_finds_key() -> Result<()> {
    let mut builder = MemStore::builder();
    let node = builder.node(&[])?;
    for key in 1..=5 {
        builder.node_property(node, PropKeyId(key), PropValue::Int(i64::from(key) * 10))?;
    }
    let stmt = statement(builder);

    let mut props = stmt.node(node)?.properties()?;
    assert!(props.seek(PropKeyId(4))?);
    assert_eq!(props.value_owned(), PropValueOwned::Int(40));
    assert!(!props.seek(PropKeyId(2))?);
    Ok(())
}

#[test]
fn sparse_relationships_respect_direction() -> Result<()> {
    let mut builder = MemStore::builder();
    let a = builder.node(&[])?;
    let b = builder.node(&[])?;
    let c = builder.node(&[])?;
    let r1 = builder.relationship(a, b, KNOWS)?;
    let r2 = builder.relationship(c, a, KNOWS)?;
    let r3 = builder.relationship(a, c, LIKES)?;
    let stmt = statement(builder);
    let node = stmt.node(a)?;

    let mut out = node.relationships(Dir::Out)?;
    assert_eq!(rel_ids(&mut out)?, vec![r1, r3]);
    out.close();

    let mut incoming = node.relationships(Dir::In)?;
    assert_eq!(rel_ids(&mut incoming)?, vec![r2]);
    incoming.close();

    let mut both = node.relationships(Dir::Both)?;
    assert_eq!(rel_ids(&mut both)?, vec![r1, r2, r3]);
    Ok(())
}

#[test]
fn relationship_rows_are_relative_to_origin() -> Result<()> {
    let mut builder = MemStore::builder();
    let a = builder.node(&[])?;
    let b = builder.node(&[])?;
    builder.relationship(b, a, LIKES)?;
    let stmt = statement(builder);

    let mut rels = stmt.node(a)?.relationships(Dir::Both)?;
    assert!(rels.next()?);
    let row = rels.row();
    assert_eq!(row.origin(), a);
    assert_eq!(row.start_node(), b);
    assert_eq!(row.end_node(), a);
    assert_eq!(row.other_node(), b);
    assert_eq!(row.direction(), Dir::In);
    assert_eq!(row.rel_type(), LIKES);
    assert!(!row.is_loop());
    Ok(())
}

#[test]
fn type_filter_selects_listed_types() -> Result<()> {
    let mut builder = MemStore::builder();
    let a = builder.node(&[])?;
    let b = builder.node(&[])?;
    builder.relationship(a, b, KNOWS)?;
    let liked = builder.relationship(a, b, LIKES)?;
    let (stmt, metrics) = counted(builder);
    let node = stmt.node(a)?;

    let mut rels = node.relationships_of_types(Dir::Out, &[LIKES])?;
    assert_eq!(rel_ids(&mut rels)?, vec![liked]);
    rels.close();
    assert_eq!(metrics.rows_filtered.load(Ordering::Relaxed), 1);

    let mut none = node.relationships_of_types(Dir::Both, &[])?;
    assert!(!none.next()?);
    Ok(())
}

#[test]
fn dense_type_filter_skips_whole_groups() -> Result<()> {
    let mut builder = MemStore::builder();
    let hub = builder.dense_node(&[])?;
    let other = builder.node(&[])?;
    builder.relationship(hub, other, KNOWS)?;
    builder.relationship(hub, other, KNOWS)?;
    let liked = builder.relationship(hub, other, LIKES)?;
    let (stmt, metrics) = counted(builder);

    let mut rels = stmt.node(hub)?.relationships_of_types(Dir::Out, &[LIKES])?;
    assert_eq!(rel_ids(&mut rels)?, vec![liked]);
    assert_eq!(metrics.groups_skipped.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.rows_filtered.load(Ordering::Relaxed), 0);
    Ok(())
}

#[test]
fn self_loop_is_produced_once_for_every_direction() -> Result<()> {
    for dense in [false, true] {
        let mut builder = MemStore::builder();
        let a = if dense {
            builder.dense_node(&[])?
        } else {
            builder.node(&[])?
        };
        let looped = builder.relationship(a, a, KNOWS)?;
        let stmt = statement(builder);
        let node = stmt.node(a)?;

        for dir in [Dir::Out, Dir::In, Dir::Both] {
            let mut rels = node.relationships(dir)?;
            assert_eq!(rel_ids(&mut rels)?, vec![looped], "dense={dense} dir={dir:?}");
            rels.close();
        }
    }
    Ok(())
}

#[test]
fn dense_node_walks_groups_then_sub_chains() -> Result<()> {
    let mut builder = MemStore::builder();
    let hub = builder.dense_node(&[])?;
    let other = builder.node(&[])?;
    let r1 = builder.relationship(hub, other, KNOWS)?;
    let r2 = builder.relationship(other, hub, KNOWS)?;
    let r3 = builder.relationship(hub, other, LIKES)?;
    let r4 = builder.relationship(hub, hub, KNOWS)?;
    let stmt = statement(builder);
    let node = stmt.node(hub)?;
    assert!(node.is_dense());

    let mut both = node.relationships(Dir::Both)?;
    assert_eq!(rel_ids(&mut both)?, vec![r1, r2, r4, r3]);
    both.close();

    let mut out = node.relationships(Dir::Out)?;
    assert_eq!(rel_ids(&mut out)?, vec![r1, r4, r3]);
    out.close();

    let mut incoming = node.relationships_of_types(Dir::In, &[KNOWS])?;
    assert_eq!(rel_ids(&mut incoming)?, vec![r2, r4]);
    incoming.close();

    let mut liked = node.relationships_of_types(Dir::Out, &[LIKES])?;
    assert_eq!(rel_ids(&mut liked)?, vec![r3]);
    Ok(())
}

#[test]
fn dense_and_sparse_nodes_agree() -> Result<()> {
    for dense in [false, true] {
        let (builder, center, neighbors) = setup_star_graph(25, dense)?;
        let stmt = statement(builder);
        let mut rels = stmt.node(center)?.relationships(Dir::Out)?;
        let mut seen = Vec::new();
        while rels.next()? {
            seen.push(rels.row().other_node());
        }
        assert_eq!(seen, neighbors, "dense={dense}");
    }
    Ok(())
}

#[test]
fn exhausted_cursor_does_not_rewalk() -> Result<()> {
    let (builder, center, _) = setup_star_graph(4, false)?;
    let (stmt, metrics) = counted(builder);

    let mut rels = stmt.node(center)?.relationships(Dir::Both)?;
    while rels.next()? {}
    let resolved = metrics.records_resolved();
    assert!(!rels.next()?);
    assert!(!rels.next()?);
    assert_eq!(metrics.records_resolved(), resolved);
    Ok(())
}

#[test]
fn relationship_properties_follow_current_row() -> Result<()> {
    let mut builder = MemStore::builder();
    let a = builder.node(&[])?;
    let b = builder.node(&[])?;
    let r1 = builder.relationship(a, b, KNOWS)?;
    let r2 = builder.relationship(a, b, KNOWS)?;
    builder.relationship_property(r1, PropKeyId(1), PropValue::Int(1))?;
    builder.relationship_property(r2, PropKeyId(1), PropValue::Int(2))?;
    builder.relationship_property(r2, PropKeyId(2), PropValue::Float(0.5))?;
    let stmt = statement(builder);

    let mut rels = stmt.node(a)?.relationships(Dir::Out)?;
    let mut counts = Vec::new();
    while rels.next()? {
        let mut props = rels.properties()?;
        let mut n = 0;
        while props.next()? {
            n += 1;
        }
        counts.push((rels.id(), n));
    }
    assert_eq!(counts, vec![(r1, 1), (r2, 2)]);
    Ok(())
}

#[test]
fn traversal_reuses_pooled_cursors() -> Result<()> {
    let (builder, center, neighbors) = setup_star_graph(10, false)?;
    let (stmt, metrics) = counted(builder);

    let mut rels = stmt.node(center)?.relationships(Dir::Out)?;
    let mut labelled = 0;
    while rels.next()? {
        let neighbor = stmt.node(rels.row().other_node())?;
        let mut labels = neighbor.labels()?;
        if labels.seek(LabelId(2))? {
            labelled += 1;
        }
    }
    rels.close();
    assert_eq!(labelled, neighbors.len());
    assert_eq!(
        metrics.label_acquisitions.load(Ordering::Relaxed),
        neighbors.len() as u64
    );
    assert_eq!(metrics.releases.load(Ordering::Relaxed), neighbors.len() as u64 + 1);
    assert!(stmt.pool_status().is_idle());
    Ok(())
}

#[test]
fn statements_run_in_parallel_over_shared_store() -> Result<()> {
    let (builder, center, neighbors) = setup_star_graph(32, true)?;
    let store: Arc<MemStore> = Arc::new(builder.build());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || -> Result<usize> {
                let stmt = Statement::new(store, CursorOptions::default());
                let mut rels = stmt.node(center)?.relationships(Dir::Out)?;
                let mut n = 0;
                while rels.next()? {
                    n += 1;
                }
                Ok(n)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap()?, neighbors.len());
    }
    Ok(())
}

#[test]
fn dense_type_and_direction_filters_combine() -> Result<()> {
    let mut builder = MemStore::builder();
    let hub = builder.dense_node(&[])?;
    let other = builder.node(&[])?;
    let r1 = builder.relationship(hub, other, KNOWS)?;
    let r2 = builder.relationship(other, hub, KNOWS)?;
    let r3 = builder.relationship(hub, other, LIKES)?;
    let stmt = statement(builder);
    let node = stmt.node(hub)?;

    let mut out = node.relationships(Dir::Out)?;
    assert_eq!(rel_ids(&mut out)?, vec![r1, r3]);
    out.close();

    let mut known = node.relationships_of_types(Dir::Both, &[KNOWS])?;
    assert_eq!(rel_ids(&mut known)?, vec![r1, r2]);
    known.close();

    let mut liked_in = node.relationships_of_types(Dir::In, &[LIKES])?;
    assert!(rel_ids(&mut liked_in)?.is_empty());
    Ok(())
}

fn exhausted_fixture() -> Result<(Statement, NodeId)> {
    let mut builder = MemStore::builder();
    let a = builder.node(&[LabelId(5)])?;
    let b = builder.node(&[])?;
    builder.node_property(a, PropKeyId(9), PropValue::Int(42))?;
    builder.relationship(a, b, TypeId(3))?;
    Ok((statement(builder), a))
}

#[cfg(not(debug_assertions))]
#[test]
fn exhausted_cursors_expose_reset_rows() -> Result<()> {
    let (stmt, a) = exhausted_fixture()?;
    let node = stmt.node(a)?;

    let mut labels = node.labels()?;
    while labels.next()? {}
    assert_eq!(labels.label(), LabelId::default());

    let mut props = node.properties()?;
    while props.next()? {}
    assert_eq!(props.key(), PropKeyId::default());
    assert_eq!(props.value_owned(), PropValueOwned::Null);

    let mut rels = node.relationships(Dir::Both)?;
    while rels.next()? {}
    assert_eq!(rels.id(), RelId(0));
    assert_eq!(rels.row().rel_type(), TypeId::default());
    Ok(())
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "label cursor read outside a row")]
fn label_read_before_first_row_panics() {
    let (stmt, a) = exhausted_fixture().unwrap();
    let labels = stmt.node(a).unwrap().labels().unwrap();
    labels.label();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "property cursor read outside a row")]
fn property_read_after_exhaustion_panics() {
    let (stmt, a) = exhausted_fixture().unwrap();
    let mut props = stmt.node(a).unwrap().properties().unwrap();
    while props.next().unwrap() {}
    props.key();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "relationship cursor read outside a row")]
fn relationship_read_after_exhaustion_panics() {
    let (stmt, a) = exhausted_fixture().unwrap();
    let mut rels = stmt.node(a).unwrap().relationships(Dir::Both).unwrap();
    while rels.next().unwrap() {}
    rels.row();
}
