//! End-to-end scenarios driving whole graphs through `Graph::step`, mirroring
//! the literal traces worked out by hand while designing each operator.

use incremental_dataflow::{Antichain, GraphBuilder, GraphConfig, MultiSet, Version};

fn v(coords: &[u64]) -> Version {
    Version::new(coords.to_vec())
}

fn frontier(coords: &[u64]) -> Antichain {
    let mut antichain = Antichain::new();
    antichain.insert(v(coords));
    antichain
}

fn drain_all<T: Clone + Eq + std::hash::Hash>(handle: &incremental_dataflow::OutputHandle<T>) -> MultiSet<T> {
    handle
        .drain()
        .into_iter()
        .fold(MultiSet::new(), |acc, (_, changes)| acc.concat(&changes))
}

#[test]
fn map_applies_function_and_forwards_frontier() {
    let builder = GraphBuilder::new(GraphConfig::new().with_root_dimension(2));
    let (input, stream) = builder.new_input::<i32>();
    let output = stream.map(|x| x + 5).output();
    let mut graph = builder.finalize().unwrap();

    input.send(v(&[1, 0]), MultiSet::from_entries(vec![(1, 1), (2, 1), (3, 1)]));
    input.advance_to(frontier(&[1, 0]));
    graph.step();

    let drained = output.drain();
    assert_eq!(drained.len(), 1);
    let (version, changes) = &drained[0];
    assert_eq!(*version, v(&[1, 0]));
    assert_eq!(changes.clone().consolidate(), MultiSet::from_entries(vec![(6, 1), (7, 1), (8, 1)]));
}

#[test]
fn consolidate_merges_and_cancels_at_one_version() {
    let builder = GraphBuilder::new(GraphConfig::new().with_root_dimension(2));
    let (input, stream) = builder.new_input::<i32>();
    let output = stream.consolidate().output();
    let mut graph = builder.finalize().unwrap();

    input.send(v(&[1, 0]), MultiSet::from_entries(vec![(1, 1), (2, 1)]));
    input.send(v(&[1, 0]), MultiSet::from_entries(vec![(3, 1), (4, 1)]));
    input.send(v(&[1, 0]), MultiSet::from_entries(vec![(3, 2), (2, -1)]));
    input.advance_to(frontier(&[1, 1]));
    graph.step();

    let drained = output.drain();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].0, v(&[1, 0]));
    assert_eq!(drained[0].1.clone(), MultiSet::from_entries(vec![(1, 1), (3, 3), (4, 1)]));
}

#[test]
fn join_matches_by_key_and_updates_incrementally() {
    let builder = GraphBuilder::new(GraphConfig::new().with_root_dimension(2));
    let (input_a, stream_a) = builder.new_input::<(i32, char)>();
    let (input_b, stream_b) = builder.new_input::<(i32, char)>();
    let output = stream_a.join(&stream_b).output();
    let mut graph = builder.finalize().unwrap();

    input_a.send(v(&[1, 0]), MultiSet::from_entries(vec![((1, 'a'), 1), ((2, 'b'), 1)]));
    input_b.send(
        v(&[1, 0]),
        MultiSet::from_entries(vec![((1, 'x'), 1), ((2, 'y'), 1), ((3, 'z'), 1)]),
    );
    input_a.advance_to(frontier(&[1, 0]));
    input_b.advance_to(frontier(&[1, 0]));
    graph.step();

    assert_eq!(
        drain_all(&output),
        MultiSet::from_entries(vec![((1, ('a', 'x')), 1), ((2, ('b', 'y')), 1)])
    );

    input_a.send(v(&[2, 0]), MultiSet::from_entries(vec![((3, 'c'), 1)]));
    input_a.advance_to(frontier(&[2, 0]));
    graph.step();

    assert_eq!(drain_all(&output), MultiSet::from_entries(vec![((3, ('c', 'z')), 1)]));
}

#[test]
fn reduce_computes_weighted_sum_per_key() {
    let builder = GraphBuilder::new(GraphConfig::new().with_root_dimension(2));
    let (input, stream) = builder.new_input::<(&'static str, i32)>();
    let output = stream
        .reduce(|_key, group| {
            let sum: i64 = group.iter().map(|(value, mult)| (*value as i64) * mult).sum();
            if sum != 0 {
                vec![(sum, 1)]
            } else {
                Vec::new()
            }
        })
        .output();
    let mut graph = builder.finalize().unwrap();

    input.send(
        v(&[1, 0]),
        MultiSet::from_entries(vec![(("a", 1), 2), (("a", 2), 1), (("a", 3), 1), (("b", 4), 1)]),
    );
    input.send(v(&[1, 0]), MultiSet::from_entries(vec![(("b", 5), 1)]));
    input.advance_to(frontier(&[2, 0]));
    graph.step();

    assert_eq!(drain_all(&output), MultiSet::from_entries(vec![(("a", 7), 1), (("b", 9), 1)]));
}

#[test]
fn distinct_tracks_presence_across_versions() {
    let builder = GraphBuilder::new(GraphConfig::new().with_root_dimension(2));
    let (input, stream) = builder.new_input::<(i32, char)>();
    let output = stream.distinct().output();
    let mut graph = builder.finalize().unwrap();

    input.send(v(&[1, 0]), MultiSet::from_entries(vec![((1, 'a'), 1), ((1, 'b'), 1)]));
    input.send(v(&[2, 0]), MultiSet::from_entries(vec![((1, 'b'), -1), ((1, 'c'), 1)]));
    input.advance_to(frontier(&[3, 0]));
    graph.step();

    let drained = output.drain();
    let at_v1 = drained.iter().filter(|(version, _)| *version == v(&[1, 0])).fold(MultiSet::new(), |acc, (_, c)| acc.concat(c));
    let at_v2 = drained.iter().filter(|(version, _)| *version == v(&[2, 0])).fold(MultiSet::new(), |acc, (_, c)| acc.concat(c));

    assert_eq!(at_v1.consolidate(), MultiSet::from_entries(vec![((1, 'a'), 1), ((1, 'b'), 1)]));
    assert_eq!(at_v2.consolidate(), MultiSet::from_entries(vec![((1, 'c'), 1), ((1, 'b'), -1)]));
}

#[test]
fn count_emits_every_total_including_non_positive() {
    let builder = GraphBuilder::new(GraphConfig::new().with_root_dimension(2));
    let (input, stream) = builder.new_input::<(&'static str, i32)>();
    let output = stream.count().output();
    let mut graph = builder.finalize().unwrap();

    input.send(v(&[1, 0]), MultiSet::from_entries(vec![(("a", 1), 1), (("b", 1), 1)]));
    input.send(v(&[1, 0]), MultiSet::from_entries(vec![(("b", 1), -3)]));
    input.advance_to(frontier(&[2, 0]));
    graph.step();

    assert_eq!(drain_all(&output), MultiSet::from_entries(vec![(("a", 1), 1), (("b", -2), 1)]));
}

#[test]
fn iterate_computes_geometric_series_bounded_by_fifty() {
    let builder = GraphBuilder::new(GraphConfig::default());
    let (input, stream) = builder.new_input::<i32>();
    let result = stream.iterate(|var| {
        let doubled = var.map(|x| x * 2);
        let combined = doubled.concat(var);
        let filtered = combined.filter(|x| *x <= 50);
        let keyed = filtered.map(|x| (*x, ()));
        let deduped = keyed.distinct();
        let values = deduped.map(|(x, ())| *x);
        values.consolidate()
    });
    let output = result.output();
    let mut graph = builder.finalize().unwrap();

    input.send(v(&[0]), MultiSet::singleton(1, 1));
    input.advance_to(frontier(&[1]));

    let mut per_round = Vec::new();
    for _ in 0..64 {
        graph.step();
        let drained = output.drain();
        if !drained.is_empty() {
            let round: MultiSet<i32> = drained.into_iter().fold(MultiSet::new(), |acc, (_, c)| acc.concat(&c)).consolidate();
            if !round.is_empty() {
                per_round.push(round);
            }
        }
    }

    assert_eq!(
        per_round,
        vec![
            MultiSet::from_entries(vec![(1, 1), (2, 1)]),
            MultiSet::from_entries(vec![(4, 1)]),
            MultiSet::from_entries(vec![(8, 1)]),
            MultiSet::from_entries(vec![(16, 1)]),
            MultiSet::from_entries(vec![(32, 1)]),
        ]
    );

    let total = per_round.into_iter().fold(MultiSet::new(), |acc, round| acc.concat(&round));
    assert_eq!(
        total.consolidate(),
        MultiSet::from_entries(vec![(1, 1), (2, 1), (4, 1), (8, 1), (16, 1), (32, 1)])
    );
}
