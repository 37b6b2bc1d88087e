use std::collections::HashSet;

use morsedb::{
    compute_morse_graph, CachedMap, LeslieMap, MorseConfig, PointerGrid, RectGeo, SuccinctGrid,
};

fn leslie() -> LeslieMap {
    LeslieMap::from_parameter_box(&RectGeo::new(vec![23.0, 23.0], vec![23.1, 23.1]))
}

fn bounds() -> RectGeo {
    RectGeo::new(vec![0.0, 0.0], vec![320.0, 224.0])
}

#[test]
fn refinement_is_deterministic() {
    let config = MorseConfig::new(8, 11, 2_000).expect("valid depths");

    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        let graph = compute_morse_graph(SuccinctGrid::new(bounds()), &leslie(), &config)
            .expect("refinement succeeds");
        fingerprints.insert(graph.fingerprint());
    }
    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");

    let mut pointer_fingerprints = HashSet::new();
    for _ in 0..5 {
        let graph = compute_morse_graph(PointerGrid::new(bounds()), &leslie(), &config)
            .expect("refinement succeeds");
        pointer_fingerprints.insert(graph.fingerprint());
    }
    assert_eq!(pointer_fingerprints.len(), 1, "outputs diverged across runs");
}

#[test]
fn caching_does_not_change_the_result() {
    let config = MorseConfig::new(8, 10, 2_000).expect("valid depths");
    let plain = compute_morse_graph(SuccinctGrid::new(bounds()), &leslie(), &config)
        .expect("refinement succeeds");

    let cached = CachedMap::new(leslie());
    let first = compute_morse_graph(SuccinctGrid::new(bounds()), &cached, &config)
        .expect("refinement succeeds");
    let warm = cached.len();
    let second = compute_morse_graph(SuccinctGrid::new(bounds()), &cached, &config)
        .expect("refinement succeeds");

    assert_eq!(plain.fingerprint(), first.fingerprint());
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(cached.len(), warm);
    assert!(cached.hits() > 0);
}
