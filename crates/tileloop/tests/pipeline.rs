//! End-to-end tests: rule string -> tiling -> level -> document -> level.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tileloop::level::pair_edges;
use tileloop::{
    Config, Dimensions, ImportOutcome, Level, Polygon, StopReason, Tiling, TilingGenerator,
    Vector2, export_level, import_level, parse_document,
};

const SQUARE: &str = "4-4-0,4/r90/m(v2)";

fn assert_no_duplicate_centroids(tiling: &Tiling) {
    for (i, a) in tiling.nodes.iter().enumerate() {
        for b in &tiling.nodes[i + 1..] {
            assert!(
                !a.centroid().approx_eq(b.centroid(), 0.01),
                "duplicate centroid {:?}",
                a.centroid()
            );
        }
    }
}

#[test]
fn square_rule_places_documented_seed() {
    let tiling = TilingGenerator::new(Config::with_steps(1)).generate(SQUARE).expect("square rule");
    assert_eq!(tiling.stats.seed_nodes, 3, "core square plus the two placed seed squares");
    assert_no_duplicate_centroids(&tiling);
    for expected in [Vector2::new(0.0, 0.0), Vector2::new(0.0, 1.0), Vector2::new(1.0, 1.0)] {
        assert!(
            tiling.nodes.iter().any(|n| n.centroid().approx_eq(expected, 0.01)),
            "missing seed square at {expected:?}"
        );
    }
}

#[test]
fn common_rules_generate_without_duplicates() {
    for rule in ["3/r60/r(h2)", "6/r60/r(h1)", SQUARE, "6-3-6/m30/r(v4)"] {
        let tiling = TilingGenerator::new(Config::with_steps(2))
            .generate(rule)
            .unwrap_or_else(|e| panic!("{rule} failed: {e}"));
        assert!(tiling.len() > 1, "{rule} produced {} nodes", tiling.len());
        assert_no_duplicate_centroids(&tiling);
    }
}

#[test]
fn node_cap_stops_generation() {
    let mut config = Config::with_steps(40);
    config.limits.max_nodes = 30;
    let tiling = TilingGenerator::new(config).generate(SQUARE).expect("square rule");
    assert_eq!(tiling.stats.stop_reason, StopReason::NodeLimit);
    assert_no_duplicate_centroids(&tiling);
}

#[test]
fn generation_is_deterministic() {
    let generator = TilingGenerator::new(Config::with_steps(3));
    let a = generator.generate(SQUARE).expect("square rule");
    let b = generator.generate(SQUARE).expect("square rule");
    let ca: Vec<Vector2> = a.nodes.iter().map(Polygon::centroid).collect();
    let cb: Vec<Vector2> = b.nodes.iter().map(Polygon::centroid).collect();
    assert_eq!(ca, cb);
}

#[test]
fn dual_of_square_tiling_is_square() {
    let tiling = TilingGenerator::new(Config::with_steps(3))
        .generate("4-4-0,4/r90/m(v2)*")
        .expect("dual square rule");
    assert!(tiling.is_dual);
    assert!(!tiling.is_empty());
    for node in &tiling.nodes {
        assert_eq!(node.vertices().len(), 4);
    }
}

#[test]
fn invalid_rule_is_rejected() {
    let err = TilingGenerator::default().generate("4-7(").expect_err("unbalanced rule");
    assert!(err.to_string().contains("7("), "error should name the token: {err}");
}

#[test]
fn export_then_import_restores_connectors() {
    let config = Config::with_steps(2);
    let tiling = TilingGenerator::new(config.clone()).generate(SQUARE).expect("square rule");
    let level = Level::build(tiling, &config, 3, &mut StdRng::seed_from_u64(42));
    let doc = export_level(&level, "round trip", "", Dimensions { width: 640.0, height: 480.0 });
    let json = serde_json::to_string_pretty(&doc).expect("serializes");

    let parsed = parse_document(&json).expect("valid document");
    let (restored, outcome) =
        import_level(&parsed, &Config::default(), &mut StdRng::seed_from_u64(7)).expect("imports");

    assert_eq!(outcome, ImportOutcome::Applied);
    assert_eq!(restored.len(), level.len());
    for (a, b) in level.nodes().iter().zip(restored.nodes()) {
        assert_eq!(a.weights(), b.weights());
        assert_eq!(a.turns(), b.turns());
        for (ea, eb) in a.edges().iter().zip(b.edges()) {
            assert!(ea.position.approx_eq(eb.position, 0.01));
        }
    }
    assert_eq!(restored.is_solved(), level.is_solved());
    assert_eq!(restored.effects(), level.effects());
    assert_eq!(restored.min_moves_to_solve(), level.min_moves_to_solve());
}

#[test]
fn unshuffled_import_is_solved() {
    let config = Config::with_steps(2);
    let level = Level::from_rule(SQUARE, &config, &mut StdRng::seed_from_u64(3)).expect("level");
    let mut doc = export_level(&level, "", "", Dimensions { width: 1.0, height: 1.0 });

    // Undo the scramble by hand: turn every tile back to turn 0 and
    // recover its weights from a fresh, unshuffled pairing.
    let tiling = TilingGenerator::new(config.clone()).generate(SQUARE).expect("tiling");
    let pairing = pair_edges(&tiling.nodes, 0.01);
    for tile in &mut doc.tiles {
        tile.turns = Some(0);
        for c in &mut tile.connections {
            c.connections = 0;
        }
    }
    for r in &pairing.boundary {
        doc.tiles[r.node].connections[r.edge].connections = 0;
    }
    for (a, b) in &pairing.pairs {
        doc.tiles[a.node].connections[a.edge].connections = 1;
        doc.tiles[b.node].connections[b.edge].connections = 1;
    }

    let (restored, _) =
        import_level(&doc, &Config::default(), &mut StdRng::seed_from_u64(0)).expect("imports");
    assert!(restored.is_solved());
    assert!(restored.is_frozen());
    assert_eq!(restored.min_moves_to_solve(), 0);
}

#[test]
fn player_can_solve_a_scrambled_level() {
    let config = Config::with_steps(2);
    let mut level = Level::from_rule(SQUARE, &config, &mut StdRng::seed_from_u64(11)).expect("level");
    if level.is_solved() {
        return;
    }
    let turns: Vec<i32> = level.nodes().iter().map(|n| n.turns()).collect();
    for (i, t) in turns.into_iter().enumerate() {
        if t != 0 && !level.is_frozen() {
            assert!(level.rotate_tile(i, -t));
        }
    }
    assert!(level.is_solved(), "undoing every scramble turn must solve the level");
    assert!(level.is_frozen());
}
