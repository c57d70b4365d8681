use lane_defence_core::{
    CellCoord, Directive, GridSnapshot, MatchEngine, Owner, PlayerStatus, ResourcePools,
    UnitCatalog, UnitKind, UnitSnapshot,
};
use lane_defence_system_threat::{LaunchRisk, Risk, ThreatEstimator};
use lane_defence_world::{Rules, World};

/// Engine double with scripted paths and a single opponent turret.
struct ScriptedEngine {
    grid: GridSnapshot,
    paths: Vec<(CellCoord, Vec<CellCoord>)>,
    turret: UnitSnapshot,
    covered: Vec<CellCoord>,
}

impl MatchEngine for ScriptedEngine {
    fn grid(&self) -> &GridSnapshot {
        &self.grid
    }

    fn path_to_edge(&self, start: CellCoord) -> Vec<CellCoord> {
        self.paths
            .iter()
            .find(|(cell, _)| *cell == start)
            .map(|(_, path)| path.clone())
            .unwrap_or_default()
    }

    fn attackers(&self, cell: CellCoord, defender: Owner) -> Vec<UnitSnapshot> {
        if defender == Owner::Own && self.covered.contains(&cell) {
            vec![self.turret]
        } else {
            Vec::new()
        }
    }

    fn issue(&mut self, _directive: &Directive) -> u32 {
        0
    }

    fn submit(&mut self) {}
}

fn catalog_with_turret_damage(damage: f32) -> UnitCatalog {
    let unit = |shorthand: &str| {
        serde_json::json!({
            "shorthand": shorthand,
            "cost1": 1.0,
            "startHealth": 10.0,
            "attackRange": 2.5,
            "attackDamageWalker": damage,
        })
    };
    let raw = serde_json::json!({
        "unitInformation": (["FF", "EF", "DF", "PI", "EI", "SI"].map(unit)),
    })
    .to_string();
    UnitCatalog::from_game_config(&raw).expect("catalog resolves")
}

fn empty_world() -> World {
    World::new(
        UnitCatalog::standard(),
        Rules::default(),
        PlayerStatus {
            health: 30.0,
            resources: ResourcePools::new(40.0, 5.0),
        },
        PlayerStatus {
            health: 30.0,
            resources: ResourcePools::default(),
        },
    )
}

#[test]
fn launch_away_from_covered_path_is_preferred() {
    let p1_start = CellCoord::new(13, 0);
    let p2_start = CellCoord::new(14, 0);
    let covered = CellCoord::new(13, 1);
    let engine = ScriptedEngine {
        grid: GridSnapshot::empty(3, PlayerStatus::default(), PlayerStatus::default()),
        paths: vec![
            (p1_start, vec![p1_start, covered, CellCoord::new(13, 2)]),
            (p2_start, vec![p2_start, CellCoord::new(14, 1), CellCoord::new(14, 2)]),
        ],
        turret: UnitSnapshot::fresh(UnitKind::Turret, Owner::Opponent, 75.0),
        covered: vec![covered],
    };
    let mut estimator = ThreatEstimator::new(catalog_with_turret_damage(2.0));

    let mut risks = Vec::new();
    estimator.handle(&engine, &[p1_start, p2_start], &mut risks);

    assert_eq!(
        risks,
        vec![
            LaunchRisk {
                cell: p1_start,
                risk: Risk::Finite(2),
            },
            LaunchRisk {
                cell: p2_start,
                risk: Risk::Finite(0),
            },
        ]
    );
    assert_eq!(
        estimator
            .least_risk(&engine, &[p1_start, p2_start])
            .map(|choice| choice.cell),
        Some(p2_start),
    );
}

#[test]
fn undefended_arena_selects_first_candidate() {
    let world = empty_world();
    let candidates = [
        CellCoord::new(14, 0),
        CellCoord::new(13, 0),
        CellCoord::new(7, 6),
        CellCoord::new(20, 6),
    ];
    let mut estimator = ThreatEstimator::new(UnitCatalog::standard());

    let mut risks = Vec::new();
    estimator.handle(&world, &candidates, &mut risks);

    assert!(risks.iter().all(|entry| entry.risk == Risk::Finite(0)));
    assert_eq!(
        estimator.least_risk(&world, &candidates).map(|choice| choice.cell),
        Some(candidates[0]),
    );
}

#[test]
fn least_risk_is_idempotent_on_unchanged_snapshot() {
    let mut world = empty_world();
    for cell in [CellCoord::new(13, 16), CellCoord::new(20, 18)] {
        world
            .place_unit(cell, UnitSnapshot::fresh(UnitKind::Turret, Owner::Opponent, 75.0))
            .expect("cell is free");
    }
    let candidates = [CellCoord::new(13, 0), CellCoord::new(14, 0), CellCoord::new(5, 8)];
    let mut estimator = ThreatEstimator::new(UnitCatalog::standard());

    let first = estimator.least_risk(&world, &candidates);
    let second = estimator.least_risk(&world, &candidates);

    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn sealed_candidate_scores_unreachable_and_loses() {
    let mut world = empty_world();
    for cell in [CellCoord::new(1, 13), CellCoord::new(0, 14)] {
        world
            .place_unit(cell, UnitSnapshot::fresh(UnitKind::Wall, Owner::Own, 60.0))
            .expect("cell is free");
    }
    let sealed = CellCoord::new(0, 13);
    let open = CellCoord::new(13, 0);
    let mut estimator = ThreatEstimator::new(UnitCatalog::standard());

    let mut risks = Vec::new();
    estimator.handle(&world, &[sealed, open], &mut risks);

    assert_eq!(risks[0].risk, Risk::Unreachable);
    assert_eq!(risks[1].risk, Risk::Finite(0));
    assert_eq!(
        estimator.least_risk(&world, &[sealed, open]).map(|choice| choice.cell),
        Some(open),
    );
}

#[test]
fn threat_map_counts_upgraded_damage() {
    let mut world = empty_world();
    let mut turret = UnitSnapshot::fresh(UnitKind::Turret, Owner::Opponent, 75.0);
    turret.upgraded = true;
    world
        .place_unit(CellCoord::new(13, 16), turret)
        .expect("cell is free");
    let mut estimator = ThreatEstimator::new(UnitCatalog::standard());

    estimator.refresh(&world);

    assert_eq!(estimator.threat_map().score(CellCoord::new(13, 14)), 15);
    assert_eq!(estimator.threat_map().score(CellCoord::new(13, 5)), 0);
}
