//! Scripted matches played against the in-memory world.

use anyhow::{Context, Result};
use lane_defence_core::{
    ActionFrame, BreachEvent, CellCoord, Owner, PlayerStatus, ResourcePools, UnitCatalog,
    UnitKind, UnitSnapshot,
};
use lane_defence_system_turn::{StrategyConfig, TurnDirector, TurnReport};
use lane_defence_world::{Rules, World};
use serde::Deserialize;
use tracing::debug;

/// Match description read from a scenario TOML file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Scenario {
    /// Turns to play unless overridden on the command line.
    pub(crate) turns: u32,
    /// Starting state of the own player.
    pub(crate) own: PlayerSetup,
    /// Starting state of the opponent.
    pub(crate) opponent: PlayerSetup,
    /// Resources credited to the own player at the start of every later turn.
    pub(crate) income: Income,
    /// Structure-point floor kept by reserve-aware placements.
    pub(crate) structure_reserve: f32,
    /// Structures standing before the first turn.
    pub(crate) structures: Vec<StructureSetup>,
    /// Per-turn scripted events.
    pub(crate) script: Vec<ScriptedTurn>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            turns: 10,
            own: PlayerSetup::default(),
            opponent: PlayerSetup::default(),
            income: Income::default(),
            structure_reserve: Rules::default().structure_reserve,
            structures: Vec::new(),
            script: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct PlayerSetup {
    pub(crate) health: f32,
    pub(crate) structure: f32,
    pub(crate) mobile: f32,
}

impl Default for PlayerSetup {
    fn default() -> Self {
        Self {
            health: 30.0,
            structure: 40.0,
            mobile: 5.0,
        }
    }
}

impl PlayerSetup {
    fn status(self) -> PlayerStatus {
        PlayerStatus {
            health: self.health,
            resources: ResourcePools::new(self.structure, self.mobile),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Income {
    pub(crate) structure: f32,
    pub(crate) mobile: f32,
}

impl Default for Income {
    fn default() -> Self {
        Self {
            structure: 5.0,
            mobile: 5.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub(crate) struct StructureSetup {
    pub(crate) kind: UnitKind,
    pub(crate) cell: CellCoord,
    #[serde(default = "opponent")]
    pub(crate) owner: Owner,
    #[serde(default)]
    pub(crate) upgraded: bool,
}

fn opponent() -> Owner {
    Owner::Opponent
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub(crate) struct Damage {
    pub(crate) cell: CellCoord,
    pub(crate) amount: f32,
}

/// Events applied around one turn.
///
/// Structures, damage and health changes land before the turn is planned;
/// breaches are delivered as an action frame after it is committed.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ScriptedTurn {
    pub(crate) turn: u32,
    pub(crate) structures: Vec<StructureSetup>,
    pub(crate) damage: Vec<Damage>,
    pub(crate) opponent_health: Option<f32>,
    pub(crate) breaches: Vec<CellCoord>,
}

impl Scenario {
    /// Parses a scenario document.
    pub(crate) fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("scenario is not valid")
    }
}

/// Plays `turns` turns of `scenario`, handing every report to `on_report`.
pub(crate) fn simulate<F>(
    scenario: &Scenario,
    catalog: UnitCatalog,
    strategy: &StrategyConfig,
    turns: u32,
    mut on_report: F,
) -> Result<()>
where
    F: FnMut(&TurnReport) -> Result<()>,
{
    let rules = Rules {
        structure_reserve: scenario.structure_reserve,
    };
    let mut world = World::new(
        catalog.clone(),
        rules,
        scenario.own.status(),
        scenario.opponent.status(),
    );
    for structure in &scenario.structures {
        stage(&mut world, &catalog, structure)?;
    }
    let mut director = TurnDirector::new(catalog.clone(), strategy);

    for turn in 0..turns {
        if turn > 0 {
            world.begin_turn(ResourcePools::new(
                scenario.income.structure,
                scenario.income.mobile,
            ));
        }

        let scripted: Vec<&ScriptedTurn> = scenario
            .script
            .iter()
            .filter(|entry| entry.turn == turn)
            .collect();
        for entry in &scripted {
            for structure in &entry.structures {
                stage(&mut world, &catalog, structure)?;
            }
            for hit in &entry.damage {
                let hit_unit = world.damage(hit.cell, hit.amount);
                debug!(turn, cell = ?hit.cell, amount = hit.amount, hit_unit, "scripted damage");
            }
            if let Some(health) = entry.opponent_health {
                world.set_health(Owner::Opponent, health);
            }
        }

        let report = director.on_turn(&mut world);
        on_report(&report)?;

        let breaches: Vec<BreachEvent> = scripted
            .iter()
            .flat_map(|entry| entry.breaches.iter())
            .map(|&cell| BreachEvent {
                cell,
                owner: Owner::Opponent,
                turn,
                frame: 0,
            })
            .collect();
        if !breaches.is_empty() {
            let frame = ActionFrame {
                turn,
                frame: 0,
                breaches,
            };
            let _ = director
                .on_action_frame_str(&frame.encode())
                .with_context(|| format!("scripted breaches of turn {turn} did not decode"))?;
        }
    }

    Ok(())
}

fn stage(world: &mut World, catalog: &UnitCatalog, setup: &StructureSetup) -> Result<()> {
    let stats = catalog.stats(setup.kind, setup.upgraded);
    let mut unit = UnitSnapshot::fresh(setup.kind, setup.owner, stats.health);
    unit.upgraded = setup.upgraded;
    world
        .place_unit(setup.cell, unit)
        .with_context(|| format!("cannot stage {:?} at {:?}", setup.kind, setup.cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scenario_uses_defaults() {
        let scenario = Scenario::from_toml("").expect("empty scenario parses");
        assert_eq!(scenario.turns, 10);
        assert!((scenario.own.structure - 40.0).abs() < f32::EPSILON);
        assert!(scenario.script.is_empty());
    }

    #[test]
    fn staged_structures_default_to_the_opponent() {
        let scenario = Scenario::from_toml(
            r#"
            [[structures]]
            kind = "turret"
            cell = [13, 20]
            "#,
        )
        .expect("scenario parses");
        assert_eq!(scenario.structures[0].owner, Owner::Opponent);
        assert!(!scenario.structures[0].upgraded);
    }

    #[test]
    fn breaches_reach_the_director_after_the_turn() {
        let scenario = Scenario::from_toml(
            r#"
            turns = 2

            [[script]]
            turn = 0
            breaches = [[0, 13]]
            "#,
        )
        .expect("scenario parses");
        let mut reports = Vec::new();

        simulate(
            &scenario,
            UnitCatalog::standard(),
            &StrategyConfig::default(),
            scenario.turns,
            |report| {
                reports.push(report.clone());
                Ok(())
            },
        )
        .expect("simulation runs");

        assert_eq!(reports.len(), 2);
        assert!(reports[0].open_lanes.is_empty());
        assert_eq!(reports[1].turn, 1);
    }

    #[test]
    fn staging_on_an_occupied_cell_fails() {
        let scenario = Scenario::from_toml(
            r#"
            [[structures]]
            kind = "wall"
            cell = [13, 20]

            [[structures]]
            kind = "turret"
            cell = [13, 20]
            "#,
        )
        .expect("scenario parses");

        let result = simulate(
            &scenario,
            UnitCatalog::standard(),
            &StrategyConfig::default(),
            1,
            |_| Ok(()),
        );

        assert!(result.is_err());
    }
}
