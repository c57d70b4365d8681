#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Attack timing and lane selection.
//!
//! The scheduler alternates between two launch lanes depending on whether the
//! previous launch damaged the opponent, and holds its mobile points back
//! behind a gate that ramps with the turn number. An optional raid window
//! overrides the lane choice during the first turns with the least risky
//! launch cell.

use lane_defence_core::{CellCoord, Directive, GridSnapshot, Owner, Side, SpawnCount, UnitKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Early launches from the least risky cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaidConfig {
    /// Raids happen strictly before this turn.
    pub until_turn: u32,
    /// Mobile points that must be exceeded before raiding.
    pub min_mp: f32,
    /// Launch cells considered, in preference order for ties.
    pub candidates: Vec<CellCoord>,
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self {
            until_turn: 5,
            min_mp: 8.0,
            candidates: [
                (13, 0),
                (14, 0),
                (7, 6),
                (20, 6),
                (9, 4),
                (18, 4),
                (5, 8),
                (22, 8),
            ]
            .into_iter()
            .map(|(x, y)| CellCoord::new(x, y))
            .collect(),
        }
    }
}

/// Tunables of the attack scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Mobile kind launched.
    pub spawn_kind: UnitKind,
    /// Primary launch cell of the left lane.
    pub left_spawn: CellCoord,
    /// Primary launch cell of the right lane.
    pub right_spawn: CellCoord,
    /// Lane used before the first decision.
    pub initial_side: Side,
    /// Turns before which the gate is always open.
    pub early_turns: u32,
    /// Subtracted from the turn to get the mobile points the gate asks for.
    pub gate_offset: u32,
    /// Upper bound on the mobile points the gate asks for.
    pub gate_cap: u32,
    /// Harassing waves use `mobile points / harass_divisor` units.
    pub harass_divisor: u32,
    /// Offset of the harassing wave from the primary launch cell.
    pub harass_offset: [i32; 2],
    /// Opponent health assumed before the first turn.
    pub starting_health: f32,
    /// Optional early raid window.
    pub raid: Option<RaidConfig>,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            spawn_kind: UnitKind::Scout,
            left_spawn: CellCoord::new(13, 0),
            right_spawn: CellCoord::new(14, 0),
            initial_side: Side::Right,
            early_turns: 15,
            gate_offset: 10,
            gate_cap: 20,
            harass_divisor: 3,
            harass_offset: [0, 1],
            starting_health: 30.0,
            raid: None,
        }
    }
}

/// State carried between turns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackState {
    /// Lane used by the latest launch.
    pub side: Side,
    /// Opponent health recorded after the latest launch attempt.
    pub last_opponent_health: f32,
}

/// How the turn's launch was decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMode {
    /// The gate held the mobile points back.
    Held,
    /// The lane oscillator picked the launch cell.
    Lane,
    /// The raid window picked the least risky launch cell.
    Raid,
}

/// Launch decision for one turn.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackPlan {
    /// How the launch was decided.
    pub mode: AttackMode,
    /// Whether the opponent lost health since the previous attempt.
    pub scored: bool,
    /// Lane after the decision.
    pub side: Side,
    /// Spawn directives in issue order.
    pub directives: Vec<Directive>,
}

/// Lane-oscillating attack scheduler.
#[derive(Clone, Debug)]
pub struct AttackScheduler {
    config: AttackConfig,
    state: AttackState,
}

impl Default for AttackScheduler {
    fn default() -> Self {
        Self::new(AttackConfig::default())
    }
}

impl AttackScheduler {
    /// Creates a scheduler in its initial state.
    #[must_use]
    pub fn new(config: AttackConfig) -> Self {
        let state = AttackState {
            side: config.initial_side,
            last_opponent_health: config.starting_health,
        };
        Self { config, state }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &AttackConfig {
        &self.config
    }

    /// State carried into the next turn.
    #[must_use]
    pub const fn state(&self) -> AttackState {
        self.state
    }

    /// Reports whether the gate lets the scheduler launch this turn.
    #[must_use]
    pub fn gate_open(&self, turn: u32, mobile: f32) -> bool {
        if turn < self.config.early_turns {
            return true;
        }
        let required = turn
            .saturating_sub(self.config.gate_offset)
            .min(self.config.gate_cap);
        mobile >= required as f32
    }

    /// Raid candidates if the raid window is open for this snapshot.
    #[must_use]
    pub fn raid_candidates(&self, grid: &GridSnapshot) -> Option<&[CellCoord]> {
        let raid = self.config.raid.as_ref()?;
        let mobile = grid.player(Owner::Own).resources.mobile;
        let open = grid.turn() < raid.until_turn
            && mobile > raid.min_mp
            && !raid.candidates.is_empty();
        open.then_some(raid.candidates.as_slice())
    }

    /// Decides the turn's launch and records the health baseline.
    ///
    /// `raid_choice` is the least risky raid candidate, if the caller scored
    /// them; it is only consulted while the raid window is open, falling back
    /// to the first candidate.
    pub fn plan(&mut self, grid: &GridSnapshot, raid_choice: Option<CellCoord>) -> AttackPlan {
        let turn = grid.turn();
        let mobile = grid.player(Owner::Own).resources.mobile;
        let opponent_health = grid.player(Owner::Opponent).health;
        let scored = turn == 0 || self.state.last_opponent_health != opponent_health;

        if !self.gate_open(turn, mobile) {
            debug!(turn, mobile, "attack gate closed");
            return AttackPlan {
                mode: AttackMode::Held,
                scored,
                side: self.state.side,
                directives: Vec::new(),
            };
        }

        let raid_cell = self
            .raid_candidates(grid)
            .and_then(|candidates| raid_choice.or_else(|| candidates.first().copied()));
        if let Some(cell) = raid_cell {
            self.state.last_opponent_health = opponent_health;
            debug!(turn, ?cell, "raiding from least risky cell");
            return AttackPlan {
                mode: AttackMode::Raid,
                scored,
                side: self.state.side,
                directives: vec![self.full_stack(cell)],
            };
        }

        let side = match (self.state.side, scored) {
            (Side::Right, true) | (Side::Left, false) => Side::Right,
            _ => Side::Left,
        };
        self.state.side = side;
        let primary = match side {
            Side::Left => self.config.left_spawn,
            Side::Right => self.config.right_spawn,
        };

        let mut directives = Vec::with_capacity(2);
        if !scored {
            let [dx, dy] = self.config.harass_offset;
            let count = harass_count(mobile, self.config.harass_divisor);
            if let Some(cell) = primary.offset(dx, dy).filter(|_| count > 0) {
                directives.push(Directive::Spawn {
                    kind: self.config.spawn_kind,
                    cell,
                    count: SpawnCount::Exactly(count),
                });
            }
        }
        directives.push(self.full_stack(primary));

        self.state.last_opponent_health = opponent_health;
        debug!(turn, ?side, scored, "lane launch planned");

        AttackPlan {
            mode: AttackMode::Lane,
            scored,
            side,
            directives,
        }
    }

    fn full_stack(&self, cell: CellCoord) -> Directive {
        Directive::Spawn {
            kind: self.config.spawn_kind,
            cell,
            count: SpawnCount::AsManyAsAffordable,
        }
    }
}

fn harass_count(mobile: f32, divisor: u32) -> u32 {
    if divisor == 0 || !mobile.is_finite() || mobile <= 0.0 {
        return 0;
    }
    let whole = (mobile / divisor as f32).floor();
    if whole >= u32::MAX as f32 {
        u32::MAX
    } else {
        whole as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harass_count_truncates() {
        assert_eq!(harass_count(15.0, 3), 5);
        assert_eq!(harass_count(8.9, 3), 2);
        assert_eq!(harass_count(2.0, 3), 0);
        assert_eq!(harass_count(9.0, 0), 0);
    }

    #[test]
    fn gate_ramps_then_caps() {
        let scheduler = AttackScheduler::default();
        assert!(scheduler.gate_open(14, 0.0));
        assert!(!scheduler.gate_open(15, 4.9));
        assert!(scheduler.gate_open(15, 5.0));
        assert!(!scheduler.gate_open(40, 19.0));
        assert!(scheduler.gate_open(40, 20.0));
    }
}
