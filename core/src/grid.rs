//! Read-only per-turn snapshot of the arena published by the match engine.

use thiserror::Error;

use crate::{
    arena::{self, CELL_SLOTS},
    CellCoord, Owner, ResourcePools, UnitKind,
};

/// Immutable representation of a single unit used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Kind of the unit.
    pub kind: UnitKind,
    /// Player that owns the unit.
    pub owner: Owner,
    /// Current health.
    pub health: f32,
    /// Health the unit started with.
    pub max_health: f32,
    /// Indicates whether the unit has been upgraded.
    pub upgraded: bool,
}

impl UnitSnapshot {
    /// Creates a full-health, unupgraded unit.
    #[must_use]
    pub const fn fresh(kind: UnitKind, owner: Owner, max_health: f32) -> Self {
        Self {
            kind,
            owner,
            health: max_health,
            max_health,
            upgraded: false,
        }
    }

    /// Reports whether the unit has lost health without being destroyed.
    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.health > 0.0 && self.health < self.max_health
    }
}

/// Occupancy of a single arena cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    stationary: Option<UnitSnapshot>,
    mobile: Vec<UnitSnapshot>,
}

impl Cell {
    /// Stationary unit occupying the cell, if any.
    #[must_use]
    pub fn stationary(&self) -> Option<&UnitSnapshot> {
        self.stationary.as_ref()
    }

    /// Mobile units currently standing on the cell, in arrival order.
    #[must_use]
    pub fn mobile(&self) -> &[UnitSnapshot] {
        &self.mobile
    }

    /// Reports whether a stationary unit blocks the cell.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.stationary.is_some()
    }

    /// Mutable access to the stationary slot, used by engines when applying directives.
    pub fn stationary_mut(&mut self) -> &mut Option<UnitSnapshot> {
        &mut self.stationary
    }

    /// Mutable access to the mobile occupants, used by engines when applying directives.
    pub fn mobile_mut(&mut self) -> &mut Vec<UnitSnapshot> {
        &mut self.mobile
    }
}

/// Health and resources of one player.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerStatus {
    /// Remaining health points.
    pub health: f32,
    /// Current resource levels.
    pub resources: ResourcePools,
}

/// Reasons a snapshot is unusable for planning.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SnapshotError {
    /// The cell table does not cover the arena.
    #[error("snapshot holds {found} cell slots, expected {expected}")]
    CellCount {
        /// Number of slots supplied.
        found: usize,
        /// Number of slots the arena requires.
        expected: usize,
    },
    /// A player's health is NaN or infinite.
    #[error("{0:?} health is not a finite number")]
    NonFiniteHealth(Owner),
    /// A player's resource pools hold NaN or infinite values.
    #[error("{0:?} resources are not finite numbers")]
    NonFiniteResources(Owner),
}

/// Read-only view of the arena for one turn.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSnapshot {
    turn: u32,
    cells: Vec<Cell>,
    own: PlayerStatus,
    opponent: PlayerStatus,
}

impl GridSnapshot {
    /// Creates an empty arena for the provided turn.
    #[must_use]
    pub fn empty(turn: u32, own: PlayerStatus, opponent: PlayerStatus) -> Self {
        Self {
            turn,
            cells: vec![Cell::default(); CELL_SLOTS],
            own,
            opponent,
        }
    }

    /// Assembles a snapshot from raw parts without validation.
    ///
    /// Engines that decode snapshots from an external source use this and
    /// leave [`Self::validate`] to the consumer.
    #[must_use]
    pub fn from_parts(
        turn: u32,
        cells: Vec<Cell>,
        own: PlayerStatus,
        opponent: PlayerStatus,
    ) -> Self {
        Self {
            turn,
            cells,
            own,
            opponent,
        }
    }

    /// Checks that the snapshot can be planned against.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.cells.len() != CELL_SLOTS {
            return Err(SnapshotError::CellCount {
                found: self.cells.len(),
                expected: CELL_SLOTS,
            });
        }
        for owner in [Owner::Own, Owner::Opponent] {
            let status = self.player(owner);
            if !status.health.is_finite() {
                return Err(SnapshotError::NonFiniteHealth(owner));
            }
            if !status.resources.is_finite() {
                return Err(SnapshotError::NonFiniteResources(owner));
            }
        }
        Ok(())
    }

    /// Turn number, starting at zero.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Advances the snapshot to a new turn number.
    pub fn set_turn(&mut self, turn: u32) {
        self.turn = turn;
    }

    /// Cell at the provided coordinate. `None` outside the arena.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        arena::index(coord).and_then(|slot| self.cells.get(slot))
    }

    /// Mutable cell at the provided coordinate. `None` outside the arena.
    pub fn cell_mut(&mut self, coord: CellCoord) -> Option<&mut Cell> {
        arena::index(coord).and_then(|slot| self.cells.get_mut(slot))
    }

    /// Stationary unit at the provided coordinate, if any.
    #[must_use]
    pub fn stationary_at(&self, coord: CellCoord) -> Option<&UnitSnapshot> {
        self.cell(coord).and_then(Cell::stationary)
    }

    /// Reports whether the cell holds an upgraded stationary unit owned by `owner`.
    #[must_use]
    pub fn is_upgraded(&self, coord: CellCoord, owner: Owner) -> bool {
        self.stationary_at(coord)
            .is_some_and(|unit| unit.owner == owner && unit.upgraded)
    }

    /// Status of the requested player.
    #[must_use]
    pub const fn player(&self, owner: Owner) -> &PlayerStatus {
        match owner {
            Owner::Own => &self.own,
            Owner::Opponent => &self.opponent,
        }
    }

    /// Mutable status of the requested player.
    pub fn player_mut(&mut self, owner: Owner) -> &mut PlayerStatus {
        match owner {
            Owner::Own => &mut self.own,
            Owner::Opponent => &mut self.opponent,
        }
    }

    /// Every stationary unit in the arena in row-major order.
    pub fn stationary_units(&self) -> impl Iterator<Item = (CellCoord, &UnitSnapshot)> {
        self.cells.iter().enumerate().filter_map(|(slot, cell)| {
            let coord = arena::cell_at(slot)?;
            cell.stationary().map(|unit| (coord, unit))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> GridSnapshot {
        GridSnapshot::empty(
            3,
            PlayerStatus {
                health: 30.0,
                resources: ResourcePools::new(10.0, 5.0),
            },
            PlayerStatus {
                health: 30.0,
                resources: ResourcePools::default(),
            },
        )
    }

    #[test]
    fn queries_outside_arena_are_empty() {
        let grid = snapshot();
        assert!(grid.cell(CellCoord::new(0, 0)).is_none());
        assert!(grid.stationary_at(CellCoord::new(40, 3)).is_none());
        assert!(!grid.is_upgraded(CellCoord::new(0, 0), Owner::Own));
    }

    #[test]
    fn upgraded_query_checks_owner() {
        let mut grid = snapshot();
        let coord = CellCoord::new(3, 12);
        let mut turret = UnitSnapshot::fresh(UnitKind::Turret, Owner::Opponent, 75.0);
        turret.upgraded = true;
        if let Some(cell) = grid.cell_mut(coord) {
            *cell.stationary_mut() = Some(turret);
        }

        assert!(grid.is_upgraded(coord, Owner::Opponent));
        assert!(!grid.is_upgraded(coord, Owner::Own));
        assert_eq!(grid.stationary_units().count(), 1);
    }

    #[test]
    fn validate_flags_truncated_tables() {
        let grid = GridSnapshot::from_parts(
            0,
            vec![Cell::default(); 10],
            PlayerStatus::default(),
            PlayerStatus::default(),
        );
        assert_eq!(
            grid.validate(),
            Err(SnapshotError::CellCount {
                found: 10,
                expected: CELL_SLOTS,
            })
        );
    }

    #[test]
    fn validate_flags_non_finite_health() {
        let mut grid = snapshot();
        grid.player_mut(Owner::Opponent).health = f32::NAN;
        assert_eq!(
            grid.validate(),
            Err(SnapshotError::NonFiniteHealth(Owner::Opponent))
        );
    }

    #[test]
    fn destroyed_units_are_not_damaged() {
        let mut unit = UnitSnapshot::fresh(UnitKind::Wall, Owner::Own, 60.0);
        assert!(!unit.is_damaged());
        unit.health = 20.0;
        assert!(unit.is_damaged());
        unit.health = 0.0;
        assert!(!unit.is_damaged());
    }
}
