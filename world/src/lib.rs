#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory reference match engine for the lane defence turn engine.
//!
//! The world owns the arena snapshot for both players, enforces placement
//! legality and resource spend, and answers the path and attacker queries the
//! decision systems rely on. It stands in for the external match engine in
//! tests and offline simulations.

mod navigation;

use lane_defence_core::{
    arena::{self, Edge, ARENA_SIZE, HALF_ARENA},
    CellCoord, Directive, Event, GridSnapshot, MatchEngine, Owner, PlacementError, PlayerStatus,
    ResourcePools, SpawnCount, UnitCatalog, UnitKind, UnitSnapshot,
};
use tracing::debug;

use crate::navigation::NavigationField;

/// Upper bound on units launched by a single [`SpawnCount::AsManyAsAffordable`] request.
const SPAWN_LIMIT: u32 = 1000;

/// Tunable engine rules that are not part of the unit catalog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rules {
    /// Structure points that reserve-aware placements must leave untouched.
    pub structure_reserve: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            structure_reserve: 1.0,
        }
    }
}

/// Represents the authoritative arena state for one match.
#[derive(Debug)]
pub struct World {
    catalog: UnitCatalog,
    rules: Rules,
    grid: GridSnapshot,
    committed: bool,
    events: Vec<Event>,
}

impl World {
    /// Creates an empty arena at turn zero.
    #[must_use]
    pub fn new(catalog: UnitCatalog, rules: Rules, own: PlayerStatus, opponent: PlayerStatus) -> Self {
        Self {
            catalog,
            rules,
            grid: GridSnapshot::empty(0, own, opponent),
            committed: false,
            events: Vec::new(),
        }
    }

    /// Catalog the world prices and sizes units with.
    #[must_use]
    pub const fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    /// Rules currently enforced.
    #[must_use]
    pub const fn rules(&self) -> Rules {
        self.rules
    }

    /// Opens the next turn: advances the turn counter after a submission,
    /// clears mobile units that travelled last turn and credits `income`.
    pub fn begin_turn(&mut self, income: ResourcePools) {
        if self.committed {
            let next = self.grid.turn().saturating_add(1);
            self.grid.set_turn(next);
        }
        self.committed = false;

        for cell in arena::cells() {
            if let Some(slot) = self.grid.cell_mut(cell) {
                slot.mobile_mut().clear();
            }
        }

        self.grid.player_mut(Owner::Own).resources.credit(income);
    }

    /// Places a unit without charging for it, for scenario setup.
    ///
    /// Ownership of the half is not enforced, so opponent structures can be
    /// staged. Stationary units need a free cell; mobile units stack.
    pub fn place_unit(&mut self, cell: CellCoord, unit: UnitSnapshot) -> Result<(), PlacementError> {
        let slot = self
            .grid
            .cell_mut(cell)
            .ok_or(PlacementError::OutOfBounds)?;

        if unit.kind.is_mobile() {
            slot.mobile_mut().push(unit);
            return Ok(());
        }

        if slot.is_blocked() {
            return Err(PlacementError::Occupied);
        }
        *slot.stationary_mut() = Some(unit);
        Ok(())
    }

    /// Deals `amount` damage to the stationary unit on `cell`.
    ///
    /// Units reduced to zero health are removed. Returns `true` when a unit
    /// was hit.
    pub fn damage(&mut self, cell: CellCoord, amount: f32) -> bool {
        let Some(slot) = self.grid.cell_mut(cell) else {
            return false;
        };
        let stationary = slot.stationary_mut();
        let Some(unit) = stationary.as_mut() else {
            return false;
        };

        unit.health -= amount;
        if unit.health <= 0.0 {
            *stationary = None;
        }
        true
    }

    /// Overrides a player's health.
    pub fn set_health(&mut self, owner: Owner, health: f32) {
        self.grid.player_mut(owner).health = health;
    }

    /// Overrides a player's resource pools.
    pub fn set_resources(&mut self, owner: Owner, resources: ResourcePools) {
        self.grid.player_mut(owner).resources = resources;
    }

    /// Reports whether the current turn was already submitted.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Removes and returns the events recorded by [`MatchEngine::issue`] and
    /// [`MatchEngine::submit`] since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

/// Applies the provided directive to the world and returns how many units it affected.
///
/// Each cell of a directive is judged on its own; rejections are reported
/// as events and do not stop later cells.
pub fn apply(world: &mut World, directive: &Directive, out_events: &mut Vec<Event>) -> u32 {
    match directive {
        Directive::Place {
            kind,
            cells,
            reserve,
        } => {
            let mut placed = 0;
            for &cell in cells {
                match world.try_place(*kind, cell, *reserve) {
                    Ok(()) => {
                        placed += 1;
                        out_events.push(Event::UnitPlaced { kind: *kind, cell });
                    }
                    Err(reason) => {
                        debug!(?kind, ?cell, %reason, "placement rejected");
                        out_events.push(Event::PlacementRejected {
                            kind: *kind,
                            cell,
                            reason,
                        });
                    }
                }
            }
            placed
        }
        Directive::Upgrade { cells } => {
            let mut upgraded = 0;
            for &cell in cells {
                match world.try_upgrade(cell) {
                    Ok(kind) => {
                        upgraded += 1;
                        out_events.push(Event::UnitUpgraded { kind, cell });
                    }
                    Err(reason) => {
                        debug!(?cell, %reason, "upgrade rejected");
                        out_events.push(Event::UpgradeRejected { cell, reason });
                    }
                }
            }
            upgraded
        }
        Directive::Spawn { kind, cell, count } => match world.try_spawn(*kind, *cell, *count) {
            Ok(spawned) => {
                out_events.push(Event::UnitsSpawned {
                    kind: *kind,
                    cell: *cell,
                    count: spawned,
                });
                spawned
            }
            Err(reason) => {
                debug!(?kind, ?cell, %reason, "spawn rejected");
                out_events.push(Event::SpawnRejected {
                    kind: *kind,
                    cell: *cell,
                    reason,
                });
                0
            }
        },
    }
}

impl World {
    fn try_place(&mut self, kind: UnitKind, cell: CellCoord, reserve: bool) -> Result<(), PlacementError> {
        if self.committed {
            return Err(PlacementError::TurnCommitted);
        }
        if !kind.is_stationary() {
            return Err(PlacementError::WrongCategory);
        }
        if !arena::contains(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if cell.y() >= HALF_ARENA {
            return Err(PlacementError::OpponentTerritory);
        }
        if self.grid.stationary_at(cell).is_some() {
            return Err(PlacementError::Occupied);
        }

        let cost = self.catalog.profile(kind).cost();
        let resources = self.grid.player(Owner::Own).resources;
        if !resources.can_afford(cost) {
            return Err(PlacementError::InsufficientResources);
        }
        if reserve && resources.structure - cost.structure < self.rules.structure_reserve {
            return Err(PlacementError::ReserveHeld);
        }

        let health = self.catalog.stats(kind, false).health;
        self.grid.player_mut(Owner::Own).resources.spend(cost);
        if let Some(slot) = self.grid.cell_mut(cell) {
            *slot.stationary_mut() = Some(UnitSnapshot::fresh(kind, Owner::Own, health));
        }
        Ok(())
    }

    fn try_upgrade(&mut self, cell: CellCoord) -> Result<UnitKind, PlacementError> {
        if self.committed {
            return Err(PlacementError::TurnCommitted);
        }
        let unit = self
            .grid
            .stationary_at(cell)
            .filter(|unit| unit.owner == Owner::Own)
            .copied()
            .ok_or(PlacementError::NothingToUpgrade)?;
        if unit.upgraded {
            return Err(PlacementError::AlreadyUpgraded);
        }

        let cost = self.catalog.profile(unit.kind).upgrade_cost();
        if !self.grid.player(Owner::Own).resources.can_afford(cost) {
            return Err(PlacementError::InsufficientResources);
        }

        let upgraded_health = self.catalog.stats(unit.kind, true).health;
        self.grid.player_mut(Owner::Own).resources.spend(cost);
        if let Some(stationary) = self
            .grid
            .cell_mut(cell)
            .and_then(|slot| slot.stationary_mut().as_mut())
        {
            stationary.upgraded = true;
            stationary.health += upgraded_health - stationary.max_health;
            stationary.max_health = upgraded_health;
        }
        Ok(unit.kind)
    }

    fn try_spawn(&mut self, kind: UnitKind, cell: CellCoord, count: SpawnCount) -> Result<u32, PlacementError> {
        if self.committed {
            return Err(PlacementError::TurnCommitted);
        }
        if !kind.is_mobile() {
            return Err(PlacementError::WrongCategory);
        }
        if !arena::contains(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if !Edge::OWN.into_iter().any(|edge| edge.contains(cell)) {
            return Err(PlacementError::NotAnEdge);
        }
        if self.grid.stationary_at(cell).is_some() {
            return Err(PlacementError::Occupied);
        }

        let cost = self.catalog.profile(kind).cost();
        let mobile = self.grid.player(Owner::Own).resources.mobile;
        let affordable = if cost.mobile > 0.0 {
            let whole = (mobile / cost.mobile).floor();
            if whole >= SPAWN_LIMIT as f32 {
                SPAWN_LIMIT
            } else if whole > 0.0 {
                whole as u32
            } else {
                0
            }
        } else {
            SPAWN_LIMIT
        };
        let requested = match count {
            SpawnCount::Exactly(requested) => requested,
            SpawnCount::AsManyAsAffordable => SPAWN_LIMIT,
        };
        let spawned = requested.min(affordable);
        if spawned == 0 {
            return Err(PlacementError::InsufficientResources);
        }

        let health = self.catalog.stats(kind, false).health;
        let resources = &mut self.grid.player_mut(Owner::Own).resources;
        for _ in 0..spawned {
            resources.spend(cost);
        }
        if let Some(slot) = self.grid.cell_mut(cell) {
            slot.mobile_mut()
                .extend((0..spawned).map(|_| UnitSnapshot::fresh(kind, Owner::Own, health)));
        }
        Ok(spawned)
    }
}

impl MatchEngine for World {
    fn grid(&self) -> &GridSnapshot {
        &self.grid
    }

    fn path_to_edge(&self, start: CellCoord) -> Vec<CellCoord> {
        query::path_to_edge(self, start)
    }

    fn attackers(&self, cell: CellCoord, defender: Owner) -> Vec<UnitSnapshot> {
        query::attackers(self, cell, defender)
    }

    fn issue(&mut self, directive: &Directive) -> u32 {
        let mut events = Vec::new();
        let affected = apply(self, directive, &mut events);
        self.events.append(&mut events);
        affected
    }

    fn submit(&mut self) {
        if self.committed {
            return;
        }
        self.committed = true;
        self.events.push(Event::TurnSubmitted {
            turn: self.grid.turn(),
        });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use lane_defence_core::{arena, CellCoord, GridSnapshot, Owner, UnitSnapshot};

    use super::{NavigationField, World, ARENA_SIZE};

    /// Current arena snapshot.
    #[must_use]
    pub fn grid(world: &World) -> &GridSnapshot {
        &world.grid
    }

    /// Shortest 4-connected path from `start` to the edge diagonally opposite it.
    ///
    /// The path starts at `start` and ends on the target edge. Stationary
    /// units of either player block movement. Empty when `start` is outside
    /// the arena, blocked, or sealed off from every target edge cell.
    #[must_use]
    pub fn path_to_edge(world: &World, start: CellCoord) -> Vec<CellCoord> {
        if !arena::contains(start) || world.grid.stationary_at(start).is_some() {
            return Vec::new();
        }

        let blocked =
            |cell: CellCoord| !arena::contains(cell) || world.grid.stationary_at(cell).is_some();
        let mut field = NavigationField::default();
        field.rebuild_with(
            ARENA_SIZE,
            ARENA_SIZE,
            arena::target_edge(start).cells(),
            blocked,
        );
        field.descend(start)
    }

    /// Stationary units of `defender`'s rival able to damage a unit at `cell`.
    #[must_use]
    pub fn attackers(world: &World, cell: CellCoord, defender: Owner) -> Vec<UnitSnapshot> {
        let rival = defender.rival();
        world
            .grid
            .stationary_units()
            .filter(|(_, unit)| unit.owner == rival)
            .filter(|(origin, unit)| {
                let stats = world.catalog.stats(unit.kind, unit.upgraded);
                stats.damage > 0 && arena::distance(*origin, cell) <= stats.range
            })
            .map(|(_, unit)| *unit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(structure: f32, mobile: f32) -> World {
        World::new(
            UnitCatalog::standard(),
            Rules::default(),
            PlayerStatus {
                health: 30.0,
                resources: ResourcePools::new(structure, mobile),
            },
            PlayerStatus {
                health: 30.0,
                resources: ResourcePools::default(),
            },
        )
    }

    fn place(kind: UnitKind, cells: &[CellCoord], reserve: bool) -> Directive {
        Directive::Place {
            kind,
            cells: cells.to_vec(),
            reserve,
        }
    }

    #[test]
    fn placement_spends_structure_points() {
        let mut world = world_with(5.0, 0.0);
        let mut events = Vec::new();

        let placed = apply(
            &mut world,
            &place(UnitKind::Turret, &[CellCoord::new(3, 12), CellCoord::new(24, 12)], false),
            &mut events,
        );

        assert_eq!(placed, 2);
        assert!((query::grid(&world).player(Owner::Own).resources.structure - 1.0).abs() < f32::EPSILON);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn placement_rejections_carry_reasons() {
        let mut world = world_with(3.0, 0.0);
        let mut events = Vec::new();

        let placed = apply(
            &mut world,
            &place(
                UnitKind::Wall,
                &[
                    CellCoord::new(0, 0),
                    CellCoord::new(13, 20),
                    CellCoord::new(13, 5),
                    CellCoord::new(13, 5),
                ],
                false,
            ),
            &mut events,
        );

        assert_eq!(placed, 1);
        let reasons: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                Event::PlacementRejected { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect();
        assert_eq!(
            reasons,
            vec![
                PlacementError::OutOfBounds,
                PlacementError::OpponentTerritory,
                PlacementError::Occupied,
            ]
        );
    }

    #[test]
    fn reserve_keeps_structure_floor() {
        let mut world = world_with(2.0, 0.0);
        let mut events = Vec::new();

        let cells = [CellCoord::new(13, 5), CellCoord::new(14, 5)];
        assert_eq!(apply(&mut world, &place(UnitKind::Wall, &cells, true), &mut events), 1);
        assert!(matches!(
            events.last(),
            Some(Event::PlacementRejected {
                reason: PlacementError::ReserveHeld,
                ..
            })
        ));
    }

    #[test]
    fn upgrade_requires_unupgraded_friendly_structure() {
        let mut world = world_with(10.0, 0.0);
        let mut events = Vec::new();
        let cell = CellCoord::new(9, 10);

        assert_eq!(apply(&mut world, &place(UnitKind::Turret, &[cell], false), &mut events), 1);
        let upgrade = Directive::Upgrade {
            cells: vec![cell, cell, CellCoord::new(18, 10)],
        };
        assert_eq!(apply(&mut world, &upgrade, &mut events), 1);
        assert!(query::grid(&world).is_upgraded(cell, Owner::Own));
        assert!(events.contains(&Event::UpgradeRejected {
            cell,
            reason: PlacementError::AlreadyUpgraded,
        }));
        assert!(events.contains(&Event::UpgradeRejected {
            cell: CellCoord::new(18, 10),
            reason: PlacementError::NothingToUpgrade,
        }));
    }

    #[test]
    fn spawns_are_bounded_by_mobile_points() {
        let mut world = world_with(0.0, 7.5);
        let mut events = Vec::new();

        let spawned = apply(
            &mut world,
            &Directive::Spawn {
                kind: UnitKind::Scout,
                cell: CellCoord::new(13, 0),
                count: SpawnCount::Exactly(3),
            },
            &mut events,
        );
        assert_eq!(spawned, 3);

        let rest = apply(
            &mut world,
            &Directive::Spawn {
                kind: UnitKind::Scout,
                cell: CellCoord::new(14, 0),
                count: SpawnCount::AsManyAsAffordable,
            },
            &mut events,
        );
        assert_eq!(rest, 4);
        assert_eq!(
            query::grid(&world)
                .cell(CellCoord::new(14, 0))
                .map(|cell| cell.mobile().len()),
            Some(4)
        );
    }

    #[test]
    fn spawns_off_the_edge_are_rejected() {
        let mut world = world_with(0.0, 10.0);
        let mut events = Vec::new();

        let spawned = apply(
            &mut world,
            &Directive::Spawn {
                kind: UnitKind::Scout,
                cell: CellCoord::new(13, 1),
                count: SpawnCount::Exactly(3),
            },
            &mut events,
        );

        assert_eq!(spawned, 0);
        assert_eq!(
            events,
            vec![Event::SpawnRejected {
                kind: UnitKind::Scout,
                cell: CellCoord::new(13, 1),
                reason: PlacementError::NotAnEdge,
            }]
        );
    }

    #[test]
    fn submitted_turns_reject_directives_until_next_turn() {
        let mut world = world_with(10.0, 0.0);
        world.submit();

        let cell = CellCoord::new(13, 5);
        assert_eq!(world.issue(&place(UnitKind::Wall, &[cell], false)), 0);
        assert_eq!(
            world.drain_events(),
            vec![
                Event::TurnSubmitted { turn: 0 },
                Event::PlacementRejected {
                    kind: UnitKind::Wall,
                    cell,
                    reason: PlacementError::TurnCommitted,
                },
            ]
        );

        world.begin_turn(ResourcePools::new(1.0, 1.0));
        assert_eq!(world.grid().turn(), 1);
        assert_eq!(world.issue(&place(UnitKind::Wall, &[cell], false)), 1);
    }

    #[test]
    fn damage_removes_destroyed_structures() {
        let mut world = world_with(0.0, 0.0);
        let cell = CellCoord::new(5, 13);
        world
            .place_unit(cell, UnitSnapshot::fresh(UnitKind::Wall, Owner::Own, 60.0))
            .expect("cell is free");

        assert!(world.damage(cell, 20.0));
        assert!(world.grid().stationary_at(cell).is_some_and(UnitSnapshot::is_damaged));
        assert!(world.damage(cell, 40.0));
        assert!(world.grid().stationary_at(cell).is_none());
        assert!(!world.damage(cell, 1.0));
    }

    #[test]
    fn attackers_are_rival_units_in_range() {
        let mut world = world_with(0.0, 0.0);
        let turret = UnitSnapshot::fresh(UnitKind::Turret, Owner::Opponent, 75.0);
        let wall = UnitSnapshot::fresh(UnitKind::Wall, Owner::Opponent, 60.0);
        world.place_unit(CellCoord::new(13, 16), turret).expect("free");
        world.place_unit(CellCoord::new(14, 16), wall).expect("free");

        assert_eq!(
            query::attackers(&world, CellCoord::new(13, 14), Owner::Own),
            vec![turret]
        );
        assert!(query::attackers(&world, CellCoord::new(13, 10), Owner::Own).is_empty());
        assert!(query::attackers(&world, CellCoord::new(13, 14), Owner::Opponent).is_empty());
    }

    #[test]
    fn path_reaches_opposite_edge() {
        let world = world_with(0.0, 0.0);
        let start = CellCoord::new(13, 0);

        let path = world.path_to_edge(start);

        assert_eq!(path.first(), Some(&start));
        let end = path.last().copied().expect("path is not empty");
        assert!(Edge::TopRight.contains(end));
        assert!(path.iter().all(|cell| arena::contains(*cell)));
    }

    #[test]
    fn sealed_start_has_no_path() {
        let mut world = world_with(0.0, 0.0);
        for cell in [CellCoord::new(13, 1), CellCoord::new(14, 0)] {
            world
                .place_unit(cell, UnitSnapshot::fresh(UnitKind::Wall, Owner::Own, 60.0))
                .expect("free");
        }

        assert!(world.path_to_edge(CellCoord::new(13, 0)).is_empty());
    }
}
