#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Resource-ordered build planning driven by a declarative tier table.
//!
//! Every turn the planner first drains the [`PendingUpgradeQueue`] while
//! structure points stay above the configured reserve, then walks the
//! [`TierTable`] in priority order. Within a tier turrets are placed first,
//! then walls, then supports, and finally the tier's upgrade set. Each request
//! is issued once; the planner re-queries the engine's snapshot instead of
//! assuming a request succeeded.

mod tiers;

use std::collections::VecDeque;

use lane_defence_core::{
    dispatch, CellCoord, Directive, Issued, MatchEngine, Owner, UnitKind,
};
use tracing::debug;

pub use tiers::{Opening, PlacementTier, TierGate, TierTable};

/// Structure points that must be available before a queued upgrade is attempted.
pub const DEFAULT_UPGRADE_RESERVE: f32 = 6.0;

/// FIFO record of placed turrets still waiting for their upgrade.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingUpgradeQueue {
    cells: VecDeque<CellCoord>,
}

impl PendingUpgradeQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a cell at the back of the queue.
    pub fn push(&mut self, cell: CellCoord) {
        self.cells.push_back(cell);
    }

    /// Removes the oldest cell.
    pub fn pop(&mut self) -> Option<CellCoord> {
        self.cells.pop_front()
    }

    /// Number of queued cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Queued cells from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &CellCoord> {
        self.cells.iter()
    }
}

impl Extend<CellCoord> for PendingUpgradeQueue {
    fn extend<I: IntoIterator<Item = CellCoord>>(&mut self, iter: I) {
        self.cells.extend(iter);
    }
}

/// Outcome of one planning pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Whether wall and support placements held structure points in reserve.
    pub save: bool,
    /// Queued upgrades popped this turn.
    pub drained: usize,
    /// Turrets added to the queue this turn.
    pub enqueued: usize,
    /// Set when the walk stopped at an unmet [`TierGate::Upgraded`] gate.
    pub gated_at: Option<u32>,
}

/// Build planner that owns the tier table and the pending upgrade queue.
#[derive(Clone, Debug)]
pub struct BuildPlanner {
    table: TierTable,
    queue: PendingUpgradeQueue,
    upgrade_reserve: f32,
}

impl BuildPlanner {
    /// Creates a planner for the provided table.
    #[must_use]
    pub fn new(table: TierTable, upgrade_reserve: f32) -> Self {
        Self {
            table,
            queue: PendingUpgradeQueue::new(),
            upgrade_reserve,
        }
    }

    /// Tier table consulted each turn.
    #[must_use]
    pub fn table(&self) -> &TierTable {
        &self.table
    }

    /// Turrets waiting for an upgrade.
    #[must_use]
    pub fn queue(&self) -> &PendingUpgradeQueue {
        &self.queue
    }

    /// Mutable access to the pending upgrades, for restoring saved state.
    pub fn queue_mut(&mut self) -> &mut PendingUpgradeQueue {
        &mut self.queue
    }

    /// Reports whether placements this turn should hold structure points back.
    #[must_use]
    pub fn save_flag(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Runs the drain and the tier walk (or the opening on turn zero).
    ///
    /// Every directive issued is appended to `out` in issue order.
    pub fn handle<E>(&mut self, engine: &mut E, out: &mut Vec<Issued>) -> BuildSummary
    where
        E: MatchEngine + ?Sized,
    {
        let mut summary = BuildSummary {
            save: self.save_flag(),
            ..BuildSummary::default()
        };

        summary.drained = self.drain_upgrades(engine, out);

        let turn = engine.grid().turn();
        if turn == 0 {
            if let Some(opening) = self.table.opening().cloned() {
                summary.enqueued = self.run_opening(&opening, engine, out);
                return summary;
            }
        }

        let tiers = self.table.tiers().to_vec();
        for tier in &tiers {
            if turn < tier.min_turn {
                continue;
            }

            summary.enqueued += self.run_tier(tier, summary.save, engine, out);

            if tier.gate == TierGate::Upgraded
                && !tier
                    .upgrades
                    .iter()
                    .all(|cell| engine.grid().is_upgraded(*cell, Owner::Own))
            {
                debug!(priority = tier.priority, "tier gate not met, stopping walk");
                summary.gated_at = Some(tier.priority);
                break;
            }
        }

        summary
    }

    /// Pops queued upgrades while structure points meet the reserve.
    ///
    /// Entries that no longer hold an unupgraded friendly structure are
    /// dropped without issuing a request.
    pub fn drain_upgrades<E>(&mut self, engine: &mut E, out: &mut Vec<Issued>) -> usize
    where
        E: MatchEngine + ?Sized,
    {
        let mut drained = 0;
        while !self.queue.is_empty()
            && engine.grid().player(Owner::Own).resources.structure >= self.upgrade_reserve
        {
            let Some(cell) = self.queue.pop() else {
                break;
            };
            drained += 1;

            let pending = engine
                .grid()
                .stationary_at(cell)
                .is_some_and(|unit| unit.owner == Owner::Own && !unit.upgraded);
            if !pending {
                debug!(?cell, "dropping stale upgrade entry");
                continue;
            }

            let upgraded = dispatch(engine, Directive::Upgrade { cells: vec![cell] }, out);
            debug!(?cell, upgraded, "drained pending upgrade");
        }
        drained
    }

    fn run_tier<E>(
        &mut self,
        tier: &PlacementTier,
        save: bool,
        engine: &mut E,
        out: &mut Vec<Issued>,
    ) -> usize
    where
        E: MatchEngine + ?Sized,
    {
        let enqueued = self.place_turrets(&tier.turrets, engine, out);
        let _ = place(engine, UnitKind::Wall, &tier.walls, save, out);
        let _ = place(engine, UnitKind::Support, &tier.supports, save, out);
        let _ = upgrade(engine, &tier.upgrades, out);
        enqueued
    }

    fn run_opening<E>(&mut self, opening: &Opening, engine: &mut E, out: &mut Vec<Issued>) -> usize
    where
        E: MatchEngine + ?Sized,
    {
        let free = free_cells(engine, &opening.turrets);
        let placed = place(engine, UnitKind::Turret, &opening.turrets, false, out);
        let _ = place(engine, UnitKind::Support, &opening.supports, false, out);
        if opening.upgrade_turrets {
            let _ = upgrade(engine, &opening.turrets, out);
        }
        self.enqueue_new_turrets(engine, &free, placed)
    }

    fn place_turrets<E>(&mut self, cells: &[CellCoord], engine: &mut E, out: &mut Vec<Issued>) -> usize
    where
        E: MatchEngine + ?Sized,
    {
        let free = free_cells(engine, cells);
        let placed = place(engine, UnitKind::Turret, cells, false, out);
        self.enqueue_new_turrets(engine, &free, placed)
    }

    /// Enqueues turrets that now stand on previously free cells, bounded by
    /// the count the engine reported as placed.
    fn enqueue_new_turrets<E>(&mut self, engine: &E, free: &[CellCoord], placed: u32) -> usize
    where
        E: MatchEngine + ?Sized,
    {
        let limit = usize::try_from(placed).unwrap_or(usize::MAX);
        let grid = engine.grid();
        let fresh: Vec<CellCoord> = free
            .iter()
            .copied()
            .filter(|cell| {
                grid.stationary_at(*cell).is_some_and(|unit| {
                    unit.owner == Owner::Own && unit.kind == UnitKind::Turret && !unit.upgraded
                })
            })
            .take(limit)
            .collect();
        let count = fresh.len();
        self.queue.extend(fresh);
        count
    }
}

impl Default for BuildPlanner {
    fn default() -> Self {
        Self::new(TierTable::layered(), DEFAULT_UPGRADE_RESERVE)
    }
}

fn free_cells<E>(engine: &E, cells: &[CellCoord]) -> Vec<CellCoord>
where
    E: MatchEngine + ?Sized,
{
    cells
        .iter()
        .copied()
        .filter(|cell| engine.grid().stationary_at(*cell).is_none())
        .collect()
}

fn place<E>(
    engine: &mut E,
    kind: UnitKind,
    cells: &[CellCoord],
    reserve: bool,
    out: &mut Vec<Issued>,
) -> u32
where
    E: MatchEngine + ?Sized,
{
    if cells.is_empty() {
        return 0;
    }
    let placed = dispatch(
        engine,
        Directive::Place {
            kind,
            cells: cells.to_vec(),
            reserve,
        },
        out,
    );
    debug!(?kind, requested = cells.len(), placed, reserve, "placement issued");
    placed
}

fn upgrade<E>(engine: &mut E, cells: &[CellCoord], out: &mut Vec<Issued>) -> u32
where
    E: MatchEngine + ?Sized,
{
    if cells.is_empty() {
        return 0;
    }
    dispatch(
        engine,
        Directive::Upgrade {
            cells: cells.to_vec(),
        },
        out,
    )
}
