#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reactive defence driven by breach and damage history.
//!
//! The system keeps a [`BreachLog`] fed from action frames and a
//! [`DamageFrequencyMap`] refreshed once per turn. Each turn it reinforces the
//! most frequently damaged cells and walls off breached edge cells whose lane
//! to the core is still open.

mod history;
mod reachability;

use lane_defence_core::{
    arena::{self, ARENA_SIZE},
    dispatch, ActionFrame, CellCoord, Directive, GridSnapshot, Issued, MatchEngine, UnitKind,
};
use tracing::debug;

pub use history::{BreachLog, BreachRecord, DamageFrequencyMap};
pub use reachability::lane_is_open;

/// Number of frequently damaged cells reinforced each turn.
pub const DEFAULT_TOP_K: usize = 5;

/// Cells the opponent's units must not reach.
pub const DEFAULT_CORE_CELLS: [CellCoord; 2] = [CellCoord::new(13, 1), CellCoord::new(14, 1)];

/// Wall cells chosen for one turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reinforcements {
    /// Most frequently damaged cells, most damaged first.
    pub hotspots: Vec<CellCoord>,
    /// Breached edge cells whose lane to the core is open.
    pub open_lanes: Vec<CellCoord>,
}

/// Reactive defence system owning the breach and damage history.
#[derive(Clone, Debug)]
pub struct ReactiveDefence {
    top_k: usize,
    core_cells: Vec<CellCoord>,
    breaches: BreachLog,
    damage: DamageFrequencyMap,
}

impl Default for ReactiveDefence {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K, DEFAULT_CORE_CELLS.to_vec())
    }
}

impl ReactiveDefence {
    /// Creates a system reinforcing `top_k` hotspots and guarding `core_cells`.
    #[must_use]
    pub fn new(top_k: usize, core_cells: Vec<CellCoord>) -> Self {
        Self {
            top_k,
            core_cells,
            breaches: BreachLog::new(),
            damage: DamageFrequencyMap::new(),
        }
    }

    /// Breaches recorded so far.
    #[must_use]
    pub fn breaches(&self) -> &BreachLog {
        &self.breaches
    }

    /// Damage history recorded so far.
    #[must_use]
    pub fn damage(&self) -> &DamageFrequencyMap {
        &self.damage
    }

    /// Mutable damage history, for seeding saved state.
    pub fn damage_mut(&mut self) -> &mut DamageFrequencyMap {
        &mut self.damage
    }

    /// Records the opponent breaches of an action frame. Never plans.
    pub fn on_action_frame(&mut self, frame: &ActionFrame) -> usize {
        let added = self.breaches.append(frame);
        if added > 0 {
            debug!(turn = frame.turn, frame = frame.frame, added, "recorded breaches");
        }
        added
    }

    /// Updates the damage history from the turn's snapshot.
    pub fn observe(&mut self, grid: &GridSnapshot) -> usize {
        self.damage.observe(grid)
    }

    /// Chooses wall cells against the current snapshot without issuing anything.
    #[must_use]
    pub fn plan(&self, grid: &GridSnapshot) -> Reinforcements {
        let blocked = |cell: CellCoord| {
            !arena::contains(cell) || grid.cell(cell).map_or(true, |slot| slot.is_blocked())
        };
        let open_lanes = self
            .breaches
            .distinct_cells()
            .into_iter()
            .filter(|cell| lane_is_open(ARENA_SIZE, ARENA_SIZE, *cell, &self.core_cells, blocked))
            .collect();

        Reinforcements {
            hotspots: self.damage.top_k(self.top_k),
            open_lanes,
        }
    }

    /// Observes damage, then issues wall placements for hotspots and open lanes.
    ///
    /// `save` is forwarded as the placements' reserve flag.
    pub fn handle<E>(&mut self, engine: &mut E, save: bool, out: &mut Vec<Issued>) -> Reinforcements
    where
        E: MatchEngine + ?Sized,
    {
        let _ = self.observe(engine.grid());
        let plan = self.plan(engine.grid());

        for cells in [&plan.hotspots, &plan.open_lanes] {
            if cells.is_empty() {
                continue;
            }
            let placed = dispatch(
                engine,
                Directive::Place {
                    kind: UnitKind::Wall,
                    cells: cells.clone(),
                    reserve: save,
                },
                out,
            );
            debug!(requested = cells.len(), placed, "reinforcement walls issued");
        }

        plan
    }
}
