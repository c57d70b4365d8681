//! Match-long bookkeeping of breaches and structure damage.

use lane_defence_core::{
    arena::{self, CELL_SLOTS},
    ActionFrame, CellCoord, GridSnapshot, Owner,
};

/// Breach observed in an action frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreachRecord {
    /// Edge cell the unit crossed.
    pub cell: CellCoord,
    /// Turn of the frame that reported the breach.
    pub turn: u32,
    /// Owner of the breaching unit.
    pub attacker: Owner,
}

/// Append-only log of breaches scored against the own edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BreachLog {
    records: Vec<BreachRecord>,
}

impl BreachLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the opponent's breaches from `frame` and returns how many were added.
    ///
    /// Breaches by own units are ignored.
    pub fn append(&mut self, frame: &ActionFrame) -> usize {
        let before = self.records.len();
        self.records
            .extend(frame.opponent_breaches().map(|breach| BreachRecord {
                cell: breach.cell,
                turn: breach.turn,
                attacker: breach.owner,
            }));
        self.records.len() - before
    }

    /// Every record in arrival order.
    #[must_use]
    pub fn records(&self) -> &[BreachRecord] {
        &self.records
    }

    /// Number of recorded breaches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Reports whether no breach was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Breached cells without repeats, in order of first breach.
    #[must_use]
    pub fn distinct_cells(&self) -> Vec<CellCoord> {
        let mut seen = vec![false; CELL_SLOTS];
        let mut cells = Vec::new();
        for record in &self.records {
            let Some(slot) = arena::index(record.cell) else {
                continue;
            };
            if !seen[slot] {
                seen[slot] = true;
                cells.push(record.cell);
            }
        }
        cells
    }
}

/// Per-cell count of turns in which a friendly structure there was damaged.
///
/// Counts never decrease during a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageFrequencyMap {
    counts: Vec<u32>,
    first_seen: Vec<CellCoord>,
    last_observed_turn: Option<u32>,
}

impl Default for DamageFrequencyMap {
    fn default() -> Self {
        Self {
            counts: vec![0; CELL_SLOTS],
            first_seen: Vec::new(),
            last_observed_turn: None,
        }
    }
}

impl DamageFrequencyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more damaged turn at `cell`. Cells outside the arena are ignored.
    pub fn record(&mut self, cell: CellCoord) {
        let Some(slot) = arena::index(cell) else {
            return;
        };
        if self.counts[slot] == 0 {
            self.first_seen.push(cell);
        }
        self.counts[slot] = self.counts[slot].saturating_add(1);
    }

    /// Scans the own half of `grid` and counts every damaged friendly structure.
    ///
    /// Each turn is counted at most once; repeated calls for the same turn
    /// return zero without touching the counts.
    pub fn observe(&mut self, grid: &GridSnapshot) -> usize {
        if self.last_observed_turn == Some(grid.turn()) {
            return 0;
        }
        self.last_observed_turn = Some(grid.turn());

        let damaged: Vec<CellCoord> = grid
            .stationary_units()
            .filter(|(cell, unit)| {
                cell.y() < arena::HALF_ARENA && unit.owner == Owner::Own && unit.is_damaged()
            })
            .map(|(cell, _)| cell)
            .collect();
        for cell in &damaged {
            self.record(*cell);
        }
        damaged.len()
    }

    /// Damaged-turn count at `cell`.
    #[must_use]
    pub fn count(&self, cell: CellCoord) -> u32 {
        arena::index(cell)
            .and_then(|slot| self.counts.get(slot).copied())
            .unwrap_or(0)
    }

    /// The `k` most frequently damaged cells, most damaged first.
    ///
    /// Equal counts keep the order in which the cells were first damaged.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<CellCoord> {
        let mut ranked = self.first_seen.clone();
        ranked.sort_by(|a, b| self.count(*b).cmp(&self.count(*a)));
        ranked.truncate(k);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ignores_cells_outside_the_arena() {
        let mut map = DamageFrequencyMap::new();
        map.record(CellCoord::new(0, 0));
        assert!(map.top_k(5).is_empty());
    }

    #[test]
    fn distinct_cells_keep_first_breach_order() {
        let cell = |x, y| CellCoord::new(x, y);
        let mut log = BreachLog::new();
        log.records = [cell(0, 13), cell(27, 13), cell(0, 13)]
            .into_iter()
            .map(|cell| BreachRecord {
                cell,
                turn: 1,
                attacker: Owner::Opponent,
            })
            .collect();

        assert_eq!(log.distinct_cells(), vec![cell(0, 13), cell(27, 13)]);
    }
}
