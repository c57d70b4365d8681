#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that scores candidate launch cells by the damage expected along their path.

use std::fmt;

use lane_defence_core::{
    arena::{self, CELL_SLOTS},
    CellCoord, MatchEngine, Owner, UnitCatalog, UnitSnapshot,
};
use serde::Serialize;
use tracing::debug;

/// Expected damage a launched unit absorbs on its way to the target edge.
///
/// Variant order matters: every finite score ranks below [`Risk::Unreachable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Risk {
    /// Summed damage over every cell of the path.
    Finite(u32),
    /// The launch cell has no path to its target edge.
    Unreachable,
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Risk::Finite(score) => write!(f, "{score}"),
            Risk::Unreachable => f.write_str("unreachable"),
        }
    }
}

/// Risk attached to one candidate launch cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LaunchRisk {
    /// Candidate launch cell.
    pub cell: CellCoord,
    /// Aggregated risk of the path leaving from the cell.
    pub risk: Risk,
}

/// Per-cell expected damage against own mobile units, rebuilt every turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreatMap {
    scores: Vec<u32>,
}

impl Default for ThreatMap {
    fn default() -> Self {
        Self {
            scores: vec![0; CELL_SLOTS],
        }
    }
}

impl ThreatMap {
    /// Builds a map by querying the attackers of every arena cell.
    ///
    /// Each attacker contributes the damage of its kind in its current
    /// upgrade state, as listed in `catalog`.
    #[must_use]
    pub fn from_attackers<F>(catalog: &UnitCatalog, attackers: F) -> Self
    where
        F: FnMut(CellCoord) -> Vec<UnitSnapshot>,
    {
        let mut map = Self::default();
        map.rebuild_with(catalog, attackers);
        map
    }

    /// Recomputes every score in place, discarding the previous turn's values.
    pub fn rebuild_with<F>(&mut self, catalog: &UnitCatalog, mut attackers: F)
    where
        F: FnMut(CellCoord) -> Vec<UnitSnapshot>,
    {
        if self.scores.len() != CELL_SLOTS {
            self.scores = vec![0; CELL_SLOTS];
        } else {
            self.scores.fill(0);
        }

        for cell in arena::cells() {
            let Some(slot) = arena::index(cell) else {
                continue;
            };
            self.scores[slot] = attackers(cell)
                .iter()
                .map(|unit| catalog.stats(unit.kind, unit.upgraded).damage)
                .fold(0, u32::saturating_add);
        }
    }

    /// Expected damage at a single cell. Zero outside the arena.
    #[must_use]
    pub fn score(&self, cell: CellCoord) -> u32 {
        arena::index(cell)
            .and_then(|slot| self.scores.get(slot).copied())
            .unwrap_or(0)
    }

    /// Aggregated risk of walking `path`. Empty paths are unreachable.
    #[must_use]
    pub fn path_risk(&self, path: &[CellCoord]) -> Risk {
        if path.is_empty() {
            return Risk::Unreachable;
        }
        Risk::Finite(
            path.iter()
                .map(|cell| self.score(*cell))
                .fold(0, u32::saturating_add),
        )
    }
}

/// Returns the first candidate with the lowest risk.
#[must_use]
pub fn select_least_risk(risks: &[LaunchRisk]) -> Option<LaunchRisk> {
    let mut best: Option<LaunchRisk> = None;
    for candidate in risks {
        if best.map_or(true, |current| candidate.risk < current.risk) {
            best = Some(*candidate);
        }
    }
    best
}

/// Threat estimator that reuses its threat map between turns.
#[derive(Debug)]
pub struct ThreatEstimator {
    catalog: UnitCatalog,
    map: ThreatMap,
}

impl ThreatEstimator {
    /// Creates a new estimator pricing attackers with `catalog`.
    #[must_use]
    pub fn new(catalog: UnitCatalog) -> Self {
        Self {
            catalog,
            map: ThreatMap::default(),
        }
    }

    /// Threat map computed by the latest [`Self::refresh`].
    #[must_use]
    pub fn threat_map(&self) -> &ThreatMap {
        &self.map
    }

    /// Rebuilds the threat map from the engine's current snapshot.
    pub fn refresh<E>(&mut self, engine: &E)
    where
        E: MatchEngine + ?Sized,
    {
        self.map
            .rebuild_with(&self.catalog, |cell| engine.attackers(cell, Owner::Own));
    }

    /// Scores every candidate launch cell in input order.
    ///
    /// The output buffer is cleared before populating it. The threat map is
    /// refreshed first so the scores always reflect the current snapshot.
    pub fn handle<E>(&mut self, engine: &E, candidates: &[CellCoord], out: &mut Vec<LaunchRisk>)
    where
        E: MatchEngine + ?Sized,
    {
        out.clear();
        self.refresh(engine);

        for &cell in candidates {
            let path = engine.path_to_edge(cell);
            let risk = self.map.path_risk(&path);
            debug!(?cell, steps = path.len(), %risk, "scored launch cell");
            out.push(LaunchRisk { cell, risk });
        }
    }

    /// Candidate with the lowest risk; ties go to the earliest candidate.
    ///
    /// Returns `None` only for an empty candidate list. When every candidate
    /// is unreachable the first one is still returned.
    pub fn least_risk<E>(&mut self, engine: &E, candidates: &[CellCoord]) -> Option<LaunchRisk>
    where
        E: MatchEngine + ?Sized,
    {
        let mut risks = Vec::with_capacity(candidates.len());
        self.handle(engine, candidates, &mut risks);
        select_least_risk(&risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(x: u32, risk: Risk) -> LaunchRisk {
        LaunchRisk {
            cell: CellCoord::new(x, 0),
            risk,
        }
    }

    #[test]
    fn unreachable_ranks_above_any_finite_score() {
        assert!(Risk::Finite(u32::MAX) < Risk::Unreachable);
        assert!(Risk::Finite(0) < Risk::Finite(1));
    }

    #[test]
    fn ties_resolve_to_first_minimal_index() {
        let risks = [
            risk(1, Risk::Finite(4)),
            risk(2, Risk::Finite(2)),
            risk(3, Risk::Finite(2)),
        ];
        assert_eq!(select_least_risk(&risks), Some(risks[1]));
    }

    #[test]
    fn all_unreachable_still_selects_first() {
        let risks = [risk(1, Risk::Unreachable), risk(2, Risk::Unreachable)];
        assert_eq!(select_least_risk(&risks), Some(risks[0]));
        assert_eq!(select_least_risk(&[]), None);
    }

    #[test]
    fn empty_paths_are_unreachable() {
        let map = ThreatMap::default();
        assert_eq!(map.path_risk(&[]), Risk::Unreachable);
        assert_eq!(map.path_risk(&[CellCoord::new(13, 0)]), Risk::Finite(0));
    }

    #[test]
    fn scores_outside_arena_are_zero() {
        let catalog = UnitCatalog::standard();
        let map = ThreatMap::from_attackers(&catalog, |_| {
            vec![UnitSnapshot::fresh(
                lane_defence_core::UnitKind::Turret,
                Owner::Opponent,
                75.0,
            )]
        });
        assert_eq!(map.score(CellCoord::new(13, 0)), 5);
        assert_eq!(map.score(CellCoord::new(0, 0)), 0);
    }
}
