#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the lane defence turn engine.
//!
//! This crate defines the message surface between the decision systems and
//! the external match engine. The engine publishes a read-only
//! [`GridSnapshot`] each turn, systems inspect it and respond with
//! [`Directive`] values, and the engine executes those directives through the
//! [`MatchEngine`] trait, reporting the outcome as [`Event`] values and unit
//! counts. Nothing in here mutates state on its own.

pub mod arena;
pub mod catalog;
pub mod frame;
pub mod grid;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog::{CatalogError, Cost, UnitCatalog, UnitProfile, UnitStats};
pub use frame::{ActionFrame, BreachEvent, FrameError};
pub use grid::{Cell, GridSnapshot, PlayerStatus, SnapshotError, UnitSnapshot};

/// Location of a single arena cell expressed as `x` (column) and `y` (row).
///
/// Serialised as a two element `[x, y]` array, matching the match engine's
/// wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the cell. Row zero borders the own home edge.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Offsets the coordinate, returning `None` when the result would be negative.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Self::new(x, y))
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<[u32; 2]> for CellCoord {
    fn from(value: [u32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<CellCoord> for [u32; 2] {
    fn from(value: CellCoord) -> Self {
        [value.x, value.y]
    }
}

/// Types of units that can exist in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Cheap blocking structure.
    Wall,
    /// Structure that shields friendly mobile units passing nearby.
    Support,
    /// Structure that damages opposing mobile units in range.
    Turret,
    /// Fast, fragile mobile unit.
    Scout,
    /// Long range mobile unit that targets structures.
    Demolisher,
    /// Durable mobile unit that hunts opposing mobile units.
    Interceptor,
}

impl UnitKind {
    /// Every unit kind in catalog order.
    pub const ALL: [UnitKind; 6] = [
        UnitKind::Wall,
        UnitKind::Support,
        UnitKind::Turret,
        UnitKind::Scout,
        UnitKind::Demolisher,
        UnitKind::Interceptor,
    ];

    /// Position of the kind inside the engine's `unitInformation` table.
    #[must_use]
    pub const fn catalog_index(self) -> usize {
        match self {
            Self::Wall => 0,
            Self::Support => 1,
            Self::Turret => 2,
            Self::Scout => 3,
            Self::Demolisher => 4,
            Self::Interceptor => 5,
        }
    }

    /// Reports whether the kind occupies a cell for the rest of the match.
    #[must_use]
    pub const fn is_stationary(self) -> bool {
        matches!(self, Self::Wall | Self::Support | Self::Turret)
    }

    /// Reports whether the kind travels toward an edge once spawned.
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        !self.is_stationary()
    }
}

/// Player that owns a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    /// The player this engine decides for.
    Own,
    /// The opposing player.
    Opponent,
}

impl Owner {
    /// Returns the other player.
    #[must_use]
    pub const fn rival(self) -> Self {
        match self {
            Self::Own => Self::Opponent,
            Self::Opponent => Self::Own,
        }
    }
}

/// One of the two symmetric launch corridors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Corridor launched from the left half of the own edge.
    Left,
    /// Corridor launched from the right half of the own edge.
    Right,
}

/// The two independent resource pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Structure Points, spent on stationary units and upgrades.
    Structure,
    /// Mobile Points, spent on mobile units.
    Mobile,
}

/// Resource levels of a single player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcePools {
    /// Structure Points available this turn.
    pub structure: f32,
    /// Mobile Points available this turn.
    pub mobile: f32,
}

impl ResourcePools {
    /// Creates a new pool pair.
    #[must_use]
    pub const fn new(structure: f32, mobile: f32) -> Self {
        Self { structure, mobile }
    }

    /// Amount held in the provided pool.
    #[must_use]
    pub const fn get(&self, resource: Resource) -> f32 {
        match resource {
            Resource::Structure => self.structure,
            Resource::Mobile => self.mobile,
        }
    }

    /// Reports whether both pools cover the provided cost.
    #[must_use]
    pub fn can_afford(&self, cost: Cost) -> bool {
        self.structure >= cost.structure && self.mobile >= cost.mobile
    }

    /// Deducts the cost from both pools. Callers check [`Self::can_afford`] first.
    pub fn spend(&mut self, cost: Cost) {
        self.structure -= cost.structure;
        self.mobile -= cost.mobile;
    }

    /// Adds income to both pools.
    pub fn credit(&mut self, income: ResourcePools) {
        self.structure += income.structure;
        self.mobile += income.mobile;
    }

    /// Reports whether both pools hold finite values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.structure.is_finite() && self.mobile.is_finite()
    }
}

/// Number of mobile units requested by a spawn directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnCount {
    /// Spawn up to the given number, stopping when resources run out.
    Exactly(u32),
    /// Spawn as many units as the mobile pool affords.
    AsManyAsAffordable,
}

/// Requests the decision systems submit to the match engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    /// Places one stationary unit on each listed cell, in order.
    Place {
        /// Stationary kind to construct.
        kind: UnitKind,
        /// Target cells, attempted in order.
        cells: Vec<CellCoord>,
        /// Keeps the engine's structure-point floor intact when set.
        reserve: bool,
    },
    /// Upgrades the friendly stationary unit on each listed cell, in order.
    Upgrade {
        /// Cells holding the structures to upgrade.
        cells: Vec<CellCoord>,
    },
    /// Launches mobile units from a single cell.
    Spawn {
        /// Mobile kind to launch.
        kind: UnitKind,
        /// Launch cell on the own edge.
        cell: CellCoord,
        /// Requested number of units.
        count: SpawnCount,
    },
}

/// A directive together with the number of units the engine reported for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issued {
    /// Directive sent to the engine.
    #[serde(flatten)]
    pub directive: Directive,
    /// Units placed, upgraded or spawned. Zero when everything was rejected.
    pub affected: u32,
}

/// Reasons the match engine may reject part of a directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The cell lies outside the arena diamond.
    #[error("cell lies outside the arena")]
    OutOfBounds,
    /// The cell lies in the opponent's half.
    #[error("cell lies in the opponent's half")]
    OpponentTerritory,
    /// A stationary unit already occupies the cell.
    #[error("cell is occupied")]
    Occupied,
    /// The relevant resource pool cannot cover the cost.
    #[error("insufficient resources")]
    InsufficientResources,
    /// The placement would dip below the reserved structure-point floor.
    #[error("structure points are held in reserve")]
    ReserveHeld,
    /// No friendly stationary unit exists on the cell.
    #[error("no friendly structure to upgrade")]
    NothingToUpgrade,
    /// The structure on the cell is already upgraded.
    #[error("structure is already upgraded")]
    AlreadyUpgraded,
    /// Mobile units may only launch from the own edge.
    #[error("mobile units must launch from the own edge")]
    NotAnEdge,
    /// The unit kind does not match the directive (e.g. placing a mobile unit).
    #[error("unit kind does not fit the directive")]
    WrongCategory,
    /// The turn was already submitted.
    #[error("turn already submitted")]
    TurnCommitted,
}

/// Outcomes reported by the match engine after executing directives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Confirms that a stationary unit was placed.
    UnitPlaced {
        /// Kind that was placed.
        kind: UnitKind,
        /// Cell now holding the unit.
        cell: CellCoord,
    },
    /// Reports that a single placement was rejected.
    PlacementRejected {
        /// Kind requested for placement.
        kind: UnitKind,
        /// Cell provided in the request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a stationary unit was upgraded.
    UnitUpgraded {
        /// Kind of the upgraded unit.
        kind: UnitKind,
        /// Cell holding the unit.
        cell: CellCoord,
    },
    /// Reports that a single upgrade was rejected.
    UpgradeRejected {
        /// Cell provided in the request.
        cell: CellCoord,
        /// Specific reason the upgrade failed.
        reason: PlacementError,
    },
    /// Confirms that mobile units were queued for launch.
    UnitsSpawned {
        /// Kind that was spawned.
        kind: UnitKind,
        /// Launch cell.
        cell: CellCoord,
        /// Number of units spawned.
        count: u32,
    },
    /// Reports that a spawn request produced no units.
    SpawnRejected {
        /// Kind requested for launch.
        kind: UnitKind,
        /// Launch cell provided in the request.
        cell: CellCoord,
        /// Specific reason the spawn failed.
        reason: PlacementError,
    },
    /// Announces that the turn was submitted and no further mutation is accepted.
    TurnSubmitted {
        /// Turn number that was committed.
        turn: u32,
    },
}

/// Interface exposed by the external match engine for the duration of one turn.
///
/// The grid returned by [`MatchEngine::grid`] reflects every directive
/// executed so far in the turn, so systems re-query it instead of trusting
/// their own bookkeeping.
pub trait MatchEngine {
    /// Current read-only snapshot, including provisional placements and spend.
    fn grid(&self) -> &GridSnapshot;

    /// Ordered path a mobile unit launched from `start` would follow toward
    /// its target edge. Empty when the target edge cannot be reached.
    fn path_to_edge(&self, start: CellCoord) -> Vec<CellCoord>;

    /// Stationary units able to damage a unit owned by `defender` at `cell`.
    fn attackers(&self, cell: CellCoord, defender: Owner) -> Vec<UnitSnapshot>;

    /// Executes a directive and returns the number of units it affected.
    /// Rejections are not errors; they simply do not count.
    fn issue(&mut self, directive: &Directive) -> u32;

    /// Commits the turn. Later directives are rejected until the next turn.
    fn submit(&mut self);
}

/// Issues `directive` on `engine`, records the outcome in `out` and returns
/// the affected unit count.
pub fn dispatch<E>(engine: &mut E, directive: Directive, out: &mut Vec<Issued>) -> u32
where
    E: MatchEngine + ?Sized,
{
    let affected = engine.issue(&directive);
    out.push(Issued {
        directive,
        affected,
    });
    affected
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, Cost, Directive, ResourcePools, SpawnCount, UnitKind};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn offset_rejects_negative_results() {
        assert_eq!(CellCoord::new(0, 3).offset(-1, 0), None);
        assert_eq!(
            CellCoord::new(13, 0).offset(0, 1),
            Some(CellCoord::new(13, 1))
        );
    }

    #[test]
    fn cell_coord_uses_pair_wire_format() {
        let json = serde_json::to_string(&CellCoord::new(5, 13)).expect("serialize");
        assert_eq!(json, "[5,13]");
        let cell: CellCoord = serde_json::from_str("[24,12]").expect("deserialize");
        assert_eq!(cell, CellCoord::new(24, 12));
    }

    #[test]
    fn stationary_and_mobile_kinds_partition_catalog() {
        let stationary: Vec<_> = UnitKind::ALL
            .into_iter()
            .filter(|kind| kind.is_stationary())
            .collect();
        assert_eq!(
            stationary,
            vec![UnitKind::Wall, UnitKind::Support, UnitKind::Turret]
        );
        assert!(UnitKind::ALL
            .into_iter()
            .all(|kind| kind.is_stationary() != kind.is_mobile()));
    }

    #[test]
    fn pools_spend_and_afford() {
        let mut pools = ResourcePools::new(5.0, 3.0);
        let cost = Cost::new(2.0, 0.0);
        assert!(pools.can_afford(cost));
        pools.spend(cost);
        assert!((pools.structure - 3.0).abs() < f32::EPSILON);
        assert!(!pools.can_afford(Cost::new(0.0, 4.0)));
    }

    #[test]
    fn directives_serialize_with_tag() {
        let directive = Directive::Spawn {
            kind: UnitKind::Scout,
            cell: CellCoord::new(13, 0),
            count: SpawnCount::AsManyAsAffordable,
        };
        let json = serde_json::to_value(&directive).expect("serialize");
        assert_eq!(json["directive"], "spawn");
        assert_eq!(json["count"], "as_many_as_affordable");
    }
}
