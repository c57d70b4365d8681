//! Declarative placement tables consulted by the planner.

use lane_defence_core::CellCoord;
use serde::{Deserialize, Serialize};

/// Condition that decides whether the walk continues past a tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierGate {
    /// The next tier always follows once this tier was attempted.
    #[default]
    Attempted,
    /// The walk stops unless every upgrade cell of this tier now holds an
    /// upgraded friendly structure.
    Upgraded,
}

/// One priority group of placements and upgrades.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementTier {
    /// Lower values are attempted first.
    pub priority: u32,
    /// Turret cells, placed before anything else in the tier.
    pub turrets: Vec<CellCoord>,
    /// Wall cells, placed after the turrets.
    pub walls: Vec<CellCoord>,
    /// Support cells, placed after the walls.
    pub supports: Vec<CellCoord>,
    /// Cells whose structures are upgraded last.
    pub upgrades: Vec<CellCoord>,
    /// First turn on which the tier is attempted.
    pub min_turn: u32,
    /// Whether lower tiers depend on this tier's upgrades.
    pub gate: TierGate,
}

/// Turn-zero build that replaces the tier walk on the first turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Opening {
    /// Turret cells placed first.
    pub turrets: Vec<CellCoord>,
    /// Support cells placed after the turrets.
    pub supports: Vec<CellCoord>,
    /// Upgrade the opening turrets in the same turn.
    pub upgrade_turrets: bool,
}

/// Ordered list of placement tiers plus an optional opening.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TierTable {
    tiers: Vec<PlacementTier>,
    opening: Option<Opening>,
}

impl TierTable {
    /// Creates a table, ordering the tiers by ascending priority.
    ///
    /// Tiers sharing a priority keep their relative order.
    #[must_use]
    pub fn new(mut tiers: Vec<PlacementTier>, opening: Option<Opening>) -> Self {
        tiers.sort_by_key(|tier| tier.priority);
        Self { tiers, opening }
    }

    /// Tiers in walk order.
    #[must_use]
    pub fn tiers(&self) -> &[PlacementTier] {
        &self.tiers
    }

    /// Turn-zero opening, if any.
    #[must_use]
    pub fn opening(&self) -> Option<&Opening> {
        self.opening.as_ref()
    }

    /// Spread-out defence that hardens both corners before the centre.
    #[must_use]
    pub fn layered() -> Self {
        let tiers = vec![
            PlacementTier {
                priority: 1,
                turrets: cells(&[(3, 12), (24, 12), (9, 10), (18, 10)]),
                walls: cells(&[
                    (3, 13),
                    (24, 13),
                    (9, 11),
                    (18, 11),
                    (0, 13),
                    (27, 13),
                    (1, 13),
                    (26, 13),
                    (25, 13),
                    (2, 13),
                ]),
                ..PlacementTier::default()
            },
            PlacementTier {
                priority: 2,
                turrets: cells(&[(4, 12), (23, 12)]),
                walls: cells(&[
                    (8, 10),
                    (19, 10),
                    (5, 12),
                    (22, 12),
                    (23, 13),
                    (4, 13),
                    (10, 10),
                    (17, 10),
                ]),
                upgrades: cells(&[(23, 13), (24, 13), (3, 13), (4, 13)]),
                ..PlacementTier::default()
            },
            PlacementTier {
                priority: 3,
                walls: cells(&[
                    (6, 11),
                    (7, 10),
                    (20, 10),
                    (21, 11),
                    (11, 9),
                    (12, 9),
                    (15, 9),
                    (16, 9),
                    (13, 10),
                    (14, 10),
                ]),
                supports: cells(&[(12, 6), (13, 6), (14, 6)]),
                upgrades: cells(&[(9, 11), (18, 11), (17, 10), (10, 10)]),
                ..PlacementTier::default()
            },
            PlacementTier {
                priority: 4,
                walls: cells(&[(1, 12), (2, 12), (25, 12), (26, 12)]),
                supports: cells(&[
                    (4, 11),
                    (5, 10),
                    (6, 9),
                    (21, 9),
                    (22, 10),
                    (23, 11),
                    (7, 8),
                    (13, 7),
                    (20, 8),
                    (12, 5),
                    (13, 5),
                    (14, 5),
                ]),
                upgrades: cells(&[(19, 10), (8, 10), (12, 6), (13, 6), (14, 6)]),
                ..PlacementTier::default()
            },
            PlacementTier {
                priority: 5,
                turrets: cells(&[(13, 9), (14, 9)]),
                upgrades: cells(&[
                    (13, 10),
                    (14, 10),
                    (13, 9),
                    (14, 9),
                    (4, 11),
                    (5, 10),
                    (6, 9),
                    (21, 9),
                    (22, 10),
                    (23, 11),
                    (7, 8),
                    (13, 7),
                    (20, 8),
                    (12, 5),
                    (13, 5),
                    (14, 5),
                ]),
                ..PlacementTier::default()
            },
        ];
        let opening = Opening {
            turrets: cells(&[(3, 12), (24, 12), (9, 10), (18, 10)]),
            supports: Vec::new(),
            upgrade_turrets: true,
        };
        Self::new(tiers, Some(opening))
    }

    /// Compact turret line whose outer tiers unlock only once the core is upgraded.
    #[must_use]
    pub fn fortress() -> Self {
        let core_turrets = cells(&[(7, 11), (19, 11), (24, 12), (3, 12), (13, 11)]);
        let core_supports = cells(&[(13, 2), (14, 2)]);
        let corner_walls = cells(&[(0, 13), (27, 13), (1, 12), (2, 12), (26, 12), (25, 12)]);
        let secondary_supports = cells(&[(13, 3), (14, 3), (13, 4), (14, 4)]);
        let secondary_turrets = cells(&[
            (10, 11),
            (16, 11),
            (23, 11),
            (4, 11),
            (24, 11),
            (3, 11),
            (10, 10),
            (13, 10),
            (14, 11),
            (9, 11),
            (15, 11),
            (12, 11),
            (17, 11),
            (18, 11),
        ]);
        let turret_walls = cells(&[
            (23, 12),
            (4, 12),
            (22, 12),
            (6, 12),
            (7, 12),
            (8, 12),
            (12, 12),
            (13, 12),
            (14, 12),
            (18, 12),
            (19, 12),
            (20, 12),
            (24, 12),
            (10, 12),
            (16, 12),
            (5, 12),
            (21, 12),
            (9, 12),
            (17, 12),
            (11, 9),
            (15, 12),
        ]);
        let final_supports = cells(&[
            (12, 3),
            (15, 3),
            (12, 4),
            (15, 4),
            (13, 5),
            (14, 5),
            (13, 6),
            (14, 6),
        ]);

        let mut core_upgrades = core_turrets.clone();
        core_upgrades.extend(core_supports.iter().copied());

        let tiers = vec![
            PlacementTier {
                priority: 1,
                turrets: core_turrets,
                walls: corner_walls.clone(),
                supports: core_supports,
                ..PlacementTier::default()
            },
            PlacementTier {
                priority: 2,
                upgrades: corner_walls,
                min_turn: 26,
                ..PlacementTier::default()
            },
            PlacementTier {
                priority: 3,
                upgrades: core_upgrades,
                gate: TierGate::Upgraded,
                ..PlacementTier::default()
            },
            PlacementTier {
                priority: 4,
                walls: turret_walls,
                supports: secondary_supports.clone(),
                upgrades: secondary_supports,
                gate: TierGate::Upgraded,
                ..PlacementTier::default()
            },
            PlacementTier {
                priority: 5,
                turrets: secondary_turrets.clone(),
                upgrades: secondary_turrets,
                gate: TierGate::Upgraded,
                ..PlacementTier::default()
            },
            PlacementTier {
                priority: 6,
                supports: final_supports.clone(),
                upgrades: final_supports,
                ..PlacementTier::default()
            },
        ];
        let opening = Opening {
            turrets: cells(&[(7, 11), (19, 11)]),
            supports: cells(&[(13, 2)]),
            upgrade_turrets: true,
        };
        Self::new(tiers, Some(opening))
    }
}

fn cells(pairs: &[(u32, u32)]) -> Vec<CellCoord> {
    pairs.iter().map(|&(x, y)| CellCoord::new(x, y)).collect()
}
