//! Immutable unit statistics resolved once from the match engine's game config.

use serde::Deserialize;
use thiserror::Error;

use crate::UnitKind;

/// Price of a unit or upgrade in both resource pools.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cost {
    /// Structure Points required.
    pub structure: f32,
    /// Mobile Points required.
    pub mobile: f32,
}

impl Cost {
    /// Creates a new cost.
    #[must_use]
    pub const fn new(structure: f32, mobile: f32) -> Self {
        Self { structure, mobile }
    }
}

/// Combat statistics of a unit in one upgrade state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitStats {
    /// Health a freshly placed unit starts with.
    pub health: f32,
    /// Euclidean attack range measured in cells.
    pub range: f32,
    /// Damage dealt to mobile units per hit.
    pub damage: u32,
}

/// Everything the catalog knows about a single unit kind.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitProfile {
    shorthand: String,
    cost: Cost,
    upgrade_cost: Cost,
    base: UnitStats,
    upgraded: UnitStats,
}

impl UnitProfile {
    /// Wire shorthand the engine uses for the kind.
    #[must_use]
    pub fn shorthand(&self) -> &str {
        &self.shorthand
    }

    /// Price of placing or spawning one unit.
    #[must_use]
    pub const fn cost(&self) -> Cost {
        self.cost
    }

    /// Price of upgrading one placed unit.
    #[must_use]
    pub const fn upgrade_cost(&self) -> Cost {
        self.upgrade_cost
    }

    /// Statistics in the requested upgrade state.
    #[must_use]
    pub const fn stats(&self, upgraded: bool) -> UnitStats {
        if upgraded {
            self.upgraded
        } else {
            self.base
        }
    }
}

/// Errors raised while resolving the catalog from a game config.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The config could not be parsed as JSON of the expected shape.
    #[error("game config is not valid: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The config lists fewer unit types than the engine defines.
    #[error("game config lists {found} unit types, expected at least {expected}")]
    MissingUnits {
        /// Number of entries found.
        found: usize,
        /// Number of entries required.
        expected: usize,
    },
    /// A unit entry lacks a required field.
    #[error("unit entry {index} is missing `{field}`")]
    MissingField {
        /// Position of the entry in `unitInformation`.
        index: usize,
        /// Name of the missing field.
        field: &'static str,
    },
}

/// Statistics for every unit kind, threaded explicitly through the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitCatalog {
    profiles: Vec<UnitProfile>,
}

impl UnitCatalog {
    /// Stock unit statistics used when no game config is supplied.
    #[must_use]
    pub fn standard() -> Self {
        let profile = |shorthand: &str,
                       cost: Cost,
                       upgrade_cost: Cost,
                       base: (f32, f32, u32),
                       upgraded: (f32, f32, u32)| UnitProfile {
            shorthand: shorthand.to_owned(),
            cost,
            upgrade_cost,
            base: UnitStats {
                health: base.0,
                range: base.1,
                damage: base.2,
            },
            upgraded: UnitStats {
                health: upgraded.0,
                range: upgraded.1,
                damage: upgraded.2,
            },
        };

        Self {
            profiles: vec![
                profile(
                    "FF",
                    Cost::new(1.0, 0.0),
                    Cost::new(1.0, 0.0),
                    (60.0, 0.0, 0),
                    (120.0, 0.0, 0),
                ),
                profile(
                    "EF",
                    Cost::new(4.0, 0.0),
                    Cost::new(2.0, 0.0),
                    (30.0, 3.5, 0),
                    (30.0, 5.0, 0),
                ),
                profile(
                    "DF",
                    Cost::new(2.0, 0.0),
                    Cost::new(4.0, 0.0),
                    (75.0, 2.5, 5),
                    (75.0, 3.5, 15),
                ),
                profile(
                    "PI",
                    Cost::new(0.0, 1.0),
                    Cost::new(0.0, 0.0),
                    (15.0, 3.5, 2),
                    (15.0, 3.5, 2),
                ),
                profile(
                    "EI",
                    Cost::new(0.0, 3.0),
                    Cost::new(0.0, 0.0),
                    (5.0, 4.5, 8),
                    (5.0, 4.5, 8),
                ),
                profile(
                    "SI",
                    Cost::new(0.0, 1.0),
                    Cost::new(0.0, 0.0),
                    (40.0, 4.5, 20),
                    (40.0, 4.5, 20),
                ),
            ],
        }
    }

    /// Resolves the catalog from the engine's game-config JSON.
    ///
    /// Entries 0..6 of `unitInformation` map to [`UnitKind::ALL`] in order.
    /// Missing attack fields default to zero; `upgrade` holds partial
    /// overrides of the base entry.
    pub fn from_game_config(raw: &str) -> Result<Self, CatalogError> {
        let config: GameConfig = serde_json::from_str(raw)?;
        let expected = UnitKind::ALL.len();
        if config.unit_information.len() < expected {
            return Err(CatalogError::MissingUnits {
                found: config.unit_information.len(),
                expected,
            });
        }

        let mut profiles = Vec::with_capacity(expected);
        for (index, entry) in config.unit_information.into_iter().take(expected).enumerate() {
            profiles.push(resolve_profile(index, entry)?);
        }

        Ok(Self { profiles })
    }

    /// Profile of the requested kind.
    #[must_use]
    pub fn profile(&self, kind: UnitKind) -> &UnitProfile {
        &self.profiles[kind.catalog_index()]
    }

    /// Statistics of the requested kind and upgrade state.
    #[must_use]
    pub fn stats(&self, kind: UnitKind, upgraded: bool) -> UnitStats {
        self.profile(kind).stats(upgraded)
    }

    /// Wire shorthand of the requested kind.
    #[must_use]
    pub fn shorthand(&self, kind: UnitKind) -> &str {
        self.profile(kind).shorthand()
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Deserialize)]
struct GameConfig {
    #[serde(rename = "unitInformation")]
    unit_information: Vec<UnitInformation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnitInformation {
    shorthand: Option<String>,
    cost1: Option<f32>,
    cost2: Option<f32>,
    start_health: Option<f32>,
    attack_range: Option<f32>,
    attack_damage_walker: Option<f32>,
    upgrade: Option<UpgradeInformation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpgradeInformation {
    cost1: Option<f32>,
    cost2: Option<f32>,
    start_health: Option<f32>,
    attack_range: Option<f32>,
    attack_damage_walker: Option<f32>,
}

fn resolve_profile(index: usize, entry: UnitInformation) -> Result<UnitProfile, CatalogError> {
    let shorthand = entry.shorthand.ok_or(CatalogError::MissingField {
        index,
        field: "shorthand",
    })?;
    let health = entry.start_health.ok_or(CatalogError::MissingField {
        index,
        field: "startHealth",
    })?;
    let base = UnitStats {
        health,
        range: entry.attack_range.unwrap_or(0.0),
        damage: whole_damage(entry.attack_damage_walker.unwrap_or(0.0)),
    };
    let upgrade = entry.upgrade.unwrap_or_default();
    let upgraded = UnitStats {
        health: upgrade.start_health.unwrap_or(base.health),
        range: upgrade.attack_range.unwrap_or(base.range),
        damage: upgrade
            .attack_damage_walker
            .map_or(base.damage, whole_damage),
    };

    Ok(UnitProfile {
        shorthand,
        cost: Cost::new(entry.cost1.unwrap_or(0.0), entry.cost2.unwrap_or(0.0)),
        upgrade_cost: Cost::new(upgrade.cost1.unwrap_or(0.0), upgrade.cost2.unwrap_or(0.0)),
        base,
        upgraded,
    })
}

fn whole_damage(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(shorthand: &str, cost1: f32, cost2: f32) -> serde_json::Value {
        serde_json::json!({
            "shorthand": shorthand,
            "cost1": cost1,
            "cost2": cost2,
            "startHealth": 10.0,
        })
    }

    #[test]
    fn resolves_catalog_from_game_config() {
        let mut units = vec![
            entry("FF", 1.0, 0.0),
            entry("EF", 4.0, 0.0),
            entry("DF", 2.0, 0.0),
            entry("PI", 0.0, 1.0),
            entry("EI", 0.0, 3.0),
            entry("SI", 0.0, 1.0),
        ];
        units[2]["attackRange"] = serde_json::json!(2.5);
        units[2]["attackDamageWalker"] = serde_json::json!(6.0);
        units[2]["upgrade"] = serde_json::json!({ "cost1": 4.0, "attackRange": 3.5 });
        let raw = serde_json::json!({ "unitInformation": units }).to_string();

        let catalog = UnitCatalog::from_game_config(&raw).expect("catalog resolves");

        assert_eq!(catalog.shorthand(UnitKind::Turret), "DF");
        let turret = catalog.profile(UnitKind::Turret);
        assert_eq!(turret.cost(), Cost::new(2.0, 0.0));
        assert_eq!(turret.upgrade_cost(), Cost::new(4.0, 0.0));
        assert_eq!(turret.stats(false).damage, 6);
        assert_eq!(turret.stats(true).damage, 6, "damage inherits base value");
        assert!((turret.stats(true).range - 3.5).abs() < f32::EPSILON);
        assert_eq!(catalog.stats(UnitKind::Wall, false).damage, 0);
    }

    #[test]
    fn rejects_short_unit_tables() {
        let raw = serde_json::json!({ "unitInformation": [entry("FF", 1.0, 0.0)] }).to_string();
        match UnitCatalog::from_game_config(&raw) {
            Err(CatalogError::MissingUnits { found, expected }) => {
                assert_eq!((found, expected), (1, 6));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_entries_without_shorthand() {
        let mut units: Vec<_> = (0..6).map(|_| entry("XX", 1.0, 0.0)).collect();
        units[4] = serde_json::json!({ "startHealth": 5.0 });
        let raw = serde_json::json!({ "unitInformation": units }).to_string();

        match UnitCatalog::from_game_config(&raw) {
            Err(CatalogError::MissingField { index, field }) => {
                assert_eq!((index, field), (4, "shorthand"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn standard_catalog_prices_turret_upgrades() {
        let catalog = UnitCatalog::standard();
        assert_eq!(
            catalog.profile(UnitKind::Turret).upgrade_cost(),
            Cost::new(4.0, 0.0)
        );
        assert!(catalog.stats(UnitKind::Turret, true).range > catalog.stats(UnitKind::Turret, false).range);
    }
}
