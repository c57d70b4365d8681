//! TOML strategy configuration.
//!
//! Every field has a default, so an empty document yields the reference
//! strategy: the layered tier table, a six-point upgrade reserve, five
//! reinforced hotspots and the lane oscillator without raids.

use std::{fs, path::Path};

use lane_defence_core::{arena, CellCoord, UnitKind};
use lane_defence_system_attack_scheduler::AttackConfig;
use lane_defence_system_build_planner::{
    Opening, PlacementTier, TierTable, DEFAULT_UPGRADE_RESERVE,
};
use lane_defence_system_reactive_defence::{DEFAULT_CORE_CELLS, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Built-in tier tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Corners first, then the centre.
    #[default]
    Layered,
    /// Compact turret line gated on core upgrades.
    Fortress,
}

impl Preset {
    /// Tier table the preset stands for.
    #[must_use]
    pub fn table(self) -> TierTable {
        match self {
            Preset::Layered => TierTable::layered(),
            Preset::Fortress => TierTable::fortress(),
        }
    }
}

/// `[planner]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Structure points required before a queued upgrade is attempted.
    pub upgrade_reserve: f32,
    /// Built-in table used when `tiers` is absent.
    pub preset: Preset,
    /// Explicit tiers replacing the preset.
    pub tiers: Option<Vec<PlacementTier>>,
    /// Explicit opening. Replaces the preset's opening.
    pub opening: Option<Opening>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            upgrade_reserve: DEFAULT_UPGRADE_RESERVE,
            preset: Preset::default(),
            tiers: None,
            opening: None,
        }
    }
}

/// `[reactive]` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactiveConfig {
    /// Hotspots reinforced each turn.
    pub top_k: usize,
    /// Cells breached lanes are checked against.
    pub core_cells: Vec<CellCoord>,
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            core_cells: DEFAULT_CORE_CELLS.to_vec(),
        }
    }
}

/// Complete strategy configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Build planner settings.
    pub planner: PlannerConfig,
    /// Reactive defence settings.
    pub reactive: ReactiveConfig,
    /// Attack scheduler settings.
    pub attack: AttackConfig,
}

/// Errors raised while loading a strategy.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read strategy file {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid TOML for this schema.
    #[error("strategy is not valid: {0}")]
    Parse(#[from] toml::de::Error),
    /// The attack launches a stationary kind.
    #[error("attack spawn kind {0:?} is not a mobile unit")]
    StationarySpawn(UnitKind),
    /// A divisor of zero would make every harassing wave undefined.
    #[error("harass divisor must be at least one")]
    ZeroHarassDivisor,
    /// The upgrade reserve is negative or not a number.
    #[error("upgrade reserve {0} must be a non-negative number")]
    InvalidReserve(f32),
    /// A build cell lies outside the own half of the arena.
    #[error("build cell {0:?} lies outside the own half")]
    CellOutsideOwnHalf(CellCoord),
}

impl StrategyConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Checks the values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.attack.spawn_kind.is_mobile() {
            return Err(ConfigError::StationarySpawn(self.attack.spawn_kind));
        }
        if self.attack.harass_divisor == 0 {
            return Err(ConfigError::ZeroHarassDivisor);
        }
        let reserve = self.planner.upgrade_reserve;
        if !reserve.is_finite() || reserve < 0.0 {
            return Err(ConfigError::InvalidReserve(reserve));
        }

        let table = self.tier_table();
        let opening = table.opening().cloned().unwrap_or_default();
        let build_cells = table
            .tiers()
            .iter()
            .flat_map(|tier| {
                tier.turrets
                    .iter()
                    .chain(&tier.walls)
                    .chain(&tier.supports)
                    .chain(&tier.upgrades)
            })
            .chain(&opening.turrets)
            .chain(&opening.supports);
        for cell in build_cells {
            if !arena::contains(*cell) || cell.y() >= arena::HALF_ARENA {
                return Err(ConfigError::CellOutsideOwnHalf(*cell));
            }
        }
        Ok(())
    }

    /// Tier table described by the `[planner]` section.
    #[must_use]
    pub fn tier_table(&self) -> TierTable {
        match &self.planner.tiers {
            Some(tiers) => TierTable::new(tiers.clone(), self.planner.opening.clone()),
            None => {
                let preset = self.planner.preset.table();
                let opening = self
                    .planner
                    .opening
                    .clone()
                    .or_else(|| preset.opening().cloned());
                TierTable::new(preset.tiers().to_vec(), opening)
            }
        }
    }
}
