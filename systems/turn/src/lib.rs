#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn orchestration.
//!
//! The [`TurnDirector`] owns every decision system and drives them once per
//! turn against a [`MatchEngine`]. Execution follows a fixed order so later
//! categories see the resources earlier categories left behind: queued
//! upgrades, tiered builds, reactive walls, then the attack launch. The turn
//! is always committed, even when the snapshot is unusable.

mod config;

pub use config::{ConfigError, PlannerConfig, Preset, ReactiveConfig, StrategyConfig};

use lane_defence_core::{
    dispatch, ActionFrame, CellCoord, FrameError, Issued, MatchEngine, Side, UnitCatalog,
};
use lane_defence_system_attack_scheduler::{AttackMode, AttackScheduler};
use lane_defence_system_build_planner::BuildPlanner;
use lane_defence_system_reactive_defence::ReactiveDefence;
use lane_defence_system_threat::{LaunchRisk, ThreatEstimator};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Stage of the per-turn state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Waiting for the engine's snapshot. Action frames are accepted here.
    AwaitSnapshot,
    /// Reading the snapshot and deciding.
    Plan,
    /// Issuing directives.
    Execute,
    /// Submitting the turn.
    Commit,
}

/// Record of everything the director did during one turn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnReport {
    /// Turn number taken from the snapshot.
    pub turn: u32,
    /// Reason the Execute phase was skipped, if it was.
    pub aborted: Option<String>,
    /// Whether placements held structure points back this turn.
    pub save: bool,
    /// Queued upgrades popped.
    pub drained: usize,
    /// Turrets added to the upgrade queue.
    pub enqueued: usize,
    /// Priority of the tier whose gate stopped the walk.
    pub gated_at: Option<u32>,
    /// Turrets still waiting for an upgrade after the turn.
    pub pending_upgrades: usize,
    /// Damage hotspots reinforced.
    pub hotspots: Vec<CellCoord>,
    /// Breached lanes found open to the core.
    pub open_lanes: Vec<CellCoord>,
    /// How the launch was decided. Absent on aborted turns.
    pub attack: Option<AttackMode>,
    /// Whether the opponent lost health since the previous launch.
    pub scored: bool,
    /// Lane after the decision.
    pub side: Side,
    /// Least risky raid candidate, when the raid window was open.
    pub raid: Option<LaunchRisk>,
    /// Directives in issue order with their outcomes.
    pub issued: Vec<Issued>,
}

impl TurnReport {
    fn empty(turn: u32, side: Side) -> Self {
        Self {
            turn,
            aborted: None,
            save: false,
            drained: 0,
            enqueued: 0,
            gated_at: None,
            pending_upgrades: 0,
            hotspots: Vec::new(),
            open_lanes: Vec::new(),
            attack: None,
            scored: false,
            side,
            raid: None,
            issued: Vec::new(),
        }
    }

    /// Total units placed, upgraded or spawned.
    #[must_use]
    pub fn affected(&self) -> u32 {
        self.issued.iter().map(|issued| issued.affected).sum()
    }
}

/// Drives the decision systems through one turn at a time.
#[derive(Debug)]
pub struct TurnDirector {
    phase: TurnPhase,
    threat: ThreatEstimator,
    planner: BuildPlanner,
    reactive: ReactiveDefence,
    attack: AttackScheduler,
}

impl TurnDirector {
    /// Creates a director for the provided catalog and strategy.
    #[must_use]
    pub fn new(catalog: UnitCatalog, strategy: &StrategyConfig) -> Self {
        Self {
            phase: TurnPhase::AwaitSnapshot,
            threat: ThreatEstimator::new(catalog),
            planner: BuildPlanner::new(strategy.tier_table(), strategy.planner.upgrade_reserve),
            reactive: ReactiveDefence::new(
                strategy.reactive.top_k,
                strategy.reactive.core_cells.clone(),
            ),
            attack: AttackScheduler::new(strategy.attack.clone()),
        }
    }

    /// Current phase. Always [`TurnPhase::AwaitSnapshot`] between turns.
    #[must_use]
    pub const fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Build planner and its pending upgrades.
    #[must_use]
    pub fn planner(&self) -> &BuildPlanner {
        &self.planner
    }

    /// Breach and damage history.
    #[must_use]
    pub fn reactive(&self) -> &ReactiveDefence {
        &self.reactive
    }

    /// Attack scheduler and its carried lane state.
    #[must_use]
    pub fn attack(&self) -> &AttackScheduler {
        &self.attack
    }

    /// Plans, executes and commits the engine's current turn.
    pub fn on_turn<E>(&mut self, engine: &mut E) -> TurnReport
    where
        E: MatchEngine + ?Sized,
    {
        self.phase = TurnPhase::AwaitSnapshot;
        let turn = engine.grid().turn();
        let mut report = TurnReport::empty(turn, self.attack.state().side);

        if let Err(error) = engine.grid().validate() {
            warn!(turn, %error, "snapshot rejected, committing an empty turn");
            report.aborted = Some(error.to_string());
            self.commit(engine, &mut report);
            return report;
        }

        self.phase = TurnPhase::Plan;
        let raid = match self.attack.raid_candidates(engine.grid()) {
            Some(candidates) => {
                let candidates = candidates.to_vec();
                self.threat.least_risk(engine, &candidates)
            }
            None => {
                self.threat.refresh(engine);
                None
            }
        };
        let attack = self.attack.plan(engine.grid(), raid.map(|risk| risk.cell));
        debug!(turn, mode = ?attack.mode, directives = attack.directives.len(), "attack planned");

        self.phase = TurnPhase::Execute;
        let build = self.planner.handle(engine, &mut report.issued);
        let reinforcements = self.reactive.handle(engine, build.save, &mut report.issued);
        for directive in attack.directives {
            let _ = dispatch(engine, directive, &mut report.issued);
        }

        report.save = build.save;
        report.drained = build.drained;
        report.enqueued = build.enqueued;
        report.gated_at = build.gated_at;
        report.hotspots = reinforcements.hotspots;
        report.open_lanes = reinforcements.open_lanes;
        report.attack = Some(attack.mode);
        report.scored = attack.scored;
        report.side = attack.side;
        report.raid = raid;

        self.commit(engine, &mut report);
        report
    }

    /// Feeds a decoded action frame into the breach history.
    ///
    /// Returns the number of breaches recorded.
    pub fn on_action_frame(&mut self, frame: &ActionFrame) -> usize {
        if self.phase != TurnPhase::AwaitSnapshot {
            warn!(phase = ?self.phase, "action frame delivered mid-turn, ignoring");
            return 0;
        }
        self.reactive.on_action_frame(frame)
    }

    /// Decodes a raw action frame and records its breaches.
    ///
    /// Undecodable frames leave every structure untouched.
    pub fn on_action_frame_str(&mut self, raw: &str) -> Result<usize, FrameError> {
        match ActionFrame::decode(raw) {
            Ok(frame) => Ok(self.on_action_frame(&frame)),
            Err(error) => {
                warn!(%error, "dropping malformed action frame");
                Err(error)
            }
        }
    }

    fn commit<E>(&mut self, engine: &mut E, report: &mut TurnReport)
    where
        E: MatchEngine + ?Sized,
    {
        self.phase = TurnPhase::Commit;
        engine.submit();
        report.pending_upgrades = self.planner.queue().len();
        info!(
            turn = report.turn,
            directives = report.issued.len(),
            affected = report.affected(),
            pending_upgrades = report.pending_upgrades,
            attack = ?report.attack,
            aborted = report.aborted.is_some(),
            "turn committed"
        );
        self.phase = TurnPhase::AwaitSnapshot;
    }
}
