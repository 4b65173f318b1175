//! Time simulation engine.
//!
//! Projects both pairs forward with fixed-step consumption and snap
//! transfers. Every query replays from the initial state — there is no
//! current-time pointer and no cache, so queries are idempotent and safe
//! to issue out of order. A playback driver belongs to the caller.

use serde::{Deserialize, Serialize};

use crate::parse::parse_decimal;
use crate::types::{PairParams, RawPairInput, TransferError};

/// Default query-time ceiling, in hours.
pub const DEFAULT_HORIZON_HOURS: f64 = 48.0;

/// Integration step, in hours. Transfers snap with this resolution.
pub const TIME_STEP_HOURS: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub horizon_hours: f64,
    pub step_hours: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            horizon_hours: DEFAULT_HORIZON_HOURS,
            step_hours: TIME_STEP_HOURS,
        }
    }
}

/// Initial conditions for one pair: resolved levels, rate, and target.
///
/// The target is resolved at construction; rebuilding the simulation with a
/// different target yields a different trajectory for the same query time,
/// which is what makes "what if I'd chosen a different target" scrubbing
/// work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSim {
    pub params: PairParams,
    pub source_level: f64,
    pub consumer_level: f64,
    pub consumption_rate: f64,
    pub target: f64,
}

impl PairSim {
    /// Seed from the pair's built-in defaults and preferred preset target.
    pub fn seeded(params: PairParams) -> Self {
        let defaults = params.defaults;
        let target = params.default_target();
        Self {
            params,
            source_level: defaults.source_level,
            consumer_level: defaults.consumer_level,
            consumption_rate: defaults.consumption_rate,
            target,
        }
    }

    /// Seed from raw form text; each field that fails to parse falls back
    /// to the pair default rather than aborting the simulation.
    pub fn from_raw(params: PairParams, raw: &RawPairInput) -> Self {
        let defaults = params.defaults;
        let target = raw.target.resolve();
        Self {
            source_level: parse_decimal(&raw.source_level).unwrap_or(defaults.source_level),
            consumer_level: parse_decimal(&raw.consumer_level).unwrap_or(defaults.consumer_level),
            consumption_rate: parse_decimal(&raw.consumption_rate)
                .unwrap_or(defaults.consumption_rate),
            target,
            params,
        }
    }
}

/// Levels and transfer activity for one pair at the queried instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairSnapshot {
    pub source_level: f64,
    pub consumer_level: f64,
    /// Whether the snap fired in the *last* step evaluated — not whether a
    /// transfer occurred anywhere in `[0, t]`. Post-snap the consumer sits
    /// above its threshold again, so the flag drops on the next step.
    pub transfer_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub elapsed_hours: f64,
    pub pairs: Vec<PairSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pairs: Vec<PairSim>,
    config: SimConfig,
}

impl Simulation {
    pub fn new(pairs: Vec<PairSim>) -> Self {
        Self::with_config(pairs, SimConfig::default())
    }

    pub fn with_config(pairs: Vec<PairSim>, config: SimConfig) -> Self {
        Self { pairs, config }
    }

    pub fn config(&self) -> SimConfig {
        self.config
    }

    /// Pure replay from `t = 0`: fixed-step consumption, then the snap
    /// predicate per pair. The final partial step is clipped to land
    /// exactly on `t`.
    ///
    /// Snap semantics: once `consumer <= floor` and `source > target`, the
    /// whole deficit closes within that step (source set to the target,
    /// consumer gains the converted difference). Transfer completion time
    /// therefore has step-size resolution, deliberately not continuous.
    pub fn state_at(&self, t: f64) -> Result<Snapshot, TransferError> {
        if t < 0.0 || t > self.config.horizon_hours {
            return Err(TransferError::TimeOutOfRange {
                t,
                horizon: self.config.horizon_hours,
            });
        }

        let mut pairs: Vec<PairSnapshot> = self
            .pairs
            .iter()
            .map(|pair| PairSnapshot {
                source_level: pair.source_level,
                consumer_level: pair.consumer_level,
                transfer_active: false,
            })
            .collect();

        let mut elapsed = 0.0;
        while elapsed < t {
            let dt = self.config.step_hours.min(t - elapsed);
            for (pair, snap) in self.pairs.iter().zip(pairs.iter_mut()) {
                step_pair(pair, snap, dt);
            }
            elapsed += dt;
        }

        Ok(Snapshot {
            elapsed_hours: t,
            pairs,
        })
    }
}

fn step_pair(pair: &PairSim, snap: &mut PairSnapshot, dt: f64) {
    snap.consumer_level = (snap.consumer_level - pair.consumption_rate * dt).max(0.0);

    let threshold = pair.params.consumer_floor.map(|floor| floor.level);
    let fires = threshold.is_some_and(|level| snap.consumer_level <= level)
        && snap.source_level > pair.target;

    if fires {
        let deficit = snap.source_level - pair.target;
        snap.consumer_level += pair.params.coefficient.convert(deficit);
        snap.source_level = pair.target;
    }
    snap.transfer_active = fires;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    /// Depth pair with the consumer parked just above its 350 mm threshold
    /// and no batch concerns: crossing happens at t = 1/15 h.
    fn near_threshold_sim() -> Simulation {
        let mut pair = PairSim::seeded(PairParams::depth_gauged());
        pair.consumer_level = 351.0;
        Simulation::new(vec![pair])
    }

    #[test]
    fn zero_time_returns_initial_levels() {
        let sim = Simulation::new(vec![
            PairSim::seeded(PairParams::percent_gauged()),
            PairSim::seeded(PairParams::depth_gauged()),
        ]);
        let snap = sim.state_at(0.0).unwrap();
        assert_close(snap.pairs[0].consumer_level, 45.0, 1e-12);
        assert_close(snap.pairs[1].consumer_level, 200.0, 1e-12);
        assert!(snap.pairs.iter().all(|p| !p.transfer_active));
    }

    #[test]
    fn replay_is_idempotent() {
        let sim = near_threshold_sim();
        let first = sim.state_at(7.3).unwrap();
        let second = sim.state_at(7.3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn consumption_is_monotone_before_any_snap() {
        // Target pinned at the source level so the predicate never fires.
        let mut pair = PairSim::seeded(PairParams::depth_gauged());
        pair.target = pair.source_level;
        let sim = Simulation::new(vec![pair]);

        let mut previous = f64::INFINITY;
        for t in [0.0, 1.0, 2.5, 7.0, 20.0] {
            let level = sim.state_at(t).unwrap().pairs[0].consumer_level;
            assert!(level <= previous, "level rose from {previous} to {level}");
            previous = level;
        }
    }

    #[test]
    fn partial_final_step_is_clipped() {
        let sim = Simulation::new(vec![PairSim::seeded(PairParams::depth_gauged())]);
        let snap = sim.state_at(0.005).unwrap();
        assert_close(snap.pairs[0].consumer_level, 200.0 - 15.0 * 0.005, 1e-9);
    }

    #[test]
    fn snap_fires_only_on_the_crossing_step() {
        let sim = near_threshold_sim();

        // 351 − 15·t crosses 350 at t = 0.0667; the 0.06→0.07 step fires.
        let before = sim.state_at(0.06).unwrap().pairs[0];
        assert!(!before.transfer_active);

        let crossing = sim.state_at(0.07).unwrap().pairs[0];
        assert!(crossing.transfer_active);
        assert_close(crossing.source_level, 260.0, 1e-12);
        // Deficit 600 − 260 = 340 mm converts to 435.676 mm.
        assert!(crossing.consumer_level > 350.0);

        // One step later the consumer is far above threshold again.
        let after = sim.state_at(0.08).unwrap().pairs[0];
        assert!(!after.transfer_active);
    }

    #[test]
    fn query_outside_horizon_is_rejected() {
        let sim = near_threshold_sim();
        assert!(matches!(
            sim.state_at(-0.1),
            Err(TransferError::TimeOutOfRange { .. })
        ));
        assert!(matches!(
            sim.state_at(48.01),
            Err(TransferError::TimeOutOfRange { .. })
        ));
        assert!(sim.state_at(48.0).is_ok());
    }

    #[test]
    fn changing_the_target_changes_the_replayed_trajectory() {
        let mut low = PairSim::seeded(PairParams::depth_gauged());
        low.consumer_level = 351.0;
        let mut high = low.clone();
        high.target = 0.0;

        let at_low = Simulation::new(vec![low]).state_at(1.0).unwrap();
        let at_high = Simulation::new(vec![high]).state_at(1.0).unwrap();

        // Same instant, different resolved target, different levels.
        let delta =
            (at_low.pairs[0].consumer_level - at_high.pairs[0].consumer_level).abs();
        assert!(delta > 1.0, "trajectories should diverge, delta = {delta}");
    }

    #[test]
    fn consumer_never_goes_negative() {
        // Source pinned at the target so no refill can arrive.
        let mut pair = PairSim::seeded(PairParams::depth_gauged());
        pair.source_level = pair.target;
        let sim = Simulation::new(vec![pair]);

        let snap = sim.state_at(40.0).unwrap();
        assert_close(snap.pairs[0].consumer_level, 0.0, 1e-12);
    }

    #[test]
    fn raw_seeding_falls_back_to_pair_defaults() {
        use crate::types::{BatchChoice, RawPairInput, TargetChoice};

        let raw = RawPairInput {
            source_level: "not a number".to_string(),
            consumer_level: "410".to_string(),
            consumption_rate: String::new(),
            target: TargetChoice::Preset(260.0),
            batch: BatchChoice::None,
        };
        let pair = PairSim::from_raw(PairParams::depth_gauged(), &raw);
        assert_close(pair.source_level, 600.0, 1e-12);
        assert_close(pair.consumer_level, 410.0, 1e-12);
        assert_close(pair.consumption_rate, 15.0, 1e-12);
    }
}
