//! Type definitions for `tank_core`.
//!
//! Pair parameters, caller-owned state, structured outcomes, and the error
//! taxonomy shared by the conversion model and the simulation engine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::parse::parse_decimal;

// ---------------------------------------------------------------------------
// Pair parameters
// ---------------------------------------------------------------------------

/// Transfer ratio between a source and consumer vessel.
///
/// The two pairs express the ratio in inverse conventions; keeping both
/// variants explicit avoids ever flipping a multiplication into a division
/// by accident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Coefficient {
    /// Consumer units gained per source unit drawn (multiply).
    ConsumerPerSource(f64),
    /// Source units drawn per consumer unit gained (divide).
    SourcePerConsumer(f64),
}

impl Coefficient {
    /// Convert an amount drawn from the source into consumer units.
    pub fn convert(self, source_amount: f64) -> f64 {
        match self {
            Coefficient::ConsumerPerSource(ratio) => source_amount * ratio,
            Coefficient::SourcePerConsumer(ratio) => source_amount / ratio,
        }
    }
}

/// What the consumer-vessel floor means for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloorPolicy {
    /// Hard minimum: a transfer is refused while the consumer sits below it.
    BlocksTransfer,
    /// Dead volume: liquid below it is unusable, reducing runtime only.
    ReducesRuntime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsumerFloor {
    pub level: f64,
    pub policy: FloorPolicy,
}

/// Fallback levels used when raw text fails to parse at simulation seeding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairDefaults {
    pub source_level: f64,
    pub consumer_level: f64,
    pub consumption_rate: f64,
}

/// Immutable constants for one source → consumer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairParams {
    pub label: String,
    pub source_unit: String,
    pub consumer_unit: String,
    pub coefficient: Coefficient,
    /// Selectable depletion targets for the source vessel, preferred first.
    pub preset_targets: Vec<f64>,
    /// Selectable replenishment-batch sizes, in source-vessel units.
    pub preset_batches: Vec<f64>,
    /// Ceiling on the amount drawn in a single transfer, if any.
    pub source_capacity: Option<f64>,
    pub consumer_floor: Option<ConsumerFloor>,
    pub defaults: PairDefaults,
}

impl PairParams {
    /// Percent-gauged consumer refilled from a depth-gauged source.
    ///
    /// Coefficient from observed refills: drawing 382 mm from the source
    /// raised the consumer by 38 %, i.e. ~10.05 mm per percent.
    pub fn percent_gauged() -> Self {
        let mm_per_percent = 382.0 / 38.0;
        Self {
            label: "percent".to_string(),
            source_unit: "mm".to_string(),
            consumer_unit: "%".to_string(),
            coefficient: Coefficient::SourcePerConsumer(mm_per_percent),
            preset_targets: vec![160.0, 0.0],
            preset_batches: vec![382.0, 600.0, 900.0],
            source_capacity: Some(634.0),
            consumer_floor: Some(ConsumerFloor {
                level: 30.0,
                policy: FloorPolicy::BlocksTransfer,
            }),
            defaults: PairDefaults {
                source_level: 500.0,
                consumer_level: 45.0,
                consumption_rate: 2.5,
            },
        }
    }

    /// Depth-gauged consumer refilled from a depth-gauged source.
    ///
    /// Coefficient from observed refills: the source dropped 427 → 260 mm
    /// (−167) while the consumer rose 360 → 574 mm (+214); 214 / 167 ≈ 1.2814.
    pub fn depth_gauged() -> Self {
        Self {
            label: "depth".to_string(),
            source_unit: "mm".to_string(),
            consumer_unit: "mm".to_string(),
            coefficient: Coefficient::ConsumerPerSource(1.2814),
            preset_targets: vec![260.0, 0.0],
            preset_batches: vec![300.0, 600.0, 900.0],
            source_capacity: None,
            consumer_floor: Some(ConsumerFloor {
                level: 350.0,
                policy: FloorPolicy::ReducesRuntime,
            }),
            defaults: PairDefaults {
                source_level: 600.0,
                consumer_level: 200.0,
                consumption_rate: 15.0,
            },
        }
    }

    /// The preferred preset target (first in the list).
    pub fn default_target(&self) -> f64 {
        self.preset_targets.first().copied().unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Target and batch selection
// ---------------------------------------------------------------------------

/// Source depletion target: a preset chip or custom text.
///
/// Custom text that fails to parse resolves to `fallback` (the previously
/// selected value) instead of erroring. Permissive by contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetChoice {
    Preset(f64),
    Custom { raw: String, fallback: f64 },
}

impl TargetChoice {
    pub fn resolve(&self) -> f64 {
        match self {
            TargetChoice::Preset(value) => *value,
            TargetChoice::Custom { raw, fallback } => parse_decimal(raw).unwrap_or(*fallback),
        }
    }
}

/// Optional replenishment batch, in source-vessel units.
///
/// Custom text follows the same permissive fallback as [`TargetChoice`];
/// `None` and non-positive sizes disable the batch branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BatchChoice {
    None,
    Preset(f64),
    Custom { raw: String, fallback: Option<f64> },
}

impl BatchChoice {
    pub fn resolve(&self) -> Option<f64> {
        let size = match self {
            BatchChoice::None => return None,
            BatchChoice::Preset(value) => *value,
            BatchChoice::Custom { raw, fallback } => match parse_decimal(raw) {
                Some(value) => value,
                None => (*fallback)?,
            },
        };
        (size > 0.0).then_some(size)
    }
}

// ---------------------------------------------------------------------------
// Caller-owned state
// ---------------------------------------------------------------------------

/// Validated levels and selections for one pair. Value object: the engine
/// never mutates it, every computation replays from a copy of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairState {
    pub source_level: f64,
    pub consumer_level: f64,
    pub consumption_rate: f64,
    pub target: TargetChoice,
    pub batch: BatchChoice,
}

/// Raw text captured from an input form, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPairInput {
    pub source_level: String,
    pub consumer_level: String,
    pub consumption_rate: String,
    pub target: TargetChoice,
    pub batch: BatchChoice,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of an instantaneous transfer calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransferOutcome {
    /// Source already at or below the chosen target; nothing to pump.
    /// Distinct from an error — carries the resolved target for display.
    NotNeeded { target: f64 },
    Transferred(TransferReport),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReport {
    /// Resolved depletion target, after any custom override.
    pub target: f64,
    pub drawn_from_source: f64,
    pub gained_in_consumer: f64,
    pub final_consumer_level: f64,
    /// Volume above the dead-volume floor; equals the final level for pairs
    /// without one.
    pub usable_volume: f64,
    pub runtime_hours: f64,
    pub batch: Option<BatchReport>,
    /// Present when the caller supplied a clock anchor.
    pub clock: Option<ClockProjection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub size_in_source_units: f64,
    pub converted: f64,
    pub runtime_hours: f64,
}

/// Wall-clock instants at which runtimes expire. The batch runtime is
/// chained after the primary one, never concurrent with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockProjection {
    pub primary_empty_at: NaiveDateTime,
    pub batch_empty_at: Option<NaiveDateTime>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Typed error outcomes. Returned, never panicked, and never accompanied by
/// partial results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransferError {
    /// A required numeric field was missing or failed to parse.
    InvalidInput,
    /// Consumption rate was zero or negative.
    NonPositiveRate,
    /// Consumer sits below a hard-blocking floor; the transfer is refused.
    BelowMinimum { level: f64, floor: f64 },
    /// Simulation query time outside `[0, horizon]`.
    TimeOutOfRange { t: f64, horizon: f64 },
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferError::InvalidInput => {
                write!(f, "source level, consumer level and rate must all be numbers")
            }
            TransferError::NonPositiveRate => write!(f, "consumption rate must be > 0"),
            TransferError::BelowMinimum { level, floor } => {
                write!(f, "consumer at {level}, below the minimum {floor}; transfer refused")
            }
            TransferError::TimeOutOfRange { t, horizon } => {
                write!(f, "query time {t} h outside [0, {horizon}] h")
            }
        }
    }
}

impl std::error::Error for TransferError {}
