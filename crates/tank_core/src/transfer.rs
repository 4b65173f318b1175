//! Instantaneous transfer conversion model.
//!
//! Pure computation of the effect of pumping the source vessel down to a
//! chosen target: amount drawn, consumer gain, usable runtime, and an
//! optional replenishment batch chained after the primary runtime.

use chrono::NaiveDateTime;

use crate::format::clock_after;
use crate::parse::parse_decimal;
use crate::types::{
    BatchReport, ClockProjection, FloorPolicy, PairParams, PairState, RawPairInput, TransferError,
    TransferOutcome, TransferReport,
};

/// Compute the instantaneous effect of a transfer for one pair.
///
/// Check order: rate, then blocking floor, then target comparison. A source
/// already at or below the target is [`TransferOutcome::NotNeeded`], not an
/// error. When `now` is supplied the report carries projected wall-clock
/// expiry times for the primary runtime and, after it, the batch runtime.
pub fn plan_transfer(
    state: &PairState,
    params: &PairParams,
    now: Option<NaiveDateTime>,
) -> Result<TransferOutcome, TransferError> {
    if state.consumption_rate <= 0.0 {
        return Err(TransferError::NonPositiveRate);
    }

    if let Some(floor) = params.consumer_floor {
        if matches!(floor.policy, FloorPolicy::BlocksTransfer) && state.consumer_level < floor.level
        {
            return Err(TransferError::BelowMinimum {
                level: state.consumer_level,
                floor: floor.level,
            });
        }
    }

    let target = state.target.resolve();
    if state.source_level <= target {
        return Ok(TransferOutcome::NotNeeded { target });
    }

    let mut drawn = (state.source_level - target).max(0.0);
    if let Some(capacity) = params.source_capacity {
        drawn = drawn.min(capacity);
    }

    let gained = params.coefficient.convert(drawn);
    let final_consumer_level = state.consumer_level + gained;

    let usable_volume = match params.consumer_floor {
        Some(floor) if matches!(floor.policy, FloorPolicy::ReducesRuntime) => {
            (final_consumer_level - floor.level).max(0.0)
        }
        _ => final_consumer_level,
    };
    let runtime_hours = usable_volume / state.consumption_rate;

    let batch = state.batch.resolve().map(|size| {
        let converted = params.coefficient.convert(size);
        BatchReport {
            size_in_source_units: size,
            converted,
            runtime_hours: converted / state.consumption_rate,
        }
    });

    let clock = now.map(|anchor| {
        let primary_empty_at = clock_after(anchor, runtime_hours);
        ClockProjection {
            primary_empty_at,
            batch_empty_at: batch
                .as_ref()
                .map(|b| clock_after(primary_empty_at, b.runtime_hours)),
        }
    });

    Ok(TransferOutcome::Transferred(TransferReport {
        target,
        drawn_from_source: drawn,
        gained_in_consumer: gained,
        final_consumer_level,
        usable_volume,
        runtime_hours,
        batch,
        clock,
    }))
}

/// Validate raw form text and run [`plan_transfer`].
///
/// All three numeric fields are required; any missing or unparsable one is
/// [`TransferError::InvalidInput`]. Custom target/batch text is *not*
/// validated here — it resolves permissively inside the choice types.
pub fn plan_transfer_raw(
    raw: &RawPairInput,
    params: &PairParams,
    now: Option<NaiveDateTime>,
) -> Result<TransferOutcome, TransferError> {
    let source_level = parse_decimal(&raw.source_level).ok_or(TransferError::InvalidInput)?;
    let consumer_level = parse_decimal(&raw.consumer_level).ok_or(TransferError::InvalidInput)?;
    let consumption_rate =
        parse_decimal(&raw.consumption_rate).ok_or(TransferError::InvalidInput)?;

    let state = PairState {
        source_level,
        consumer_level,
        consumption_rate,
        target: raw.target.clone(),
        batch: raw.batch.clone(),
    };
    plan_transfer(&state, params, now)
}
