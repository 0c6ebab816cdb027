use crate::domain::model::{RoundingSpec, Timestamp, Unit};
use crate::utils::error::Result;

/// Rounds `timestamp` to the granularity described by `spec`.
///
/// The anchor is the coarsest unit set in `spec`. Units at or finer than the anchor take the
/// override when one is given and are reset to their minimum otherwise; units coarser than the
/// anchor keep their original value. An empty spec returns the input unchanged.
///
/// Fails with [`crate::RoundingError::InvalidDate`] when the resolved components are not a
/// calendar date-time, e.g. `day = 31` on a 30-day month. Nothing is clamped.
pub fn round(timestamp: &Timestamp, spec: &RoundingSpec) -> Result<Timestamp> {
    let Some(anchor) = spec.anchor() else {
        return Ok(*timestamp);
    };

    let parts = Unit::ALL.map(|unit| match spec.get(unit) {
        Some(value) => value,
        None if unit > anchor => unit.minimum(),
        None => timestamp.get(unit),
    });

    Timestamp::from_parts(parts)
}

/// A rounding spec bound once and applied to many rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRounder {
    spec: RoundingSpec,
}

impl DateRounder {
    pub fn new(spec: RoundingSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &RoundingSpec {
        &self.spec
    }

    pub fn round(&self, timestamp: &Timestamp) -> Result<Timestamp> {
        round(timestamp, &self.spec)
    }
}
