// src/lib.rs
//
//! Per-diem crew allowance engine.
//!
//! Takes a chronological flight log plus a home-base configuration and
//! produces a day-by-day table of indemnities: flights are grouped into
//! rotations, every calendar day of a rotation gets a night-stop airport,
//! the date-aware allowance for that airport is resolved through injected
//! reference data, and the trip-length/zone/layover rules are applied. A
//! final audit pass annotates every lookup gap with a structured
//! diagnostic; diagnostics never change an amount.
//!
//! The crate owns no I/O and no persistence. The caller provides the
//! lookup tables (see [`ReferenceData`]) and does whatever it wants with
//! the returned [`DayRow`] table: summaries, exports, UI payloads.

mod audit;
mod dayfill;
mod indemnity;
pub mod ingest;
mod model;
mod normalize;
mod refdata;
mod segment;

pub use audit::{CodeField, Diagnostic};
pub use ingest::{read_flight_log, IngestError};
pub use model::{
    icao_prefix, BaseConfig, DayRow, FlightLeg, RawFlightRecord, RotationId, NO_FLIGHT_LABEL,
};
pub use normalize::{normalize, ValidationError};
pub use refdata::{PriceBook, PriceEntry, ReferenceData, StaticReferenceData, ZONE_EUROPE};

use tracing::info;

/// Runs the pipeline over already normalized flight legs: segmentation,
/// day-gap synthesis, indemnity calculation and the audit pass.
pub fn compute_allowances<R: ReferenceData>(
    legs: Vec<FlightLeg>,
    config: &BaseConfig,
    refdata: &R,
) -> Vec<DayRow> {
    info!(flights = legs.len(), "computing per-diem allowances");
    let assigned = segment::segment(legs, config);
    let mut rows = dayfill::build_table(assigned);
    indemnity::compute_indemnities(&mut rows, refdata);
    audit::audit(&mut rows);
    rows
}

/// Full pipeline from raw records. Fails only when a mandatory column is
/// entirely missing from the input; every other anomaly degrades to a
/// dropped row, an empty value or a row-level diagnostic.
pub fn process_flight_log<R: ReferenceData>(
    records: &[RawFlightRecord],
    config: &BaseConfig,
    refdata: &R,
) -> Result<Vec<DayRow>, ValidationError> {
    let legs = normalize::normalize(records, refdata)?;
    Ok(compute_allowances(legs, config, refdata))
}
