// src/normalize.rs
//
// Flight record normalization: required-column validation, legacy airport
// code resolution and date/time parsing. Rows with missing airports are a
// data-quality expectation and are dropped quietly; a column missing from
// the whole input is a hard validation failure.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{FlightLeg, RawFlightRecord};
use crate::refdata::ReferenceData;

/// Date format of the standard flight-log export.
const DATE_FORMAT: &str = "%d-%m-%Y";
/// Accepted as a fallback for callers feeding ISO dates directly.
const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("mandatory columns missing from the flight log: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },
}

/// Column names of the standard export, used in validation messages.
const MANDATORY_COLUMNS: [(&str, fn(&RawFlightRecord) -> bool); 5] = [
    ("Date", |r| r.date.is_some()),
    ("ADEP", |r| r.departure.is_some()),
    ("ADES", |r| r.arrival.is_some()),
    ("OFF", |r| r.off.is_some()),
    ("ON", |r| r.on.is_some()),
];

/// Validates and normalizes raw records into flight legs, in input order.
///
/// Fails only when a mandatory column is entirely absent. Individual rows
/// degrade instead: missing departure/arrival drops the row, an unparseable
/// date drops the row with a warning, unparseable times become `None` and
/// are excluded from every time-delta calculation downstream.
pub fn normalize<R: ReferenceData>(
    records: &[RawFlightRecord],
    refdata: &R,
) -> Result<Vec<FlightLeg>, ValidationError> {
    if !records.is_empty() {
        let missing: Vec<String> = MANDATORY_COLUMNS
            .iter()
            .filter(|(_, present)| !records.iter().any(|r| present(r)))
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingColumns { columns: missing });
        }
    }

    let mut legs = Vec::with_capacity(records.len());
    for record in records {
        let (Some(dep), Some(arr)) = (non_empty(&record.departure), non_empty(&record.arrival))
        else {
            debug!(?record, "dropping record without departure/arrival");
            continue;
        };
        let Some(date) = non_empty(&record.date).and_then(parse_date) else {
            warn!(?record.date, "dropping record with unparseable date");
            continue;
        };

        let (departure, original_departure) = resolve(dep, refdata);
        let (arrival, original_arrival) = resolve(arr, refdata);

        legs.push(FlightLeg {
            date,
            departure,
            arrival,
            off: non_empty(&record.off).and_then(parse_time),
            on: non_empty(&record.on).and_then(parse_time),
            flight_number: non_empty(&record.flight_number).map(str::to_string),
            original_departure,
            original_arrival,
        });
    }
    Ok(legs)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, DATE_FORMAT_ISO))
        .ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    match NaiveTime::parse_from_str(s, TIME_FORMAT) {
        Ok(t) => Some(t),
        Err(_) => {
            debug!(time = s, "unparseable time, treated as unknown");
            None
        }
    }
}

/// Legacy codes (shorter than 4 characters) go through the resolver; the
/// pre-resolution code is kept when the resolver changed it so reports can
/// show what the upload actually contained.
fn resolve<R: ReferenceData>(code: &str, refdata: &R) -> (String, Option<String>) {
    if code.chars().count() >= 4 {
        return (code.to_string(), None);
    }
    let resolved = refdata.resolve_airport_code(code);
    if resolved == code {
        (code.to_string(), None)
    } else {
        (resolved, Some(code.to_string()))
    }
}
