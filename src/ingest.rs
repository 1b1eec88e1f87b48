// src/ingest.rs
//
// CSV flight-log decoding. Two layouts exist in the wild: the standard
// export (`Date`, `ADEP`, `ADES`, `OFF`, `ON`, `Flight No.`) and the
// LogBook export (`flightDate`, `from`, `to`, `takeoffTime`, `landingTime`,
// `flightNumber`), whose dates and times need reshaping. This module only
// transforms bytes into raw records; opening files is the caller's job, and
// the normalizer performs all validation.

use std::io::Read;

use chrono::NaiveDate;
use csv::StringRecord;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::RawFlightRecord;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read flight log: {0}")]
    Csv(#[from] csv::Error),
}

/// Column positions for one of the two known layouts.
struct Layout {
    date: Option<usize>,
    departure: Option<usize>,
    arrival: Option<usize>,
    off: Option<usize>,
    on: Option<usize>,
    flight_number: Option<usize>,
    logbook: bool,
}

impl Layout {
    fn detect(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        if find("flightDate").is_some() && find("from").is_some() {
            debug!("LogBook layout detected");
            Self {
                date: find("flightDate"),
                departure: find("from"),
                arrival: find("to"),
                off: find("takeoffTime"),
                on: find("landingTime"),
                flight_number: find("flightNumber"),
                logbook: true,
            }
        } else {
            Self {
                date: find("Date"),
                departure: find("ADEP"),
                arrival: find("ADES"),
                off: find("OFF"),
                on: find("ON"),
                flight_number: find("Flight No."),
                logbook: false,
            }
        }
    }
}

/// Reads a CSV flight log into raw records. Missing columns simply yield
/// `None` fields; the normalizer decides whether that is fatal.
pub fn read_flight_log<R: Read>(reader: R) -> Result<Vec<RawFlightRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let layout = Layout::detect(csv_reader.headers()?);

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let date = if layout.logbook {
            field(layout.date).map(|d| convert_logbook_date(&d))
        } else {
            field(layout.date)
        };
        let (off, on) = if layout.logbook {
            (
                field(layout.off).map(|t| extract_time(&t)),
                field(layout.on).map(|t| extract_time(&t)),
            )
        } else {
            (field(layout.off), field(layout.on))
        };
        records.push(RawFlightRecord {
            date,
            departure: field(layout.departure),
            arrival: field(layout.arrival),
            off,
            on,
            flight_number: field(layout.flight_number),
        });
    }
    info!(rows = records.len(), "flight log read");
    Ok(records)
}

/// LogBook dates come as `2025/01/03`; the standard layout (and the
/// normalizer) expect `03-01-2025`. Unrecognized values pass through so the
/// normalizer can report them.
fn convert_logbook_date(value: &str) -> String {
    match NaiveDate::parse_from_str(value, "%Y/%m/%d") {
        Ok(date) => date.format("%d-%m-%Y").to_string(),
        Err(_) => value.to_string(),
    }
}

/// LogBook times are full datetimes (`2025/01/03 14:02`); keep the time part.
fn extract_time(value: &str) -> String {
    match value.split_once(' ') {
        Some((_, time)) => time.to_string(),
        None => value.to_string(),
    }
}
