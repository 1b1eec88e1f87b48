// src/model.rs
//
// Core data structures shared by every pipeline stage. Input records are
// loose bags of optional strings (whatever the upload layer scraped out of a
// flight log); everything downstream works on the typed forms defined here.

use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::audit::Diagnostic;

/// One raw line of a flight log, before any validation. Every field is
/// optional: missing columns are detected by the normalizer, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFlightRecord {
    pub date: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub off: Option<String>,
    pub on: Option<String>,
    pub flight_number: Option<String>,
}

/// A normalized flight leg. Airport codes have been through the resolver
/// (legacy 3-letter codes upgraded where the reference data knows them);
/// malformed off/on times are `None` and count as zero-duration gaps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightLeg {
    pub date: NaiveDate,
    pub departure: String,
    pub arrival: String,
    pub off: Option<NaiveTime>,
    pub on: Option<NaiveTime>,
    pub flight_number: Option<String>,
    /// Pre-resolution code, kept when the resolver changed it.
    pub original_departure: Option<String>,
    pub original_arrival: Option<String>,
}

impl FlightLeg {
    /// Sort key within the whole log: date, then departure time with
    /// unparseable times ordered first.
    pub(crate) fn sort_key(&self) -> (NaiveDate, Option<NaiveTime>) {
        (self.date, self.off)
    }
}

/// Rotation identifier, assigned in first-flight chronological order.
/// Rendered as `ROT001`, `ROT002`, ... and never reused once closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RotationId(pub u32);

impl fmt::Display for RotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ROT{:03}", self.0)
    }
}

impl Serialize for RotationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Flight number shown on synthesized rows.
pub const NO_FLIGHT_LABEL: &str = "No-flight day";

/// One row of the enriched output table: a real flight, or a synthesized
/// no-flight day inside a rotation's span. Indemnity fields stay `None`
/// until the calculator assigns them (at most one assignment per day).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRow {
    pub rotation: Option<RotationId>,
    pub date: NaiveDate,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub off: Option<NaiveTime>,
    pub on: Option<NaiveTime>,
    pub flight_number: Option<String>,
    pub no_flight_day: bool,
    pub indemnity: Option<Decimal>,
    pub zone: Option<String>,
    pub country: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DayRow {
    pub(crate) fn from_leg(rotation: Option<RotationId>, leg: FlightLeg) -> Self {
        Self {
            rotation,
            date: leg.date,
            departure: Some(leg.departure),
            arrival: Some(leg.arrival),
            off: leg.off,
            on: leg.on,
            flight_number: leg.flight_number,
            no_flight_day: false,
            indemnity: None,
            zone: None,
            country: None,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn no_flight(rotation: RotationId, date: NaiveDate) -> Self {
        Self {
            rotation: Some(rotation),
            date,
            departure: None,
            arrival: None,
            off: None,
            on: None,
            flight_number: None,
            no_flight_day: true,
            indemnity: None,
            zone: None,
            country: None,
            diagnostics: Vec::new(),
        }
    }

    /// Table sort order: unassigned rows first, then by rotation, date and
    /// departure time (no-flight rows have no time and sort first in a day).
    pub(crate) fn sort_key(&self) -> (Option<RotationId>, NaiveDate, Option<NaiveTime>) {
        (self.rotation, self.date, self.off)
    }

    /// Caller-facing rendering of the diagnostics, `" | "`-separated as in
    /// the exported reports. `None` when the row is clean.
    pub fn diagnostic_summary(&self) -> Option<String> {
        crate::audit::render_diagnostics(&self.diagnostics)
    }
}

/// First two characters of an airport code, the key for country, zone and
/// price lookups. Empty when the code is too short.
pub fn icao_prefix(code: &str) -> &str {
    code.get(..2).unwrap_or("")
}

/// Configured home bases. The order of `bases` is preserved (it is the order
/// the operator entered them in); `swing` is the subset allowed to carry an
/// open rotation across a midnight boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseConfig {
    bases: Vec<String>,
    swing: HashSet<String>,
}

impl BaseConfig {
    pub fn new<B, S>(bases: B, swing: S) -> Self
    where
        B: IntoIterator,
        B::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let mut seen = HashSet::new();
        let bases = bases
            .into_iter()
            .map(Into::into)
            .filter(|b| seen.insert(b.clone()))
            .collect();
        Self {
            bases,
            swing: swing.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_base(&self, code: &str) -> bool {
        self.bases.iter().any(|b| b == code)
    }

    pub fn is_swing(&self, code: &str) -> bool {
        self.swing.contains(code)
    }

    pub fn bases(&self) -> &[String] {
        &self.bases
    }
}
