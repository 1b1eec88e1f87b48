// src/audit.rs
//
// Second pass over the fully computed table. Diagnostics are advisory only:
// they never change an indemnity, they just explain lookup gaps so the
// caller can surface them next to the affected row. Classification is an
// enum with structured context; rendering to text is kept separate so the
// caller can localize if it wants to.

use std::fmt;

use chrono::Datelike;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{icao_prefix, DayRow};

/// Which airport column a code-level diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodeField {
    Departure,
    Arrival,
}

impl fmt::Display for CodeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeField::Departure => write!(f, "ADEP"),
            CodeField::Arrival => write!(f, "ADES"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum Diagnostic {
    #[error("legacy code not converted: {field} '{code}' - airport missing from the reference data")]
    UnresolvedLegacyCode { field: CodeField, code: String },
    #[error("prefix '{prefix}' (from {airport}) not found in the country table")]
    UnknownCountry { prefix: String, airport: String },
    #[error("no zone defined for prefix '{prefix}'")]
    UnknownZone { prefix: String },
    #[error("no price configured for {country} ({prefix}) in {year}")]
    MissingPrice {
        country: String,
        prefix: String,
        year: i32,
    },
}

/// Joins diagnostics with the separator used in the exported reports.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> Option<String> {
    if diagnostics.is_empty() {
        return None;
    }
    Some(
        diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" | "),
    )
}

/// Rescans the table and attaches diagnostics. An unconverted legacy code
/// takes precedence over every other condition on the same row.
pub fn audit(rows: &mut [DayRow]) {
    let mut flagged = 0usize;
    for row in rows.iter_mut() {
        let mut legacy = Vec::new();
        for (field, code) in [
            (CodeField::Departure, row.departure.as_deref()),
            (CodeField::Arrival, row.arrival.as_deref()),
        ] {
            if let Some(code) = code {
                let code = code.trim();
                if code.len() == 3 {
                    legacy.push(Diagnostic::UnresolvedLegacyCode {
                        field,
                        code: code.to_string(),
                    });
                }
            }
        }
        if !legacy.is_empty() {
            debug!(date = %row.date, ?legacy, "unresolved legacy code on row");
            row.diagnostics.extend(legacy);
            flagged += 1;
            continue;
        }

        let Some(amount) = row.indemnity else { continue };
        let Some(airport) = row.arrival.as_deref() else { continue };
        let prefix = icao_prefix(airport);

        if !amount.is_zero() {
            if row.country.as_deref().map_or(true, str::is_empty) {
                row.diagnostics.push(Diagnostic::UnknownCountry {
                    prefix: prefix.to_string(),
                    airport: airport.to_string(),
                });
            }
            if row.zone.as_deref().map_or(true, str::is_empty) {
                row.diagnostics.push(Diagnostic::UnknownZone {
                    prefix: prefix.to_string(),
                });
            }
        } else if let Some(country) = row.country.as_deref().filter(|c| !c.is_empty()) {
            row.diagnostics.push(Diagnostic::MissingPrice {
                country: country.to_string(),
                prefix: prefix.to_string(),
                year: row.date.year(),
            });
        }
        if !row.diagnostics.is_empty() {
            flagged += 1;
        }
    }
    info!(rows = rows.len(), flagged, "audit pass finished");
}
