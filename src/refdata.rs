// src/refdata.rs
//
// Read-only reference data the surrounding system injects: airport code
// resolution, country/zone tables and the date-aware price schedule. The
// core only ever calls the four trait methods; `StaticReferenceData` is an
// in-memory implementation with the same resolution semantics as the
// persisted tables (date-scoped price periods over a year-level default).

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Zone label that switches on the European half-day rules.
pub const ZONE_EUROPE: &str = "Europe";

/// Lookup contract consumed by the pipeline. All methods are infallible:
/// a miss degrades to identity (code resolution), `None` (country/zone) or
/// zero (price); the audit pass turns the gaps into diagnostics.
pub trait ReferenceData {
    /// Resolve a legacy 3-letter code to its 4-letter form. Identity when
    /// the code is already 4 letters or is unknown.
    fn resolve_airport_code(&self, code: &str) -> String;

    fn lookup_country(&self, prefix: &str) -> Option<String>;

    fn lookup_zone(&self, prefix: &str) -> Option<String>;

    /// Allowance per night for an airport prefix. Prefers the most recent
    /// entry with an effective date on or before `date` within `year`, then
    /// the year-level default, then zero.
    fn lookup_price(&self, prefix: &str, year: i32, date: NaiveDate) -> Decimal;
}

/// One priced period. `valid_from: None` is the year-level default used when
/// no dated entry covers the day in question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub prefix: String,
    pub year: i32,
    pub valid_from: Option<NaiveDate>,
    pub amount: Decimal,
}

/// Price schedule keyed by (prefix, year) with optional effective dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceBook {
    entries: Vec<PriceEntry>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, prefix: &str, year: i32, valid_from: Option<NaiveDate>, amount: Decimal) {
        self.entries.push(PriceEntry {
            prefix: prefix.to_string(),
            year,
            valid_from,
            amount,
        });
    }

    /// Resolution order: latest `valid_from <= date` for the (prefix, year),
    /// then the undated default for the same key, then zero.
    pub fn price_for(&self, prefix: &str, year: i32, date: NaiveDate) -> Decimal {
        let mut dated: Option<&PriceEntry> = None;
        let mut default: Option<&PriceEntry> = None;
        for entry in self
            .entries
            .iter()
            .filter(|e| e.prefix == prefix && e.year == year)
        {
            match entry.valid_from {
                Some(from) if from <= date => {
                    if dated.map_or(true, |best| best.valid_from < Some(from)) {
                        dated = Some(entry);
                    }
                }
                Some(_) => {}
                None => default = Some(entry),
            }
        }
        match dated.or(default) {
            Some(entry) => entry.amount,
            None => {
                debug!(prefix, year, %date, "no price configured");
                Decimal::ZERO
            }
        }
    }
}

/// In-memory reference tables, used by the test suites and by callers that
/// do not bring their own store.
#[derive(Debug, Clone, Default)]
pub struct StaticReferenceData {
    /// Legacy 3-letter code -> 4-letter code.
    airports: HashMap<String, String>,
    /// Prefix -> country name.
    countries: HashMap<String, String>,
    /// Prefix -> zone label.
    zones: HashMap<String, String>,
    prices: PriceBook,
}

impl StaticReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_airport(&mut self, legacy: &str, icao: &str) {
        self.airports.insert(legacy.to_string(), icao.to_string());
    }

    pub fn add_country(&mut self, prefix: &str, country: &str, zone: &str) {
        self.countries.insert(prefix.to_string(), country.to_string());
        self.zones.insert(prefix.to_string(), zone.to_string());
    }

    pub fn add_price(&mut self, prefix: &str, year: i32, amount: Decimal) {
        self.prices.add(prefix, year, None, amount);
    }

    pub fn add_price_from(&mut self, prefix: &str, year: i32, from: NaiveDate, amount: Decimal) {
        self.prices.add(prefix, year, Some(from), amount);
    }
}

impl ReferenceData for StaticReferenceData {
    fn resolve_airport_code(&self, code: &str) -> String {
        match self.airports.get(code) {
            Some(icao) => icao.clone(),
            None => code.to_string(),
        }
    }

    fn lookup_country(&self, prefix: &str) -> Option<String> {
        self.countries.get(prefix).cloned()
    }

    fn lookup_zone(&self, prefix: &str) -> Option<String> {
        self.zones.get(prefix).cloned()
    }

    fn lookup_price(&self, prefix: &str, year: i32, date: NaiveDate) -> Decimal {
        self.prices.price_for(prefix, year, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn dated_entry_preferred_over_year_default() {
        let mut book = PriceBook::new();
        book.add("LF", 2025, None, dec!(80));
        book.add("LF", 2025, Some(d("2025-03-01")), dec!(95));
        assert_eq!(book.price_for("LF", 2025, d("2025-06-10")), dec!(95));
        // Before the dated entry takes effect, the default applies.
        assert_eq!(book.price_for("LF", 2025, d("2025-02-01")), dec!(80));
    }

    #[test]
    fn latest_effective_dated_entry_wins() {
        let mut book = PriceBook::new();
        book.add("LF", 2025, Some(d("2025-01-01")), dec!(90));
        book.add("LF", 2025, Some(d("2025-07-01")), dec!(110));
        assert_eq!(book.price_for("LF", 2025, d("2025-08-15")), dec!(110));
        assert_eq!(book.price_for("LF", 2025, d("2025-04-01")), dec!(90));
    }

    #[test]
    fn missing_price_is_zero() {
        let book = PriceBook::new();
        assert_eq!(book.price_for("ZZ", 2025, d("2025-01-01")), Decimal::ZERO);
    }

    #[test]
    fn year_is_part_of_the_key() {
        let mut book = PriceBook::new();
        book.add("LF", 2024, None, dec!(70));
        assert_eq!(book.price_for("LF", 2025, d("2025-01-01")), Decimal::ZERO);
    }

    #[test]
    fn resolver_is_identity_on_unknown_codes() {
        let mut refdata = StaticReferenceData::new();
        refdata.add_airport("LYS", "LFLL");
        assert_eq!(refdata.resolve_airport_code("LYS"), "LFLL");
        assert_eq!(refdata.resolve_airport_code("LFLY"), "LFLY");
        assert_eq!(refdata.resolve_airport_code("XXX"), "XXX");
    }
}
