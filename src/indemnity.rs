// src/indemnity.rs
//
// Per-rotation indemnity rules: same-day extended-layover detection,
// night-stop attribution for every day but the last, no-flight-day
// inheritance and the last-day half/full/override rule. Each rotation is
// computed over its own contiguous slice of the table; nothing reaches
// across rotations.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::model::{icao_prefix, DayRow, NO_FLIGHT_LABEL};
use crate::refdata::{ReferenceData, ZONE_EUROPE};

/// Same-day gap, in hours, that makes a stop an extended layover.
const EXTENDED_LAYOVER_HOURS: i64 = 7;

/// One resolved (amount, zone, country) triple, ready to write to a row.
#[derive(Debug, Clone, PartialEq)]
struct Assignment {
    amount: Decimal,
    zone: Option<String>,
    country: Option<String>,
}

impl Assignment {
    fn resolve<R: ReferenceData>(refdata: &R, airport: &str, date: NaiveDate) -> Self {
        let prefix = icao_prefix(airport);
        Self {
            amount: refdata.lookup_price(prefix, date.year(), date),
            zone: refdata.lookup_zone(prefix),
            country: refdata.lookup_country(prefix),
        }
    }

    fn halved(mut self) -> Self {
        self.amount *= dec!(0.5);
        self
    }

    fn apply(&self, row: &mut DayRow) {
        row.indemnity = Some(self.amount);
        row.zone = self.zone.clone();
        row.country = self.country.clone();
    }
}

/// Computes every rotation's day-by-day indemnities in place. Expects the
/// table in its final sort order (rotations are contiguous); unassigned
/// rows are left untouched.
pub fn compute_indemnities<R: ReferenceData>(rows: &mut [DayRow], refdata: &R) {
    let mut computed = 0usize;
    let mut start = 0;
    while start < rows.len() {
        let Some(rot) = rows[start].rotation else {
            start += 1;
            continue;
        };
        let mut end = start + 1;
        while end < rows.len() && rows[end].rotation == Some(rot) {
            end += 1;
        }
        debug!(rotation = %rot, rows = end - start, "computing rotation");
        compute_rotation(&mut rows[start..end], refdata);
        computed += 1;
        start = end;
    }
    info!(rotations = computed, "indemnity calculation finished");
}

fn compute_rotation<R: ReferenceData>(rows: &mut [DayRow], refdata: &R) {
    let days = rotation_days(rows);
    let Some(&last_day) = days.last() else { return };

    // Extended layovers: a >= 7h same-day gap at a non-Europe stop. The
    // intermediate flight gets the stop's full price immediately; the last
    // observed event is kept for the end-of-rotation override.
    let mut layover: Option<Assignment> = None;
    for &day in &days {
        let flights: Vec<usize> = real_flight_indices(rows, day).collect();
        for pair in flights.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            // A malformed time counts as a zero-duration gap.
            let gap = match (rows[a].on, rows[b].off) {
                (Some(on), Some(off)) => off.signed_duration_since(on),
                _ => continue,
            };
            if gap < Duration::hours(EXTENDED_LAYOVER_HOURS) {
                continue;
            }
            let Some(airport) = rows[a].arrival.clone() else { continue };
            let zone = refdata.lookup_zone(icao_prefix(&airport));
            if zone.as_deref() == Some(ZONE_EUROPE) {
                continue;
            }
            let assignment = Assignment::resolve(refdata, &airport, day);
            debug!(%day, %airport, gap_minutes = gap.num_minutes(), "extended layover");
            assignment.apply(&mut rows[a]);
            layover = Some(assignment);
        }
    }

    // Night stops: every day but the last is paid at the arrival airport of
    // its last real flight.
    for &day in &days[..days.len() - 1] {
        let Some(i) = last_real_flight(rows, day) else { continue };
        let Some(airport) = rows[i].arrival.clone() else { continue };
        Assignment::resolve(refdata, &airport, day).apply(&mut rows[i]);
    }

    // No-flight days inherit the most recent night stop; their display
    // fields are synthesized from it. Without a prior flight the day stays
    // unresolved.
    for (di, &day) in days.iter().enumerate() {
        if last_real_flight(rows, day).is_some() {
            continue;
        }
        let inherited = days[..di]
            .iter()
            .rev()
            .find_map(|&d| last_real_flight(rows, d))
            .and_then(|i| rows[i].arrival.clone());
        let Some(airport) = inherited else {
            debug!(%day, "no-flight day without a prior flight, left unresolved");
            continue;
        };
        let assignment = Assignment::resolve(refdata, &airport, day);
        for row in rows.iter_mut().filter(|r| r.date == day) {
            row.departure = Some(airport.clone());
            row.arrival = Some(airport.clone());
            row.flight_number = Some(NO_FLIGHT_LABEL.to_string());
            assignment.apply(row);
        }
    }

    // Last-day rule, written to the rotation's final real flight.
    let Some(li) = rows.iter().rposition(|r| !r.no_flight_day) else {
        return;
    };
    let Some(own_airport) = rows[li].arrival.clone() else { return };

    let single_day_rule = |layover: &Option<Assignment>| match layover {
        Some(event) => event.clone(),
        None => Assignment::resolve(refdata, &own_airport, last_day).halved(),
    };

    let assignment = if days.len() == 1 {
        single_day_rule(&layover)
    } else {
        // Previous night stop, walking back through no-flight days.
        let prev_stop = days[..days.len() - 1]
            .iter()
            .rev()
            .find_map(|&d| last_real_flight(rows, d).map(|i| (i, d)))
            .and_then(|(i, d)| rows[i].arrival.clone().map(|a| (a, d)));
        match prev_stop {
            Some((airport, night)) => {
                let night_stop = Assignment::resolve(refdata, &airport, night);
                if night_stop.zone.as_deref() == Some(ZONE_EUROPE) {
                    match &layover {
                        // A non-Europe extended layover overrides the
                        // European half-day, undiminished.
                        Some(event) => event.clone(),
                        None => night_stop.halved(),
                    }
                } else {
                    // Outside Europe the previous night pays in full.
                    night_stop
                }
            }
            None => single_day_rule(&layover),
        }
    };
    assignment.apply(&mut rows[li]);
}

/// Distinct calendar dates of a rotation slice, ascending. Rows arrive
/// sorted, so first occurrence order is already date order.
fn rotation_days(rows: &[DayRow]) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = Vec::new();
    for row in rows {
        if days.last() != Some(&row.date) {
            days.push(row.date);
        }
    }
    days
}

fn real_flight_indices<'a>(
    rows: &'a [DayRow],
    day: NaiveDate,
) -> impl Iterator<Item = usize> + 'a {
    rows.iter()
        .enumerate()
        .filter(move |(_, r)| r.date == day && !r.no_flight_day)
        .map(|(i, _)| i)
}

fn last_real_flight(rows: &[DayRow], day: NaiveDate) -> Option<usize> {
    rows.iter()
        .rposition(|r| r.date == day && !r.no_flight_day)
}
