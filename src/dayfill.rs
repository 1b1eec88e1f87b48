// src/dayfill.rs
//
// Builds the output table from segmented legs and fills every rotation's
// calendar span: a day without a real flight gets one synthetic no-flight
// row so the calculator always sees an unbroken date sequence.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::model::{DayRow, RotationId};
use crate::segment::AssignedLeg;

/// Turns assigned legs into table rows, inserts no-flight days and sorts
/// the table into its final order (unassigned rows first, then rotation,
/// date, departure time; synthetic rows sort first within a day).
pub fn build_table(assigned: Vec<AssignedLeg>) -> Vec<DayRow> {
    let mut rows: Vec<DayRow> = assigned
        .into_iter()
        .map(|a| DayRow::from_leg(a.rotation, a.leg))
        .collect();

    let mut spans: BTreeMap<RotationId, (NaiveDate, NaiveDate)> = BTreeMap::new();
    let mut flown: BTreeSet<(RotationId, NaiveDate)> = BTreeSet::new();
    for row in &rows {
        let Some(rot) = row.rotation else { continue };
        flown.insert((rot, row.date));
        spans
            .entry(rot)
            .and_modify(|(min, max)| {
                *min = (*min).min(row.date);
                *max = (*max).max(row.date);
            })
            .or_insert((row.date, row.date));
    }

    for (rot, (min, max)) in spans {
        let mut date = min;
        while date <= max {
            if !flown.contains(&(rot, date)) {
                debug!(rotation = %rot, %date, "inserting no-flight day");
                rows.push(DayRow::no_flight(rot, date));
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
    }

    rows.sort_by_key(|r| r.sort_key());
    rows
}
