// src/segment.rs
//
// Rotation segmentation: walks the log day by day and groups flights into
// duty trips. The open rotation is carried between days as an index into
// the accumulator, and a closed rotation can be reopened when a swing base
// hands the crew over midnight into the next calendar day.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::model::{BaseConfig, FlightLeg, RotationId};

/// A flight leg annotated with the rotation it belongs to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedLeg {
    pub leg: FlightLeg,
    pub rotation: Option<RotationId>,
}

/// Assigns rotation identifiers. Output is sorted chronologically (date,
/// then departure time with unknown times first); identifiers are numbered
/// in the order rotations are first opened, which is also first-flight
/// chronological order.
pub fn segment(mut legs: Vec<FlightLeg>, config: &BaseConfig) -> Vec<AssignedLeg> {
    legs.sort_by_key(|l| l.sort_key());
    let days = group_days(&legs);

    // Per-rotation leg indices; `open` is the rotation currently accepting
    // flights, `day_rotation[i]` the rotation day i's flights landed in.
    let mut rotations: Vec<Vec<usize>> = Vec::new();
    let mut open: Option<usize> = None;
    let mut day_rotation: Vec<Option<usize>> = Vec::with_capacity(days.len());

    for (di, (date, range)) in days.iter().enumerate() {
        let first = &legs[range.0];
        let last = &legs[range.1 - 1];

        // Swing-base handover: yesterday's last flight arrived at a swing
        // base, today starts there, and the days are consecutive. This
        // reopens yesterday's rotation even if it had already closed.
        if open.is_none() && di > 0 {
            let (prev_date, prev_range) = &days[di - 1];
            let prev_last = &legs[prev_range.1 - 1];
            if (*date - *prev_date).num_days() == 1
                && config.is_swing(&prev_last.arrival)
                && first.departure == prev_last.arrival
            {
                if let Some(rot) = day_rotation[di - 1] {
                    debug!(%date, rotation = %RotationId(rot as u32 + 1), base = %prev_last.arrival,
                        "continuing rotation across midnight at swing base");
                    open = Some(rot);
                }
            }
        }

        // A new rotation starts on a day whose first flight leaves a base.
        if open.is_none() && config.is_base(&first.departure) {
            rotations.push(Vec::new());
            open = Some(rotations.len() - 1);
            debug!(%date, rotation = %RotationId(rotations.len() as u32),
                base = %first.departure, "opening rotation");
        }

        match open {
            Some(rot) => {
                rotations[rot].extend(range.0..range.1);
                day_rotation.push(Some(rot));
            }
            None => {
                debug!(%date, departure = %first.departure, "day not assigned to any rotation");
                day_rotation.push(None);
            }
        }

        // Close when the day ends at a base, unless a swing base has a
        // compatible continuation tomorrow.
        if let Some(rot) = open {
            if config.is_base(&last.arrival) {
                let continues = config.is_swing(&last.arrival)
                    && days.get(di + 1).is_some_and(|(next_date, next_range)| {
                        (*next_date - *date).num_days() == 1
                            && legs[next_range.0].departure == last.arrival
                    });
                if !continues {
                    debug!(%date, rotation = %RotationId(rot as u32 + 1), base = %last.arrival,
                        "closing rotation");
                    open = None;
                }
            }
        }
    }

    if let Some(rot) = open {
        // Data ran out with a trip still underway; it keeps its identifier.
        debug!(rotation = %RotationId(rot as u32 + 1), "rotation still open at end of data");
    }

    let mut assignment: Vec<Option<RotationId>> = vec![None; legs.len()];
    for (i, indices) in rotations.iter().enumerate() {
        for &idx in indices {
            assignment[idx] = Some(RotationId(i as u32 + 1));
        }
    }

    info!(
        flights = legs.len(),
        rotations = rotations.len(),
        "segmented flight log"
    );
    legs.into_iter()
        .zip(assignment)
        .map(|(leg, rotation)| AssignedLeg { leg, rotation })
        .collect()
}

/// Contiguous per-day index ranges over the sorted legs.
fn group_days(legs: &[FlightLeg]) -> Vec<(NaiveDate, (usize, usize))> {
    let mut days: Vec<(NaiveDate, (usize, usize))> = Vec::new();
    for (i, leg) in legs.iter().enumerate() {
        match days.last_mut() {
            Some((date, range)) if *date == leg.date => range.1 = i + 1,
            _ => days.push((leg.date, (i, i + 1))),
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    fn leg(date: &str, dep: &str, arr: &str, off: (u32, u32), on: (u32, u32)) -> FlightLeg {
        FlightLeg {
            date: d(date),
            departure: dep.to_string(),
            arrival: arr.to_string(),
            off: time(off.0, off.1),
            on: time(on.0, on.1),
            flight_number: None,
            original_departure: None,
            original_arrival: None,
        }
    }

    fn config() -> BaseConfig {
        BaseConfig::new(["LFLB", "LFLS", "LFLY", "LSGG", "LFLP"], ["LFLY", "LSGG"])
    }

    fn rotations(assigned: &[AssignedLeg]) -> Vec<Option<String>> {
        assigned
            .iter()
            .map(|a| a.rotation.map(|r| r.to_string()))
            .collect()
    }

    #[test]
    fn same_day_round_trip_is_one_rotation() {
        let legs = vec![
            leg("2025-01-03", "LFLB", "LFPG", (8, 0), (9, 30)),
            leg("2025-01-03", "LFPG", "LFLB", (17, 0), (18, 30)),
        ];
        let assigned = segment(legs, &config());
        assert_eq!(
            rotations(&assigned),
            vec![Some("ROT001".into()), Some("ROT001".into())]
        );
    }

    #[test]
    fn arrival_away_from_base_keeps_rotation_open() {
        let legs = vec![
            leg("2025-01-03", "LFLB", "LFPG", (8, 0), (9, 30)),
            leg("2025-01-04", "LFPG", "LFLB", (10, 0), (11, 30)),
        ];
        let assigned = segment(legs, &config());
        assert_eq!(
            rotations(&assigned),
            vec![Some("ROT001".into()), Some("ROT001".into())]
        );
    }

    #[test]
    fn closed_rotation_reopens_across_swing_base() {
        // Day 1 ends back at LSGG (a swing base); day 2 starts there, so
        // day 2's flights belong to the same rotation.
        let legs = vec![
            leg("2025-01-03", "LFLB", "LSGG", (8, 0), (9, 0)),
            leg("2025-01-04", "LSGG", "LFPG", (7, 0), (8, 30)),
            leg("2025-01-04", "LFPG", "LFLB", (17, 0), (18, 30)),
        ];
        let assigned = segment(legs, &config());
        assert_eq!(
            rotations(&assigned),
            vec![
                Some("ROT001".into()),
                Some("ROT001".into()),
                Some("ROT001".into()),
            ]
        );
    }

    #[test]
    fn swing_base_without_matching_departure_closes() {
        let legs = vec![
            leg("2025-01-03", "LFLB", "LSGG", (8, 0), (9, 0)),
            // Next day starts from a different base: new rotation.
            leg("2025-01-04", "LFLB", "LFPG", (7, 0), (8, 30)),
        ];
        let assigned = segment(legs, &config());
        assert_eq!(
            rotations(&assigned),
            vec![Some("ROT001".into()), Some("ROT002".into())]
        );
    }

    #[test]
    fn swing_base_with_day_gap_closes() {
        let legs = vec![
            leg("2025-01-03", "LFLB", "LSGG", (8, 0), (9, 0)),
            // Two days later: not calendar-consecutive, no continuation.
            leg("2025-01-05", "LSGG", "LFPG", (7, 0), (8, 30)),
            leg("2025-01-05", "LFPG", "LSGG", (17, 0), (18, 30)),
        ];
        let assigned = segment(legs, &config());
        assert_eq!(
            rotations(&assigned),
            vec![
                Some("ROT001".into()),
                Some("ROT002".into()),
                Some("ROT002".into()),
            ]
        );
    }

    #[test]
    fn day_starting_away_from_base_is_unassigned() {
        let legs = vec![
            leg("2025-01-03", "EGLL", "LFPG", (8, 0), (9, 0)),
            leg("2025-01-04", "LFLB", "LFLS", (7, 0), (8, 0)),
        ];
        let assigned = segment(legs, &config());
        assert_eq!(rotations(&assigned), vec![None, Some("ROT001".into())]);
    }

    #[test]
    fn identifiers_follow_first_flight_order() {
        let legs = vec![
            leg("2025-01-03", "LFLB", "LFLB", (8, 0), (9, 0)),
            leg("2025-01-05", "LFLS", "LFLS", (8, 0), (9, 0)),
            leg("2025-01-07", "LFLB", "LFLB", (8, 0), (9, 0)),
        ];
        let assigned = segment(legs, &config());
        assert_eq!(
            rotations(&assigned),
            vec![
                Some("ROT001".into()),
                Some("ROT002".into()),
                Some("ROT003".into()),
            ]
        );
    }

    #[test]
    fn open_rotation_at_end_of_data_keeps_its_identifier() {
        let legs = vec![
            leg("2025-01-03", "LFLB", "LFPG", (8, 0), (9, 0)),
            leg("2025-01-04", "LFPG", "EGLL", (10, 0), (11, 0)),
        ];
        let assigned = segment(legs, &config());
        assert_eq!(
            rotations(&assigned),
            vec![Some("ROT001".into()), Some("ROT001".into())]
        );
    }

    #[test]
    fn unassigned_day_ending_at_base_burns_no_identifier() {
        let legs = vec![
            // Lands at a base but never departed from one: unassigned, and
            // the next rotation still gets ROT001.
            leg("2025-01-03", "EGLL", "LFLB", (8, 0), (9, 0)),
            leg("2025-01-05", "LFLB", "LFLB", (8, 0), (9, 0)),
        ];
        let assigned = segment(legs, &config());
        assert_eq!(rotations(&assigned), vec![None, Some("ROT001".into())]);
    }

    #[test]
    fn flights_within_a_day_ordered_by_departure_time() {
        let legs = vec![
            leg("2025-01-03", "LFPG", "LFLB", (17, 0), (18, 0)),
            leg("2025-01-03", "LFLB", "LFPG", (8, 0), (9, 0)),
        ];
        let assigned = segment(legs, &config());
        assert_eq!(assigned[0].leg.departure, "LFLB");
        assert_eq!(assigned[1].leg.departure, "LFPG");
        assert_eq!(
            rotations(&assigned),
            vec![Some("ROT001".into()), Some("ROT001".into())]
        );
    }
}
