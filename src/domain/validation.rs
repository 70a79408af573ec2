// Charger overlap validation
use super::schedule::ScheduleBreakpoint;
use chrono::{DateTime, TimeDelta, Utc};

/// How long a trailing charger breakpoint is assumed to stay active.
pub const DEFAULT_CHARGER_HORIZON: TimeDelta = TimeDelta::hours(48);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("chargers overlap at {at}")]
pub struct ScheduleConflict {
    pub at: DateTime<Utc>,
}

/// Charger activity over `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ChargerInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

pub fn validate(breakpoints: &[ScheduleBreakpoint]) -> Result<(), ScheduleConflict> {
    validate_with_horizon(breakpoints, DEFAULT_CHARGER_HORIZON)
}

/// Reject an ascending schedule in which two charger intervals overlap.
/// Reports the earliest instant where they do.
///
/// A charger interval starts at its breakpoint and ends at the first later
/// breakpoint of any mode, or after `horizon` for the last one. Intervals
/// are half-open, so adjacent ones never conflict wherever they meet.
pub fn validate_with_horizon(
    breakpoints: &[ScheduleBreakpoint],
    horizon: TimeDelta,
) -> Result<(), ScheduleConflict> {
    let mut intervals: Vec<ChargerInterval> = breakpoints
        .iter()
        .filter(|b| b.mode.is_charger())
        .map(|b| charger_interval(breakpoints, b.timestamp, horizon))
        .filter(|i| i.start < i.end)
        .collect();
    intervals.sort_unstable();

    let mut covered_until = DateTime::<Utc>::MIN_UTC;
    for interval in intervals {
        // Sorted by start, so the overlap begins where this interval does.
        if interval.start < covered_until {
            return Err(ScheduleConflict { at: interval.start });
        }
        covered_until = covered_until.max(interval.end);
    }

    Ok(())
}

fn charger_interval(
    breakpoints: &[ScheduleBreakpoint],
    start: DateTime<Utc>,
    horizon: TimeDelta,
) -> ChargerInterval {
    let next = breakpoints.partition_point(|b| b.timestamp <= start);
    let end = match breakpoints.get(next) {
        Some(b) => b.timestamp,
        None => start.checked_add_signed(horizon).unwrap_or(DateTime::<Utc>::MAX_UTC),
    };
    ChargerInterval { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mode::Mode;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
    }

    fn bp(hour: u32, minute: u32, mode: Mode) -> ScheduleBreakpoint {
        ScheduleBreakpoint::new(at(hour, minute), mode)
    }

    #[test]
    fn test_empty_and_non_charger_schedules_pass() {
        assert_eq!(validate(&[]), Ok(()));
        let schedule = vec![
            bp(8, 0, Mode::GridCharge),
            bp(9, 0, Mode::Discharge),
            bp(10, 0, Mode::Passive),
        ];
        assert_eq!(validate(&schedule), Ok(()));
    }

    #[test]
    fn test_adjacent_chargers_pass() {
        let schedule = vec![
            bp(10, 0, Mode::GarageCharger),
            bp(10, 30, Mode::OutdoorCharger),
            bp(12, 0, Mode::Passive),
        ];
        assert_eq!(validate(&schedule), Ok(()));
    }

    #[test]
    fn test_trailing_chargers_with_handover_pass() {
        // The garage interval ends when the outdoor one starts; the outdoor
        // one runs to the horizon on its own.
        let schedule = vec![bp(10, 0, Mode::GarageCharger), bp(10, 30, Mode::OutdoorCharger)];
        assert_eq!(validate(&schedule), Ok(()));
    }

    #[test]
    fn test_duplicate_charger_entries_conflict() {
        let schedule = vec![bp(10, 0, Mode::GarageCharger), bp(10, 0, Mode::OutdoorCharger)];
        assert_eq!(validate(&schedule), Err(ScheduleConflict { at: at(10, 0) }));

        let same_mode = vec![
            bp(10, 0, Mode::GarageCharger),
            bp(10, 0, Mode::GarageCharger),
            bp(11, 0, Mode::Passive),
        ];
        assert_eq!(validate(&same_mode), Err(ScheduleConflict { at: at(10, 0) }));
    }

    #[test]
    fn test_unaligned_adjacent_chargers_pass() {
        let schedule = vec![
            bp(10, 0, Mode::GarageCharger),
            bp(10, 20, Mode::OutdoorCharger),
            bp(11, 0, Mode::Passive),
        ];
        assert_eq!(validate(&schedule), Ok(()));

        let trailing = vec![bp(10, 7, Mode::OutdoorCharger), bp(10, 52, Mode::GarageCharger)];
        assert_eq!(validate(&trailing), Ok(()));
    }

    #[test]
    fn test_unaligned_duplicate_reports_exact_instant() {
        let schedule = vec![
            bp(10, 0, Mode::GarageCharger),
            bp(10, 20, Mode::OutdoorCharger),
            bp(10, 20, Mode::GarageCharger),
            bp(11, 0, Mode::Passive),
        ];
        assert_eq!(validate(&schedule), Err(ScheduleConflict { at: at(10, 20) }));
    }

    #[test]
    fn test_non_charger_between_chargers_passes() {
        let schedule = vec![
            bp(10, 0, Mode::GarageCharger),
            bp(10, 15, Mode::Passive),
            bp(10, 30, Mode::OutdoorCharger),
            bp(11, 0, Mode::GarageCharger),
            bp(11, 45, Mode::Passive),
        ];
        assert_eq!(validate(&schedule), Ok(()));
    }

    #[test]
    fn test_horizon_is_configurable() {
        let schedule = vec![bp(10, 0, Mode::GarageCharger)];
        assert_eq!(validate_with_horizon(&schedule, TimeDelta::zero()), Ok(()));
        assert_eq!(validate_with_horizon(&schedule, TimeDelta::hours(1)), Ok(()));
    }

    #[test]
    fn test_reports_earliest_conflict() {
        let schedule = vec![
            bp(6, 0, Mode::OutdoorCharger),
            bp(6, 0, Mode::GarageCharger),
            bp(7, 0, Mode::Passive),
            bp(9, 0, Mode::GarageCharger),
            bp(9, 0, Mode::OutdoorCharger),
        ];
        assert_eq!(validate(&schedule), Err(ScheduleConflict { at: at(6, 0) }));
    }

    #[test]
    fn test_sweep_matches_quarter_hour_stepping() {
        let modes = [Mode::Passive, Mode::GarageCharger, Mode::OutdoorCharger];
        for a in modes {
            for b in modes {
                for c in modes {
                    for offset in [0u32, 10, 15, 20, 30] {
                        for third in [offset, 45] {
                            let schedule = vec![
                                bp(8, 0, a),
                                bp(8, offset, b),
                                bp(8, third, c),
                                bp(10, 0, Mode::Passive),
                            ];
                            assert_eq!(
                                validate(&schedule).err().map(|e| e.at),
                                stepped_conflict(&schedule),
                                "schedule {schedule:?}"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Walk each charger from its own timestamp in quarter-hour steps until
    /// the next later breakpoint (or the horizon), recording the exact
    /// instants it claims. Returns the earliest instant claimed twice.
    fn stepped_conflict(schedule: &[ScheduleBreakpoint]) -> Option<DateTime<Utc>> {
        let mut claimed = std::collections::BTreeMap::<DateTime<Utc>, u32>::new();
        for change in schedule.iter().filter(|b| b.mode.is_charger()) {
            let end = schedule
                .iter()
                .find(|n| n.timestamp > change.timestamp)
                .map(|n| n.timestamp)
                .unwrap_or(change.timestamp + DEFAULT_CHARGER_HORIZON);
            let mut t = change.timestamp;
            while t < end {
                *claimed.entry(t).or_default() += 1;
                t += TimeDelta::minutes(15);
            }
        }
        claimed.into_iter().find(|(_, n)| *n > 1).map(|(t, _)| t)
    }
}
