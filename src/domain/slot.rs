// Quarter-hour grid shared by schedules and prices
use chrono::{DateTime, TimeDelta, Utc};

pub const SLOT: TimeDelta = TimeDelta::minutes(15);

const SLOT_SECONDS: i64 = 15 * 60;

/// Start of the quarter-hour slot enclosing `t`.
pub fn slot_start(t: DateTime<Utc>) -> DateTime<Utc> {
    let into_slot = TimeDelta::seconds(t.timestamp().rem_euclid(SLOT_SECONDS))
        + TimeDelta::nanoseconds(i64::from(t.timestamp_subsec_nanos()));
    t - into_slot
}

/// Slot starts covering `[from, to)`.
pub fn slots(from: DateTime<Utc>, to: DateTime<Utc>) -> impl Iterator<Item = DateTime<Utc>> {
    std::iter::successors(Some(from), |t| t.checked_add_signed(SLOT)).take_while(move |t| *t < to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_slot_start_truncates() {
        let t = Utc.with_ymd_and_hms(2025, 3, 14, 10, 29, 59).unwrap();
        assert_eq!(slot_start(t), Utc.with_ymd_and_hms(2025, 3, 14, 10, 15, 0).unwrap());

        let aligned = Utc.with_ymd_and_hms(2025, 3, 14, 10, 30, 0).unwrap();
        assert_eq!(slot_start(aligned), aligned);

        let with_nanos = aligned + TimeDelta::milliseconds(250);
        assert_eq!(slot_start(with_nanos), aligned);
    }

    #[test]
    fn test_slots_are_half_open() {
        let from = Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap();
        let to = from + TimeDelta::hours(1);
        let all: Vec<_> = slots(from, to).collect();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3], from + TimeDelta::minutes(45));
        assert_eq!(slots(to, from).count(), 0);
    }
}
