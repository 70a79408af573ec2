// Schedule domain model and mode resolution
use super::mode::Mode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamped mode change. The schedule is an ascending list of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBreakpoint {
    pub timestamp: DateTime<Utc>,
    pub mode: Mode,
}

impl ScheduleBreakpoint {
    pub fn new(timestamp: DateTime<Utc>, mode: Mode) -> Self {
        Self { timestamp, mode }
    }
}

/// A breakpoint as read back from the schedule relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBreakpoint {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub mode: Mode,
    pub created_at: DateTime<Utc>,
}

impl StoredBreakpoint {
    pub fn breakpoint(&self) -> ScheduleBreakpoint {
        ScheduleBreakpoint::new(self.timestamp, self.mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeQueryResult {
    pub mode: Mode,
    #[serde(rename = "timestamp")]
    pub at: DateTime<Utc>,
    #[serde(rename = "next_change", skip_serializing_if = "Option::is_none")]
    pub next_change_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_mode: Option<Mode>,
    pub description: &'static str,
}

impl ModeQueryResult {
    fn new(mode: Mode, at: DateTime<Utc>, next: Option<&ScheduleBreakpoint>) -> Self {
        Self {
            mode,
            at,
            next_change_at: next.map(|b| b.timestamp),
            next_mode: next.map(|b| b.mode),
            description: mode.description(),
        }
    }
}

/// Orders a submitted schedule by timestamp. The sort is stable, so entries
/// sharing a timestamp keep their submission order.
pub fn sort_breakpoints(breakpoints: &mut [ScheduleBreakpoint]) {
    breakpoints.sort_by_key(|b| b.timestamp);
}

/// Resolve the mode active at `at` from an ascending list of breakpoints.
///
/// A breakpoint takes effect exactly at its timestamp. Before the first
/// breakpoint, or with an empty schedule, the default mode applies and no
/// upcoming change is reported.
pub fn resolve(breakpoints: &[ScheduleBreakpoint], at: DateTime<Utc>) -> ModeQueryResult {
    // Number of breakpoints at or before `at`
    let passed = breakpoints.partition_point(|b| b.timestamp <= at);
    if passed == 0 {
        return ModeQueryResult::new(Mode::DEFAULT, at, None);
    }

    let active = &breakpoints[passed - 1];
    ModeQueryResult::new(active.mode, at, breakpoints.get(passed))
}
