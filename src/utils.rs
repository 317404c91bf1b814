use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Half-open UTC interval `[start, end)` covering one calendar day.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// Calendar day of `now` in its own time zone, expressed in UTC.
pub fn day_window<Tz: TimeZone>(now: &DateTime<Tz>) -> DayWindow {
    let tz = now.timezone();
    let day = now.date_naive();
    let start = local_day_start(&tz, day).unwrap_or_else(|| now.with_timezone(&Utc));
    let end = day
        .succ_opt()
        .and_then(|next| local_day_start(&tz, next))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    DayWindow { start, end }
}

// Quarter-hour steps cover every DST gap in use; a day holds 96 of them.
const GAP_STEP_MINUTES: i64 = 15;
const GAP_MAX_STEPS: i64 = 96;

/// First local instant of `day`. When a DST jump skips midnight, the day
/// starts where local time resumes.
fn local_day_start<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = day.and_time(NaiveTime::MIN);
    (0..GAP_MAX_STEPS)
        .map(|step| midnight + Duration::minutes(step * GAP_STEP_MINUTES))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Lower bound of a lookback window of `hours` ending at `now`.
pub fn hours_back(now: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    now - chrono::Duration::hours(i64::from(hours))
}
