use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// A single reading of the clock: the instant used for timestamps and the
/// local calendar day used for due-date comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

impl Moment {
    pub fn current(timezone: Tz) -> Self {
        let now = Utc::now();
        Self {
            now,
            today: now.with_timezone(&timezone).date_naive(),
        }
    }

    pub fn at(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            now,
            today: now.with_timezone(&timezone).date_naive(),
        }
    }

    /// Midday UTC on `today`; used by tests that only care about the day.
    pub fn on_day(today: NaiveDate) -> Self {
        let now = today
            .and_hms_opt(12, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or_else(Utc::now);
        Self { now, today }
    }
}

#[cfg(test)]
mod tests {
    use super::Moment;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn today_follows_the_configured_timezone() {
        let late_evening_utc = Utc
            .with_ymd_and_hms(2026, 3, 1, 22, 30, 0)
            .single()
            .expect("valid instant");
        let moment = Moment::at(late_evening_utc, chrono_tz::Asia::Riyadh);
        assert_eq!(moment.today, NaiveDate::from_ymd_opt(2026, 3, 2).expect("date"));
    }
}
