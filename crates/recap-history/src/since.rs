//! Time windows for history extraction (`--since`).

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use recap_core::RecapError;

/// Lower bound on commit time for an analysis run.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use recap_history::since::Since;
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
/// let window = Since::parse_at("2 weeks ago", now).unwrap();
/// assert_eq!(window.cutoff(), Some(now.timestamp() - 14 * 86_400));
///
/// assert_eq!(Since::parse_at("all", now).unwrap(), Since::All);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Since {
    /// No lower bound.
    #[default]
    All,
    /// Only commits at or after this unix timestamp.
    After(i64),
}

impl Since {
    /// Parse a window relative to the current time.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidSince`] if `input` is not recognized.
    pub fn parse(input: &str) -> Result<Self, RecapError> {
        Self::parse_at(input, Utc::now())
    }

    /// Parse a window relative to `now`.
    ///
    /// Accepts `all`, `yesterday`, a bare number of days, `N <unit> [ago]`,
    /// git's `N.<unit>[.ago]` form, `YYYY-MM-DD`, and RFC 3339 timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidSince`] if `input` is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use recap_history::since::Since;
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
    /// assert_eq!(
    ///     Since::parse_at("30", now).unwrap(),
    ///     Since::parse_at("30 days ago", now).unwrap()
    /// );
    /// assert!(Since::parse_at("last tuesday-ish", now).is_err());
    /// ```
    pub fn parse_at(input: &str, now: DateTime<Utc>) -> Result<Self, RecapError> {
        let trimmed = input.trim();
        let invalid = || RecapError::InvalidSince(input.to_string());

        if trimmed.is_empty() {
            return Err(invalid());
        }

        if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Since::After(ts.timestamp()));
        }

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
            return Ok(Since::After(Utc.from_utc_datetime(&midnight).timestamp()));
        }

        let lowered = trimmed.to_lowercase();
        match lowered.as_str() {
            "all" => return Ok(Since::All),
            "yesterday" => return back_from(now, Duration::days(1)).ok_or_else(invalid),
            _ => {}
        }

        // "2 weeks ago" and git's dotted "2.weeks.ago" both end in "ago".
        let relative = lowered
            .strip_suffix("ago")
            .map(|rest| rest.trim_end().trim_end_matches('.'))
            .unwrap_or(&lowered);

        if let Ok(days) = relative.parse::<u32>() {
            let span = Duration::try_days(i64::from(days)).ok_or_else(invalid)?;
            return back_from(now, span).ok_or_else(invalid);
        }

        let (amount, unit) = relative
            .split_once(char::is_whitespace)
            .or_else(|| relative.split_once('.'))
            .ok_or_else(invalid)?;
        let amount: u32 = amount.trim().parse().map_err(|_| invalid())?;
        let span = unit_duration(unit.trim(), i64::from(amount)).ok_or_else(invalid)?;

        back_from(now, span).ok_or_else(invalid)
    }

    /// Unix timestamp of the lower bound, if any.
    pub fn cutoff(&self) -> Option<i64> {
        match self {
            Since::All => None,
            Since::After(ts) => Some(*ts),
        }
    }

    /// Whether a commit at `timestamp` falls inside the window.
    pub fn includes(&self, timestamp: i64) -> bool {
        match self {
            Since::All => true,
            Since::After(cutoff) => timestamp >= *cutoff,
        }
    }
}

impl fmt::Display for Since {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Since::All => write!(f, "all time"),
            Since::After(ts) => match Utc.timestamp_opt(*ts, 0).single() {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
                None => write!(f, "@{ts}"),
            },
        }
    }
}

fn back_from(now: DateTime<Utc>, span: Duration) -> Option<Since> {
    now.checked_sub_signed(span)
        .map(|cutoff| Since::After(cutoff.timestamp()))
}

fn unit_duration(unit: &str, amount: i64) -> Option<Duration> {
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Duration::try_seconds(amount),
        "min" | "mins" | "minute" | "minutes" => Duration::try_minutes(amount),
        "h" | "hr" | "hrs" | "hour" | "hours" => Duration::try_hours(amount),
        "d" | "day" | "days" => Duration::try_days(amount),
        "w" | "week" | "weeks" => Duration::try_weeks(amount),
        // Calendar months and years are approximated.
        "month" | "months" => Duration::try_days(amount.checked_mul(30)?),
        "y" | "year" | "years" => Duration::try_days(amount.checked_mul(365)?),
        _ => None,
    }
}
