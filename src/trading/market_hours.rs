//! Forex market week and trading-session clock, in New York time.
//!
//! The market trades from Sunday 17:00 to Friday 17:00 America/New_York.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use serde::Serialize;

/// Hour (New York local) at which the week opens on Sunday and closes on Friday.
const ROLLOVER_HOUR: u32 = 17;

/// Session name with its New York local hours `[start, end)`, wrapping midnight.
const SESSIONS: [(&str, u32, u32); 4] = [
    ("Sydney", 17, 2),
    ("Tokyo", 19, 4),
    ("London", 3, 12),
    ("New York", 8, 17),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketStatus {
    pub is_open: bool,
    pub current_time: DateTime<FixedOffset>,
    pub next_open: Option<DateTime<FixedOffset>>,
    pub next_close: Option<DateTime<FixedOffset>>,
    pub current_session: String,
}

fn fixed(dt: DateTime<Tz>) -> DateTime<FixedOffset> {
    dt.with_timezone(&dt.offset().fix())
}

/// 17:00 New York time on `date`.
fn rollover_on(date: NaiveDate) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(ROLLOVER_HOUR, 0, 0)?;
    New_York.from_local_datetime(&naive).earliest()
}

/// Sessions active at a New York local hour, joined with " & ".
pub fn trading_sessions(hour: u32) -> String {
    let active: Vec<&str> = SESSIONS
        .iter()
        .filter(|(_, start, end)| {
            if start < end {
                (*start..*end).contains(&hour)
            } else {
                hour >= *start || hour < *end
            }
        })
        .map(|(name, _, _)| *name)
        .collect();

    if active.is_empty() {
        "No active session".to_string()
    } else {
        active.join(" & ")
    }
}

pub fn forex_market_status(now: DateTime<Utc>) -> MarketStatus {
    let local = now.with_timezone(&New_York);
    let today = local.date_naive();
    let after_rollover = local.hour() >= ROLLOVER_HOUR;

    let days_until_open = match local.weekday() {
        Weekday::Fri if after_rollover => Some(2),
        Weekday::Sat => Some(1),
        Weekday::Sun if !after_rollover => Some(0),
        _ => None,
    };

    let (is_open, next_open, next_close) = match days_until_open {
        Some(days) => (false, rollover_on(today + Duration::days(days)), None),
        None => {
            let days_to_friday = (Weekday::Fri.num_days_from_monday() + 7
                - local.weekday().num_days_from_monday())
                % 7;
            let close = rollover_on(today + Duration::days(days_to_friday as i64));
            (true, None, close)
        }
    };

    MarketStatus {
        is_open,
        current_time: fixed(local),
        next_open: next_open.map(fixed),
        next_close: next_close.map(fixed),
        current_session: trading_sessions(local.hour()),
    }
}
