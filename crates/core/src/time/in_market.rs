use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::collections::HashSet;

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

// NSE closes at 15:30 IST; daily bars are treated as final from this time on.
const CLOSE_CUTOFF_HOUR_IST: u32 = 16;
const CLOSE_CUTOFF_MINUTE_IST: u32 = 0;

/// Market date the analysis is "as of". An explicit `YYYY-MM-DD` argument wins.
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid as-of date {s:?}, expected YYYY-MM-DD"));
    }

    let ist = chrono::FixedOffset::east_opt(IST_OFFSET_SECS).context("invalid IST offset")?;
    let now_ist = now_utc.with_timezone(&ist);

    let cutoff_reached =
        (now_ist.hour(), now_ist.minute()) >= (CLOSE_CUTOFF_HOUR_IST, CLOSE_CUTOFF_MINUTE_IST);
    let mut date = now_ist.date_naive();
    if !cutoff_reached {
        date = date - Duration::days(1);
    }

    let holidays = configured_holidays();
    while is_weekend(date) || holidays.contains(&date) {
        date = date - Duration::days(1);
    }

    Ok(date)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

fn configured_holidays() -> HashSet<NaiveDate> {
    // Fixed-date national holidays only; festival holidays move every year.
    // Add them via NSE_MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD".
    let mut out = HashSet::new();
    for y in 2024..=2030 {
        for (m, d) in [(1, 26), (8, 15), (10, 2)] {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                out.insert(date);
            }
        }
    }

    if let Ok(s) = std::env::var("NSE_MARKET_HOLIDAYS") {
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match NaiveDate::parse_from_str(part, "%Y-%m-%d") {
                Ok(d) => {
                    out.insert(d);
                }
                Err(_) => tracing::warn!(value = part, "ignoring malformed NSE_MARKET_HOLIDAYS entry"),
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn explicit_date_wins() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let d = resolve_as_of_date(Some("2025-12-31"), now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert!(resolve_as_of_date(Some("31/12/2025"), now).is_err());
    }

    #[test]
    fn rolls_back_on_weekend() {
        // 2026-01-03 is Saturday; 08:00 UTC = 13:30 IST.
        let now = Utc.with_ymd_and_hms(2026, 1, 3, 8, 0, 0).unwrap();
        let d = resolve_as_of_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
    }

    #[test]
    fn uses_previous_session_before_cutoff() {
        // 2026-01-05 09:00 UTC = 14:30 IST, Monday before the cutoff.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let d = resolve_as_of_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
    }

    #[test]
    fn uses_same_day_after_cutoff() {
        // 2026-01-05 11:00 UTC = 16:30 IST.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 11, 0, 0).unwrap();
        let d = resolve_as_of_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
    }

    #[test]
    fn skips_republic_day() {
        // Tuesday morning after Republic Day (Monday 2026-01-26).
        let now = Utc.with_ymd_and_hms(2026, 1, 27, 6, 0, 0).unwrap();
        let d = resolve_as_of_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 23).unwrap());
    }
}
