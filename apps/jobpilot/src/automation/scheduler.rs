use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("Invalid schedule '{0}': expected HH:MM (24-hour)")]
    Invalid(String),
}

/// Parses a local wall-clock time such as `08:30`.
pub fn parse_schedule(value: &str) -> Result<NaiveTime, ScheduleError> {
    let trimmed = value.trim();
    let invalid = || ScheduleError::Invalid(value.to_string());

    let (hours, minutes) = trimmed.split_once(':').ok_or_else(invalid)?;
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if hours.is_empty()
        || hours.len() > 2
        || minutes.len() != 2
        || !digits(hours)
        || !digits(minutes)
    {
        return Err(invalid());
    }
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

/// Time from `now` until the next occurrence of `at`.
/// Exactly `at` counts as tomorrow, so the result is in (0, 24h].
pub fn duration_until_next(now: NaiveDateTime, at: NaiveTime) -> Duration {
    let today = now.date().and_time(at);
    let next = if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or(Duration::from_secs(24 * 60 * 60))
}

/// Runs `job` every day at `at` local time until Ctrl-C.
pub async fn run_daily<F, Fut>(at: NaiveTime, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let wait = duration_until_next(Local::now().naive_local(), at);
        info!("Next run at {} (in {}m)", at.format("%H:%M"), wait.as_secs() / 60);

        tokio::select! {
            _ = tokio::time::sleep(wait) => job().await,
            _ = tokio::signal::ctrl_c() => {
                info!("Scheduler stopped");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_valid_times() {
        assert_eq!(parse_schedule("08:30").unwrap(), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(parse_schedule("7:05").unwrap(), NaiveTime::from_hms_opt(7, 5, 0).unwrap());
        assert_eq!(parse_schedule(" 23:59 ").unwrap(), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "8", "24:00", "12:60", "12:5", "ab:cd", "12:30:00", "-1:30"] {
            assert!(parse_schedule(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_parse_rejects_signs() {
        for bad in ["+8:30", "12:+5", "+12:30", " +9:00"] {
            assert!(parse_schedule(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_later_today() {
        let wait = duration_until_next(at(7, 0), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(wait, Duration::from_secs(2 * 3600 + 30 * 60));
    }

    #[test]
    fn test_already_passed_runs_tomorrow() {
        let wait = duration_until_next(at(10, 0), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(wait, Duration::from_secs(23 * 3600));
    }

    #[test]
    fn test_exact_time_is_a_full_day() {
        let wait = duration_until_next(at(9, 0), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(wait, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_always_within_one_day() {
        let target = NaiveTime::from_hms_opt(6, 15, 0).unwrap();
        for hour in 0..24 {
            for minute in [0, 14, 15, 16, 59] {
                let wait = duration_until_next(at(hour, minute), target);
                assert!(wait > Duration::ZERO);
                assert!(wait <= Duration::from_secs(24 * 3600));
            }
        }
    }
}
