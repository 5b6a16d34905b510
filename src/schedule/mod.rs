use crate::config::error::ConfigError;
use crate::config::error::ConfigError::InvalidSchedule;
use crate::report::Reporter;
use crate::schedule::clock::Clock;
use crate::schedule::error::ScheduleError;
use crate::schedule::error::ScheduleError::Cancelled;
use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use derive_getters::Getters;
use std::time::Duration;

pub mod clock;
pub mod error;

const TIME_FORMAT: &str = "%H:%M";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const DISPLAY_FORMAT: &str = "%A, %B %d, %Y at %H:%M";
const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, PartialEq, Getters)]
pub struct ScheduledTime {
    at: NaiveDateTime,
    /// A bare `HH:MM` already past today, moved to tomorrow.
    postponed: bool,
}

/// Parse a `SEND_AT` value: empty means "now",
/// `HH:MM` means the next occurrence of that time,
/// `YYYY-MM-DD HH:MM` means that exact local time.
pub fn parse_scheduled_time(input: &str, now: NaiveDateTime) -> Result<Option<ScheduledTime>, ConfigError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    if input.contains(':') && !input.contains('-') {
        let time = NaiveTime::parse_from_str(input, TIME_FORMAT)
            .map_err(|_| InvalidSchedule(input.to_owned()))?;
        let at = now.date().and_time(time);
        let scheduled_time = if at <= now {
            ScheduledTime {
                at: at + TimeDelta::days(1),
                postponed: true,
            }
        } else {
            ScheduledTime {
                at,
                postponed: false,
            }
        };
        return Ok(Some(scheduled_time));
    }

    NaiveDateTime::parse_from_str(input, DATE_TIME_FORMAT)
        .map(|at| Some(ScheduledTime { at, postponed: false }))
        .map_err(|_| InvalidSchedule(input.to_owned()))
}

/// Report what has been understood of a parsed `SEND_AT`, and when sending should start.
pub fn report_schedule(
    scheduled_time: Option<ScheduledTime>,
    now: NaiveDateTime,
    reporter: &Reporter,
) -> Option<NaiveDateTime> {
    let Some(scheduled_time) = scheduled_time else {
        reporter.info("Sending emails immediately");
        return None;
    };

    if scheduled_time.postponed {
        reporter.warning(&format!(
            "Scheduled time has passed today, scheduling for tomorrow: {}",
            scheduled_time.at.format(DATE_TIME_FORMAT)
        ));
    } else if scheduled_time.at <= now {
        reporter.warning(&format!(
            "Scheduled time {} is already past, sending immediately",
            scheduled_time.at.format(DATE_TIME_FORMAT)
        ));
    }
    Some(scheduled_time.at)
}

pub fn report_invalid_schedule(input: &str, reporter: &Reporter) {
    reporter.error(&format!("Invalid SEND_AT format: {input}"));
    reporter.info("Use format: 'HH:MM' for today or 'YYYY-MM-DD HH:MM' for specific date");
}

/// Block until `target`, polling the clock every few seconds.
/// Gives up as soon as `cancellation` completes.
pub async fn wait_until<C, F>(
    target: NaiveDateTime,
    clock: &C,
    reporter: &Reporter,
    cancellation: F,
) -> Result<(), ScheduleError>
where
    C: Clock,
    F: Future<Output = ()>,
{
    reporter.header(&format!("EMAIL SCHEDULED FOR: {}", target.format(DISPLAY_FORMAT)));
    tokio::pin!(cancellation);

    loop {
        let now = clock.now();
        if now >= target {
            reporter.success("Scheduled time reached! Starting email sending process...");
            return Ok(());
        }

        reporter.progress(&format!("Waiting... {} remaining", format_remaining(target - now)));
        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = &mut cancellation => {
                reporter.warning("Scheduled wait cancelled, no email has been sent");
                return Err(Cancelled);
            }
        }
    }
}

fn format_remaining(remaining: TimeDelta) -> String {
    let days = remaining.num_days();
    let seconds = remaining.num_seconds() - days * 24 * 3600;
    let (hours, seconds) = (seconds / 3600, seconds % 3600);
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    let clock = format!("{hours:02}:{minutes:02}:{seconds:02}");

    if days > 0 {
        format!("{days} day(s), {clock}")
    } else {
        clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::clock::tests::TokioClock;
    use chrono::NaiveDate;
    use parameterized::{ide, parameterized};
    use tokio::time::Instant;

    ide!();

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn now() -> NaiveDateTime {
        at(2025, 3, 14, 12, 0)
    }

    // region parse_scheduled_time
    #[parameterized(
        input = {"", "   "}
    )]
    fn should_not_schedule_when_empty(input: &str) {
        assert_eq!(Ok(None), parse_scheduled_time(input, now()));
    }

    #[test]
    fn should_schedule_later_today() {
        let result = parse_scheduled_time("18:45", now()).unwrap().unwrap();

        assert_eq!(&at(2025, 3, 14, 18, 45), result.at());
        assert!(!*result.postponed());
    }

    #[parameterized(
        input = {"09:30", "12:00", " 11:59 "},
        expected_result = {at(2025, 3, 15, 9, 30), at(2025, 3, 15, 12, 0), at(2025, 3, 15, 11, 59)}
    )]
    fn should_postpone_past_time_to_tomorrow(input: &str, expected_result: NaiveDateTime) {
        let result = parse_scheduled_time(input, now()).unwrap().unwrap();

        assert_eq!(&expected_result, result.at());
        assert!(*result.postponed());
    }

    #[test]
    fn should_postpone_to_next_month() {
        let now = at(2025, 3, 31, 23, 0);

        let result = parse_scheduled_time("08:00", now).unwrap().unwrap();

        assert_eq!(&at(2025, 4, 1, 8, 0), result.at());
    }

    #[parameterized(
        input = {"2025-03-20 08:15", "2024-01-01 00:00"},
        expected_result = {at(2025, 3, 20, 8, 15), at(2024, 1, 1, 0, 0)}
    )]
    fn should_schedule_full_date_time(input: &str, expected_result: NaiveDateTime) {
        let result = parse_scheduled_time(input, now()).unwrap().unwrap();

        assert_eq!(&expected_result, result.at());
        assert!(!*result.postponed());
    }

    #[parameterized(
        input = {"25:99", "not-a-date", "12:61", "noon:", "2025-13-01 10:00", "2025-03-20", "2025-03-20T08:15", "12:30:45"}
    )]
    fn should_reject_malformed_schedule(input: &str) {
        let error = parse_scheduled_time(input, now()).unwrap_err();

        assert_eq!(InvalidSchedule(input.to_owned()), error);
    }

    #[test]
    fn should_mention_accepted_formats_in_error() {
        let error = parse_scheduled_time("25:99", now()).unwrap_err();

        let message = error.to_string();
        assert!(message.contains("25:99"));
        assert!(message.contains("HH:MM"));
        assert!(message.contains("YYYY-MM-DD HH:MM"));
    }
    // endregion

    // region report_schedule
    #[test]
    fn should_start_immediately_without_schedule() {
        assert_eq!(None, report_schedule(None, now(), &Reporter::default()));
    }

    #[parameterized(
        input = {"13:00", "09:30", "2024-01-01 00:00"},
        expected_result = {at(2025, 3, 14, 13, 0), at(2025, 3, 15, 9, 30), at(2024, 1, 1, 0, 0)}
    )]
    fn should_start_at_scheduled_time(input: &str, expected_result: NaiveDateTime) {
        let scheduled_time = parse_scheduled_time(input, now()).unwrap();

        let result = report_schedule(scheduled_time, now(), &Reporter::default());

        assert_eq!(Some(expected_result), result);
    }
    // endregion

    // region wait_until
    #[tokio::test(start_paused = true)]
    async fn should_wait_until_target() {
        let clock = TokioClock::new(now());
        let started = Instant::now();
        let target = now() + TimeDelta::seconds(12);

        let result = wait_until(target, &clock, &Reporter::default(), std::future::pending()).await;

        assert_eq!(Ok(()), result);
        assert!(clock.now() >= target);
        assert!(started.elapsed() < Duration::from_secs(12) + POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_wait_when_target_is_past() {
        let clock = TokioClock::new(now());
        let started = Instant::now();

        let result = wait_until(at(2025, 3, 14, 11, 0), &clock, &Reporter::default(), std::future::pending()).await;

        assert_eq!(Ok(()), result);
        assert_eq!(Duration::ZERO, started.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_waiting_when_cancelled() {
        let clock = TokioClock::new(now());
        let target = now() + TimeDelta::hours(2);

        let result = wait_until(target, &clock, &Reporter::default(), tokio::time::sleep(Duration::from_secs(7))).await;

        assert_eq!(Err(Cancelled), result);
        assert!(clock.now() < target);
    }
    // endregion

    #[parameterized(
        remaining = {TimeDelta::seconds(59), TimeDelta::seconds(3 * 3600 + 25 * 60 + 7), TimeDelta::seconds(2 * 24 * 3600 + 3661)},
        expected_result = {"00:00:59", "03:25:07", "2 day(s), 01:01:01"}
    )]
    fn should_format_remaining_time(remaining: TimeDelta, expected_result: &str) {
        assert_eq!(expected_result, format_remaining(remaining));
    }
}
