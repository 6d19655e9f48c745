use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::dispatch_newsletter;
use crate::config::NewsletterSchedule;
use crate::state::AppContext;

/// First slot of `schedule` strictly after `now`.
pub fn next_run_after(now: DateTime<Utc>, schedule: NewsletterSchedule) -> DateTime<Utc> {
    let start_of_day = now
        - Duration::seconds(i64::from(now.num_seconds_from_midnight()))
        - Duration::nanoseconds(i64::from(now.nanosecond()));
    let days_ahead = (7 + i64::from(schedule.weekday.num_days_from_monday())
        - i64::from(now.weekday().num_days_from_monday()))
        % 7;
    let candidate =
        start_of_day + Duration::days(days_ahead) + Duration::hours(i64::from(schedule.hour));
    if candidate <= now {
        candidate + Duration::weeks(1)
    } else {
        candidate
    }
}

/// Runs the dispatcher at every scheduled slot until the returned token is cancelled.
pub fn start(ctx: Arc<AppContext>) -> CancellationToken {
    let cancel = CancellationToken::new();
    let schedule = ctx.config.newsletter;

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            info!(
                "newsletter scheduler started (every {:?} at {:02}:00 UTC)",
                schedule.weekday, schedule.hour
            );
            loop {
                let now = Utc::now();
                let next = next_run_after(now, schedule);
                let wait = (next - now).to_std().unwrap_or_default();
                info!("next newsletter run at {}", next);
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("newsletter scheduler stopped");
                        break;
                    }
                    _ = tokio::time::sleep(wait) => {
                        match dispatch_newsletter(&ctx).await {
                            Ok(report) => info!("scheduled newsletter run: {:?}", report),
                            Err(e) => error!("scheduled newsletter run aborted: {}", e),
                        }
                    }
                }
            }
        });
    }

    cancel
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn next_sunday_morning_from_midweek() {
        // 2024-03-06 is a Wednesday.
        let next = next_run_after(at(6, 12, 0), NewsletterSchedule::default());
        assert_eq!(next, at(10, 10, 0));
        assert_eq!(next.weekday(), Weekday::Sun);
    }

    #[test]
    fn same_day_before_and_after_the_slot() {
        let schedule = NewsletterSchedule::default();
        assert_eq!(next_run_after(at(10, 9, 59), schedule), at(10, 10, 0));
        assert_eq!(next_run_after(at(10, 10, 0), schedule), at(17, 10, 0));
        assert_eq!(next_run_after(at(10, 23, 30), schedule), at(17, 10, 0));
    }

    #[test]
    fn custom_weekday_and_hour() {
        let schedule = NewsletterSchedule {
            weekday: Weekday::Mon,
            hour: 7,
        };
        // Sunday evening to Monday morning.
        assert_eq!(next_run_after(at(10, 20, 0), schedule), at(11, 7, 0));
    }
}
