//! Daily schedule driver
//!
//! One background task owns the whole daily cycle: refresh the index at the
//! configured refresh time, then hand the day's posts to the delivery
//! transport at post time. The original cycle posts on weekdays only, which
//! stays configurable here.

use crate::config::{parse_time, ScheduleConfig};
use crate::service::{ComicService, DailyPost};
use crate::Result;
use async_trait::async_trait;
use chrono::{Datelike, Duration, Local, NaiveDateTime, NaiveTime, Weekday};

/// Outbound transport for daily posts
///
/// The messaging layer implements this; the core only exposes entries.
/// `deliver` may return the transport's identifier for the uploaded image so
/// repeat posts can reuse it instead of re-uploading the binary.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, post: &DailyPost) -> Result<Option<String>>;
}

/// Delivery stand-in that only logs what would be sent
pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    async fn deliver(&self, post: &DailyPost) -> Result<Option<String>> {
        tracing::info!(
            "Would post {} ({}) to destination {}",
            post.caption,
            post.entry.date,
            post.destination_id
        );
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Refresh,
    Post,
}

/// Next local fire time for a daily `at` schedule
pub fn next_occurrence(now: NaiveDateTime, at: NaiveTime, weekdays_only: bool) -> NaiveDateTime {
    let mut date = now.date();
    if now.time() >= at {
        date += Duration::days(1);
    }

    if weekdays_only {
        while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Duration::days(1);
        }
    }

    date.and_time(at)
}

/// Runs the daily refresh/post cycle forever
pub async fn run(
    service: &ComicService,
    delivery: &dyn Delivery,
    config: &ScheduleConfig,
) -> Result<()> {
    let refresh_at = parse_time(&config.refresh_time)?;
    let post_at = parse_time(&config.post_time)?;

    loop {
        let now = Local::now().naive_local();
        let next_refresh = next_occurrence(now, refresh_at, config.weekdays_only);
        let next_post = next_occurrence(now, post_at, config.weekdays_only);

        let (when, job) = if next_refresh <= next_post {
            (next_refresh, Job::Refresh)
        } else {
            (next_post, Job::Post)
        };

        let wait = (when - now).to_std().unwrap_or_default();
        tracing::info!("Next {:?} at {}", job, when);
        tokio::time::sleep(wait).await;

        // Failures end the cycle's step, never the loop
        match job {
            Job::Refresh => {
                if let Err(e) = service.refresh_all().await {
                    tracing::error!("Scheduled refresh failed: {}", e);
                }
            }
            Job::Post => {
                if let Err(e) = post_daily(service, delivery).await {
                    tracing::error!("Scheduled posting failed: {}", e);
                }
            }
        }
    }
}

/// Delivers today's strip to every subscribed destination
pub async fn post_daily(service: &ComicService, delivery: &dyn Delivery) -> Result<()> {
    let posts = service.daily_posts().await?;
    tracing::info!("Posting {} daily strips", posts.len());

    for post in &posts {
        match delivery.deliver(post).await {
            Ok(Some(file_id)) => {
                service
                    .note_remote_upload(&post.entry.image_ref, &file_id)
                    .await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Delivery to destination {} failed: {}", post.destination_id, e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(text: &str) -> NaiveTime {
        NaiveTime::parse_from_str(text, "%H:%M").unwrap()
    }

    fn datetime(y: i32, m: u32, d: u32, time: &str) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_time(at(time))
    }

    #[test]
    fn test_same_day_when_before_fire_time() {
        // Friday morning
        let now = datetime(2024, 1, 5, "09:00");
        assert_eq!(
            next_occurrence(now, at("12:00"), true),
            datetime(2024, 1, 5, "12:00")
        );
    }

    #[test]
    fn test_next_day_when_past_fire_time() {
        let now = datetime(2024, 1, 3, "13:00");
        assert_eq!(
            next_occurrence(now, at("12:00"), false),
            datetime(2024, 1, 4, "12:00")
        );
    }

    #[test]
    fn test_weekend_skipped() {
        // Friday afternoon rolls over to Monday
        let now = datetime(2024, 1, 5, "13:00");
        assert_eq!(
            next_occurrence(now, at("12:00"), true),
            datetime(2024, 1, 8, "12:00")
        );

        // Saturday fires on Monday too
        let now = datetime(2024, 1, 6, "09:00");
        assert_eq!(
            next_occurrence(now, at("12:00"), true),
            datetime(2024, 1, 8, "12:00")
        );
    }

    #[test]
    fn test_weekend_kept_without_weekday_filter() {
        let now = datetime(2024, 1, 6, "09:00");
        assert_eq!(
            next_occurrence(now, at("12:00"), false),
            datetime(2024, 1, 6, "12:00")
        );
    }

    #[test]
    fn test_exact_fire_time_rolls_forward() {
        let now = datetime(2024, 1, 3, "12:00");
        assert_eq!(
            next_occurrence(now, at("12:00"), false),
            datetime(2024, 1, 4, "12:00")
        );
    }
}
