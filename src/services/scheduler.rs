use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveTime, Timelike};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::configuration::ScheduleSettings;

use super::{spawn_run, EmailReporter, JobPipeline, PageFetcher, ResultsCache};

/// Cron expression (seconds first) firing once a day at `HH:MM` UTC.
pub fn daily_cron(time: &str) -> anyhow::Result<String> {
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .with_context(|| format!("Invalid schedule time {:?}, expected HH:MM", time))?;
    Ok(format!("0 {} {} * * *", time.minute(), time.hour()))
}

/// Registers one daily job per configured time. Each trigger only spawns a
/// run, so a slow sweep never holds up the scheduler.
pub async fn start_scheduler<F: PageFetcher>(
    settings: &ScheduleSettings,
    pipeline: JobPipeline<F>,
    cache: Arc<ResultsCache>,
    reporter: Arc<EmailReporter>,
) -> anyhow::Result<Option<JobScheduler>> {
    if !settings.enabled {
        log::info!("Scheduler disabled");
        return Ok(None);
    }

    let scheduler = JobScheduler::new()
        .await
        .context("Failed to create scheduler")?;

    for time in settings.times.iter() {
        let cron = daily_cron(time)?;
        let pipeline = pipeline.clone();
        let cache = cache.clone();
        let reporter = reporter.clone();

        let job = Job::new_async(cron.as_str(), move |_uuid, _scheduler| {
            let pipeline = pipeline.clone();
            let cache = cache.clone();
            let reporter = reporter.clone();
            Box::pin(async move {
                log::info!("Running scheduled job scraper...");
                spawn_run(pipeline, cache, reporter);
            })
        })
        .with_context(|| format!("Failed to create scheduled job for {}", time))?;

        scheduler
            .add(job)
            .await
            .with_context(|| format!("Failed to add scheduled job for {}", time))?;
        log::info!("Job scraping scheduled daily at {} UTC", time);
    }

    scheduler
        .start()
        .await
        .context("Failed to start scheduler")?;
    log::info!("Scheduler started");

    Ok(Some(scheduler))
}

#[cfg(test)]
mod tests {
    use super::daily_cron;

    #[test]
    fn times_become_daily_cron_expressions() {
        assert_eq!(daily_cron("08:00").unwrap(), "0 0 8 * * *");
        assert_eq!(daily_cron(" 18:30 ").unwrap(), "0 30 18 * * *");
    }

    #[test]
    fn malformed_times_are_rejected() {
        assert!(daily_cron("8am").is_err());
        assert!(daily_cron("25:00").is_err());
        assert!(daily_cron("").is_err());
    }
}
