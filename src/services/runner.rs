use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::domain::job_record::JobRecord;

use super::{EmailReporter, JobPipeline, PageFetcher, PipelineSnapshot, ResultsCache, RunPermit};

pub struct RunOutcome {
    pub snapshot: Option<Arc<PipelineSnapshot>>,
    /// None when no report was requested.
    pub delivered: Option<bool>,
}

impl RunOutcome {
    pub fn jobs(&self) -> &[JobRecord] {
        match &self.snapshot {
            Some(snapshot) => &snapshot.jobs,
            None => &[],
        }
    }
}

/// Runs the pipeline, publishes a successful run to the cache and emails it
/// to `recipient` when one is given. A failed run leaves the cache alone and
/// sends nothing. Returns None without running when another run is in flight.
pub async fn run_and_report<F: PageFetcher>(
    pipeline: &JobPipeline<F>,
    cache: &ResultsCache,
    reporter: &EmailReporter,
    recipient: Option<&str>,
) -> Option<RunOutcome> {
    let Some(permit) = cache.try_begin_run() else {
        log::warn!("A job scraping run is already in progress");
        return None;
    };

    Some(run_with_permit(permit, pipeline, cache, reporter, recipient).await)
}

/// Background run reported to the configured default recipient, if any.
/// Returns None when another run is in flight.
pub fn spawn_run<F: PageFetcher>(
    pipeline: JobPipeline<F>,
    cache: Arc<ResultsCache>,
    reporter: Arc<EmailReporter>,
) -> Option<JoinHandle<()>> {
    let Some(permit) = cache.try_begin_run() else {
        log::warn!("A job scraping run is already in progress, not starting another");
        return None;
    };

    Some(tokio::spawn(async move {
        log::info!("Starting background job scraping process...");
        let recipient = reporter.default_recipient().map(str::to_string);

        let outcome =
            run_with_permit(permit, &pipeline, &cache, &reporter, recipient.as_deref()).await;
        if let Some(snapshot) = outcome.snapshot {
            log::info!(
                "Background job scraping completed with {} jobs",
                snapshot.jobs.len()
            );
        }
    }))
}

async fn run_with_permit<F: PageFetcher>(
    _permit: RunPermit,
    pipeline: &JobPipeline<F>,
    cache: &ResultsCache,
    reporter: &EmailReporter,
    recipient: Option<&str>,
) -> RunOutcome {
    let Ok(snapshot) = pipeline.try_run().await else {
        return RunOutcome {
            snapshot: None,
            delivered: None,
        };
    };
    let snapshot = cache.publish(snapshot);

    let delivered = match recipient {
        Some(recipient) => Some(reporter.deliver(&snapshot.jobs, recipient).await),
        None => None,
    };

    RunOutcome {
        snapshot: Some(snapshot),
        delivered,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{run_and_report, spawn_run};
    use crate::{
        configuration::{EmailSettings, ReportFormat, ScraperSettings},
        domain::catalog::{Catalog, Category, Platform, SpaceEncoding},
        services::{
            fetcher::testing::{
                capture_logs, captured_logs, listing_page, PanickingFetcher, StaticFetcher,
            },
            EmailReporter, JobPipeline, PageFetcher, ResultsCache,
        },
    };

    fn pipeline<F: PageFetcher>(fetcher: F) -> JobPipeline<F> {
        let catalog = Catalog {
            categories: vec![Category {
                name: "translation".to_string(),
                terms: vec!["hebrew translation".to_string()],
            }],
            platforms: vec![Platform::new(
                "Alpha",
                "https://alpha.test/jobs?q={term}",
                SpaceEncoding::Percent,
            )],
        };
        let settings = ScraperSettings {
            pacing_delay_millis: 0,
            ..Default::default()
        };
        JobPipeline::new(fetcher, settings, catalog)
    }

    fn disabled_reporter() -> EmailReporter {
        EmailReporter::new(EmailSettings {
            smtp_host: String::new(),
            smtp_port: 25,
            starttls: false,
            username: None,
            password: None,
            sender: "jobbot@example.com".to_string(),
            default_recipient: None,
            format: ReportFormat::Html,
            timeout_secs: 1,
        })
    }

    fn fetcher() -> StaticFetcher {
        StaticFetcher::default().with_page(
            "https://alpha.test/jobs?q=hebrew%20translation",
            200,
            &listing_page(&["Hebrew translation of a short website, $40"]),
        )
    }

    #[tokio::test]
    async fn successful_run_is_published() {
        let cache = ResultsCache::default();

        let outcome = run_and_report(&pipeline(fetcher()), &cache, &disabled_reporter(), None)
            .await
            .unwrap();

        assert_eq!(outcome.jobs().len(), 1);
        assert_eq!(outcome.delivered, None);
        assert_eq!(cache.summary().job_count, 1);
    }

    #[tokio::test]
    async fn failed_delivery_keeps_the_jobs() {
        let cache = ResultsCache::default();

        let outcome = run_and_report(
            &pipeline(fetcher()),
            &cache,
            &disabled_reporter(),
            Some("someone@example.com"),
        )
        .await
        .unwrap();

        assert_eq!(outcome.delivered, Some(false));
        assert_eq!(outcome.jobs().len(), 1);
        assert_eq!(cache.latest().unwrap().jobs.len(), 1);
    }

    #[tokio::test]
    async fn background_run_updates_the_cache() {
        let cache = Arc::new(ResultsCache::default());

        spawn_run(pipeline(fetcher()), cache.clone(), Arc::new(disabled_reporter()))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(cache.summary().job_count, 1);
        assert!(!cache.is_running());
    }

    #[tokio::test]
    async fn failed_run_is_logged_once_and_not_published() {
        let cache = ResultsCache::default();
        capture_logs();

        let outcome = run_and_report(
            &pipeline(PanickingFetcher),
            &cache,
            &disabled_reporter(),
            Some("someone@example.com"),
        )
        .await
        .unwrap();

        assert!(outcome.snapshot.is_none());
        assert_eq!(outcome.delivered, None);
        assert!(cache.latest().is_none());
        assert!(!cache.is_running());

        let errors = captured_logs(log::Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error in job pipeline"));
    }

    #[tokio::test]
    async fn second_run_is_refused_while_one_is_in_flight() {
        let cache = Arc::new(ResultsCache::default());
        let reporter = Arc::new(disabled_reporter());

        let first = spawn_run(pipeline(fetcher()), cache.clone(), reporter.clone()).unwrap();
        assert!(spawn_run(pipeline(fetcher()), cache.clone(), reporter.clone()).is_none());
        assert!(run_and_report(&pipeline(fetcher()), &cache, &reporter, None)
            .await
            .is_none());

        first.await.unwrap();
        assert!(spawn_run(pipeline(fetcher()), cache.clone(), reporter).is_some());
    }
}
