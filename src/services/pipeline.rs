use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    configuration::ScraperSettings,
    domain::{catalog::Catalog, job_record::JobRecord},
};

use super::{dedupe, scrape_all, HttpFetcher, JobScraper, PageFetcher};

/// Outcome of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSnapshot {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub raw_count: usize,
    pub jobs: Vec<JobRecord>,
}

pub struct JobPipeline<F = HttpFetcher> {
    scraper: JobScraper<F>,
    catalog: Arc<Catalog>,
}

impl<F> Clone for JobPipeline<F> {
    fn clone(&self) -> Self {
        JobPipeline {
            scraper: self.scraper.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

impl<F: PageFetcher> JobPipeline<F> {
    pub fn new(fetcher: F, settings: ScraperSettings, catalog: Catalog) -> Self {
        JobPipeline {
            scraper: JobScraper::new(fetcher, settings),
            catalog: Arc::new(catalog),
        }
    }

    /// Same fetcher and settings, different search terms.
    pub fn with_catalog(&self, catalog: Catalog) -> Self {
        JobPipeline {
            scraper: self.scraper.clone(),
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Runs one sweep. A failed run is logged here, callers only decide
    /// what to do with the error.
    pub async fn try_run(&self) -> anyhow::Result<PipelineSnapshot> {
        let result = self.sweep().await;
        if let Err(e) = &result {
            log::error!("Error in job pipeline: {:?}", e);
        }
        result
    }

    pub async fn run_pipeline(&self) -> Vec<JobRecord> {
        self.try_run()
            .await
            .map(|snapshot| snapshot.jobs)
            .unwrap_or_default()
    }

    async fn sweep(&self) -> anyhow::Result<PipelineSnapshot> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        log::info!(
            "Starting job scraping run {} over {} targets",
            run_id,
            self.catalog.target_count()
        );

        // The sweep runs on its own task so a panic inside it surfaces here
        // as a join error instead of unwinding into the caller.
        let pipeline = self.clone();
        let all_jobs =
            tokio::spawn(async move { scrape_all(&pipeline.scraper, &pipeline.catalog).await })
                .await
                .with_context(|| format!("Job sweep task of run {} failed", run_id))?;

        let raw_count = all_jobs.len();
        let jobs = dedupe(all_jobs);
        log::info!(
            "Run {} completed. {} jobs scraped, {} unique",
            run_id,
            raw_count,
            jobs.len()
        );

        Ok(PipelineSnapshot {
            run_id,
            started_at,
            finished_at: Utc::now(),
            raw_count,
            jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::JobPipeline;
    use crate::{
        configuration::ScraperSettings,
        domain::catalog::{Catalog, Category, Platform, SpaceEncoding},
        services::fetcher::testing::{
            capture_logs, captured_logs, listing_page, PanickingFetcher, StaticFetcher,
        },
    };

    fn settings() -> ScraperSettings {
        ScraperSettings {
            pacing_delay_millis: 0,
            ..Default::default()
        }
    }

    fn catalog(terms: &[&str]) -> Catalog {
        Catalog {
            categories: vec![Category {
                name: "vocal_recording".to_string(),
                terms: terms.iter().map(|t| t.to_string()).collect(),
            }],
            platforms: vec![
                Platform::new("Alpha", "https://alpha.test/jobs?q={term}", SpaceEncoding::Percent),
                Platform::new("Beta", "https://beta.test/jobs?q={term}", SpaceEncoding::Percent),
            ],
        }
    }

    #[tokio::test]
    async fn run_dedupes_across_terms() {
        let page = listing_page(&[
            "Singer needed for vocal recording of a lullaby",
            "Female vocalist for a pop song demo, $80-$120",
        ]);
        let fetcher = StaticFetcher::default()
            .with_page("https://alpha.test/jobs?q=vocal", 200, &page)
            .with_page("https://alpha.test/jobs?q=singer", 200, &page)
            .with_page("https://beta.test/jobs?q=singer", 200, &page);
        let pipeline = JobPipeline::new(fetcher, settings(), catalog(&["vocal", "singer"]));

        let snapshot = pipeline.try_run().await.unwrap();

        assert_eq!(snapshot.raw_count, 4);
        let keys: Vec<(&str, &str)> = snapshot.jobs.iter().map(|j| j.identity()).collect();
        assert_eq!(
            keys,
            vec![
                ("Singer needed for vocal recording of a lullaby", "Alpha"),
                ("Female vocalist for a pop song demo, $80-$120", "Alpha"),
                ("Singer needed for vocal recording of a lullaby", "Beta"),
            ]
        );
        assert_eq!(snapshot.jobs[1].search_term, "vocal");
        assert_eq!(snapshot.jobs[1].budget.as_str(), "$80-$120");
        assert!(snapshot.started_at <= snapshot.finished_at);
    }

    #[tokio::test]
    async fn with_catalog_swaps_only_the_terms() {
        let pipeline = JobPipeline::new(StaticFetcher::default(), settings(), Catalog::default());
        let custom = pipeline.with_catalog(Catalog::from_keywords("mixing").unwrap());

        assert!(custom.run_pipeline().await.is_empty());
        assert_eq!(pipeline.catalog().categories.len(), 4);
        assert_eq!(custom.catalog().categories[0].name, "custom");
    }

    #[tokio::test]
    async fn unexpected_failure_becomes_an_empty_result() {
        let pipeline = JobPipeline::new(PanickingFetcher, settings(), catalog(&["vocal"]));

        assert!(pipeline.try_run().await.is_err());
        assert!(pipeline.run_pipeline().await.is_empty());
    }

    #[tokio::test]
    async fn failed_run_is_logged_once() {
        let pipeline = JobPipeline::new(PanickingFetcher, settings(), catalog(&["vocal"]));
        capture_logs();

        assert!(pipeline.run_pipeline().await.is_empty());

        let errors = captured_logs(log::Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error in job pipeline"));
    }
}
