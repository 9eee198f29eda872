use std::sync::Arc;

use crate::{
    configuration::ScraperSettings,
    domain::job_record::{build_record, JobRecord},
};

use super::{extract_readable_text, PageFetcher};

pub struct JobScraper<F> {
    fetcher: Arc<F>,
    settings: ScraperSettings,
}

impl<F> Clone for JobScraper<F> {
    fn clone(&self) -> Self {
        JobScraper {
            fetcher: self.fetcher.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<F: PageFetcher> JobScraper<F> {
    pub fn new(fetcher: F, settings: ScraperSettings) -> Self {
        JobScraper {
            fetcher: Arc::new(fetcher),
            settings,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Scrapes one search page. Never fails: an unreachable page or one
    /// without readable text gives no jobs. Waits the pacing delay before
    /// returning in every case.
    pub async fn scrape(&self, url: &str, search_term: &str, platform: &str) -> Vec<JobRecord> {
        log::info!("Scraping {} for: {}", platform, search_term);

        let jobs = match self.fetch_text(url).await {
            Ok(Some(text)) => {
                extract_jobs(&text, search_term, platform, url, self.settings.max_jobs_per_target)
            }
            Ok(None) => vec![],
            Err(e) => {
                log::error!("Error scraping {} for {}: {:?}", platform, search_term, e);
                vec![]
            }
        };

        tokio::time::sleep(self.settings.pacing_delay()).await;

        jobs
    }

    async fn fetch_text(&self, url: &str) -> anyhow::Result<Option<String>> {
        let page = self.fetcher.fetch(url).await?;
        if !page.is_ok() {
            log::error!("Got status {} from {}", page.status, url);
            return Ok(None);
        }

        let text = extract_readable_text(&page.body);
        if text.is_none() {
            log::info!("No readable text on {}", url);
        }

        Ok(text)
    }
}

fn extract_jobs(
    text: &str,
    search_term: &str,
    platform: &str,
    url: &str,
    max_jobs: usize,
) -> Vec<JobRecord> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| build_record(line, search_term, platform, url))
        .take(max_jobs)
        .collect()
}
