use itertools::Itertools;

use crate::domain::{catalog::Catalog, job_record::JobRecord};

use super::{JobScraper, PageFetcher};

/// One pass over every category, term and platform, in catalog order.
/// Results are concatenated as they come, duplicates included.
pub async fn scrape_all<F: PageFetcher>(
    scraper: &JobScraper<F>,
    catalog: &Catalog,
) -> Vec<JobRecord> {
    let mut all_jobs = vec![];

    for category in catalog.categories.iter() {
        log::info!("Scraping category: {}", category.name);

        for term in category.terms.iter() {
            for platform in catalog.platforms.iter() {
                match platform.target_for(term) {
                    Ok(target) => {
                        let jobs = scraper
                            .scrape(&target.url, &target.search_term, &target.platform)
                            .await;
                        all_jobs.extend(jobs);
                    }
                    Err(e) => log::error!(
                        "Skipping {} for {}, could not build search url: {:?}",
                        platform.name,
                        term,
                        e
                    ),
                }
            }
        }
    }

    all_jobs
}

/// Keeps the first job seen for every (title, platform) pair.
pub fn dedupe(jobs: Vec<JobRecord>) -> Vec<JobRecord> {
    jobs.into_iter()
        .unique_by(|job| (job.title.clone(), job.platform.clone()))
        .collect()
}
