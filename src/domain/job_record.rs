use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    classifier::{is_job_request, matches_term},
    price::{extract_price, Budget},
};

/// Lines at or below this length are navigation noise.
const MIN_LINE_CHARS: usize = 20;
/// Lines at or above this length are rarely a single listing.
const MAX_LINE_CHARS: usize = 200;
const TITLE_CHARS: usize = 100;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub title: String,
    pub platform: String,
    pub search_term: String,
    pub budget: Budget,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn identity(&self) -> (&str, &str) {
        (&self.title, &self.platform)
    }
}

pub fn build_record(
    line: &str,
    search_term: &str,
    platform: &str,
    source_url: &str,
) -> Option<JobRecord> {
    let line = line.trim();
    if line.is_empty() || !is_job_request(line) || !matches_term(line, search_term) {
        return None;
    }

    let length = line.chars().count();
    if length <= MIN_LINE_CHARS || length >= MAX_LINE_CHARS {
        return None;
    }

    Some(JobRecord {
        title: line.chars().take(TITLE_CHARS).collect(),
        platform: platform.to_string(),
        search_term: search_term.to_string(),
        budget: extract_price(line),
        url: source_url.to_string(),
        scraped_at: Utc::now(),
    })
}
