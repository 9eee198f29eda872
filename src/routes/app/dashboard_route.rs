use actix_web::{get, web, HttpResponse};
use askama::Template;

use crate::{
    domain::job_record::TIMESTAMP_FORMAT,
    routes::render_template,
    services::{JobPipeline, JobRow, ResultsCache},
};

struct CategoryRow {
    name: String,
    terms: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    last_run: String,
    job_count: usize,
    jobs: Vec<JobRow>,
    categories: Vec<CategoryRow>,
}

#[get("/dashboard")]
async fn dashboard(
    cache: web::Data<ResultsCache>,
    pipeline: web::Data<JobPipeline>,
) -> HttpResponse {
    let (last_run, jobs) = match cache.latest() {
        Some(snapshot) => (
            snapshot.finished_at.format(TIMESTAMP_FORMAT).to_string(),
            snapshot.jobs.iter().map(JobRow::from).collect(),
        ),
        None => (String::new(), vec![]),
    };
    let categories = pipeline
        .catalog()
        .categories
        .iter()
        .map(|c| CategoryRow {
            name: c.name.clone(),
            terms: c.terms.join(", "),
        })
        .collect();

    render_template(DashboardTemplate {
        last_run,
        job_count: jobs.len(),
        jobs,
        categories,
    })
}
