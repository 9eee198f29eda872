use actix_web::{post, web, HttpResponse};
use askama::Template;
use serde::Deserialize;

use crate::{
    domain::catalog::Catalog,
    routes::render_template,
    services::{run_and_report, EmailReporter, JobPipeline, JobRow, ResultsCache},
};

#[derive(Deserialize)]
struct RunForm {
    email: Option<String>,
    keywords: Option<String>,
}

#[derive(Template)]
#[template(path = "result.html")]
struct ResultTemplate {
    jobs: Vec<JobRow>,
    busy: bool,
    failed: bool,
    delivery: String,
}

#[post("/run")]
async fn run_now(
    form: web::Form<RunForm>,
    pipeline: web::Data<JobPipeline>,
    cache: web::Data<ResultsCache>,
    reporter: web::Data<EmailReporter>,
) -> HttpResponse {
    let email = form
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    let pipeline = match form.keywords.as_deref().and_then(Catalog::from_keywords) {
        Some(catalog) => pipeline.with_catalog(catalog),
        None => pipeline.get_ref().clone(),
    };

    let Some(outcome) = run_and_report(&pipeline, &cache, &reporter, email).await else {
        return render_template(ResultTemplate {
            jobs: vec![],
            busy: true,
            failed: false,
            delivery: String::new(),
        });
    };

    let delivery = match (email, outcome.delivered) {
        (Some(address), Some(true)) => format!("Report sent to {}.", address),
        (Some(address), Some(false)) => format!("Could not send the report to {}.", address),
        _ => String::new(),
    };

    render_template(ResultTemplate {
        jobs: outcome.jobs().iter().map(JobRow::from).collect(),
        busy: false,
        failed: outcome.snapshot.is_none(),
        delivery,
    })
}
