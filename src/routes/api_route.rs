use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;

use crate::{
    domain::job_record::JobRecord,
    services::{spawn_run, EmailReporter, JobPipeline, ResultsCache},
};

#[derive(Serialize)]
struct RunStatus {
    status: &'static str,
}

#[get("/summary")]
async fn summary(cache: web::Data<ResultsCache>) -> HttpResponse {
    HttpResponse::Ok().json(cache.summary())
}

#[get("/jobs")]
async fn jobs(cache: web::Data<ResultsCache>) -> HttpResponse {
    match cache.latest() {
        Some(snapshot) => HttpResponse::Ok().json(&snapshot.jobs),
        None => HttpResponse::Ok().json(Vec::<JobRecord>::new()),
    }
}

/// Starts a run in the background; poll `/api/summary` for the result.
/// Answers 409 while another run is in flight.
#[post("/run")]
async fn trigger_run(
    pipeline: web::Data<JobPipeline>,
    cache: web::Data<ResultsCache>,
    reporter: web::Data<EmailReporter>,
) -> HttpResponse {
    match spawn_run(
        pipeline.get_ref().clone(),
        cache.into_inner(),
        reporter.into_inner(),
    ) {
        Some(_) => HttpResponse::Accepted().json(RunStatus { status: "started" }),
        None => HttpResponse::Conflict().json(RunStatus {
            status: "already_running",
        }),
    }
}
