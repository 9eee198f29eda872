use std::{net::TcpListener, sync::Arc};

use actix_files::Files;
use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    routes::{api_route, dashboard_route, default_route, run_route},
    services::{EmailReporter, JobPipeline, ResultsCache},
};

pub fn run(
    listener: TcpListener,
    pipeline: JobPipeline,
    cache: Arc<ResultsCache>,
    reporter: Arc<EmailReporter>,
) -> Result<Server, std::io::Error> {
    let pipeline = web::Data::new(pipeline);
    let cache = web::Data::from(cache);
    let reporter = web::Data::from(reporter);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(Files::new("/static", "./templates/static").prefer_utf8(true))
            .service(default_route::default)
            .service(
                web::scope("/app")
                    .service(dashboard_route::dashboard)
                    .service(run_route::run_now),
            )
            .service(
                web::scope("/api")
                    .service(api_route::summary)
                    .service(api_route::jobs)
                    .service(api_route::trigger_run),
            )
            .app_data(pipeline.clone())
            .app_data(cache.clone())
            .app_data(reporter.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
