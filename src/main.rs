use std::{net::TcpListener, sync::Arc};

use env_logger::Env;
use gigscout::{
    configuration::get_configuration,
    domain::catalog::Catalog,
    services::{spawn_run, start_scheduler, EmailReporter, HttpFetcher, JobPipeline, ResultsCache},
    startup::run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration()?;

    let fetcher = HttpFetcher::new(&configuration.scraper)?;
    let pipeline = JobPipeline::new(fetcher, configuration.scraper.clone(), Catalog::default());
    let cache = Arc::new(ResultsCache::default());
    let reporter = Arc::new(EmailReporter::new(configuration.email.clone()));

    // Kept alive for the lifetime of the server
    let _scheduler = start_scheduler(
        &configuration.schedule,
        pipeline.clone(),
        cache.clone(),
        reporter.clone(),
    )
    .await?;

    if configuration.schedule.run_on_startup {
        spawn_run(pipeline.clone(), cache.clone(), reporter.clone());
    }

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    log::info!("Listening on {}", address);

    run(listener, pipeline, cache, reporter)?.await?;

    Ok(())
}
