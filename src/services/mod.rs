pub mod fetcher;
pub mod job_scraper;
pub mod pipeline;
pub mod reporter;
pub mod results_cache;
pub mod runner;
pub mod scheduler;
pub mod sweep;
pub mod text_extractor;

pub use fetcher::*;
pub use job_scraper::*;
pub use pipeline::*;
pub use reporter::*;
pub use results_cache::*;
pub use runner::*;
pub use scheduler::*;
pub use sweep::*;
pub use text_extractor::*;
