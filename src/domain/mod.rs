pub mod catalog;
pub mod classifier;
pub mod job_record;
pub mod price;
