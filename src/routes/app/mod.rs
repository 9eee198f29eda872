pub mod dashboard_route;
pub mod run_route;
