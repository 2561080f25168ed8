pub mod default_route;
pub mod snapshot_route;
