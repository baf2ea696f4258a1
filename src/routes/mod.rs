pub mod app;
pub mod default_route;
pub mod search_route;

pub use app::*;
