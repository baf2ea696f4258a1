pub mod aggregator;
pub mod browser;
pub mod droid;
pub mod field_extractor;
pub mod listing_extractor;
pub mod login;
pub mod paginator;
pub mod persistence;
pub mod progress;
pub mod run_registry;
pub mod search_form;
pub mod search_worker;

#[cfg(test)]
pub mod fake_browser;

pub use aggregator::*;
pub use browser::*;
pub use droid::*;
pub use field_extractor::*;
pub use listing_extractor::*;
pub use login::*;
pub use paginator::*;
pub use persistence::*;
pub use progress::*;
pub use run_registry::*;
pub use search_form::*;
pub use search_worker::*;
