use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::domain::listing::Listing;

/// Receives run progress. Exactly one of `on_completed`/`on_failed` is called
/// per run.
pub trait RunObserver: Send {
    fn on_progress(&mut self, percent: u8, message: &str);

    fn on_saved(&mut self, _files: &[PathBuf]) {}

    fn on_completed(&mut self, listings: &[Listing]);

    fn on_failed(&mut self, reason: &str, partial: &[Listing]);
}

/// Set by the front end, polled by the worker between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingObserver {
    pub progress: Vec<(u8, String)>,
    pub saved: Vec<PathBuf>,
    pub completed: Option<Vec<Listing>>,
    pub failed: Option<(String, Vec<Listing>)>,
}

#[cfg(test)]
impl RunObserver for RecordingObserver {
    fn on_progress(&mut self, percent: u8, message: &str) {
        self.progress.push((percent, message.to_string()));
    }

    fn on_saved(&mut self, files: &[PathBuf]) {
        self.saved = files.to_vec();
    }

    fn on_completed(&mut self, listings: &[Listing]) {
        self.completed = Some(listings.to_vec());
    }

    fn on_failed(&mut self, reason: &str, partial: &[Listing]) {
        self.failed = Some((reason.to_string(), partial.to_vec()));
    }
}
