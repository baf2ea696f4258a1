use std::{fmt, time::Duration};

use rand::Rng;
use tokio::time::sleep;

use crate::{
    configuration::ScrapeSettings,
    domain::{search::PageCursor, selector::SelectorCatalog},
};

use super::{
    extract_listings, is_actionable, wait_for_location_change, BrowserSession, CancelFlag,
    PageElement, ResultSet, RunObserver,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DoneReason {
    Cancelled,
    MaxRecordsReached,
    EmptyPage,
    PageCeiling,
    /// No usable "next" control. Either the results really ended or the
    /// pager markup no longer matches; the two cannot be told apart.
    NextControlMissing,
}

impl fmt::Display for DoneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DoneReason::Cancelled => "cancelled",
            DoneReason::MaxRecordsReached => "reached the requested number of listings",
            DoneReason::EmptyPage => "page had no listings",
            DoneReason::PageCeiling => "reached the page limit",
            DoneReason::NextControlMissing => "end of results or pager markup changed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailReason {
    PagerStalled { waited_ms: u128 },
    Session(String),
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::PagerStalled { waited_ms } => write!(
                f,
                "pagination stalled: clicking next did not change the page within {} ms",
                waited_ms
            ),
            FailReason::Session(message) => write!(f, "browser session failed: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PagerState {
    Fetching,
    Extracting,
    Advancing { batch_empty: bool },
    Done(DoneReason),
    Failed(FailReason),
}

#[derive(Debug)]
pub struct PaginationOutcome {
    /// Always `Done` or `Failed`.
    pub state: PagerState,
    pub cursor: PageCursor,
}

/// Walks result pages one at a time, feeding each batch to the result set.
pub struct Paginator<'a, S: BrowserSession> {
    session: &'a S,
    catalog: &'a SelectorCatalog,
    settings: &'a ScrapeSettings,
    cursor: PageCursor,
}

impl<'a, S: BrowserSession> Paginator<'a, S> {
    pub fn new(
        session: &'a S,
        catalog: &'a SelectorCatalog,
        settings: &'a ScrapeSettings,
        start_url: String,
    ) -> Self {
        Paginator {
            session,
            catalog,
            settings,
            cursor: PageCursor::first(start_url),
        }
    }

    pub async fn run<O: RunObserver>(
        mut self,
        results: &mut ResultSet,
        observer: &mut O,
        cancel: &CancelFlag,
    ) -> PaginationOutcome {
        let mut state = PagerState::Fetching;

        loop {
            state = match state {
                PagerState::Fetching => self.fetch(cancel).await,
                PagerState::Extracting => self.extract(results, observer).await,
                PagerState::Advancing { batch_empty } => {
                    self.advance(results, batch_empty, observer, cancel).await
                }
                terminal => {
                    log::info!(
                        "Pagination finished on page {}: {:?}",
                        self.cursor.page_number,
                        terminal
                    );
                    return PaginationOutcome {
                        state: terminal,
                        cursor: self.cursor,
                    };
                }
            };
        }
    }

    async fn fetch(&self, cancel: &CancelFlag) -> PagerState {
        if cancel.is_requested() {
            return PagerState::Done(DoneReason::Cancelled);
        }
        sleep(self.settings.settle_delay()).await;
        PagerState::Extracting
    }

    async fn extract<O: RunObserver>(&self, results: &mut ResultSet, observer: &mut O) -> PagerState {
        let page = self.cursor.page_number;
        let batch = match extract_listings(self.session, self.catalog, self.settings.per_page_cap).await
        {
            Ok(batch) => batch,
            Err(e) => {
                log::error!("Extraction failed on page {}: {:?}", page, e);
                return PagerState::Failed(FailReason::Session(e.to_string()));
            }
        };

        let batch_empty = batch.is_empty();
        let found = batch.len();
        let stats = results.absorb(batch);
        log::info!(
            "Page {}: {} listings, {} new, {} duplicates (total {}/{})",
            page,
            found,
            stats.accepted,
            stats.duplicates,
            results.len(),
            results.max_records()
        );

        let filled = 80 * results.len() / results.max_records().max(1);
        let percent = 10 + filled.min(80) as u8;
        observer.on_progress(
            percent,
            &format!(
                "Page {}: found {} listings (total {}/{})",
                page,
                found,
                results.len(),
                results.max_records()
            ),
        );

        PagerState::Advancing { batch_empty }
    }

    async fn advance<O: RunObserver>(
        &mut self,
        results: &ResultSet,
        batch_empty: bool,
        observer: &mut O,
        cancel: &CancelFlag,
    ) -> PagerState {
        if cancel.is_requested() {
            return PagerState::Done(DoneReason::Cancelled);
        }
        if results.is_full() {
            return PagerState::Done(DoneReason::MaxRecordsReached);
        }
        if batch_empty {
            return PagerState::Done(DoneReason::EmptyPage);
        }
        if self.cursor.page_number >= self.settings.max_pages {
            return PagerState::Done(DoneReason::PageCeiling);
        }

        let Some(control) = self.locate_next().await else {
            log::warn!(
                "No next page control on page {}, stopping",
                self.cursor.page_number
            );
            return PagerState::Done(DoneReason::NextControlMissing);
        };

        let previous = match self.session.current_location().await {
            Ok(location) => location,
            Err(e) => return PagerState::Failed(FailReason::Session(e.to_string())),
        };

        if let Err(e) = control.click().await {
            return PagerState::Failed(FailReason::Session(format!(
                "next page click failed: {}",
                e
            )));
        }

        let bound = self.settings.navigation_wait();
        let moved = wait_for_location_change(
            self.session,
            &previous,
            bound,
            self.settings.poll_interval(),
        )
        .await;
        if !moved {
            log::error!("Location stayed at {} after clicking next", previous);
            return PagerState::Failed(FailReason::PagerStalled {
                waited_ms: bound.as_millis(),
            });
        }

        let location = match self.session.current_location().await {
            Ok(location) => location,
            Err(e) => return PagerState::Failed(FailReason::Session(e.to_string())),
        };
        self.cursor.advance(location);
        log::info!(
            "Moved to page {}: {}",
            self.cursor.page_number,
            self.cursor.current_url
        );
        observer.on_progress(
            10 + (80 * results.len() / results.max_records().max(1)).min(80) as u8,
            &format!("Loading page {}", self.cursor.page_number),
        );

        sleep(self.inter_page_delay()).await;
        PagerState::Fetching
    }

    /// First next-page candidate that is visible and enabled.
    async fn locate_next(&self) -> Option<S::Element> {
        for locator in self.catalog.next_page.iter() {
            match self.session.find_first(locator).await {
                Ok(Some(control)) => {
                    if is_actionable(&control).await {
                        return Some(control);
                    }
                    log::debug!("Next control via {} is not actionable", locator);
                }
                Ok(None) => {}
                Err(e) => log::debug!("Next control locator {} failed: {:?}", locator, e),
            }
        }
        None
    }

    fn inter_page_delay(&self) -> Duration {
        let jitter = match self.settings.inter_page_jitter_ms {
            0 => 0,
            max => rand::thread_rng().gen_range(0..=max),
        };
        Duration::from_millis(self.settings.inter_page_delay_ms + jitter)
    }
}
