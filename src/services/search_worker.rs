use std::{path::PathBuf, sync::Arc};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::{
    configuration::Settings,
    domain::{listing::Listing, search::SearchParameters, selector::SelectorCatalog},
};

use super::{
    authenticate, submit_search, BrowserSession, CancelFlag, Droid, FileSink, PagerState,
    Paginator, ResultSet, ResultSink, RunObserver,
};

pub struct SearchRequest {
    pub run_id: Uuid,
    pub params: SearchParameters,
    pub cancel: CancelFlag,
}

#[derive(Clone)]
pub struct SearchRequestSender {
    pub sender: UnboundedSender<SearchRequest>,
}

#[derive(Debug, Clone)]
pub enum RunEvent {
    Started {
        run_id: Uuid,
    },
    Progress {
        run_id: Uuid,
        percent: u8,
        message: String,
    },
    Completed {
        run_id: Uuid,
        listings: Vec<Listing>,
        files: Vec<PathBuf>,
    },
    Failed {
        run_id: Uuid,
        reason: String,
        listings: Vec<Listing>,
        files: Vec<PathBuf>,
    },
}

/// Forwards observer calls as [`RunEvent`]s tagged with one run id.
pub struct ChannelObserver {
    run_id: Uuid,
    sender: UnboundedSender<RunEvent>,
    files: Vec<PathBuf>,
}

impl ChannelObserver {
    pub fn new(run_id: Uuid, sender: UnboundedSender<RunEvent>) -> Self {
        ChannelObserver {
            run_id,
            sender,
            files: vec![],
        }
    }

    fn send(&self, event: RunEvent) {
        if self.sender.send(event).is_err() {
            log::error!("Run event receiver dropped, run {} is unobserved", self.run_id);
        }
    }
}

impl RunObserver for ChannelObserver {
    fn on_progress(&mut self, percent: u8, message: &str) {
        self.send(RunEvent::Progress {
            run_id: self.run_id,
            percent,
            message: message.to_string(),
        });
    }

    fn on_saved(&mut self, files: &[PathBuf]) {
        self.files = files.to_vec();
    }

    fn on_completed(&mut self, listings: &[Listing]) {
        self.send(RunEvent::Completed {
            run_id: self.run_id,
            listings: listings.to_vec(),
            files: self.files.clone(),
        });
    }

    fn on_failed(&mut self, reason: &str, partial: &[Listing]) {
        self.send(RunEvent::Failed {
            run_id: self.run_id,
            reason: reason.to_string(),
            listings: partial.to_vec(),
            files: self.files.clone(),
        });
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub listings: Vec<Listing>,
    pub files: Vec<PathBuf>,
    /// `None` when the run completed.
    pub failure: Option<String>,
}

/// Runs one search on an open session: sign in, search, paginate, persist.
/// The observer sees exactly one of `on_completed` or `on_failed`.
pub async fn execute_search<S: BrowserSession, O: RunObserver>(
    session: &S,
    catalog: &SelectorCatalog,
    settings: &Settings,
    params: &SearchParameters,
    sink: Arc<dyn ResultSink>,
    observer: &mut O,
    cancel: &CancelFlag,
) -> RunReport {
    let outcome = scrape(session, catalog, settings, params, observer, cancel).await;
    let (listings, failure) = match outcome {
        Ok(results) => (results, None),
        Err((reason, partial)) => (partial, Some(reason)),
    };

    let files = match listings.is_empty() {
        true => vec![],
        false => {
            observer.on_progress(95, &format!("Saving {} listings", listings.len()));
            match persist_blocking(sink, listings.clone(), params.clone()).await {
                Ok(files) => files,
                Err(e) => {
                    log::error!("Failed to persist listings: {:?}", e);
                    vec![]
                }
            }
        }
    };
    observer.on_saved(&files);

    match &failure {
        None => {
            observer.on_progress(100, &format!("Done: {} listings", listings.len()));
            observer.on_completed(&listings);
        }
        Some(reason) => observer.on_failed(reason, &listings),
    }

    RunReport {
        listings,
        files,
        failure,
    }
}

/// File writes run on the blocking pool, off the worker task.
async fn persist_blocking(
    sink: Arc<dyn ResultSink>,
    listings: Vec<Listing>,
    params: SearchParameters,
) -> anyhow::Result<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || sink.persist(&listings, &params)).await?
}

/// Completes a run cancelled while still queued, before any browser opens.
fn finish_if_cancelled<O: RunObserver>(request: &SearchRequest, observer: &mut O) -> bool {
    if !request.cancel.is_requested() {
        return false;
    }
    log::info!("Run {} was cancelled before it started", request.run_id);
    observer.on_completed(&[]);
    true
}

async fn scrape<S: BrowserSession, O: RunObserver>(
    session: &S,
    catalog: &SelectorCatalog,
    settings: &Settings,
    params: &SearchParameters,
    observer: &mut O,
    cancel: &CancelFlag,
) -> Result<Vec<Listing>, (String, Vec<Listing>)> {
    if let Some(credentials) = &settings.credentials {
        observer.on_progress(5, "Signing in");
        let authenticated = authenticate(
            session,
            &catalog.login,
            &settings.site.login_url,
            credentials,
            &settings.scrape,
        )
        .await
        .map_err(|e| (format!("login failed: {}", e), vec![]))?;
        if !authenticated {
            return Err(("login failed: session not authenticated".to_string(), vec![]));
        }
    }

    observer.on_progress(8, &format!("Searching for '{}' jobs", params.keywords()));
    let start_url = submit_search(
        session,
        &catalog.search_form,
        &settings.site,
        params,
        &settings.scrape,
    )
    .await
    .map_err(|e| (e.to_string(), vec![]))?;
    observer.on_progress(10, "Search results loaded");

    let mut results = ResultSet::new(params.max_records());
    let outcome = Paginator::new(session, catalog, &settings.scrape, start_url)
        .run(&mut results, observer, cancel)
        .await;

    match outcome.state {
        PagerState::Done(reason) => {
            log::info!(
                "Run finished after {} pages: {}",
                outcome.cursor.page_number,
                reason
            );
            Ok(results.into_listings())
        }
        PagerState::Failed(reason) => Err((reason.to_string(), results.into_listings())),
        other => Err((
            format!("pagination stopped in state {:?}", other),
            results.into_listings(),
        )),
    }
}

/// Executes queued searches one after another, each in a fresh browser.
pub async fn search_worker_handler(
    mut request_receiver: UnboundedReceiver<SearchRequest>,
    settings: Settings,
    event_sender: UnboundedSender<RunEvent>,
) {
    log::info!("Started search worker");
    let catalog = SelectorCatalog::naukri();
    let sink: Arc<dyn ResultSink> = Arc::new(FileSink::new(settings.output.clone()));

    while let Some(request) = request_receiver.recv().await {
        let run_id = request.run_id;
        log::info!(
            "Starting run {} for '{}' in '{}'",
            run_id,
            request.params.keywords(),
            request.params.location()
        );
        if event_sender.send(RunEvent::Started { run_id }).is_err() {
            log::error!("Run event receiver dropped, stopping search worker");
            break;
        }

        let mut observer = ChannelObserver::new(run_id, event_sender.clone());
        if finish_if_cancelled(&request, &mut observer) {
            continue;
        }

        let droid = match Droid::new(&settings.browser).await {
            Ok(droid) => droid,
            Err(e) => {
                log::error!("Could not open browser for run {}: {:?}", run_id, e);
                observer.on_failed(&e.to_string(), &[]);
                continue;
            }
        };

        let report = execute_search(
            &droid,
            &catalog,
            &settings,
            &request.params,
            sink.clone(),
            &mut observer,
            &request.cancel,
        )
        .await;
        log::info!(
            "Run {} ended with {} listings ({})",
            run_id,
            report.listings.len(),
            report.failure.as_deref().unwrap_or("completed")
        );

        if let Err(e) = droid.quit().await {
            log::error!("Failed to close browser for run {}: {:?}", run_id, e);
        }
    }
}
