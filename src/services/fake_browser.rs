//! In-memory browser used by the unit tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::domain::selector::{Locator, SelectorCatalog};

use super::{BrowserSession, CancelFlag, PageElement, SessionError};

#[derive(Clone, Debug)]
pub enum ClickEffect {
    NextPage,
    Stall,
    GoTo(String),
}

#[derive(Clone, Default)]
pub struct FakeElement {
    text: String,
    attrs: HashMap<String, String>,
    props: HashMap<String, String>,
    children: HashMap<Locator, Vec<FakeElement>>,
    hidden: bool,
    disabled: bool,
    broken: bool,
    click: Option<ClickEffect>,
    state: Option<Arc<Mutex<FakeState>>>,
}

impl FakeElement {
    pub fn new(text: &str) -> Self {
        FakeElement {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// A property the browser computes, such as a resolved `href`.
    pub fn prop(mut self, name: &str, value: &str) -> Self {
        self.props.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, locator: Locator, child: FakeElement) -> Self {
        self.children.entry(locator).or_default().push(child);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Every read on this element errors.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.click = Some(effect);
        self
    }

    fn attached(&self, state: &Arc<Mutex<FakeState>>) -> Self {
        let mut element = self.clone();
        element.state = Some(state.clone());
        element
    }

    fn check(&self) -> Result<(), SessionError> {
        match self.broken {
            true => Err(SessionError::Unavailable("stale element".to_string())),
            false => Ok(()),
        }
    }

    fn children_for(&self, locator: &Locator) -> Vec<FakeElement> {
        let children = self.children.get(locator).cloned().unwrap_or_default();
        match &self.state {
            Some(state) => children.iter().map(|c| c.attached(state)).collect(),
            None => children,
        }
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn text(&self) -> Result<String, SessionError> {
        self.check()?;
        Ok(self.text.clone())
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, SessionError> {
        self.check()?;
        Ok(self.attrs.get(name).cloned())
    }

    async fn prop(&self, name: &str) -> Result<Option<String>, SessionError> {
        self.check()?;
        Ok(self.props.get(name).or(self.attrs.get(name)).cloned())
    }

    async fn is_displayed(&self) -> Result<bool, SessionError> {
        self.check()?;
        Ok(!self.hidden)
    }

    async fn is_enabled(&self) -> Result<bool, SessionError> {
        self.check()?;
        Ok(!self.disabled)
    }

    async fn find_first(&self, locator: &Locator) -> Result<Option<Self>, SessionError> {
        self.check()?;
        Ok(self.children_for(locator).into_iter().next())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self>, SessionError> {
        self.check()?;
        Ok(self.children_for(locator))
    }

    async fn click(&self) -> Result<(), SessionError> {
        self.check()?;
        let (Some(state), Some(effect)) = (&self.state, &self.click) else {
            return Ok(());
        };
        let mut state = lock(state)?;
        match effect {
            ClickEffect::NextPage => {
                let next = state.current + 1;
                state.open(next);
            }
            ClickEffect::Stall => {}
            ClickEffect::GoTo(url) => state.go_to(url),
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.check()
    }

    async fn type_text(&self, text: &str) -> Result<(), SessionError> {
        self.check()?;
        if let Some(state) = &self.state {
            lock(state)?.typed.push(text.to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakePage {
    url: String,
    elements: HashMap<Locator, Vec<FakeElement>>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        FakePage {
            url: url.to_string(),
            elements: HashMap::new(),
        }
    }

    pub fn with(mut self, locator: Locator, element: FakeElement) -> Self {
        self.elements.entry(locator).or_default().push(element);
        self
    }
}

#[derive(Default)]
struct FakeState {
    pages: Vec<FakePage>,
    current: usize,
    location: String,
    visited: Vec<usize>,
    typed: Vec<String>,
    cancel_on_page: Option<(usize, CancelFlag)>,
    broken: bool,
}

impl FakeState {
    fn open(&mut self, index: usize) {
        self.current = index;
        self.location = self
            .pages
            .get(index)
            .map(|p| p.url.clone())
            .unwrap_or_else(|| format!("about:blank#{}", index));
        self.visited.push(index);
    }

    fn go_to(&mut self, url: &str) {
        match self.pages.iter().position(|p| p.url == url) {
            Some(index) => self.open(index),
            None => {
                self.current = usize::MAX;
                self.location = url.to_string();
            }
        }
    }

    fn page(&self) -> Option<&FakePage> {
        self.pages.get(self.current)
    }
}

fn lock(state: &Mutex<FakeState>) -> Result<std::sync::MutexGuard<'_, FakeState>, SessionError> {
    state
        .lock()
        .map_err(|_| SessionError::Unavailable("fake state poisoned".to_string()))
}

pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSession {
    /// Starts on the first page.
    pub fn new(pages: Vec<FakePage>) -> Self {
        let mut state = FakeState {
            pages,
            ..Default::default()
        };
        state.open(0);
        FakeSession {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Requests cancellation as soon as the page at `index` is queried.
    pub fn cancel_when_visiting(self, index: usize, flag: CancelFlag) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.cancel_on_page = Some((index, flag));
        }
        self
    }

    /// Every document query errors from now on.
    pub fn break_session(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.broken = true;
        }
    }

    pub fn visited(&self) -> Vec<usize> {
        self.state
            .lock()
            .map(|s| s.visited.clone())
            .unwrap_or_default()
    }

    pub fn typed(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.typed.clone())
            .unwrap_or_default()
    }

    fn query(&self, locator: &Locator) -> Result<Vec<FakeElement>, SessionError> {
        let state = lock(&self.state)?;
        if state.broken {
            return Err(SessionError::Unavailable("session closed".to_string()));
        }
        if let Some((index, flag)) = &state.cancel_on_page {
            if *index == state.current {
                flag.request();
            }
        }
        let found = state
            .page()
            .and_then(|p| p.elements.get(locator))
            .cloned()
            .unwrap_or_default();
        Ok(found.iter().map(|e| e.attached(&self.state)).collect())
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        let mut state = lock(&self.state)?;
        if state.broken {
            return Err(SessionError::Unavailable("session closed".to_string()));
        }
        state.go_to(url);
        Ok(())
    }

    async fn current_location(&self) -> Result<String, SessionError> {
        Ok(lock(&self.state)?.location.clone())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>, SessionError> {
        self.query(locator)
    }

    async fn find_first(&self, locator: &Locator) -> Result<Option<FakeElement>, SessionError> {
        Ok(self.query(locator)?.into_iter().next())
    }
}

/// A result card shaped like the naukri markup the default catalog targets.
pub fn job_card(id: &str, title: &str, company: &str) -> FakeElement {
    FakeElement::new("")
        .attr("data-job-id", id)
        .child(
            Locator::xpath(".//h2/a[@class='title']"),
            FakeElement::new(title)
                .attr("href", &format!("/listing/{}", id))
                .prop("href", &format!("https://jobs.test/listing/{}", id)),
        )
        .child(
            Locator::xpath(".//a[@class='comp-name mw-25']"),
            FakeElement::new(company),
        )
        .child(
            Locator::xpath(".//span[@class='expwdth']"),
            FakeElement::new("2-5 Yrs").attr("title", "2-5 Yrs"),
        )
        .child(
            Locator::xpath(".//span[@class='locWdth']"),
            FakeElement::new("Bengaluru").attr("title", "Bengaluru, Pune"),
        )
        .child(
            Locator::xpath(".//li[@class='dot-gt tag-li ']"),
            FakeElement::new("rust"),
        )
        .child(
            Locator::xpath(".//li[@class='dot-gt tag-li ']"),
            FakeElement::new("tokio"),
        )
}

/// A result page holding `cards`, with a "Next" control when `next` is given.
pub fn results_page(url: &str, cards: Vec<FakeElement>, next: Option<ClickEffect>) -> FakePage {
    let catalog = SelectorCatalog::naukri();
    let mut page = FakePage::new(url);
    for card in cards {
        page = page.with(catalog.containers[0].clone(), card);
    }
    if let Some(effect) = next {
        page = page.with(
            catalog.next_page[0].clone(),
            FakeElement::new("Next").on_click(effect),
        );
    }
    page
}

/// `pages` result pages of `per_page` cards each, ids numbered from 1.
pub fn numbered_pages(pages: usize, per_page: usize) -> Vec<FakePage> {
    (0..pages)
        .map(|p| {
            let cards = (0..per_page)
                .map(|i| {
                    let id = (p * per_page + i + 1).to_string();
                    job_card(&id, &format!("Job {}", id), "Acme")
                })
                .collect();
            let next = (p + 1 < pages).then_some(ClickEffect::NextPage);
            results_page(&format!("https://jobs.test/rust-jobs-{}", p + 1), cards, next)
        })
        .collect()
}
