use itertools::Itertools;
use thiserror::Error;
use url::Url;

use crate::{
    configuration::{ScrapeSettings, SiteSettings},
    domain::{search::SearchParameters, selector::SearchFormLocators},
};

use super::{
    first_present, wait_for_location_change, wait_until, BrowserSession, PageElement,
    SessionError,
};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid site url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("search results page did not load")]
    ResultsTimeout,
}

fn slug(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .join("-")
}

/// `{base}/{keywords}-jobs-in-{location}?experience=N`, dropping the
/// `-in-{location}` part when no location is given.
pub fn build_search_url(
    base_url: &str,
    params: &SearchParameters,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base_url)?;
    let location = slug(params.location());
    let path = match location.is_empty() {
        true => format!("/{}-jobs", slug(params.keywords())),
        false => format!("/{}-jobs-in-{}", slug(params.keywords()), location),
    };
    url.set_path(&path);
    url.query_pairs_mut()
        .append_pair("experience", &params.experience_years().to_string());

    Ok(url.to_string())
}

/// Opens a results page for `params` and returns its location.
///
/// Drives the site's search bar first. When the bar or its keyword input
/// is missing, or submitting it does not navigate, goes straight to a
/// search url instead.
pub async fn submit_search<S: BrowserSession>(
    session: &S,
    locators: &SearchFormLocators,
    site: &SiteSettings,
    params: &SearchParameters,
    settings: &ScrapeSettings,
) -> Result<String, SearchError> {
    log::info!("Navigating to search page {}", site.search_url);
    session.navigate(&site.search_url).await?;

    match fill_search_form(session, locators, params, settings).await? {
        true => {
            let location = session.current_location().await?;
            log::info!("Search form submitted, results at {}", location);
            Ok(location)
        }
        false => open_search_url(session, site, params, settings).await,
    }
}

/// Returns whether submitting the form navigated away from the search page.
async fn fill_search_form<S: BrowserSession>(
    session: &S,
    locators: &SearchFormLocators,
    params: &SearchParameters,
    settings: &ScrapeSettings,
) -> Result<bool, SessionError> {
    let search_bars = &locators.search_bar;
    let bar_ready = wait_until(
        settings.navigation_wait(),
        settings.poll_interval(),
        move || async move { first_present(session, search_bars).await.is_some() },
    )
    .await;
    if !bar_ready {
        log::warn!("Search bar not found, falling back to search url");
        return Ok(false);
    }
    let Some(bar) = first_present(session, search_bars).await else {
        return Ok(false);
    };

    match bar.find_first(&locators.expander).await {
        Ok(Some(expander)) => {
            if let Err(e) = expander.click().await {
                log::warn!("Could not expand search bar: {:?}", e);
            }
        }
        _ => log::debug!("Search bar has no expander"),
    }

    let Ok(Some(keywords)) = bar.find_first(&locators.keywords).await else {
        log::warn!("Keyword input not found, falling back to search url");
        return Ok(false);
    };
    keywords.clear().await?;
    keywords.type_text(params.keywords()).await?;

    if let Err(e) = select_experience(session, &bar, locators, params.experience_years()).await {
        log::warn!("Could not select experience: {:?}", e);
    }

    if let Err(e) = enter_location(&bar, locators, params.location()).await {
        log::warn!("Could not enter location: {:?}", e);
    }

    let previous = session.current_location().await?;
    match bar.find_first(&locators.submit).await {
        Ok(Some(button)) => button.click().await?,
        _ => {
            log::warn!("Search button not found, falling back to search url");
            return Ok(false);
        }
    }

    let moved = wait_for_location_change(
        session,
        &previous,
        settings.navigation_wait(),
        settings.poll_interval(),
    )
    .await;
    if !moved {
        log::warn!("Search button did not navigate, falling back to search url");
    }
    Ok(moved)
}

async fn select_experience<S: BrowserSession>(
    session: &S,
    bar: &S::Element,
    locators: &SearchFormLocators,
    years: u8,
) -> Result<(), SessionError> {
    if let Some(dropdown) = bar.find_first(&locators.experience_dropdown).await? {
        dropdown.click().await?;
    }
    match session.find_first(&locators.experience_option(years)).await? {
        Some(option) => {
            option.click().await?;
            log::info!("Selected {} years experience", years);
        }
        None => log::warn!("No experience option for {} years", years),
    }
    Ok(())
}

async fn enter_location<E: PageElement>(
    bar: &E,
    locators: &SearchFormLocators,
    location: &str,
) -> Result<(), SessionError> {
    let Some(input) = bar.find_first(&locators.location).await? else {
        log::warn!("Location input not found");
        return Ok(());
    };
    input.clear().await?;
    if !location.is_empty() {
        input.type_text(location).await?;
    }
    Ok(())
}

async fn open_search_url<S: BrowserSession>(
    session: &S,
    site: &SiteSettings,
    params: &SearchParameters,
    settings: &ScrapeSettings,
) -> Result<String, SearchError> {
    let target = build_search_url(&site.base_url, params)?;
    log::info!("Opening search url {}", target);
    session.navigate(&target).await?;

    let expected = Url::parse(&target)?;
    let expected_path = expected.path().to_string();
    let expected_path = expected_path.as_str();
    let loaded = wait_until(
        settings.navigation_wait(),
        settings.poll_interval(),
        move || async move {
            match session.current_location().await {
                Ok(location) => Url::parse(&location)
                    .map(|url| url.path() == expected_path)
                    .unwrap_or(false),
                Err(_) => false,
            }
        },
    )
    .await;

    match loaded {
        true => Ok(session.current_location().await?),
        false => Err(SearchError::ResultsTimeout),
    }
}

#[cfg(test)]
mod tests {
    use super::{build_search_url, submit_search, SearchError};
    use crate::{
        configuration::{test_scrape_settings, SiteSettings},
        domain::{search::SearchParameters, selector::SelectorCatalog},
        services::fake_browser::{ClickEffect, FakeElement, FakePage, FakeSession},
    };

    fn site() -> SiteSettings {
        SiteSettings {
            base_url: "https://jobs.test".to_string(),
            search_url: "https://jobs.test/jobs-in-india".to_string(),
            login_url: "https://jobs.test/nlogin/login".to_string(),
        }
    }

    fn params() -> SearchParameters {
        SearchParameters::new("Rust Developer", "Bengaluru", 3, 20).unwrap()
    }

    #[test]
    fn build_search_url_valid() {
        assert_eq!(
            build_search_url("https://jobs.test", &params()).unwrap(),
            "https://jobs.test/rust-developer-jobs-in-bengaluru?experience=3"
        );

        let anywhere = SearchParameters::new("C++ / Embedded", "", 0, 5).unwrap();
        assert_eq!(
            build_search_url("https://jobs.test/", &anywhere).unwrap(),
            "https://jobs.test/c-embedded-jobs?experience=0"
        );

        assert!(build_search_url("not a url", &params()).is_err());
    }

    #[tokio::test]
    async fn submit_search_drives_form() {
        let form = SelectorCatalog::naukri().search_form;
        let bar = FakeElement::new("")
            .child(form.expander.clone(), FakeElement::new(""))
            .child(form.keywords.clone(), FakeElement::new(""))
            .child(form.experience_dropdown.clone(), FakeElement::new(""))
            .child(form.location.clone(), FakeElement::new(""))
            .child(
                form.submit.clone(),
                FakeElement::new("").on_click(ClickEffect::NextPage),
            );
        let session = FakeSession::new(vec![
            FakePage::new("about:blank"),
            FakePage::new("https://jobs.test/jobs-in-india")
                .with(form.search_bar[0].clone(), bar)
                .with(form.experience_option(3), FakeElement::new("3 years")),
            FakePage::new("https://jobs.test/rust-developer-jobs-in-bengaluru"),
        ]);

        let location = submit_search(&session, &form, &site(), &params(), &test_scrape_settings())
            .await
            .unwrap();

        assert_eq!(location, "https://jobs.test/rust-developer-jobs-in-bengaluru");
        assert_eq!(session.typed(), vec!["Rust Developer", "Bengaluru"]);
    }

    #[tokio::test]
    async fn submit_search_falls_back_to_url() {
        let form = SelectorCatalog::naukri().search_form;
        let session = FakeSession::new(vec![
            FakePage::new("about:blank"),
            FakePage::new("https://jobs.test/jobs-in-india"),
        ]);

        let location = submit_search(&session, &form, &site(), &params(), &test_scrape_settings())
            .await
            .unwrap();

        assert_eq!(
            location,
            "https://jobs.test/rust-developer-jobs-in-bengaluru?experience=3"
        );
        assert!(session.typed().is_empty());
    }

    #[tokio::test]
    async fn submit_search_stalled_button_falls_back() {
        let form = SelectorCatalog::naukri().search_form;
        let bar = FakeElement::new("")
            .child(form.keywords.clone(), FakeElement::new(""))
            .child(
                form.submit.clone(),
                FakeElement::new("").on_click(ClickEffect::Stall),
            );
        let session = FakeSession::new(vec![
            FakePage::new("about:blank"),
            FakePage::new("https://jobs.test/jobs-in-india").with(form.search_bar[1].clone(), bar),
        ]);

        let location = submit_search(&session, &form, &site(), &params(), &test_scrape_settings())
            .await
            .unwrap();

        assert!(location.starts_with("https://jobs.test/rust-developer-jobs-in-bengaluru"));
        assert_eq!(session.typed(), vec!["Rust Developer"]);
    }

    #[tokio::test]
    async fn submit_search_broken_session() {
        let form = SelectorCatalog::naukri().search_form;
        let session = FakeSession::new(vec![FakePage::new("about:blank")]);
        session.break_session();

        let result = submit_search(&session, &form, &site(), &params(), &test_scrape_settings()).await;

        assert!(matches!(result, Err(SearchError::Session(_))));
    }
}
