use crate::{
    configuration::{Credentials, ScrapeSettings},
    domain::selector::LoginLocators,
};

use super::{first_present, wait_until, BrowserSession, PageElement, SessionError};

/// Signs in through the login page. `Ok(false)` means the site refused the
/// credentials or the form never showed up; session errors escape.
pub async fn authenticate<S: BrowserSession>(
    session: &S,
    locators: &LoginLocators,
    login_url: &str,
    credentials: &Credentials,
    settings: &ScrapeSettings,
) -> Result<bool, SessionError> {
    log::info!("Navigating to login page {}", login_url);
    session.navigate(login_url).await?;

    let form_ready = wait_until(
        settings.navigation_wait(),
        settings.poll_interval(),
        move || async move { matches!(session.find_first(&locators.username).await, Ok(Some(_))) },
    )
    .await;
    if !form_ready {
        log::error!("Login form did not appear at {}", login_url);
        return Ok(false);
    }

    let Some(username) = session.find_first(&locators.username).await? else {
        return Ok(false);
    };
    username.clear().await?;
    username.type_text(&credentials.email).await?;

    let Some(password) = session.find_first(&locators.password).await? else {
        log::error!("Password field missing on login page");
        return Ok(false);
    };
    password.clear().await?;
    password.type_text(&credentials.password).await?;

    let Some(submit) = first_present(session, &locators.submit).await else {
        log::error!("Login button missing on login page");
        return Ok(false);
    };
    submit.click().await?;

    let left_login = wait_until(
        settings.navigation_wait(),
        settings.poll_interval(),
        move || async move {
            matches!(
                session.current_location().await,
                Ok(location) if !location.to_lowercase().contains("login")
            )
        },
    )
    .await;

    if left_login {
        log::info!("Login successful");
        return Ok(true);
    }

    for locator in locators.errors.iter() {
        if let Ok(Some(error)) = session.find_first(locator).await {
            let message = error.text().await.unwrap_or_default();
            if !message.trim().is_empty() {
                log::error!("Login rejected: {}", message.trim());
                return Ok(false);
            }
        }
    }

    log::error!("Still on the login page after submitting credentials");
    Ok(false)
}
