use crate::domain::{
    listing::{Listing, ListingDraft},
    selector::SelectorCatalog,
};

use super::{resolve_field, BrowserSession, SessionError};

/// Extracts up to `cap` listings from the current page, in document order.
///
/// Container lookup walks `catalog.containers` in order and keeps the first
/// locator that finds anything. Only when every locator errors does the
/// session error escape; field failures never do.
pub async fn extract_listings<S: BrowserSession>(
    session: &S,
    catalog: &SelectorCatalog,
    cap: usize,
) -> Result<Vec<Listing>, SessionError> {
    let mut containers = Vec::new();
    let mut last_error = None;
    let mut any_answered = false;

    for locator in catalog.containers.iter() {
        match session.find_all(locator).await {
            Ok(found) if !found.is_empty() => {
                log::info!("Found {} listing containers via {}", found.len(), locator);
                containers = found;
                any_answered = true;
                break;
            }
            Ok(_) => any_answered = true,
            Err(e) => {
                log::warn!("Container locator {} failed: {:?}", locator, e);
                last_error = Some(e);
            }
        }
    }

    if !any_answered {
        if let Some(e) = last_error {
            return Err(e);
        }
    }

    let mut listings = Vec::with_capacity(containers.len().min(cap));
    for (i, container) in containers.iter().take(cap).enumerate() {
        let mut draft = ListingDraft::default();
        for spec in catalog.fields.iter() {
            draft.apply(spec.field, resolve_field(container, spec).await);
        }
        let listing = draft.finish();

        match listing.has_title() {
            true => log::debug!(
                "Listing {}: '{}' at '{}' - {} - {}",
                i + 1,
                listing.title,
                listing.company,
                listing.experience,
                listing.location
            ),
            false => log::warn!("Listing {} has no resolvable title, keeping placeholders", i + 1),
        }
        listings.push(listing);
    }

    Ok(listings)
}
