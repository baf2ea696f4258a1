use crate::domain::{
    listing::{ExtractionOutcome, FieldValue},
    selector::{FieldSpec, Read, Strategy, Target},
};

use super::{PageElement, SessionError};

/// Resolves one field of one listing. The first strategy whose element exists
/// and whose value passes its acceptance rule wins; failures fall through to
/// the next strategy and never escape.
pub async fn resolve_field<E: PageElement>(
    container: &E,
    spec: &FieldSpec,
) -> ExtractionOutcome {
    for strategy in spec.strategies.iter() {
        let attempt = match spec.field.is_multi_valued() {
            true => read_many(container, strategy).await,
            false => read_one(container, strategy).await,
        };

        match attempt {
            Ok(Some(value)) => {
                log::debug!("{:?} resolved by '{}'", spec.field, strategy.name);
                return ExtractionOutcome::Resolved {
                    value,
                    strategy: strategy.name,
                };
            }
            Ok(None) => {}
            Err(e) => log::debug!(
                "{:?} strategy '{}' failed: {:?}",
                spec.field,
                strategy.name,
                e
            ),
        }
    }

    ExtractionOutcome::Unresolved
}

async fn read_one<E: PageElement>(
    container: &E,
    strategy: &Strategy,
) -> Result<Option<FieldValue>, SessionError> {
    let value = match &strategy.target {
        Target::Container => read_value(container, &strategy.read).await?,
        Target::Descendant(locator) => match container.find_first(locator).await? {
            Some(element) => read_value(&element, &strategy.read).await?,
            None => return Ok(None),
        },
    };

    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| strategy.accept.admits(v))
        .map(FieldValue::Text))
}

async fn read_many<E: PageElement>(
    container: &E,
    strategy: &Strategy,
) -> Result<Option<FieldValue>, SessionError> {
    let elements = match &strategy.target {
        Target::Descendant(locator) => container.find_all(locator).await?,
        Target::Container => return read_one(container, strategy).await,
    };

    let mut items = Vec::with_capacity(elements.len());
    for element in elements.iter() {
        if let Some(value) = read_value(element, &strategy.read).await? {
            let value = value.trim();
            if strategy.accept.admits(value) {
                items.push(value.to_string());
            }
        }
    }

    Ok((!items.is_empty()).then_some(FieldValue::List(items)))
}

async fn read_value<E: PageElement>(
    element: &E,
    read: &Read,
) -> Result<Option<String>, SessionError> {
    match read {
        Read::Text => Ok(Some(element.text().await?)),
        Read::Attr(name) => element.attr(name).await,
        Read::Prop(name) => element.prop(name).await,
        Read::PropOfTitled(name) => match element.text().await?.trim().is_empty() {
            true => Ok(None),
            false => element.prop(name).await,
        },
        Read::AttrOrText(name) => match element.attr(name).await? {
            Some(value) if !value.trim().is_empty() => Ok(Some(value)),
            _ => Ok(Some(element.text().await?)),
        },
    }
}
