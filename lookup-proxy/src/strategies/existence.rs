use super::fan_out;
use crate::errors::LookupError;
use crate::locale::Locale;
use crate::metrics_defs::UPSTREAM_FAILURES;
use crate::wiki_client::{LangLinksPage, QueryResponse, WikiApi};
use std::sync::Arc;

/// Finds the titles that have no interlanguage link to the target language.
///
/// Titles are checked in batches: every title of a batch is queried
/// concurrently, and the next batch starts only once the previous one has
/// fully completed. This bounds the number of in-flight upstream calls to the
/// batch size.
pub struct ExistenceCheck {
    api: Arc<dyn WikiApi>,
    batch_size: usize,
    language: String,
}

impl ExistenceCheck {
    pub fn new(api: Arc<dyn WikiApi>, batch_size: usize, language: String) -> Self {
        Self {
            api,
            batch_size: batch_size.max(1),
            language,
        }
    }

    /// Returns the titles lacking a link, in input order.
    pub async fn missing(&self, articles: &[String], locale: Locale) -> Vec<String> {
        let mut missing = Vec::new();

        for batch in articles.chunks(self.batch_size) {
            let results = fan_out(batch.iter().cloned(), |title| {
                let api = self.api.clone();
                let language = self.language.clone();
                async move { api.language_links(locale, &title, &language).await }
            })
            .await;

            for (title, result) in batch.iter().zip(results) {
                if !has_link_or_default(title, result) {
                    missing.push(title.clone());
                }
            }
        }

        missing
    }
}

/// A title counts as linked if any returned page carries a language link.
fn has_link(response: &QueryResponse<LangLinksPage>) -> bool {
    response
        .query
        .pages
        .values()
        .any(|page| !page.langlinks.is_empty())
}

/// Failed or panicked lookups count as "no link".
fn has_link_or_default(
    title: &str,
    result: Option<Result<QueryResponse<LangLinksPage>, LookupError>>,
) -> bool {
    match result {
        Some(Ok(response)) => has_link(&response),
        Some(Err(e)) => {
            tracing::warn!(title = %title, error = %e, "Language link lookup failed");
            shared::counter!(UPSTREAM_FAILURES, "strategy" => "existence").increment(1);
            false
        }
        None => false,
    }
}
