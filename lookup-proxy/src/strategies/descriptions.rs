use super::fan_out;
use crate::errors::LookupError;
use crate::metrics_defs::UPSTREAM_FAILURES;
use crate::protocol::ArticleDescription;
use crate::wiki_client::{EntitySearchResponse, WikiApi};
use std::sync::Arc;

/// Resolves a short description per title through Wikidata entity search.
///
/// All titles are searched concurrently. Only the first search result is
/// considered, and it is accepted only when its label is exactly the title
/// (underscores read as spaces) and it has a non-empty description. Anything
/// else, failures included, yields an empty description. The output has one
/// entry per input title, in input order.
pub struct DescriptionFetch {
    api: Arc<dyn WikiApi>,
    language: String,
}

impl DescriptionFetch {
    pub fn new(api: Arc<dyn WikiApi>, language: String) -> Self {
        Self { api, language }
    }

    pub async fn fetch(&self, articles: &[String]) -> Vec<ArticleDescription> {
        let results = fan_out(articles.iter().cloned(), |title| {
            let api = self.api.clone();
            let language = self.language.clone();
            async move { api.search_entities(&title, &language).await }
        })
        .await;

        articles
            .iter()
            .zip(results)
            .map(|(title, result)| ArticleDescription {
                title: title.clone(),
                description: description_or_default(title, result),
            })
            .collect()
    }
}

/// Description of the first search result, if it matches `title` exactly.
fn matching_description(title: &str, response: EntitySearchResponse) -> Option<String> {
    let display = response.search.into_iter().next()?.display?;
    let label = display.label?.value;
    let description = display.description?.value;

    (!description.is_empty() && label == title.replace('_', " ")).then_some(description)
}

fn description_or_default(
    title: &str,
    result: Option<Result<EntitySearchResponse, LookupError>>,
) -> String {
    match result {
        Some(Ok(response)) => matching_description(title, response).unwrap_or_default(),
        Some(Err(e)) => {
            tracing::warn!(title = %title, error = %e, "Entity search failed");
            shared::counter!(UPSTREAM_FAILURES, "strategy" => "descriptions").increment(1);
            String::new()
        }
        None => String::new(),
    }
}
