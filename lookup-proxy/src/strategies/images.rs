use crate::locale::Locale;
use crate::metrics_defs::UPSTREAM_FAILURES;
use crate::protocol::ArticleImage;
use crate::wiki_client::WikiApi;
use std::sync::Arc;

/// Resolves a thumbnail per title with a single multi-title query.
///
/// On success the result follows the pages upstream returned, in the order it
/// listed them: titles upstream merged (redirects, duplicates, normalisation)
/// come back as one entry under the upstream title. If the query fails as a
/// whole, every requested title maps to the fallback image, in input order.
pub struct ImageFetch {
    api: Arc<dyn WikiApi>,
    thumbnail_size: u32,
    fallback_image: String,
}

impl ImageFetch {
    pub fn new(api: Arc<dyn WikiApi>, thumbnail_size: u32, fallback_image: String) -> Self {
        Self {
            api,
            thumbnail_size,
            fallback_image,
        }
    }

    pub async fn fetch(&self, articles: &[String], locale: Locale) -> Vec<ArticleImage> {
        if articles.is_empty() {
            return Vec::new();
        }

        match self
            .api
            .page_images(locale, articles, self.thumbnail_size)
            .await
        {
            Ok(response) => response
                .query
                .pages
                .into_values()
                .map(|page| ArticleImage {
                    title: page.title,
                    image: page
                        .thumbnail
                        .map(|thumbnail| thumbnail.source)
                        .filter(|source| !source.is_empty())
                        .unwrap_or_else(|| self.fallback_image.clone()),
                })
                .collect(),
            Err(e) => {
                tracing::warn!(
                    articles = articles.len(),
                    locale = %locale,
                    error = %e,
                    "Page image lookup failed"
                );
                shared::counter!(UPSTREAM_FAILURES, "strategy" => "images").increment(1);
                self.fallback_for(articles)
            }
        }
    }

    fn fallback_for(&self, articles: &[String]) -> Vec<ArticleImage> {
        articles
            .iter()
            .map(|title| ArticleImage {
                title: title.clone(),
                image: self.fallback_image.clone(),
            })
            .collect()
    }
}
