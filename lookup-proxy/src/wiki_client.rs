use crate::config::Upstreams;
use crate::errors::LookupError;
use crate::locale::Locale;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// `action=query` response envelope. Pages are keyed by page id and kept in
/// the order upstream listed them.
#[derive(Debug, Deserialize)]
pub struct QueryResponse<P> {
    pub query: QueryPages<P>,
}

#[derive(Debug, Deserialize)]
pub struct QueryPages<P> {
    pub pages: IndexMap<String, P>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LangLinksPage {
    #[serde(default)]
    pub langlinks: Vec<LangLink>,
}

#[derive(Debug, Deserialize)]
pub struct LangLink {
    pub lang: String,
}

#[derive(Debug, Deserialize)]
pub struct PageImagesPage {
    pub title: String,
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub source: String,
}

/// `action=wbsearchentities` response
#[derive(Debug, Default, Deserialize)]
pub struct EntitySearchResponse {
    #[serde(default)]
    pub search: Vec<EntitySearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct EntitySearchResult {
    pub display: Option<EntityDisplay>,
}

#[derive(Debug, Deserialize)]
pub struct EntityDisplay {
    pub label: Option<DisplayText>,
    pub description: Option<DisplayText>,
}

#[derive(Debug, Deserialize)]
pub struct DisplayText {
    pub value: String,
}

/// Calls the lookup strategies make against Wikipedia and Wikidata.
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// Interlanguage links of `title` in the `locale` edition, restricted to
    /// `language`.
    async fn language_links(
        &self,
        locale: Locale,
        title: &str,
        language: &str,
    ) -> Result<QueryResponse<LangLinksPage>, LookupError>;

    /// Thumbnails for all `titles` in a single multi-title query.
    async fn page_images(
        &self,
        locale: Locale,
        titles: &[String],
        thumbnail_size: u32,
    ) -> Result<QueryResponse<PageImagesPage>, LookupError>;

    /// Wikidata entities matching `search`, labelled in `language`.
    async fn search_entities(
        &self,
        search: &str,
        language: &str,
    ) -> Result<EntitySearchResponse, LookupError>;
}

/// [`WikiApi`] over the public MediaWiki HTTP endpoints
#[derive(Clone)]
pub struct HttpWikiApi {
    client: reqwest::Client,
    upstreams: Upstreams,
}

impl HttpWikiApi {
    pub fn new(upstreams: Upstreams) -> Result<Self, LookupError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = upstreams.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(HttpWikiApi {
            client: builder.build()?,
            upstreams,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        params: &[(&str, &str)],
    ) -> Result<T, LookupError> {
        // Use host as identifier for error messages
        let upstream = url.host_str().unwrap_or(url.as_str()).to_string();

        let response = self
            .client
            .get(url.clone())
            .query(params)
            .send()
            .await
            .map_err(|e| LookupError::UpstreamRequestFailed(upstream.clone(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::UpstreamRequestFailed(
                upstream,
                format!("unexpected status {status}"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LookupError::UpstreamRequestFailed(upstream.clone(), e.to_string()))?;

        serde_json::from_slice(&body)
            .map_err(|e| LookupError::UpstreamPayload(upstream, e.to_string()))
    }
}

#[async_trait]
impl WikiApi for HttpWikiApi {
    async fn language_links(
        &self,
        locale: Locale,
        title: &str,
        language: &str,
    ) -> Result<QueryResponse<LangLinksPage>, LookupError> {
        let url = self.upstreams.wikipedia.for_locale(locale);
        self.get_json(
            url,
            &[
                ("action", "query"),
                ("titles", title),
                ("prop", "langlinks"),
                ("lllang", language),
                ("format", "json"),
                ("origin", "*"),
            ],
        )
        .await
    }

    async fn page_images(
        &self,
        locale: Locale,
        titles: &[String],
        thumbnail_size: u32,
    ) -> Result<QueryResponse<PageImagesPage>, LookupError> {
        let url = self.upstreams.wikipedia.for_locale(locale);
        let titles = titles.join("|");
        let thumbnail_size = thumbnail_size.to_string();
        self.get_json(
            url,
            &[
                ("action", "query"),
                ("format", "json"),
                ("prop", "pageimages"),
                ("pithumbsize", &thumbnail_size),
                ("origin", "*"),
                ("titles", &titles),
            ],
        )
        .await
    }

    async fn search_entities(
        &self,
        search: &str,
        language: &str,
    ) -> Result<EntitySearchResponse, LookupError> {
        self.get_json(
            &self.upstreams.wikidata,
            &[
                ("action", "wbsearchentities"),
                ("search", search),
                ("language", language),
                ("format", "json"),
                ("origin", "*"),
            ],
        )
        .await
    }
}
