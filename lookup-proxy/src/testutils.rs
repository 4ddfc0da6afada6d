use crate::errors::LookupError;
use crate::locale::Locale;
use crate::wiki_client::{
    DisplayText, EntityDisplay, EntitySearchResponse, EntitySearchResult, LangLink,
    LangLinksPage, PageImagesPage, QueryPages, QueryResponse, Thumbnail, WikiApi,
};
use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, Uri};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

/// Local HTTP server answering every request with a canned JSON body and
/// recording the request URIs it saw.
pub struct JsonServer {
    port: u16,
    requests: Arc<Mutex<Vec<Uri>>>,
}

impl JsonServer {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&Uri) -> (StatusCode, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        let responder = Arc::new(responder);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let responder = responder.clone();
                let seen = seen.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        seen.lock().unwrap().push(req.uri().clone());
                        let (status, body) = responder(req.uri());
                        let mut response = Response::new(Full::new(Bytes::from(body)));
                        *response.status_mut() = status;
                        async move { Ok::<_, Infallible>(response) }
                    });
                    let _ = Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        JsonServer { port, requests }
    }

    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}{}", self.port, path)).unwrap()
    }

    pub fn requests(&self) -> Vec<Uri> {
        self.requests.lock().unwrap().clone()
    }
}

/// Decoded query string of a recorded request
pub fn query_params(uri: &Uri) -> HashMap<String, String> {
    url::form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
        .into_owned()
        .collect()
}

/// A call received by [`MockWikiApi`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    LanguageLinks {
        locale: Locale,
        title: String,
        language: String,
    },
    PageImages {
        locale: Locale,
        titles: Vec<String>,
        thumbnail_size: u32,
    },
    SearchEntities {
        search: String,
        language: String,
    },
}

/// Scripted in-memory [`WikiApi`].
///
/// Titles not explicitly scripted have no interlanguage link and no search
/// result. Every call sleeps for its configured delay so concurrent calls
/// overlap, and the highest number of overlapping calls is recorded.
#[derive(Default)]
pub struct MockWikiApi {
    linked: HashSet<String>,
    failing: HashSet<String>,
    pages: Vec<(String, Option<String>)>,
    images_fail: bool,
    entities: HashMap<String, (String, String)>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    calls: Mutex<Vec<Call>>,
    inflight_at_start: Mutex<HashMap<String, usize>>,
    inflight: AtomicUsize,
    max_inflight: AtomicUsize,
}

impl MockWikiApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Titles that have an interlanguage link to the requested language
    pub fn with_linked<'a>(mut self, titles: impl IntoIterator<Item = &'a str>) -> Self {
        self.linked.extend(titles.into_iter().map(str::to_owned));
        self
    }

    /// Titles whose per-title calls fail
    pub fn with_failing<'a>(mut self, titles: impl IntoIterator<Item = &'a str>) -> Self {
        self.failing.extend(titles.into_iter().map(str::to_owned));
        self
    }

    /// Page returned by `page_images`, in call order
    pub fn with_page(mut self, title: &str, thumbnail: Option<&str>) -> Self {
        self.pages
            .push((title.to_owned(), thumbnail.map(str::to_owned)));
        self
    }

    pub fn with_failing_images(mut self) -> Self {
        self.images_fail = true;
        self
    }

    /// First search result returned for `search`
    pub fn with_entity(mut self, search: &str, label: &str, description: &str) -> Self {
        self.entities.insert(
            search.to_owned(),
            (label.to_owned(), description.to_owned()),
        );
        self
    }

    pub fn with_delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_owned(), delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls already in flight when the call for `key` started
    pub fn inflight_at_start(&self, key: &str) -> Option<usize> {
        self.inflight_at_start.lock().unwrap().get(key).copied()
    }

    pub fn max_inflight(&self) -> usize {
        self.max_inflight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: Call, key: &str) {
        self.calls.lock().unwrap().push(call);
        let previous = self.inflight.fetch_add(1, Ordering::SeqCst);
        self.inflight_at_start
            .lock()
            .unwrap()
            .insert(key.to_owned(), previous);
        let current = previous + 1;
        self.max_inflight.fetch_max(current, Ordering::SeqCst);

        let delay = self.delays.get(key).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.inflight.fetch_sub(1, Ordering::SeqCst);
    }

    fn fail(key: &str) -> LookupError {
        LookupError::UpstreamRequestFailed("mock".into(), format!("scripted failure for {key}"))
    }
}

#[async_trait]
impl WikiApi for MockWikiApi {
    async fn language_links(
        &self,
        locale: Locale,
        title: &str,
        language: &str,
    ) -> Result<QueryResponse<LangLinksPage>, LookupError> {
        let call = Call::LanguageLinks {
            locale,
            title: title.to_owned(),
            language: language.to_owned(),
        };
        self.enter(call, title).await;

        if self.failing.contains(title) {
            return Err(Self::fail(title));
        }

        let langlinks = match self.linked.contains(title) {
            true => vec![LangLink {
                lang: language.to_owned(),
            }],
            false => Vec::new(),
        };
        let mut pages = IndexMap::new();
        pages.insert("1".to_owned(), LangLinksPage { langlinks });
        Ok(QueryResponse {
            query: QueryPages { pages },
        })
    }

    async fn page_images(
        &self,
        locale: Locale,
        titles: &[String],
        thumbnail_size: u32,
    ) -> Result<QueryResponse<PageImagesPage>, LookupError> {
        let call = Call::PageImages {
            locale,
            titles: titles.to_vec(),
            thumbnail_size,
        };
        self.enter(call, "pageimages").await;

        if self.images_fail {
            return Err(Self::fail("pageimages"));
        }

        let pages = self
            .pages
            .iter()
            .enumerate()
            .map(|(id, (title, thumbnail))| {
                let page = PageImagesPage {
                    title: title.clone(),
                    thumbnail: thumbnail.clone().map(|source| Thumbnail { source }),
                };
                (id.to_string(), page)
            })
            .collect();
        Ok(QueryResponse {
            query: QueryPages { pages },
        })
    }

    async fn search_entities(
        &self,
        search: &str,
        language: &str,
    ) -> Result<EntitySearchResponse, LookupError> {
        let call = Call::SearchEntities {
            search: search.to_owned(),
            language: language.to_owned(),
        };
        self.enter(call, search).await;

        if self.failing.contains(search) {
            return Err(Self::fail(search));
        }

        let search = match self.entities.get(search) {
            Some((label, description)) => vec![EntitySearchResult {
                display: Some(EntityDisplay {
                    label: Some(DisplayText {
                        value: label.clone(),
                    }),
                    description: Some(DisplayText {
                        value: description.clone(),
                    }),
                }),
            }],
            None => Vec::new(),
        };
        Ok(EntitySearchResponse { search })
    }
}
