use crate::config::{Config, LookupSettings};
use crate::errors::LookupError;
use crate::metrics_defs::BATCH_SIZE;
use crate::protocol::{BatchRequest, ErrorBody, LookupMode};
use crate::strategies::{DescriptionFetch, ExistenceCheck, ImageFetch};
use crate::wiki_client::{HttpWikiApi, WikiApi};
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use hyper::body::Bytes;
use std::sync::Arc;

/// Hosting-agnostic entrypoint for batch lookups.
///
/// Takes a fully buffered request and always produces a response: validation
/// failures and unhandled errors are turned into JSON error bodies here, so
/// adapters only move bytes in and out.
pub struct Dispatcher {
    existence: ExistenceCheck,
    images: ImageFetch,
    descriptions: DescriptionFetch,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn WikiApi>, settings: &LookupSettings) -> Self {
        Self {
            existence: ExistenceCheck::new(
                api.clone(),
                settings.batch_size,
                settings.target_language.clone(),
            ),
            images: ImageFetch::new(
                api.clone(),
                settings.thumbnail_size,
                settings.fallback_image.clone(),
            ),
            descriptions: DescriptionFetch::new(api, settings.target_language.clone()),
        }
    }

    /// Builds a dispatcher talking to the configured upstreams.
    pub fn from_config(config: &Config) -> Result<Self, LookupError> {
        config.validate()?;
        let api = HttpWikiApi::new(config.upstreams.clone())?;
        Ok(Self::new(Arc::new(api), &config.lookup))
    }

    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let (parts, body) = request.into_parts();

        // Preflight never looks at the body
        if parts.method == Method::OPTIONS {
            let mut response = Response::new(Bytes::new());
            *response.status_mut() = StatusCode::NO_CONTENT;
            return response;
        }

        let result = match parts.method {
            Method::POST => match BatchRequest::from_slice(&body) {
                Ok(batch) => self.run(batch).await,
                Err(e) => Err(e),
            },
            method => Err(LookupError::MethodNotAllowed(method)),
        };

        match result {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(e) => error_response(&e),
        }
    }

    /// Runs the strategy selected by the batch and returns its JSON result.
    pub async fn run(&self, batch: BatchRequest) -> Result<Bytes, LookupError> {
        tracing::debug!(
            mode = batch.mode.as_str(),
            locale = %batch.locale,
            articles = batch.articles.len(),
            "Dispatching batch"
        );
        shared::histogram!(BATCH_SIZE, "mode" => batch.mode.as_str())
            .record(batch.articles.len() as f64);

        let body = match batch.mode {
            LookupMode::ExistenceCheck => serde_json::to_vec(
                &self.existence.missing(&batch.articles, batch.locale).await,
            )?,
            LookupMode::ImageFetch => {
                serde_json::to_vec(&self.images.fetch(&batch.articles, batch.locale).await)?
            }
            LookupMode::DescriptionFetch => {
                serde_json::to_vec(&self.descriptions.fetch(&batch.articles).await)?
            }
        };

        Ok(Bytes::from(body))
    }
}

fn json_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Bytes> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// JSON error response for a request that could not be served.
pub fn error_response(error: &LookupError) -> Response<Bytes> {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(error = %error, "Batch request failed");
    } else {
        tracing::debug!(status = %status, error = %error, "Rejected batch request");
    }

    let body = ErrorBody {
        error: error.to_string(),
    };
    match serde_json::to_vec(&body) {
        Ok(bytes) => json_response(status, bytes),
        Err(_) => shared::http::make_error_response(status),
    }
}
