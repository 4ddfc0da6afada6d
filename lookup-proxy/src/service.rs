use crate::dispatcher::{Dispatcher, error_response};
use crate::errors::LookupError;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response};
use shared::http::{apply_cors_headers, full_body};
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Serves the dispatcher over HTTP.
///
/// Buffers the request body, hands the request to the [`Dispatcher`] and
/// decorates every response with the static CORS policy.
#[derive(Clone)]
pub struct LookupService {
    dispatcher: Arc<Dispatcher>,
}

impl LookupService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl Service<Request<Incoming>> for LookupService {
    type Response = Response<BoxBody<Bytes, LookupError>>;
    type Error = LookupError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let response = instrumented(self.dispatcher.clone(), req);
        Box::pin(async move { Ok(response.await.map(|body| full_body(body))) })
    }
}

/// Holds one unit of `requests.inflight` for as long as it lives, so a
/// request future dropped by hyper on client disconnect still releases it.
struct InflightGuard {
    gauge: metrics::Gauge,
}

impl InflightGuard {
    fn new() -> Self {
        let gauge = shared::gauge!(REQUESTS_INFLIGHT);
        gauge.increment(1.0);
        Self { gauge }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.gauge.decrement(1.0);
    }
}

/// [`serve`] wrapped with the request metrics. The request counts as in
/// flight from this call until the returned future completes or is dropped.
fn instrumented<B>(
    dispatcher: Arc<Dispatcher>,
    request: Request<B>,
) -> impl Future<Output = Response<Bytes>> + Send + 'static
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Display + Send,
{
    let started = Instant::now();
    let inflight = InflightGuard::new();

    async move {
        let response = serve(&dispatcher, request).await;
        drop(inflight);

        shared::histogram!(REQUEST_DURATION, "status" => response.status().as_str().to_owned())
            .record(started.elapsed().as_secs_f64());
        response
    }
}

/// Buffers `request` and runs it through the dispatcher.
pub async fn serve<B>(dispatcher: &Dispatcher, request: Request<B>) -> Response<Bytes>
where
    B: Body,
    B::Error: Display,
{
    let (parts, body) = request.into_parts();

    let mut response = match body.collect().await {
        Ok(collected) => {
            dispatcher
                .handle(Request::from_parts(parts, collected.to_bytes()))
                .await
        }
        Err(e) => error_response(&LookupError::RequestBodyError(e.to_string())),
    };

    apply_cors_headers(response.headers_mut());
    response
}
