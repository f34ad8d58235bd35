use crate::chunked::{COMMON_HEADERS, MANIFEST_CONTENT_TYPE, MEDIA_CONTENT_TYPE};
use crate::router::{route, Route};
use crate::simulator::{Reply, Simulator};
use bytes::Bytes;
use futures_util::stream;
use http_body_util::combinators::BoxBody;
use http_body_util::StreamBody;
use hyper::body::{Frame, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serves the simulated live stream. Segment requests are suspended on a timer
/// until the segment is due; if the client goes away the pending future is
/// dropped together with its timer.
#[derive(Clone)]
pub struct SimulatorService {
    simulator: Arc<Simulator>,
}

impl SimulatorService {
    pub fn new(simulator: Arc<Simulator>) -> Self {
        SimulatorService { simulator }
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<BoxBody<Bytes, Infallible>> {
        let target = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let route = match route(req.method(), &target) {
            Ok(route) => route,
            Err(e) => {
                info!("{}", e);
                return empty_response(StatusCode::METHOD_NOT_ALLOWED);
            }
        };

        if route == Route::NotFound {
            debug!("not found: {}", target);
        }

        match self.simulator.reply(route) {
            Reply::Manifest(mpd) => {
                chunked_response(MANIFEST_CONTENT_TYPE, std::iter::once(mpd))
            }
            Reply::Init(init) => chunked_response(MEDIA_CONTENT_TYPE, std::iter::once(init)),
            Reply::Segment {
                segment,
                delay,
                fragments,
            } => {
                self.simulator.gate().wait(delay).await;
                info!("HTTP-GET segment number: {}", segment);
                chunked_response(MEDIA_CONTENT_TYPE, fragments)
            }
            Reply::TooEarly { segment, delay } => {
                warn!(
                    "segment {} is {}ms in the future, rejecting",
                    segment,
                    delay.as_millis()
                );
                empty_response(StatusCode::SERVICE_UNAVAILABLE)
            }
            Reply::NotFound => empty_response(StatusCode::NOT_FOUND),
        }
    }
}

impl Service<Request<Incoming>> for SimulatorService {
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { Ok(this.handle(req).await) })
    }
}

/// Streams every payload as its own frame. The body has no known length, so
/// hyper sends it with chunked transfer coding, one chunk per payload, encoding
/// each payload only when the connection is ready for it.
fn chunked_response<I>(
    content_type: &'static str,
    payloads: I,
) -> Response<BoxBody<Bytes, Infallible>>
where
    I: Iterator<Item = Bytes> + Send + Sync + 'static,
{
    let frames = stream::iter(payloads.map(|payload| Ok::<_, Infallible>(Frame::data(payload))));
    let mut response = Response::new(BoxBody::new(StreamBody::new(frames)));
    add_common_headers(&mut response);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn empty_response(status: StatusCode) -> Response<BoxBody<Bytes, Infallible>> {
    let mut response = Response::new(BoxBody::default());
    *response.status_mut() = status;
    add_common_headers(&mut response);
    response
}

fn add_common_headers<B>(response: &mut Response<B>) {
    for (name, value) in COMMON_HEADERS {
        response
            .headers_mut()
            .insert(name, HeaderValue::from_static(value));
    }
}
