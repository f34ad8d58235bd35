use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper::{header, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use simulator::api::http::server;
use simulator::availability::{Clock, SystemClock};
use simulator::isobmff::reader::{find, read_u32};
use simulator::simulator::Simulator;
use simulator::timing::Timing;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

struct TestServer {
    addr: SocketAddr,
    notifier: Arc<Notify>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start(simulator: Simulator) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let notifier = Arc::new(Notify::new());
        let handle = tokio::spawn({
            let notifier = notifier.clone();
            async move {
                server::serve(notifier, listener, Arc::new(simulator))
                    .await
                    .unwrap();
            }
        });

        Self {
            addr,
            notifier,
            handle,
        }
    }

    async fn send(&self, method: Method, path: &str) -> Response<Incoming> {
        let stream = TcpStream::connect(self.addr).await.unwrap();
        let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, self.addr.to_string())
            .body(Empty::<Bytes>::new())
            .unwrap();
        sender.send_request(req).await.unwrap()
    }

    async fn stop(self) {
        // wait until the accept loop is polling the shutdown signal
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.notifier.notify_waiters();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .unwrap()
            .unwrap();
    }
}

async fn data_frames(response: Response<Incoming>) -> Vec<Bytes> {
    let mut body = response.into_body();
    let mut frames = Vec::new();
    while let Some(frame) = body.frame().await {
        if let Ok(data) = frame.unwrap().into_data() {
            frames.push(data);
        }
    }
    frames
}

fn live_simulator() -> Simulator {
    Simulator::new(Timing::default(), Arc::new(SystemClock))
}

#[tokio::test]
async fn serves_manifest_and_init() {
    let server = TestServer::start(live_simulator()).await;

    let response = server.send(Method::GET, "/latency.mpd").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::TRANSFER_ENCODING], "chunked");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/dash+xml");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains(r#"type="dynamic""#));

    let response = server.send(Method::GET, "/init.mp4").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[4..8], b"ftyp");

    server.stop().await;
}

#[tokio::test]
async fn streams_live_segment() {
    let server = TestServer::start(live_simulator()).await;
    let live_edge = SystemClock.now_ms() / 1000;

    let response = server
        .send(Method::GET, &format!("/{}.m4s", live_edge))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let fragments = Timing::default().fragments_per_segment();
    let expected: Vec<u8> = live_simulator()
        .encoder()
        .encode_segment(live_edge)
        .unwrap()
        .flat_map(|f| f.to_vec())
        .collect();
    assert_eq!(&body[..], &expected[..]);

    let mfhd = find(&body, &[b"moof", b"mfhd"]).unwrap().unwrap();
    assert_eq!(
        read_u32(mfhd.payload, 4),
        Some((live_edge * fragments) as u32)
    );

    server.stop().await;
}

#[tokio::test]
async fn holds_future_segment_until_due() {
    let timing = Timing::new(100, 20).unwrap();
    let server = TestServer::start(Simulator::new(timing, Arc::new(SystemClock))).await;
    let n = SystemClock.now_ms() / 100 + 3;

    let response = server.send(Method::GET, &format!("/{}.m4s", n)).await;
    assert!(SystemClock.now_ms() >= n * 100);
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!data_frames(response).await.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn rejects_unknown_paths_and_methods() {
    let server = TestServer::start(live_simulator()).await;

    let response = server.send(Method::GET, "/foo").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(data_frames(response).await.is_empty());

    let response = server.send(Method::POST, "/init.mp4").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    server.stop().await;
}

#[tokio::test]
async fn client_disconnect_cancels_pending_wait() {
    let server = TestServer::start(live_simulator()).await;
    let n = SystemClock.now_ms() / 1000 + 60;

    let stream = TcpStream::connect(server.addr).await.unwrap();
    let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
    let conn = tokio::spawn(async move {
        let _ = conn.await;
    });
    let req = Request::builder()
        .uri(format!("/{}.m4s", n))
        .header(header::HOST, server.addr.to_string())
        .body(Empty::<Bytes>::new())
        .unwrap();
    let pending = tokio::spawn(async move { sender.send_request(req).await });

    // let the request reach the gate, then close the socket
    tokio::time::sleep(Duration::from_millis(100)).await;
    pending.abort();
    conn.abort();
    let _ = conn.await;

    let started = Instant::now();
    server.stop().await;
    assert!(started.elapsed() < Duration::from_secs(10));
}
