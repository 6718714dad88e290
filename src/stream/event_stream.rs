// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Supervised websocket connection delivering chat events

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::frame::decode_frame;
use super::ConnectionStatus;
use crate::auth::AuthSession;
use crate::config::{DeliveryMode, StreamConfig};
use crate::error::{Error, Result};
use crate::http::{headers, RequestExecutor};
use crate::model::Event;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type SharedSink = Arc<tokio::sync::Mutex<Option<WsSink>>>;

/// Endpoint that hands out the realtime URL for a room
const WS_AUTH_PATH: &str = "/ws-auth";

#[derive(Debug, Deserialize)]
struct WsAuth {
    url: String,
}

/// Realtime chat events for one account.
///
/// [`EventStream::spawn`] starts a background task that logs in (reusing a
/// restored session on the first attempt), opens the websocket and forwards
/// decoded events. Any failure ends the attempt; the task then waits
/// `retry_delay` and tries again, forever, until [`EventStream::close`].
///
/// ```no_run
/// # async fn demo(session: sechat::AuthSession) -> sechat::Result<()> {
/// use sechat::{EventStream, StreamConfig};
///
/// let mut stream = EventStream::spawn(session, StreamConfig::new(1))?;
/// while let Some(event) = stream.recv().await {
///     println!("{}: {}", event.user_name, event.text_content);
/// }
/// # Ok(())
/// # }
/// ```
pub struct EventStream {
    events: mpsc::Receiver<Event>,
    status: watch::Receiver<ConnectionStatus>,
    shutdown: CancellationToken,
    sink: SharedSink,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
    dropped: Arc<AtomicU64>,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("status", &*self.status.borrow())
            .field("dropped_events", &self.dropped_events())
            .finish_non_exhaustive()
    }
}

impl EventStream {
    /// Start the background task. Must be called within a tokio runtime.
    pub fn spawn(session: AuthSession, config: StreamConfig) -> Result<Self> {
        let shutdown = CancellationToken::new();
        let executor = session.executor(shutdown.clone())?;
        let (events_tx, events) = mpsc::channel(config.channel_capacity.max(1));
        let (status_tx, status) = watch::channel(ConnectionStatus::Disconnected);
        let sink: SharedSink = Arc::new(tokio::sync::Mutex::new(None));
        let dropped = Arc::new(AtomicU64::new(0));

        let worker = Worker {
            session,
            executor,
            config,
            events: events_tx,
            status: status_tx,
            shutdown: shutdown.clone(),
            sink: Arc::clone(&sink),
            dropped: Arc::clone(&dropped),
        };
        let task = tokio::spawn(worker.run());

        Ok(Self {
            events,
            status,
            shutdown,
            sink,
            task: parking_lot::Mutex::new(Some(task)),
            dropped,
        })
    }

    /// Next event. `None` once the stream is closed and drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Connectivity updates
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Wait for the websocket to come up. `false` if the stream closed first.
    pub async fn wait_for_connected(&self) -> bool {
        let mut status = self.status.clone();
        loop {
            match *status.borrow_and_update() {
                ConnectionStatus::Connected => return true,
                ConnectionStatus::Closed => return false,
                _ => {}
            }
            if status.changed().await.is_err() {
                return status.borrow().is_connected();
            }
        }
    }

    /// Events discarded because the consumer was full (best-effort delivery)
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop the background task and wait for it to exit.
    ///
    /// No event is produced after this returns. Calling it again is a no-op.
    pub async fn close(&self) {
        self.shutdown.cancel();

        let sink = self.sink.lock().await.take();
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close().await {
                tracing::debug!(error = %e, "websocket close failed");
            }
        }

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "event stream task failed");
            }
            tracing::info!("event stream closed");
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Why the read loop ended
enum Exit {
    Shutdown,
    Disconnected,
}

struct Worker {
    session: AuthSession,
    executor: RequestExecutor,
    config: StreamConfig,
    events: mpsc::Sender<Event>,
    status: watch::Sender<ConnectionStatus>,
    shutdown: CancellationToken,
    sink: SharedSink,
    dropped: Arc<AtomicU64>,
}

impl Worker {
    async fn run(mut self) {
        let shutdown = self.shutdown.clone();
        let mut attempt = 0u64;

        loop {
            attempt += 1;

            let connected = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.connect(attempt == 1) => result,
            };

            match connected {
                Ok(reader) => {
                    tracing::info!(room_id = self.config.room_id, attempt, "connected to websocket");
                    self.status.send_replace(ConnectionStatus::Connected);
                    if let Exit::Shutdown = self.pump(reader).await {
                        break;
                    }
                }
                Err(e) if e.is_cancelled() => break,
                Err(e) => tracing::error!(error = %e, attempt, "connection attempt failed"),
            }

            self.drop_sink().await;
            self.status.send_replace(ConnectionStatus::Disconnected);
            tracing::info!("disconnected from websocket");

            if shutdown.is_cancelled() {
                break;
            }

            tracing::info!(delay_secs = self.config.retry_delay.as_secs(), "reconnecting");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.retry_delay) => {}
            }
        }

        self.drop_sink().await;
        self.status.send_replace(ConnectionStatus::Closed);
        tracing::info!("closing event channel");
    }

    /// Authenticate and open the websocket. The write half is parked in the
    /// shared slot so `close()` can reach it.
    async fn connect(&mut self, first_attempt: bool) -> Result<SplitStream<WsStream>> {
        if first_attempt && self.session.is_logged_in() {
            tracing::debug!("reusing restored session");
        } else {
            self.status.send_replace(ConnectionStatus::Authenticating);
            self.session.login().await?;
        }

        self.status.send_replace(ConnectionStatus::Connecting);

        let response = self
            .executor
            .post_form(WS_AUTH_PATH, &[("roomid", self.config.room_id.to_string())])
            .await?;
        let WsAuth { url } = response.json()?;

        let mut ws_url = Url::parse(&url)?;
        ws_url
            .query_pairs_mut()
            .append_pair("l", &self.config.last_event_id.to_string());

        let mut request = ws_url.as_str().into_client_request()?;
        let http = self.session.http();
        let request_headers = request.headers_mut();
        request_headers.insert(headers::ORIGIN, header_value(&self.session.endpoints().chat_origin)?);
        request_headers.insert(headers::USER_AGENT, header_value(&http.config().user_agent)?);
        if let Some(cookies) = http.cookie_jar().get_cookie_header(&ws_url) {
            request_headers.insert(headers::COOKIE, header_value(&cookies)?);
        }

        tracing::debug!(host = ?ws_url.host_str(), "opening websocket");
        let (ws, _) = tokio::time::timeout(
            http.config().timeout,
            tokio_tungstenite::connect_async(request),
        )
        .await
        .map_err(|_| Error::websocket_with_url("connect timed out", ws_url.as_str()))??;

        let (sink, reader) = ws.split();
        *self.sink.lock().await = Some(sink);
        Ok(reader)
    }

    async fn pump(&self, mut reader: SplitStream<WsStream>) -> Exit {
        loop {
            let next = tokio::select! {
                _ = self.shutdown.cancelled() => return Exit::Shutdown,
                next = reader.next() => next,
            };

            match next {
                Some(Ok(Message::Text(text))) => {
                    for event in decode_frame(&text) {
                        if !self.deliver(event).await {
                            return Exit::Shutdown;
                        }
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(frame = ?frame, "websocket closed by server");
                    return Exit::Disconnected;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    if self.shutdown.is_cancelled() {
                        return Exit::Shutdown;
                    }
                    tracing::error!(error = %e, "websocket read failed");
                    return Exit::Disconnected;
                }
                None => return Exit::Disconnected,
            }
        }
    }

    /// Hand one event to the consumer. `false` when the task should stop.
    async fn deliver(&self, event: Event) -> bool {
        match self.config.delivery {
            DeliveryMode::Blocking => tokio::select! {
                _ = self.shutdown.cancelled() => false,
                sent = self.events.send(event) => sent.is_ok(),
            },
            DeliveryMode::BestEffort => match self.events.try_send(event) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(event)) => {
                    let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::warn!(event_id = event.id, dropped, "consumer full, dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            },
        }
    }

    async fn drop_sink(&self) {
        let sink = self.sink.lock().await.take();
        if let Some(mut sink) = sink {
            let _ = sink.close().await;
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::websocket(format!("invalid header value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::{AuthState, Credentials};
    use crate::config::{ClientConfig, Endpoints};
    use crate::http::Cookie;

    type HandshakeResult = std::result::Result<Response, ErrorResponse>;

    fn posted(id: u64, text: &str) -> String {
        format!(
            r#"{{"event_type":1,"id":{},"content":"{}","room_id":1,"user_id":7,"user_name":"bob","message_id":{}}}"#,
            id,
            text,
            id + 100
        )
    }

    fn restored_session(server: &MockServer) -> AuthSession {
        let state = AuthState {
            fkey: "chat-fkey".into(),
            user_id: 9,
            cookies: vec![Cookie::new("acct", "t=1").domain("127.0.0.1")],
            ..AuthState::new(Credentials::new("me@example.com", "pw"))
        };
        let config = ClientConfig::new().endpoints(Endpoints::with_base(&server.uri()));
        AuthSession::restore(state, config).unwrap()
    }

    /// Serves one websocket client: sends the frames, then idles until the
    /// client goes away. Returns the handshake's Origin and Cookie headers.
    async fn serve_frames(frames: Vec<String>) -> (String, JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let seen = Arc::new(parking_lot::Mutex::new((String::new(), String::new())));
            let capture = Arc::clone(&seen);
            let callback = move |req: &Request, resp: Response| -> HandshakeResult {
                let header = |name: &str| {
                    req.headers()
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string()
                };
                *capture.lock() = (header("origin"), header("cookie"));
                Ok(resp)
            };
            let mut ws = tokio_tungstenite::accept_hdr_async(tcp, callback).await.unwrap();

            for frame in frames {
                ws.send(Message::Text(frame)).await.unwrap();
            }
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_close() {
                    break;
                }
            }
            let headers = seen.lock().clone();
            headers
        });

        (format!("ws://{}/events/1/abc", addr), handle)
    }

    async fn next_event(stream: &mut EventStream) -> Event {
        tokio::time::timeout(Duration::from_secs(5), stream.recv())
            .await
            .unwrap()
            .unwrap()
    }

    async fn mount_ws_auth(server: &MockServer, ws_url: &str) {
        Mock::given(method("POST"))
            .and(path("/ws-auth"))
            .and(body_string_contains("roomid=1"))
            .and(body_string_contains("fkey=chat-fkey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "url": ws_url })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_stream_delivers_deduplicated_events() {
        let server = MockServer::start().await;
        let frames = vec![
            format!(r#"{{"r1":{{"e":[{a},{a}]}},"r2":{{"e":[{a}]}}}}"#, a = posted(1, "first")),
            format!(r#"{{"r1":{{"e":[{},{}]}}}}"#, posted(1, "first"), posted(2, "second")),
        ];
        let (ws_url, ws_server) = serve_frames(frames).await;
        mount_ws_auth(&server, &ws_url).await;

        let mut stream = EventStream::spawn(restored_session(&server), StreamConfig::new(1)).unwrap();
        assert!(stream.wait_for_connected().await);

        let ids = vec![
            next_event(&mut stream).await.id,
            next_event(&mut stream).await.id,
            next_event(&mut stream).await.id,
        ];
        assert_eq!(ids, vec![1, 1, 2]);

        tokio::time::timeout(Duration::from_secs(5), stream.close()).await.unwrap();
        assert!(stream.recv().await.is_none());
        assert_eq!(*stream.status().borrow(), ConnectionStatus::Closed);

        let (origin, cookie) = ws_server.await.unwrap();
        assert_eq!(origin, server.uri());
        assert_eq!(cookie, "acct=t=1");
    }

    #[tokio::test]
    async fn test_best_effort_counts_drops() {
        let server = MockServer::start().await;
        let frames = vec![format!(
            r#"{{"r1":{{"e":[{},{},{}]}}}}"#,
            posted(1, "a"),
            posted(2, "b"),
            posted(3, "c")
        )];
        let (ws_url, _ws_server) = serve_frames(frames).await;
        mount_ws_auth(&server, &ws_url).await;

        let config = StreamConfig::best_effort(1, 1);
        let mut stream = EventStream::spawn(restored_session(&server), config).unwrap();

        let first = tokio::time::timeout(Duration::from_secs(5), stream.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(stream.dropped_events(), 2);

        stream.close().await;
    }

    /// Login steps 1 to 6 against the mock server. Sign-in is slowed down so
    /// the `Authenticating` status stays visible.
    async fn mount_relogin(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/users/signin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("{}/users/login", server.uri()))
                    .set_delay(Duration::from_millis(150)),
            )
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<form><input type="hidden" id="fkey" name="fkey" value="net-fkey" /></form>"#,
            ))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/affiliate/form/login/submit"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<html><body><noscript><a href="{}/complete">continue</a></noscript></body></html>"#,
                server.uri()
            )))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/complete"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/"))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="/users/9/me">me</a><input id="fkey" type="hidden" value="chat-fkey" />"#,
            ))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_reconnects_after_server_close() {
        let server = MockServer::start().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ws_url = format!("ws://{}/events/1/abc", listener.local_addr().unwrap());

        // First connection: one frame, then the server hangs up.
        // Second connection: one frame, then idle until the client leaves.
        let ws_server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Text(format!(r#"{{"r1":{{"e":[{}]}}}}"#, posted(1, "before"))))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(150)).await;
            ws.close(None).await.unwrap();
            drop(ws);

            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Text(format!(r#"{{"r1":{{"e":[{}]}}}}"#, posted(2, "after"))))
                .await
                .unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_close() {
                    break;
                }
            }
        });

        Mock::given(method("POST"))
            .and(path("/ws-auth"))
            .and(body_string_contains("fkey=chat-fkey"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "url": ws_url }))
                    .set_delay(Duration::from_millis(150)),
            )
            .expect(2)
            .mount(&server)
            .await;
        mount_relogin(&server).await;

        let config = StreamConfig::new(1).retry_delay(Duration::from_millis(200));
        let mut stream = EventStream::spawn(restored_session(&server), config).unwrap();

        let mut status = stream.status();
        let initial = *status.borrow_and_update();
        let observer = tokio::spawn(async move {
            let mut seen = vec![initial];
            while status.changed().await.is_ok() {
                let current = *status.borrow_and_update();
                if seen.last() != Some(&current) {
                    seen.push(current);
                }
                if current == ConnectionStatus::Closed {
                    break;
                }
            }
            seen
        });

        assert_eq!(next_event(&mut stream).await.id, 1);
        let second = next_event(&mut stream).await;
        assert_eq!(second.id, 2);
        assert_eq!(second.text_content, "after");

        tokio::time::timeout(Duration::from_secs(5), stream.close()).await.unwrap();
        ws_server.await.unwrap();

        let seen = tokio::time::timeout(Duration::from_secs(5), observer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            seen,
            vec![
                ConnectionStatus::Disconnected,
                ConnectionStatus::Connecting,
                ConnectionStatus::Connected,
                ConnectionStatus::Disconnected,
                ConnectionStatus::Authenticating,
                ConnectionStatus::Connecting,
                ConnectionStatus::Connected,
                ConnectionStatus::Closed,
            ]
        );
    }

    #[tokio::test]
    async fn test_close_interrupts_retry_wait() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/signin"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = ClientConfig::new().endpoints(Endpoints::with_base(&server.uri()));
        let session = AuthSession::new(Credentials::new("me@example.com", "pw"), config).unwrap();
        let mut stream = EventStream::spawn(session, StreamConfig::new(1)).unwrap();

        let mut status = stream.status();
        assert_eq!(*status.borrow_and_update(), ConnectionStatus::Disconnected);
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                status.changed().await.unwrap();
                if *status.borrow_and_update() == ConnectionStatus::Disconnected {
                    break;
                }
            }
        })
        .await
        .unwrap();

        tokio::time::timeout(Duration::from_secs(2), stream.close()).await.unwrap();
        assert!(stream.recv().await.is_none());
        assert!(!stream.wait_for_connected().await);

        // second close is harmless
        stream.close().await;
    }
}
