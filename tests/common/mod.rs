//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use url_loader::flow::CancelSignal;
use url_loader::http::{
    BodyStream, RequestArgs, ResponseArgs, ResponseHead, Transport, TransportError, TransportResponse,
};
use url_loader::{AbortReason, LoaderError, LoaderSink, ParamError, ParamMod};

/// One scripted body step.
#[derive(Debug, Clone)]
pub enum Step {
    Chunk(&'static [u8]),
    Fail(&'static str),
    /// Block until cancelled.
    Hang,
}

/// In-memory transport replaying a fixed script.
pub struct ScriptedTransport {
    status: StatusCode,
    steps: Vec<Step>,
    with_body: bool,
    fail_fetch: Option<&'static str>,
    pub fetches: AtomicUsize,
    pub reads: Arc<AtomicUsize>,
    pub last_request: Mutex<Option<RequestArgs>>,
}

impl ScriptedTransport {
    pub fn ok(steps: Vec<Step>) -> Self {
        Self {
            status: StatusCode::OK,
            steps,
            with_body: true,
            fail_fetch: None,
            fetches: AtomicUsize::new(0),
            reads: Arc::new(AtomicUsize::new(0)),
            last_request: Mutex::new(None),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            ..Self::ok(vec![Step::Chunk(b"error page")])
        }
    }

    pub fn without_body() -> Self {
        Self {
            with_body: false,
            ..Self::ok(Vec::new())
        }
    }

    pub fn unreachable(reason: &'static str) -> Self {
        Self {
            fail_fetch: Some(reason),
            ..Self::ok(Vec::new())
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, _url: &Url, req: RequestArgs) -> Result<TransportResponse, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let signal = req.signal.clone();
        *self.last_request.lock().unwrap() = Some(req);

        if let Some(reason) = self.fail_fetch {
            return Err(TransportError::Connection(reason.to_string()));
        }

        let head = ResponseHead::new(self.status, HeaderMap::new());
        let body: Option<Box<dyn BodyStream>> = if self.with_body {
            Some(Box::new(ScriptedBody {
                steps: self.steps.iter().cloned().collect(),
                signal,
                reads: self.reads.clone(),
            }))
        } else {
            None
        };
        Ok(TransportResponse { head, body })
    }
}

struct ScriptedBody {
    steps: VecDeque<Step>,
    signal: Option<CancelSignal>,
    reads: Arc<AtomicUsize>,
}

#[async_trait]
impl BodyStream for ScriptedBody {
    async fn read(&mut self) -> Result<Option<Bytes>, TransportError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.signal.as_ref().map_or(false, |s| s.is_cancelled()) {
            return Err(TransportError::Cancelled);
        }
        match self.steps.pop_front() {
            None => Ok(None),
            Some(Step::Chunk(data)) => Ok(Some(Bytes::from_static(data))),
            Some(Step::Fail(reason)) => Err(TransportError::Connection(reason.to_string())),
            Some(Step::Hang) => {
                match self.signal.as_mut() {
                    Some(signal) => signal.cancelled().await,
                    None => std::future::pending::<()>().await,
                }
                Err(TransportError::Cancelled)
            }
        }
    }
}

/// Observable consumer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Response(u16),
    Data(Vec<u8>),
    End,
    Error(String),
}

/// Sink recording every callback into a shared log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn data_len(&self) -> usize {
        self.events()
            .iter()
            .map(|e| match e {
                Event::Data(d) => d.len(),
                _ => 0,
            })
            .sum()
    }
}

impl LoaderSink for RecordingSink {
    fn on_response(&mut self, res: &ResponseArgs) {
        self.events.lock().unwrap().push(Event::Response(res.status.as_u16()));
    }

    fn on_data(&mut self, chunk: Bytes) {
        self.events.lock().unwrap().push(Event::Data(chunk.to_vec()));
    }

    fn on_end(&mut self) {
        self.events.lock().unwrap().push(Event::End);
    }

    fn on_error(&mut self, err: &LoaderError) {
        self.events.lock().unwrap().push(Event::Error(err.to_string()));
    }
}

pub type HookLog = Arc<Mutex<Vec<String>>>;

pub fn entries(log: &HookLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// How a [`Recorder`] treats data.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Pass,
    /// Swallow the first chunk only.
    DropFirst,
    /// Buffer everything and release it in the flush pass.
    Buffer,
    /// Emit every chunk twice.
    Double,
    /// Yield to the runtime before passing the chunk on.
    Slow,
    /// Fail in `on_request`.
    RejectRequest,
}

/// Middleware logging every hook as `name:hook[:detail]`.
pub struct Recorder {
    pub name: &'static str,
    pub log: HookLog,
    pub behavior: Behavior,
    seen: usize,
    buffered: Vec<u8>,
}

impl Recorder {
    pub fn boxed(name: &'static str, log: &HookLog, behavior: Behavior) -> Box<dyn ParamMod> {
        Box::new(Self {
            name,
            log: log.clone(),
            behavior,
            seen: 0,
            buffered: Vec::new(),
        })
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, entry));
    }
}

#[async_trait]
impl ParamMod for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_request(&mut self, req: &mut RequestArgs, _ctx: &url_loader::RequestContext) -> Result<(), ParamError> {
        self.push("request".into());
        req.headers
            .append("x-param", self.name.parse().expect("valid header value"));
        if let Behavior::RejectRequest = self.behavior {
            return Err(ParamError::Invalid {
                param: "recorder",
                reason: "rejected".into(),
            });
        }
        Ok(())
    }

    fn on_response(
        &mut self,
        res: &mut ResponseArgs,
        _ctx: &url_loader::RequestContext,
        _raw: &ResponseHead,
    ) -> Result<(), ParamError> {
        self.push("response".into());
        res.headers
            .append("x-param", self.name.parse().expect("valid header value"));
        Ok(())
    }

    async fn on_data(&mut self, chunk: Bytes) -> Result<Bytes, ParamError> {
        self.push(format!("data:{}", String::from_utf8_lossy(&chunk)));
        self.seen += 1;
        match self.behavior {
            Behavior::DropFirst if self.seen == 1 => Ok(Bytes::new()),
            Behavior::Buffer => {
                self.buffered.extend_from_slice(&chunk);
                Ok(Bytes::new())
            }
            Behavior::Double => {
                let mut out = chunk.to_vec();
                out.extend_from_slice(&chunk);
                Ok(Bytes::from(out))
            }
            Behavior::Slow => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(chunk)
            }
            _ => Ok(chunk),
        }
    }

    async fn on_end(&mut self, buf: Bytes) -> Result<Bytes, ParamError> {
        self.push(format!("end:{}", String::from_utf8_lossy(&buf)));
        match self.behavior {
            Behavior::Buffer => {
                let mut out = buf.to_vec();
                out.append(&mut self.buffered);
                Ok(Bytes::from(out))
            }
            _ => Ok(buf),
        }
    }

    fn on_abort(&mut self, reason: &AbortReason) {
        self.push(format!("abort:{}", reason));
    }

    fn on_error(&mut self, err: &LoaderError) {
        self.push(format!("error:{}", err));
    }
}

/// Start a mock backend answering every connection with the given status
/// line and body. Returns the bound address.
pub async fn start_mock_backend(status_line: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = read_request_head(&mut socket).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that answers with the raw request head as the body.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let head = read_request_head(&mut socket).await.unwrap_or_default();
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    head.len(),
                    head
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a backend that sends headers and a partial body, then resets.
pub async fn start_truncating_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_request_head(&mut socket).await;
                let response = "HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial";
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
