//! Native HTTP server implementation
//!
//! Serves an [`Application`] with hyper:
//! - HTTP/1.1 and HTTP/2 on the same port (auto-detected)
//! - SO_REUSEPORT for load balancing
//! - TCP_NODELAY for low latency
//!
//! The caller provides the tokio runtime.

use crate::{Application, Error, Method, Request, Response, Result, StatusCode};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub hostname: String,
    /// Listen backlog
    pub backlog: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            hostname: "0.0.0.0".to_string(),
            backlog: 1024,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Resolve the listen address (`localhost` or an IP literal)
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = match self.hostname.as_str() {
            "localhost" => IpAddr::from([127, 0, 0, 1]),
            hostname => hostname
                .parse()
                .map_err(|_| Error::InvalidAddress(self.hostname.clone()))?,
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Create a TCP socket with optimizations
pub fn create_optimized_socket(addr: &SocketAddr, backlog: i32) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // SO_REUSEPORT - enable kernel load balancing across threads
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    // TCP_NODELAY - disable Nagle's algorithm for lower latency
    socket.set_nodelay(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(backlog)?;

    Ok(socket)
}

/// Convert a hyper request to our Request type, collecting the body
pub async fn from_hyper_request(req: hyper::Request<Incoming>) -> Result<Request> {
    let (parts, body) = req.into_parts();
    let method: Method = parts.method.as_str().parse()?;
    let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());

    let mut request = Request::new(method, target);

    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            request.headers.push((name.to_string(), v.to_string()));
        }
    }

    request.body = body
        .collect()
        .await
        .map_err(|e| Error::Hyper(e.to_string()))?
        .to_bytes();

    Ok(request)
}

/// Convert our Response to hyper Response
pub fn to_hyper_response(res: Response) -> hyper::Response<Full<Bytes>> {
    let mut builder = hyper::Response::builder().status(res.status.as_u16());

    for (name, value) in &res.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder.body(Full::new(res.body)).unwrap_or_else(|err| {
        warn!(error = %err, "handler produced an invalid response head");
        let mut fallback = hyper::Response::new(Full::new(Bytes::from_static(
            b"Internal Server Error",
        )));
        *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

async fn handle_hyper(app: &Application, req: hyper::Request<Incoming>) -> hyper::Response<Full<Bytes>> {
    match from_hyper_request(req).await {
        Ok(request) => to_hyper_response(app.handle(request).await),
        Err(err) => {
            debug!(error = %err, "rejecting request");
            let status = match err {
                Error::InvalidMethod(_) => StatusCode::NOT_IMPLEMENTED,
                _ => StatusCode::BAD_REQUEST,
            };
            let mut res = Response::new();
            res.status(status).send(err.to_string());
            to_hyper_response(res)
        }
    }
}

/// Accept connections and serve `app` until the listener fails to bind
pub async fn serve(app: Arc<Application>) -> Result<()> {
    let addr = app.config.socket_addr()?;
    let socket = create_optimized_socket(&addr, app.config.backlog)?;
    socket.set_nonblocking(true)?;
    let listener = TcpListener::from_std(socket.into())?;

    info!(%addr, "listening");

    loop {
        let (stream, remote) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "failed to accept connection");
                continue;
            }
        };

        let app = app.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let app = app.clone();
                async move { Ok::<_, Infallible>(handle_hyper(&app, req).await) }
            });

            if let Err(err) = auto::Builder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!(%remote, error = %err, "connection closed with error");
            }
        });
    }
}

impl Application {
    /// Bind the configured address and serve requests
    pub async fn listen(self) -> Result<()> {
        serve(Arc::new(self)).await
    }
}
