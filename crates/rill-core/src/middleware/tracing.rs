//! Request tracing middleware
//!
//! Adds request IDs and logging.

use crate::handler::{handler, Handler, Signal};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Header name for request ID
    pub header_name: String,
    /// Generate request ID if not present
    pub generate_id: bool,
    /// Log requests
    pub log_requests: bool,
    /// ID generator
    pub id_generator: IdGenerator,
}

/// ID generator type
#[derive(Debug, Clone, Copy)]
pub enum IdGenerator {
    Uuid,
    Counter,
}

impl IdGenerator {
    fn generate(&self) -> String {
        match self {
            IdGenerator::Uuid => generate_uuid(),
            IdGenerator::Counter => generate_counter_id(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            header_name: "X-Request-ID".to_string(),
            generate_id: true,
            log_requests: true,
            id_generator: IdGenerator::Uuid,
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn generate_id(mut self, generate: bool) -> Self {
        self.generate_id = generate;
        self
    }

    pub fn log_requests(mut self, log: bool) -> Self {
        self.log_requests = log;
        self
    }

    pub fn id_generator(mut self, generator: IdGenerator) -> Self {
        self.id_generator = generator;
        self
    }
}

/// Generate UUID v4
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Simple counter-based ID
pub fn generate_counter_id() -> String {
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:016x}", count)
}

/// Request tracing middleware
///
/// Reuses the incoming request ID header or generates one (and adds it to
/// the request so later handlers see it), echoes it on the response, and
/// logs the request. Always passes the request on.
pub fn request_tracing(config: TracingConfig) -> Handler {
    let config = Arc::new(config);

    handler(move |req, res| {
        let config = config.clone();
        Box::pin(async move {
            let request_id = match req.header(&config.header_name) {
                Some(id) => Some(id.to_string()),
                None if config.generate_id => {
                    let id = config.id_generator.generate();
                    req.headers.push((config.header_name.clone(), id.clone()));
                    Some(id)
                }
                None => None,
            };

            if let Some(id) = &request_id {
                res.set_header(config.header_name.clone(), id.clone());
            }

            if config.log_requests {
                ::tracing::info!(
                    request_id = request_id.as_deref().unwrap_or("-"),
                    method = %req.method,
                    path = %req.path,
                    query = req.raw_query.as_deref().unwrap_or(""),
                    "request"
                );
            }

            Ok(Signal::Next)
        })
    })
}
