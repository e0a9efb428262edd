//! rill-core: request dispatch for the rill web framework
//!
//! Routes are matched in registration order. Each route runs its handlers in
//! sequence, and every handler answers with a [`Signal`]: the request was
//! handled, fall through to the next handler, or skip the rest of the route.
//! Errors travel down the same chain until an error handler resolves them.
//! Routers nest: a router mounted under a prefix sees the remainder of the
//! path.
//!
//! ## Features
//! - `native` - HTTP/1.1 and HTTP/2 server with tokio/hyper

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod application;
pub mod error;
pub mod handler;
pub mod method;
pub mod middleware;
pub mod request;
pub mod response;
pub mod route;
pub mod router;

#[cfg(feature = "native")]
pub mod server;

// Re-exports
pub use application::Application;
pub use error::{Error, HandlerError, PatternError, Result};
pub use handler::{
    error_handler, handler, BoxFuture, ErrorHandler, Handler, HandlerResult, IntoHandlers,
    RequestHandler, Signal,
};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::{Response, StatusCode};
pub use route::{MethodTag, Route};
pub use router::Router;

pub use rill_router::{Params, PathPattern, Query, QueryValue, Regex};

// Middleware re-exports
pub use middleware::{request_tracing, IdGenerator, TracingConfig};

#[cfg(feature = "native")]
pub use server::{create_optimized_socket, from_hyper_request, serve, to_hyper_response, ServerConfig};
