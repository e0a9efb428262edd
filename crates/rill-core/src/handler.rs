//! Handler model
//!
//! A route holds handler groups; each entry in a group is a [`Handler`]:
//! a request handler, an error handler, or a mounted [`Router`].
//!
//! Handlers are async and borrow the request and response for the duration
//! of the call, so they return a boxed future tied to those borrows. Build
//! them with [`handler`] and [`error_handler`]:
//!
//! ```
//! use rill_core::{handler, error_handler, Router, Signal};
//!
//! let mut router = Router::new();
//! router.get("/hello/:name", handler(|req, res| Box::pin(async move {
//!     let greeting = format!("Hello {}", req.param("name").unwrap_or("stranger"));
//!     res.send(greeting);
//!     Ok(Signal::Handled)
//! })));
//! router.catch(error_handler(|err, _req, res| Box::pin(async move {
//!     res.status(500u16).send(err.to_string());
//!     Ok(Signal::Handled)
//! })));
//! ```

use crate::{HandlerError, Request, Response, Router};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by handlers
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler returns; `Err` raises an error into the dispatch engine
pub type HandlerResult = std::result::Result<Signal, HandlerError>;

/// Control signal returned by handlers and dispatch engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The request was handled; stop dispatching
    Handled,
    /// Pass the request along to the next handler or route
    Next,
    /// Abandon the rest of this route and let the router try later routes
    Route,
}

impl Signal {
    pub fn is_next(&self) -> bool {
        matches!(self, Signal::Next)
    }
}

/// A plain request handler (`(req, res)`)
pub trait RequestHandler: Send + Sync + 'static {
    fn call<'a>(&'a self, req: &'a mut Request, res: &'a mut Response)
        -> BoxFuture<'a, HandlerResult>;
}

impl<F> RequestHandler for F
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, HandlerResult> {
        self(req, res)
    }
}

/// An error handler (`(err, req, res)`), only invoked while an error is live
pub trait ErrorHandler: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        err: HandlerError,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, HandlerResult>;
}

impl<F> ErrorHandler for F
where
    F: for<'a> Fn(HandlerError, &'a mut Request, &'a mut Response) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        err: HandlerError,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, HandlerResult> {
        self(err, req, res)
    }
}

/// A registered handler
///
/// The variant is the discriminator; dispatch never inspects a handler's
/// shape to decide how to call it.
#[derive(Clone)]
pub enum Handler {
    Request(Arc<dyn RequestHandler>),
    Error(Arc<dyn ErrorHandler>),
    Router(Arc<Router>),
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Request(_) => f.write_str("Handler::Request"),
            Handler::Error(_) => f.write_str("Handler::Error"),
            Handler::Router(router) => f.debug_tuple("Handler::Router").field(router).finish(),
        }
    }
}

/// Wrap an async closure as a request handler
pub fn handler<F>(f: F) -> Handler
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    Handler::Request(Arc::new(f))
}

/// Wrap an async closure as an error handler
pub fn error_handler<F>(f: F) -> Handler
where
    F: for<'a> Fn(HandlerError, &'a mut Request, &'a mut Response) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    Handler::Error(Arc::new(f))
}

/// Anything that can be registered as a list of handlers
pub trait IntoHandlers {
    fn into_handlers(self) -> Vec<Handler>;
}

impl IntoHandlers for Handler {
    fn into_handlers(self) -> Vec<Handler> {
        vec![self]
    }
}

impl IntoHandlers for Router {
    fn into_handlers(self) -> Vec<Handler> {
        vec![Handler::Router(Arc::new(self))]
    }
}

impl IntoHandlers for Arc<Router> {
    fn into_handlers(self) -> Vec<Handler> {
        vec![Handler::Router(self)]
    }
}

impl IntoHandlers for Vec<Handler> {
    fn into_handlers(self) -> Vec<Handler> {
        self
    }
}

impl<const N: usize> IntoHandlers for [Handler; N] {
    fn into_handlers(self) -> Vec<Handler> {
        self.into()
    }
}

impl From<Router> for Handler {
    fn from(router: Router) -> Self {
        Handler::Router(Arc::new(router))
    }
}
