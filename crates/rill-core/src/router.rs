//! Router: ordered routes, nestable
//!
//! Routes are tried in registration order. A route whose pattern matches
//! gets its params merged into the request and runs its handlers; the first
//! route that handles the request ends dispatch. An error raised by one
//! route travels on to the later routes (so a `catch` registered after it can
//! resolve it) and is raised to the caller if nothing does.
//!
//! Mounting a router inside another (`mount("/api", sub)`) makes it a
//! handler of the outer route. The sub-router only sees the path remaining
//! after the mount prefix.

use crate::handler::{BoxFuture, HandlerResult, IntoHandlers, Signal};
use crate::route::{MethodTag, Route};
use crate::{Error, HandlerError, Method, Request, Response, Result};
use rill_router::{match_path, PathPattern};
use tracing::{trace, warn};

/// An ordered collection of routes
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    /// First malformed pattern seen during registration
    config_error: Option<Error>,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered routes in match-priority order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Report the first registration mistake on this router
    ///
    /// Covers malformed patterns and handlers registered in a group where
    /// they can never run.
    pub fn validate(&self) -> Result<()> {
        match self.config_error() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn config_error(&self) -> Option<&Error> {
        self.config_error
            .as_ref()
            .or_else(|| self.routes.iter().find_map(Route::config_error))
    }

    fn add_route(&mut self, pattern: PathPattern) -> &mut Route {
        if let Err(err) = pattern.validate() {
            warn!(error = %err, "registered an invalid path pattern");
            self.config_error.get_or_insert(err.into());
        }

        self.routes.push(Route::new(pattern));
        let last = self.routes.len() - 1;
        &mut self.routes[last]
    }

    fn add(&mut self, tag: MethodTag, pattern: PathPattern, handlers: impl IntoHandlers) -> &mut Self {
        self.add_route(pattern).add_group(tag, handlers.into_handlers());
        self
    }

    /// Register GET handlers
    pub fn get(&mut self, pattern: impl Into<PathPattern>, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::Method(Method::Get), pattern.into(), handlers)
    }

    /// Register POST handlers
    pub fn post(&mut self, pattern: impl Into<PathPattern>, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::Method(Method::Post), pattern.into(), handlers)
    }

    /// Register PUT handlers
    pub fn put(&mut self, pattern: impl Into<PathPattern>, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::Method(Method::Put), pattern.into(), handlers)
    }

    /// Register PATCH handlers
    pub fn patch(&mut self, pattern: impl Into<PathPattern>, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::Method(Method::Patch), pattern.into(), handlers)
    }

    /// Register DELETE handlers
    pub fn delete(&mut self, pattern: impl Into<PathPattern>, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::Method(Method::Delete), pattern.into(), handlers)
    }

    /// Register OPTIONS handlers
    pub fn options(&mut self, pattern: impl Into<PathPattern>, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::Method(Method::Options), pattern.into(), handlers)
    }

    /// Register HEAD handlers
    pub fn head(&mut self, pattern: impl Into<PathPattern>, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::Method(Method::Head), pattern.into(), handlers)
    }

    /// Register handlers for every method
    ///
    /// Like [`Router::mount`], the pattern then matches by prefix.
    pub fn all(&mut self, pattern: impl Into<PathPattern>, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::All, pattern.into(), handlers)
    }

    /// Register middleware or mount sub-routers under a path prefix
    pub fn mount(&mut self, pattern: impl Into<PathPattern>, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::All, pattern.into(), handlers)
    }

    /// Register middleware or sub-routers for every path (`/**`)
    pub fn use_handlers(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::All, PathPattern::wildcard(), handlers)
    }

    /// Register error handlers for every path (`/**`)
    pub fn catch(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::Error, PathPattern::wildcard(), handlers)
    }

    /// Register error handlers for a path pattern
    pub fn catch_at(&mut self, pattern: impl Into<PathPattern>, handlers: impl IntoHandlers) -> &mut Self {
        self.add(MethodTag::Error, pattern.into(), handlers)
    }

    /// Create a route with no handlers, for incremental registration
    ///
    /// ```
    /// use rill_core::{handler, Router, Signal};
    ///
    /// let mut router = Router::new();
    /// router
    ///     .route("/items/:id")
    ///     .get(handler(|_req, res| Box::pin(async move {
    ///         res.send("item");
    ///         Ok(Signal::Handled)
    ///     })))
    ///     .delete(handler(|_req, res| Box::pin(async move {
    ///         res.send("deleted");
    ///         Ok(Signal::Handled)
    ///     })));
    /// assert_eq!(router.routes().len(), 1);
    /// ```
    pub fn route(&mut self, pattern: impl Into<PathPattern>) -> &mut Route {
        self.add_route(pattern.into())
    }

    /// Dispatch a request from the top of the tree
    pub async fn dispatch(&self, req: &mut Request, res: &mut Response) -> HandlerResult {
        let path = req.path.clone();
        self.handle_request(&path, "/", req, res, None).await
    }

    /// Dispatch a request at this level of the tree
    ///
    /// `path` is what remains of the request path after outer mounts,
    /// `matched_path` what they consumed. `err` is the error live in the
    /// enclosing router, if any; only error handlers run while it is set.
    ///
    /// Resolves to [`Signal::Next`] when nothing handled the request and
    /// [`Signal::Handled`] otherwise; fails with an error no error handler
    /// resolved.
    pub fn handle_request<'a>(
        &'a self,
        path: &'a str,
        matched_path: &'a str,
        req: &'a mut Request,
        res: &'a mut Response,
        err: Option<HandlerError>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            if let Some(config_error) = self.config_error() {
                if let Some(err) = err {
                    warn!(error = %config_error, "skipping misconfigured router while an error is live");
                    return Err(err);
                }
                return Err(HandlerError::new(config_error.clone()));
            }

            let mut latest = Signal::Next;
            let mut error = err;

            for route in &self.routes {
                let Some(params) = match_path(path, route.pattern(), route.is_exact()) else {
                    continue;
                };

                trace!(
                    method = %req.method,
                    path,
                    matched_path,
                    pattern = %route.pattern(),
                    "route matched"
                );
                req.merge_params(params);

                let base_path = std::mem::replace(&mut req.base_path, matched_path.to_string());
                let remaining_path = std::mem::replace(&mut req.remaining_path, path.to_string());

                let outcome = route
                    .handle_request(path, matched_path, req, res, error.clone())
                    .await;

                req.base_path = base_path;
                req.remaining_path = remaining_path;

                match outcome {
                    Ok(signal) => {
                        error = None;
                        latest = signal;
                        if latest == Signal::Handled {
                            break;
                        }
                    }
                    Err(err) => {
                        error = Some(err);
                        latest = Signal::Handled;
                    }
                }
            }

            match error {
                Some(err) => Err(err),
                None => Ok(latest),
            }
        })
    }
}
