//! Route: one path pattern with ordered handler groups
//!
//! Handler dispatch for a single route:
//! - groups run in registration order; while an error is live only
//!   `Error`-tagged groups are eligible, otherwise `All` groups and groups
//!   tagged with the request method
//! - the first non-`Next` result ends the route and resolves a live error
//! - a raised error skips the rest of its group; a later `Error` group may
//!   still catch it
//! - `Route` from a handler means "not me", which the router sees as `Next`

use crate::handler::{BoxFuture, Handler, HandlerResult, IntoHandlers, Signal};
use crate::{Error, HandlerError, Method, Request, Response, Router};
use rill_router::{reduce_path, PathPattern};
use std::fmt;
use tracing::{debug, trace, warn};

/// Method tag of a handler group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodTag {
    Method(Method),
    /// Any method (`all`, `use`)
    All,
    /// Error handlers (`catch`)
    Error,
}

impl fmt::Display for MethodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodTag::Method(method) => write!(f, "{method}"),
            MethodTag::All => f.write_str("ALL"),
            MethodTag::Error => f.write_str("catch"),
        }
    }
}

#[derive(Debug)]
struct HandlerGroup {
    tag: MethodTag,
    handlers: Vec<Handler>,
}

impl HandlerGroup {
    fn accepts(&self, method: Method, errored: bool) -> bool {
        match self.tag {
            MethodTag::Error => errored,
            MethodTag::All => !errored,
            MethodTag::Method(m) => !errored && m == method,
        }
    }
}

/// A path pattern and its handler groups
///
/// Created through [`Router`] registration calls; [`Router::route`] hands
/// one out for incremental per-method registration.
#[derive(Debug)]
pub struct Route {
    pattern: PathPattern,
    groups: Vec<HandlerGroup>,
    /// First handler registered in a group where it can never run
    config_error: Option<Error>,
}

impl Route {
    pub(crate) fn new(pattern: PathPattern) -> Self {
        Self {
            pattern,
            groups: Vec::new(),
            config_error: None,
        }
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub(crate) fn add_group(&mut self, tag: MethodTag, handlers: Vec<Handler>) {
        for handler in &handlers {
            let kind = match (tag, handler) {
                (MethodTag::Error, Handler::Request(_)) => "request",
                (MethodTag::All | MethodTag::Method(_), Handler::Error(_)) => "error",
                _ => continue,
            };
            let err = Error::MisplacedHandler {
                tag: tag.to_string(),
                kind,
            };
            warn!(pattern = %self.pattern, error = %err, "registered a handler that can never run");
            self.config_error.get_or_insert(err);
        }

        self.groups.push(HandlerGroup { tag, handlers });
    }

    pub(crate) fn config_error(&self) -> Option<&Error> {
        self.config_error.as_ref()
    }

    /// Tags of the registered groups, in order
    pub fn tags(&self) -> impl Iterator<Item = MethodTag> + '_ {
        self.groups.iter().map(|group| group.tag)
    }

    /// Whether the pattern has to match the whole path
    ///
    /// A regex is exact when anchored with `$`. A string pattern is exact
    /// unless some group is tagged `All`: middleware and mounted routers
    /// match by prefix.
    pub fn is_exact(&self) -> bool {
        if self.pattern.is_regex() {
            self.pattern.is_anchored()
        } else {
            !self.groups.iter().any(|group| group.tag == MethodTag::All)
        }
    }

    pub fn get(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add_group(MethodTag::Method(Method::Get), handlers.into_handlers());
        self
    }

    pub fn post(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add_group(MethodTag::Method(Method::Post), handlers.into_handlers());
        self
    }

    pub fn put(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add_group(MethodTag::Method(Method::Put), handlers.into_handlers());
        self
    }

    pub fn patch(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add_group(MethodTag::Method(Method::Patch), handlers.into_handlers());
        self
    }

    pub fn delete(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add_group(MethodTag::Method(Method::Delete), handlers.into_handlers());
        self
    }

    pub fn options(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add_group(MethodTag::Method(Method::Options), handlers.into_handlers());
        self
    }

    pub fn head(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add_group(MethodTag::Method(Method::Head), handlers.into_handlers());
        self
    }

    pub fn all(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add_group(MethodTag::All, handlers.into_handlers());
        self
    }

    pub fn catch(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.add_group(MethodTag::Error, handlers.into_handlers());
        self
    }

    /// Run this route's handlers for a request
    ///
    /// Resolves to [`Signal::Next`] when the router should keep looking and
    /// [`Signal::Handled`] when it should stop. Fails with the live error if
    /// no `Error` group resolved it.
    pub(crate) fn handle_request<'a>(
        &'a self,
        path: &'a str,
        matched_path: &'a str,
        req: &'a mut Request,
        res: &'a mut Response,
        err: Option<HandlerError>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let mut latest = Signal::Next;
            let mut error = err;
            let mut end = false;

            for group in &self.groups {
                if end {
                    break;
                }
                if !group.accepts(req.method, error.is_some()) {
                    continue;
                }

                for handler in &group.handlers {
                    if end {
                        break;
                    }

                    let outcome = match (handler, &error) {
                        (Handler::Router(router), _) => {
                            self.descend(router, path, matched_path, req, res, error.clone())
                                .await
                        }
                        (Handler::Error(handler), Some(err)) => {
                            handler.call(err.clone(), req, res).await
                        }
                        (Handler::Request(handler), None) => handler.call(req, res).await,
                        // request handlers never see an error, error handlers only see one
                        _ => continue,
                    };

                    match outcome {
                        Ok(signal) => {
                            latest = signal;
                            if !signal.is_next() {
                                end = true;
                                if error.take().is_some() {
                                    trace!(pattern = %self.pattern, "error resolved");
                                }
                            }
                        }
                        Err(err) => {
                            debug!(pattern = %self.pattern, error = %err, "handler raised an error");
                            error = Some(err);
                            latest = Signal::Handled;
                            break;
                        }
                    }
                }

                if latest == Signal::Route {
                    latest = Signal::Next;
                }
            }

            match error {
                Some(err) => Err(err),
                None => Ok(latest),
            }
        })
    }

    async fn descend(
        &self,
        router: &Router,
        path: &str,
        matched_path: &str,
        req: &mut Request,
        res: &mut Response,
        err: Option<HandlerError>,
    ) -> HandlerResult {
        let reduction = reduce_path(path, &self.pattern).map_err(Error::from)?;
        let matched = reduction.matched_path(matched_path);

        trace!(
            remaining = reduction.remaining,
            matched = %matched,
            "descending into sub-router"
        );

        router
            .handle_request(reduction.remaining, &matched, req, res, err)
            .await
    }
}
