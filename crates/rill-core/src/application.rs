//! Application: the top-level router
//!
//! Turns the outcome of dispatch into a response:
//! - nothing handled the request and nothing was sent: 404 `Cannot GET /path`
//! - an error escaped every error handler: logged, then a generic 500 unless
//!   a response was already sent

use crate::handler::Signal;
use crate::{HandlerError, Request, Response, Router, StatusCode};
use std::ops::{Deref, DerefMut};
use tracing::{error, warn};

/// A router with the top-level response policy
///
/// Registration goes through the wrapped [`Router`] (`app.get(..)`,
/// `app.mount(..)`, ...).
#[derive(Debug, Default)]
pub struct Application {
    router: Router,
    #[cfg(feature = "native")]
    pub(crate) config: crate::ServerConfig,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "native")]
    pub fn with_config(config: crate::ServerConfig) -> Self {
        Self {
            router: Router::new(),
            config,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Handle a request from start to finish
    pub async fn handle(&self, mut req: Request) -> Response {
        let mut res = Response::new();

        match self.router.dispatch(&mut req, &mut res).await {
            Ok(Signal::Next) if !res.is_sent() => {
                let body = format!("Cannot {} {}", req.method, req.path);
                res.status(StatusCode::NOT_FOUND).send(body);
            }
            Ok(_) => {}
            Err(err) => default_error_handler(err, &req, &mut res),
        }

        res
    }
}

impl Deref for Application {
    type Target = Router;

    fn deref(&self) -> &Router {
        &self.router
    }
}

impl DerefMut for Application {
    fn deref_mut(&mut self) -> &mut Router {
        &mut self.router
    }
}

fn default_error_handler(err: HandlerError, req: &Request, res: &mut Response) {
    error!(
        method = %req.method,
        path = %req.path,
        error = %err,
        "unhandled error while processing request; register a catch handler to handle errors yourself"
    );

    if res.is_sent() {
        warn!("a response was already sent before the error surfaced");
        return;
    }

    res.status(StatusCode::INTERNAL_SERVER_ERROR)
        .send("An unknown error occurred while trying to process the request");
}
