//! End-to-end dispatch through nested routers and the application

use rill_core::{
    error_handler, handler, Application, Handler, HandlerError, Method, Request, Response, Router,
    Signal, StatusCode,
};
use std::sync::{Arc, Mutex};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn send(body: &'static str) -> Handler {
    handler(move |_req, res| {
        Box::pin(async move {
            res.send(body);
            Ok(Signal::Handled)
        })
    })
}

fn fail(message: &'static str) -> Handler {
    handler(move |_req, _res| Box::pin(async move { Err(HandlerError::msg(message)) }))
}

async fn get(app: &Application, target: &str) -> Response {
    app.handle(Request::new(Method::Get, target)).await
}

#[tokio::test]
async fn nested_mounts_consume_prefixes() {
    init_tracing();

    let mut sub = Router::new();
    sub.get("/sub", send("sub"));

    let mut main = Router::new();
    main.mount("/sub-main", sub);

    let mut app = Application::new();
    app.mount("/main", main);

    let res = get(&app, "/main/sub-main/sub").await;
    assert_eq!(res.body_string().as_deref(), Some("sub"));

    let res = get(&app, "/main/sub").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn params_from_mount_reach_sub_router() {
    init_tracing();

    let mut sub = Router::new();
    sub.get(
        "/sub",
        handler(|req, res| {
            Box::pin(async move {
                let id = req.param("id").unwrap_or("missing").to_string();
                res.send(id);
                Ok(Signal::Handled)
            })
        }),
    );

    let mut app = Application::new();
    app.mount("/:id", sub);

    let res = get(&app, "/1234/sub").await;
    assert_eq!(res.body_string().as_deref(), Some("1234"));
}

#[tokio::test]
async fn handlers_see_the_path_consumed_by_mounts() {
    init_tracing();

    let mut v1 = Router::new();
    v1.get(
        "/items/:id",
        handler(|req, res| {
            Box::pin(async move {
                let body = format!("{} {} {}", req.base_path, req.remaining_path, req.path);
                res.send(body);
                Ok(Signal::Handled)
            })
        }),
    );

    let mut api = Router::new();
    api.mount("/v1", v1);

    let mut app = Application::new();
    app.mount("/api", api);

    let res = get(&app, "/api/v1/items/9").await;
    assert_eq!(
        res.body_string().as_deref(),
        Some("/api/v1 /items/9 /api/v1/items/9")
    );
}

#[tokio::test]
async fn wildcard_mount_does_not_consume_literal_stars() {
    init_tracing();

    let mut sub = Router::new();
    sub.get(
        "/:a/x",
        handler(|req, res| {
            Box::pin(async move {
                let a = req.param("a").unwrap_or("").to_string();
                res.send(a);
                Ok(Signal::Handled)
            })
        }),
    );

    let mut app = Application::new();
    app.use_handlers(sub);

    assert_eq!(get(&app, "/zz/x").await.body_string().as_deref(), Some("zz"));
    assert_eq!(get(&app, "/**/x").await.body_string().as_deref(), Some("**"));
}

#[tokio::test]
async fn sub_router_error_reaches_outer_catch() {
    init_tracing();

    let mut sub = Router::new();
    sub.get("/boom", fail("deep failure"));

    let seen = Arc::new(Mutex::new(None));
    let recorded = seen.clone();

    let mut app = Application::new();
    app.mount("/api", sub)
        .get("/api/boom", send("unreachable"))
        .catch(error_handler(move |err, req, res| {
            let recorded = recorded.clone();
            Box::pin(async move {
                *recorded.lock().unwrap() = Some(req.path.clone());
                res.status(StatusCode::SERVICE_UNAVAILABLE)
                    .send(format!("caught {err}"));
                Ok(Signal::Handled)
            })
        }));

    let res = get(&app, "/api/boom").await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body_string().as_deref(), Some("caught deep failure"));
    assert_eq!(seen.lock().unwrap().as_deref(), Some("/api/boom"));
}

#[tokio::test]
async fn sub_router_catch_resolves_before_outer_routes() {
    init_tracing();

    let mut sub = Router::new();
    sub.get("/boom", fail("local failure")).catch(error_handler(|_err, _req, res| {
        Box::pin(async move {
            res.send("handled inside");
            Ok(Signal::Handled)
        })
    }));

    let mut app = Application::new();
    app.mount("/api", sub).catch(error_handler(|_err, _req, res| {
        Box::pin(async move {
            res.send("handled outside");
            Ok(Signal::Handled)
        })
    }));

    let res = get(&app, "/api/boom").await;
    assert_eq!(res.body_string().as_deref(), Some("handled inside"));
}

#[tokio::test]
async fn middleware_then_routes() {
    init_tracing();

    let mut app = Application::new();
    app.use_handlers(handler(|_req, res| {
        Box::pin(async move {
            res.set_header("x-powered-by", "rill");
            Ok(Signal::Next)
        })
    }))
    .route("/items/:id")
    .get(send("item"))
    .delete(send("deleted"));

    let res = get(&app, "/items/7?verbose=1").await;
    assert_eq!(res.header("x-powered-by"), Some("rill"));
    assert_eq!(res.body_string().as_deref(), Some("item"));

    let res = app
        .handle(Request::new(Method::Delete, "/items/7"))
        .await;
    assert_eq!(res.body_string().as_deref(), Some("deleted"));

    let res = app.handle(Request::new(Method::Post, "/items/7")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body_string().as_deref(), Some("Cannot POST /items/7"));
    assert_eq!(res.header("x-powered-by"), Some("rill"));
}

#[tokio::test]
async fn route_signal_skips_to_next_route() {
    init_tracing();

    let mut app = Application::new();
    app.get(
        "/users/:id",
        [
            handler(|req, _res| {
                Box::pin(async move {
                    if req.param("id") == Some("me") {
                        Ok(Signal::Route)
                    } else {
                        Ok(Signal::Next)
                    }
                })
            }),
            send("by id"),
        ],
    )
    .get("/users/me", send("current user"));

    assert_eq!(get(&app, "/users/42").await.body_string().as_deref(), Some("by id"));
    assert_eq!(
        get(&app, "/users/me").await.body_string().as_deref(),
        Some("current user")
    );
}

#[tokio::test]
async fn query_is_parsed_for_handlers() {
    init_tracing();

    let mut app = Application::new();
    app.get(
        "/search",
        handler(|req, res| {
            Box::pin(async move {
                let tags = req
                    .query
                    .get("tag")
                    .map(|v| v.all().join(","))
                    .unwrap_or_default();
                res.send(tags);
                Ok(Signal::Handled)
            })
        }),
    );

    let res = get(&app, "/search?tag=a&tag=b%20c#frag").await;
    assert_eq!(res.body_string().as_deref(), Some("a,b c"));
}

#[tokio::test]
async fn invalid_pattern_fails_first_dispatch() {
    init_tracing();

    let mut app = Application::new();
    app.get("no-leading-slash", send("never"));

    assert!(app.validate().is_err());

    let res = get(&app, "/").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}
