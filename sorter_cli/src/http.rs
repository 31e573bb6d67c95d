//! HTTP control surface: a status page with action forms, a JSON status
//! endpoint, and POST routes that redirect back to the page.
//!
//! Handlers run the blocking `ControlSurface` calls on tokio's blocking pool;
//! a call waits for the control loop's next tick (or the end of a sort).

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use eyre::WrapErr;
use sorter_core::{ControlSurface, Mode, Status};
use tower_http::trace::TraceLayer;

type Surface = Arc<dyn ControlSurface>;

pub fn router(surface: Surface) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(status_json))
        .route("/auto", post(set_auto))
        .route("/manual", post(set_manual))
        .route("/sort", post(manual_sort))
        .route("/reset", post(reset))
        .layer(TraceLayer::new_for_http())
        .with_state(surface)
}

/// Bind `addr` and serve until `stop` resolves.
pub async fn serve(
    addr: SocketAddr,
    surface: Surface,
    stop: impl Future<Output = ()> + Send + 'static,
) -> eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("bind http {addr}"))?;
    let local = listener.local_addr().wrap_err("http local address")?;
    tracing::info!(addr = %local, "http control surface listening");
    axum::serve(listener, router(surface))
        .with_graceful_shutdown(stop)
        .await
        .wrap_err("http server")?;
    tracing::info!("http control surface stopped");
    Ok(())
}

async fn call<T, F>(surface: Surface, f: F) -> Result<T, Response>
where
    T: Send + 'static,
    F: FnOnce(&dyn ControlSurface) -> sorter_core::Result<T> + Send + 'static,
{
    let joined = tokio::task::spawn_blocking(move || f(surface.as_ref())).await;
    match joined {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(unavailable(&e)),
        Err(e) => Err(unavailable(&eyre::eyre!("control task failed: {e}"))),
    }
}

fn unavailable(e: &eyre::Report) -> Response {
    tracing::warn!(error = %format!("{e:#}"), "control request failed");
    (StatusCode::SERVICE_UNAVAILABLE, format!("{e:#}\n")).into_response()
}

async fn index(State(surface): State<Surface>) -> Response {
    match call(surface, |s| s.status()).await {
        Ok(status) => Html(render_page(&status)).into_response(),
        Err(r) => r,
    }
}

async fn status_json(State(surface): State<Surface>) -> Response {
    match call(surface, |s| s.status()).await {
        Ok(status) => Json(status_value(&status)).into_response(),
        Err(r) => r,
    }
}

async fn set_auto(State(surface): State<Surface>) -> Response {
    redirect_after(call(surface, |s| s.set_mode(Mode::Automatic)).await)
}

async fn set_manual(State(surface): State<Surface>) -> Response {
    redirect_after(call(surface, |s| s.set_mode(Mode::Manual)).await)
}

async fn manual_sort(State(surface): State<Surface>) -> Response {
    let result = call(surface, |s| s.manual_sort()).await.map(|outcome| {
        tracing::info!(outcome = outcome.as_str(), "manual sort via http");
    });
    redirect_after(result)
}

async fn reset(State(surface): State<Surface>) -> Response {
    redirect_after(call(surface, |s| s.reset_counters()).await)
}

fn redirect_after(result: Result<(), Response>) -> Response {
    match result {
        Ok(()) => Redirect::to("/").into_response(),
        Err(r) => r,
    }
}

pub fn status_value(status: &Status) -> serde_json::Value {
    serde_json::json!({
        "mode": status.mode.as_str(),
        "biodegradable": status.counters.biodegradable,
        "non_biodegradable": status.counters.non_biodegradable,
    })
}

pub fn render_page(status: &Status) -> String {
    let mode = match status.mode {
        Mode::Automatic => "Automatic",
        Mode::Manual => "Manual",
    };
    // only offered in Manual mode; the route itself accepts it in either
    let sort_form = if status.mode == Mode::Manual {
        r#"<form method="post" action="/sort"><button>Sort now</button></form>"#
    } else {
        ""
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Waste Sorter</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 480px; margin: 40px auto; padding: 0 16px; }}
        .counts {{ display: flex; gap: 16px; }}
        .count {{ flex: 1; background: #f2f2f2; padding: 12px; border-radius: 6px; text-align: center; }}
        .count b {{ display: block; font-size: 2em; }}
        form {{ display: inline-block; margin: 12px 8px 0 0; }}
        button {{ padding: 10px 16px; font-size: 1em; }}
    </style>
</head>
<body>
    <h1>Waste Sorter</h1>
    <p>Mode: <strong id="mode">{mode}</strong> <small>({phase})</small></p>
    <div class="counts">
        <div class="count">Biodegradable<b id="biodegradable">{bio}</b></div>
        <div class="count">Non-biodegradable<b id="non_biodegradable">{non_bio}</b></div>
    </div>
    <form method="post" action="/auto"><button>Automatic</button></form>
    <form method="post" action="/manual"><button>Manual</button></form>
    {sort_form}
    <form method="post" action="/reset"><button>Reset counters</button></form>
</body>
</html>
"#,
        phase = status.phase.as_str(),
        bio = status.counters.biodegradable,
        non_bio = status.counters.non_biodegradable,
    )
}
