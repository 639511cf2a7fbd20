use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use clap::Parser;
use fixtures::{run_server, FixtureArgs};
use serde_json::json;

/// Identity provider fixture server.
///
/// Speaks just enough of the userinfo protocol for the app: a couple of
/// canned bearer tokens resolve to canned subjects, everything else is a 401.
#[derive(Parser, Debug)]
#[clap(name = "identity-fixture")]
struct Cli {
    #[clap(flatten)]
    common: FixtureArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let app = Router::new()
        .route("/", get(|| async { "Identity Provider Fixture Server" }))
        .route("/oauth/userinfo", get(userinfo))
        .fallback(|req: axum::http::Request<axum::body::Body>| async move {
            eprintln!("WARNING: Unhandled request: {} {}", req.method(), req.uri());
            (
                StatusCode::NOT_FOUND,
                format!("No route found for {} {}", req.method(), req.uri()),
            )
        });

    run_server(args.common, app).await
}

async fn userinfo(headers: HeaderMap) -> impl IntoResponse {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some("guest-token") => Json(json!({
            "sub": "idp|fixture-guest",
            "handle": "guest",
            "name": "Fixture Guest",
            "picture": "https://cdn.example.test/guest.png"
        }))
        .into_response(),

        Some("owner-token") => Json(json!({
            "sub": "idp|fixture-owner",
            "handle": "rowan",
            "name": "Rowan Hale",
            "picture": "https://cdn.example.test/rowan.png"
        }))
        .into_response(),

        // A token the provider has never heard of, or no token at all
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_token" })),
        )
            .into_response(),
    }
}
