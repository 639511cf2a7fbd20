use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use clap::Parser;
use fixtures::{run_server, FixtureArgs};
use serde_json::json;

/// GitHub API fixture server.
///
/// Serves the two endpoints the stats refresh job hits, with fixed numbers
/// so assertions stay simple.
#[derive(Parser, Debug)]
#[clap(name = "github-fixture")]
struct Cli {
    #[clap(flatten)]
    common: FixtureArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let app = Router::new()
        .route("/", get(|| async { "GitHub API Fixture Server" }))
        .route("/users/:username", get(user_profile))
        .route("/users/:username/repos", get(user_repos))
        .fallback(|req: axum::http::Request<axum::body::Body>| async move {
            eprintln!("WARNING: Unhandled request: {} {}", req.method(), req.uri());
            (
                StatusCode::NOT_FOUND,
                format!("No route found for {} {}", req.method(), req.uri()),
            )
        });

    run_server(args.common, app).await
}

async fn user_profile(Path(username): Path<String>) -> impl IntoResponse {
    Json(json!({
        "login": username,
        "followers": 42,
        "public_repos": 3,
        "bio": "fixture account"
    }))
}

async fn user_repos(Path(username): Path<String>) -> impl IntoResponse {
    Json(json!([
        {
            "name": format!("{username}.dev"),
            "stargazers_count": 10,
            "fork": false
        },
        {
            "name": "dotfiles",
            "stargazers_count": 2,
            "fork": false
        },
        {
            "name": "some-upstream-fork",
            "stargazers_count": 9000,
            "fork": true
        }
    ]))
}
