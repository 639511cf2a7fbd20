use serde_json::Value;
use std::process::{Child, Command};
use std::time::Duration;
use tokio::time::sleep;

fn start_github_server(port: u16) -> Child {
    Command::new("cargo")
        .args([
            "run",
            "-p",
            "fixtures",
            "--bin",
            "github",
            "--",
            "--port",
            &port.to_string(),
        ])
        .spawn()
        .expect("Failed to start github server")
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    for _ in 0..60 {
        if client
            .get(format!("http://localhost:{port}/"))
            .send()
            .await
            .is_ok()
        {
            return;
        }
        sleep(Duration::from_millis(500)).await;
    }
    panic!("Server failed to start on port {port}");
}

#[tokio::test]
async fn test_user_profile_endpoint() {
    let port = 9111;
    let mut server = start_github_server(port);
    wait_for_server(port).await;

    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://localhost:{port}/users/rowan"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["login"], "rowan");
    assert_eq!(json["followers"], 42);
    assert_eq!(json["public_repos"], 3);

    // Cleanup
    server.kill().expect("Failed to kill server");
    server.wait().expect("Failed to wait for server");
}

#[tokio::test]
async fn test_user_repos_endpoint_marks_forks() {
    let port = 9112;
    let mut server = start_github_server(port);
    wait_for_server(port).await;

    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://localhost:{port}/users/rowan/repos"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    let repos = json.as_array().unwrap();

    assert_eq!(repos.len(), 3);
    assert_eq!(repos[0]["fork"], false);
    assert_eq!(repos[2]["fork"], true);

    // Cleanup
    server.kill().expect("Failed to kill server");
    server.wait().expect("Failed to wait for server");
}
