use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::postgres::PgPool;
use tracing::info;

use crate::state::AppState;

/// Cached GitHub profile stats, refreshed by the background job
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GithubStats {
    pub username: String,
    pub followers: i64,
    pub public_repos: i64,
    pub total_stars: i64,
    pub fetched_at_utc: DateTime<Utc>,
}

impl GithubStats {
    pub async fn get(pool: &PgPool, username: &str) -> cja::Result<Option<GithubStats>> {
        let stats = sqlx::query_as::<_, GithubStats>(
            r#"
            SELECT username, followers, public_repos, total_stars, fetched_at_utc
            FROM github_stats WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(stats)
    }

    pub async fn upsert(
        pool: &PgPool,
        username: &str,
        followers: i64,
        public_repos: i64,
        total_stars: i64,
    ) -> cja::Result<GithubStats> {
        let stats = sqlx::query_as::<_, GithubStats>(
            r#"
            INSERT INTO github_stats (username, followers, public_repos, total_stars, fetched_at_utc)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (username) DO UPDATE SET
                followers = EXCLUDED.followers,
                public_repos = EXCLUDED.public_repos,
                total_stars = EXCLUDED.total_stars,
                fetched_at_utc = NOW()
            RETURNING username, followers, public_repos, total_stars, fetched_at_utc
            "#,
        )
        .bind(username)
        .bind(followers)
        .bind(public_repos)
        .bind(total_stars)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }
}

#[derive(Debug, Deserialize)]
pub struct GithubUser {
    pub followers: i64,
    pub public_repos: i64,
}

#[derive(Debug, Deserialize)]
pub struct GithubRepo {
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub fork: bool,
}

/// Stars across a user's own repos; forks don't count
pub fn total_stars(repos: &[GithubRepo]) -> i64 {
    repos
        .iter()
        .filter(|r| !r.fork)
        .map(|r| r.stargazers_count)
        .sum()
}

/// Fetch the configured user's current stats from the GitHub API.
///
/// Returns `(followers, public_repos, total_stars)`. Any failure leaves the
/// cached row in the database untouched; the caller decides whether that is
/// worth more than a log line.
pub async fn fetch_stats(state: &AppState) -> cja::Result<(i64, i64, i64)> {
    let username = &state.github.username;
    let api_url = &state.github.api_url;

    let user: GithubUser = state
        .client
        .get(format!("{api_url}/users/{username}"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let repos: Vec<GithubRepo> = state
        .client
        .get(format!("{api_url}/users/{username}/repos?per_page=100"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let stars = total_stars(&repos);

    info!(
        username = %username,
        followers = user.followers,
        public_repos = user.public_repos,
        total_stars = stars,
        "Fetched GitHub stats"
    );

    Ok((user.followers, user.public_repos, stars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_stars_sums_repos() {
        let repos: Vec<GithubRepo> = serde_json::from_str(
            r#"[
                {"stargazers_count": 10, "fork": false},
                {"stargazers_count": 5, "fork": false},
                {"stargazers_count": 2, "fork": false}
            ]"#,
        )
        .unwrap();

        assert_eq!(total_stars(&repos), 17);
    }

    #[test]
    fn test_total_stars_skips_forks() {
        let repos: Vec<GithubRepo> = serde_json::from_str(
            r#"[
                {"stargazers_count": 10, "fork": false},
                {"stargazers_count": 9000, "fork": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(total_stars(&repos), 10);
    }

    #[test]
    fn test_repo_fields_default_when_absent() {
        let repos: Vec<GithubRepo> =
            serde_json::from_str(r#"[{"name": "bare-minimum"}]"#).unwrap();

        assert_eq!(total_stars(&repos), 0);
    }

    #[test]
    fn test_github_user_deserializes_from_api_shape() {
        let user: GithubUser = serde_json::from_str(
            r#"{
                "login": "octocat",
                "followers": 42,
                "public_repos": 8,
                "bio": "ignored"
            }"#,
        )
        .unwrap();

        assert_eq!(user.followers, 42);
        assert_eq!(user.public_repos, 8);
    }
}
