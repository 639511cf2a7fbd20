use cja::jobs::Job;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::github::{self, GithubStats};
use crate::state::AppState;

/// Job to refresh the cached GitHub stats shown on the home page
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RefreshGithubStatsJob;

#[async_trait::async_trait]
impl Job<AppState> for RefreshGithubStatsJob {
    const NAME: &'static str = "RefreshGithubStatsJob";

    async fn run(&self, app_state: AppState) -> cja::Result<()> {
        let (followers, public_repos, total_stars) = github::fetch_stats(&app_state).await?;

        let stats = GithubStats::upsert(
            &app_state.db,
            &app_state.github.username,
            followers,
            public_repos,
            total_stars,
        )
        .await?;

        info!(
            username = %stats.username,
            fetched_at = %stats.fetched_at_utc,
            "Refreshed cached GitHub stats"
        );

        Ok(())
    }
}
