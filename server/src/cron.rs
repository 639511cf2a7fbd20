use cja::{
    cron::{CronRegistry, Worker},
    jobs::Job as _,
};

use crate::{jobs::RefreshGithubStatsJob, state::AppState};

fn cron_registry() -> CronRegistry<AppState> {
    let mut registry = CronRegistry::new();

    // Keep the cached GitHub stats at most an hour stale
    registry.register(
        "refresh_github_stats",
        std::time::Duration::from_secs(60 * 60),
        |state: AppState, _job_name: String| {
            Box::pin(async move {
                if let Err(err) = RefreshGithubStatsJob
                    .enqueue(state.clone(), "refresh_github_stats_cron".to_string())
                    .await
                {
                    tracing::error!("Failed to enqueue GitHub stats refresh: {:?}", err);
                }
                Ok::<_, std::convert::Infallible>(())
            })
        },
    );

    registry
}

pub(crate) async fn run_cron(app_state: AppState) -> cja::Result<()> {
    Ok(Worker::new(app_state, cron_registry()).run().await?)
}
