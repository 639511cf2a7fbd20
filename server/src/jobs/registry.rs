use crate::jobs::job_types::{NoopJob, RefreshGithubStatsJob};
use crate::state::AppState;

// This implements the Jobs struct required by the cja job worker
cja::impl_job_registry!(AppState, NoopJob, RefreshGithubStatsJob);
