use std::env;
use std::sync::Arc;

use color_eyre::eyre::Context as _;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::content::SiteContent;

/// Where bearer tokens get verified.
#[derive(Clone)]
pub struct IdentityConfig {
    pub issuer_url: String,
}

impl IdentityConfig {
    pub fn from_env() -> cja::Result<Self> {
        let issuer_url = env::var("IDP_URL").wrap_err("IDP_URL must be set")?;

        Ok(Self {
            issuer_url: issuer_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn userinfo_url(&self) -> String {
        format!("{}/oauth/userinfo", self.issuer_url)
    }
}

#[derive(Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub username: String,
}

impl GithubConfig {
    pub fn from_env() -> cja::Result<Self> {
        let api_url = env::var("GITHUB_API_URL")
            .unwrap_or_else(|_| "https://api.github.com".to_string());
        let username = env::var("GITHUB_USERNAME").wrap_err("GITHUB_USERNAME must be set")?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            username,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cookie_key: cja::server::cookies::CookieKey,
    pub domain: String,
    pub protocol: String,
    pub client: reqwest::Client,
    pub identity: IdentityConfig,
    pub github: GithubConfig,
    pub admin_subjects: Arc<Vec<String>>,
    pub content: Arc<SiteContent>,
}

impl AppState {
    pub async fn from_env() -> cja::Result<Self> {
        let pool = setup_db_pool().await?;

        let cookie_key = cja::server::cookies::CookieKey::from_env_or_generate()?;

        let client = reqwest::ClientBuilder::new()
            .timeout(std::time::Duration::from_secs(5))
            .user_agent(concat!("porchlight/", env!("CARGO_PKG_VERSION")))
            .use_rustls_tls()
            .build()?;

        let admin_subjects: Vec<String> = env::var("ADMIN_SUBJECTS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let content = SiteContent::load()?;

        Ok(Self {
            db: pool,
            cookie_key,
            domain: env::var("DOMAIN")?,
            protocol: env::var("PROTO").unwrap_or_else(|_| "https".to_string()),
            client,
            identity: IdentityConfig::from_env()?,
            github: GithubConfig::from_env()?,
            admin_subjects: Arc::new(admin_subjects),
            content: Arc::new(content),
        })
    }

    /// The canonical base URL for this deployment
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }

    /// Whether a verified identity-provider subject is on the admin list
    pub fn is_admin_subject(&self, subject: &str) -> bool {
        self.admin_subjects.iter().any(|s| s == subject)
    }
}

impl cja::app_state::AppState for AppState {
    fn version(&self) -> &str {
        env!("VERGEN_GIT_SHA")
    }

    fn db(&self) -> &sqlx::PgPool {
        &self.db
    }

    fn cookie_key(&self) -> &cja::server::cookies::CookieKey {
        &self.cookie_key
    }
}

#[tracing::instrument(err)]
pub async fn setup_db_pool() -> cja::Result<PgPool> {
    const MIGRATION_LOCK_ID: i64 = 0xDB_DB_DB_DB_DB_DB_DB;

    let database_url = env::var("DATABASE_URL").wrap_err("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(&pool)
        .await?;

    sqlx::migrate!("../migrations").run(&pool).await?;

    let unlocked: bool = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_ID)
        .fetch_one(&pool)
        .await?;

    if unlocked {
        tracing::info!("Migration lock unlocked");
    } else {
        tracing::info!("Failed to unlock migration lock");
    }

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_config_strips_trailing_slash() {
        env::set_var("IDP_URL", "https://idp.example.com/");

        let config = IdentityConfig::from_env().unwrap();
        assert_eq!(
            config.userinfo_url(),
            "https://idp.example.com/oauth/userinfo"
        );

        env::remove_var("IDP_URL");
    }

    #[test]
    fn test_github_config_defaults_api_url() {
        env::remove_var("GITHUB_API_URL");
        env::set_var("GITHUB_USERNAME", "octocat");

        let config = GithubConfig::from_env().unwrap();
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.username, "octocat");

        env::remove_var("GITHUB_USERNAME");
    }
}
