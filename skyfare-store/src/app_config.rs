use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Required when `backend = "postgres"`.
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Base settings checked into the repo
            .add_source(config::File::with_name("config/default"))
            // Per-environment overlay, selected by RUN_MODE
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Machine-local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `SKYFARE__AUTH__JWT_SECRET=...` overrides auth.jwt_secret
            .add_source(config::Environment::with_prefix("SKYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
