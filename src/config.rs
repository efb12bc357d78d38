use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerCfg {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbCfg {
    /// Path of the SQLite database file, e.g. installation-tokens.db
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerCfg,
    pub db: DbCfg,
}

fn default_bind_addr() -> String { "127.0.0.1:8080".to_string() }

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        // Nested keys (SERVER__BIND_ADDR, DB__URL) win over the flat names
        // APP_BIND_ADDR and DATABASE_URL.
        let server = settings.get::<ServerCfg>("server").unwrap_or(ServerCfg {
            bind_addr: std::env::var("APP_BIND_ADDR").unwrap_or_else(|_| default_bind_addr()),
        });

        let db = match settings.get::<DbCfg>("db") {
            Ok(db) => db,
            Err(_) => DbCfg {
                url: std::env::var("DATABASE_URL")
                    .map_err(|_| anyhow::anyhow!("DATABASE_URL (or DB__URL) must be set"))?,
            },
        };

        Ok(AppConfig { server, db })
    }
}
