use secrecy::Secret;
use serde::Deserialize;

const DEFAULT_EXPORT_MAX_ROWS: i64 = 50_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // HS256 secret shared with the token issuer
    pub jwt_secret: Secret<String>,

    // Admin console / storefront origins allowed by CORS
    pub allowed_origins: Vec<String>,

    // Upper bound on rows in a single registry export
    pub export_max_rows: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        let export_max_rows = match config.get::<i64>("export_max_rows") {
            Ok(rows) => check_export_max_rows(rows)?,
            Err(config::ConfigError::NotFound(_)) => DEFAULT_EXPORT_MAX_ROWS,
            Err(e) => return Err(e),
        };

        Ok(Self {
            database_url: config.get("database_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            jwt_secret: Secret::new(config.get("jwt_secret")?),

            allowed_origins: config
                .get::<String>("allowed_origins")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),

            export_max_rows,
        })
    }
}

fn check_export_max_rows(rows: i64) -> Result<i64, config::ConfigError> {
    if rows < 1 {
        return Err(config::ConfigError::Message(format!(
            "export_max_rows must be at least 1, got {}",
            rows
        )));
    }
    Ok(rows)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
