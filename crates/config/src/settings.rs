use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub auth: AuthSettings,
    pub smtp: SmtpSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    /// Public base URL, used for links handed out in invites.
    pub root_url: String,
    pub cors_origins: Vec<String>,
}

impl AppSettings {
    /// Joins a relative path onto `root_url`.
    pub fn to_abs_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.root_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub issuer: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    /// Refuses invites for people without an account when set.
    pub disable_login_form: bool,
    /// Grants editors the org-user management permissions.
    pub editors_can_admin: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpSettings {
    pub enabled: bool,
    pub relay_url: String,
    pub from_address: String,
    pub from_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchSettings {
    pub url: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("ORGDESK"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.root_url", "http://localhost:3000/")?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "orgdesk")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.issuer", "orgdesk")?
            .set_default("auth.disable_login_form", false)?
            .set_default("auth.editors_can_admin", false)?
            .set_default("smtp.enabled", false)?
            .set_default("smtp.relay_url", "http://localhost:8025/send")?
            .set_default("smtp.from_address", "admin@orgdesk.localhost")?
            .set_default("smtp.from_name", "Orgdesk")?
            .set_default("search.url", "http://localhost:8081")?
            .build()?;

        config.try_deserialize()
    }
}
