//! Server configuration.
//!
//! Layered the usual way: compiled defaults, an optional `lectern.toml`
//! next to the binary, then `LECTERN_*` environment variables winning over
//! both (`LECTERN_DATABASE_URL`, `LECTERN_PORT`, ...).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// PostgreSQL connection string; the server refuses to start without it
    pub database_url: String,
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("database_url", "")?
            .add_source(config::File::with_name("lectern").required(false))
            .add_source(config::Environment::with_prefix("LECTERN"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_in() {
        let config = config::Config::builder()
            .set_default("host", "0.0.0.0")
            .unwrap()
            .set_default("port", 3000)
            .unwrap()
            .set_default("database_url", "")
            .unwrap()
            .build()
            .unwrap();
        let config: ServerConfig = config.try_deserialize().unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert!(config.database_url.is_empty());
    }
}
