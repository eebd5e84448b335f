use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    /// Shared secret for HMAC verification of channel callbacks.
    pub channel_webhook_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            channel_webhook_secret: env::var("CHANNEL_WEBHOOK_SECRET")?,
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.channel_webhook_secret.is_empty() {
            anyhow::bail!("CHANNEL_WEBHOOK_SECRET is empty");
        }
        if self.server_port == 0 {
            anyhow::bail!("SERVER_PORT must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 3000,
            database_url: "postgres://localhost:5432/paydesk".to_string(),
            channel_webhook_secret: "secret".to_string(),
        }
    }

    #[test]
    fn accepts_complete_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_empty_database_url() {
        let mut config = base_config();
        config.database_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_webhook_secret() {
        let mut config = base_config();
        config.channel_webhook_secret = String::new();
        assert!(config.validate().is_err());
    }
}
