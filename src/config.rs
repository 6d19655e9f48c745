use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{anyhow, Context, Result};
use chrono::Weekday;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub backend_url: String,
    pub mail: Option<MailConfig>,
    pub cloudinary_url: Option<String>,
    pub openrouter: OpenRouterConfig,
    pub google: Option<GoogleConfig>,
    pub newsletter: NewsletterSchedule,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

/// Weekly slot (UTC) at which the newsletter goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsletterSchedule {
    pub weekday: Weekday,
    pub hour: u32,
}

impl Default for NewsletterSchedule {
    fn default() -> Self {
        Self {
            weekday: Weekday::Sun,
            hour: 10,
        }
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "openai/gpt-3.5-turbo".to_string(),
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            database_url: "sqlite://smartblog.db".to_string(),
            jwt_secret: String::new(),
            frontend_url: "http://localhost:3000".to_string(),
            backend_url: "http://localhost:8080".to_string(),
            mail: None,
            cloudinary_url: None,
            openrouter: OpenRouterConfig::default(),
            google: None,
            newsletter: NewsletterSchedule::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Config::default();

        if let Some(host) = get("HOST") {
            config.host = host.parse().context("HOST must be an IP address")?;
        }
        if let Some(port) = get("PORT") {
            config.port = port.parse().context("PORT must be a port number")?;
        }
        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        config.jwt_secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;
        if let Some(url) = get("FRONTEND_URL") {
            config.frontend_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = get("BACKEND_URL") {
            config.backend_url = url.trim_end_matches('/').to_string();
        }

        config.mail = match (get("EMAIL"), get("APP_PASSWORD")) {
            (Some(username), Some(password)) => Some(MailConfig {
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                smtp_port: match get("SMTP_PORT") {
                    Some(port) => port.parse().context("SMTP_PORT must be a port number")?,
                    None => 587,
                },
                username,
                password,
            }),
            _ => None,
        };
        config.cloudinary_url = get("CLOUDINARY_URL");

        config.openrouter.api_key = get("OPENROUTER_API_KEY");
        if let Some(model) = get("OPENROUTER_MODEL") {
            config.openrouter.model = model;
        }
        if let Some(endpoint) = get("OPENROUTER_URL") {
            config.openrouter.endpoint = endpoint;
        }

        config.google = match (get("GOOGLE_CLIENT_ID"), get("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        if let Some(day) = get("NEWSLETTER_WEEKDAY") {
            config.newsletter.weekday = day
                .parse()
                .map_err(|_| anyhow!("NEWSLETTER_WEEKDAY must be a weekday, got {day}"))?;
        }
        if let Some(hour) = get("NEWSLETTER_HOUR") {
            let hour: u32 = hour.parse().context("NEWSLETTER_HOUR must be a number")?;
            if hour > 23 {
                return Err(anyhow!("NEWSLETTER_HOUR must be between 0 and 23"));
            }
            config.newsletter.hour = hour;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn google_redirect_uri(&self) -> String {
        format!("{}/login/oauth2/code/google", self.backend_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn jwt_secret_is_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "sqlite://smartblog.db");
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert!(config.mail.is_none());
        assert!(config.google.is_none());
        assert!(config.cloudinary_url.is_none());
        assert_eq!(config.newsletter, NewsletterSchedule::default());
        assert_eq!(config.openrouter.model, "openai/gpt-3.5-turbo");
    }

    #[test]
    fn mail_needs_both_credentials() {
        let config = load(&[("JWT_SECRET", "s"), ("EMAIL", "me@example.com")]).unwrap();
        assert!(config.mail.is_none());

        let config = load(&[
            ("JWT_SECRET", "s"),
            ("EMAIL", "me@example.com"),
            ("APP_PASSWORD", "pw"),
            ("SMTP_PORT", "2525"),
        ])
        .unwrap();
        let mail = config.mail.unwrap();
        assert_eq!(mail.smtp_host, "smtp.gmail.com");
        assert_eq!(mail.smtp_port, 2525);
    }

    #[test]
    fn urls_lose_trailing_slash() {
        let config = load(&[
            ("JWT_SECRET", "s"),
            ("FRONTEND_URL", "https://blog.example.com/"),
            ("BACKEND_URL", "https://api.example.com/"),
        ])
        .unwrap();
        assert_eq!(config.frontend_url, "https://blog.example.com");
        assert_eq!(
            config.google_redirect_uri(),
            "https://api.example.com/login/oauth2/code/google"
        );
    }

    #[test]
    fn newsletter_slot_is_validated() {
        let config = load(&[
            ("JWT_SECRET", "s"),
            ("NEWSLETTER_WEEKDAY", "Mon"),
            ("NEWSLETTER_HOUR", "7"),
        ])
        .unwrap();
        assert_eq!(config.newsletter.weekday, Weekday::Mon);
        assert_eq!(config.newsletter.hour, 7);

        assert!(load(&[("JWT_SECRET", "s"), ("NEWSLETTER_HOUR", "24")]).is_err());
        assert!(load(&[("JWT_SECRET", "s"), ("NEWSLETTER_WEEKDAY", "Funday")]).is_err());
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(load(&[("JWT_SECRET", "s"), ("PORT", "eighty")]).is_err());
    }
}
