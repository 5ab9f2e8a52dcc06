//! Process Configuration
//!
//! Everything is read from environment variables once at startup (after
//! `.env` is loaded). A missing or short `JWT_SECRET` aborts startup.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, bail};
use auth::config::{AuthConfig, SameSite};
use platform::mail::{HttpMailConfig, HttpMailTransport, LogMailTransport, Mailer};
use zeroize::Zeroizing;

/// Minimum signing secret length in bytes
const MIN_SECRET_BYTES: usize = 32;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:5173";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    /// Consumed by the token issuer at startup, wiped on drop
    pub jwt_secret: Zeroizing<String>,
    pub auth: AuthConfig,
    pub mail: Option<HttpMailConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;

        let jwt_secret = Zeroizing::new(get("JWT_SECRET").context("JWT_SECRET must be set")?);
        if jwt_secret.len() < MIN_SECRET_BYTES {
            bail!("JWT_SECRET must be at least {MIN_SECRET_BYTES} bytes");
        }

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {v}"))?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .trim()
            .parse()
            .context("BIND_ADDR is not a socket address")?;

        let frontend_origins = get("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let defaults = AuthConfig::default();
        let cookie_secure = match get("COOKIE_SECURE") {
            Some(v) => parse_bool(&v).with_context(|| format!("COOKIE_SECURE is not a bool: {v}"))?,
            None => !cfg!(debug_assertions),
        };
        let cookie_same_site = match get("COOKIE_SAME_SITE") {
            Some(v) => SameSite::parse(&v)
                .with_context(|| format!("COOKIE_SAME_SITE must be Strict, Lax or None: {v}"))?,
            None => defaults.cookie_same_site,
        };
        if cookie_same_site == SameSite::None && !cookie_secure {
            bail!("COOKIE_SAME_SITE=None requires COOKIE_SECURE=true");
        }

        let auth = AuthConfig {
            session_cookie_name: get("SESSION_COOKIE_NAME")
                .unwrap_or_else(|| defaults.session_cookie_name.clone()),
            cookie_secure,
            cookie_same_site,
            token_issuer: get("JWT_ISSUER").unwrap_or_else(|| defaults.token_issuer.clone()),
            ..defaults
        };

        let mail = match (
            get("MAIL_API_URL"),
            get("MAIL_API_KEY"),
            get("MAIL_SENDER_EMAIL"),
        ) {
            (Some(endpoint), Some(api_key), Some(sender_email)) => Some(HttpMailConfig {
                endpoint,
                api_key: Zeroizing::new(api_key),
                sender_email,
                sender_name: get("MAIL_SENDER_NAME"),
            }),
            (None, None, None) if cfg!(debug_assertions) => None,
            (None, None, None) => {
                bail!("MAIL_API_URL, MAIL_API_KEY and MAIL_SENDER_EMAIL must be set")
            }
            _ => bail!("MAIL_API_URL, MAIL_API_KEY and MAIL_SENDER_EMAIL must be set together"),
        };

        Ok(Self {
            database_url,
            db_max_connections,
            bind_addr,
            frontend_origins,
            jwt_secret,
            auth,
            mail,
        })
    }
}

/// Build the mail transport, falling back to the logging transport when mail is
/// unconfigured (debug builds).
pub fn build_mailer(mail: Option<HttpMailConfig>) -> anyhow::Result<Mailer> {
    match mail {
        Some(config) => {
            tracing::info!(endpoint = %config.endpoint, "Mail transport: HTTP API");
            Ok(Mailer::Http(HttpMailTransport::new(config)?))
        }
        None => {
            tracing::warn!("Mail transport not configured, outgoing mail is dropped");
            Ok(Mailer::Log(LogMailTransport))
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgres://localhost/estate"),
            ("JWT_SECRET", SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = load(&minimal()).unwrap();

        assert_eq!(config.bind_addr.port(), 31113);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.frontend_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.auth.session_cookie_name, "session_token");
        assert_eq!(config.auth.token_issuer, "estate-backend");
        assert_eq!(config.auth.max_verification_resends, 3);
        assert_eq!(config.jwt_secret.as_str(), SECRET);
        assert!(config.mail.is_none());
    }

    #[test]
    fn test_secret_is_required() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/estate")]).err().unwrap();
        assert!(err.to_string().contains("JWT_SECRET"));

        let mut vars = minimal();
        vars[1] = ("JWT_SECRET", "   ");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let mut vars = minimal();
        vars[1] = ("JWT_SECRET", "too-short");
        let err = load(&vars).err().unwrap();
        assert!(err.to_string().contains("32 bytes"));
    }

    #[test]
    fn test_overrides() {
        let mut vars = minimal();
        vars.extend([
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("FRONTEND_ORIGINS", "https://a.test, https://b.test,"),
            ("COOKIE_SECURE", "true"),
            ("COOKIE_SAME_SITE", "strict"),
            ("SESSION_COOKIE_NAME", "estate_session"),
            ("JWT_ISSUER", "estate-staging"),
            ("DB_MAX_CONNECTIONS", "12"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(
            config.frontend_origins,
            vec!["https://a.test", "https://b.test"]
        );
        assert!(config.auth.cookie_secure);
        assert_eq!(config.auth.cookie_same_site, SameSite::Strict);
        assert_eq!(config.auth.session_cookie_name, "estate_session");
        assert_eq!(config.auth.token_issuer, "estate-staging");
        assert_eq!(config.db_max_connections, 12);
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("BIND_ADDR", "nowhere"),
            ("DB_MAX_CONNECTIONS", "many"),
            ("COOKIE_SECURE", "maybe"),
            ("COOKIE_SAME_SITE", "sometimes"),
        ] {
            let mut vars = minimal();
            vars.push((key, value));
            assert!(load(&vars).is_err(), "{key}={value}");
        }
    }

    #[test]
    fn test_same_site_none_needs_secure() {
        let mut vars = minimal();
        vars.extend([("COOKIE_SAME_SITE", "None"), ("COOKIE_SECURE", "false")]);
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_mail_settings() {
        let mut vars = minimal();
        vars.extend([
            ("MAIL_API_URL", "https://api.mail.test/v3/smtp/email"),
            ("MAIL_API_KEY", "key-abc"),
            ("MAIL_SENDER_EMAIL", "no-reply@estate.test"),
        ]);
        let mail = load(&vars).unwrap().mail.unwrap();
        assert_eq!(mail.sender_email, "no-reply@estate.test");
        assert_eq!(mail.sender_name, None);

        let mut partial = minimal();
        partial.push(("MAIL_API_KEY", "key-abc"));
        assert!(load(&partial).is_err());
    }
}
