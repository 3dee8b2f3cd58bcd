use meterview_providers::{Credentials, UpstreamConfig};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 20;

/// Runtime configuration, read from the environment (after `.env`).
///
/// The billing API part is optional: the service still starts without it
/// and reports the missing configuration per request.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub upstream: Option<UpstreamConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            upstream: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = var("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let timeout = var("UPSTREAM_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);

        let upstream = match (
            var("USAGE_API_URL"),
            var("COST_API_URL"),
            var("BILLING_USERNAME"),
            var("BILLING_PASSWORD"),
        ) {
            (Some(usage_url), Some(cost_url), Some(username), Some(password)) => {
                let credentials = match var("BILLING_TOKEN_URL") {
                    Some(token_url) => Credentials::ClientCredentials {
                        token_url,
                        client_id: username,
                        client_secret: password,
                    },
                    None => Credentials::basic(username, password),
                };
                Some(UpstreamConfig {
                    usage_url,
                    cost_url,
                    credentials,
                    timeout: Duration::from_secs(timeout),
                })
            }
            _ => None,
        };

        Self { port, upstream }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    const FULL: [(&str, &str); 4] = [
        ("USAGE_API_URL", "https://billing.example/usage"),
        ("COST_API_URL", "https://billing.example/cost"),
        ("BILLING_USERNAME", "sb-client"),
        ("BILLING_PASSWORD", "secret"),
    ];

    #[test]
    fn defaults_without_env() {
        let s = settings(&[]);
        assert_eq!(s.port, 3001);
        assert!(s.upstream.is_none());
    }

    #[test]
    fn any_missing_piece_disables_upstream() {
        let s = settings(&FULL[..3]);
        assert!(s.upstream.is_none());
        let s = settings(&[FULL[0], FULL[1], FULL[2], ("BILLING_PASSWORD", "  ")]);
        assert!(s.upstream.is_none());
    }

    #[test]
    fn basic_credentials_by_default() {
        let s = settings(&[FULL[0], FULL[1], FULL[2], FULL[3], ("PORT", "8080")]);
        assert_eq!(s.port, 8080);
        let up = s.upstream.unwrap();
        assert_eq!(up.timeout, Duration::from_secs(20));
        assert!(matches!(up.credentials, Credentials::Basic { ref username, .. } if username == "sb-client"));
    }

    #[test]
    fn token_url_switches_to_client_credentials() {
        let mut pairs = FULL.to_vec();
        pairs.push(("BILLING_TOKEN_URL", "https://auth.example/oauth/token"));
        pairs.push(("UPSTREAM_TIMEOUT_SECS", "3"));
        let up = settings(&pairs).upstream.unwrap();
        assert_eq!(up.timeout, Duration::from_secs(3));
        assert!(matches!(
            up.credentials,
            Credentials::ClientCredentials { ref client_id, .. } if client_id == "sb-client"
        ));
    }
}
