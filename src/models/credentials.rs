//! OAuth credential records held by the token store.

use std::fmt;

/// External services that require OAuth2 bearer authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Sleep and activity tracker
    Oura,
    /// Body weight tracker
    Fitbit,
}

impl Service {
    pub const ALL: [Service; 2] = [Service::Oura, Service::Fitbit];

    /// Prefix used for this service's configuration keys.
    pub fn env_prefix(self) -> &'static str {
        match self {
            Service::Oura => "OURA",
            Service::Fitbit => "FITBIT",
        }
    }

    /// Full configuration key, e.g. `OURA_ACCESS_TOKEN`.
    pub fn env_key(self, suffix: &str) -> String {
        format!("{}_{}", self.env_prefix(), suffix)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Oura => f.write_str("oura"),
            Service::Fitbit => f.write_str("fitbit"),
        }
    }
}

/// Credential record for one service. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Replace both tokens. The previous access token is dropped.
    pub fn apply(&mut self, tokens: &TokenPair) {
        self.access_token = Some(tokens.access_token.clone());
        self.refresh_token = Some(tokens.refresh_token.clone());
    }
}

/// Token pair produced by a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key() {
        assert_eq!(Service::Oura.env_key("ACCESS_TOKEN"), "OURA_ACCESS_TOKEN");
        assert_eq!(Service::Fitbit.env_key("CLIENT_SECRET"), "FITBIT_CLIENT_SECRET");
    }

    #[test]
    fn test_apply_replaces_both_tokens() {
        let mut creds = Credentials {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            access_token: Some("old_access".to_string()),
            refresh_token: Some("old_refresh".to_string()),
        };

        creds.apply(&TokenPair {
            access_token: "new_access".to_string(),
            refresh_token: "new_refresh".to_string(),
        });

        assert_eq!(creds.access_token.as_deref(), Some("new_access"));
        assert_eq!(creds.refresh_token.as_deref(), Some("new_refresh"));
        assert_eq!(creds.client_id.as_deref(), Some("id"));
    }
}
