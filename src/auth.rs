//! Tradier API token resolution
//!
//! Read-only audit work needs nothing but a bearer token. Resolution
//! order: explicit flag, then environment, then an interactive prompt.

use anyhow::{anyhow, Result};

pub const TOKEN_ENV_VAR: &str = "TRADIER_TOKEN";

/// Resolve the API token, prompting on the terminal as a last resort.
pub fn resolve_token(flag: Option<&str>) -> Result<String> {
    if let Some(token) = token_from_sources(flag, std::env::var(TOKEN_ENV_VAR).ok()) {
        return Ok(token);
    }

    let token = rpassword::prompt_password("Enter Tradier API token: ")?;
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(anyhow!("API token cannot be empty"));
    }
    Ok(token)
}

/// Non-interactive part of the resolution chain; blank values fall through.
fn token_from_sources(flag: Option<&str>, env_value: Option<String>) -> Option<String> {
    flag.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .or_else(|| {
            env_value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_takes_precedence_over_env() {
        let token = token_from_sources(Some("flag-token"), Some("env-token".to_string()));
        assert_eq!(token.as_deref(), Some("flag-token"));
    }

    #[test]
    fn test_env_used_when_flag_absent() {
        let token = token_from_sources(None, Some("env-token".to_string()));
        assert_eq!(token.as_deref(), Some("env-token"));
    }

    #[test]
    fn test_blank_values_fall_through() {
        assert_eq!(
            token_from_sources(Some("  "), Some("env-token".to_string())).as_deref(),
            Some("env-token")
        );
        assert_eq!(token_from_sources(Some(""), None), None);
        assert_eq!(token_from_sources(None, Some("  ".to_string())), None);
    }

    #[test]
    fn test_tokens_are_trimmed() {
        let token = token_from_sources(Some(" abc123 "), None);
        assert_eq!(token.as_deref(), Some("abc123"));
    }
}
