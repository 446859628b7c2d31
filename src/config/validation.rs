use super::models::Settings;
use thiserror::Error;
use url::Url;

const PROXY_SCHEMES: &[&str] = &["http", "https", "socks5", "socks5h"];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Proxy '{proxy}' is not a valid URL: {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("Proxy scheme '{scheme}' is not supported (use http, https, socks5 or socks5h)")]
    UnsupportedProxyScheme { scheme: String },

    #[error("Player command must not be empty")]
    EmptyPlayer,

    #[error("Update URL '{url}' must be an absolute http(s) URL")]
    InvalidUpdateUrl { url: String },
}

/// Validate settings after all layers are merged
pub fn validate(settings: &Settings) -> Result<(), ValidationError> {
    validate_proxy(settings)?;
    validate_player(settings)?;
    validate_update_url(settings)?;
    Ok(())
}

fn validate_proxy(settings: &Settings) -> Result<(), ValidationError> {
    let Some(proxy) = settings.proxy.as_deref() else {
        return Ok(());
    };

    let parsed = Url::parse(proxy).map_err(|e| ValidationError::InvalidProxy {
        proxy: proxy.to_string(),
        reason: e.to_string(),
    })?;

    if !PROXY_SCHEMES.contains(&parsed.scheme()) {
        return Err(ValidationError::UnsupportedProxyScheme {
            scheme: parsed.scheme().to_string(),
        });
    }

    Ok(())
}

fn validate_player(settings: &Settings) -> Result<(), ValidationError> {
    if settings.player.trim().is_empty() {
        return Err(ValidationError::EmptyPlayer);
    }
    Ok(())
}

fn validate_update_url(settings: &Settings) -> Result<(), ValidationError> {
    let valid = Url::parse(&settings.update_url)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);

    if !valid {
        return Err(ValidationError::InvalidUpdateUrl {
            url: settings.update_url.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate(&Settings::default()).is_ok());
    }

    #[test]
    fn test_socks_proxy_accepted() {
        let settings = Settings {
            proxy: Some("socks5://localhost:1080".to_string()),
            ..Default::default()
        };
        assert!(validate(&settings).is_ok());
    }

    #[test]
    fn test_rejects_unknown_proxy_scheme() {
        let settings = Settings {
            proxy: Some("ftp://proxy:21".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate(&settings),
            Err(ValidationError::UnsupportedProxyScheme { .. })
        ));
    }

    #[test]
    fn test_rejects_garbage_proxy() {
        let settings = Settings {
            proxy: Some("not a proxy".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate(&settings),
            Err(ValidationError::InvalidProxy { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_player() {
        let settings = Settings {
            player: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(validate(&settings), Err(ValidationError::EmptyPlayer)));
    }

    #[test]
    fn test_rejects_relative_update_url() {
        let settings = Settings {
            update_url: "latest.txt".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate(&settings),
            Err(ValidationError::InvalidUpdateUrl { .. })
        ));
    }
}
