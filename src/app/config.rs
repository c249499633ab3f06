use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

use crate::domain::errors::DomainError;

/// Runtime settings, loaded from the environment at startup.
pub struct AppConfig {
    pub data_root: PathBuf,
    pub bind_addr: SocketAddr,
    pub auth_secret: Vec<u8>,
    pub asset_store_url: Url,
    pub asset_store_api_key: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, DomainError> {
        let bind_addr = optional("FITTRACK_BIND_ADDR", "127.0.0.1:5000")
            .parse()
            .map_err(|e| DomainError::InvalidData(format!("Invalid FITTRACK_BIND_ADDR: {}", e)))?;

        let asset_store_url = parse_base_url(&required("FITTRACK_ASSET_STORE_URL")?)?;

        Ok(Self {
            data_root: PathBuf::from(optional("FITTRACK_DATA_DIR", "data")),
            bind_addr,
            auth_secret: required("FITTRACK_AUTH_SECRET")?.into_bytes(),
            asset_store_url,
            asset_store_api_key: required("FITTRACK_ASSET_STORE_API_KEY")?,
        })
    }
}

fn optional(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        tracing::info!("{} not set, using default: {}", key, default);
        default.to_string()
    })
}

fn required(key: &str) -> Result<String, DomainError> {
    env::var(key).map_err(|_| DomainError::InvalidData(format!("{} must be set", key)))
}

/// Parse a base URL, forcing a trailing slash so path joins keep every
/// segment the operator configured.
fn parse_base_url(raw: &str) -> Result<Url, DomainError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized)
        .map_err(|e| DomainError::InvalidData(format!("Invalid asset store URL {}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::parse_base_url;

    #[test]
    fn base_urls_keep_their_path_when_joined() {
        let base = parse_base_url("https://assets.example.com/v1").expect("valid url");
        let joined = base.join("upload").expect("join");
        assert_eq!(joined.as_str(), "https://assets.example.com/v1/upload");
    }

    #[test]
    fn garbage_base_urls_are_rejected() {
        assert!(parse_base_url("not a url").is_err());
    }
}
