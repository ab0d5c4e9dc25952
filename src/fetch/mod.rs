//! Trajectory source transport: local files and HTTP downloads.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::{GridError, Result};
use bytes::Bytes;

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes> {
    let url = url
        .parse()
        .map_err(|e| GridError::invalid(format!("invalid URL {:?}: {}", url, e)))?;
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?)
}

/// Loads a trajectory payload from a local path or an `http(s)` URL.
#[tracing::instrument(skip_all, fields(source = %source))]
pub async fn load_source(source: &str) -> Result<Bytes> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let client = BasicClient::new()?;
        fetch_bytes(&client, source).await?
    } else {
        Bytes::from(tokio::fs::read(source).await?)
    };
    tracing::debug!(bytes = bytes.len(), "Source loaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[tokio::test]
    async fn test_load_local_file() {
        let path = format!("{}/macroflow_fetch_local.csv", env::temp_dir().display());
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let bytes = load_source(&path).await.unwrap();
        assert_eq!(&bytes[..], b"a,b\n1,2\n");

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = load_source("/nonexistent/macroflow/trajectories.csv").await;
        assert!(matches!(result, Err(GridError::Io(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_url() {
        let client = BasicClient::new().unwrap();
        let result = fetch_bytes(&client, "not a url").await;
        assert!(matches!(result, Err(GridError::InvalidInput(_))));
    }

    #[test]
    fn test_basic_client_builds() {
        assert!(BasicClient::new().is_ok());
    }
}
