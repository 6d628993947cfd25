// src/fetch/mod.rs

use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};

/// File name a URL caches under: the final path segment, with any query
/// string discarded.
pub fn derived_name(url: &str) -> Result<String> {
    let parsed =
        Url::parse(url).map_err(|e| Error::Config(format!("invalid url `{url}`: {e}")))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Config(format!("url `{url}` has no file name in its path")))
}

/// Ensure a local copy of `url` exists under `cache_dir` and return its path.
///
/// With `use_cache` set, an existing file under the derived name is reused
/// without touching the network. Otherwise the body is fetched with a single
/// GET, staged as `<name>.tmp` and renamed into place, so an interrupted
/// download never masquerades as a valid cache entry.
#[tracing::instrument(level = "debug", skip(client, cache_dir))]
pub async fn ensure_local(
    client: &Client,
    url: &str,
    cache_dir: &Path,
    use_cache: bool,
) -> Result<PathBuf> {
    let name = derived_name(url)?;
    let dest = cache_dir.join(&name);

    if !use_cache {
        warn!("source file caching is disabled in the settings");
    } else if dest.is_file() {
        info!(file = %dest.display(), "using previously downloaded file");
        return Ok(dest);
    }

    debug!(%url, "downloading");
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|source| Error::Network {
            url: url.to_string(),
            source,
        })?;
    let bytes = response.bytes().await.map_err(|source| Error::Network {
        url: url.to_string(),
        source,
    })?;

    let tmp = cache_dir.join(format!("{name}.tmp"));
    fs::write(&tmp, &bytes)
        .await
        .map_err(|source| Error::Filesystem {
            op: "writing",
            path: tmp.clone(),
            source,
        })?;
    fs::rename(&tmp, &dest)
        .await
        .map_err(|source| Error::Filesystem {
            op: "renaming",
            path: tmp.clone(),
            source,
        })?;

    info!(file = %dest.display(), bytes = bytes.len(), "downloaded fresh copy of the source file");
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str = "a,b\n1,2\n";

    async fn csv_server(expected_hits: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports/latest.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(BODY, "text/csv"))
            .expect(expected_hits)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn derived_name_is_the_last_path_segment() -> Result<()> {
        assert_eq!(
            derived_name("https://example.com/data/report.csv")?,
            "report.csv"
        );
        Ok(())
    }

    #[test]
    fn derived_name_strips_the_query_string() -> Result<()> {
        assert_eq!(
            derived_name("https://example.com/data/report.csv?token=abc&page=1")?,
            "report.csv"
        );
        Ok(())
    }

    #[test]
    fn derived_name_rejects_directory_urls() {
        assert!(matches!(
            derived_name("https://example.com/data/"),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn downloads_when_nothing_is_cached() -> Result<()> {
        let server = csv_server(1).await;
        let cache = tempdir()?;
        let client = Client::new();

        let url = format!("{}/reports/latest.csv", server.uri());
        let cached = ensure_local(&client, &url, cache.path(), true).await?;

        assert_eq!(cached, cache.path().join("latest.csv"));
        assert_eq!(std::fs::read_to_string(&cached)?, BODY);
        Ok(())
    }

    #[tokio::test]
    async fn reuses_cached_file_without_a_network_call() -> Result<()> {
        let server = csv_server(0).await;
        let cache = tempdir()?;
        std::fs::write(cache.path().join("latest.csv"), "cached")?;
        let client = Client::new();

        let url = format!("{}/reports/latest.csv", server.uri());
        let cached = ensure_local(&client, &url, cache.path(), true).await?;

        assert_eq!(std::fs::read_to_string(&cached)?, "cached");
        Ok(())
    }

    #[tokio::test]
    async fn cache_disabled_always_downloads() -> Result<()> {
        let server = csv_server(1).await;
        let cache = tempdir()?;
        std::fs::write(cache.path().join("latest.csv"), "stale")?;
        let client = Client::new();

        let url = format!("{}/reports/latest.csv", server.uri());
        let cached = ensure_local(&client, &url, cache.path(), false).await?;

        assert_eq!(std::fs::read_to_string(&cached)?, BODY);
        Ok(())
    }

    #[tokio::test]
    async fn non_2xx_leaves_no_cache_entry() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let cache = tempdir()?;
        let client = Client::new();

        let url = format!("{}/reports/latest.csv", server.uri());
        let err = ensure_local(&client, &url, cache.path(), true)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network { .. }));
        assert_eq!(std::fs::read_dir(cache.path())?.count(), 0);
        Ok(())
    }
}
