//! HTTP source - bundle archives fetched with a plain GET.
//!
//! The archive is downloaded once into the downloads root as
//! `<bundle name>.<ext>` and then handled like a local archive.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use url::Url;

use crate::core::BundleError;
use crate::sources::cache::{BundleCache, Materialized};
use crate::sources::{PathSource, Source};
use crate::util::archive::ArchiveFormat;
use crate::util::fs::ensure_dir;
use crate::util::hash::sha256_bytes;

/// Extension used when the URL names no recognized archive format.
const DEFAULT_EXT: &str = "zip";

/// A source for a bundle archive behind an HTTP(S) URL.
pub struct HttpSource {
    cache: BundleCache,
    url: Url,
    bundle_name: String,
    download_path: PathBuf,
    expected_hash: Option<String>,
    offline: bool,
}

impl HttpSource {
    pub fn new(
        cache: BundleCache,
        url: Url,
        base_name: Option<String>,
        expected_hash: Option<String>,
        offline: bool,
    ) -> Result<Self> {
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();

        let (stem, ext) = match ArchiveFormat::split_suffix(&file_name) {
            Some((stem, ext, _)) => (stem.to_string(), ext),
            None => {
                let stem = match file_name.rsplit_once('.') {
                    Some((stem, _)) if !stem.is_empty() => stem.to_string(),
                    _ => file_name.clone(),
                };
                (stem, DEFAULT_EXT)
            }
        };

        let bundle_name = match base_name {
            Some(name) => name,
            None if !stem.is_empty() => stem,
            None => {
                return Err(BundleError::invalid_origin(
                    url.as_str(),
                    "URL has no file name to derive a bundle name from",
                )
                .into())
            }
        };

        let download_path = cache.download_path(&bundle_name, ext);

        Ok(HttpSource {
            cache,
            url,
            bundle_name,
            download_path,
            expected_hash,
            offline,
        })
    }

    /// Download the archive unless a previous run already did.
    fn download(&self) -> Result<()> {
        if self.download_path.is_file() {
            tracing::debug!("Already downloaded {}", self.url);
            return Ok(());
        }

        if self.offline {
            return Err(BundleError::acquisition_failed(
                self.url.as_str(),
                "not downloaded yet and offline mode is enabled",
            )
            .into());
        }

        tracing::info!("Downloading {}", self.url);

        let response = download_client()
            .and_then(|client| client.get(self.url.clone()).send())
            .map_err(|e| BundleError::acquisition_failed(self.url.as_str(), e))?;

        if !response.status().is_success() {
            return Err(BundleError::acquisition_failed(
                self.url.as_str(),
                format!("HTTP {}", response.status()),
            )
            .into());
        }

        let bytes = response
            .bytes()
            .map_err(|e| BundleError::acquisition_failed(self.url.as_str(), e))?;

        let dir = self.cache.downloads_dir();
        ensure_dir(dir)?;

        // Written beside the target and renamed so an interrupted download
        // never looks complete.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(&bytes)
            .with_context(|| format!("failed to write download of {}", self.url))?;
        tmp.persist(&self.download_path).with_context(|| {
            format!("failed to store download at {}", self.download_path.display())
        })?;

        tracing::info!("Downloaded {} bytes to {}", bytes.len(), self.download_path.display());
        tracing::debug!("Download SHA256 = {}", sha256_bytes(&bytes));
        Ok(())
    }
}

/// A blocking client with no overall deadline.
fn download_client() -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder().timeout(None).build()
}

impl Source for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    fn is_cached(&self) -> bool {
        self.cache.is_populated(&self.bundle_name)
    }

    fn materialize(&mut self) -> Result<Materialized> {
        if self.is_cached() {
            tracing::debug!("Bundle `{}` already extracted", self.bundle_name);
            return Ok(Materialized {
                dir: self.cache.bundle_dir(&self.bundle_name),
                computed_hash: None,
            });
        }

        self.download()?;

        let mut local = PathSource::new(
            self.cache.clone(),
            self.download_path.clone(),
            Some(self.bundle_name.clone()),
            self.expected_hash.clone(),
        )?;
        local.materialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve_once, serve_stalled, test_context, write_zip};
    use std::time::Duration;
    use tempfile::TempDir;

    fn source(tmp: &TempDir, url: &str, offline: bool) -> HttpSource {
        let cache = BundleCache::new(&test_context(tmp.path()));
        HttpSource::new(cache, Url::parse(url).unwrap(), None, None, offline).unwrap()
    }

    fn proxy_configured() -> bool {
        ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]
            .iter()
            .any(|v| std::env::var_os(v).is_some())
    }

    #[test]
    fn test_names_from_url() {
        let tmp = TempDir::new().unwrap();

        let s = source(&tmp, "https://cdn.example/dl/korio-2.0.tar.gz", false);
        assert_eq!(s.bundle_name(), "korio-2.0");
        assert!(s.download_path.ends_with("korio-2.0.tar.gz"));

        let s = source(&tmp, "https://cdn.example/a.zip?token=1", false);
        assert_eq!(s.bundle_name(), "a");
        assert!(s.download_path.ends_with("a.zip"));

        let s = source(&tmp, "https://cdn.example/bundle", false);
        assert_eq!(s.bundle_name(), "bundle");
        assert!(s.download_path.ends_with("bundle.zip"));
    }

    #[test]
    fn test_url_without_file_name_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let cache = BundleCache::new(&test_context(tmp.path()));
        let result = HttpSource::new(
            cache,
            Url::parse("https://cdn.example/").unwrap(),
            None,
            None,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_offline_without_download_fails() {
        let tmp = TempDir::new().unwrap();
        let err = source(&tmp, "https://cdn.example/a.zip", true)
            .materialize()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BundleError>(),
            Some(BundleError::AcquisitionFailed { .. })
        ));
    }

    #[test]
    fn test_existing_download_is_reused_offline() {
        let tmp = TempDir::new().unwrap();
        let mut s = source(&tmp, "https://cdn.example/a.zip", true);
        std::fs::create_dir_all(s.download_path.parent().unwrap()).unwrap();
        write_zip(&s.download_path, &[("a.txt", "hi")]);

        let done = s.materialize().unwrap();
        assert!(done.dir.join("a.txt").is_file());
    }

    #[test]
    fn test_download_and_extract() {
        if proxy_configured() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("served.zip");
        write_zip(&archive, &[("src/commonMain/kotlin/A.kt", "class A")]);

        let url = serve_once(std::fs::read(&archive).unwrap(), 200, "lib.zip");
        let mut s = source(&tmp, &url, false);
        let done = s.materialize().unwrap();

        assert!(s.download_path.is_file());
        assert!(done.dir.join("src/commonMain/kotlin/A.kt").is_file());
        assert!(done.computed_hash.is_some());

        // The server is gone; a second pass must not touch the network.
        let again = source(&tmp, &url, false).materialize().unwrap();
        assert!(again.computed_hash.is_none());
    }

    #[test]
    #[ignore = "stalls the download for over half a minute"]
    fn test_slow_download_is_not_cut_off() {
        if proxy_configured() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("served.zip");
        write_zip(&archive, &[("src/commonMain/kotlin/A.kt", "class A")]);

        let url = serve_stalled(
            std::fs::read(&archive).unwrap(),
            Duration::from_secs(34),
            "lib.zip",
        );
        let done = source(&tmp, &url, false).materialize().unwrap();
        assert!(done.dir.join("src/commonMain/kotlin/A.kt").is_file());
    }

    #[test]
    fn test_http_error_status_fails() {
        if proxy_configured() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let url = serve_once(b"missing".to_vec(), 404, "lib.zip");

        let err = source(&tmp, &url, false).materialize().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BundleError>(),
            Some(BundleError::AcquisitionFailed { .. })
        ));
        assert!(!tmp.path().join("build/source-dependencies-all/lib.zip").exists());
    }
}
