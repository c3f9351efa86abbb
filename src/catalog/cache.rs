use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};

use crate::catalog::error::CatalogError;
use crate::catalog::loader::Catalog;

pub const DEFAULT_URL: &str =
    "https://celestrak.org/NORAD/elements/gp.php?GROUP=amateur&FORMAT=tle";
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(2 * 60 * 60);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieves a remote TLE document.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, CatalogError>;
}

pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(FETCH_TIMEOUT)
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, CatalogError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| CatalogError::Fetch(e.to_string()))?;
        response
            .into_string()
            .map_err(|e| CatalogError::Fetch(e.to_string()))
    }
}

/// Local TLE file kept fresh from a remote catalog.
pub struct CatalogCache {
    path: PathBuf,
    url: String,
    max_age: Duration,
    fetcher: Box<dyn Fetch>,
}

impl CatalogCache {
    pub fn new(path: PathBuf, url: String, max_age: Duration) -> Self {
        Self::with_fetcher(path, url, max_age, Box::new(HttpFetcher::default()))
    }

    pub fn with_fetcher(
        path: PathBuf,
        url: String,
        max_age: Duration,
        fetcher: Box<dyn Fetch>,
    ) -> Self {
        Self {
            path,
            url,
            max_age,
            fetcher,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the local copy, if there is one.
    pub fn modified(&self) -> Option<DateTime<Local>> {
        fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Local>::from)
    }

    fn age(&self) -> Option<Duration> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        Some(
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO),
        )
    }

    /// Loads the local copy without touching the network.
    pub fn load_local(&self) -> Result<Catalog, CatalogError> {
        let catalog = Catalog::load(&self.path).map_err(|e| {
            CatalogError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;
        if catalog.is_empty() {
            return Err(CatalogError::Unavailable(format!(
                "no satellites in {}",
                self.path.display()
            )));
        }
        Ok(catalog)
    }

    /// Fetches the remote catalog when the local copy is missing or older
    /// than `max_age`, then loads the local copy.
    ///
    /// A failed refresh of a stale file keeps the stale data.
    pub fn refresh(&self) -> Result<Catalog, CatalogError> {
        match self.age() {
            None => {
                log::info!(
                    "No local TLE file at {}, fetching {}",
                    self.path.display(),
                    self.url
                );
                self.download()
                    .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
            }
            Some(age) if age > self.max_age => {
                log::info!(
                    "TLE file {} is {} old, refreshing",
                    self.path.display(),
                    humantime::format_duration(Duration::from_secs(age.as_secs()))
                );
                if let Err(e) = self.download() {
                    log::warn!("Failed to refresh TLE file, keeping stale copy: {}", e);
                }
            }
            Some(_) => {}
        }

        self.load_local()
    }

    /// Replaces the local copy with the remote catalog. A body without a
    /// single record leaves the local copy untouched.
    fn download(&self) -> Result<(), CatalogError> {
        let body = self.fetcher.fetch(&self.url)?;
        let fetched = Catalog::parse(&body);
        if fetched.is_empty() {
            return Err(CatalogError::Fetch(format!(
                "no satellites in response from {}",
                self.url
            )));
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut partial = self.path.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        fs::write(&partial, body)?;
        fs::rename(&partial, &self.path)?;
        log::info!(
            "Stored {} satellites in {}",
            fetched.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::fixtures::{ISS_LINE1, ISS_LINE2, ISS_NAME};
    use rstest::rstest;
    use std::fs::File;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeFetcher {
        body: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    impl Fetch for FakeFetcher {
        fn fetch(&self, _url: &str) -> Result<String, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body
                .clone()
                .ok_or_else(|| CatalogError::Fetch("offline".into()))
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "dplr-catalog-{}-{}",
            std::process::id(),
            name
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir.join("tle.txt")
    }

    fn tle(name: &str) -> String {
        format!("{}\n{}\n{}\n", name, ISS_LINE1, ISS_LINE2)
    }

    fn cache_with(path: PathBuf, body: Option<String>) -> (CatalogCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = FakeFetcher {
            body,
            calls: calls.clone(),
        };
        let cache = CatalogCache::with_fetcher(
            path,
            DEFAULT_URL.to_string(),
            DEFAULT_MAX_AGE,
            Box::new(fetcher),
        );
        (cache, calls)
    }

    fn age_file(path: &Path, age: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn missing_file_is_fetched_and_written_back() {
        let path = scratch("missing");
        let (cache, calls) = cache_with(path.clone(), Some(tle(ISS_NAME)));

        let catalog = cache.refresh().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(catalog.names(), vec![ISS_NAME]);
        assert_eq!(fs::read_to_string(&path).unwrap(), tle(ISS_NAME));
    }

    #[test]
    fn fresh_file_is_not_fetched() {
        let path = scratch("fresh");
        fs::write(&path, tle("AO-91")).unwrap();
        let (cache, calls) = cache_with(path, Some(tle(ISS_NAME)));

        let catalog = cache.refresh().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(catalog.names(), vec!["AO-91"]);
    }

    #[test]
    fn stale_file_is_replaced() {
        let path = scratch("stale");
        fs::write(&path, tle("AO-91")).unwrap();
        age_file(&path, Duration::from_secs(3 * 60 * 60));
        let (cache, calls) = cache_with(path, Some(tle(ISS_NAME)));

        let catalog = cache.refresh().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(catalog.names(), vec![ISS_NAME]);
    }

    #[test]
    fn stale_file_survives_failed_refresh() {
        let path = scratch("stale-offline");
        fs::write(&path, tle("AO-91")).unwrap();
        age_file(&path, Duration::from_secs(3 * 60 * 60));
        let (cache, calls) = cache_with(path, None);

        let catalog = cache.refresh().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(catalog.names(), vec!["AO-91"]);
    }

    #[rstest]
    #[case::empty("")]
    #[case::not_tle("<html><body>Service unavailable</body></html>\n")]
    fn stale_file_survives_a_body_without_records(#[case] body: &str) {
        let path = scratch(&format!("stale-bad-body-{}", body.len()));
        fs::write(&path, tle("AO-91")).unwrap();
        age_file(&path, Duration::from_secs(3 * 60 * 60));
        let (cache, calls) = cache_with(path.clone(), Some(body.to_string()));

        let catalog = cache.refresh().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(catalog.names(), vec!["AO-91"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), tle("AO-91"));
    }

    #[test]
    fn empty_body_without_local_copy_is_unavailable() {
        let path = scratch("missing-empty-body");
        let (cache, _) = cache_with(path.clone(), Some(String::new()));

        assert!(matches!(cache.refresh(), Err(CatalogError::Unavailable(_))));
        assert!(!path.exists());
        assert!(!path.with_extension("txt.part").exists());
    }

    #[test]
    fn unavailable_without_local_or_remote() {
        let path = scratch("nothing");
        let (cache, _) = cache_with(path, None);
        assert!(matches!(cache.refresh(), Err(CatalogError::Unavailable(_))));
        assert!(cache.modified().is_none());
    }
}
