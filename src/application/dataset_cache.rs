// Time-boxed cache of the normalized dataset
use crate::application::dataset_source::{DatasetError, DatasetSource};
use crate::application::normalizer::normalize;
use crate::domain::dataset::Dataset;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct CachedDataset {
    dataset: Arc<Dataset>,
    fetched_at: Instant,
    /// Start of the latest fetch attempt, successful or not
    attempted_at: Instant,
}

#[derive(Default)]
struct CacheState {
    cached: Option<CachedDataset>,
    loads: u64,
}

/// Loads the dataset on first use and again once the last attempt is older
/// than `ttl`.
///
/// The source is fetched at most once per TTL window. The first load holds the
/// lock, so concurrent callers wait for it. A refresh runs outside the lock:
/// the caller that claims it waits for the new copy while everyone else keeps
/// getting the current one. A failed refresh keeps serving the stale copy until
/// the next window.
pub struct DatasetCache {
    source: Arc<dyn DatasetSource>,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl DatasetCache {
    pub fn new(source: Arc<dyn DatasetSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub async fn get(&self) -> Result<Arc<Dataset>, DatasetError> {
        let mut state = self.state.lock().await;

        let claimed = match state.cached.as_mut() {
            Some(cached) if cached.attempted_at.elapsed() < self.ttl => {
                return Ok(cached.dataset.clone());
            }
            Some(cached) => {
                // Claim this window's refresh before releasing the lock
                cached.attempted_at = Instant::now();
                Some((cached.dataset.clone(), cached.fetched_at.elapsed()))
            }
            None => None,
        };

        let Some((stale, age)) = claimed else {
            return match self.load().await {
                Ok(dataset) => Ok(Self::store(&mut state, dataset)),
                Err(e) => {
                    tracing::error!(location = self.source.location(), error = %e, "dataset load failed");
                    Err(e)
                }
            };
        };
        drop(state);
        tracing::debug!(location = self.source.location(), age_secs = age.as_secs(), "cached dataset expired");

        match self.load().await {
            Ok(dataset) => Ok(Self::store(&mut *self.state.lock().await, dataset)),
            Err(e) => {
                tracing::error!(
                    location = self.source.location(),
                    error = %e,
                    retry_in_secs = self.ttl.as_secs(),
                    "refresh failed, serving stale dataset"
                );
                Ok(stale)
            }
        }
    }

    fn store(state: &mut CacheState, mut dataset: Dataset) -> Arc<Dataset> {
        state.loads += 1;
        dataset.version = state.loads;
        tracing::info!(version = dataset.version, "dataset cached");

        let dataset = Arc::new(dataset);
        let now = Instant::now();
        state.cached = Some(CachedDataset {
            dataset: dataset.clone(),
            fetched_at: now,
            attempted_at: now,
        });
        dataset
    }

    async fn load(&self) -> Result<Dataset, DatasetError> {
        let raw = self.source.fetch().await?;
        let total_rows = raw.rows.len() + raw.unreadable.len();
        let outcome = normalize(raw.rows);

        let mut malformed = raw.unreadable;
        malformed.extend(outcome.malformed);
        malformed.sort_by_key(|m| m.row);

        let dataset = Dataset {
            version: 0,
            total_rows,
            records: outcome.records,
            malformed,
        };

        tracing::info!(
            location = self.source.location(),
            total_rows,
            records = dataset.records.len(),
            stations = dataset.stations().len(),
            "dataset loaded"
        );
        if dataset.dropped_rows() > 0 {
            tracing::warn!(
                dropped = dataset.dropped_rows(),
                fraction = dataset.dropped_fraction(),
                "dropped malformed rows"
            );
        }

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dataset_source::RawDataset;
    use crate::domain::record::RawRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        fetches: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl CountingSource {
        fn new(fail_after: Option<usize>) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                fail_after,
            }
        }
    }

    #[async_trait]
    impl DatasetSource for CountingSource {
        fn location(&self) -> &str {
            "memory"
        }

        async fn fetch(&self) -> Result<RawDataset, DatasetError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(DatasetError::Unavailable {
                    location: "memory".to_string(),
                    reason: "gone".to_string(),
                });
            }
            Ok(RawDataset {
                rows: vec![
                    RawRecord::new(1, "Changping").with_date_parts(2013, 3, 1, 0),
                    RawRecord::new(2, "Changping"),
                ],
                unreadable: Vec::new(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_once_within_ttl() {
        let source = Arc::new(CountingSource::new(None));
        let cache = DatasetCache::new(source.clone(), Duration::from_secs(600));

        let first = cache.get().await.unwrap();
        tokio::time::advance(Duration::from_secs(599)).await;
        let second = cache.get().await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.version, 1);
        assert_eq!(first.total_rows, 2);
        assert_eq!(first.records.len(), 1);
        assert_eq!(first.dropped_rows(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetches_after_ttl() {
        let source = Arc::new(CountingSource::new(None));
        let cache = DatasetCache::new(source.clone(), Duration::from_secs(600));

        cache.get().await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        let refreshed = cache.get().await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed.version, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_serves_stale_copy_when_refresh_fails() {
        let source = Arc::new(CountingSource::new(Some(1)));
        let cache = DatasetCache::new(source.clone(), Duration::from_secs(10));

        let first = cache.get().await.unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;
        let stale = cache.get().await.unwrap();

        assert!(Arc::ptr_eq(&first, &stale));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_load_failure_is_an_error() {
        let cache = DatasetCache::new(Arc::new(CountingSource::new(Some(0))), Duration::from_secs(10));
        assert!(matches!(cache.get().await, Err(DatasetError::Unavailable { .. })));
    }

    /// Succeeds once, then every fetch hangs for `delay` and fails
    struct FlakySource {
        fetches: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl DatasetSource for FlakySource {
        fn location(&self) -> &str {
            "flaky"
        }

        async fn fetch(&self) -> Result<RawDataset, DatasetError> {
            if self.fetches.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok(RawDataset {
                    rows: vec![RawRecord::new(1, "Wanshouxigong").with_date_parts(2014, 1, 1, 0)],
                    unreadable: Vec::new(),
                });
            }
            tokio::time::sleep(self.delay).await;
            Err(DatasetError::Unavailable {
                location: "flaky".to_string(),
                reason: "timed out".to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_outage_fetches_once_per_window() {
        let source = Arc::new(FlakySource {
            fetches: AtomicUsize::new(0),
            delay: Duration::from_secs(30),
        });
        let cache = DatasetCache::new(source.clone(), Duration::from_secs(600));
        let first = cache.get().await.unwrap();

        tokio::time::advance(Duration::from_secs(601)).await;
        let started = Instant::now();
        let (a, b, c, d, e) = tokio::join!(cache.get(), cache.get(), cache.get(), cache.get(), cache.get());
        let elapsed = started.elapsed();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        for served in [a, b, c, d, e] {
            assert!(Arc::ptr_eq(&first, &served.unwrap()));
        }
        // Only the caller that claimed the refresh waits for the failing fetch
        assert!(elapsed <= Duration::from_secs(31), "took {elapsed:?}");

        // Still inside the retry window
        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(Arc::ptr_eq(&first, &cache.get().await.unwrap()));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);

        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(Arc::ptr_eq(&first, &cache.get().await.unwrap()));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_callers_not_blocked_by_refresh() {
        let source = Arc::new(FlakySource {
            fetches: AtomicUsize::new(0),
            delay: Duration::from_secs(30),
        });
        let cache = Arc::new(DatasetCache::new(source.clone(), Duration::from_secs(600)));
        let first = cache.get().await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;

        let refresher = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get().await }
        });
        tokio::task::yield_now().await;

        let started = Instant::now();
        let served = cache.get().await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(Arc::ptr_eq(&first, &served));

        assert!(Arc::ptr_eq(&first, &refresher.await.unwrap().unwrap()));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }
}
