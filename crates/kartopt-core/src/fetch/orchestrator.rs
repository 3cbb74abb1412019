//! Cache-then-network resource requests.
//!
//! Each request runs this state machine in its own task:
//!
//! 1. Look the resource up in memory, falling back to the disk mirror. A hit
//!    is emitted immediately. If it carries an expiry in the future, stop.
//! 2. Otherwise join (or start) the deduplicated network fetch, sending the
//!    hit's last-modified time as `If-Modified-Since`.
//! 3. On 200, decode and store the body, then emit the new value.
//! 4. On 304, extend the cached expiry. Nothing is emitted.
//! 5. On any failure, report it to the [`ErrorLog`]. Nothing is emitted.
//!
//! The fetch, the store and the error report run once per deduplicated
//! request inside the shared producer, so dropping a [`ResourceStream`] only
//! stops that consumer's wait. The cache is still updated.

use crate::cache::{CachedResource, ResourceCache, ResourceDecoder};
use crate::fetch::kind::ResourceKind;
use crate::network::{Fetcher, RequestDeduplicator};
use crate::report::ErrorLog;
use crate::{KartError, Result};
use chrono::{DateTime, Utc};
use futures::channel::mpsc;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

/// Decoded value type of a resource kind.
pub type Decoded<K> = <<K as ResourceKind>::Decoder as ResourceDecoder>::Output;

/// Result of one network round trip, shared by every joiner.
enum FetchOutcome<T> {
    Updated(Arc<T>),
    NotModified,
}

impl<T> Clone for FetchOutcome<T> {
    fn clone(&self) -> Self {
        match self {
            FetchOutcome::Updated(value) => FetchOutcome::Updated(Arc::clone(value)),
            FetchOutcome::NotModified => FetchOutcome::NotModified,
        }
    }
}

struct Inner<K: ResourceKind> {
    kind: K,
    origin: Url,
    cache: Arc<ResourceCache<K::Decoder>>,
    fetcher: Arc<dyn Fetcher>,
    dedup: RequestDeduplicator<String, FetchOutcome<Decoded<K>>, KartError>,
    /// Caps concurrent network fetches for kinds that ask for it.
    limiter: Option<Arc<Semaphore>>,
    errors: Arc<ErrorLog>,
}

/// Serves one kind of resource from cache and network.
pub struct FetchOrchestrator<K: ResourceKind> {
    inner: Arc<Inner<K>>,
}

impl<K: ResourceKind> Clone for FetchOrchestrator<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: ResourceKind> FetchOrchestrator<K> {
    pub fn new(
        kind: K,
        origin: Url,
        cache: Arc<ResourceCache<K::Decoder>>,
        fetcher: Arc<dyn Fetcher>,
        errors: Arc<ErrorLog>,
    ) -> Self {
        let limiter = kind.concurrency_limit().map(|n| Arc::new(Semaphore::new(n)));
        Self {
            inner: Arc::new(Inner {
                kind,
                origin,
                cache,
                fetcher,
                dedup: RequestDeduplicator::new(),
                limiter,
                errors,
            }),
        }
    }

    pub fn kind(&self) -> &K {
        &self.inner.kind
    }

    pub fn cache(&self) -> &Arc<ResourceCache<K::Decoder>> {
        &self.inner.cache
    }

    /// Whether a network fetch for `name` is in flight.
    pub fn in_flight(&self, name: &str) -> bool {
        self.inner.dedup.is_pending(&name.to_string())
    }

    /// Start loading `name`.
    ///
    /// The stream yields the cached value (if any) first, then the freshly
    /// downloaded value (if the server sent one), and then ends. Must be
    /// called from within a Tokio runtime.
    ///
    /// A request that joins a fetch already in flight shares that fetch's
    /// `If-Modified-Since`. If the first caller had a cached copy and the
    /// server answers 304, a joiner without one receives nothing.
    pub fn request(&self, name: impl Into<String>) -> ResourceStream<Decoded<K>> {
        let name = name.into();
        let (tx, rx) = mpsc::unbounded();
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run(name, tx).await });
        ResourceStream { rx, task }
    }

    /// Load `name` and return the most recent value the stream produced.
    pub async fn fetch_latest(&self, name: impl Into<String>) -> Option<Arc<Decoded<K>>> {
        self.request(name).fold(None, |_, value| async move { Some(value) }).await
    }
}

impl<K: ResourceKind> Inner<K> {
    /// Memory hit, or a disk copy loaded into memory.
    fn cached(&self, name: &str) -> Option<CachedResource<Decoded<K>>> {
        self.cache
            .lookup(name)
            .or_else(|| self.cache.load_from_disk(name))
    }

    async fn run(self: Arc<Self>, name: String, tx: mpsc::UnboundedSender<Arc<Decoded<K>>>) {
        let mut last_modified = None;

        if let Some(hit) = self.cached(&name) {
            if tx.unbounded_send(Arc::clone(&hit.value)).is_err() {
                return;
            }
            if hit.expires.is_some_and(|expires| expires > self.cache.now()) {
                debug!("{} {} is fresh, skipping network", self.kind.label(), name);
                return;
            }
            last_modified = Some(hit.last_modified);
        }

        let producer = {
            let inner = Arc::clone(&self);
            let name = name.clone();
            move || async move {
                let result = inner.fetch_and_store(&name, last_modified).await;
                if let Err(e) = &result {
                    inner.errors.report(e);
                }
                result
            }
        };

        match self.dedup.add_or_wait(name, producer).await {
            Ok(FetchOutcome::Updated(value)) => {
                // A closed receiver just means the consumer went away.
                let _ = tx.unbounded_send(value);
            }
            Ok(FetchOutcome::NotModified) | Err(_) => {}
        }
    }

    async fn acquire_slot(&self) -> Result<Option<OwnedSemaphorePermit>> {
        match &self.limiter {
            Some(limiter) => {
                let permit = Arc::clone(limiter)
                    .acquire_owned()
                    .await
                    .map_err(|e| KartError::TaskFailed(e.to_string()))?;
                Ok(Some(permit))
            }
            None => Ok(None),
        }
    }

    async fn fetch_and_store(
        &self,
        name: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<FetchOutcome<Decoded<K>>> {
        let _permit = self.acquire_slot().await?;
        let url = self.kind.url_for(&self.origin, name)?;
        let response = self.fetcher.get(&url, self.kind.accept(), since).await?;
        let expires = response.expires();

        if response.is_not_modified() {
            debug!("{} {} not modified", self.kind.label(), name);
            if let Some(expires) = expires {
                self.cache.update_expiry(name, expires);
            }
            return Ok(FetchOutcome::NotModified);
        }

        let size = response.body.len();
        let value = self
            .cache
            .store_async(name, response.body, self.cache.now(), expires, true)
            .await?;
        info!("Downloaded {} {} ({} bytes)", self.kind.label(), name, size);
        Ok(FetchOutcome::Updated(value))
    }
}

/// Values produced by one [`FetchOrchestrator::request`].
///
/// Dropping the stream cancels this consumer only.
pub struct ResourceStream<T> {
    rx: mpsc::UnboundedReceiver<Arc<T>>,
    task: JoinHandle<()>,
}

impl<T> Stream for ResourceStream<T> {
    type Item = Arc<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_next_unpin(cx)
    }
}

impl<T> Drop for ResourceStream<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::png_bytes;
    use crate::cache::{DiskMirror, ImageDecoder, ManualClock};
    use crate::fetch::kind::ImageKind;
    use crate::network::{HttpClient, HttpResponse};
    use crate::options::{Options, OptionsManager};
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::{Duration, TimeZone};
    use reqwest::header::HeaderMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options() -> Arc<OptionsManager> {
        Arc::new(OptionsManager::in_memory(Options {
            use_disk_cache: false,
            ..Options::default()
        }))
    }

    fn image_cache() -> Arc<ResourceCache<ImageDecoder>> {
        Arc::new(ResourceCache::new(ImageDecoder, options()))
    }

    fn orchestrator(
        server: &MockServer,
        cache: Arc<ResourceCache<ImageDecoder>>,
    ) -> (FetchOrchestrator<ImageKind>, Arc<ErrorLog>) {
        let errors = Arc::new(ErrorLog::new());
        let origin = Url::parse(&format!("{}/", server.uri())).unwrap();
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::new().unwrap());
        (
            FetchOrchestrator::new(ImageKind, origin, cache, fetcher, Arc::clone(&errors)),
            errors,
        )
    }

    async fn collect(stream: ResourceStream<image::RgbaImage>) -> Vec<Arc<image::RgbaImage>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_miss_downloads_and_emits_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/Mario.webp"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(3, 2)))
            .expect(1)
            .mount(&server)
            .await;

        let cache = image_cache();
        let (images, errors) = orchestrator(&server, Arc::clone(&cache));

        let values = collect(images.request("Mario.webp")).await;
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].dimensions(), (3, 2));
        assert!(cache.contains("Mario.webp"));
        assert!(errors.is_empty());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].headers.get("accept").unwrap().to_str().unwrap(),
            "image/png, image/webp, image/jpeg;q=0.75"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_share_one_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/Peach.webp"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(png_bytes(2, 2))
                    .set_delay(std::time::Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (images, _errors) = orchestrator(&server, image_cache());

        let streams: Vec<_> = (0..5).map(|_| collect(images.request("Peach.webp"))).collect();
        let results = futures::future::join_all(streams).await;

        for values in &results {
            assert_eq!(values.len(), 1);
            assert!(Arc::ptr_eq(&values[0], &results[0][0]));
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let cache = image_cache();
        let expires = Utc::now() + Duration::hours(1);
        cache
            .store("Toad.webp", &png_bytes(1, 1), Utc::now(), Some(expires), false)
            .unwrap();
        let (images, _errors) = orchestrator(&server, Arc::clone(&cache));

        assert_eq!(collect(images.request("Toad.webp")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_cache_emits_cached_then_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/Daisy.webp"))
            .and(header_exists("if-modified-since"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(4, 4)))
            .expect(1)
            .mount(&server)
            .await;

        let cache = image_cache();
        cache
            .store("Daisy.webp", &png_bytes(1, 1), Utc::now() - Duration::days(1), None, false)
            .unwrap();
        let (images, _errors) = orchestrator(&server, Arc::clone(&cache));

        let values = collect(images.request("Daisy.webp")).await;
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].dimensions(), (1, 1));
        assert_eq!(values[1].dimensions(), (4, 4));
    }

    #[tokio::test]
    async fn test_not_modified_extends_expiry_without_emitting() {
        let server = MockServer::start().await;
        let expires = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();
        Mock::given(method("GET"))
            .and(path("/img/Wario.webp"))
            .respond_with(
                ResponseTemplate::new(304).insert_header("expires", "Thu, 01 Jan 2099 00:00:00 GMT"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cache = image_cache();
        cache
            .store("Wario.webp", &png_bytes(1, 1), Utc::now() - Duration::days(1), None, false)
            .unwrap();
        let (images, errors) = orchestrator(&server, Arc::clone(&cache));

        let values = collect(images.request("Wario.webp")).await;
        assert_eq!(values.len(), 1);
        assert_eq!(cache.lookup("Wario.webp").unwrap().expires, Some(expires));
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_reported_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let (images, errors) = orchestrator(&server, image_cache());

        assert!(collect(images.request("Yoshi.webp")).await.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors.snapshot()[0].contains("500"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_reported_and_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not an image"))
            .mount(&server)
            .await;

        let cache = image_cache();
        let (images, errors) = orchestrator(&server, Arc::clone(&cache));

        assert!(collect(images.request("Koopa.webp")).await.is_empty());
        assert!(cache.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn test_disk_copy_is_emitted_and_revalidated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("if-modified-since"))
            .respond_with(ResponseTemplate::new(304))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let mirror = DiskMirror::new(temp_dir.path());
        mirror.write("Rosalina.webp", &png_bytes(2, 3)).unwrap();

        let cache = Arc::new(ResourceCache::new(ImageDecoder, options()).with_disk(mirror));
        let (images, _errors) = orchestrator(&server, Arc::clone(&cache));

        let values = collect(images.request("Rosalina.webp")).await;
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].dimensions(), (2, 3));
        assert!(cache.contains("Rosalina.webp"));
    }

    #[tokio::test]
    async fn test_download_is_mirrored_by_the_time_the_stream_ends() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/Toadette.webp"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(2, 2)))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let options = Arc::new(OptionsManager::in_memory(Options::default()));
        let cache = Arc::new(
            ResourceCache::new(ImageDecoder, options).with_disk(DiskMirror::new(temp_dir.path())),
        );
        let (images, _errors) = orchestrator(&server, Arc::clone(&cache));

        assert_eq!(collect(images.request("Toadette.webp")).await.len(), 1);
        assert_eq!(
            std::fs::read(temp_dir.path().join("Toadette.webp")).unwrap(),
            png_bytes(2, 2)
        );
    }

    #[tokio::test]
    async fn test_joiner_shares_first_callers_revalidation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/Birdo.webp"))
            .respond_with(ResponseTemplate::new(304).set_delay(std::time::Duration::from_millis(100)))
            .expect(1)
            .mount(&server)
            .await;

        let cache = image_cache();
        cache
            .store("Birdo.webp", &png_bytes(1, 1), Utc::now() - Duration::days(1), None, false)
            .unwrap();
        let (images, _errors) = orchestrator(&server, Arc::clone(&cache));

        let first = images.request("Birdo.webp");
        while !images.in_flight("Birdo.webp") {
            tokio::task::yield_now().await;
        }
        // The joiner finds nothing cached but rides the conditional request.
        cache.clear();
        let joiner = images.request("Birdo.webp");

        let (first, joiner) = futures::future::join(collect(first), collect(joiner)).await;
        assert_eq!(first.len(), 1);
        assert!(joiner.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_consumer_still_populates_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(png_bytes(2, 2))
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cache = image_cache();
        let (images, _errors) = orchestrator(&server, Arc::clone(&cache));

        let stream = images.request("Lakitu.webp");
        while !images.in_flight("Lakitu.webp") {
            tokio::task::yield_now().await;
        }
        drop(stream);

        while images.in_flight("Lakitu.webp") {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(cache.contains("Lakitu.webp"));
    }

    /// Serves a 1x1 PNG after a short delay and records peak concurrency.
    #[derive(Default)]
    struct CountingFetcher {
        active: AtomicUsize,
        peak: AtomicUsize,
        total: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn get(&self, _url: &Url, _accept: &str, _since: Option<DateTime<Utc>>) -> Result<HttpResponse> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.total.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(HttpResponse {
                status: 200,
                headers: HeaderMap::new(),
                body: Bytes::from(png_bytes(1, 1)),
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_image_fetches_are_capped() {
        let fetcher = Arc::new(CountingFetcher::default());
        let images = FetchOrchestrator::new(
            ImageKind,
            Url::parse("http://localhost/").unwrap(),
            image_cache(),
            Arc::clone(&fetcher) as Arc<dyn Fetcher>,
            Arc::new(ErrorLog::new()),
        );

        let streams: Vec<_> = (0..20)
            .map(|i| collect(images.request(format!("Part{}.webp", i))))
            .collect();
        futures::future::join_all(streams).await;

        assert_eq!(fetcher.total.load(Ordering::SeqCst), 20);
        assert!(fetcher.peak.load(Ordering::SeqCst) <= 6);
    }

    #[tokio::test]
    async fn test_expiry_uses_cache_clock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(304))
            .expect(1)
            .mount(&server)
            .await;

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let cache = Arc::new(ResourceCache::new(ImageDecoder, options()).with_clock(clock.clone()));
        cache
            .store("Link.webp", &png_bytes(1, 1), start, Some(start + Duration::minutes(5)), false)
            .unwrap();
        let (images, _errors) = orchestrator(&server, Arc::clone(&cache));

        // Fresh: no request.
        assert_eq!(collect(images.request("Link.webp")).await.len(), 1);

        // Expired: evicted on lookup, so nothing cached to emit and no
        // If-Modified-Since is known. The 304 yields nothing.
        clock.advance(Duration::minutes(10));
        assert!(collect(images.request("Link.webp")).await.is_empty());
    }
}
