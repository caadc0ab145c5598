use crate::domain::model::ContentBundle;
use crate::domain::model::BUNDLE_KEY;
use crate::domain::ports::{BundleSink, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(800);

/// Coalesces bursts of edits into one save.
///
/// Each `schedule` replaces the pending save; `save_now` cancels it and writes
/// immediately, so a manual save never races a timer that fires afterwards
/// with the same or older state.
pub struct DebouncedSaver {
    sink: Arc<dyn BundleSink>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedSaver {
    pub fn new(sink: Arc<dyn BundleSink>, delay: Duration) -> Self {
        Self {
            sink,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, bundle: ContentBundle) {
        let sink = Arc::clone(&self.sink);
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match sink.save(&bundle).await {
                Ok(()) => tracing::debug!("💾 Debounced save completed"),
                Err(e) => tracing::error!("❌ Debounced save failed: {}", e),
            }
        });

        if let Some(previous) = self.replace_pending(Some(handle)) {
            previous.abort();
        }
    }

    pub async fn save_now(&self, bundle: &ContentBundle) -> Result<()> {
        self.cancel();
        self.sink.save(bundle).await
    }

    /// Returns whether a pending save was dropped.
    pub fn cancel(&self) -> bool {
        match self.replace_pending(None) {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|p| p.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    fn replace_pending(&self, next: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        match self.pending.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        }
    }
}

impl Drop for DebouncedSaver {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Writes bundles straight into a store, bypassing the HTTP auth gate.
pub struct StoreSink<S: Storage> {
    store: S,
    key: String,
}

impl<S: Storage> StoreSink<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, BUNDLE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

#[async_trait]
impl<S: Storage> BundleSink for StoreSink<S> {
    async fn save(&self, bundle: &ContentBundle) -> Result<()> {
        let raw = bundle.to_pretty_json()?;
        self.store.write(&self.key, raw.as_bytes()).await?;
        tracing::info!("💾 Saved bundle to {}", self.key);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::local::FileStore;
    use crate::domain::Locale;
    use tempfile::TempDir;

    /// Records every bundle it receives.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub saved: Mutex<Vec<ContentBundle>>,
    }

    #[async_trait]
    impl BundleSink for RecordingSink {
        async fn save(&self, bundle: &ContentBundle) -> Result<()> {
            self.saved.lock().unwrap().push(bundle.clone());
            Ok(())
        }
    }

    fn branded(brand: &str) -> ContentBundle {
        let mut bundle = ContentBundle::empty();
        bundle.content.get_mut(&Locale::En).unwrap().site.brand = brand.to_string();
        bundle
    }

    #[tokio::test]
    async fn test_burst_of_schedules_saves_once_with_latest() {
        let sink = Arc::new(RecordingSink::default());
        let saver = DebouncedSaver::new(sink.clone(), Duration::from_millis(40));

        saver.schedule(branded("one"));
        saver.schedule(branded("two"));
        saver.schedule(branded("three"));
        assert!(saver.has_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;

        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].content[&Locale::En].site.brand, "three");
    }

    #[tokio::test]
    async fn test_save_now_cancels_pending_timer() {
        let sink = Arc::new(RecordingSink::default());
        let saver = DebouncedSaver::new(sink.clone(), Duration::from_millis(40));

        saver.schedule(branded("stale"));
        saver.save_now(&branded("manual")).await.unwrap();
        assert!(!saver.has_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;

        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].content[&Locale::En].site.brand, "manual");
    }

    #[tokio::test]
    async fn test_store_sink_writes_pretty_json() {
        let dir = TempDir::new().unwrap();
        let sink = StoreSink::new(FileStore::new(dir.path()));

        sink.save(&branded("stored")).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join(BUNDLE_KEY)).unwrap();
        assert!(raw.starts_with("{\n  \"defaultLocale\": \"en\""));
        let back = ContentBundle::from_json(raw.as_bytes()).unwrap();
        assert_eq!(back.content[&Locale::En].site.brand, "stored");
    }
}
