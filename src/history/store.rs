use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// A stream the user played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: u64,
    pub url: String,
    pub referrer: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for recording a played stream
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewHistoryRecord {
    #[serde(default)]
    pub url: String,
    pub referrer: Option<String>,
    pub title: Option<String>,
}

impl NewHistoryRecord {
    /// Check the payload and normalize blank optional fields to `None`.
    ///
    /// `url` must be a non-empty absolute URL. A bare string such as a
    /// relative path is rejected, since it could never be replayed through
    /// the proxy.
    ///
    /// # Errors
    /// [`ProxyError::Validation`] naming the offending field.
    pub fn validated(self) -> Result<Self> {
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(ProxyError::Validation {
                field: "url",
                message: "url is required".to_string(),
            });
        }
        if Url::parse(&url).is_err() {
            return Err(ProxyError::Validation {
                field: "url",
                message: format!("Invalid url: {url}"),
            });
        }

        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Ok(Self {
            url,
            referrer: non_blank(self.referrer),
            title: non_blank(self.title),
        })
    }
}

/// Recently played streams. Independent of the proxy core.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Most recent first, at most the store's limit
    async fn list(&self) -> Vec<HistoryRecord>;

    async fn create(&self, entry: NewHistoryRecord) -> HistoryRecord;

    async fn clear(&self);
}

/// In-memory history keeping only the newest `limit` records
#[derive(Clone, Debug)]
pub struct MemoryHistoryStore {
    records: Arc<DashMap<u64, HistoryRecord>>,
    next_id: Arc<AtomicU64>,
    limit: usize,
}

impl MemoryHistoryStore {
    pub fn new(limit: usize) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            limit,
        }
    }

    fn newest_first(&self) -> Vec<HistoryRecord> {
        let mut records: Vec<HistoryRecord> =
            self.records.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn list(&self) -> Vec<HistoryRecord> {
        let mut records = self.newest_first();
        records.truncate(self.limit);
        records
    }

    async fn create(&self, entry: NewHistoryRecord) -> HistoryRecord {
        let record = HistoryRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            url: entry.url,
            referrer: entry.referrer,
            title: entry.title,
            created_at: Utc::now(),
        };
        self.records.insert(record.id, record.clone());

        // Evict anything past the limit
        for stale in self.newest_first().into_iter().skip(self.limit) {
            self.records.remove(&stale.id);
        }

        record
    }

    async fn clear(&self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> NewHistoryRecord {
        NewHistoryRecord {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let store = MemoryHistoryStore::new(10);
        let a = store.create(entry("https://a.example/x.m3u8")).await;
        let b = store.create(entry("https://b.example/x.m3u8")).await;
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryHistoryStore::new(10);
        store.create(entry("https://a.example/1.m3u8")).await;
        store.create(entry("https://a.example/2.m3u8")).await;
        store.create(entry("https://a.example/3.m3u8")).await;

        let urls: Vec<String> = store.list().await.into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://a.example/3.m3u8",
                "https://a.example/2.m3u8",
                "https://a.example/1.m3u8"
            ]
        );
    }

    #[tokio::test]
    async fn store_is_bounded_by_limit() {
        let store = MemoryHistoryStore::new(2);
        for i in 0..5 {
            store.create(entry(&format!("https://a.example/{i}.m3u8"))).await;
        }

        let records = store.list().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url, "https://a.example/4.m3u8");
        assert_eq!(store.records.len(), 2, "Old records should be evicted");
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let store = MemoryHistoryStore::new(10);
        store.create(entry("https://a.example/1.m3u8")).await;
        store.clear().await;
        assert!(store.list().await.is_empty());
    }

    #[test]
    fn validation_requires_url() {
        let err = entry("   ").validated().unwrap_err();
        assert!(matches!(err, ProxyError::Validation { field: "url", .. }));
    }

    #[test]
    fn validation_rejects_relative_url() {
        assert!(entry("live/index.m3u8").validated().is_err());
    }

    #[test]
    fn validation_normalizes_blank_optionals() {
        let record = NewHistoryRecord {
            url: " https://a.example/x.m3u8 ".to_string(),
            referrer: Some("".to_string()),
            title: Some("Match day".to_string()),
        }
        .validated()
        .unwrap();

        assert_eq!(record.url, "https://a.example/x.m3u8");
        assert_eq!(record.referrer, None);
        assert_eq!(record.title.as_deref(), Some("Match day"));
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = HistoryRecord {
            id: 1,
            url: "https://a.example/x.m3u8".to_string(),
            referrer: None,
            title: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
