//! Lance-backed result cache keyed by normalized query strings.
//!
//! Entries carry their own max age and expire lazily: an expired row is
//! evicted on the access that finds it. The cache is an optimization only;
//! callers treat every error as a miss.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

use anyhow::{anyhow, Result};
use arrow_array::{
    Int64Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray,
};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use recall_core::traits::ResultCache;

/// Cache keys are lowercased, whitespace-collapsed query strings.
pub fn normalize_key(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_cache_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("key", DataType::Utf8, false),
        Field::new("payload", DataType::Utf8, false),
        Field::new(
            "created_at",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
        Field::new("max_age_ms", DataType::Int64, false),
    ]))
}

fn escape(s: &str) -> String {
    s.replace('\'', "''")
}

pub struct LanceResultCache {
    conn: Connection,
    table: String,
}

impl LanceResultCache {
    pub async fn open(uri: &str) -> Result<Self> {
        let conn = connect(uri).execute().await?;
        let cache = Self {
            conn,
            table: "results".to_string(),
        };
        cache.ensure_table().await?;
        Ok(cache)
    }

    async fn ensure_table(&self) -> Result<()> {
        let names = self.conn.table_names().execute().await?;
        if names.contains(&self.table) {
            return Ok(());
        }
        let schema = build_cache_schema();
        let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
        self.conn
            .create_table(&self.table, Box::new(iter))
            .execute()
            .await?;
        Ok(())
    }

    /// Drop every entry; the corpus-change signal calls this.
    pub async fn invalidate_all(&self) -> Result<()> {
        let t = self.conn.open_table(&self.table).execute().await?;
        t.delete("key IS NOT NULL").await?;
        Ok(())
    }
}

#[async_trait]
impl ResultCache for LanceResultCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let t = self.conn.open_table(&self.table).execute().await?;
        let mut found: Option<(String, i64, i64)> = None;
        {
            let mut stream = t
                .query()
                .only_if(format!("key = '{}'", escape(key)))
                .execute()
                .await?;
            while let Some(batch) = stream.try_next().await? {
                if batch.num_rows() == 0 {
                    continue;
                }
                let payload = batch
                    .column_by_name("payload")
                    .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                    .ok_or_else(|| anyhow!("payload column missing"))?;
                let created = batch
                    .column_by_name("created_at")
                    .and_then(|c| c.as_any().downcast_ref::<TimestampMillisecondArray>())
                    .ok_or_else(|| anyhow!("created_at column missing"))?;
                let max_age = batch
                    .column_by_name("max_age_ms")
                    .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
                    .ok_or_else(|| anyhow!("max_age_ms column missing"))?;
                found = Some((
                    payload.value(0).to_string(),
                    created.value(0),
                    max_age.value(0),
                ));
                break;
            }
        }

        match found {
            Some((payload, created_at, max_age_ms)) => {
                let age_ms = Utc::now().timestamp_millis() - created_at;
                if age_ms > max_age_ms {
                    debug!(key, age_ms, "expired cache entry evicted");
                    t.delete(&format!("key = '{}'", escape(key))).await?;
                    return Ok(None);
                }
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let schema = build_cache_schema();
        let rb = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![key.to_string()])),
                Arc::new(StringArray::from(vec![value.to_string()])),
                Arc::new(TimestampMillisecondArray::from(vec![
                    Utc::now().timestamp_millis(),
                ])),
                Arc::new(Int64Array::from(vec![ttl.as_millis() as i64])),
            ],
        )?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema));
        let t = self.conn.open_table(&self.table).execute().await?;
        let mut mi = t.merge_insert(&["key"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        let t = self.conn.open_table(&self.table).execute().await?;
        t.delete(&format!("key = '{}'", escape(key))).await?;
        Ok(())
    }
}
