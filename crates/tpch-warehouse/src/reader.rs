//! Memoized report reads for presentation layers.
//!
//! A failed load never aborts other tables: it degrades to an empty result
//! with the error message attached, and is not memoized.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{find_report_table, REPORT_TABLES};
use crate::{QueryGuardrails, QueryResult, Warehouse};

/// Default lifetime of a memoized report.
pub const DEFAULT_REPORT_TTL: Duration = Duration::from_secs(3600);

/// Default per-table read timeout. Report tables are read whole, so this is
/// well above the ad-hoc query default.
pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(120);

/// Outcome of loading one report table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLoad {
    pub table: String,
    pub result: QueryResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cache_hit: bool,
}

impl ReportLoad {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: QueryResult,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

/// TTL-memoized reader over the report catalog.
pub struct ReportReader {
    warehouse: Warehouse,
    ttl: Duration,
    guardrails: QueryGuardrails,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl ReportReader {
    pub fn new(warehouse: Warehouse, ttl: Duration) -> Self {
        Self {
            warehouse,
            ttl,
            guardrails: QueryGuardrails {
                max_rows: usize::MAX,
                query_timeout_ms: duration_millis(DEFAULT_REPORT_TIMEOUT),
            },
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Cap the number of rows returned per table.
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.guardrails.max_rows = max_rows.max(1);
        self
    }

    /// Bound the time spent reading one table. Zero is raised to one millisecond.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.guardrails.query_timeout_ms = duration_millis(timeout).max(1);
        self
    }

    /// Load one report table, serving from the memo while it is fresh.
    pub fn load(&self, table: &str) -> ReportLoad {
        let key = table.trim().to_ascii_lowercase();

        if let Some(result) = self.cached(&key) {
            debug!(table = %key, "report served from cache");
            return ReportLoad {
                table: key,
                result,
                error: None,
                cache_hit: true,
            };
        }

        let Some(spec) = find_report_table(&key) else {
            return degraded(key, format!("unknown report table '{table}'"));
        };

        match self.warehouse.read_report(spec, self.guardrails) {
            Ok(result) => {
                self.store(key.clone(), result.clone());
                ReportLoad {
                    table: key,
                    result,
                    error: None,
                    cache_hit: false,
                }
            }
            Err(error) => degraded(key, error.to_string()),
        }
    }

    /// Load every catalog table in pipeline order.
    pub fn load_all(&self) -> Vec<ReportLoad> {
        REPORT_TABLES.iter().map(|spec| self.load(spec.name)).collect()
    }

    /// Drop every memoized result.
    pub fn clear(&self) {
        self.cache().clear();
    }

    /// Number of memoized entries, including expired ones not yet evicted.
    pub fn cached_len(&self) -> usize {
        self.cache().len()
    }

    fn cached(&self, key: &str) -> Option<QueryResult> {
        let mut cache = self.cache();
        let now = Instant::now();
        match cache.get(key) {
            Some(entry) if entry.expires_at.map_or(true, |at| now <= at) => {
                Some(entry.result.clone())
            }
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }

    fn store(&self, key: String, result: QueryResult) {
        if self.ttl == Duration::ZERO {
            return;
        }
        let expires_at = Instant::now().checked_add(self.ttl);
        self.cache().insert(key, CacheEntry { result, expires_at });
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn degraded(table: String, message: String) -> ReportLoad {
    warn!(table = %table, error = %message, "report load failed");
    ReportLoad {
        table,
        result: QueryResult::empty(),
        error: Some(message),
        cache_hit: false,
    }
}
