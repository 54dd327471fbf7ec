use std::sync::Arc;
use std::time::Duration;

use rolegate_core::{DepartmentId, EmployeeId};
use rolegate_domain::Verdict;
use tracing::warn;

use crate::rbac_ports::KeyValueCache;

use super::metrics::CacheMetrics;

/// Default verdict time-to-live.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache layer over resolved verdicts. Every failure of the backend is
/// absorbed here: a failed read is a miss, a failed write or invalidation
/// is logged and counted, and resolution continues against the store.
pub struct DecisionCache {
    backend: Option<Arc<dyn KeyValueCache>>,
    namespace: String,
    ttl: Duration,
    metrics: Arc<CacheMetrics>,
}

impl DecisionCache {
    /// Builds a cache over the given backend with the default 24-hour
    /// time-to-live.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueCache>, namespace: impl Into<String>) -> Self {
        Self {
            backend: Some(backend),
            namespace: namespace.into(),
            ttl: DEFAULT_TTL,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// Builds a disabled cache. Every lookup misses and every write and
    /// invalidation is a no-op.
    #[must_use]
    pub fn disabled(namespace: impl Into<String>) -> Self {
        Self {
            backend: None,
            namespace: namespace.into(),
            ttl: DEFAULT_TTL,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// Overrides the verdict time-to-live.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Shares the cache counters.
    #[must_use]
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Renders the cache key for one check. Scope segments are appended
    /// only when present.
    #[must_use]
    pub fn key_for(
        &self,
        employee_id: EmployeeId,
        permission_name: &str,
        department_scope: Option<DepartmentId>,
        target_scope: Option<EmployeeId>,
    ) -> String {
        let mut key = format!("{}:perm:{}:{}", self.namespace, employee_id, permission_name);
        if let Some(department_id) = department_scope {
            key.push(':');
            key.push_str(&department_id.to_string());
        }
        if let Some(target_id) = target_scope {
            key.push(':');
            key.push_str(&target_id.to_string());
        }
        key
    }

    fn employee_prefix(&self, employee_id: EmployeeId) -> String {
        format!("{}:perm:{}:", self.namespace, employee_id)
    }

    fn namespace_prefix(&self) -> String {
        format!("{}:perm:", self.namespace)
    }

    /// Looks up a cached verdict. Backend failures and unparseable values
    /// count as misses.
    pub async fn get_verdict(&self, key: &str) -> Option<Verdict> {
        let backend = self.backend.as_ref()?;
        match backend.get(key).await {
            Ok(Some(raw)) => match raw.parse::<Verdict>() {
                Ok(verdict) => {
                    self.metrics.record_hit();
                    Some(verdict)
                }
                Err(_) => {
                    warn!(key, value = raw.as_str(), "discarding unparseable cached verdict");
                    self.metrics.record_miss();
                    None
                }
            },
            Ok(None) => {
                self.metrics.record_miss();
                None
            }
            Err(error) => {
                warn!(key, error = %error, "cache read failed, falling back to store");
                self.metrics.record_error();
                None
            }
        }
    }

    /// Stores a verdict under the given key. Failures are absorbed.
    pub async fn store_verdict(&self, key: &str, verdict: Verdict) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        match backend.set(key, verdict.as_str(), self.ttl).await {
            Ok(()) => self.metrics.record_store(),
            Err(error) => {
                warn!(key, error = %error, "cache write failed");
                self.metrics.record_error();
            }
        }
    }

    /// Drops every cached verdict for one employee. Failures are absorbed.
    pub async fn invalidate_employee(&self, employee_id: EmployeeId) {
        self.invalidate_prefix(&self.employee_prefix(employee_id)).await;
    }

    /// Drops every cached verdict in the namespace. Failures are absorbed.
    pub async fn invalidate_all(&self) {
        self.invalidate_prefix(&self.namespace_prefix()).await;
    }

    async fn invalidate_prefix(&self, prefix: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        self.metrics.record_invalidation();
        let keys = match backend.list_keys_by_prefix(prefix).await {
            Ok(keys) => keys,
            Err(error) => {
                warn!(prefix, error = %error, "cache invalidation listing failed");
                self.metrics.record_error();
                return;
            }
        };
        for key in keys {
            if let Err(error) = backend.delete(&key).await {
                warn!(key = key.as_str(), error = %error, "cache key deletion failed");
                self.metrics.record_error();
            }
        }
    }
}
