use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use furnerp_core::TenantId;

/// Tenant-isolated key/value store for read models.
///
/// `query` filters inside the store, so callers receive only matching records
/// instead of a whole tenant collection.
pub trait TenantStore<K, V>: Send + Sync {
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V>;
    fn upsert(&self, tenant_id: TenantId, key: K, value: V);
    fn query(&self, tenant_id: TenantId, predicate: &dyn Fn(&V) -> bool) -> Vec<V>;
    fn count(&self, tenant_id: TenantId) -> usize;

    fn list(&self, tenant_id: TenantId) -> Vec<V> {
        self.query(tenant_id, &|_: &V| true)
    }
}

impl<K, V, S> TenantStore<K, V> for Arc<S>
where
    S: TenantStore<K, V> + ?Sized,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        (**self).get(tenant_id, key)
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) {
        (**self).upsert(tenant_id, key, value)
    }

    fn query(&self, tenant_id: TenantId, predicate: &dyn Fn(&V) -> bool) -> Vec<V> {
        (**self).query(tenant_id, predicate)
    }

    fn count(&self, tenant_id: TenantId) -> usize {
        (**self).count(tenant_id)
    }
}

/// Records are partitioned by tenant so a query never scans another tenant's data.
#[derive(Debug)]
pub struct InMemoryTenantStore<K, V> {
    tenants: RwLock<HashMap<TenantId, HashMap<K, V>>>,
}

impl<K, V> InMemoryTenantStore<K, V> {
    pub fn new() -> Self {
        Self {
            tenants: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryTenantStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TenantStore<K, V> for InMemoryTenantStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        let tenants = self.tenants.read().ok()?;
        tenants.get(&tenant_id)?.get(key).cloned()
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) {
        if let Ok(mut tenants) = self.tenants.write() {
            tenants.entry(tenant_id).or_default().insert(key, value);
        }
    }

    fn query(&self, tenant_id: TenantId, predicate: &dyn Fn(&V) -> bool) -> Vec<V> {
        let Ok(tenants) = self.tenants.read() else {
            return Vec::new();
        };
        tenants
            .get(&tenant_id)
            .map(|records| records.values().filter(|v| predicate(v)).cloned().collect())
            .unwrap_or_default()
    }

    fn count(&self, tenant_id: TenantId) -> usize {
        self.tenants
            .read()
            .ok()
            .and_then(|t| t.get(&tenant_id).map(HashMap::len))
            .unwrap_or(0)
    }
}
