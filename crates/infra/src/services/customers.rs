use async_trait::async_trait;

use furnerp_core::TenantId;
use furnerp_pos::{CustomerDirectory, ServiceError};

use crate::read_model::{InMemoryTenantStore, TenantStore};

/// Customer names keyed case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryCustomerDirectory {
    names: InMemoryTenantStore<String, String>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&self, tenant_id: TenantId, name: &str) -> Result<(), ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Rejected("customer name cannot be empty".to_string()));
        }
        self.names.upsert(tenant_id, name.to_lowercase(), name.to_string());
        Ok(())
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn list_customer_names(&self, tenant_id: TenantId) -> Result<Vec<String>, ServiceError> {
        let mut names = self.names.list(tenant_id);
        names.sort_by_key(|n| n.to_lowercase());
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn names_are_sorted_and_deduplicated() {
        let directory = InMemoryCustomerDirectory::new();
        let tenant = TenantId::new();
        directory.add_customer(tenant, "budi santoso").unwrap();
        directory.add_customer(tenant, "Ayu Lestari").unwrap();
        directory.add_customer(tenant, "  Budi Santoso ").unwrap();

        let names = directory.list_customer_names(tenant).await.unwrap();
        assert_eq!(names, vec!["Ayu Lestari", "Budi Santoso"]);
        assert!(directory.list_customer_names(TenantId::new()).await.unwrap().is_empty());
    }

    #[test]
    fn blank_names_are_rejected() {
        let directory = InMemoryCustomerDirectory::new();
        assert!(matches!(
            directory.add_customer(TenantId::new(), "   "),
            Err(ServiceError::Rejected(_))
        ));
    }
}
