//! Expiring cache in front of a [`ShopClient`].
//!
//! Reads are memoized by a signature built from the operation name and its
//! explicit arguments.  Product writes invalidate the product reads so the
//! next listing reflects the change.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use sb_cache::{CallCache, CallSignature};
use sb_domain::error::Result;

use crate::client::ShopClient;

pub const GET_PRODUCTS: &str = "get_products";
pub const GET_PRODUCT: &str = "get_product";
pub const GET_CATEGORIES: &str = "get_categories";
pub const GET_ORDERS: &str = "get_orders";
pub const GET_ORDER: &str = "get_order";
pub const GET_STORE_INFO: &str = "get_store_info";

pub struct CachedShop {
    inner: Arc<dyn ShopClient>,
    cache: Arc<CallCache>,
}

impl CachedShop {
    pub fn new(inner: Arc<dyn ShopClient>, cache: Arc<CallCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<CallCache> {
        &self.cache
    }

    async fn cached_read<'a, F, Fut>(&'a self, sig: CallSignature, fetch: F) -> Result<Value>
    where
        F: FnOnce(&'a dyn ShopClient) -> Fut,
        Fut: std::future::Future<Output = Result<Value>>,
    {
        let inner = self.inner.as_ref();
        self.cache
            .get_or_compute_async(&sig, None, || fetch(inner))
            .await
    }

    fn invalidate_products(&self) {
        let removed = self.cache.clear_for(GET_PRODUCTS) + self.cache.clear_for(GET_PRODUCT);
        tracing::debug!(removed, "invalidated cached product reads");
    }
}

#[async_trait]
impl ShopClient for CachedShop {
    async fn list_products(&self) -> Result<Value> {
        self.cached_read(CallSignature::new(GET_PRODUCTS), |c| c.list_products())
            .await
    }

    async fn get_product(&self, id: u64) -> Result<Value> {
        self.cached_read(CallSignature::new(GET_PRODUCT).arg(id), move |c| {
            c.get_product(id)
        })
        .await
    }

    async fn list_categories(&self) -> Result<Value> {
        self.cached_read(CallSignature::new(GET_CATEGORIES), |c| c.list_categories())
            .await
    }

    async fn list_orders(&self) -> Result<Value> {
        self.cached_read(CallSignature::new(GET_ORDERS), |c| c.list_orders())
            .await
    }

    async fn get_order(&self, id: u64) -> Result<Value> {
        self.cached_read(CallSignature::new(GET_ORDER).arg(id), move |c| c.get_order(id))
            .await
    }

    async fn store_info(&self) -> Result<Value> {
        self.cached_read(CallSignature::new(GET_STORE_INFO), |c| c.store_info())
            .await
    }

    async fn create_product(&self, data: Value) -> Result<Value> {
        let created = self.inner.create_product(data).await?;
        self.invalidate_products();
        Ok(created)
    }

    async fn update_product(&self, id: u64, data: Value) -> Result<Value> {
        let updated = self.inner.update_product(id, data).await?;
        self.invalidate_products();
        Ok(updated)
    }

    async fn delete_product(&self, id: u64) -> Result<bool> {
        let deleted = self.inner.delete_product(id).await?;
        self.invalidate_products();
        Ok(deleted)
    }
}
