use async_trait::async_trait;
use serde_json::Value;

use sb_domain::error::Result;

/// The store operations the assistant needs.
///
/// Bodies are passed through as raw JSON; the assistant never interprets
/// them beyond handing them to the agent.
#[async_trait]
pub trait ShopClient: Send + Sync {
    /// First page (up to 100) of products.
    async fn list_products(&self) -> Result<Value>;

    async fn get_product(&self, id: u64) -> Result<Value>;

    async fn list_categories(&self) -> Result<Value>;

    async fn list_orders(&self) -> Result<Value>;

    async fn get_order(&self, id: u64) -> Result<Value>;

    /// The API index document (store name, routes, ...).
    async fn store_info(&self) -> Result<Value>;

    async fn create_product(&self, data: Value) -> Result<Value>;

    async fn update_product(&self, id: u64, data: Value) -> Result<Value>;

    /// Permanently delete a product.  `Ok(true)` when the store confirmed.
    async fn delete_product(&self, id: u64) -> Result<bool>;
}
