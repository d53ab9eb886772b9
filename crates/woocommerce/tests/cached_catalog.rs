//! Cached reads, write invalidation and tool dispatch against a fake store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use sb_cache::CallCache;
use sb_domain::clock::ManualClock;
use sb_domain::error::{Error, Result};
use sb_woocommerce::{CachedShop, ShopClient, ToolRegistry};

#[derive(Default)]
struct FakeShop {
    calls: Mutex<HashMap<&'static str, usize>>,
    fail_reads: Mutex<bool>,
}

impl FakeShop {
    fn hit(&self, op: &'static str) -> Result<()> {
        *self.calls.lock().entry(op).or_default() += 1;
        if *self.fail_reads.lock() {
            return Err(Error::Shop {
                endpoint: op.into(),
                message: "503 Service Unavailable".into(),
            });
        }
        Ok(())
    }

    fn count(&self, op: &str) -> usize {
        self.calls.lock().get(op).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ShopClient for FakeShop {
    async fn list_products(&self) -> Result<Value> {
        self.hit("list_products")?;
        Ok(json!([{ "id": 1, "name": "Mug" }]))
    }

    async fn get_product(&self, id: u64) -> Result<Value> {
        self.hit("get_product")?;
        Ok(json!({ "id": id }))
    }

    async fn list_categories(&self) -> Result<Value> {
        self.hit("list_categories")?;
        Ok(json!([]))
    }

    async fn list_orders(&self) -> Result<Value> {
        self.hit("list_orders")?;
        Ok(json!([]))
    }

    async fn get_order(&self, id: u64) -> Result<Value> {
        self.hit("get_order")?;
        Ok(json!({ "id": id }))
    }

    async fn store_info(&self) -> Result<Value> {
        self.hit("store_info")?;
        Ok(json!({ "name": "Test shop" }))
    }

    async fn create_product(&self, data: Value) -> Result<Value> {
        *self.calls.lock().entry("create_product").or_default() += 1;
        Ok(json!({ "id": 2, "name": data["name"] }))
    }

    async fn update_product(&self, id: u64, data: Value) -> Result<Value> {
        *self.calls.lock().entry("update_product").or_default() += 1;
        let mut body = data;
        body["id"] = json!(id);
        Ok(body)
    }

    async fn delete_product(&self, _id: u64) -> Result<bool> {
        *self.calls.lock().entry("delete_product").or_default() += 1;
        Ok(true)
    }
}

fn setup() -> (Arc<FakeShop>, Arc<ManualClock>, CachedShop) {
    let fake = Arc::new(FakeShop::default());
    let clock = Arc::new(ManualClock::default());
    let cache = Arc::new(CallCache::new(true, Duration::from_secs(300), clock.clone()));
    let shop = CachedShop::new(fake.clone(), cache);
    (fake, clock, shop)
}

#[tokio::test]
async fn products_fetched_once_within_expiry_then_again_after() {
    let (fake, clock, shop) = setup();

    shop.list_products().await.unwrap();
    shop.list_products().await.unwrap();
    assert_eq!(fake.count("list_products"), 1);

    clock.advance(chrono::Duration::seconds(301));
    shop.list_products().await.unwrap();
    assert_eq!(fake.count("list_products"), 2);
}

#[tokio::test]
async fn arguments_are_part_of_the_key() {
    let (fake, _clock, shop) = setup();

    shop.get_product(1).await.unwrap();
    shop.get_product(2).await.unwrap();
    shop.get_product(1).await.unwrap();
    assert_eq!(fake.count("get_product"), 2);
}

#[tokio::test]
async fn writes_invalidate_product_reads_only() {
    let (fake, _clock, shop) = setup();

    shop.list_products().await.unwrap();
    shop.get_product(1).await.unwrap();
    shop.list_categories().await.unwrap();

    shop.create_product(json!({ "name": "Plate", "regular_price": "10" }))
        .await
        .unwrap();

    shop.list_products().await.unwrap();
    shop.get_product(1).await.unwrap();
    shop.list_categories().await.unwrap();
    assert_eq!(fake.count("list_products"), 2);
    assert_eq!(fake.count("get_product"), 2);
    assert_eq!(fake.count("list_categories"), 1);
}

#[tokio::test]
async fn failed_reads_are_not_cached() {
    let (fake, _clock, shop) = setup();

    *fake.fail_reads.lock() = true;
    assert!(shop.list_orders().await.is_err());
    *fake.fail_reads.lock() = false;
    shop.list_orders().await.unwrap();
    shop.list_orders().await.unwrap();
    assert_eq!(fake.count("list_orders"), 2);
}

#[tokio::test]
async fn dispatch_runs_tools_through_the_cache() {
    let (fake, _clock, shop) = setup();
    let registry = ToolRegistry::new(Arc::new(shop));

    let first = registry.dispatch("get_products_tool", &json!({})).await;
    let second = registry.dispatch("get_products_tool", &Value::Null).await;
    assert_eq!(first, second);
    assert_eq!(fake.count("list_products"), 1);

    let created = registry
        .dispatch(
            "create_product_tool",
            &json!({ "name": "Plate", "regular_price": 12.5 }),
        )
        .await;
    assert_eq!(created["name"], "Plate");

    let deleted = registry.dispatch("delete_product_tool", &json!({ "id": 2 })).await;
    assert_eq!(deleted, json!({ "id": 2, "deleted": true }));
}

#[tokio::test]
async fn dispatch_never_fails_hard() {
    let (fake, _clock, shop) = setup();
    let registry = ToolRegistry::new(Arc::new(shop));

    let unknown = registry.dispatch("drop_database", &json!({})).await;
    assert!(unknown["error"].as_str().unwrap().contains("unknown tool"));

    let bad_args = registry.dispatch("update_product_tool", &json!({ "name": "x" })).await;
    assert!(bad_args["error"].as_str().unwrap().contains("invalid arguments"));
    assert_eq!(fake.count("update_product"), 0);

    *fake.fail_reads.lock() = true;
    let failed = registry.dispatch("get_store_info_tool", &json!({})).await;
    assert!(failed["error"].as_str().unwrap().contains("503"));
}
