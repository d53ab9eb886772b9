//! WooCommerce access for the assistant.
//!
//! [`RestShopClient`] talks to the store's REST API, [`CachedShop`] puts the
//! expiring call cache in front of its reads, and [`ToolRegistry`] exposes
//! the operations to the agent as callable tools.

pub mod cached;
pub mod client;
pub mod rest;
pub mod tools;

pub use cached::CachedShop;
pub use client::ShopClient;
pub use rest::RestShopClient;
pub use tools::ToolRegistry;
