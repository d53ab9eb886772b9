//! The store operations exposed to the agent as tools.
//!
//! Dispatch never fails hard: unknown tools, bad arguments and store errors
//! all come back as `{"error": "..."}` so the model can react to them.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use sb_domain::tool::ToolDefinition;

use crate::client::ShopClient;

pub const GET_PRODUCTS_TOOL: &str = "get_products_tool";
pub const GET_CATEGORIES_TOOL: &str = "get_categories_tool";
pub const GET_ORDERS_TOOL: &str = "get_orders_tool";
pub const GET_STORE_INFO_TOOL: &str = "get_store_info_tool";
pub const CREATE_PRODUCT_TOOL: &str = "create_product_tool";
pub const UPDATE_PRODUCT_TOOL: &str = "update_product_tool";
pub const DELETE_PRODUCT_TOOL: &str = "delete_product_tool";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone)]
pub struct ToolRegistry {
    shop: Arc<dyn ShopClient>,
    definitions: Arc<Vec<ToolDefinition>>,
}

impl ToolRegistry {
    pub fn new(shop: Arc<dyn ShopClient>) -> Self {
        Self {
            shop,
            definitions: Arc::new(build_definitions()),
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }

    /// Run `tool_name` with the model-supplied `arguments`.
    pub async fn dispatch(&self, tool_name: &str, arguments: &Value) -> Value {
        tracing::info!(tool = tool_name, "running tool");

        let result = match tool_name {
            GET_PRODUCTS_TOOL => self.shop.list_products().await,
            GET_CATEGORIES_TOOL => self.shop.list_categories().await,
            GET_ORDERS_TOOL => self.shop.list_orders().await,
            GET_STORE_INFO_TOOL => self.shop.store_info().await,
            CREATE_PRODUCT_TOOL => match parse::<CreateProductArgs>(tool_name, arguments) {
                Ok(args) => self.shop.create_product(args.into_body()).await,
                Err(e) => return e,
            },
            UPDATE_PRODUCT_TOOL => match parse::<UpdateProductArgs>(tool_name, arguments) {
                Ok(args) => {
                    let id = args.id;
                    self.shop.update_product(id, args.into_body()).await
                }
                Err(e) => return e,
            },
            DELETE_PRODUCT_TOOL => match parse::<DeleteProductArgs>(tool_name, arguments) {
                Ok(args) => self
                    .shop
                    .delete_product(args.id)
                    .await
                    .map(|deleted| json!({ "id": args.id, "deleted": deleted })),
                Err(e) => return e,
            },
            other => {
                tracing::warn!(tool = other, "unknown tool requested");
                return error_value(format!("unknown tool: {other}"));
            }
        };

        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(tool = tool_name, error = %e, "tool failed");
                error_value(e.to_string())
            }
        }
    }
}

fn error_value(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

fn parse<T: DeserializeOwned>(tool_name: &str, arguments: &Value) -> Result<T, Value> {
    // Models sometimes send `null` for tools without required arguments.
    let empty;
    let arguments = if arguments.is_null() {
        empty = Value::Object(Map::new());
        &empty
    } else {
        arguments
    };
    T::deserialize(arguments)
        .map_err(|e| error_value(format!("invalid arguments for {tool_name}: {e}")))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Arguments
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct CategoryRef {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct CreateProductArgs {
    name: String,
    #[serde(deserialize_with = "price")]
    regular_price: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    categories: Option<Vec<CategoryRef>>,
}

impl CreateProductArgs {
    fn into_body(self) -> Value {
        let mut body = Map::new();
        body.insert("name".into(), Value::String(self.name));
        body.insert("regular_price".into(), Value::String(self.regular_price));
        if let Some(description) = self.description {
            body.insert("description".into(), Value::String(description));
        }
        if let Some(categories) = self.categories.filter(|c| !c.is_empty()) {
            body.insert("categories".into(), categories_value(&categories));
        }
        Value::Object(body)
    }
}

#[derive(Debug, Deserialize)]
struct UpdateProductArgs {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "optional_price")]
    regular_price: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    categories: Option<Vec<CategoryRef>>,
}

impl UpdateProductArgs {
    /// Only the supplied fields.
    fn into_body(self) -> Value {
        let mut body = Map::new();
        if let Some(name) = self.name {
            body.insert("name".into(), Value::String(name));
        }
        if let Some(price) = self.regular_price {
            body.insert("regular_price".into(), Value::String(price));
        }
        if let Some(description) = self.description {
            body.insert("description".into(), Value::String(description));
        }
        if let Some(categories) = self.categories {
            body.insert("categories".into(), categories_value(&categories));
        }
        Value::Object(body)
    }
}

#[derive(Debug, Deserialize)]
struct DeleteProductArgs {
    id: u64,
}

fn categories_value(categories: &[CategoryRef]) -> Value {
    Value::Array(categories.iter().map(|c| json!({ "id": c.id })).collect())
}

/// WooCommerce wants prices as strings; models often send numbers.
fn price<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "regular_price must be a string or number, got {other}"
        ))),
    }
}

fn optional_price<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "regular_price must be a string or number, got {other}"
        ))),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Definitions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn categories_schema(description: &str) -> Value {
    json!({
        "type": "array",
        "description": description,
        "items": {
            "type": "object",
            "properties": { "id": { "type": "integer" } },
            "required": ["id"]
        }
    })
}

fn build_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: GET_PRODUCTS_TOOL.into(),
            description: "מחזיר רשימה של כל המוצרים בחנות".into(),
            parameters: no_arguments(),
        },
        ToolDefinition {
            name: GET_CATEGORIES_TOOL.into(),
            description: "מחזיר רשימה של כל הקטגוריות בחנות".into(),
            parameters: no_arguments(),
        },
        ToolDefinition {
            name: GET_ORDERS_TOOL.into(),
            description: "מחזיר רשימה של כל ההזמנות בחנות".into(),
            parameters: no_arguments(),
        },
        ToolDefinition {
            name: GET_STORE_INFO_TOOL.into(),
            description: "מחזיר מידע כללי על החנות".into(),
            parameters: no_arguments(),
        },
        ToolDefinition {
            name: CREATE_PRODUCT_TOOL.into(),
            description: "יוצר מוצר חדש בחנות".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "שם המוצר" },
                    "regular_price": { "type": "string", "description": "המחיר הרגיל של המוצר" },
                    "description": { "type": "string", "description": "תיאור המוצר" },
                    "categories": categories_schema("הקטגוריות שהמוצר שייך אליהן")
                },
                "required": ["name", "regular_price"]
            }),
        },
        ToolDefinition {
            name: UPDATE_PRODUCT_TOOL.into(),
            description: "מעדכן מוצר קיים בחנות".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "description": "מזהה המוצר לעדכון" },
                    "name": { "type": "string", "description": "שם המוצר החדש" },
                    "regular_price": { "type": "string", "description": "המחיר הרגיל החדש" },
                    "description": { "type": "string", "description": "תיאור המוצר החדש" },
                    "categories": categories_schema("הקטגוריות החדשות של המוצר")
                },
                "required": ["id"]
            }),
        },
        ToolDefinition {
            name: DELETE_PRODUCT_TOOL.into(),
            description: "מוחק מוצר מהחנות".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "description": "מזהה המוצר למחיקה" }
                },
                "required": ["id"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_includes_only_supplied_optionals() {
        let args: CreateProductArgs =
            serde_json::from_value(json!({ "name": "Mug", "regular_price": 25 })).unwrap();
        assert_eq!(
            args.into_body(),
            json!({ "name": "Mug", "regular_price": "25" })
        );

        let args: CreateProductArgs = serde_json::from_value(json!({
            "name": "Mug",
            "regular_price": "25.50",
            "description": "Ceramic",
            "categories": [{ "id": 3 }]
        }))
        .unwrap();
        assert_eq!(
            args.into_body(),
            json!({
                "name": "Mug",
                "regular_price": "25.50",
                "description": "Ceramic",
                "categories": [{ "id": 3 }]
            })
        );
    }

    #[test]
    fn update_body_is_partial() {
        let args: UpdateProductArgs =
            serde_json::from_value(json!({ "id": 9, "regular_price": 30 })).unwrap();
        assert_eq!(args.id, 9);
        assert_eq!(args.into_body(), json!({ "regular_price": "30" }));
    }

    #[test]
    fn seven_tools_with_object_schemas() {
        let defs = build_definitions();
        assert_eq!(defs.len(), 7);
        for def in &defs {
            assert_eq!(def.parameters["type"], "object", "{}", def.name);
        }
    }
}
