use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{AuthenticatedUser, ItemId, RoleGrant};

/// A member of a positionally ordered collection.
///
/// `fields` carries every other persisted attribute verbatim so an update can
/// send the full record back with only `order` changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderableItem {
    pub id: ItemId,
    #[serde(default)]
    pub order: u32,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl OrderableItem {
    pub fn new(id: ItemId, order: u32) -> Self {
        Self {
            id,
            order,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Body of a create request: the item's fields plus its append position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderableItem {
    pub order: u32,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthenticatedUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRolesRequest {
    pub roles: Vec<RoleGrant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orderable_item_keeps_unknown_fields_for_write_back() {
        let raw = r#"{"id":4,"order":2,"name":"Matrícula","required":true}"#;
        let item: OrderableItem = serde_json::from_str(raw).expect("item");
        assert_eq!(item.id, ItemId(4));
        assert_eq!(item.order, 2);
        assert_eq!(item.fields.get("name"), Some(&Value::from("Matrícula")));

        let written = serde_json::to_value(&item).expect("json");
        assert_eq!(written["required"], Value::Bool(true));
        assert_eq!(written["order"], Value::from(2));
    }
}
