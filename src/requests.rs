//! Request payloads accepted by the HTTP layer.
//!
//! Each type is a fixed record: missing required fields, unknown fields and
//! wrong types fail deserialization, so a request that reaches an operation
//! is already well formed.

use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::{Todo, TodoPatch};

/// Body of `POST /add-todo`. `todos` carries a single item.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddTodoRequest {
    pub email: String,
    pub todos: Todo,
}

/// Body of `PUT /update-todo`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateTodoRequest {
    pub email: String,
    pub todo_id: String,
    pub updated_data: TodoPatch,
}

/// Body of `DELETE /delete-todo`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteTodoRequest {
    pub email: String,
    pub todo_id: String,
}

/// Query string of the read endpoints.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct EmailQuery {
    pub email: String,
}

pub fn request_schemas() -> Value {
    json!({
        "add-todo": schema_for!(AddTodoRequest),
        "update-todo": schema_for!(UpdateTodoRequest),
        "delete-todo": schema_for!(DeleteTodoRequest),
        "get-todos": schema_for!(EmailQuery),
    })
}
