use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// One task in a user's list. Timestamps are stored as the caller sent them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub due_date: Option<String>,
    pub tags: Vec<String>,
}

/// The single document kept per user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTodoList {
    pub email: String,
    #[serde(default)]
    pub todos: Vec<Todo>,
}

impl UserTodoList {
    pub fn new(email: impl Into<String>, first: Todo) -> Self {
        Self {
            email: email.into(),
            todos: vec![first],
        }
    }
}

/// Fields of a [`Todo`] to overwrite. `None` leaves the stored value alone;
/// for `description` and `due_date`, `Some(None)` clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub due_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

// Distinguishes an explicit `null` from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn overwrite<T: PartialEq + Clone>(slot: &mut T, value: &Option<T>) -> bool {
    match value {
        Some(v) if slot != v => {
            *slot = v.clone();
            true
        }
        _ => false,
    }
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self == &TodoPatch::default()
    }

    /// Apply the present fields to `todo`, returning whether any value changed.
    pub fn apply_to(&self, todo: &mut Todo) -> bool {
        let mut changed = false;
        changed |= overwrite(&mut todo.id, &self.id);
        changed |= overwrite(&mut todo.title, &self.title);
        changed |= overwrite(&mut todo.description, &self.description);
        changed |= overwrite(&mut todo.status, &self.status);
        changed |= overwrite(&mut todo.priority, &self.priority);
        changed |= overwrite(&mut todo.created_at, &self.created_at);
        changed |= overwrite(&mut todo.updated_at, &self.updated_at);
        changed |= overwrite(&mut todo.due_date, &self.due_date);
        changed |= overwrite(&mut todo.tags, &self.tags);
        changed
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// `{status, message}` body returned by the mutating endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    pub message: String,
}

impl Envelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub high_priority: usize,
}

impl TodoStats {
    pub fn from_todos(todos: &[Todo]) -> Self {
        let count = |pred: &dyn Fn(&Todo) -> bool| todos.iter().filter(|t| pred(t)).count();
        Self {
            total: todos.len(),
            completed: count(&|t| t.status == "completed"),
            pending: count(&|t| t.status == "pending"),
            in_progress: count(&|t| t.status == "in-progress"),
            high_priority: count(&|t| t.priority == "high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(id: &str) -> Todo {
        Todo {
            id: id.to_string(),
            title: "Write report".to_string(),
            description: Some("quarterly".to_string()),
            status: "pending".to_string(),
            priority: "high".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            due_date: None,
            tags: vec!["work".to_string()],
        }
    }

    #[test]
    fn todo_uses_camel_case_keys() {
        let value = serde_json::to_value(sample("a")).unwrap();
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00Z");
        assert_eq!(value["dueDate"], serde_json::Value::Null);
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn todo_optional_fields_may_be_omitted() {
        let todo: Todo = serde_json::from_value(json!({
            "id": "1", "title": "t", "status": "pending", "priority": "low",
            "createdAt": "c", "updatedAt": "u", "tags": []
        }))
        .unwrap();
        assert_eq!(todo.description, None);
        assert_eq!(todo.due_date, None);
    }

    #[test]
    fn todo_rejects_missing_title() {
        let result: Result<Todo, _> = serde_json::from_value(json!({
            "id": "1", "status": "pending", "priority": "low",
            "createdAt": "c", "updatedAt": "u", "tags": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn patch_tells_null_apart_from_missing() {
        let patch: TodoPatch =
            serde_json::from_value(json!({ "description": null, "title": "new" })).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.due_date, None);
        assert_eq!(patch.title.as_deref(), Some("new"));
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = TodoPatch {
            status: Some("done".to_string()),
            due_date: Some(None),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, json!({ "status": "done", "dueDate": null }));
    }

    #[test]
    fn apply_reports_real_changes_only() {
        let mut todo = sample("a");
        let same = TodoPatch {
            status: Some("pending".to_string()),
            ..Default::default()
        };
        assert!(!same.apply_to(&mut todo));

        let clear = TodoPatch {
            description: Some(None),
            ..Default::default()
        };
        assert!(clear.apply_to(&mut todo));
        assert_eq!(todo.description, None);
        assert_eq!(todo.title, "Write report");
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TodoPatch::default().is_empty());
        let patch: TodoPatch = serde_json::from_value(json!({ "dueDate": null })).unwrap();
        assert!(!patch.is_empty());
    }

    #[test]
    fn stats_follow_status_and_priority() {
        let mut done = sample("b");
        done.status = "completed".to_string();
        done.priority = "low".to_string();
        let mut busy = sample("c");
        busy.status = "in-progress".to_string();

        let stats = TodoStats::from_todos(&[sample("a"), done, busy]);
        assert_eq!(
            stats,
            TodoStats {
                total: 3,
                completed: 1,
                pending: 1,
                in_progress: 1,
                high_priority: 2,
            }
        );
    }

    #[test]
    fn envelope_status_is_lowercase() {
        let value = serde_json::to_value(Envelope::success("ok")).unwrap();
        assert_eq!(value, json!({ "status": "success", "message": "ok" }));
    }
}
