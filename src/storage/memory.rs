use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{StoreError, StoreResult, TodoStore, WriteOutcome};
use crate::types::{Todo, TodoPatch, UserTodoList};

/// In-process store with the same per-document semantics as the Mongo
/// adapter: an update that writes identical values is matched but not
/// modified.
#[derive(Default)]
pub struct MemoryTodoStore {
    lists: RwLock<HashMap<String, UserTodoList>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_count(&self) -> usize {
        self.lists.read().map(|lists| lists.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn find_list(&self, email: &str) -> StoreResult<Option<UserTodoList>> {
        let lists = self.lists.read().map_err(|_| StoreError::Poisoned)?;
        Ok(lists.get(email).cloned())
    }

    async fn insert_list(&self, list: &UserTodoList) -> StoreResult<()> {
        let mut lists = self.lists.write().map_err(|_| StoreError::Poisoned)?;
        if lists.contains_key(&list.email) {
            return Err(StoreError::DuplicateEmail(list.email.clone()));
        }
        lists.insert(list.email.clone(), list.clone());
        Ok(())
    }

    async fn push_todo(&self, email: &str, todo: &Todo) -> StoreResult<WriteOutcome> {
        let mut lists = self.lists.write().map_err(|_| StoreError::Poisoned)?;
        let Some(list) = lists.get_mut(email) else {
            return Ok(WriteOutcome::default());
        };
        list.todos.push(todo.clone());
        Ok(WriteOutcome {
            matched: 1,
            modified: 1,
        })
    }

    async fn set_todo_fields(
        &self,
        email: &str,
        todo_id: &str,
        patch: &TodoPatch,
    ) -> StoreResult<WriteOutcome> {
        let mut lists = self.lists.write().map_err(|_| StoreError::Poisoned)?;
        let Some(todo) = lists
            .get_mut(email)
            .and_then(|list| list.todos.iter_mut().find(|t| t.id == todo_id))
        else {
            return Ok(WriteOutcome::default());
        };
        // The positional operator only touches the first matching element.
        let changed = patch.apply_to(todo);
        Ok(WriteOutcome {
            matched: 1,
            modified: u64::from(changed),
        })
    }

    async fn pull_todo(&self, email: &str, todo_id: &str) -> StoreResult<WriteOutcome> {
        let mut lists = self.lists.write().map_err(|_| StoreError::Poisoned)?;
        let Some(list) = lists.get_mut(email) else {
            return Ok(WriteOutcome::default());
        };
        let before = list.todos.len();
        list.todos.retain(|t| t.id != todo_id);
        Ok(WriteOutcome {
            matched: 1,
            modified: u64::from(list.todos.len() != before),
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.lists
            .read()
            .map(drop)
            .map_err(|_| StoreError::Poisoned)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: &str, title: &str) -> Todo {
        Todo {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            status: "pending".to_string(),
            priority: "medium".to_string(),
            created_at: "2024-03-01".to_string(),
            updated_at: "2024-03-01".to_string(),
            due_date: None,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn push_on_missing_document_matches_nothing() {
        let store = MemoryTodoStore::new();
        let outcome = store.push_todo("nobody@example.com", &todo("1", "a")).await.unwrap();
        assert_eq!(outcome, WriteOutcome::default());
        assert_eq!(store.document_count(), 0);
    }

    #[tokio::test]
    async fn ping_reports_a_poisoned_lock() {
        let store = MemoryTodoStore::new();
        store.ping().await.unwrap();

        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = store.lists.write().unwrap();
                    panic!("writer died holding the lock");
                })
                .join();
        });
        assert!(matches!(store.ping().await, Err(StoreError::Poisoned)));
        assert!(matches!(
            store.find_list("a@example.com").await,
            Err(StoreError::Poisoned)
        ));
    }

    #[tokio::test]
    async fn insert_twice_for_same_email_fails() {
        let store = MemoryTodoStore::new();
        let list = UserTodoList::new("a@example.com", todo("1", "a"));
        store.insert_list(&list).await.unwrap();
        let err = store.insert_list(&list).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
        assert_eq!(store.document_count(), 1);
    }

    #[tokio::test]
    async fn set_with_identical_values_is_matched_but_not_modified() {
        let store = MemoryTodoStore::new();
        store
            .insert_list(&UserTodoList::new("a@example.com", todo("1", "a")))
            .await
            .unwrap();
        let patch = TodoPatch {
            title: Some("a".to_string()),
            ..Default::default()
        };
        let outcome = store.set_todo_fields("a@example.com", "1", &patch).await.unwrap();
        assert_eq!(outcome.matched, 1);
        assert!(!outcome.modified());
    }

    #[tokio::test]
    async fn pull_keeps_relative_order() {
        let store = MemoryTodoStore::new();
        store
            .insert_list(&UserTodoList::new("a@example.com", todo("1", "a")))
            .await
            .unwrap();
        store.push_todo("a@example.com", &todo("2", "b")).await.unwrap();
        store.push_todo("a@example.com", &todo("3", "c")).await.unwrap();

        let outcome = store.pull_todo("a@example.com", "2").await.unwrap();
        assert!(outcome.modified());

        let list = store.find_list("a@example.com").await.unwrap().unwrap();
        let ids: Vec<_> = list.todos.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }
}
