//! The todo operations. Each one issues the store calls for a single request
//! and turns the raw result into the value sent back to the client.

use crate::requests::{AddTodoRequest, DeleteTodoRequest, UpdateTodoRequest};
use crate::storage::{StoreResult, TodoStore};
use crate::types::{Envelope, Todo, TodoStats, UserTodoList};

pub const ADDED: &str = "Todo added successfully";
pub const ADD_FAILED: &str = "Failed to add todo";
pub const UPDATED: &str = "Todo updated successfully";
pub const UPDATE_FAILED: &str = "Failed to update todo";
pub const DELETED: &str = "Todo deleted successfully";
pub const DELETE_FAILED: &str = "Failed to delete todo";

/// Append to the user's list, creating the list on first use.
pub async fn add_todo(store: &dyn TodoStore, request: &AddTodoRequest) -> StoreResult<Envelope> {
    let email = request.email.as_str();
    let todo = &request.todos;

    if store.find_list(email).await?.is_some() {
        let outcome = store.push_todo(email, todo).await?;
        // The list may have vanished between the lookup and the push.
        if outcome.matched == 0 {
            tracing::warn!(%email, todo_id = %todo.id, "push matched no document");
            return Ok(Envelope::error(ADD_FAILED));
        }
    } else {
        store
            .insert_list(&UserTodoList::new(email, todo.clone()))
            .await?;
        tracing::debug!(%email, "created todo list");
    }

    tracing::debug!(%email, todo_id = %todo.id, "todo added");
    Ok(Envelope::success(ADDED))
}

/// Most recently added first. An unknown email has no todos.
pub async fn get_todos(store: &dyn TodoStore, email: &str) -> StoreResult<Vec<Todo>> {
    let todos = match store.find_list(email).await? {
        Some(list) => list.todos.into_iter().rev().collect(),
        None => Vec::new(),
    };
    Ok(todos)
}

pub async fn update_todo(
    store: &dyn TodoStore,
    request: &UpdateTodoRequest,
) -> StoreResult<Envelope> {
    if request.updated_data.is_empty() {
        tracing::debug!(email = %request.email, todo_id = %request.todo_id, "empty update");
        return Ok(Envelope::error(UPDATE_FAILED));
    }

    let outcome = store
        .set_todo_fields(&request.email, &request.todo_id, &request.updated_data)
        .await?;
    tracing::debug!(
        email = %request.email,
        todo_id = %request.todo_id,
        matched = outcome.matched,
        modified = outcome.modified,
        "update applied"
    );

    // Not found and "nothing changed" are reported the same way.
    Ok(if outcome.modified() {
        Envelope::success(UPDATED)
    } else {
        Envelope::error(UPDATE_FAILED)
    })
}

pub async fn delete_todo(
    store: &dyn TodoStore,
    request: &DeleteTodoRequest,
) -> StoreResult<Envelope> {
    let outcome = store.pull_todo(&request.email, &request.todo_id).await?;
    tracing::debug!(
        email = %request.email,
        todo_id = %request.todo_id,
        modified = outcome.modified,
        "delete applied"
    );

    Ok(if outcome.modified() {
        Envelope::success(DELETED)
    } else {
        Envelope::error(DELETE_FAILED)
    })
}

pub async fn todo_stats(store: &dyn TodoStore, email: &str) -> StoreResult<TodoStats> {
    let stats = match store.find_list(email).await? {
        Some(list) => TodoStats::from_todos(&list.todos),
        None => TodoStats::default(),
    };
    Ok(stats)
}
