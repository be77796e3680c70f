//! Document store adapter.
//!
//! Every operation targets the single `UserTodoList` document of one email and
//! maps onto one document-database call: find, insert, or an atomic
//! push/set/pull on the `todos` array.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Todo, TodoPatch, UserTodoList};

pub use memory::MemoryTodoStore;
pub use mongo::{MongoSettings, MongoTodoStore};

pub type StoreResult<T> = core::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Driver(#[from] mongodb::error::Error),
    #[error("{0}")]
    Bson(#[from] mongodb::bson::ser::Error),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("Duplicate email: {0}")]
    DuplicateEmail(String),
}

/// Counts reported by an update, mirroring the driver's update result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl WriteOutcome {
    pub fn modified(&self) -> bool {
        self.modified > 0
    }
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn find_list(&self, email: &str) -> StoreResult<Option<UserTodoList>>;

    async fn insert_list(&self, list: &UserTodoList) -> StoreResult<()>;

    /// Append `todo` to the end of the user's `todos`.
    async fn push_todo(&self, email: &str, todo: &Todo) -> StoreResult<WriteOutcome>;

    /// Overwrite the present fields of the element whose `id` is `todo_id`.
    async fn set_todo_fields(
        &self,
        email: &str,
        todo_id: &str,
        patch: &TodoPatch,
    ) -> StoreResult<WriteOutcome>;

    /// Remove every element whose `id` is `todo_id`.
    async fn pull_todo(&self, email: &str, todo_id: &str) -> StoreResult<WriteOutcome>;

    async fn ping(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}
