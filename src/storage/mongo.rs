//! MongoDB-backed [`TodoStore`].
//!
//! One `Client` is built at startup and shared by every request; the driver
//! keeps its own connection pool, sized from [`MongoSettings`].

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{Document, doc, to_bson, to_document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::results::UpdateResult;
use mongodb::{Client, Collection, IndexModel};

use super::{StoreResult, TodoStore, WriteOutcome};
use crate::types::{Todo, TodoPatch, UserTodoList};

pub const DEFAULT_DATABASE: &str = "ClassProject";
pub const DEFAULT_COLLECTION: &str = "todos";

#[derive(Clone, Debug)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout: Duration,
}

impl MongoSettings {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            max_pool_size: 10,
            min_pool_size: 0,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone)]
pub struct MongoTodoStore {
    client: Client,
    database: String,
    collection: Collection<UserTodoList>,
}

impl MongoTodoStore {
    pub async fn connect(settings: &MongoSettings) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(&settings.uri).await?;
        options.app_name = Some(crate::metadata::PKG_NAME.to_string());
        options.max_pool_size = Some(settings.max_pool_size);
        options.min_pool_size = Some(settings.min_pool_size);
        options.connect_timeout = Some(settings.connect_timeout);
        options.server_selection_timeout = Some(settings.connect_timeout);

        let client = Client::with_options(options)?;
        let collection = client
            .database(&settings.database)
            .collection::<UserTodoList>(&settings.collection);

        tracing::debug!(
            database = %settings.database,
            collection = %settings.collection,
            max_pool_size = settings.max_pool_size,
            "MongoDB client configured"
        );

        Ok(Self {
            client,
            database: settings.database.clone(),
            collection,
        })
    }

    /// Unique index on `email`, so racing first adds cannot create two lists.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    /// Drop the backing collection. Used to clean up throwaway test data.
    pub async fn drop_collection(&self) -> StoreResult<()> {
        self.collection.drop().await?;
        Ok(())
    }

    async fn update(&self, filter: Document, update: Document) -> StoreResult<WriteOutcome> {
        let result: UpdateResult = self.collection.update_one(filter, update).await?;
        Ok(WriteOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }
}

/// `$set` document addressing the positionally matched array element.
pub(crate) fn positional_set(patch: &TodoPatch) -> StoreResult<Document> {
    let fields = to_document(patch)?;
    let mut set = Document::new();
    for (key, value) in fields {
        set.insert(format!("todos.$.{key}"), value);
    }
    Ok(set)
}

#[async_trait]
impl TodoStore for MongoTodoStore {
    async fn find_list(&self, email: &str) -> StoreResult<Option<UserTodoList>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn insert_list(&self, list: &UserTodoList) -> StoreResult<()> {
        self.collection.insert_one(list).await?;
        Ok(())
    }

    async fn push_todo(&self, email: &str, todo: &Todo) -> StoreResult<WriteOutcome> {
        let todo = to_bson(todo)?;
        self.update(
            doc! { "email": email },
            doc! { "$push": { "todos": todo } },
        )
        .await
    }

    async fn set_todo_fields(
        &self,
        email: &str,
        todo_id: &str,
        patch: &TodoPatch,
    ) -> StoreResult<WriteOutcome> {
        let set = positional_set(patch)?;
        self.update(
            doc! { "email": email, "todos.id": todo_id },
            doc! { "$set": set },
        )
        .await
    }

    async fn pull_todo(&self, email: &str, todo_id: &str) -> StoreResult<WriteOutcome> {
        self.update(
            doc! { "email": email },
            doc! { "$pull": { "todos": { "id": todo_id } } },
        )
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}
