//! Runs against a real MongoDB when `TODO_TEST_MONGODB_URI` is set; each run
//! uses its own collection and drops it afterwards.

use std::time::{SystemTime, UNIX_EPOCH};

use todo_store::requests::{AddTodoRequest, DeleteTodoRequest, UpdateTodoRequest};
use todo_store::storage::{MongoSettings, MongoTodoStore, TodoStore};
use todo_store::todos;
use todo_store::types::{Todo, TodoPatch};

const EMAIL: &str = "mongo-test@example.com";

async fn store() -> Option<MongoTodoStore> {
    let Ok(uri) = std::env::var("TODO_TEST_MONGODB_URI") else {
        eprintln!("TODO_TEST_MONGODB_URI not set; skipping");
        return None;
    };
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut settings = MongoSettings::new(uri);
    settings.database = "todo_store_tests".to_string();
    settings.collection = format!("todos_{nanos}");
    let store = MongoTodoStore::connect(&settings).await.unwrap();
    store.ensure_indexes().await.unwrap();
    Some(store)
}

fn todo(id: &str) -> Todo {
    Todo {
        id: id.to_string(),
        title: format!("mongo {id}"),
        description: None,
        status: "pending".to_string(),
        priority: "low".to_string(),
        created_at: "2024-08-01".to_string(),
        updated_at: "2024-08-01".to_string(),
        due_date: Some("2024-08-15".to_string()),
        tags: vec!["db".to_string()],
    }
}

#[tokio::test]
async fn operations_round_trip_through_mongodb() {
    let Some(store) = store().await else {
        return;
    };

    for id in ["a", "b", "c"] {
        let request = AddTodoRequest {
            email: EMAIL.to_string(),
            todos: todo(id),
        };
        assert!(todos::add_todo(&store, &request).await.unwrap().is_success());
    }
    let listed = todos::get_todos(&store, EMAIL).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["c", "b", "a"]);

    let update = UpdateTodoRequest {
        email: EMAIL.to_string(),
        todo_id: "b".to_string(),
        updated_data: TodoPatch {
            status: Some("completed".to_string()),
            due_date: Some(None),
            ..Default::default()
        },
    };
    assert!(todos::update_todo(&store, &update).await.unwrap().is_success());
    // Same values again: matched, but nothing modified.
    assert!(!todos::update_todo(&store, &update).await.unwrap().is_success());

    let list = store.find_list(EMAIL).await.unwrap().unwrap();
    assert_eq!(list.todos[1].status, "completed");
    assert_eq!(list.todos[1].due_date, None);
    assert_eq!(list.todos[1].title, "mongo b");

    let delete = DeleteTodoRequest {
        email: EMAIL.to_string(),
        todo_id: "a".to_string(),
    };
    assert!(todos::delete_todo(&store, &delete).await.unwrap().is_success());
    assert!(!todos::delete_todo(&store, &delete).await.unwrap().is_success());

    let list = store.find_list(EMAIL).await.unwrap().unwrap();
    let ids: Vec<_> = list.todos.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["b", "c"]);

    store.ping().await.unwrap();
    store.drop_collection().await.unwrap();
}
