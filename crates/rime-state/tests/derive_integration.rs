//! Integration tests for `#[derive(Lens)]`.
#![allow(missing_docs)]

use rime_state::{path, DocCell, Lens, RimeError, Session, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Lens)]
struct Todo {
    title: String,
    done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Lens)]
struct Filter {
    #[rime(default = "String::from(\"all\")")]
    mode: String,
    query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Lens)]
#[rime(path = "app")]
struct App {
    todos: Vec<Todo>,
    #[rime(nested)]
    filter: Filter,
    #[rime(rename = "visitCount", default = "0")]
    #[serde(rename = "visitCount")]
    visits: i64,
    tags: HashMap<String, i64>,
    #[rime(skip)]
    #[serde(skip)]
    scratch: u32,
}

fn session_with(value: serde_json::Value) -> (Arc<DocCell>, Session) {
    let doc = Arc::new(DocCell::new(Value::from(value)));
    let session = Session::new(doc.clone());
    (doc, session)
}

fn app_state() -> serde_json::Value {
    json!({
        "app": {
            "todos": [{"title": "write tests", "done": false}],
            "filter": {"mode": "open"},
            "visitCount": 3,
            "tags": {"home": 1}
        }
    })
}

// ============================================================================
// Reads
// ============================================================================

#[test]
fn test_read_fields() {
    let (_doc, session) = session_with(app_state());
    let app = session.lens_of::<App>();

    assert_eq!(app.path(), &path!("app"));
    assert_eq!(app.visits().unwrap(), 3);
    assert_eq!(
        app.todos().unwrap(),
        vec![Todo {
            title: "write tests".into(),
            done: false
        }]
    );
    assert_eq!(app.tags().unwrap().get("home"), Some(&1));
}

#[test]
fn test_read_whole_value() {
    let (_doc, session) = session_with(app_state());
    let app = session.lens_of::<App>().get().unwrap();
    assert_eq!(app.visits, 3);
    assert_eq!(app.filter.mode, "open");
    assert_eq!(app.scratch, 0);
}

#[test]
fn test_missing_field_is_path_not_found() {
    let (_doc, session) = session_with(json!({"todo": {"done": true}}));
    let todo = session.lens::<Todo>("todo");

    match todo.title() {
        Err(RimeError::PathNotFound { path }) => assert_eq!(path, path!("todo", "title")),
        other => panic!("expected PathNotFound, got {other:?}"),
    }
    assert!(todo.done().unwrap());
}

#[test]
fn test_default_and_optional_on_absent_keys() {
    let (_doc, session) = session_with(json!({"filter": {}}));
    let filter = session.lens::<Filter>("filter");

    assert_eq!(filter.mode().unwrap(), "all");
    assert_eq!(filter.query().unwrap(), None);
}

#[test]
fn test_wrong_type_is_serialization_error() {
    let (_doc, session) = session_with(json!({"todo": {"title": 5, "done": true}}));
    let todo = session.lens::<Todo>("todo");
    assert!(matches!(todo.title(), Err(RimeError::Serialization(_))));
}

// ============================================================================
// Writes
// ============================================================================

#[test]
fn test_setters_dispatch_and_read_back() {
    let (doc, session) = session_with(json!({"todo": {"title": "a", "done": false}}));
    let todo = session.lens::<Todo>("todo");

    todo.set_title("b");
    todo.set_done(true).unwrap();

    assert_eq!(todo.title().unwrap(), "b");
    assert_eq!(doc.get(), json!({"todo": {"title": "b", "done": true}}));
}

#[test]
fn test_renamed_field_writes_under_its_key() {
    let (doc, session) = session_with(app_state());
    let app = session.lens_of::<App>();

    app.set_visits(4).unwrap();
    assert_eq!(doc.get()["app"]["visitCount"], 4i64);
    assert!(doc.get()["app"]["visits"].is_undefined());
}

#[test]
fn test_optional_none_writes_null() {
    let (doc, session) = session_with(json!({"filter": {"query": "x"}}));
    let filter = session.lens::<Filter>("filter");

    filter.query_none();
    assert_eq!(doc.get()["filter"]["query"], Value::Null);
    assert_eq!(filter.query().unwrap(), None);

    filter.set_query(Some("y".into())).unwrap();
    assert_eq!(filter.query().unwrap().as_deref(), Some("y"));
}

#[test]
fn test_delete_field() {
    let (doc, session) = session_with(json!({"filter": {"mode": "open"}}));
    let filter = session.lens::<Filter>("filter");

    filter.delete_mode();
    assert!(doc.get()["filter"]["mode"].is_undefined());
    assert_eq!(filter.mode().unwrap(), "all");
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn test_vec_push_returns_length() {
    let (doc, session) = session_with(app_state());
    let app = session.lens_of::<App>();

    let len = app
        .todos_push(Todo {
            title: "ship".into(),
            done: false,
        })
        .unwrap();
    assert_eq!(len, 2);
    assert_eq!(doc.get()["app"]["todos"][1]["title"], "ship");

    let removed = app.todos_proxy().shift();
    assert_eq!(removed["title"], "write tests");
    assert_eq!(app.todos().unwrap().len(), 1);
}

#[test]
fn test_vec_push_onto_non_array_fails() {
    let (doc, session) = session_with(json!({"app": {"todos": "oops"}}));
    let app = session.lens_of::<App>();

    let err = app
        .todos_push(Todo {
            title: "x".into(),
            done: false,
        })
        .unwrap_err();
    assert!(matches!(err, RimeError::TypeMismatch { expected: "array", .. }));
    assert_eq!(doc.get()["app"]["todos"], "oops");
}

#[test]
fn test_map_insert() {
    let (doc, session) = session_with(app_state());
    let app = session.lens_of::<App>();

    app.tags_insert("work", 2).unwrap();
    assert_eq!(doc.get()["app"]["tags"], json!({"home": 1, "work": 2}));
}

// ============================================================================
// Nesting
// ============================================================================

#[test]
fn test_nested_lens() {
    let (doc, session) = session_with(app_state());
    let app = session.lens_of::<App>();

    let filter = app.filter();
    assert_eq!(filter.path(), &path!("app", "filter"));
    assert_eq!(filter.mode().unwrap(), "open");

    filter.set_mode("done");
    assert_eq!(doc.get()["app"]["filter"]["mode"], "done");
    assert_eq!(
        app.filter_value().unwrap(),
        Filter {
            mode: "done".into(),
            query: None
        }
    );
}

#[test]
fn test_lens_from_proxy() {
    let (_doc, session) = session_with(app_state());
    let first = session.root().at("app").at("todos").at(0);
    let todo = first.lens::<Todo>();
    assert_eq!(todo.title().unwrap(), "write tests");
}

// ============================================================================
// Lens trait conversions
// ============================================================================

#[test]
fn test_trait_conversions() {
    let todo = Todo {
        title: "t".into(),
        done: true,
    };
    let value = todo.to_value().unwrap();
    assert_eq!(value, json!({"title": "t", "done": true}));
    assert_eq!(Todo::from_value(&value).unwrap(), todo);
    assert_eq!(<App as Lens>::PATH, "app");
    assert_eq!(<Todo as Lens>::PATH, "");
}
