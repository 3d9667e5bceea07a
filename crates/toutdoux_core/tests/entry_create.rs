use rusqlite::Connection;
use std::path::PathBuf;
use toutdoux_core::db::{open_db, open_db_in_memory};
use toutdoux_core::model::relation::NewTodoEntryRelation;
use toutdoux_core::repo::entry_repo::SqliteEntryRepository;
use toutdoux_core::repo::label_repo::SqliteLabelRepository;
use toutdoux_core::repo::relation_type_repo::SqliteRelationTypeRepository;
use toutdoux_core::service::entry_service::validate_entry_labels;
use toutdoux_core::{
    seed_relation_types, CreateEntryRequest, EntityKind, EntryService, ListService,
    RelationBuilder, RelationRequest, RepoError, ServiceError, TodoListId, UserId,
};
use uuid::Uuid;

fn setup() -> (Connection, UserId, TodoListId) {
    let mut conn = open_db_in_memory().unwrap();
    seed_relation_types(&mut conn).unwrap();
    let owner = Uuid::new_v4();
    let list = ListService::new(&conn).create_list(owner, "Home").unwrap();
    (conn, owner, list.id)
}

fn request(title: &str, priority: i64) -> CreateEntryRequest {
    CreateEntryRequest {
        title: title.to_string(),
        priority,
        ..CreateEntryRequest::default()
    }
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn create_entry_returns_snapshot_with_storage_defaults() {
    let (mut conn, owner, list_id) = setup();
    let mut service = EntryService::try_new(&mut conn).unwrap();

    let mut req = request("buy milk", 2);
    req.due_date = Some(1_700_000_000_000);
    let entry = service.create_entry(list_id, owner, &req).unwrap();

    assert_eq!(entry.title, "buy milk");
    assert_eq!(entry.priority, 2);
    assert!(!entry.done);
    assert_eq!(entry.due_date, Some(1_700_000_000_000));
    assert_eq!(entry.todo_list_id, list_id);
    assert!(entry.created_at > 0);
    assert_eq!(entry.created_at, entry.updated_at);
    assert!(entry.labels.is_empty());
    assert!(entry.relations.is_empty());

    let loaded = service.get_entry(owner, entry.id).unwrap();
    assert_eq!(loaded, entry);
}

#[test]
fn duplicate_label_names_are_collapsed() {
    let (mut conn, owner, list_id) = setup();
    let entry = {
        let mut service = EntryService::try_new(&mut conn).unwrap();
        let mut req = request("groceries", 1);
        req.labels = ["a", "a", "b"].map(String::from).to_vec();
        service.create_entry(list_id, owner, &req).unwrap()
    };

    let names: Vec<_> = entry.labels.iter().map(|label| label.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(count_rows(&conn, "todo_list_labels"), 2);
    assert_eq!(count_rows(&conn, "todo_entry_labels"), 2);
}

#[test]
fn existing_labels_are_reused_across_entries() {
    let (mut conn, owner, list_id) = setup();
    let mut service = EntryService::try_new(&mut conn).unwrap();

    let mut first = request("first", 1);
    first.labels = vec!["work".to_string()];
    let mut second = request("second", 1);
    second.labels = vec!["work".to_string(), "Work".to_string()];

    let first = service.create_entry(list_id, owner, &first).unwrap();
    let second = service.create_entry(list_id, owner, &second).unwrap();

    assert_eq!(first.labels[0].id, second.labels[0].id);
    assert_eq!(second.labels.len(), 2);
    assert_ne!(second.labels[0].id, second.labels[1].id);
}

#[test]
fn priority_must_be_positive() {
    let (mut conn, owner, list_id) = setup();
    let mut service = EntryService::try_new(&mut conn).unwrap();

    let err = service
        .create_entry(list_id, owner, &request("x", 0))
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationFailed(_)));
    assert_eq!(err.field_errors()[0].field, "priority");

    let entry = service
        .create_entry(list_id, owner, &request("x", 1))
        .unwrap();
    assert_eq!(entry.priority, 1);
}

#[test]
fn whitespace_only_title_is_rejected_before_storage() {
    let (mut conn, owner, _list_id) = setup();
    let missing_list = Uuid::new_v4();
    let mut service = EntryService::try_new(&mut conn).unwrap();

    let err = service
        .create_entry(missing_list, owner, &request("   ", 0))
        .unwrap_err();
    let fields: Vec<_> = err
        .field_errors()
        .iter()
        .map(|error| error.field.as_str())
        .collect();
    assert_eq!(fields, vec!["title", "priority"]);
}

#[test]
fn list_of_another_owner_is_not_found() {
    let (mut conn, _owner, list_id) = setup();
    let stranger = Uuid::new_v4();
    {
        let mut service = EntryService::try_new(&mut conn).unwrap();
        let mut req = request("sneaky", 1);
        req.labels = vec!["spam".to_string()];
        let err = service.create_entry(list_id, stranger, &req).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                kind: EntityKind::TodoList,
                ..
            }
        ));
    }
    assert_eq!(count_rows(&conn, "todo_entries"), 0);
    assert_eq!(count_rows(&conn, "todo_list_labels"), 0);
}

#[test]
fn missing_relation_target_rolls_back_everything() {
    let (mut conn, owner, list_id) = setup();
    let missing = Uuid::new_v4();
    {
        let mut service = EntryService::try_new(&mut conn).unwrap();
        let mut req = request("blocked task", 3);
        req.labels = vec!["fresh".to_string(), "new".to_string()];
        req.relations = vec![RelationRequest::new(missing.to_string(), "blocked by")];

        let err = service.create_entry(list_id, owner, &req).unwrap_err();
        match err {
            ServiceError::NotFound { kind, id } => {
                assert_eq!(kind, EntityKind::TodoEntry);
                assert_eq!(id, missing.to_string());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(count_rows(&conn, "todo_entries"), 0);
    assert_eq!(count_rows(&conn, "todo_list_labels"), 0);
    assert_eq!(count_rows(&conn, "todo_entry_labels"), 0);
    assert_eq!(count_rows(&conn, "todo_entry_relations"), 0);
}

#[test]
fn relations_are_created_outgoing_from_new_entry() {
    let (mut conn, owner, list_id) = setup();
    let mut service = EntryService::try_new(&mut conn).unwrap();

    let target = service
        .create_entry(list_id, owner, &request("pour foundation", 1))
        .unwrap();
    let other = service
        .create_entry(list_id, owner, &request("order bricks", 1))
        .unwrap();

    let mut req = request("build walls", 2);
    req.relations = vec![
        RelationRequest::new(target.id.to_string(), "blocked by"),
        RelationRequest::new(format!(" {} ", other.id), "follows"),
    ];
    let entry = service.create_entry(list_id, owner, &req).unwrap();

    assert_eq!(entry.relations.len(), 2);
    assert!(entry
        .relations
        .iter()
        .all(|relation| relation.todo_entry_id == entry.id));
    assert_eq!(entry.relations[0].related_to_todo_entry_id, target.id);
    assert_eq!(entry.relations[0].relation_type, "blocked by");
    assert_eq!(entry.relations[1].related_to_todo_entry_id, other.id);
    assert_eq!(entry.relations[1].relation_type, "follows");
}

#[test]
fn self_relation_is_rejected() {
    let (mut conn, owner, list_id) = setup();
    let own_id = Uuid::new_v4();
    {
        let mut service = EntryService::try_new(&mut conn).unwrap();
        let mut req = request("loop", 1);
        req.entry_id = Some(own_id);
        req.relations = vec![RelationRequest::new(own_id.to_string(), "related to")];

        let err = service.create_entry(list_id, owner, &req).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));
        assert!(err.field_errors()[0].message.contains("itself"));
    }
    assert_eq!(count_rows(&conn, "todo_entries"), 0);
}

#[test]
fn unknown_relation_type_and_malformed_ids_are_rejected() {
    let (mut conn, owner, list_id) = setup();
    let mut service = EntryService::try_new(&mut conn).unwrap();
    let target = service
        .create_entry(list_id, owner, &request("target", 1))
        .unwrap();

    let mut unknown_type = request("x", 1);
    unknown_type.relations = vec![RelationRequest::new(target.id.to_string(), "duplicates")];
    let err = service
        .create_entry(list_id, owner, &unknown_type)
        .unwrap_err();
    assert_eq!(err.field_errors()[0].field, "relations[0].relation_type");

    let mut malformed = request("x", 1);
    malformed.relations = vec![
        RelationRequest::new(target.id.to_string(), "related to"),
        RelationRequest::new("not-a-uuid", "related to"),
    ];
    let err = service.create_entry(list_id, owner, &malformed).unwrap_err();
    assert_eq!(err.field_errors().len(), 1);
    assert_eq!(err.field_errors()[0].field, "relations[1].related_todo");
}

#[test]
fn duplicate_relations_in_one_request_are_rejected() {
    let (mut conn, owner, list_id) = setup();
    let mut service = EntryService::try_new(&mut conn).unwrap();
    let target = service
        .create_entry(list_id, owner, &request("target", 1))
        .unwrap();

    let mut req = request("x", 1);
    req.relations = vec![
        RelationRequest::new(target.id.to_string(), "precedes"),
        RelationRequest::new(target.id.to_string(), "precedes"),
    ];
    let err = service.create_entry(list_id, owner, &req).unwrap_err();
    assert_eq!(err.field_errors().len(), 1);
    assert!(err.field_errors()[0].message.starts_with("duplicate"));
}

#[test]
fn caller_supplied_id_must_be_fresh() {
    let (mut conn, owner, list_id) = setup();
    let mut service = EntryService::try_new(&mut conn).unwrap();
    let id = Uuid::new_v4();

    let mut req = request("imported", 1);
    req.entry_id = Some(id);
    let entry = service.create_entry(list_id, owner, &req).unwrap();
    assert_eq!(entry.id, id);

    let err = service.create_entry(list_id, owner, &req).unwrap_err();
    assert_eq!(err.field_errors()[0].field, "id");
}

#[test]
fn get_entry_is_owner_scoped() {
    let (mut conn, owner, list_id) = setup();
    let mut service = EntryService::try_new(&mut conn).unwrap();
    let entry = service
        .create_entry(list_id, owner, &request("private", 1))
        .unwrap();

    let err = service.get_entry(Uuid::new_v4(), entry.id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::TodoEntry,
            ..
        }
    ));
}

#[test]
fn snapshot_serializes_without_internal_fields() {
    let (mut conn, owner, list_id) = setup();
    let mut service = EntryService::try_new(&mut conn).unwrap();
    let mut req = request("ship it", 5);
    req.labels = vec!["release".to_string()];
    let entry = service.create_entry(list_id, owner, &req).unwrap();

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["title"], "ship it");
    assert_eq!(json["priority"], 5);
    assert_eq!(json["done"], false);
    assert!(json.get("todo_list_id").is_none());
    assert!(json.get("due_date").is_none());
    assert_eq!(json["labels"][0]["name"], "release");
    assert!(json["labels"][0].get("todo_list_id").is_none());
    assert_eq!(json["relations"], serde_json::json!([]));
}

#[test]
fn request_deserializes_with_defaults() {
    let req: CreateEntryRequest = serde_json::from_value(serde_json::json!({
        "title": "from json",
        "priority": 1,
        "relations": [{ "related_todo": "abc", "relation_type": "related to" }]
    }))
    .unwrap();

    assert!(req.labels.is_empty());
    assert_eq!(req.due_date, None);
    assert_eq!(req.entry_id, None);
    assert_eq!(req.relations[0], RelationRequest::new("abc", "related to"));
}

#[test]
fn concurrent_creations_share_one_label() {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("toutdoux.db");
    let owner = Uuid::new_v4();
    let list_id = {
        let mut conn = open_db(&path).unwrap();
        seed_relation_types(&mut conn).unwrap();
        ListService::new(&conn).create_list(owner, "shared").unwrap().id
    };

    let workers: Vec<_> = (0..2)
        .map(|index| {
            let path = path.clone();
            std::thread::spawn(move || {
                let mut conn = open_db(&path).unwrap();
                let mut service = EntryService::try_new(&mut conn).unwrap();
                let mut req = request(&format!("worker {index}"), 1);
                req.labels = vec!["urgent".to_string()];
                service.create_entry(list_id, owner, &req).unwrap()
            })
        })
        .collect();
    let entries: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .collect();

    assert_eq!(entries[0].labels[0].id, entries[1].labels[0].id);
    let conn = open_db(&path).unwrap();
    assert_eq!(count_rows(&conn, "todo_list_labels"), 1);
    assert_eq!(count_rows(&conn, "todo_entries"), 2);
}

#[test]
fn relation_to_entry_of_another_owner_is_not_found() {
    let (mut conn, owner, list_id) = setup();
    let stranger = Uuid::new_v4();
    let foreign_list = ListService::new(&conn)
        .create_list(stranger, "theirs")
        .unwrap();
    {
        let mut service = EntryService::try_new(&mut conn).unwrap();
        let foreign = service
            .create_entry(foreign_list.id, stranger, &request("theirs", 1))
            .unwrap();

        let mut req = request("mine", 1);
        req.relations = vec![RelationRequest::new(foreign.id.to_string(), "blocked by")];
        match service.create_entry(list_id, owner, &req).unwrap_err() {
            ServiceError::NotFound { kind, id } => {
                assert_eq!(kind, EntityKind::TodoEntry);
                assert_eq!(id, foreign.id.to_string());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(count_rows(&conn, "todo_entries"), 1);
    assert_eq!(count_rows(&conn, "todo_entry_relations"), 0);
}

#[test]
fn label_of_another_list_fails_membership_check() {
    let (conn, owner, list_id) = setup();
    let service = ListService::new(&conn);
    let other_list = service.create_list(owner, "work").unwrap();
    let own = service.create_label(owner, list_id, "home-only").unwrap();
    let foreign = service.create_label(owner, other_list.id, "work-only").unwrap();

    let labels = SqliteLabelRepository::try_new(&conn).unwrap();
    let errors = validate_entry_labels(&labels, list_id, &[own.clone(), foreign.clone()]).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "labels");
    assert!(errors[0].message.contains(&foreign.id.to_string()));

    assert!(validate_entry_labels(&labels, list_id, &[own]).unwrap().is_empty());
}

#[test]
fn relation_declared_for_another_entry_is_rejected() {
    let (conn, owner, _list_id) = setup();
    let entries = SqliteEntryRepository::try_new(&conn).unwrap();
    let relation_types = SqliteRelationTypeRepository::try_new(&conn).unwrap();
    let builder = RelationBuilder::new(&entries, &relation_types, owner);

    let declared_for = Uuid::new_v4();
    let spoofed = Uuid::new_v4();
    let relations = [NewTodoEntryRelation {
        todo_entry_id: spoofed,
        related_to_todo_entry_id: Uuid::new_v4(),
        relation_type: "related to".to_string(),
    }];

    let err = builder
        .validate_relations(declared_for, &relations)
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationFailed(_)));
    assert_eq!(err.field_errors().len(), 1);
    assert_eq!(err.field_errors()[0].field, "relations[0]");
    assert!(err.field_errors()[0]
        .message
        .contains(&format!("must be {declared_for}")));
}

#[test]
fn entry_service_requires_migrated_connection() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        EntryService::try_new(&mut conn),
        Err(RepoError::UninitializedConnection { .. })
    ));
}

#[test]
fn repeated_creations_on_one_service_stay_consistent() {
    let (mut conn, owner, list_id) = setup();
    let mut service = EntryService::try_new(&mut conn).unwrap();
    let mut previous = None;
    for index in 0..5 {
        let mut req = request(&format!("step {index}"), 1);
        req.labels = vec!["chain".to_string()];
        if let Some(prev) = previous {
            req.relations = vec![RelationRequest::new(format!("{prev}"), "follows")];
        }
        let entry = service.create_entry(list_id, owner, &req).unwrap();
        assert_eq!(entry.relations.len(), usize::from(previous.is_some()));
        previous = Some(entry.id);
    }
    drop(service);
    assert_eq!(count_rows(&conn, "todo_list_labels"), 1);
    assert_eq!(count_rows(&conn, "todo_entry_relations"), 4);
}
