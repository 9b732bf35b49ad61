use activity_core::{
    table_rows, ActivityFields, Category, KeyValueStorage, LocalRecordStore, RecordId,
    RecordStore, SqliteKeyValueStorage, StoreError,
};

fn fields(name: &str) -> ActivityFields {
    ActivityFields {
        name: name.to_string(),
        description: format!("{name} description"),
        ..ActivityFields::default()
    }
}

fn memory_store() -> LocalRecordStore<SqliteKeyValueStorage> {
    LocalRecordStore::new(SqliteKeyValueStorage::open_in_memory().unwrap())
}

#[test]
fn empty_storage_lists_no_records() {
    let store = memory_store();
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn create_update_delete_roundtrip() {
    let store = memory_store();

    let id = store.create(&fields("Ana")).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].fields.name, "Ana");

    store.update(&id, &fields("Ana Maria")).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].fields.name, "Ana Maria");

    store.delete(&id).unwrap();
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn ids_survive_deleting_an_earlier_record() {
    let store = memory_store();
    let first = store.create(&fields("First")).unwrap();
    let second = store.create(&fields("Second")).unwrap();
    let third = store.create(&fields("Third")).unwrap();

    store.delete(&first).unwrap();
    store.update(&third, &fields("Third edited")).unwrap();

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second);
    assert_eq!(listed[0].fields.name, "Second");
    assert_eq!(listed[1].id, third);
    assert_eq!(listed[1].fields.name, "Third edited");
}

#[test]
fn unknown_ids_return_not_found_without_writing() {
    let store = memory_store();
    store.create(&fields("Ana")).unwrap();
    let missing = RecordId::new("does-not-exist");

    assert!(matches!(
        store.update(&missing, &fields("Ghost")),
        Err(StoreError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        store.delete(&missing),
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn whole_list_is_written_under_one_key() {
    let store = LocalRecordStore::with_key(
        SqliteKeyValueStorage::open_in_memory().unwrap(),
        "club_records",
    );
    store.create(&fields("Ana")).unwrap();
    store.create(&fields("Luis")).unwrap();

    let raw = store.storage().get_item("club_records").unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    assert_eq!(store.storage().get_item("activity_records").unwrap(), None);
}

#[test]
fn records_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");

    let id = {
        let store = LocalRecordStore::new(SqliteKeyValueStorage::open(&path).unwrap());
        store.create(&fields("Persisted")).unwrap()
    };

    let store = LocalRecordStore::new(SqliteKeyValueStorage::open(&path).unwrap());
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].fields.name, "Persisted");
}

#[test]
fn stored_categories_outside_the_known_set_still_load() {
    let storage = SqliteKeyValueStorage::open_in_memory().unwrap();
    storage
        .set_item(
            "activity_records",
            r#"[
                {"id": "a", "name": "Ana", "category": "workshop"},
                {"id": "b", "name": "Luis", "category": "opcion9"},
                {"id": "c", "name": "Rosa", "category": "opcion2"}
            ]"#,
        )
        .unwrap();
    let store = LocalRecordStore::new(storage);

    let listed = store.list().unwrap();
    let categories: Vec<Category> = listed
        .iter()
        .map(|record| record.fields.category.clone())
        .collect();
    assert_eq!(
        categories,
        vec![
            Category::Workshop,
            Category::Unknown("opcion9".to_string()),
            Category::Meeting,
        ]
    );
    let labels: Vec<String> = table_rows(&listed)
        .into_iter()
        .map(|row| row.cells[7].clone())
        .collect();
    assert_eq!(labels, vec!["Workshop", "No category", "Meeting"]);

    // Rewriting the list keeps the unrecognized value as stored.
    store.create(&fields("Marta")).unwrap();
    let raw = store.storage().get_item("activity_records").unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed[1]["category"], "opcion9");
    assert_eq!(parsed[2]["category"], "meeting");
    assert_eq!(store.list().unwrap().len(), 4);
}
