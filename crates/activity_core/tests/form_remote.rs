use activity_core::service::form_controller::MSG_REQUIRED_FIELDS;
use activity_core::{
    table_rows, Document, DocumentClient, DocumentFields, Field, FormController, FormError,
    FormPolicy, RecordStore, RemoteRecordStore, StoreError, StoreResult, SubmitOutcome,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory document collection with a switchable outage.
#[derive(Default)]
struct FakeCollection {
    documents: Mutex<BTreeMap<String, DocumentFields>>,
    next_id: AtomicUsize,
    offline: AtomicBool,
}

impl FakeCollection {
    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

impl DocumentClient for FakeCollection {
    fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        assert_eq!(collection, "activities");
        self.check_online()?;
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }

    fn create_document(&self, _collection: &str, fields: &DocumentFields) -> StoreResult<String> {
        self.check_online()?;
        let id = format!("doc-{:03}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.documents
            .lock()
            .unwrap()
            .insert(id.clone(), fields.clone());
        Ok(id)
    }

    fn update_document(
        &self,
        _collection: &str,
        id: &str,
        fields: &DocumentFields,
    ) -> StoreResult<()> {
        self.check_online()?;
        match self.documents.lock().unwrap().get_mut(id) {
            Some(existing) => {
                *existing = fields.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(activity_core::RecordId::new(id))),
        }
    }

    fn delete_document(&self, _collection: &str, id: &str) -> StoreResult<()> {
        self.check_online()?;
        self.documents.lock().unwrap().remove(id);
        Ok(())
    }
}

type RemoteController = FormController<RemoteRecordStore<Arc<FakeCollection>>>;

fn controller() -> (RemoteController, Arc<FakeCollection>) {
    let collection = Arc::new(FakeCollection::default());
    let store = RemoteRecordStore::new(collection.clone());
    (FormController::new(store, FormPolicy::remote()), collection)
}

fn fill(controller: &mut RemoteController, name: &str) {
    for (field, value) in [
        ("name", name),
        ("birth_date", "1990-02-10"),
        ("email", "contact@example.org"),
        ("phone", "+56 9 1234 5678"),
        ("address", "Av. Central 123"),
        ("activity_date", "2024-08-20"),
        ("category", "project"),
        ("description", "Community garden build"),
    ] {
        controller.change_field(field, value).unwrap();
    }
}

#[test]
fn remote_form_requires_contact_fields() {
    let (mut controller, collection) = controller();
    controller.change_field("name", "Ana").unwrap();
    controller.change_field("activity_date", "2024-08-20").unwrap();
    controller.change_field("description", "Garden").unwrap();

    match controller.submit() {
        Err(FormError::Validation { missing }) => assert_eq!(
            missing,
            vec![Field::BirthDate, Field::Email, Field::Phone, Field::Address]
        ),
        other => panic!("unexpected submit result: {other:?}"),
    }
    assert_eq!(collection.len(), 0);
    assert_eq!(controller.status().unwrap().text, MSG_REQUIRED_FIELDS);
}

#[test]
fn blank_name_is_rejected_before_reaching_collection() {
    let (mut controller, collection) = controller();
    fill(&mut controller, "   ");

    match controller.submit() {
        Err(FormError::Validation { missing }) => assert_eq!(missing, vec![Field::Name]),
        other => panic!("unexpected submit result: {other:?}"),
    }
    assert_eq!(collection.len(), 0);
    assert!(controller.records().is_empty());
}

#[test]
fn unrecognized_category_document_still_lists() {
    let (mut controller, collection) = controller();
    fill(&mut controller, "Ana");
    controller.submit().unwrap();

    let mut odd = collection.documents.lock().unwrap()["doc-000"].clone();
    odd.insert("name".into(), json!({ "stringValue": "Luis" }));
    odd.insert("category".into(), json!({ "stringValue": "opcion9" }));
    collection
        .documents
        .lock()
        .unwrap()
        .insert("doc-legacy".to_string(), odd);

    assert!(controller.refresh());
    let labels: Vec<(String, String)> = table_rows(controller.records())
        .into_iter()
        .map(|row| (row.cells[0].clone(), row.cells[7].clone()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("Ana".to_string(), "Project".to_string()),
            ("Luis".to_string(), "No category".to_string()),
        ]
    );
}

#[test]
fn create_edit_delete_through_documents() {
    let (mut controller, collection) = controller();
    fill(&mut controller, "Ana");
    let created = controller.submit().unwrap();
    assert_eq!(created, SubmitOutcome::Created("doc-000".into()));
    assert_eq!(controller.records().len(), 1);
    assert!(controller.records()[0].fields.age.is_some());

    let record = controller.records()[0].clone();
    controller.begin_edit(&record);
    controller.change_field("phone", "+56 2 2222 2222").unwrap();
    controller.submit().unwrap();
    assert_eq!(collection.len(), 1);
    assert_eq!(controller.records()[0].fields.phone, "+56 2 2222 2222");

    controller.delete(&record.id).unwrap();
    assert_eq!(collection.len(), 0);
    assert!(controller.records().is_empty());
}

#[test]
fn remote_form_allows_repeated_names() {
    let (mut controller, collection) = controller();
    fill(&mut controller, "Ana");
    controller.submit().unwrap();
    fill(&mut controller, "ana");
    controller.submit().unwrap();

    assert_eq!(collection.len(), 2);
    assert_eq!(controller.store().list().unwrap().len(), 2);
}

#[test]
fn store_outage_keeps_draft_and_shows_no_success() {
    let (mut controller, collection) = controller();
    fill(&mut controller, "Ana");
    let draft_before = controller.draft().clone();

    collection.set_offline(true);
    assert!(matches!(
        controller.submit(),
        Err(FormError::Store(StoreError::Transport(_)))
    ));
    assert_eq!(controller.draft(), &draft_before);
    assert!(controller.status().is_none());
    assert!(controller.records().is_empty());

    collection.set_offline(false);
    assert!(controller.submit().is_ok());
    assert_eq!(collection.len(), 1);
}

#[test]
fn failed_refresh_keeps_previous_list() {
    let (mut controller, collection) = controller();
    fill(&mut controller, "Ana");
    controller.submit().unwrap();

    collection.set_offline(true);
    assert!(!controller.refresh());
    assert_eq!(controller.records().len(), 1);
}
