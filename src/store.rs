use log::{debug, info, warn};
use serde_json::Value;

use crate::backend::Backend;
use crate::model::{self, AccountRecord, ErrorField, Label, RecordType};
use crate::observable::{Observable, SubscriptionId};
use crate::storage::{StorageAdapter, Stored};

pub const ACCOUNT_DATA_KEY: &str = "accountData";

/// Owns the account list and keeps it in step with storage.
///
/// Additions and edits stay in memory until [`AccountStore::save_record`];
/// removals persist immediately.
#[derive(Debug)]
pub struct AccountStore<B> {
    storage: StorageAdapter<B>,
    account_data: Observable<Vec<AccountRecord>>,
    record_options: Vec<RecordType>,
}

impl<B: Backend> AccountStore<B> {
    pub fn new(storage: StorageAdapter<B>) -> Self {
        let account_data = match storage.read::<Vec<Value>>(ACCOUNT_DATA_KEY) {
            Some(Stored::Parsed(entries)) => {
                let records = hydrate(entries);
                info!("Loaded {} account records", records.len());
                records
            }
            Some(Stored::Raw(raw)) => {
                warn!("Ignoring non-array account data ({} bytes), starting empty", raw.len());
                vec![]
            }
            None => vec![],
        };
        AccountStore {
            storage,
            account_data: Observable::new(account_data),
            record_options: RecordType::ALL.to_vec(),
        }
    }

    pub fn account_data(&self) -> &[AccountRecord] {
        self.account_data.get()
    }

    pub fn record_options(&self) -> &[RecordType] {
        &self.record_options
    }

    pub fn record(&self, index: usize) -> Option<&AccountRecord> {
        self.account_data.get().get(index)
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&Vec<AccountRecord>) + 'static,
    {
        self.account_data.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.account_data.unsubscribe(id)
    }

    pub fn add_record(&mut self) {
        self.account_data.update(|records| records.push(AccountRecord::default()));
        debug!("Added record, {} in total", self.account_data.get().len());
    }

    /// Out of range indices leave the list alone, storage is rewritten either way.
    pub fn remove_record(&mut self, index: usize) {
        if index < self.account_data.get().len() {
            self.account_data.update(|records| records.remove(index));
            debug!("Removed record {}", index);
        } else {
            debug!("No record at {}, nothing removed", index);
        }
        self.save_record();
    }

    /// Persists the whole list. Labels are re-derived from their raw text
    /// first, so nothing is stored with the two out of step.
    pub fn save_record(&mut self) {
        if self.account_data.get().iter().any(|r| !r.labels_in_sync()) {
            self.account_data
                .update(|records| records.iter_mut().for_each(AccountRecord::sync_labels));
        }
        if !self.storage.write(ACCOUNT_DATA_KEY, self.account_data.get()) {
            warn!("Account data kept in memory only, storage write failed");
        }
    }

    pub fn parse_label(raw: &str) -> Vec<Label> {
        model::parse_label(raw)
    }

    /// Edits a record in place. Returns `false` if there is no record at `index`.
    pub fn update_record<F: FnOnce(&mut AccountRecord)>(&mut self, index: usize, f: F) -> bool {
        if index >= self.account_data.get().len() {
            return false;
        }
        self.account_data.update(|records| f(&mut records[index]));
        true
    }

    pub fn set_label_raw(&mut self, index: usize, raw: &str) -> bool {
        self.update_record(index, |record| {
            record.label_raw = raw.to_owned();
            record.label = model::parse_label(raw);
        })
    }

    pub fn set_error(&mut self, index: usize, field: ErrorField, has_error: bool) -> bool {
        self.update_record(index, |record| record.errors.set(field, has_error))
    }

    pub fn clear_errors(&mut self, index: usize) -> bool {
        self.update_record(index, |record| record.errors.reset())
    }

    pub fn storage(&self) -> &StorageAdapter<B> {
        &self.storage
    }

    pub fn into_storage(self) -> StorageAdapter<B> {
        self.storage
    }
}

// Entries that are not records are dropped one by one, the rest are kept
fn hydrate(entries: Vec<Value>) -> Vec<AccountRecord> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value::<AccountRecord>(entry) {
            Ok(mut record) => {
                record.sync_labels();
                Some(record)
            }
            Err(e) => {
                warn!("Skipping stored account record {}: {}", i, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn record(
        label_raw: &str,
        record_type: RecordType,
        login: &str,
        password: Option<&str>,
    ) -> AccountRecord {
        AccountRecord {
            label_raw: label_raw.to_owned(),
            label: model::parse_label(label_raw),
            record_type,
            login: login.to_owned(),
            password: password.map(str::to_owned),
            ..AccountRecord::default()
        }
    }

    fn seeded_store(records: &[AccountRecord]) -> AccountStore<MemoryBackend> {
        let mut storage = StorageAdapter::new(MemoryBackend::new());
        assert!(storage.write(ACCOUNT_DATA_KEY, records));
        AccountStore::new(storage)
    }

    fn persisted(store: &AccountStore<MemoryBackend>) -> Option<String> {
        store.storage().backend().get_item(ACCOUNT_DATA_KEY).unwrap()
    }

    #[test]
    fn hydrates_from_storage() {
        let records = vec![
            record("a;b", RecordType::Local, "admin", Some("secret")),
            record("", RecordType::Ldap, "jdoe", None),
        ];
        let store = seeded_store(&records);
        assert_eq!(store.account_data(), records.as_slice());
    }

    #[test]
    fn starts_empty_without_stored_data() {
        let store = AccountStore::new(StorageAdapter::new(MemoryBackend::new()));
        assert!(store.account_data().is_empty());
        assert_eq!(store.record_options(), &[RecordType::Local, RecordType::Ldap]);
    }

    #[test]
    fn starts_empty_on_corrupt_or_non_array_data() {
        for stored in &["not json at all", "{\"label\": []}", "42", "null", "[1, 2]"] {
            let mut backend = MemoryBackend::new();
            backend.set_item(ACCOUNT_DATA_KEY, stored).unwrap();
            let store = AccountStore::new(StorageAdapter::new(backend));
            assert!(store.account_data().is_empty(), "for {}", stored);
        }
    }

    #[test]
    fn malformed_entry_does_not_drop_the_others() {
        let mut storage = StorageAdapter::new(MemoryBackend::new());
        assert!(storage.write(ACCOUNT_DATA_KEY, &json!([
            {"labelRaw": "", "label": [], "type": "Local", "login": "keep-me", "password": null, "errors": {}},
            {"type": "ldap", "login": "x"},
            {"type": "LDAP", "login": "also-kept"}
        ])));
        let mut store = AccountStore::new(storage);
        let logins: Vec<&str> = store.account_data().iter().map(|r| r.login.as_str()).collect();
        assert_eq!(logins, vec!["keep-me", "also-kept"]);

        store.remove_record(99);
        let reloaded = AccountStore::new(store.into_storage());
        assert_eq!(reloaded.account_data().len(), 2);
        assert_eq!(reloaded.record(0).map(|r| r.login.as_str()), Some("keep-me"));
    }

    #[test]
    fn persisted_labels_always_match_raw_text() {
        let mut storage = StorageAdapter::new(MemoryBackend::new());
        assert!(storage.write(ACCOUNT_DATA_KEY, &json!([
            {"label": [{"text": "x"}, {"text": "y"}], "type": "Local", "login": "old", "password": null},
            {"labelRaw": "a;b", "label": [], "type": "Local", "login": "new", "password": null}
        ])));
        let mut store = AccountStore::new(storage);
        store.add_record();
        store.update_record(2, |r| r.label_raw = "edited; mid".to_owned());
        store.save_record();

        let reloaded = AccountStore::new(store.into_storage());
        let records = reloaded.account_data();
        assert_eq!(records.len(), 3);
        for r in records {
            assert_eq!(model::parse_label(&r.label_raw), r.label);
        }
        assert_eq!(records[0].label_raw, "x; y");
        assert_eq!(records[1].label, model::parse_label("a;b"));
        assert_eq!(records[2].label, model::parse_label("edited;mid"));
    }

    #[test]
    fn add_record_appends_empty_local_record_without_persisting() {
        let mut store = AccountStore::new(StorageAdapter::new(MemoryBackend::new()));
        store.add_record();
        assert_eq!(store.account_data(), &[AccountRecord::default()]);
        assert_eq!(store.record(0).map(|r| r.record_type), Some(RecordType::Local));
        assert_eq!(persisted(&store), None);

        store.save_record();
        let reloaded = AccountStore::new(store.into_storage());
        assert_eq!(reloaded.account_data(), &[AccountRecord::default()]);
    }

    #[test]
    fn remove_record_persists_immediately() {
        let records = vec![
            record("one", RecordType::Local, "a", None),
            record("two", RecordType::Local, "b", None),
            record("three", RecordType::Ldap, "c", None),
        ];
        let mut store = seeded_store(&records);
        store.remove_record(1);

        let expected = vec![records[0].clone(), records[2].clone()];
        assert_eq!(store.account_data(), expected.as_slice());
        let reloaded = AccountStore::new(store.into_storage());
        assert_eq!(reloaded.account_data(), expected.as_slice());
    }

    #[test]
    fn remove_out_of_range_is_a_no_op() {
        let records = vec![record("x", RecordType::Local, "a", Some("p"))];
        let mut store = seeded_store(&records);
        let before = persisted(&store);

        store.remove_record(1);
        store.remove_record(usize::MAX);

        assert_eq!(store.account_data(), records.as_slice());
        assert_eq!(persisted(&store), before);
    }

    #[test]
    fn add_then_remove_restores_list() {
        let records = vec![record("x", RecordType::Ldap, "a", None)];
        let mut store = seeded_store(&records);
        store.add_record();
        store.remove_record(records.len());
        assert_eq!(store.account_data(), records.as_slice());
    }

    #[test]
    fn save_is_idempotent() {
        let mut store = seeded_store(&[record("a; b", RecordType::Local, "root", Some("pw"))]);
        store.set_error(0, ErrorField::Password, true);
        store.set_error(0, ErrorField::Label, false);
        store.save_record();
        let first = persisted(&store);
        store.save_record();
        assert_eq!(persisted(&store), first);
        assert!(first.is_some());
    }

    #[test]
    fn failed_save_keeps_memory_state() {
        let mut store = AccountStore::new(StorageAdapter::new(MemoryBackend::with_quota(8)));
        store.add_record();
        store.save_record();
        store.remove_record(5);
        assert_eq!(store.account_data().len(), 1);
        assert_eq!(persisted(&store), None);
    }

    #[test]
    fn set_label_raw_derives_labels() {
        let mut store = AccountStore::new(StorageAdapter::new(MemoryBackend::new()));
        store.add_record();
        assert!(store.set_label_raw(0, " work ;; mail"));
        let record = store.record(0).unwrap();
        assert_eq!(record.label_raw, " work ;; mail");
        assert_eq!(record.label, AccountStore::<MemoryBackend>::parse_label("work;mail"));
        assert!(!store.set_label_raw(3, "x"));
    }

    #[test]
    fn error_bookkeeping_per_record() {
        let mut store = AccountStore::new(StorageAdapter::new(MemoryBackend::new()));
        store.add_record();
        store.add_record();
        assert!(store.set_error(1, ErrorField::Login, true));
        assert!(store.record(1).unwrap().errors.has(ErrorField::Login));
        assert!(!store.record(0).unwrap().errors.has_errors());
        assert!(store.clear_errors(1));
        assert!(!store.record(1).unwrap().errors.has_errors());
        assert!(!store.set_error(2, ErrorField::Type, true));
    }

    #[test]
    fn subscribers_see_mutations() {
        let lengths = Rc::new(RefCell::new(vec![]));
        let mut store = AccountStore::new(StorageAdapter::new(MemoryBackend::new()));
        let seen = Rc::clone(&lengths);
        let id = store.subscribe(move |records| seen.borrow_mut().push(records.len()));

        store.add_record();
        store.add_record();
        store.remove_record(0);
        store.remove_record(7);
        assert!(store.unsubscribe(id));
        store.add_record();

        assert_eq!(*lengths.borrow(), vec![1, 2, 1]);
    }
}
