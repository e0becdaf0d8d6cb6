//! Field-by-field merge of an incoming partial record into an existing book.
//!
//! Every registered field carries a [`SyncAction`]. [`SyncProcessor::filter`]
//! picks the fields worth fetching for a book, [`SyncProcessor::process_one`]
//! merges a fetched record and commits what survives as a delta record.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use libris_core::models::keys;
use libris_core::{Book, BookStore, Field, FieldValue, Locale, Mergeable, SyncConfig, prune};
use tracing::{debug, error, info, warn};

use crate::action::SyncAction;
use crate::covers::CoverStore;
use crate::field::{FieldKind, SyncField};

/// Result of merging one book.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Nothing survived filtering; no write was attempted.
    Unchanged,
    /// The delta record that was written.
    Committed(Book),
    /// The write failed and was logged.
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub committed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub cancelled: bool,
}

pub struct SyncProcessor {
    locale: Locale,
    fields: Vec<SyncField>,
    covers: Option<Arc<dyn CoverStore>>,
}

impl SyncProcessor {
    pub fn builder(locale: Locale) -> SyncProcessorBuilder {
        SyncProcessorBuilder {
            locale,
            fields: Vec::new(),
            covers: None,
        }
    }

    /// Builder pre-loaded with every book field that can be synced.
    pub fn defaults(locale: Locale) -> SyncProcessorBuilder {
        Self::builder(locale)
            .add_list("Authors", keys::AUTHORS, SyncAction::Append)
            .add_list("Series", keys::SERIES, SyncAction::Append)
            .add_list("Publishers", keys::PUBLISHERS, SyncAction::Append)
            .add_list("Table of contents", keys::TOC, SyncAction::Append)
            .add_cover("Front cover", 0, SyncAction::CopyIfBlank)
            .add_cover("Back cover", 1, SyncAction::CopyIfBlank)
            .add("Title", keys::TITLE, SyncAction::CopyIfBlank)
            .add("Original title", keys::ORIGINAL_TITLE, SyncAction::CopyIfBlank)
            .add("ISBN", keys::ISBN, SyncAction::CopyIfBlank)
            .add_appendable("Language", keys::LANGUAGE, SyncAction::CopyIfBlank)
            .add_appendable("Description", keys::DESCRIPTION, SyncAction::CopyIfBlank)
            .add("Date published", keys::DATE_PUBLISHED, SyncAction::CopyIfBlank)
            .add("First publication", keys::FIRST_PUBLICATION, SyncAction::CopyIfBlank)
            .add("Pages", keys::PAGES, SyncAction::CopyIfBlank)
            .add("Format", keys::FORMAT, SyncAction::CopyIfBlank)
            .add("Genre", keys::GENRE, SyncAction::CopyIfBlank)
            .add("Edition", keys::EDITION, SyncAction::CopyIfBlank)
            .add("List price", keys::PRICE_LISTED, SyncAction::CopyIfBlank)
            .add_related_field(keys::PRICE_LISTED, keys::PRICE_LISTED_CURRENCY)
            .add("Rating", keys::RATING, SyncAction::Skip)
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Registered fields, in registration order.
    pub fn fields(&self) -> &[SyncField] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&SyncField> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Returns `false` for an unknown key.
    pub fn set_action(&mut self, key: &str, action: SyncAction) -> bool {
        match self.fields.iter_mut().find(|field| field.key == key) {
            Some(field) => {
                field.set_action(action);
                true
            }
            None => false,
        }
    }

    /// Sets every field; fields that cannot append get `CopyIfBlank` instead
    /// of `Append`.
    pub fn set_all(&mut self, action: SyncAction) {
        for field in &mut self.fields {
            field.set_action(action);
        }
    }

    pub fn reset_to_defaults(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
    }

    /// Current actions as a `{key: action}` map.
    pub fn preferences(&self) -> BTreeMap<String, SyncAction> {
        self.fields
            .iter()
            .map(|field| (field.key.clone(), field.action()))
            .collect()
    }

    /// Restores actions saved with [`preferences`](Self::preferences).
    /// Keys that are not registered are ignored.
    pub fn apply_preferences(&mut self, preferences: &BTreeMap<String, SyncAction>) {
        for (key, action) in preferences {
            if !self.set_action(key, *action) {
                debug!(key, "ignoring preference for unregistered field");
            }
        }
    }

    /// Restores actions from the `[sync]` section of the configuration.
    pub fn apply_config(&mut self, config: &SyncConfig) {
        let mut preferences = BTreeMap::new();
        for (key, raw) in &config.actions {
            match raw.parse::<SyncAction>() {
                Ok(action) => {
                    preferences.insert(key.clone(), action);
                }
                Err(err) => warn!(key, error = %err, "invalid sync action in config"),
            }
        }
        self.apply_preferences(&preferences);
    }

    pub fn to_config(&self) -> SyncConfig {
        SyncConfig {
            actions: self
                .preferences()
                .into_iter()
                .map(|(key, action)| (key, action.to_string()))
                .collect(),
        }
    }

    /// Fields to request for `existing`.
    ///
    /// `Skip` fields are left out, `CopyIfBlank` fields only when the book has
    /// no value yet. Related fields ride along with their primary field.
    /// Covers are only requested when a cover store is configured.
    pub fn filter(&self, existing: &Book) -> BTreeMap<String, SyncField> {
        let mut needed = BTreeMap::new();
        for field in &self.fields {
            if field.is_cover() && self.covers.is_none() {
                continue;
            }
            let wanted = match field.action() {
                SyncAction::Skip => false,
                SyncAction::CopyIfBlank => self.is_blank(existing, field),
                SyncAction::Append | SyncAction::Overwrite => true,
            };
            if !wanted {
                continue;
            }
            for related in &field.related {
                needed.insert(related.clone(), field.related_as(related));
            }
            needed.insert(field.key.clone(), field.clone());
        }
        needed
    }

    /// Merges `incoming` into `existing` for every field in both `incoming`
    /// and `needed`, then commits the surviving fields through `store`.
    ///
    /// Cover images are moved into the cover store and never part of the
    /// delta. A failed commit is logged, not returned.
    pub fn process_one<S>(
        &self,
        store: &S,
        book_id: i64,
        existing: &Book,
        needed: &BTreeMap<String, SyncField>,
        mut incoming: Book,
    ) -> ProcessOutcome
    where
        S: BookStore + ?Sized,
    {
        let mut delta = Book::new(book_id);

        for (key, field) in needed {
            let Some(value) = incoming.take(key) else {
                continue;
            };

            if let FieldKind::Cover { index } = field.kind {
                self.store_cover(book_id, index, field.action(), &value);
                continue;
            }

            let merged = match field.action() {
                SyncAction::Skip => None,
                SyncAction::CopyIfBlank => {
                    (existing.is_blank(key) && !value.is_blank()).then_some(value)
                }
                SyncAction::Append => self.append(key, field, existing, value),
                SyncAction::Overwrite => Some(value),
            };

            if let Some(merged) = merged {
                delta.put(key, merged);
            }
        }

        if delta.is_empty() {
            debug!(book_id, "no fields to commit");
            return ProcessOutcome::Unchanged;
        }

        match store.update_book(&delta, &self.locale) {
            Ok(()) => {
                info!(book_id, fields = ?delta.keys(), "merged incoming fields");
                ProcessOutcome::Committed(delta)
            }
            Err(err) => {
                error!(book_id, error = %err, "failed to commit merged fields");
                ProcessOutcome::Failed
            }
        }
    }

    /// Merges a batch of incoming records, each addressed by its `id`.
    ///
    /// `cancel` is checked before every book. A book that cannot be loaded or
    /// committed is counted as failed and the batch carries on.
    pub fn process_batch<S, I>(&self, store: &S, items: I, cancel: &AtomicBool) -> BatchReport
    where
        S: BookStore + ?Sized,
        I: IntoIterator<Item = Book>,
    {
        let mut report = BatchReport::default();

        for incoming in items {
            if cancel.load(Ordering::Relaxed) {
                info!("sync batch cancelled");
                report.cancelled = true;
                break;
            }

            let book_id = incoming.id;
            let existing = match store.get_book(book_id) {
                Ok(book) => book,
                Err(err) => {
                    error!(book_id, error = %err, "failed to load book for sync");
                    report.failed += 1;
                    continue;
                }
            };

            let needed = self.filter(&existing);
            match self.process_one(store, book_id, &existing, &needed, incoming) {
                ProcessOutcome::Committed(_) => report.committed += 1,
                ProcessOutcome::Unchanged => report.unchanged += 1,
                ProcessOutcome::Failed => report.failed += 1,
            }
        }

        report
    }

    fn is_blank(&self, existing: &Book, field: &SyncField) -> bool {
        match field.kind {
            FieldKind::Cover { index } => self
                .covers
                .as_ref()
                .is_some_and(|covers| covers.is_blank(existing.id, index)),
            _ => existing.is_blank(&field.key),
        }
    }

    fn append(&self, key: &str, field: &SyncField, existing: &Book, incoming: Field) -> Option<Field> {
        if key == keys::LANGUAGE {
            // A blank language never erases a known one.
            if incoming.is_blank() {
                return existing
                    .value(key)
                    .filter(|value| !value.is_blank())
                    .cloned()
                    .map(Field::Value);
            }
            return Some(incoming);
        }

        if incoming.is_blank() {
            return None;
        }

        let merged = match incoming {
            Field::Authors(list) => Field::Authors(self.merge_list(existing.authors.as_deref(), list)),
            Field::Series(list) => Field::Series(self.merge_list(existing.series.as_deref(), list)),
            Field::Publishers(list) => {
                Field::Publishers(self.merge_list(existing.publishers.as_deref(), list))
            }
            Field::Toc(list) => Field::Toc(self.merge_list(existing.toc.as_deref(), list)),
            Field::Value(FieldValue::Text(text)) if field.kind == FieldKind::Text => {
                let current = existing.text(key).map(str::trim).unwrap_or_default();
                if current.is_empty() {
                    Field::Value(FieldValue::Text(text))
                } else if current.contains(text.trim()) {
                    return None;
                } else {
                    Field::Value(FieldValue::Text(format!("{current}\n\n{}", text.trim())))
                }
            }
            other => other,
        };
        Some(merged)
    }

    /// Existing entries, then incoming ones, de-duplicated.
    fn merge_list<T: Mergeable + Clone>(&self, existing: Option<&[T]>, incoming: Vec<T>) -> Vec<T> {
        let mut combined = existing.map(<[T]>::to_vec).unwrap_or_default();
        combined.extend(incoming);
        prune(&mut combined, &self.locale);
        combined
    }

    fn store_cover(&self, book_id: i64, index: usize, action: SyncAction, value: &Field) {
        let overwrite = match action {
            SyncAction::CopyIfBlank => false,
            SyncAction::Overwrite => true,
            SyncAction::Skip | SyncAction::Append => return,
        };
        let Field::Value(FieldValue::Text(temp)) = value else {
            warn!(book_id, index, "cover value is not a file path");
            return;
        };
        let Some(covers) = &self.covers else {
            warn!(book_id, index, "no cover store configured, dropping cover");
            return;
        };
        if let Err(err) = covers.persist(book_id, index, Path::new(temp), overwrite) {
            error!(book_id, index, error = %err, "failed to store cover");
        }
    }
}

pub struct SyncProcessorBuilder {
    locale: Locale,
    fields: Vec<SyncField>,
    covers: Option<Arc<dyn CoverStore>>,
}

impl SyncProcessorBuilder {
    /// Registers a plain scalar field.
    pub fn add(self, label: &str, key: &str, default_action: SyncAction) -> Self {
        self.register(SyncField::new(label, key, FieldKind::Value, default_action))
    }

    /// Registers a text field whose incoming value can be appended.
    pub fn add_appendable(self, label: &str, key: &str, default_action: SyncAction) -> Self {
        self.register(SyncField::new(label, key, FieldKind::Text, default_action))
    }

    pub fn add_list(self, label: &str, key: &str, default_action: SyncAction) -> Self {
        self.register(SyncField::new(label, key, FieldKind::List, default_action))
    }

    /// Registers cover slot `index` (0 = front, 1 = back).
    pub fn add_cover(self, label: &str, index: usize, default_action: SyncAction) -> Self {
        let Some(key) = keys::cover(index) else {
            warn!(index, "no such cover slot");
            return self;
        };
        self.register(SyncField::new(label, key, FieldKind::Cover { index }, default_action))
    }

    /// Makes `related` travel with the already registered `primary` field.
    pub fn add_related_field(mut self, primary: &str, related: &str) -> Self {
        match self.fields.iter_mut().find(|field| field.key == primary) {
            Some(field) => {
                if !field.related.iter().any(|key| key == related) {
                    field.related.push(related.to_string());
                }
            }
            None => warn!(primary, related, "related field added before its primary field"),
        }
        self
    }

    pub fn with_covers(mut self, covers: impl CoverStore + 'static) -> Self {
        self.covers = Some(Arc::new(covers));
        self
    }

    pub fn build(self) -> SyncProcessor {
        SyncProcessor {
            locale: self.locale,
            fields: self.fields,
            covers: self.covers,
        }
    }

    fn register(mut self, field: SyncField) -> Self {
        match self.fields.iter_mut().find(|existing| existing.key == field.key) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use libris_core::{AppConfig, Author, Database, LibrisError, Publisher, TocEntry};
    use tempfile::TempDir;

    use super::*;
    use crate::covers::CoverDirectory;

    /// Book store kept in memory; update fails for ids in `broken`.
    #[derive(Default)]
    struct MemoryStore {
        books: Mutex<BTreeMap<i64, Book>>,
        broken: Vec<i64>,
    }

    impl MemoryStore {
        fn with(books: Vec<Book>) -> Self {
            Self {
                books: Mutex::new(books.into_iter().map(|book| (book.id, book)).collect()),
                broken: Vec::new(),
            }
        }

        fn book(&self, id: i64) -> Book {
            self.books.lock().unwrap()[&id].clone()
        }
    }

    impl BookStore for MemoryStore {
        fn get_book(&self, id: i64) -> libris_core::Result<Book> {
            self.books
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(LibrisError::BookNotFound(id))
        }

        fn insert_book(&self, book: &Book, _locale: &Locale) -> libris_core::Result<i64> {
            let mut books = self.books.lock().unwrap();
            let id = books.keys().max().copied().unwrap_or(0) + 1;
            books.insert(id, Book { id, ..book.clone() });
            Ok(id)
        }

        fn update_book(&self, delta: &Book, _locale: &Locale) -> libris_core::Result<()> {
            if self.broken.contains(&delta.id) {
                return Err(LibrisError::ValidationError("disk full".into()));
            }
            let mut books = self.books.lock().unwrap();
            let book = books
                .get_mut(&delta.id)
                .ok_or(LibrisError::BookNotFound(delta.id))?;
            let mut delta = delta.clone();
            for key in delta.keys() {
                if let Some(field) = delta.take(&key) {
                    book.put(&key, field);
                }
            }
            Ok(())
        }
    }

    fn en() -> Locale {
        Locale::default()
    }

    fn processor() -> SyncProcessor {
        SyncProcessor::defaults(en()).build()
    }

    #[test]
    fn copy_if_blank_authors_excluded_when_book_has_authors() {
        let mut sync = processor();
        sync.set_action(keys::AUTHORS, SyncAction::CopyIfBlank);

        let existing = Book::new(1).with_authors(vec![Author::new("Herbert", "Frank")]);
        let needed = sync.filter(&existing);
        assert!(!needed.contains_key(keys::AUTHORS));

        let empty = Book::new(2).with_authors(vec![]);
        assert!(sync.filter(&empty).contains_key(keys::AUTHORS));
    }

    #[test]
    fn filter_follows_actions() {
        let mut sync = processor();
        sync.set_action(keys::TITLE, SyncAction::Overwrite);
        sync.set_action(keys::ISBN, SyncAction::Skip);

        let existing = Book::new(1)
            .with_value(keys::TITLE, "Dune")
            .with_value(keys::ISBN, "")
            .with_value(keys::PAGES, 412);
        let needed = sync.filter(&existing);

        assert!(needed.contains_key(keys::TITLE));
        assert!(!needed.contains_key(keys::ISBN));
        assert!(!needed.contains_key(keys::PAGES));
        assert!(needed.contains_key(keys::GENRE));
        assert!(needed.contains_key(keys::AUTHORS));
        assert!(!needed.contains_key(keys::RATING));
    }

    #[test]
    fn related_field_travels_with_primary() {
        let sync = processor();
        let needed = sync.filter(&Book::new(1));
        let currency = &needed[keys::PRICE_LISTED_CURRENCY];
        assert_eq!(currency.action(), SyncAction::CopyIfBlank);

        let priced = Book::new(1).with_value(keys::PRICE_LISTED, 9.99);
        assert!(!sync.filter(&priced).contains_key(keys::PRICE_LISTED_CURRENCY));
    }

    #[test]
    fn append_puts_existing_authors_first() {
        let y = Author::new("Pohl", "Frederik").with_id(3);
        let store = MemoryStore::with(vec![Book::new(1).with_authors(vec![y.clone()])]);
        let sync = processor();

        let existing = store.book(1);
        let needed = sync.filter(&existing);
        let incoming = Book::new(0).with_authors(vec![Author::new("Kornbluth", "Cyril M.")]);
        let outcome = sync.process_one(&store, 1, &existing, &needed, incoming);

        let ProcessOutcome::Committed(delta) = outcome else {
            panic!("expected a commit");
        };
        let authors = delta.authors.unwrap();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0], y);
        assert_eq!(authors[1].family_name, "Kornbluth");
        assert_eq!(store.book(1).authors.unwrap().len(), 2);
    }

    #[test]
    fn append_prunes_duplicates_across_sources() {
        let existing = Book::new(1).with_publishers(vec![Publisher::new("Gnome Press").with_id(8)]);
        let store = MemoryStore::with(vec![existing.clone()]);
        let sync = processor();
        let needed = sync.filter(&existing);

        let incoming = Book::new(0).with_publishers(vec![
            Publisher::new("GNOME PRESS"),
            Publisher::new("Doubleday"),
        ]);
        let ProcessOutcome::Committed(delta) = sync.process_one(&store, 1, &existing, &needed, incoming)
        else {
            panic!("expected a commit");
        };
        let publishers = delta.publishers.unwrap();
        assert_eq!(publishers.len(), 2);
        assert_eq!(publishers[0].id, 8);
        assert_eq!(publishers[1].name, "Doubleday");
    }

    #[test]
    fn copy_if_blank_drops_values_the_book_already_has() {
        let existing = Book::new(1).with_value(keys::TITLE, "Dune");
        let store = MemoryStore::with(vec![existing.clone()]);
        let sync = processor();

        // Asking for the field anyway must not replace the title.
        let needed: BTreeMap<_, _> = sync
            .fields()
            .iter()
            .filter(|field| field.key == keys::TITLE || field.key == keys::PAGES)
            .map(|field| (field.key.clone(), field.clone()))
            .collect();
        let incoming = Book::new(0)
            .with_value(keys::TITLE, "Dune Messiah")
            .with_value(keys::PAGES, 412);

        let ProcessOutcome::Committed(delta) = sync.process_one(&store, 1, &existing, &needed, incoming)
        else {
            panic!("expected a commit");
        };
        assert!(!delta.contains(keys::TITLE));
        assert_eq!(delta.value(keys::PAGES), Some(&FieldValue::Integer(412)));
        assert_eq!(store.book(1).text(keys::TITLE), Some("Dune"));
    }

    #[test]
    fn overwrite_replaces_wholesale() {
        let existing = Book::new(1)
            .with_value(keys::TITLE, "Dune")
            .with_authors(vec![Author::new("Herbert", "Frank")]);
        let store = MemoryStore::with(vec![existing.clone()]);
        let mut sync = processor();
        sync.set_action(keys::TITLE, SyncAction::Overwrite);
        sync.set_action(keys::AUTHORS, SyncAction::Overwrite);

        let needed = sync.filter(&existing);
        let incoming = Book::new(0)
            .with_value(keys::TITLE, "Dune (Deluxe Edition)")
            .with_authors(vec![Author::new("Herbert", "Brian")]);
        sync.process_one(&store, 1, &existing, &needed, incoming);

        let stored = store.book(1);
        assert_eq!(stored.text(keys::TITLE), Some("Dune (Deluxe Edition)"));
        assert_eq!(stored.authors.unwrap()[0].given_names, "Brian");
    }

    #[test]
    fn blank_language_never_erases_under_append() {
        let existing = Book::new(1).with_value(keys::LANGUAGE, "de");
        let store = MemoryStore::with(vec![existing.clone()]);
        let mut sync = processor();
        sync.set_action(keys::LANGUAGE, SyncAction::Append);

        let needed = sync.filter(&existing);
        let incoming = Book::new(0).with_value(keys::LANGUAGE, "");
        let ProcessOutcome::Committed(delta) = sync.process_one(&store, 1, &existing, &needed, incoming)
        else {
            panic!("expected a commit");
        };
        assert_eq!(delta.text(keys::LANGUAGE), Some("de"));
        assert_eq!(store.book(1).text(keys::LANGUAGE), Some("de"));

        let incoming = Book::new(0).with_value(keys::LANGUAGE, "en");
        sync.process_one(&store, 1, &existing, &needed, incoming);
        assert_eq!(store.book(1).text(keys::LANGUAGE), Some("en"));
    }

    #[test]
    fn appendable_text_is_joined_once() {
        let existing = Book::new(1).with_value(keys::DESCRIPTION, "A desert planet.");
        let store = MemoryStore::with(vec![existing.clone()]);
        let mut sync = processor();
        sync.set_action(keys::DESCRIPTION, SyncAction::Append);
        let needed = sync.filter(&existing);

        let incoming = Book::new(0).with_value(keys::DESCRIPTION, "Winner of the Hugo award.");
        sync.process_one(&store, 1, &existing, &needed, incoming);
        assert_eq!(
            store.book(1).text(keys::DESCRIPTION),
            Some("A desert planet.\n\nWinner of the Hugo award.")
        );

        let repeated = Book::new(0).with_value(keys::DESCRIPTION, "A desert planet.");
        let outcome = sync.process_one(&store, 1, &existing, &needed, repeated);
        assert_eq!(outcome, ProcessOutcome::Unchanged);
    }

    #[test]
    fn fields_missing_from_incoming_are_left_alone() {
        let existing = Book::new(1);
        let store = MemoryStore::with(vec![existing.clone()]);
        let sync = processor();
        let needed = sync.filter(&existing);

        let incoming = Book::new(0).with_value(keys::RATING, 4.5);
        let outcome = sync.process_one(&store, 1, &existing, &needed, incoming);
        assert_eq!(outcome, ProcessOutcome::Unchanged);
    }

    #[test]
    fn commit_failure_is_swallowed() {
        let mut store = MemoryStore::with(vec![Book::new(1), Book::new(2)]);
        store.broken.push(1);
        let sync = processor();

        let existing = store.book(1);
        let needed = sync.filter(&existing);
        let incoming = Book::new(0).with_value(keys::TITLE, "Solaris");
        assert_eq!(
            sync.process_one(&store, 1, &existing, &needed, incoming),
            ProcessOutcome::Failed
        );

        let batch = vec![
            Book::new(1).with_value(keys::TITLE, "Solaris"),
            Book::new(2).with_value(keys::TITLE, "Fiasco"),
            Book::new(99).with_value(keys::TITLE, "Eden"),
        ];
        let report = sync.process_batch(&store, batch, &AtomicBool::new(false));
        assert_eq!(report.committed, 1);
        assert_eq!(report.failed, 2);
        assert!(!report.cancelled);
        assert_eq!(store.book(2).text(keys::TITLE), Some("Fiasco"));
    }

    #[test]
    fn cancelled_batch_stops_before_next_book() {
        let store = MemoryStore::with(vec![Book::new(1)]);
        let sync = processor();
        let cancel = AtomicBool::new(true);

        let report = sync.process_batch(&store, vec![Book::new(1).with_value(keys::TITLE, "Ubik")], &cancel);
        assert!(report.cancelled);
        assert_eq!(report.committed, 0);
        assert!(store.book(1).is_blank(keys::TITLE));
    }

    #[test]
    fn overwrite_preference_round_trips_through_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut sync = processor();
        sync.set_action(keys::ISBN, SyncAction::Overwrite);
        let mut config = AppConfig::default();
        config.sync = sync.to_config();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        let mut restored = processor();
        restored.apply_config(&loaded.sync);
        assert_eq!(restored.field(keys::ISBN).unwrap().action(), SyncAction::Overwrite);
        assert_eq!(restored.preferences(), sync.preferences());
    }

    #[test]
    fn preferences_skip_unknown_keys_and_bad_values() {
        let mut sync = processor();
        let mut config = SyncConfig::default();
        config.actions.insert("no_such_field".into(), "overwrite".into());
        config.actions.insert(keys::GENRE.into(), "sometimes".into());
        config.actions.insert(keys::TITLE.into(), "skip".into());
        sync.apply_config(&config);

        assert_eq!(sync.field(keys::GENRE).unwrap().action(), SyncAction::CopyIfBlank);
        assert_eq!(sync.field(keys::TITLE).unwrap().action(), SyncAction::Skip);
    }

    #[test]
    fn set_all_clamps_append_and_reset_restores() {
        let mut sync = processor();
        sync.set_all(SyncAction::Append);
        assert_eq!(sync.field(keys::AUTHORS).unwrap().action(), SyncAction::Append);
        assert_eq!(sync.field(keys::DESCRIPTION).unwrap().action(), SyncAction::Append);
        assert_eq!(sync.field(keys::ISBN).unwrap().action(), SyncAction::CopyIfBlank);
        assert_eq!(sync.field(keys::COVER_FRONT).unwrap().action(), SyncAction::CopyIfBlank);

        sync.reset_to_defaults();
        assert_eq!(sync.field(keys::RATING).unwrap().action(), SyncAction::Skip);
        assert_eq!(sync.field(keys::AUTHORS).unwrap().action(), SyncAction::Append);
    }

    #[test]
    fn covers_move_into_place_and_stay_out_of_the_delta() {
        let dir = TempDir::new().unwrap();
        let covers = CoverDirectory::new(dir.path().join("covers"));
        let sync = SyncProcessor::defaults(en()).with_covers(covers.clone()).build();
        let store = MemoryStore::with(vec![Book::new(5)]);

        let existing = store.book(5);
        let needed = sync.filter(&existing);
        assert!(needed.contains_key(keys::COVER_FRONT));

        let temp = dir.path().join("download.jpg");
        fs::write(&temp, b"jpeg").unwrap();
        let incoming = Book::new(0).with_value(keys::COVER_FRONT, temp.to_string_lossy().to_string());
        let outcome = sync.process_one(&store, 5, &existing, &needed, incoming);

        assert_eq!(outcome, ProcessOutcome::Unchanged);
        assert!(!temp.exists());
        assert_eq!(fs::read(covers.path_for(5, 0)).unwrap(), b"jpeg");
        assert!(!sync.filter(&existing).contains_key(keys::COVER_FRONT));
    }

    #[test]
    fn covers_are_not_requested_without_a_cover_store() {
        let mut sync = processor();
        sync.set_action(keys::COVER_BACK, SyncAction::Overwrite);
        let needed = sync.filter(&Book::new(5));
        assert!(!needed.contains_key(keys::COVER_FRONT));
        assert!(!needed.contains_key(keys::COVER_BACK));
        assert!(needed.contains_key(keys::TITLE));

        let dir = TempDir::new().unwrap();
        let with_store = SyncProcessor::defaults(en())
            .add_cover("Back cover", 1, SyncAction::Overwrite)
            .with_covers(CoverDirectory::new(dir.path()))
            .build();
        let needed = with_store.filter(&Book::new(5));
        assert!(needed.contains_key(keys::COVER_FRONT));
        assert_eq!(needed[keys::COVER_BACK].action(), SyncAction::Overwrite);
    }

    #[test]
    fn toc_merge_keeps_pen_name_links() {
        let db = Database::open_in_memory().unwrap();
        let mut french = Author::new("French", "Paul").with_real_author(&Author::new("Asimov", "Isaac"));
        french.complete = true;
        let id = db
            .insert_book(&Book::new(0).with_authors(vec![french]), &en())
            .unwrap();
        let sync = processor();

        let existing = db.get_book(id).unwrap();
        let needed = sync.filter(&existing);
        let incoming = Book::new(0).with_toc(vec![TocEntry::new(
            Author::new("French", "Paul"),
            "David Starr, Space Ranger",
        )]);
        let ProcessOutcome::Committed(delta) = sync.process_one(&db, id, &existing, &needed, incoming)
        else {
            panic!("expected a commit");
        };
        assert_eq!(delta.keys(), vec![keys::TOC.to_string()]);

        let authors = db.get_book(id).unwrap().authors.unwrap();
        assert!(authors[0].complete);
        assert_eq!(authors[0].real_author.as_ref().unwrap().family_name, "Asimov");
    }

    #[test]
    fn end_to_end_with_sqlite_store() {
        let db = Database::open_in_memory().unwrap();
        let asimov = Author::new("Asimov", "Isaac");
        let id = db
            .insert_book(&Book::new(0).with_authors(vec![asimov.clone()]), &en())
            .unwrap();
        let sync = processor();

        let existing = db.get_book(id).unwrap();
        let needed = sync.filter(&existing);
        let incoming = Book::new(0)
            .with_value(keys::TITLE, "I, Robot")
            .with_authors(vec![Author::new("ASIMOV", "Isaac"), Author::new("French", "Paul")]);
        sync.process_one(&db, id, &existing, &needed, incoming);

        let stored = db.get_book(id).unwrap();
        assert_eq!(stored.text(keys::TITLE), Some("I, Robot"));
        let authors = stored.authors.unwrap();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].id, existing.authors.unwrap()[0].id);
        assert_eq!(authors[1].family_name, "French");
    }
}
