use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use libris_core::{Author, Locale, RealAuthor};
use tracing::{debug, info};

use crate::error::Result;

/// Discovers the real identity behind a pen name.
#[async_trait]
pub trait AuthorResolver: Send + Sync {
    fn name(&self) -> &str;

    /// May set `author.real_author`. Returns whether `author` changed.
    ///
    /// Fails with [`SyncError::Credentials`](crate::SyncError::Credentials) or
    /// [`SyncError::Search`](crate::SyncError::Search); the author is left
    /// untouched in that case.
    async fn resolve(&self, author: &mut Author) -> Result<bool>;
}

/// Pen names looked up in a fixed table, usually the `[pseudonyms]` section
/// of the configuration.
#[derive(Debug, Clone)]
pub struct PseudonymTable {
    locale: Locale,
    entries: HashMap<String, RealAuthor>,
}

impl PseudonymTable {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            entries: HashMap::new(),
        }
    }

    /// Builds the table from `pen name → real name` pairs in either name order.
    pub fn from_names(locale: Locale, names: &BTreeMap<String, String>) -> Self {
        let mut table = Self::new(locale);
        for (pen_name, real_name) in names {
            table.insert(&Author::from_name(pen_name), Author::from_name(real_name));
        }
        table
    }

    pub fn insert(&mut self, pen_name: &Author, real: Author) {
        let key = pen_name.key(&self.locale);
        self.entries.insert(key, RealAuthor::of(&real));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl AuthorResolver for PseudonymTable {
    fn name(&self) -> &str {
        "pseudonym table"
    }

    async fn resolve(&self, author: &mut Author) -> Result<bool> {
        let Some(real) = self.entries.get(&author.key(&self.locale)) else {
            return Ok(false);
        };
        // An author is never its own pen name.
        if real.to_author().key(&self.locale) == author.key(&self.locale) {
            return Ok(false);
        }
        let same_identity = author.real_author.as_ref().is_some_and(|current| {
            current.to_author().key(&self.locale) == real.to_author().key(&self.locale)
        });
        if same_identity {
            return Ok(false);
        }
        debug!(pen_name = %author, real = %real.to_author(), "pen name resolved");
        author.real_author = Some(real.clone());
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Every author was resolved and written back; carries the number changed.
    Completed { modified: usize },
    /// Cancelled between two authors; `authors` is untouched.
    Cancelled,
}

/// Runs `resolver` over `authors`, checking `cancel` before each one.
///
/// Results are written back only once the whole batch has succeeded: a
/// cancellation or a resolver error leaves `authors` as it was.
pub async fn resolve_authors<R>(
    resolver: &R,
    authors: &mut [Author],
    cancel: &AtomicBool,
) -> Result<ResolveOutcome>
where
    R: AuthorResolver + ?Sized,
{
    let mut working = authors.to_vec();
    let mut modified = 0;

    for author in &mut working {
        if cancel.load(Ordering::Relaxed) {
            info!(resolver = resolver.name(), "author resolving cancelled");
            return Ok(ResolveOutcome::Cancelled);
        }
        if resolver.resolve(author).await? {
            modified += 1;
        }
        tokio::task::yield_now().await;
    }

    authors.clone_from_slice(&working);
    Ok(ResolveOutcome::Completed { modified })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::error::SyncError;

    fn table() -> PseudonymTable {
        let mut names = BTreeMap::new();
        names.insert("French, Paul".to_string(), "Asimov, Isaac".to_string());
        names.insert("Richard Bachman".to_string(), "Stephen King".to_string());
        PseudonymTable::from_names(Locale::default(), &names)
    }

    /// Fails on the author named `fail_on`; can cancel after `cancel_after` calls.
    struct ScriptedResolver {
        fail_on: &'static str,
        calls: AtomicUsize,
        cancel_after: Option<(usize, Arc<AtomicBool>)>,
    }

    #[async_trait]
    impl AuthorResolver for ScriptedResolver {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn resolve(&self, author: &mut Author) -> Result<bool> {
            let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((after, cancel)) = &self.cancel_after
                && calls >= *after
            {
                cancel.store(true, Ordering::SeqCst);
            }
            if author.family_name == self.fail_on {
                return Err(SyncError::Credentials("isfdb".into()));
            }
            author.complete = true;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn table_attaches_real_author() {
        let table = table();
        assert_eq!(table.len(), 2);

        let mut french = Author::new("FRENCH", "paul");
        assert!(table.resolve(&mut french).await.unwrap());
        let real = french.real_author.as_ref().unwrap();
        assert_eq!(real.family_name, "Asimov");
        assert_eq!(real.given_names, "Isaac");

        // Second pass changes nothing.
        assert!(!table.resolve(&mut french).await.unwrap());

        let mut bachman = Author::new("Bachman", "Richard");
        assert!(table.resolve(&mut bachman).await.unwrap());
        assert_eq!(bachman.real_author.unwrap().family_name, "King");

        let mut farmer = Author::new("Farmer", "Philip José");
        assert!(!table.resolve(&mut farmer).await.unwrap());
        assert!(farmer.real_author.is_none());
    }

    #[tokio::test]
    async fn batch_writes_back_when_complete() {
        let table = table();
        let mut authors = vec![Author::new("French", "Paul"), Author::new("Dick", "Philip K.")];

        let outcome = resolve_authors(&table, &mut authors, &AtomicBool::new(false))
            .await
            .unwrap();
        assert_eq!(outcome, ResolveOutcome::Completed { modified: 1 });
        assert!(authors[0].is_pen_name());
        assert!(!authors[1].is_pen_name());
    }

    #[tokio::test]
    async fn cancelled_batch_writes_nothing_back() {
        let cancel = Arc::new(AtomicBool::new(false));
        let resolver = ScriptedResolver {
            fail_on: "",
            calls: AtomicUsize::new(0),
            cancel_after: Some((1, cancel.clone())),
        };
        let mut authors = vec![Author::new("Lem", "Stanisław"), Author::new("Strugatsky", "Arkady")];

        let outcome = resolve_authors(&resolver, &mut authors, &cancel).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Cancelled);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        assert!(authors.iter().all(|author| !author.complete));
    }

    #[tokio::test]
    async fn resolver_failure_reaches_the_caller() {
        let resolver = ScriptedResolver {
            fail_on: "Tiptree",
            calls: AtomicUsize::new(0),
            cancel_after: None,
        };
        let mut authors = vec![Author::new("Le Guin", "Ursula K."), Author::new("Tiptree", "James")];

        let err = resolve_authors(&resolver, &mut authors, &AtomicBool::new(false))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Credentials(_)));
        assert!(!authors[0].complete);
    }
}
