use chrono::Utc;
use std::sync::Arc;

use crate::documents::render::{DocumentRenderer, RenderedDocument, TextRenderer};
use crate::errors::InsuranceError;
use crate::models::{DocumentDraft, DocumentStatus, InsuranceDocument, User};
use crate::storage::PersistenceMirror;
use crate::utils::ids::DocumentIdGenerator;
use crate::utils::logging::LoggingHelper;

/// Issued documents, split into the current user's view and the full collection
///
/// The full collection is what gets persisted; the view is re-derived from it
/// whenever the current user changes.
pub struct DocumentManager {
    mirror: PersistenceMirror,
    renderer: Option<Arc<dyn DocumentRenderer>>,
    owner: Option<String>,
    documents: Vec<InsuranceDocument>,
    all_documents: Vec<InsuranceDocument>,
    id_generator: DocumentIdGenerator,
}

impl std::fmt::Debug for DocumentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentManager")
            .field("owner", &self.owner)
            .field("documents", &self.documents.len())
            .field("all_documents", &self.all_documents.len())
            .field("rich_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

impl DocumentManager {
    #[must_use]
    pub fn new(mirror: PersistenceMirror) -> Self {
        Self {
            mirror,
            renderer: None,
            owner: None,
            documents: Vec::new(),
            all_documents: Vec::new(),
            id_generator: DocumentIdGenerator::new(),
        }
    }

    /// Install a rich renderer tried before the text fallback
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Reload the persisted collection and re-derive the view for `user`
    pub fn set_user(&mut self, user: Option<&User>) {
        self.owner = user.map(|u| u.id.clone());
        self.all_documents = self.mirror.load_documents();
        self.documents = match &self.owner {
            Some(owner) => self
                .all_documents
                .iter()
                .filter(|doc| doc.is_owned_by(owner))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        LoggingHelper::log_documents_filtered(
            self.owner.as_deref(),
            self.documents.len(),
            self.all_documents.len(),
        );
    }

    /// The current user's documents
    #[must_use]
    pub fn documents(&self) -> &[InsuranceDocument] {
        &self.documents
    }

    #[must_use]
    pub fn all_documents(&self) -> &[InsuranceDocument] {
        &self.all_documents
    }

    /// Issue a document for `user`
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without a user; nothing is written
    /// - `Persistence` if the collection cannot be written; the document stays in memory
    pub fn create_document(
        &mut self,
        user: Option<&User>,
        draft: DocumentDraft,
    ) -> Result<InsuranceDocument, InsuranceError> {
        let user = user.ok_or(InsuranceError::Unauthenticated)?;

        let now = Utc::now();
        let stamp = self.id_generator.next(now);
        let document = InsuranceDocument {
            id: stamp.id,
            user_id: user.id.clone(),
            details: draft,
            status: DocumentStatus::Active,
            created_at: now,
            document_number: stamp.document_number,
        };

        if self.owner.as_deref() == Some(user.id.as_str()) {
            self.documents.push(document.clone());
        }
        self.all_documents.push(document.clone());
        LoggingHelper::log_document_created(&document);

        self.mirror.save_documents(&self.all_documents)?;
        Ok(document)
    }

    /// Look up a document in the current view, then in the full collection
    #[must_use]
    pub fn get_document_by_id(&self, id: &str) -> Option<&InsuranceDocument> {
        self.documents
            .iter()
            .chain(self.all_documents.iter())
            .find(|doc| doc.id == id)
    }

    /// Render a document for download
    ///
    /// The rich renderer is tried first when one is installed; any failure
    /// falls back to the text rendering.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no document has this id
    /// - `Render` if the text fallback fails as well
    pub async fn render_document(&self, id: &str) -> Result<RenderedDocument, InsuranceError> {
        let document = self
            .get_document_by_id(id)
            .ok_or_else(|| InsuranceError::NotFound(format!("document {id}")))?;

        if let Some(renderer) = &self.renderer {
            match renderer.render(document).await {
                Ok(rendered) => return Ok(rendered),
                Err(e) => log::warn!(
                    "Rich rendering of {} failed, using text fallback: {e:#}",
                    document.document_number
                ),
            }
        }

        TextRenderer
            .render(document)
            .await
            .map_err(|e| InsuranceError::Render(format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore, StorageError, DOCUMENTS_KEY};
    use crate::testing::fixtures::TestFixtures;
    use async_trait::async_trait;

    fn manager() -> (DocumentManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (
            DocumentManager::new(PersistenceMirror::new(store.clone())),
            store,
        )
    }

    #[test]
    fn test_create_without_user_writes_nothing() {
        let (mut docs, store) = manager();
        let result = docs.create_document(None, TestFixtures::draft());

        assert!(matches!(result, Err(InsuranceError::Unauthenticated)));
        assert!(store.get(DOCUMENTS_KEY).unwrap().is_none());
        assert!(docs.all_documents().is_empty());
    }

    #[test]
    fn test_first_document_for_user() {
        let (mut docs, store) = manager();
        let user = TestFixtures::user("u1");
        docs.set_user(Some(&user));

        let document = docs
            .create_document(Some(&user), TestFixtures::draft())
            .unwrap();

        assert_eq!(document.user_id, "u1");
        assert_eq!(document.status, DocumentStatus::Active);
        assert!(document.id.starts_with("DOC-"));
        assert!(document.document_number.starts_with("INS-"));
        assert_eq!(docs.documents(), std::slice::from_ref(&document));

        let stored: Vec<InsuranceDocument> =
            serde_json::from_str(&store.get(DOCUMENTS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, vec![document]);
    }

    #[test]
    fn test_view_is_filtered_per_user_but_lookup_spans_collection() {
        let (mut docs, _) = manager();
        let alice = TestFixtures::user("alice");
        let bob = TestFixtures::user("bob");

        docs.set_user(Some(&alice));
        let alice_doc = docs
            .create_document(Some(&alice), TestFixtures::draft())
            .unwrap();

        docs.set_user(Some(&bob));
        let bob_doc = docs
            .create_document(Some(&bob), TestFixtures::draft())
            .unwrap();

        assert_eq!(docs.documents(), std::slice::from_ref(&bob_doc));
        assert_eq!(docs.all_documents().len(), 2);
        assert_eq!(docs.get_document_by_id(&alice_doc.id), Some(&alice_doc));
        assert!(docs.get_document_by_id("DOC-0-missing").is_none());

        docs.set_user(None);
        assert!(docs.documents().is_empty());
        assert_eq!(docs.all_documents().len(), 2);
    }

    #[test]
    fn test_back_to_back_documents_have_distinct_numbers() {
        let (mut docs, _) = manager();
        let user = TestFixtures::user("u1");
        docs.set_user(Some(&user));

        let first = docs.create_document(Some(&user), TestFixtures::draft()).unwrap();
        let second = docs.create_document(Some(&user), TestFixtures::draft()).unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.document_number, second.document_number);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk full".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_propagates_without_rollback() {
        let mut docs = DocumentManager::new(PersistenceMirror::new(Arc::new(FailingStore)));
        let user = TestFixtures::user("u1");
        docs.set_user(Some(&user));

        let result = docs.create_document(Some(&user), TestFixtures::draft());

        assert!(matches!(result, Err(InsuranceError::Persistence(_))));
        assert_eq!(docs.documents().len(), 1);
        assert_eq!(docs.all_documents().len(), 1);
    }

    struct BrokenRenderer;

    #[async_trait]
    impl DocumentRenderer for BrokenRenderer {
        async fn render(&self, _document: &InsuranceDocument) -> anyhow::Result<RenderedDocument> {
            anyhow::bail!("font not available")
        }
    }

    #[tokio::test]
    async fn test_render_falls_back_to_text() {
        let (docs, _) = manager();
        let mut docs = docs.with_renderer(Arc::new(BrokenRenderer));
        let user = TestFixtures::user("u1");
        docs.set_user(Some(&user));
        let document = docs.create_document(Some(&user), TestFixtures::draft()).unwrap();

        let rendered = docs.render_document(&document.id).await.unwrap();
        assert!(rendered.file_name.ends_with(".txt"));
        assert!(rendered.content_type.starts_with("text/plain"));

        assert!(matches!(
            docs.render_document("nope").await,
            Err(InsuranceError::NotFound(_))
        ));
    }
}
