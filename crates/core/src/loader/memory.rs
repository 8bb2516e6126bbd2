use crate::domain::document::RawDocument;
use crate::loader::{Collection, RecordFilter, RecordSource};
use std::collections::HashMap;
use std::time::Duration;

/// [`RecordSource`] over documents held in memory. Used for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    documents: HashMap<Collection, Vec<RawDocument>>,
    delay: Option<Duration>,
    unavailable: bool,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every fetch fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_document(mut self, collection: Collection, doc: RawDocument) -> Self {
        self.documents.entry(collection).or_default().push(doc);
        self
    }

    pub fn with_documents<I>(mut self, collection: Collection, docs: I) -> Self
    where
        I: IntoIterator<Item = RawDocument>,
    {
        self.documents.entry(collection).or_default().extend(docs);
        self
    }

    /// Delay every fetch, to exercise caller timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl RecordSource for InMemoryRecordSource {
    fn source_name(&self) -> &'static str {
        "in_memory"
    }

    async fn fetch_documents(&self, filter: &RecordFilter) -> anyhow::Result<Vec<RawDocument>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        anyhow::ensure!(!self.unavailable, "in-memory source marked unavailable");

        Ok(self
            .documents
            .get(&filter.collection)
            .cloned()
            .unwrap_or_default())
    }
}
