use crate::error::ImportError;
use async_trait::async_trait;
use model::records::record::Record;
use tokio::sync::Mutex;

/// Sink receiving the records of one channel at a time.
#[async_trait]
pub trait Importer: Send + Sync {
    async fn import(&self, records: &[Record]) -> Result<(), ImportError>;
}

/// Keeps every imported batch in memory.
#[derive(Debug, Default)]
pub struct MemoryImporter {
    batches: Mutex<Vec<Vec<Record>>>,
}

impl MemoryImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn batches(&self) -> Vec<Vec<Record>> {
        self.batches.lock().await.clone()
    }

    pub async fn records(&self) -> Vec<Record> {
        self.batches.lock().await.iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl Importer for MemoryImporter {
    async fn import(&self, records: &[Record]) -> Result<(), ImportError> {
        self.batches.lock().await.push(records.to_vec());
        Ok(())
    }
}
