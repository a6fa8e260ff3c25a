use serde_json::Value;
use crate::core::database::Database;
use crate::core::error::Result;
use crate::core::types::DocId;

/// Batch writer for bulk loads: buffers documents and publishes a snapshot
/// every `batch_size` documents instead of once per put.
pub struct BatchWriter<'a> {
    database: &'a Database,
    buffer: Vec<Value>,
    batch_size: usize,
    written: Vec<DocId>,
}

impl<'a> BatchWriter<'a> {
    pub fn new(database: &'a Database, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        BatchWriter {
            database,
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            written: Vec::new(),
        }
    }

    pub fn add(&mut self, doc: Value) -> Result<()> {
        self.buffer.push(doc);

        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.buffer);
        let ids = self.database.put(batch)?;
        self.written.extend(ids);
        Ok(())
    }

    /// Flush the tail and return every id written through this batch.
    pub fn finish(mut self) -> Result<Vec<DocId>> {
        self.flush()?;
        Ok(self.written)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commits_every_batch() {
        let db = Database::in_memory().unwrap();
        let mut batch = BatchWriter::new(&db, 2);

        batch.add(json!({"_id": 1, "make": "Volvo"})).unwrap();
        assert_eq!(batch.buffered(), 1);
        assert_eq!(db.document_count(), 0);

        batch.add(json!({"_id": 2, "make": "BMW"})).unwrap();
        assert_eq!(batch.buffered(), 0);
        assert_eq!(db.document_count(), 2);

        batch.add(json!({"_id": 3, "make": "Tesla"})).unwrap();
        let ids = batch.finish().unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(db.document_count(), 3);
    }
}
