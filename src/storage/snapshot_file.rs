use std::fs;
use std::path::Path;
use chrono::{DateTime, Utc};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::document_store::DocumentStore;
use crate::index::inverted::InvertedIndex;
use crate::index::term_stats::TermStatistics;
use crate::mvcc::controller::Snapshot;

const MAGIC: &[u8; 8] = b"FACETDEX";
const FORMAT_VERSION: u32 = 1;
// magic | format version (u32) | crc32 (u32) | payload length (u64)
const HEADER_LEN: usize = 8 + 4 + 4 + 8;

/// On-disk body. Documents travel as JSON text since bincode cannot carry
/// self-describing values.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotPayload {
    version: u64,
    timestamp: DateTime<Utc>,
    index: InvertedIndex,
    text: InvertedIndex,
    term_stats: TermStatistics,
    documents: Vec<(DocId, String)>,
}

/// State read back from an export, ready to be republished.
#[derive(Debug)]
pub struct LoadedSnapshot {
    pub index: InvertedIndex,
    pub text: InvertedIndex,
    pub term_stats: TermStatistics,
    pub documents: DocumentStore,
}

/// Write `snapshot` to `path`, returning the number of bytes written.
///
/// The file is written beside the target and renamed into place.
pub fn export_snapshot<P: AsRef<Path>>(snapshot: &Snapshot, path: P) -> Result<u64> {
    let path = path.as_ref();
    let documents = snapshot
        .documents
        .iter()
        .map(|(id, source)| -> Result<(DocId, String)> {
            Ok((id.clone(), serde_json::to_string(source)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let payload = SnapshotPayload {
        version: snapshot.version,
        timestamp: snapshot.timestamp,
        index: snapshot.index.clone(),
        text: snapshot.text.clone(),
        term_stats: snapshot.term_stats.clone(),
        documents,
    };
    let body = bincode::serialize(&payload)?;

    let mut hasher = Hasher::new();
    hasher.update(&body);
    let checksum = hasher.finalize();

    let mut buffer = Vec::with_capacity(HEADER_LEN + body.len());
    buffer.extend_from_slice(MAGIC);
    buffer.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buffer.extend_from_slice(&checksum.to_le_bytes());
    buffer.extend_from_slice(&(body.len() as u64).to_le_bytes());
    buffer.extend_from_slice(&body);

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &buffer)?;
    fs::rename(&tmp, path)?;

    info!(
        version = snapshot.version,
        docs = snapshot.doc_count(),
        bytes = buffer.len(),
        path = %path.display(),
        "exported snapshot"
    );
    Ok(buffer.len() as u64)
}

/// Read and verify an export written by `export_snapshot`.
pub fn import_snapshot<P: AsRef<Path>>(path: P) -> Result<LoadedSnapshot> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    let body = verify_frame(&data)?;

    let payload: SnapshotPayload = bincode::deserialize(body)?;
    let mut documents = DocumentStore::new();
    for (id, text) in payload.documents {
        let source: Value = serde_json::from_str(&text)?;
        documents.insert(id, source);
    }

    check_consistency(&payload.index, &payload.term_stats, &documents)?;
    check_consistency(&payload.text, &payload.term_stats, &documents)?;

    info!(
        version = payload.version,
        exported_at = %payload.timestamp,
        docs = documents.len(),
        path = %path.display(),
        "imported snapshot"
    );
    Ok(LoadedSnapshot {
        index: payload.index,
        text: payload.text,
        term_stats: payload.term_stats,
        documents,
    })
}

fn verify_frame(data: &[u8]) -> Result<&[u8]> {
    if data.len() < HEADER_LEN || &data[..8] != MAGIC {
        return Err(corrupted("not a snapshot export"));
    }

    let version = u32::from_le_bytes(read_array(&data[8..12])?);
    if version != FORMAT_VERSION {
        return Err(corrupted(format!("unsupported format version {version}")));
    }

    let checksum = u32::from_le_bytes(read_array(&data[12..16])?);
    let len = u64::from_le_bytes(read_array(&data[16..24])?) as usize;
    let body = &data[HEADER_LEN..];
    if body.len() != len {
        return Err(corrupted(format!("payload is {} bytes, header says {len}", body.len())));
    }

    let mut hasher = Hasher::new();
    hasher.update(body);
    if hasher.finalize() != checksum {
        return Err(corrupted("checksum mismatch"));
    }
    Ok(body)
}

/// Every posting must point at a stored document, and the statistics must
/// count the same documents the store holds.
fn check_consistency(
    index: &InvertedIndex,
    term_stats: &TermStatistics,
    documents: &DocumentStore,
) -> Result<()> {
    for hit in index.iter() {
        if let Some(missing) = hit.postings.iter().find(|id| !documents.contains(id)) {
            warn!(field = %hit.field, value = %hit.value, id = %missing, "posting without a stored document");
            return Err(Error::inconsistent(format!(
                "posting {}:{} references missing document {missing}",
                hit.field, hit.value
            )));
        }
    }

    if term_stats.total_docs() as usize != documents.len() {
        return Err(Error::inconsistent(format!(
            "term statistics count {} documents, store holds {}",
            term_stats.total_docs(),
            documents.len()
        )));
    }
    Ok(())
}

fn read_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| corrupted("truncated header"))
}

fn corrupted(context: impl Into<String>) -> Error {
    Error::new(ErrorKind::Corrupted, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        let id = DocId::from(7u64);
        snapshot.index.insert("make", "tesla", id.clone());
        snapshot.text.insert("make", "tesla", id.clone());
        snapshot.term_stats.add_document(["tesla"]);
        snapshot.documents.insert(id, json!({"_id": 7, "make": "Tesla", "specs": {"seats": 5}}));
        snapshot
    }

    #[test]
    fn export_then_import_restores_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.snap");
        let original = snapshot();

        let bytes = export_snapshot(&original, &path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), bytes);

        let loaded = import_snapshot(&path).unwrap();
        assert_eq!(loaded.index, original.index);
        assert_eq!(loaded.text, original.text);
        assert_eq!(loaded.term_stats, original.term_stats);
        assert_eq!(loaded.documents, original.documents);
    }

    #[test]
    fn flipped_byte_is_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.snap");
        export_snapshot(&snapshot(), &path).unwrap();

        let mut data = fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        fs::write(&path, data).unwrap();

        assert_eq!(import_snapshot(&path).unwrap_err().kind, ErrorKind::Corrupted);
    }

    #[test]
    fn foreign_files_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.snap");
        fs::write(&path, b"definitely not a snapshot export").unwrap();
        assert_eq!(import_snapshot(&path).unwrap_err().kind, ErrorKind::Corrupted);
    }

    #[test]
    fn dangling_postings_are_inconsistent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.snap");
        let mut broken = snapshot();
        broken.index.insert("make", "tesla", DocId::from(99u64));
        export_snapshot(&broken, &path).unwrap();
        assert_eq!(import_snapshot(&path).unwrap_err().kind, ErrorKind::InconsistentIndex);

        let mut broken = snapshot();
        broken.text.insert("title", "plaid", DocId::from(42u64));
        export_snapshot(&broken, &path).unwrap();
        assert_eq!(import_snapshot(&path).unwrap_err().kind, ErrorKind::InconsistentIndex);
    }
}
