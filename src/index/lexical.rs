/// Tantivy-backed lexical index (BM25 over titles and bodies)
use crate::index::{DocId, IndexError, LexicalIndex};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Mutex;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value as _, INDEXED, STORED, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy};

/// Lexical full-text index adapter
///
/// Queries match titles and bodies; the channel consumes only
/// (id, BM25 score) pairs.
pub struct TantivyLexicalIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    id_field: Field,
    title_field: Field,
    body_field: Field,
}

impl TantivyLexicalIndex {
    /// Create or open an on-disk index
    pub fn new(index_path: PathBuf) -> Result<Self, IndexError> {
        if index_path.exists() && index_path.join("meta.json").exists() {
            let index = Index::open_in_dir(&index_path)
                .map_err(|e| IndexError::Unavailable(e.to_string()))?;
            Self::from_index(index)
        } else {
            std::fs::create_dir_all(&index_path)?;
            let index = Index::create_in_dir(&index_path, Self::schema())
                .map_err(|e| IndexError::Unavailable(e.to_string()))?;
            Self::from_index(index)
        }
    }

    /// Create a volatile in-memory index
    pub fn create_in_ram() -> Result<Self, IndexError> {
        Self::from_index(Index::create_in_ram(Self::schema()))
    }

    fn schema() -> Schema {
        let mut schema_builder = Schema::builder();
        schema_builder.add_u64_field("id", INDEXED | STORED);
        schema_builder.add_text_field("title", TEXT);
        schema_builder.add_text_field("body", TEXT);
        schema_builder.build()
    }

    fn from_index(index: Index) -> Result<Self, IndexError> {
        let schema = index.schema();
        let id_field = schema
            .get_field("id")
            .map_err(|_| IndexError::Unavailable("Missing 'id' field in schema".to_string()))?;
        let title_field = schema
            .get_field("title")
            .map_err(|_| IndexError::Unavailable("Missing 'title' field in schema".to_string()))?;
        let body_field = schema
            .get_field("body")
            .map_err(|_| IndexError::Unavailable("Missing 'body' field in schema".to_string()))?;

        let writer = index
            .writer(50_000_000)
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e: tantivy::TantivyError| IndexError::Unavailable(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            id_field,
            title_field,
            body_field,
        })
    }

    /// Index a document
    pub fn insert(&self, id: DocId, title: &str, body: &str) -> Result<(), IndexError> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| IndexError::Insert("Writer lock poisoned".to_string()))?;

        writer
            .add_document(doc!(
                self.id_field => id,
                self.title_field => title,
                self.body_field => body,
            ))
            .map_err(|e| IndexError::Insert(e.to_string()))?;

        Ok(())
    }

    /// Commit pending documents and wait for the reader to pick them up
    pub fn commit(&self) -> Result<(), IndexError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| IndexError::Insert("Writer lock poisoned".to_string()))?;

        writer
            .commit()
            .map_err(|e| IndexError::Insert(e.to_string()))?;
        self.reader
            .reload()
            .map_err(|e| IndexError::Query(e.to_string()))?;

        Ok(())
    }

    /// Number of indexed documents
    pub fn len(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LexicalIndex for TantivyLexicalIndex {
    fn search(
        &self,
        text: &str,
        limit: usize,
        _filters: Option<&Value>,
    ) -> Result<Vec<(DocId, f32)>, IndexError> {
        let searcher = self.reader.searcher();

        // Lenient parsing: code-like queries ("fn main()") contain characters
        // the query grammar rejects, and a lexical miss must not fail retrieval
        let query_parser =
            QueryParser::for_index(&self.index, vec![self.title_field, self.body_field]);
        let (query, _parse_errors) = query_parser.parse_query_lenient(text);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| IndexError::Query(e.to_string()))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let retrieved: tantivy::TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| IndexError::Query(e.to_string()))?;

            let id = retrieved
                .get_first(self.id_field)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| IndexError::Query("Missing or invalid id field".to_string()))?;

            results.push((id, score));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_insert_and_search() {
        let index = TantivyLexicalIndex::create_in_ram().unwrap();

        index
            .insert(1, "Machine learning", "Introduction to machine learning models")
            .unwrap();
        index
            .insert(2, "Deep learning", "Neural networks and deep learning")
            .unwrap();
        index
            .insert(3, "Sourdough", "A baking guide for sourdough bread")
            .unwrap();
        index.commit().unwrap();

        let results = index.search("machine learning", 10, None).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].0, 1);

        let results = index.search("sourdough", 10, None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 3);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let index = TantivyLexicalIndex::create_in_ram().unwrap();
        index.insert(1, "title", "body text").unwrap();
        index.commit().unwrap();

        let results = index.search("zzzzqqqq", 10, None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_code_like_query_does_not_fail() {
        let index = TantivyLexicalIndex::create_in_ram().unwrap();
        index
            .insert(1, "Parser", "fn main() entry point conventions")
            .unwrap();
        index.commit().unwrap();

        // Unbalanced parens would be a hard parse error without lenient mode
        let results = index.search("fn main( entry", 10, None);
        assert!(results.is_ok());
    }

    #[test]
    fn test_on_disk_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lexical");

        {
            let index = TantivyLexicalIndex::new(path.clone()).unwrap();
            index.insert(7, "persisted", "document body").unwrap();
            index.commit().unwrap();
        }

        let index = TantivyLexicalIndex::new(path).unwrap();
        assert_eq!(index.len(), 1);
        let results = index.search("persisted", 10, None).unwrap();
        assert_eq!(results[0].0, 7);
    }
}
