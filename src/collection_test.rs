use std::sync::Arc;

use super::*;
use crate::{
    blob::FileNameManager,
    catalog::{Catalog, SegmentInfo},
    index::{Constraint, IndexConstraintOperator, IndexKind, Operand},
    schema::FieldType,
};

struct Row {
    name: Option<String>,
    age: Option<i64>,
}

struct FakeSchema {
    paths: Vec<String>,
}

impl Schema for FakeSchema {
    fn field_type(&self, path: &str) -> Result<FieldType> {
        match path {
            "name" => Ok(FieldType::String),
            "age" => Ok(FieldType::Integer),
            _ => err_at!(InvalidArgument, msg: "unknown path {}", path),
        }
    }

    fn column_paths(&self) -> &[String] {
        &self.paths
    }

    fn decode(&self, bytes: &[u8]) -> Result<Box<dyn Document>> {
        let text = std::str::from_utf8(bytes).unwrap();
        let mut parts = text.splitn(2, '|');
        let name = parts.next().filter(|s| !s.is_empty()).map(|s| s.to_string());
        let age = parts.next().and_then(|s| s.parse::<i64>().ok());
        Ok(Box::new(Row { name, age }))
    }
}

impl Document for Row {
    fn get_int(&self, path: &str) -> Result<Option<i64>> {
        Ok(match path {
            "age" => self.age,
            _ => None,
        })
    }
    fn get_double(&self, _path: &str) -> Result<Option<f64>> {
        Ok(None)
    }
    fn get_string(&self, path: &str) -> Result<Option<String>> {
        Ok(match path {
            "name" => self.name.clone(),
            _ => None,
        })
    }
    fn get_blob(&self, _path: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(format!("{}|{}", self.name.clone().unwrap_or_default(), self.age.unwrap_or_default()).into_bytes())
    }
}

fn build_collection(dir: &std::path::Path) -> Collection {
    let catalog = Arc::new(Catalog::open(&dir.join("catalog.dat"), true).unwrap());
    let defs = vec![
        IndexDef { name: "name_idx".into(), kind: IndexKind::InvertedCompressedBitmap, column_path: "name".into(), ascending: true },
        IndexDef { name: "age_idx".into(), kind: IndexKind::Vector, column_path: "age".into(), ascending: true },
    ];
    catalog.add_collection("people", 1, b"schema", &defs).unwrap();
    let filenames = FileNameManager::new(dir.to_path_buf(), "db".into(), "people".into(), catalog);
    let blobs = BlobManager::open(filenames, 1024 * 1024, true, 3).unwrap();
    let schema: Arc<dyn Schema> = Arc::new(FakeSchema { paths: vec!["name".into(), "age".into()] });
    Collection::new("people".into(), schema, 1, b"schema".to_vec(), defs, blobs).unwrap()
}

#[test]
fn test_insert_assigns_dense_row_ids() {
    let dir = tempfile::tempdir().unwrap();
    let coll = build_collection(dir.path());

    let r0 = coll.insert(b"Alice|30", false).unwrap();
    let r1 = coll.insert(b"Bob|42", false).unwrap();
    assert_eq!((r0, r1), (0, 1));
    assert_eq!(coll.len(), 2);
}

#[test]
fn test_filter_and_covering_read() {
    let dir = tempfile::tempdir().unwrap();
    let coll = build_collection(dir.path());
    coll.insert(b"Alice|30", false).unwrap();
    coll.insert(b"Bob|42", false).unwrap();
    coll.insert(b"Carol|30", false).unwrap();

    let c = Constraint::new(IndexConstraintOperator::Equal, Operand::String("Alice".into()));
    let bm = coll.filter("name", &c).unwrap().unwrap();
    assert_eq!(bm.to_vec(), vec![0]);

    assert!(coll.is_covering("age"));
    assert_eq!(coll.try_get_int("age", 1), Some(42));
    assert!(!coll.is_covering("name"));
    assert_eq!(coll.get_blob(1).unwrap().unwrap(), b"Bob|42".to_vec());
}

#[test]
fn test_replay_reconstructs_index_state() {
    let dir = tempfile::tempdir().unwrap();
    {
        let coll = build_collection(dir.path());
        coll.insert(b"Alice|30", false).unwrap();
        coll.insert(b"Bob|42", false).unwrap();
    }

    let catalog = Catalog::open(&dir.path().join("catalog.dat"), false).unwrap();
    let metadata = catalog.load_all().unwrap().into_iter().find(|c| c.name == "people").unwrap();
    let segments: Vec<SegmentInfo> = metadata.segments.clone();
    assert!(!segments.is_empty());

    let catalog = Arc::new(catalog);
    let filenames = FileNameManager::new(dir.path().to_path_buf(), "db".into(), "people".into(), Arc::clone(&catalog));
    let blobs = BlobManager::open(filenames, 1024 * 1024, true, 3).unwrap();
    let schema: Arc<dyn Schema> = Arc::new(FakeSchema { paths: vec!["name".into(), "age".into()] });
    let coll = Collection::new("people".into(), schema, 1, b"schema".to_vec(), metadata.indexes.clone(), blobs).unwrap();
    coll.replay(&metadata).unwrap();

    assert_eq!(coll.len(), 2);
    assert_eq!(coll.try_get_int("age", 0), Some(30));
    assert_eq!(coll.try_get_int("age", 1), Some(42));
}
