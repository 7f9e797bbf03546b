use std::sync::Arc;

use super::*;
use crate::{
    index::{IndexDef, IndexKind},
    schema::{Document, FieldType, Schema, SchemaFactory},
};

struct Row {
    name: Option<String>,
    age: Option<i64>,
}

struct PeopleSchema {
    paths: Vec<String>,
}

impl Schema for PeopleSchema {
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

struct PeopleSchemaFactory;

impl SchemaFactory for PeopleSchemaFactory {
    fn resolve(&self, _schema_type: i32, _schema_blob: &[u8]) -> Result<Arc<dyn Schema>> {
        Ok(Arc::new(PeopleSchema { paths: vec!["name".into(), "age".into()] }))
    }
}

fn people_indexes() -> Vec<IndexDef> {
    vec![
        IndexDef { name: "name_idx".into(), kind: IndexKind::InvertedCompressedBitmap, column_path: "name".into(), ascending: true },
        IndexDef { name: "age_idx".into(), kind: IndexKind::Vector, column_path: "age".into(), ascending: true },
    ]
}

fn open_db(dir: &std::path::Path) -> Database {
    let opts = Options::new(Arc::new(PeopleSchemaFactory));
    Database::open(dir, opts).unwrap()
}

#[test]
fn test_create_collection_insert_and_query() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(dir.path());
    db.create_collection("people", 1, b"schema", &people_indexes()).unwrap();

    let rows: Vec<Vec<u8>> = vec![b"Alice|30".to_vec(), b"Bob|42".to_vec(), b"Carol|30".to_vec()];
    for r in &rows {
        db.insert("people", r).unwrap();
    }

    let mut rs = db.execute("SELECT _id, name, age FROM people ORDER BY _id").unwrap();
    let mut seen = Vec::new();
    while rs.next() {
        seen.push((rs.int(0).unwrap(), rs.string(1).unwrap(), rs.int(2).unwrap()));
    }
    assert_eq!(seen, vec![(0, "Alice".to_string(), 30), (1, "Bob".to_string(), 42), (2, "Carol".to_string(), 30)]);
}

#[test]
fn test_filter_pushdown_on_inverted_string_index() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(dir.path());
    db.create_collection("people", 1, b"schema", &people_indexes()).unwrap();
    for r in ["Alice|30", "Bob|42", "Alice|55"] {
        db.insert("people", r.as_bytes()).unwrap();
    }

    let mut rs = db.execute("SELECT _id FROM people WHERE name = 'Alice' ORDER BY _id").unwrap();
    let mut ids = Vec::new();
    while rs.next() {
        ids.push(rs.int(0).unwrap());
    }
    assert_eq!(ids, vec![0, 2]);
}

#[test]
fn test_replay_survives_reopen_without_rewriting_segments() {
    let dir = tempfile::tempdir().unwrap();
    let before_count;
    {
        let db = open_db(dir.path());
        db.create_collection("people", 1, b"schema", &people_indexes()).unwrap();
        for i in 0..100 {
            let age = 20 + (i % 60);
            db.insert("people", format!("person{}|{}", i, age).as_bytes()).unwrap();
        }
        let mut rs = db.execute("SELECT COUNT(*) FROM people WHERE age > 50").unwrap();
        assert!(rs.next());
        before_count = rs.int(0).unwrap();
    }

    let db_name = dir.path().file_name().unwrap().to_str().unwrap().to_string();
    let segment_path = dir.path().join(format!("{}_people.0", db_name));
    let size_before_reopen = std::fs::metadata(&segment_path).unwrap().len();

    let db = open_db(dir.path());
    let mut rs = db.execute("SELECT COUNT(*) FROM people WHERE age > 50").unwrap();
    assert!(rs.next());
    assert_eq!(rs.int(0).unwrap(), before_count);

    let size_after_reopen = std::fs::metadata(&segment_path).unwrap().len();
    assert_eq!(size_before_reopen, size_after_reopen);
}
