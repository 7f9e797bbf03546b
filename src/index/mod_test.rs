use super::*;
use crate::schema::Document;

struct FakeDoc {
    name: Option<String>,
    age: Option<i64>,
}

impl Document for FakeDoc {
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
        Ok(Vec::new())
    }
}

#[test]
fn test_indexer_dispatch_inverted_string() {
    let def = IndexDef {
        name: "name_idx".into(),
        kind: IndexKind::InvertedCompressedBitmap,
        column_path: "name".into(),
        ascending: true,
    };
    let mut indexer = Indexer::new(&def, FieldType::String).unwrap();
    assert!(matches!(indexer, Indexer::InvertedString(_)));

    let docs = [
        FakeDoc { name: Some("Alice".into()), age: None },
        FakeDoc { name: Some("Bob".into()), age: None },
    ];
    for (row_id, doc) in docs.iter().enumerate() {
        indexer.insert(row_id as u64, doc).unwrap();
    }

    let c = Constraint::new(IndexConstraintOperator::Equal, Operand::String("Alice".into()));
    assert_eq!(indexer.filter(&c).unwrap().to_vec(), vec![0]);
}

#[test]
fn test_indexer_dispatch_vector_int_covering_read() {
    let def = IndexDef {
        name: "age_idx".into(),
        kind: IndexKind::Vector,
        column_path: "age".into(),
        ascending: true,
    };
    let mut indexer = Indexer::new(&def, FieldType::Integer).unwrap();
    assert!(indexer.is_covering());

    let docs = [
        FakeDoc { name: None, age: Some(17) },
        FakeDoc { name: None, age: Some(42) },
    ];
    for (row_id, doc) in docs.iter().enumerate() {
        indexer.insert(row_id as u64, doc).unwrap();
    }

    assert_eq!(indexer.try_get_int(1), Some(42));
    let mut out = Vec::new();
    indexer.try_get_int_batch(&[0, 1], &mut out);
    assert_eq!(out, vec![Some(17), Some(42)]);
}

#[test]
fn test_indexer_rejects_mismatched_field_type() {
    let def = IndexDef {
        name: "age_idx".into(),
        kind: IndexKind::InvertedCompressedBitmap,
        column_path: "age".into(),
        ascending: true,
    };
    assert!(Indexer::new(&def, FieldType::Blob).is_err());
}
