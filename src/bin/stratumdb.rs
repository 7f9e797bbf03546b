//! Thin CLI for local experimentation (SPEC_FULL.md ambient-stack note):
//! opens a database directory, declares one demo collection backed by a
//! single-column text schema, and runs SQL statements piped in on stdin.
//!
//! Not a substitute for the library API — schema formats and document
//! encodings are an external concern (see `stratumdb::schema`); this binary
//! ships one trivial built-in schema just so there's something to query.

use std::{io::BufRead, path::PathBuf, process, sync::Arc};

use log::error;

use stratumdb::{
    err_at,
    index::IndexDef,
    schema::{Document, FieldType, Schema, SchemaFactory},
    Database, Options, Result,
};

struct TextRow(String);

struct TextSchema {
    paths: Vec<String>,
}

impl Schema for TextSchema {
    fn field_type(&self, path: &str) -> Result<FieldType> {
        match path {
            "body" => Ok(FieldType::String),
            _ => err_at!(InvalidArgument, msg: "unknown path {}", path),
        }
    }

    fn column_paths(&self) -> &[String] {
        &self.paths
    }

    fn decode(&self, bytes: &[u8]) -> Result<Box<dyn Document>> {
        Ok(Box::new(TextRow(String::from_utf8_lossy(bytes).into_owned())))
    }
}

impl Document for TextRow {
    fn get_int(&self, _path: &str) -> Result<Option<i64>> {
        Ok(None)
    }
    fn get_double(&self, _path: &str) -> Result<Option<f64>> {
        Ok(None)
    }
    fn get_string(&self, path: &str) -> Result<Option<String>> {
        Ok(match path {
            "body" => Some(self.0.clone()),
            _ => None,
        })
    }
    fn get_blob(&self, _path: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.0.clone().into_bytes())
    }
}

struct TextSchemaFactory;

impl SchemaFactory for TextSchemaFactory {
    fn resolve(&self, _schema_type: i32, _schema_blob: &[u8]) -> Result<Arc<dyn Schema>> {
        Ok(Arc::new(TextSchema { paths: vec!["body".to_string()] }))
    }
}

fn run() -> Result<()> {
    let dir: PathBuf = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => {
            eprintln!("usage: stratumdb <db-dir>");
            process::exit(2);
        }
    };

    let options = Options::new(Arc::new(TextSchemaFactory));
    let db = Database::open(&dir, options)?;

    let indexes = [IndexDef {
        name: "body_idx".into(),
        kind: stratumdb::index::IndexKind::InvertedCompressedBitmap,
        column_path: "body".into(),
        ascending: true,
    }];
    match db.create_collection("lines", 0, b"", &indexes) {
        Ok(()) | Err(stratumdb::Error::CollectionAlreadyExists(_)) => (),
        Err(err) => return Err(err),
    }

    println!("stratumdb ready at {:?}; enter SQL, or \"insert <text>\", Ctrl-D to quit", dir);
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = err_at!(IOError, line)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(body) = line.strip_prefix("insert ") {
            let row_id = db.insert("lines", body.as_bytes())?;
            println!("inserted row {}", row_id);
            continue;
        }
        match db.execute(line) {
            Ok(mut rs) => {
                let n = rs.column_count();
                while rs.next() {
                    let cells: Vec<String> = (0..n)
                        .map(|i| rs.string(i).or_else(|| rs.int(i).map(|v| v.to_string())).unwrap_or_default())
                        .collect();
                    println!("{}", cells.join("\t"));
                }
            }
            Err(err) => eprintln!("error: {}", err),
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        error!("stratumdb: {}", err);
        process::exit(1);
    }
}
