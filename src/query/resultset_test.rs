use rusqlite::Connection;

use super::*;

#[test]
fn test_resultset_accessors_and_cursor() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE t(a INTEGER, b TEXT, c REAL, d BLOB)").unwrap();
    conn.execute("INSERT INTO t VALUES (1, 'x', 1.5, NULL)", []).unwrap();
    conn.execute("INSERT INTO t VALUES (2, 'y', NULL, x'deadbeef')", []).unwrap();

    let stmt = conn.prepare("SELECT a, b, c, d FROM t ORDER BY a").unwrap();
    let mut rs = ResultSet::from_statement(stmt, &[]).unwrap();

    assert_eq!(rs.column_count(), 4);
    assert_eq!(rs.column_label(1), "b");
    assert_eq!(rs.column_index_by_name("c"), Some(2));
    assert_eq!(rs.column_index_by_name("nope"), None);

    assert!(rs.next());
    assert_eq!(rs.int(0), Some(1));
    assert_eq!(rs.string(1), Some("x".to_string()));
    assert_eq!(rs.double(2), Some(1.5));
    assert!(rs.is_null(3));
    assert_eq!(rs.column_type(0), ColumnType::Integer);

    assert!(rs.next());
    assert_eq!(rs.int(0), Some(2));
    assert!(rs.is_null(2));
    assert_eq!(rs.blob(3), Some(vec![0xde, 0xad, 0xbe, 0xef]));

    assert!(!rs.next());
}
