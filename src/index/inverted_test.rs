use super::*;
use crate::index::constraint::Operand;

fn eq(v: &str) -> Constraint {
    Constraint::new(Op::Equal, Operand::String(v.to_string()))
}
fn lt(v: &str) -> Constraint {
    Constraint::new(Op::LessThan, Operand::String(v.to_string()))
}
fn ge(v: &str) -> Constraint {
    Constraint::new(Op::GreaterThanEqual, Operand::String(v.to_string()))
}

#[test]
fn test_string_index_equality_and_range() {
    let mut idx = InvertedStringIndex::new("name_idx", "name");
    for (row, name) in [(0, "Alice"), (1, "Bob"), (2, "Alice"), (3, "Carol")] {
        idx.insert(row, Some(name));
    }

    assert_eq!(idx.filter(&eq("Alice")).unwrap().to_vec(), vec![0, 2]);
    assert_eq!(idx.filter(&lt("Carol")).unwrap().to_vec(), vec![0, 1, 2]);
    assert_eq!(idx.filter_range(&ge("A"), &lt("C")).unwrap().to_vec(), vec![0, 1, 2]);
}

#[test]
fn test_string_index_skips_null_rows() {
    let mut idx = InvertedStringIndex::new("name_idx", "name");
    idx.insert(0, Some("Alice"));
    idx.insert(1, None);
    idx.insert(2, Some("Alice"));

    assert_eq!(idx.filter(&eq("Alice")).unwrap().to_vec(), vec![0, 2]);
    assert_eq!(idx.stats().count, 2);
}

#[test]
fn test_int_index_equality_and_comparisons() {
    let mut idx = InvertedIntIndex::new("age_idx", "age");
    for (row, age) in [(0i64, 17i64), (1, 42), (2, 30), (3, 65), (4, 30)] {
        idx.insert(row as u64, Some(age));
    }

    let gt_double = Constraint::new(Op::GreaterThan, Operand::Double(30.5));
    assert_eq!(idx.filter(&gt_double).unwrap().to_vec(), vec![1, 3]);

    let eq_double = Constraint::new(Op::Equal, Operand::Double(30.0));
    assert_eq!(idx.filter(&eq_double).unwrap().to_vec(), vec![2, 4]);

    let eq_fractional = Constraint::new(Op::Equal, Operand::Double(30.5));
    assert!(idx.filter(&eq_fractional).unwrap().is_empty());

    let lo = Constraint::new(Op::GreaterThanEqual, Operand::Integer(20));
    let hi = Constraint::new(Op::LessThanEqual, Operand::Integer(60));
    assert_eq!(idx.filter_range(&lo, &hi).unwrap().to_vec(), vec![1, 2, 4]);
}

#[test]
fn test_match_operator_is_invalid() {
    let idx = InvertedStringIndex::new("name_idx", "name");
    let c = Constraint::new(Op::Match, Operand::String("x".into()));
    assert!(idx.filter(&c).is_err());
}
