use super::*;
use crate::index::constraint::Operand;

#[test]
fn test_vector_int_worked_example() {
    let mut idx = VectorIntIndex::new("age_idx", "age");
    for (row, age) in [17i64, 42, 30, 65, 30].into_iter().enumerate() {
        idx.insert(row as u64, Some(age)).unwrap();
    }

    let gt = Constraint::new(Op::GreaterThan, Operand::Double(30.5));
    assert_eq!(idx.filter(&gt).unwrap().to_vec(), vec![1, 3]);

    let eq_whole = Constraint::new(Op::Equal, Operand::Double(30.0));
    assert_eq!(idx.filter(&eq_whole).unwrap().to_vec(), vec![2, 4]);

    let eq_frac = Constraint::new(Op::Equal, Operand::Double(30.5));
    assert!(idx.filter(&eq_frac).unwrap().is_empty());

    let lo = Constraint::new(Op::GreaterThanEqual, Operand::Integer(20));
    let hi = Constraint::new(Op::LessThanEqual, Operand::Integer(60));
    assert_eq!(idx.filter_range(&lo, &hi).unwrap().to_vec(), vec![1, 2, 4]);
}

#[test]
fn test_vector_int_out_of_order_insert_fails() {
    let mut idx = VectorIntIndex::new("age_idx", "age");
    idx.insert(0, Some(1)).unwrap();
    assert!(idx.insert(5, Some(2)).is_err());
}

#[test]
fn test_vector_int_null_slots_never_match() {
    let mut idx = VectorIntIndex::new("age_idx", "age");
    idx.insert(0, Some(10)).unwrap();
    idx.insert(1, None).unwrap();
    idx.insert(2, Some(10)).unwrap();
    let eq = Constraint::new(Op::Equal, Operand::Integer(10));
    assert_eq!(idx.filter(&eq).unwrap().to_vec(), vec![0, 2]);
}

#[test]
fn test_vector_int_extreme_bounds_do_not_overflow() {
    let mut idx = VectorIntIndex::new("v", "v");
    idx.insert(0, Some(i64::MIN)).unwrap();
    idx.insert(1, Some(i64::MAX)).unwrap();
    let lo = Constraint::new(Op::GreaterThanEqual, Operand::Integer(i64::MIN));
    let hi = Constraint::new(Op::LessThanEqual, Operand::Integer(i64::MAX));
    assert_eq!(idx.filter_range(&lo, &hi).unwrap().to_vec(), vec![0, 1]);
}

#[test]
fn test_vector_string_covering_read() {
    let mut idx = VectorStringIndex::new("name_idx", "name");
    idx.insert(0, Some("Alice".to_string())).unwrap();
    idx.insert(1, Some("Bob".to_string())).unwrap();
    assert_eq!(idx.try_get_string(0), Some("Alice".to_string()));
    assert_eq!(idx.try_get_string(99), None);
}
