use super::*;

fn c(op: IndexConstraintOperator, operand: Operand) -> Constraint {
    Constraint::new(op, operand)
}

#[test]
fn test_equal_fractional_double_is_empty() {
    let constraint = c(IndexConstraintOperator::Equal, Operand::Double(30.5));
    assert_eq!(normalize_int_constraint(&constraint), NormalizedInt::Empty);
}

#[test]
fn test_equal_integral_double_passes_through() {
    let constraint = c(IndexConstraintOperator::Equal, Operand::Double(30.0));
    assert_eq!(
        normalize_int_constraint(&constraint),
        NormalizedInt::Cmp { op: IndexConstraintOperator::Equal, value: 30 }
    );
}

#[test]
fn test_greater_than_fractional_rounds_to_ceil() {
    // age > 30.5 must match age >= 31, per the worked example in §8.
    let constraint = c(IndexConstraintOperator::GreaterThan, Operand::Double(30.5));
    assert_eq!(
        normalize_int_constraint(&constraint),
        NormalizedInt::Cmp { op: IndexConstraintOperator::GreaterThanEqual, value: 31 }
    );
}

#[test]
fn test_less_than_fractional_rounds_to_floor() {
    // x < 1.7 must match x <= 1.
    let constraint = c(IndexConstraintOperator::LessThan, Operand::Double(1.7));
    assert_eq!(
        normalize_int_constraint(&constraint),
        NormalizedInt::Cmp { op: IndexConstraintOperator::LessThanEqual, value: 1 }
    );
}

#[test]
fn test_integer_operand_passes_through_unchanged() {
    let constraint = c(IndexConstraintOperator::LessThan, Operand::Integer(5));
    assert_eq!(
        normalize_int_constraint(&constraint),
        NormalizedInt::Cmp { op: IndexConstraintOperator::LessThan, value: 5 }
    );
}

#[test]
fn test_widen_range_does_not_overflow_at_extremes() {
    let (lo, hi) = widen_range(
        IndexConstraintOperator::GreaterThanEqual,
        i64::MIN,
        IndexConstraintOperator::LessThanEqual,
        i64::MAX,
    );
    assert_eq!(lo, i64::MIN as i128);
    assert_eq!(hi, i64::MAX as i128 + 1);
}

#[test]
fn test_widen_range_exclusive_lower_adds_one() {
    let (lo, _hi) = widen_range(
        IndexConstraintOperator::GreaterThan,
        i64::MAX - 1,
        IndexConstraintOperator::LessThan,
        10,
    );
    assert_eq!(lo, i64::MAX as i128);
}
