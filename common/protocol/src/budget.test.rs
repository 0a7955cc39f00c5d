use super::*;

#[test]
fn test_usage_fraction() {
    let budget = TokenBudget::new(100, 50, false);
    assert!((budget.usage() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_remaining_never_negative() {
    let budget = TokenBudget::new(100, 150, true);
    assert_eq!(budget.remaining(), 0);
    assert!(budget.usage() > 1.0);
}

#[test]
fn test_zero_window() {
    let budget = TokenBudget::new(0, 10, false);
    assert_eq!(budget.usage(), 0.0);
    assert_eq!(budget.remaining(), 0);
}

#[test]
fn test_is_actual_flag() {
    let estimated = TokenBudget::new(100, 10, false);
    assert!(!estimated.is_actual);
    let actual = TokenBudget::new(100, 10, true);
    assert!(actual.is_actual);
}
