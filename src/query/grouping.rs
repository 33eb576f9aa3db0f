//! WHERE clause grouping
//!
//! Folds a flat, ordered list of conditions into a boolean expression.
//! Runs of OR-joined conditions become one parenthesized unit; units are
//! always combined with AND. Group boundaries come from the AND/OR
//! transition between neighbours, never from echoing the stored
//! conjunction at the top level.
//!
//! ```text
//! A AND B OR C OR D AND E   =>   A AND (B OR C OR D) AND E
//! ```

use crate::query::ast::{Condition, Conjunction};
use crate::query::format::format_value;

/// Render one condition as `field operator literal`
pub fn render_condition(condition: &Condition) -> String {
    format!(
        "{} {} {}",
        condition.field.trim(),
        condition.operator,
        format_value(condition.operator, &condition.raw_value)
    )
}

/// Build the WHERE clause body for `conditions`
///
/// Inactive conditions are skipped. Returns an empty string when nothing
/// is left.
pub fn group_conditions(conditions: &[Condition]) -> String {
    let active: Vec<&Condition> = conditions.iter().filter(|c| c.is_active()).collect();

    let mut units: Vec<String> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut preceding: Option<Conjunction> = None;

    for condition in active {
        if preceding != Some(Conjunction::Or) {
            close_group(&mut pending, &mut units);
        }
        pending.push(render_condition(condition));
        preceding = condition.conjunction;
    }
    close_group(&mut pending, &mut units);

    units.join(" AND ")
}

fn close_group(pending: &mut Vec<String>, units: &mut Vec<String>) {
    match pending.len() {
        0 => {}
        1 => units.extend(pending.drain(..)),
        _ => {
            units.push(format!("({})", pending.join(" OR ")));
            pending.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::Operator;

    fn cond(field: &str, value: &str) -> Condition {
        Condition::new(field, Operator::Eq, value)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(group_conditions(&[]), "");
    }

    #[test]
    fn test_single_condition_is_bare() {
        let clause = group_conditions(&[cond("Name", "Acme")]);
        assert_eq!(clause, "Name = 'Acme'");
    }

    #[test]
    fn test_all_and_has_no_parentheses() {
        let conditions = vec![
            cond("A", "1").and(),
            cond("B", "2").and(),
            cond("C", "3"),
        ];
        let clause = group_conditions(&conditions);
        assert_eq!(clause, "A = 1 AND B = 2 AND C = 3");
        assert!(!clause.contains('('));
    }

    #[test]
    fn test_trailing_or_run_is_one_unit() {
        let conditions = vec![
            cond("A", "1").and(),
            cond("B", "2").or(),
            cond("C", "3").or(),
            cond("D", "4"),
        ];
        assert_eq!(
            group_conditions(&conditions),
            "A = 1 AND (B = 2 OR C = 3 OR D = 4)"
        );
    }

    #[test]
    fn test_or_run_in_the_middle() {
        let conditions = vec![
            cond("A", "1").and(),
            cond("B", "2").or(),
            cond("C", "3").and(),
            cond("D", "4"),
        ];
        assert_eq!(
            group_conditions(&conditions),
            "A = 1 AND (B = 2 OR C = 3) AND D = 4"
        );
    }

    #[test]
    fn test_leading_or_run() {
        let conditions = vec![cond("A", "1").or(), cond("B", "2").and(), cond("C", "3")];
        assert_eq!(group_conditions(&conditions), "(A = 1 OR B = 2) AND C = 3");
    }

    #[test]
    fn test_separate_or_groups_joined_by_and() {
        let conditions = vec![
            cond("A", "1").or(),
            cond("B", "2").and(),
            cond("C", "3").or(),
            cond("D", "4"),
        ];
        assert_eq!(
            group_conditions(&conditions),
            "(A = 1 OR B = 2) AND (C = 3 OR D = 4)"
        );
    }

    #[test]
    fn test_inactive_conditions_skipped() {
        let conditions = vec![
            cond("A", "1").or(),
            cond("", "ignored").and(),
            cond("B", "2"),
        ];
        assert_eq!(group_conditions(&conditions), "(A = 1 OR B = 2)");
    }

    #[test]
    fn test_last_conjunction_ignored() {
        let conditions = vec![cond("A", "1").and(), cond("B", "2").or()];
        assert_eq!(group_conditions(&conditions), "A = 1 AND B = 2");
    }

    #[test]
    fn test_render_uses_operator_formatting() {
        let condition = Condition::new("Industry", Operator::NotIn, "Tech, Retail");
        assert_eq!(
            render_condition(&condition),
            "Industry NOT IN ('Tech', 'Retail')"
        );
    }
}
