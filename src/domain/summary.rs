use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Amount, AmountError, Expense};

/// Spending for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Amount,
    pub count: usize,
}

/// Per-category spending for one owner, as fed to a chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Only categories with at least one expense appear here.
    pub by_category: BTreeMap<String, Amount>,
    pub overall_total: Amount,
    /// Same totals with counts, largest first (ties by name).
    pub breakdown: Vec<CategoryTotal>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }
}

/// Sum expenses by category in integer cents.
/// Fails only if a total would not fit in an `i64`.
pub fn summarize_expenses(expenses: &[Expense]) -> Result<Summary, AmountError> {
    let mut groups: BTreeMap<String, (Amount, usize)> = BTreeMap::new();
    let mut overall_total = Amount::ZERO;

    for expense in expenses {
        let entry = groups
            .entry(expense.category.clone())
            .or_insert((Amount::ZERO, 0));
        entry.0 = entry
            .0
            .checked_add(expense.amount)
            .ok_or(AmountError::Overflow)?;
        entry.1 += 1;
        overall_total = overall_total
            .checked_add(expense.amount)
            .ok_or(AmountError::Overflow)?;
    }

    let mut breakdown: Vec<CategoryTotal> = groups
        .iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.clone(),
            total: *total,
            count: *count,
        })
        .collect();
    breakdown.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

    Ok(Summary {
        by_category: groups
            .into_iter()
            .map(|(category, (total, _))| (category, total))
            .collect(),
        overall_total,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::domain::MAX_AMOUNT_CENTS;

    fn expense(amount: &str, category: &str) -> Expense {
        Expense::new(
            Uuid::new_v4(),
            amount.parse().unwrap(),
            category,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize_expenses(&[]).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.overall_total, Amount::ZERO);
        assert!(summary.breakdown.is_empty());
    }

    #[test]
    fn test_summarize_groups_by_category() {
        let expenses = vec![
            expense("10.00", "food"),
            expense("5.00", "food"),
            expense("20.00", "transport"),
        ];
        let summary = summarize_expenses(&expenses).unwrap();

        assert_eq!(summary.by_category.len(), 2);
        assert_eq!(summary.by_category["food"].cents(), 1500);
        assert_eq!(summary.by_category["transport"].cents(), 2000);
        assert_eq!(summary.overall_total.cents(), 3500);

        assert_eq!(summary.breakdown[0].category, "transport");
        assert_eq!(summary.breakdown[1].category, "food");
        assert_eq!(summary.breakdown[1].count, 2);
    }

    #[test]
    fn test_summarize_has_no_drift() {
        // 0.10 added ten times is exactly 1.00
        let expenses: Vec<Expense> = (0..10).map(|_| expense("0.10", "coffee")).collect();
        let summary = summarize_expenses(&expenses).unwrap();
        assert_eq!(summary.overall_total.to_string(), "1.00");
    }

    #[test]
    fn test_summarize_largest_amounts_without_overflow() {
        let mut big = expense("0", "x");
        big.amount = Amount::from_cents(MAX_AMOUNT_CENTS).unwrap();
        let expenses = vec![big; 1000];
        let summary = summarize_expenses(&expenses).unwrap();
        assert_eq!(summary.overall_total.cents(), MAX_AMOUNT_CENTS * 1000);
    }
}
