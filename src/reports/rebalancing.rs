//! Target-allocation rebalancing suggestions
//!
//! Compares each category's current value with its target share of the
//! portfolio and proposes the buy or sell amount that closes the gap.

use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::valuation::{percentage_of, CategoryAllocation};
use crate::store::{Category, UNCATEGORIZED};

/// What to do with a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RebalanceAction {
    Buy,
    Sell,
    NoAction,
}

impl RebalanceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RebalanceAction::Buy => "BUY",
            RebalanceAction::Sell => "SELL",
            RebalanceAction::NoAction => "HOLD",
        }
    }
}

/// Suggestion for a category that has a target
#[derive(Debug, Clone, Serialize)]
pub struct RebalancingSuggestion {
    pub category_id: i64,
    pub name: String,
    pub current_value: Decimal,
    pub current_percentage: Decimal,
    pub target_percentage: Decimal,
    pub target_value: Decimal,
    /// `target_value - current_value`; positive means underweight
    pub difference: Decimal,
    pub action: RebalanceAction,
    /// Absolute amount to buy or sell; zero for `NoAction`
    pub amount: Decimal,
}

/// Informational row (no target, or the Uncategorized bucket)
#[derive(Debug, Clone, Serialize)]
pub struct AllocationRow {
    pub category_id: Option<i64>,
    pub name: String,
    pub current_value: Decimal,
    pub current_percentage: Decimal,
}

/// Raised when targets do not add up to 100%
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SumWarning {
    pub target_sum: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RebalancingResult {
    pub total_value: Decimal,
    /// Ordered by descending absolute difference, ties by name
    pub suggestions: Vec<RebalancingSuggestion>,
    pub no_target: Vec<AllocationRow>,
    pub uncategorized: AllocationRow,
    pub target_sum: Decimal,
    pub sum_warning: Option<SumWarning>,
}

impl RebalancingResult {
    /// Buy and sell suggestions in summary order
    pub fn actionable(&self) -> impl Iterator<Item = &RebalancingSuggestion> {
        self.suggestions
            .iter()
            .filter(|s| s.action != RebalanceAction::NoAction)
    }
}

/// Build suggestions from current allocations and category targets.
///
/// Categories missing from `allocations` count as holding nothing. The
/// Uncategorized bucket never takes part in the target sum.
pub fn suggest(
    allocations: &[CategoryAllocation],
    categories: &[Category],
    total_value: Decimal,
    epsilon: Decimal,
) -> RebalancingResult {
    let current: HashMap<i64, Decimal> = allocations
        .iter()
        .filter_map(|a| a.category_id.map(|id| (id, a.value)))
        .collect();

    let mut suggestions = Vec::new();
    let mut no_target = Vec::new();
    let mut target_sum = Decimal::ZERO;

    for category in categories {
        let current_value = current.get(&category.id).copied().unwrap_or(Decimal::ZERO);
        let current_percentage = percentage_of(current_value, total_value);

        match category.target_percentage {
            Some(target_percentage) => {
                target_sum += target_percentage;
                let target_value = target_percentage / Decimal::ONE_HUNDRED * total_value;
                let difference = target_value - current_value;
                let (action, amount) = if difference > epsilon {
                    (RebalanceAction::Buy, difference)
                } else if difference < -epsilon {
                    (RebalanceAction::Sell, difference.abs())
                } else {
                    (RebalanceAction::NoAction, Decimal::ZERO)
                };
                debug!(
                    "{}: current {} target {} -> {} {}",
                    category.name,
                    current_value,
                    target_value,
                    action.as_str(),
                    amount
                );
                suggestions.push(RebalancingSuggestion {
                    category_id: category.id,
                    name: category.name.clone(),
                    current_value,
                    current_percentage,
                    target_percentage,
                    target_value,
                    difference,
                    action,
                    amount,
                });
            }
            None => no_target.push(AllocationRow {
                category_id: Some(category.id),
                name: category.name.clone(),
                current_value,
                current_percentage,
            }),
        }
    }

    suggestions.sort_by(compare_suggestions);

    let uncategorized_value: Decimal = allocations
        .iter()
        .filter(|a| a.is_uncategorized())
        .map(|a| a.value)
        .sum();

    let sum_warning = if !suggestions.is_empty()
        && (target_sum - Decimal::ONE_HUNDRED).abs() > epsilon
    {
        warn!("Category targets add up to {}%, not 100%", target_sum);
        Some(SumWarning { target_sum })
    } else {
        None
    };

    RebalancingResult {
        total_value,
        suggestions,
        no_target,
        uncategorized: AllocationRow {
            category_id: None,
            name: UNCATEGORIZED.to_string(),
            current_value: uncategorized_value,
            current_percentage: percentage_of(uncategorized_value, total_value),
        },
        target_sum,
        sum_warning,
    }
}

fn compare_suggestions(a: &RebalancingSuggestion, b: &RebalancingSuggestion) -> Ordering {
    b.difference
        .abs()
        .cmp(&a.difference.abs())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}
