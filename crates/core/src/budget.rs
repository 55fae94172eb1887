use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetOutcome {
    WithinBudget,
    OverBudget,
    NoBudget,
}

impl BudgetOutcome {
    /// A budget of zero or less means none was declared. An estimate equal to
    /// the budget is within it.
    pub fn compare(estimate: f64, budget: f64) -> Self {
        if budget.is_nan() || budget <= 0.0 {
            Self::NoBudget
        } else if estimate > budget {
            Self::OverBudget
        } else {
            Self::WithinBudget
        }
    }

    pub fn is_over_budget(self) -> bool {
        self == Self::OverBudget
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::WithinBudget => "Your selection is within your budget.",
            Self::OverBudget => "This laptop exceeds your budget.",
            Self::NoBudget => "No budget entered.",
        }
    }
}

pub fn compare(estimate: f64, budget: f64) -> BudgetOutcome {
    BudgetOutcome::compare(estimate, budget)
}
