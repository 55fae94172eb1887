//! Downgrade suggestions for over-budget selections.
//!
//! Each [`DowngradeRule`] is evaluated on its own, in table order: when the
//! trigger matches the selected value, the first catalog value (in catalog
//! order) accepted by the candidate predicate is proposed. Suggestions are
//! heuristic and are not re-priced.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::encoder::UserSelection;

pub const HIGH_END_CPU_TOKENS: &[&str] = &["i7", "i9", "Ryzen 7", "Ryzen 9"];
pub const LOW_END_CPU_TOKENS: &[&str] = &["i5", "i3", "Ryzen 3", "Ryzen 5"];
pub const EXPENSIVE_BRANDS: &[&str] = &["Apple", "Dell", "MSI"];

pub const NO_SUGGESTIONS_MESSAGE: &str =
    "No obvious downgrades found. Try adjusting other specs manually.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Predicate {
    ContainsAny {
        tokens: Vec<String>,
        #[serde(default)]
        ignore_case: bool,
    },
    StartsWith {
        prefix: String,
        #[serde(default)]
        ignore_case: bool,
    },
    OneOf {
        values: Vec<String>,
    },
    Not {
        predicate: Box<Predicate>,
    },
}

impl Predicate {
    pub fn contains_any(tokens: &[&str]) -> Self {
        Self::ContainsAny { tokens: owned(tokens), ignore_case: false }
    }

    pub fn contains_ignore_case(token: &str) -> Self {
        Self::ContainsAny { tokens: vec![token.to_owned()], ignore_case: true }
    }

    pub fn starts_with_ignore_case(prefix: &str) -> Self {
        Self::StartsWith { prefix: prefix.to_owned(), ignore_case: true }
    }

    pub fn one_of(values: &[&str]) -> Self {
        Self::OneOf { values: owned(values) }
    }

    pub fn negate(self) -> Self {
        Self::Not { predicate: Box::new(self) }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::ContainsAny { tokens, ignore_case: false } => {
                tokens.iter().any(|token| value.contains(token.as_str()))
            }
            Self::ContainsAny { tokens, ignore_case: true } => {
                let value = value.to_lowercase();
                tokens.iter().any(|token| value.contains(&token.to_lowercase()))
            }
            Self::StartsWith { prefix, ignore_case: false } => value.starts_with(prefix.as_str()),
            Self::StartsWith { prefix, ignore_case: true } => {
                value.to_lowercase().starts_with(&prefix.to_lowercase())
            }
            Self::OneOf { values } => values.iter().any(|candidate| candidate == value),
            Self::Not { predicate } => !predicate.matches(value),
        }
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

/// `rationale` may reference `{current}` and `{proposed}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowngradeRule {
    pub attribute: String,
    pub label: String,
    pub trigger: Predicate,
    pub candidate: Predicate,
    pub rationale: String,
}

impl DowngradeRule {
    fn evaluate(&self, selection: &UserSelection, catalog: &Catalog) -> Option<Suggestion> {
        let current = selection.get(&self.attribute)?;
        if !self.trigger.matches(current) {
            return None;
        }

        let proposed = catalog
            .distinct_values(&self.attribute)
            .into_iter()
            .find(|value| self.candidate.matches(value))?;

        Some(Suggestion {
            attribute: self.attribute.clone(),
            label: self.label.clone(),
            current: current.to_owned(),
            proposed: proposed.to_owned(),
            rationale: render_rationale(&self.rationale, current, proposed),
        })
    }
}

/// Substitutes `{current}` and `{proposed}` in one pass. Any other `{...}` text,
/// including placeholders inside the substituted values, is kept verbatim.
fn render_rationale(template: &str, current: &str, proposed: &str) -> String {
    let mut rendered = String::with_capacity(template.len() + current.len() + proposed.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{current}") {
            rendered.push_str(current);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{proposed}") {
            rendered.push_str(proposed);
            rest = after;
        } else {
            rendered.push('{');
            rest = &tail[1..];
        }
    }

    rendered.push_str(rest);
    rendered
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub attribute: String,
    pub label: String,
    pub current: String,
    pub proposed: String,
    pub rationale: String,
}

/// Ordered rule table. Order is the output order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvisorRules {
    rules: Vec<DowngradeRule>,
}

impl AdvisorRules {
    pub fn new(rules: Vec<DowngradeRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[DowngradeRule] {
        &self.rules
    }
}

impl Default for AdvisorRules {
    fn default() -> Self {
        Self::new(vec![
            DowngradeRule {
                attribute: "Processor".to_owned(),
                label: "Processor".to_owned(),
                trigger: Predicate::contains_any(HIGH_END_CPU_TOKENS),
                candidate: Predicate::contains_any(LOW_END_CPU_TOKENS),
                rationale: "Consider {proposed} instead of {current}".to_owned(),
            },
            DowngradeRule {
                attribute: "RAM".to_owned(),
                label: "RAM".to_owned(),
                trigger: Predicate::contains_any(&["16GB", "32GB"]),
                candidate: Predicate::contains_any(&["8GB"]),
                rationale: "Downgrade to {proposed} instead of {current}".to_owned(),
            },
            DowngradeRule {
                attribute: "Memory".to_owned(),
                label: "Storage".to_owned(),
                trigger: Predicate::contains_any(&["1TB", "SSD"]),
                candidate: Predicate::contains_any(&["512GB", "HDD"]),
                rationale: "Consider {proposed} instead of {current}".to_owned(),
            },
            DowngradeRule {
                attribute: "Gpu".to_owned(),
                label: "Graphics".to_owned(),
                trigger: Predicate::starts_with_ignore_case("intel").negate(),
                candidate: Predicate::contains_ignore_case("intel"),
                rationale: "Choose integrated GPU like {proposed} instead of {current}".to_owned(),
            },
            DowngradeRule {
                attribute: "Company".to_owned(),
                label: "Brand".to_owned(),
                trigger: Predicate::one_of(EXPENSIVE_BRANDS),
                candidate: Predicate::one_of(EXPENSIVE_BRANDS).negate(),
                rationale: "Try cost-effective brand like {proposed} instead of {current}"
                    .to_owned(),
            },
        ])
    }
}

#[derive(Clone, Debug, Default)]
pub struct DowngradeAdvisor {
    rules: AdvisorRules,
}

impl DowngradeAdvisor {
    pub fn new(rules: AdvisorRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &AdvisorRules {
        &self.rules
    }

    /// An empty result means no rule fired or no candidate exists.
    pub fn suggest(&self, selection: &UserSelection, catalog: &Catalog) -> Vec<Suggestion> {
        self.rules.rules().iter().filter_map(|rule| rule.evaluate(selection, catalog)).collect()
    }
}
