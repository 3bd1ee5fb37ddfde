//! Ordered rule tables, one per domain.
//!
//! Rules are evaluated in declaration order and the first qualifying rule
//! wins. The order in each table is a deliberate tie-break; reordering it
//! changes which column a role resolves to.

use crate::types::{ColumnRole, Domain};

/// How a rule tests a lowercased column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern {
    /// Name contains at least one of `any_of` (ignored when empty), every
    /// entry of `all_of`, and none of `none_of`.
    Contains {
        any_of: &'static [&'static str],
        all_of: &'static [&'static str],
        none_of: &'static [&'static str],
    },
    /// Name equals the literal.
    Exact(&'static str),
}

impl NamePattern {
    pub fn matches(&self, lowered: &str) -> bool {
        match self {
            Self::Contains {
                any_of,
                all_of,
                none_of,
            } => {
                (any_of.is_empty() || any_of.iter().any(|k| lowered.contains(k)))
                    && all_of.iter().all(|k| lowered.contains(k))
                    && !none_of.iter().any(|k| lowered.contains(k))
            }
            Self::Exact(literal) => lowered == *literal,
        }
    }
}

/// One entry of a rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRule {
    pub role: ColumnRole,
    pub pattern: NamePattern,
}

const fn any(role: ColumnRole, any_of: &'static [&'static str]) -> ColumnRule {
    ColumnRule {
        role,
        pattern: NamePattern::Contains {
            any_of,
            all_of: &[],
            none_of: &[],
        },
    }
}

const fn exact(role: ColumnRole, literal: &'static str) -> ColumnRule {
    ColumnRule {
        role,
        pattern: NamePattern::Exact(literal),
    }
}

pub const SALES_RULES: &[ColumnRule] = &[
    any(ColumnRole::Date, &["date", "time"]),
    ColumnRule {
        role: ColumnRole::Revenue,
        pattern: NamePattern::Contains {
            any_of: &["total", "revenue", "amount", "price"],
            all_of: &[],
            none_of: &["unit"],
        },
    },
    any(ColumnRole::Quantity, &["quantity", "qty"]),
    ColumnRule {
        role: ColumnRole::ProductName,
        pattern: NamePattern::Contains {
            any_of: &[],
            all_of: &["product", "name"],
            none_of: &[],
        },
    },
];

pub const INVENTORY_RULES: &[ColumnRule] = &[
    ColumnRule {
        role: ColumnRole::StockLevel,
        pattern: NamePattern::Contains {
            any_of: &["current", "available"],
            all_of: &["stock"],
            none_of: &[],
        },
    },
    any(ColumnRole::DaysSupply, &["days"]),
    ColumnRule {
        role: ColumnRole::ProductName,
        pattern: NamePattern::Contains {
            any_of: &[],
            all_of: &["product", "name"],
            none_of: &[],
        },
    },
];

pub const ADVERTISING_RULES: &[ColumnRule] = &[
    any(ColumnRole::Spend, &["spend"]),
    any(ColumnRole::Clicks, &["clicks"]),
    any(ColumnRole::Impressions, &["impressions"]),
    exact(ColumnRole::CampaignName, "campaign_name"),
    exact(ColumnRole::AttributedSales, "sales"),
];

pub const REVIEW_RULES: &[ColumnRule] = &[exact(ColumnRole::Rating, "rating")];

/// Rule table scoped to one domain's analyzer.
pub fn rules_for(domain: Domain) -> &'static [ColumnRule] {
    match domain {
        Domain::Sales => SALES_RULES,
        Domain::Inventory => INVENTORY_RULES,
        Domain::Advertising => ADVERTISING_RULES,
        Domain::Reviews => REVIEW_RULES,
    }
}

/// Substrings marking a column for numeric coercion at load time.
pub fn numeric_patterns(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Sales => &["quantity", "price", "total", "amount", "qty", "cost", "revenue"],
        Domain::Inventory => &["stock", "quantity", "qty", "days", "supply", "inbound"],
        Domain::Advertising | Domain::Reviews => &[],
    }
}

/// Substrings marking the date column of a date-bearing table.
pub fn date_patterns(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Sales => &["date", "time", "order_date", "transaction_date"],
        _ => &[],
    }
}
