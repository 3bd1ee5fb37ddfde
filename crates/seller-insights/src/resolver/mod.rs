//! Column role resolution.
//!
//! Given a table's column names and a domain's ordered rule table, picks the
//! column that plays each semantic role. Resolution is a pure function of the
//! name list: no data is inspected.

mod rules;

pub use rules::{
    ADVERTISING_RULES, ColumnRule, INVENTORY_RULES, NamePattern, REVIEW_RULES, SALES_RULES,
    date_patterns, numeric_patterns, rules_for,
};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{ColumnRole, Domain};

/// Columns chosen for each role. Roles without a match are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedColumns {
    columns: BTreeMap<ColumnRole, String>,
}

impl ResolvedColumns {
    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    pub fn contains(&self, role: ColumnRole) -> bool {
        self.columns.contains_key(&role)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnRole, &str)> {
        self.columns.iter().map(|(role, name)| (*role, name.as_str()))
    }
}

/// Role of the first rule `column_name` satisfies, if any.
pub fn role_of(column_name: &str, rules: &[ColumnRule]) -> Option<ColumnRole> {
    let lowered = column_name.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.pattern.matches(&lowered))
        .map(|rule| rule.role)
}

/// Resolve every role in `rules` against `column_names`.
///
/// For each rule in declaration order, the first name in column order that
/// satisfies it is taken, unless an earlier rule already claimed that role.
pub fn resolve<S: AsRef<str>>(column_names: &[S], rules: &[ColumnRule]) -> ResolvedColumns {
    let lowered: Vec<String> = column_names
        .iter()
        .map(|name| name.as_ref().to_lowercase())
        .collect();

    let mut columns = BTreeMap::new();
    for rule in rules {
        if columns.contains_key(&rule.role) {
            continue;
        }
        if let Some(idx) = lowered.iter().position(|name| rule.pattern.matches(name)) {
            columns.insert(rule.role, column_names[idx].as_ref().to_string());
        }
    }

    ResolvedColumns { columns }
}

/// Resolve against the rule table of `domain`.
pub fn resolve_for<S: AsRef<str>>(column_names: &[S], domain: Domain) -> ResolvedColumns {
    resolve(column_names, rules_for(domain))
}

/// First column whose lowercased name contains any of `patterns`.
pub fn first_containing<'a, S: AsRef<str>>(
    column_names: &'a [S],
    patterns: &[&str],
) -> Option<&'a str> {
    column_names
        .iter()
        .map(|name| name.as_ref())
        .find(|name| {
            let lowered = name.to_lowercase();
            patterns.iter().any(|p| lowered.contains(p))
        })
}
