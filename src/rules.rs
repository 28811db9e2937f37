//! Ordered description rules mapping imported statement lines to categories.
//!
//! Rules are plain data evaluated top to bottom; the first pattern contained in
//! the description wins. Matching ignores case, accents and repeated whitespace.

use crate::recurrence::normalize_description;
use crate::schema::CategoryRule;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRules {
    rules: Vec<CategoryRule>,
}

impl CategoryRules {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn push(&mut self, pattern: impl Into<String>, category_id: impl Into<String>) {
        self.rules.push(CategoryRule {
            pattern: pattern.into(),
            category_id: category_id.into(),
        });
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Category id of the first rule whose pattern occurs in `description`.
    pub fn categorize(&self, description: &str) -> Option<&str> {
        let haystack = normalize_description(description);
        self.rules
            .iter()
            .find(|rule| {
                let needle = normalize_description(&rule.pattern);
                !needle.is_empty() && haystack.contains(&needle)
            })
            .map(|rule| rule.category_id.as_str())
    }

    pub fn categorize_all<'a, I>(&self, descriptions: I) -> Vec<Option<&str>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        descriptions
            .into_iter()
            .map(|d| self.categorize(d))
            .collect()
    }
}

impl From<Vec<CategoryRule>> for CategoryRules {
    fn from(rules: Vec<CategoryRule>) -> Self {
        Self::new(rules)
    }
}
