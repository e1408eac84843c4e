//! The set of queryable tables and views.

use std::collections::BTreeMap;

/// Fully-qualified `schema.table` names the validator will admit.
///
/// Lookup is case-insensitive, matching SQL Server's default collation:
/// `Production.Product` and `production.PRODUCT` are the same entry. Built
/// once from configuration and shared immutably; there is no process-wide
/// singleton, so tests construct their own instances.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    // Uppercase-folded name -> name as configured.
    entries: BTreeMap<String, String>,
}

impl Allowlist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = BTreeMap::new();
        for name in names {
            let name = name.into();
            let trimmed = name.trim();
            if trimmed.is_empty() {
                continue;
            }
            entries.insert(trimmed.to_uppercase(), trimmed.to_string());
        }
        Self { entries }
    }

    /// Parses a comma-separated allowlist value
    /// (`Sales.Customer,Production.Product`).
    pub fn from_csv(value: &str) -> Self {
        Self::new(value.split(','))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.trim().to_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries as configured, in deterministic (folded) order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }
}

impl FromIterator<String> for Allowlist {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let allow = Allowlist::from_csv("Production.Product,Sales.Customer");
        assert!(allow.contains("Production.Product"));
        assert!(allow.contains("production.PRODUCT"));
        assert!(allow.contains("PRODUCTION.product"));
        assert!(!allow.contains("Sales.SalesOrderHeader"));
    }

    #[test]
    fn csv_parsing_trims_and_drops_blanks() {
        let allow = Allowlist::from_csv(" Sales.Customer , ,Production.Product,");
        assert_eq!(allow.len(), 2);
        assert!(allow.contains("sales.customer"));
    }

    #[test]
    fn duplicate_entries_collapse() {
        let allow = Allowlist::from_csv("Sales.Customer,SALES.CUSTOMER");
        assert_eq!(allow.len(), 1);
    }
}
