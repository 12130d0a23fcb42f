//! Search, filters and summary counts over the book table

use crate::roles::{Role, RoleMap};
use crate::table::Table;
use serde::Serialize;
use std::collections::BTreeSet;

/// Positions of records where any cell contains `query`, ignoring case.
/// An empty query matches every record.
pub fn search(table: &Table, query: &str) -> Vec<usize> {
    let needle = query.trim().to_lowercase();
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            needle.is_empty() || r.cells.iter().any(|c| c.to_lowercase().contains(&needle))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Search text plus optional exact-match filters on category and location
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub query: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.category.is_none() && self.location.is_none()
    }

    /// Positions matching every set criterion, in table order.
    ///
    /// A category or location filter is ignored when the table has no
    /// column with that role.
    pub fn apply(&self, table: &Table, roles: &RoleMap) -> Vec<usize> {
        let mut positions = search(table, self.query.as_deref().unwrap_or(""));

        for (role, wanted) in [
            (Role::Category, &self.category),
            (Role::Location, &self.location),
        ] {
            let (Some(wanted), Some(column)) = (wanted, roles.get(role)) else {
                continue;
            };
            positions.retain(|&p| table.cell(p, column) == Some(wanted.as_str()));
        }

        positions
    }
}

/// Sorted distinct non-empty values of a column
pub fn distinct_values(table: &Table, column: &str) -> Vec<String> {
    let Some(col) = table.find_column(column) else {
        return Vec::new();
    };
    table
        .rows
        .iter()
        .filter_map(|r| r.get(col.index))
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Headline numbers for the catalog overview
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub languages: usize,
    pub categories: usize,
    pub locations: usize,
}

impl CatalogStats {
    pub fn compute(table: &Table, roles: &RoleMap) -> Self {
        let count = |role| {
            roles
                .get(role)
                .map(|c| distinct_values(table, c).len())
                .unwrap_or(0)
        };
        Self {
            total: table.row_count(),
            languages: count(Role::Language),
            categories: count(Role::Category),
            locations: count(Role::Location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::resolve_roles;

    fn books() -> (Table, RoleMap) {
        let mut table = Table::with_columns(["titel", "schrijver", "taal", "categorie", "locatie"]);
        for row in [
            ["Dune", "Frank Herbert", "Engels", "Sciencefiction", "Kast"],
            ["Emma", "Jane Austen", "Engels", "Roman", "Zolder"],
            ["Max Havelaar", "Multatuli", "Nederlands", "Roman", "Kast"],
            ["Naamloos", "", "", "", ""],
        ] {
            table.push_cells(row.iter().map(|s| s.to_string()).collect());
        }
        let roles = resolve_roles(&table.column_names());
        (table, roles)
    }

    #[test]
    fn test_search_any_cell_ignoring_case() {
        let (table, _) = books();
        assert_eq!(search(&table, "austen"), vec![1]);
        assert_eq!(search(&table, " ROMAN "), vec![1, 2]);
        assert_eq!(search(&table, ""), vec![0, 1, 2, 3]);
        assert!(search(&table, "tolkien").is_empty());
    }

    #[test]
    fn test_filter_combines_criteria() {
        let (table, roles) = books();
        let filter = Filter {
            query: Some("a".to_string()),
            category: Some("Roman".to_string()),
            location: Some("Kast".to_string()),
        };
        assert_eq!(filter.apply(&table, &roles), vec![2]);
    }

    #[test]
    fn test_filter_on_missing_role_is_ignored() {
        let mut table = Table::with_columns(["titel"]);
        table.push_cells(vec!["Dune".to_string()]);
        let roles = resolve_roles(&table.column_names());

        let filter = Filter {
            category: Some("Roman".to_string()),
            ..Filter::default()
        };
        assert_eq!(filter.apply(&table, &roles), vec![0]);
    }

    #[test]
    fn test_distinct_values_sorted_non_empty() {
        let (table, _) = books();
        assert_eq!(distinct_values(&table, "locatie"), vec!["Kast", "Zolder"]);
        assert!(distinct_values(&table, "isbn").is_empty());
    }

    #[test]
    fn test_stats() {
        let (table, roles) = books();
        let stats = CatalogStats::compute(&table, &roles);
        assert_eq!(
            stats,
            CatalogStats {
                total: 4,
                languages: 2,
                categories: 2,
                locations: 2,
            }
        );
    }
}
