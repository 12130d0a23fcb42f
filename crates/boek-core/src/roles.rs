//! Column role inference
//!
//! The book list has no fixed schema. Columns are recognized by Dutch marker
//! substrings in their (normalized) names, e.g. "titel" or "locatie 2".

use crate::table::normalize_column_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Semantic role a column can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Language,
    Location,
    Title,
    Author,
    Category,
}

impl Role {
    /// All roles, in the priority order used to break ties within one column name
    pub const ALL: [Role; 5] = [
        Role::Language,
        Role::Location,
        Role::Title,
        Role::Author,
        Role::Category,
    ];

    /// Substrings that mark a column as playing this role
    pub fn markers(self) -> &'static [&'static str] {
        match self {
            Role::Language => &["taal"],
            Role::Location => &["locatie"],
            Role::Title => &["titel"],
            Role::Author => &["schrijver", "auteur"],
            Role::Category => &["categorie"],
        }
    }

    /// Whether a normalized column name carries one of this role's markers
    pub fn matches(self, normalized: &str) -> bool {
        self.markers().iter().any(|m| normalized.contains(m))
    }

    /// Whether values in this role's column are capitalized on write
    pub fn capitalizes(self) -> bool {
        matches!(self, Role::Language | Role::Location | Role::Category)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Language => "language",
            Role::Location => "location",
            Role::Title => "title",
            Role::Author => "author",
            Role::Category => "category",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "language" | "taal" => Ok(Role::Language),
            "location" | "locatie" => Ok(Role::Location),
            "title" | "titel" => Ok(Role::Title),
            "author" | "schrijver" | "auteur" => Ok(Role::Author),
            "category" | "categorie" => Ok(Role::Category),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Mapping from role to the (normalized) name of the column that plays it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleMap {
    assignments: BTreeMap<Role, String>,
}

impl RoleMap {
    /// Column assigned to a role, if any
    pub fn get(&self, role: Role) -> Option<&str> {
        self.assignments.get(&role).map(String::as_str)
    }

    /// Role played by a column, if any
    pub fn role_of(&self, column: &str) -> Option<Role> {
        self.assignments
            .iter()
            .find(|(_, c)| c.as_str() == column)
            .map(|(r, _)| *r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.assignments.iter().map(|(r, c)| (*r, c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Assign roles to columns.
///
/// Columns are visited in order; within a column, roles are tried in
/// [`Role::ALL`] order. A column takes the first role whose marker it contains
/// and that no earlier column has claimed, and never more than one role.
pub fn resolve_roles<S: AsRef<str>>(columns: &[S]) -> RoleMap {
    let mut map = RoleMap::default();

    for column in columns {
        let normalized = normalize_column_name(column.as_ref());
        let role = Role::ALL
            .into_iter()
            .find(|r| !map.assignments.contains_key(r) && r.matches(&normalized));
        if let Some(role) = role {
            map.assignments.insert(role, normalized);
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_standard_columns() {
        let map = resolve_roles(&["Titel", "Auteur", "Taal", "Locatie  "]);

        assert_eq!(map.get(Role::Title), Some("titel"));
        assert_eq!(map.get(Role::Author), Some("auteur"));
        assert_eq!(map.get(Role::Language), Some("taal"));
        assert_eq!(map.get(Role::Location), Some("locatie"));
        assert_eq!(map.get(Role::Category), None);
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_first_column_wins() {
        let map = resolve_roles(&["titel", "ondertitel", "schrijver", "auteur 2"]);

        assert_eq!(map.get(Role::Title), Some("titel"));
        assert_eq!(map.get(Role::Author), Some("schrijver"));
        assert_eq!(map.role_of("ondertitel"), None);
        assert_eq!(map.role_of("auteur 2"), None);
    }

    #[test]
    fn test_multi_marker_column_takes_priority_role() {
        let map = resolve_roles(&["categorie_taal"]);
        assert_eq!(map.get(Role::Language), Some("categorie_taal"));
        assert_eq!(map.get(Role::Category), None);
    }

    #[test]
    fn test_multi_marker_column_falls_through_to_free_role() {
        let map = resolve_roles(&["taal", "categorie_taal"]);
        assert_eq!(map.get(Role::Language), Some("taal"));
        assert_eq!(map.get(Role::Category), Some("categorie_taal"));
    }

    #[test]
    fn test_no_column_holds_two_roles() {
        let columns = [
            "Titel",
            "titel_auteur",
            "taal locatie",
            "categorie",
            "Schrijver",
            "boek taal",
        ];
        let map = resolve_roles(&columns);

        let mut seen = std::collections::HashSet::new();
        for (_, column) in map.iter() {
            assert!(seen.insert(column.to_string()), "column {} assigned twice", column);
        }
    }

    #[test]
    fn test_empty_input() {
        let map = resolve_roles::<&str>(&[]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Taal".parse::<Role>(), Ok(Role::Language));
        assert_eq!("author".parse::<Role>(), Ok(Role::Author));
        assert!("isbn".parse::<Role>().is_err());
    }
}
