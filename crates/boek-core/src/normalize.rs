//! Text cleanup applied to every table right before it is persisted

use crate::roles::RoleMap;
use crate::table::Table;

/// Trim and collapse internal whitespace runs to a single space
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercase the first character, leave the rest untouched
pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalize a single cell for the given column
pub fn normalize_cell(value: &str, column: &str, roles: &RoleMap) -> String {
    let cleaned = normalize_whitespace(value);
    match roles.role_of(column) {
        Some(role) if role.capitalizes() => capitalize_first(&cleaned),
        _ => cleaned,
    }
}

/// Return a normalized copy of the table; the input is left untouched.
///
/// Location, language and category cells are capitalized; every cell gets
/// whitespace cleanup. Applying this twice gives the same result as once.
pub fn normalize_for_write(table: &Table, roles: &RoleMap) -> Table {
    let mut out = table.clone();
    for column in &table.columns {
        for row in &mut out.rows {
            if let Some(cell) = row.cells.get_mut(column.index) {
                *cell = normalize_cell(cell, &column.name, roles);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::resolve_roles;

    fn sample() -> (Table, RoleMap) {
        let mut table = Table::with_columns(["titel", "schrijver", "taal", "locatie", "categorie", "notitie"]);
        table.push_cells(
            [
                "  de   avond is  ongewis ",
                " jan\twolkers ",
                " nederlands",
                "kast  boven",
                "roman",
                "  eerste   druk ",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );
        let roles = resolve_roles(&table.column_names());
        (table, roles)
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_capitalize_first_keeps_rest() {
        assert_eq!(capitalize_first("engels"), "Engels");
        assert_eq!(capitalize_first("kast BOVEN"), "Kast BOVEN");
        assert_eq!(capitalize_first("één"), "Één");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_normalize_for_write_by_role() {
        let (table, roles) = sample();
        let out = normalize_for_write(&table, &roles);
        let cells = &out.rows[0].cells;

        assert_eq!(cells[0], "de avond is ongewis");
        assert_eq!(cells[1], "jan wolkers");
        assert_eq!(cells[2], "Nederlands");
        assert_eq!(cells[3], "Kast boven");
        assert_eq!(cells[4], "Roman");
        assert_eq!(cells[5], "eerste druk");

        // input untouched
        assert_eq!(table.rows[0].cells[2], " nederlands");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let (table, roles) = sample();
        let once = normalize_for_write(&table, &roles);
        let twice = normalize_for_write(&once, &roles);
        assert_eq!(once, twice);
    }
}
