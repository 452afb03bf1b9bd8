use std::fmt;

use shared::domain::{
    BudgetListing, Department, DepartmentMemberListing, EmployeeListing, ManagerListing,
    RoleListing,
};

/// Cells wider than this are cut with an ellipsis.
const MAX_COLUMN_WIDTH: usize = 40;

const NULL: &str = "NULL";

/// A listing row that knows its projection.
pub trait TableRow {
    /// Column names in projection order.
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

/// Rendered query result: column names in projection order plus string cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_rows<T: TableRow>(rows: &[T]) -> Self {
        Self {
            columns: T::COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            rows: rows.iter().map(TableRow::cells).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Box-drawn rendering followed by a row count line.
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| width_of(c)).collect();
        for row in &self.rows {
            for (i, value) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(width_of(value)).min(MAX_COLUMN_WIDTH);
                }
            }
        }

        let mut output = String::new();
        push_border(&mut output, &widths, ('┌', '┬', '┐'));
        push_line(&mut output, &widths, &self.columns);
        push_border(&mut output, &widths, ('├', '┼', '┤'));
        for row in &self.rows {
            push_line(&mut output, &widths, row);
        }
        push_border(&mut output, &widths, ('└', '┴', '┘'));

        let row_label = if self.rows.len() == 1 { "row" } else { "rows" };
        output.push_str(&format!("({} {row_label})\n", self.rows.len()));
        output
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn width_of(value: &str) -> usize {
    value.chars().count()
}

fn truncate_value(value: &str, max_width: usize) -> String {
    if width_of(value) <= max_width {
        value.to_string()
    } else if max_width <= 3 {
        value.chars().take(max_width).collect()
    } else {
        let take = max_width - 3;
        format!("{}...", value.chars().take(take).collect::<String>())
    }
}

fn push_border(output: &mut String, widths: &[usize], (left, mid, right): (char, char, char)) {
    output.push(left);
    for (idx, width) in widths.iter().enumerate() {
        output.push_str(&"─".repeat(width + 2));
        output.push(if idx == widths.len() - 1 { right } else { mid });
    }
    output.push('\n');
}

fn push_line(output: &mut String, widths: &[usize], values: &[String]) {
    output.push('│');
    for (i, width) in widths.iter().enumerate() {
        let value = values.get(i).map(String::as_str).unwrap_or_default();
        let truncated = truncate_value(value, *width);
        output.push(' ');
        output.push_str(&truncated);
        output.push_str(&" ".repeat(width - width_of(&truncated)));
        output.push_str(" │");
    }
    output.push('\n');
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn or_null(value: Option<&str>) -> String {
    value.unwrap_or(NULL).to_string()
}

impl TableRow for Department {
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    fn cells(&self) -> Vec<String> {
        vec![self.id.0.to_string(), self.name.clone()]
    }
}

impl TableRow for RoleListing {
    const COLUMNS: &'static [&'static str] = &["id", "title", "salary", "department"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.0.to_string(),
            self.title.clone(),
            money(self.salary),
            or_null(self.department.as_deref()),
        ]
    }
}

impl TableRow for EmployeeListing {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "title",
        "department",
        "salary",
        "manager",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.0.to_string(),
            self.first_name.clone(),
            self.last_name.clone(),
            or_null(self.title.as_deref()),
            or_null(self.department.as_deref()),
            self.salary.map(money).unwrap_or_else(|| NULL.to_string()),
            self.manager.clone(),
        ]
    }
}

impl TableRow for ManagerListing {
    const COLUMNS: &'static [&'static str] = &["id", "employee_name", "manager_name"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.0.to_string(),
            self.employee_name.clone(),
            or_null(self.manager_name.as_deref()),
        ]
    }
}

impl TableRow for DepartmentMemberListing {
    const COLUMNS: &'static [&'static str] = &["id", "employee_name", "department_name"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.0.to_string(),
            self.employee_name.clone(),
            self.department_name.clone(),
        ]
    }
}

impl TableRow for BudgetListing {
    const COLUMNS: &'static [&'static str] = &["id", "name", "total_budget"];

    fn cells(&self) -> Vec<String> {
        vec![self.id.0.to_string(), self.name.clone(), money(self.total_budget)]
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::{DepartmentId, RoleId};

    use super::*;

    #[test]
    fn renders_columns_in_projection_order() {
        let table = Table::from_rows(&[RoleListing {
            id: RoleId(1),
            title: "Rep".into(),
            salary: 50000.0,
            department: None,
        }]);
        assert_eq!(table.columns, ["id", "title", "salary", "department"]);
        assert_eq!(table.cell(0, "salary"), Some("50000.00"));
        assert_eq!(table.cell(0, "department"), Some("NULL"));
        assert_eq!(table.cell(0, "missing"), None);
    }

    #[test]
    fn renders_box_with_row_count() {
        let table = Table::from_rows(&[Department {
            id: DepartmentId(7),
            name: "Sales".into(),
        }]);
        let expected = "\
┌────┬───────┐
│ id │ name  │
├────┼───────┤
│ 7  │ Sales │
└────┴───────┘
(1 row)
";
        assert_eq!(table.render(), expected);
    }

    #[test]
    fn empty_table_still_shows_header() {
        let table = Table::from_rows::<Department>(&[]);
        assert!(table.is_empty());
        assert!(table.render().contains("│ id │ name │"));
        assert!(table.render().ends_with("(0 rows)\n"));
    }

    #[test]
    fn long_values_are_truncated() {
        assert_eq!(truncate_value("abcdefgh", 6), "abc...");
        assert_eq!(truncate_value("abc", 6), "abc");
    }
}
