//! Queryable entities and their column allow-lists.

/// Value category of one column, used for literal checks and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Decimal,
    Text,
    /// ISO-8601 `YYYY-MM-DD` stored as text.
    Date,
    /// Stored as `0`/`1`.
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

const DEPARTMENT_COLUMNS: &[Column] = &[
    col("id", ColumnKind::Integer),
    col("name", ColumnKind::Text),
    col("location", ColumnKind::Text),
    col("budget", ColumnKind::Decimal),
];

const EMPLOYEE_COLUMNS: &[Column] = &[
    col("id", ColumnKind::Integer),
    col("name", ColumnKind::Text),
    col("age", ColumnKind::Integer),
    col("email", ColumnKind::Text),
    col("salary", ColumnKind::Decimal),
    col("bonus", ColumnKind::Decimal),
    col("hire_date", ColumnKind::Date),
    col("active", ColumnKind::Bool),
    col("gender", ColumnKind::Text),
    col("dep_id", ColumnKind::Integer),
    col("manager_id", ColumnKind::Integer),
];

const PROJECT_COLUMNS: &[Column] = &[
    col("id", ColumnKind::Integer),
    col("name", ColumnKind::Text),
    col("location", ColumnKind::Text),
    col("budget", ColumnKind::Decimal),
];

const ROLE_COLUMNS: &[Column] = &[col("id", ColumnKind::Integer), col("name", ColumnKind::Text)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryEntity {
    Departments,
    Employees,
    Projects,
    Roles,
}

impl QueryEntity {
    /// Resolves plural, singular and capitalized entity names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "department" | "departments" => Some(Self::Departments),
            "employee" | "employees" => Some(Self::Employees),
            "project" | "projects" => Some(Self::Projects),
            "role" | "roles" => Some(Self::Roles),
            _ => None,
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Self::Departments => "departments",
            Self::Employees => "employees",
            Self::Projects => "projects",
            Self::Roles => "roles",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::Departments => DEPARTMENT_COLUMNS,
            Self::Employees => EMPLOYEE_COLUMNS,
            Self::Projects => PROJECT_COLUMNS,
            Self::Roles => ROLE_COLUMNS,
        }
    }

    /// Looks up a column by case-insensitive name.
    pub fn column(self, name: &str) -> Option<&'static Column> {
        self.columns()
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnKind, QueryEntity};

    #[test]
    fn parse_accepts_singular_and_capitalized_names() {
        assert_eq!(QueryEntity::parse("Employee"), Some(QueryEntity::Employees));
        assert_eq!(QueryEntity::parse("roles"), Some(QueryEntity::Roles));
        assert_eq!(QueryEntity::parse("salaries"), None);
    }

    #[test]
    fn column_lookup_is_case_insensitive() {
        let column = QueryEntity::Employees
            .column("HIRE_DATE")
            .expect("hire_date column");
        assert_eq!(column.kind, ColumnKind::Date);
        assert!(QueryEntity::Roles.column("budget").is_none());
    }
}
