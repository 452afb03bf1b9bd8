use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{
    BudgetListing, Department, DepartmentId, DepartmentMemberListing, EmployeeChoice, EmployeeId,
    EmployeeListing, EntityKind, ManagerListing, NewEmployee, RoleChoice, RoleId, RoleListing,
    NO_MANAGER,
};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS department (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS role (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        title         TEXT NOT NULL,
        salary        REAL NOT NULL CHECK (salary >= 0),
        department_id INTEGER REFERENCES department(id) ON DELETE SET NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS employee (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name  TEXT NOT NULL,
        role_id    INTEGER REFERENCES role(id) ON DELETE SET NULL,
        manager_id INTEGER REFERENCES employee(id) ON DELETE SET NULL
    )
    "#,
];

/// Point lookups by display column. Split out so resolvers can be tested
/// against a store that only answers lookups.
#[async_trait]
pub trait LookupStore: Send + Sync {
    /// Id of the first row (lowest id) whose display column equals
    /// `display_name`. Managers and employees match on "first last".
    async fn lookup_id(&self, kind: EntityKind, display_name: &str) -> Result<Option<i64>>;
}

#[async_trait]
pub trait PersonnelStore: LookupStore {
    async fn list_departments(&self) -> Result<Vec<Department>>;
    async fn insert_department(&self, name: &str) -> Result<DepartmentId>;
    async fn delete_department(&self, department_id: DepartmentId) -> Result<u64>;

    async fn list_roles(&self) -> Result<Vec<RoleListing>>;
    async fn role_choices(&self) -> Result<Vec<RoleChoice>>;
    async fn insert_role(
        &self,
        title: &str,
        salary: f64,
        department_id: DepartmentId,
    ) -> Result<RoleId>;
    async fn delete_role(&self, role_id: RoleId) -> Result<u64>;

    async fn list_employees(&self) -> Result<Vec<EmployeeListing>>;
    async fn employee_choices(&self) -> Result<Vec<EmployeeChoice>>;
    async fn insert_employee(&self, employee: &NewEmployee) -> Result<EmployeeId>;
    async fn delete_employee(&self, employee_id: EmployeeId) -> Result<u64>;
    /// Reassigns every employee whose full name matches.
    async fn update_employee_role(&self, full_name: &str, role_id: RoleId) -> Result<u64>;

    async fn employees_by_manager(&self) -> Result<Vec<ManagerListing>>;
    async fn employees_by_department(&self) -> Result<Vec<DepartmentMemberListing>>;
    /// Salary totals per department, counting one role salary per employee.
    /// Departments without employees are not returned.
    async fn utilized_budget(&self) -> Result<Vec<BudgetListing>>;
}

#[derive(Clone, Debug)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    /// Opens the database behind a single long-lived connection and creates
    /// any missing tables.
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url '{database_url}'"))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open database '{database_url}'"))?;

        let storage = Self { pool };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("failed to create personnel tables")?;
        }
        Ok(())
    }

    async fn delete_by_id(&self, statement: &str, id: i64) -> Result<u64> {
        let result = sqlx::query(statement).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl LookupStore for Storage {
    async fn lookup_id(&self, kind: EntityKind, display_name: &str) -> Result<Option<i64>> {
        let statement = match kind {
            EntityKind::Department => {
                "SELECT id FROM department WHERE name = ? ORDER BY id LIMIT 1"
            }
            EntityKind::Role => "SELECT id FROM role WHERE title = ? ORDER BY id LIMIT 1",
            EntityKind::Employee | EntityKind::Manager => {
                "SELECT id FROM employee WHERE first_name || ' ' || last_name = ? ORDER BY id LIMIT 1"
            }
        };
        let id = sqlx::query_scalar::<_, i64>(statement)
            .bind(display_name)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to look up {kind} '{display_name}'"))?;
        Ok(id)
    }
}

#[async_trait]
impl PersonnelStore for Storage {
    async fn list_departments(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query("SELECT id, name FROM department ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| -> Result<Department> {
                Ok(Department {
                    id: DepartmentId(r.try_get("id")?),
                    name: r.try_get("name")?,
                })
            })
            .collect()
    }

    async fn insert_department(&self, name: &str) -> Result<DepartmentId> {
        let rec = sqlx::query("INSERT INTO department (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(DepartmentId(rec.try_get(0)?))
    }

    async fn delete_department(&self, department_id: DepartmentId) -> Result<u64> {
        self.delete_by_id("DELETE FROM department WHERE id = ?", department_id.0)
            .await
    }

    async fn list_roles(&self) -> Result<Vec<RoleListing>> {
        let rows = sqlx::query(
            "SELECT role.id, role.title, role.salary, department.name AS department
             FROM role
             LEFT JOIN department ON role.department_id = department.id
             ORDER BY role.id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| -> Result<RoleListing> {
                Ok(RoleListing {
                    id: RoleId(r.try_get("id")?),
                    title: r.try_get("title")?,
                    salary: r.try_get("salary")?,
                    department: r.try_get("department")?,
                })
            })
            .collect()
    }

    async fn role_choices(&self) -> Result<Vec<RoleChoice>> {
        let rows = sqlx::query("SELECT id, title FROM role ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| -> Result<RoleChoice> {
                Ok(RoleChoice {
                    id: RoleId(r.try_get("id")?),
                    title: r.try_get("title")?,
                })
            })
            .collect()
    }

    async fn insert_role(
        &self,
        title: &str,
        salary: f64,
        department_id: DepartmentId,
    ) -> Result<RoleId> {
        let rec = sqlx::query(
            "INSERT INTO role (title, salary, department_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(title)
        .bind(salary)
        .bind(department_id.0)
        .fetch_one(&self.pool)
        .await?;
        Ok(RoleId(rec.try_get(0)?))
    }

    async fn delete_role(&self, role_id: RoleId) -> Result<u64> {
        self.delete_by_id("DELETE FROM role WHERE id = ?", role_id.0)
            .await
    }

    async fn list_employees(&self) -> Result<Vec<EmployeeListing>> {
        let rows = sqlx::query(
            "SELECT
                employee.id,
                employee.first_name,
                employee.last_name,
                role.title AS title,
                department.name AS department,
                role.salary AS salary,
                COALESCE(manager.first_name || ' ' || manager.last_name, ?) AS manager
             FROM employee
             LEFT JOIN role ON employee.role_id = role.id
             LEFT JOIN department ON role.department_id = department.id
             LEFT JOIN employee AS manager ON employee.manager_id = manager.id
             ORDER BY employee.id",
        )
        .bind(NO_MANAGER)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(employee_listing).collect()
    }

    async fn employee_choices(&self) -> Result<Vec<EmployeeChoice>> {
        let rows = sqlx::query(
            "SELECT id, first_name || ' ' || last_name AS full_name FROM employee ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| -> Result<EmployeeChoice> {
                Ok(EmployeeChoice {
                    id: EmployeeId(r.try_get("id")?),
                    full_name: r.try_get("full_name")?,
                })
            })
            .collect()
    }

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<EmployeeId> {
        let rec = sqlx::query(
            "INSERT INTO employee (first_name, last_name, role_id, manager_id)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(employee.role_id.0)
        .bind(employee.manager_id.map(|id| id.0))
        .fetch_one(&self.pool)
        .await?;
        Ok(EmployeeId(rec.try_get(0)?))
    }

    async fn delete_employee(&self, employee_id: EmployeeId) -> Result<u64> {
        self.delete_by_id("DELETE FROM employee WHERE id = ?", employee_id.0)
            .await
    }

    async fn update_employee_role(&self, full_name: &str, role_id: RoleId) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE employee SET role_id = ? WHERE first_name || ' ' || last_name = ?",
        )
        .bind(role_id.0)
        .bind(full_name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn employees_by_manager(&self) -> Result<Vec<ManagerListing>> {
        let rows = sqlx::query(
            "SELECT
                employee.id,
                employee.first_name || ' ' || employee.last_name AS employee_name,
                manager.first_name || ' ' || manager.last_name AS manager_name
             FROM employee
             LEFT JOIN employee AS manager ON employee.manager_id = manager.id
             ORDER BY manager_name, employee.id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| -> Result<ManagerListing> {
                Ok(ManagerListing {
                    id: EmployeeId(r.try_get("id")?),
                    employee_name: r.try_get("employee_name")?,
                    manager_name: r.try_get("manager_name")?,
                })
            })
            .collect()
    }

    async fn employees_by_department(&self) -> Result<Vec<DepartmentMemberListing>> {
        let rows = sqlx::query(
            "SELECT
                employee.id,
                employee.first_name || ' ' || employee.last_name AS employee_name,
                department.name AS department_name
             FROM employee
             INNER JOIN role ON employee.role_id = role.id
             INNER JOIN department ON role.department_id = department.id
             ORDER BY department_name, employee.id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| -> Result<DepartmentMemberListing> {
                Ok(DepartmentMemberListing {
                    id: EmployeeId(r.try_get("id")?),
                    employee_name: r.try_get("employee_name")?,
                    department_name: r.try_get("department_name")?,
                })
            })
            .collect()
    }

    async fn utilized_budget(&self) -> Result<Vec<BudgetListing>> {
        let rows = sqlx::query(
            "SELECT department.id, department.name, SUM(role.salary) AS total_budget
             FROM employee
             INNER JOIN role ON employee.role_id = role.id
             INNER JOIN department ON role.department_id = department.id
             GROUP BY department.id, department.name
             ORDER BY department.name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| -> Result<BudgetListing> {
                Ok(BudgetListing {
                    id: DepartmentId(r.try_get("id")?),
                    name: r.try_get("name")?,
                    total_budget: r.try_get("total_budget")?,
                })
            })
            .collect()
    }
}

fn employee_listing(r: &SqliteRow) -> Result<EmployeeListing> {
    Ok(EmployeeListing {
        id: EmployeeId(r.try_get("id")?),
        first_name: r.try_get("first_name")?,
        last_name: r.try_get("last_name")?,
        title: r.try_get("title")?,
        department: r.try_get("department")?,
        salary: r.try_get("salary")?,
        manager: r.try_get("manager")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
