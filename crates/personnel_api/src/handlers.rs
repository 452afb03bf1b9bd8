//! One async function per menu action. Each one reads fresh state for its
//! prompts, issues a single statement, and reports to the terminal.

use shared::{
    domain::{DepartmentId, EmployeeId, EntityKind, NewEmployee, RoleId, NO_MANAGER},
    error::ActionError,
};
use tracing::info;

use crate::{
    query_failed,
    table::{Table, TableRow},
    terminal::{Terminal, Validation},
    ActionContext,
};

pub async fn view_departments(
    ctx: &ActionContext,
    term: &mut dyn Terminal,
) -> Result<(), ActionError> {
    let departments = ctx.store.list_departments().await.map_err(query_failed)?;
    show(term, &departments);
    Ok(())
}

pub async fn add_department(
    ctx: &ActionContext,
    term: &mut dyn Terminal,
) -> Result<(), ActionError> {
    let name = term.input(
        "What is the name of the department?",
        Validation::NotBlank("department name"),
    )?;

    let department_id = ctx
        .store
        .insert_department(&name)
        .await
        .map_err(query_failed)?;
    info!(department_id = department_id.0, %name, "department added");
    term.info(&format!("Added {name} to the database."));
    Ok(())
}

pub async fn delete_department(
    ctx: &ActionContext,
    term: &mut dyn Terminal,
) -> Result<(), ActionError> {
    let departments = ctx.store.list_departments().await.map_err(query_failed)?;
    let labels: Vec<String> = departments.iter().map(|d| d.name.clone()).collect();
    let index = choose(
        term,
        "Which department do you want to delete?",
        &labels,
        "departments",
    )?;
    let department_id = departments[index].id;

    let deleted = ctx
        .store
        .delete_department(department_id)
        .await
        .map_err(query_failed)?;
    ensure_deleted(deleted, EntityKind::Department, &labels[index])?;
    info!(department_id = department_id.0, "department deleted");
    term.info("Department deleted successfully.");
    Ok(())
}

pub async fn view_roles(ctx: &ActionContext, term: &mut dyn Terminal) -> Result<(), ActionError> {
    let roles = ctx.store.list_roles().await.map_err(query_failed)?;
    show(term, &roles);
    Ok(())
}

pub async fn add_role(ctx: &ActionContext, term: &mut dyn Terminal) -> Result<(), ActionError> {
    let title = term.input(
        "What is the name of the role?",
        Validation::NotBlank("role name"),
    )?;
    let salary = term.input(
        "What is the salary of the role?",
        Validation::Numeric("salary"),
    )?;
    let salary = parse_salary(&salary)?;

    let departments = ctx.store.list_departments().await.map_err(query_failed)?;
    let labels: Vec<String> = departments.into_iter().map(|d| d.name).collect();
    let index = choose(
        term,
        "Which department does the role belong to?",
        &labels,
        "departments",
    )?;
    let department_id: DepartmentId = ctx.resolver().department(&labels[index]).await?;

    let role_id = ctx
        .store
        .insert_role(&title, salary, department_id)
        .await
        .map_err(query_failed)?;
    info!(role_id = role_id.0, %title, salary, "role added");
    term.info(&format!("Added {title} to the database."));
    Ok(())
}

pub async fn delete_role(ctx: &ActionContext, term: &mut dyn Terminal) -> Result<(), ActionError> {
    let roles = ctx.store.role_choices().await.map_err(query_failed)?;
    let labels: Vec<String> = roles.iter().map(|r| r.title.clone()).collect();
    let index = choose(term, "Which role do you want to delete?", &labels, "roles")?;
    let role_id = roles[index].id;

    let deleted = ctx.store.delete_role(role_id).await.map_err(query_failed)?;
    ensure_deleted(deleted, EntityKind::Role, &labels[index])?;
    info!(role_id = role_id.0, "role deleted");
    term.info("Role deleted successfully.");
    Ok(())
}

pub async fn view_employees(
    ctx: &ActionContext,
    term: &mut dyn Terminal,
) -> Result<(), ActionError> {
    let employees = ctx.store.list_employees().await.map_err(query_failed)?;
    show(term, &employees);
    Ok(())
}

pub async fn add_employee(
    ctx: &ActionContext,
    term: &mut dyn Terminal,
) -> Result<(), ActionError> {
    let first_name = term.input(
        "What is the employee's first name?",
        Validation::NotBlank("employee's first name"),
    )?;
    let last_name = term.input(
        "What is the employee's last name?",
        Validation::NotBlank("employee's last name"),
    )?;

    let roles = ctx.store.role_choices().await.map_err(query_failed)?;
    let role_labels: Vec<String> = roles.into_iter().map(|r| r.title).collect();
    let role_index = choose(term, "What is the employee's role?", &role_labels, "roles")?;

    // The new hire has no row yet, so every existing employee is offered.
    let employees = ctx.store.employee_choices().await.map_err(query_failed)?;
    let manager_labels: Vec<String> = std::iter::once(NO_MANAGER.to_string())
        .chain(employees.into_iter().map(|e| e.full_name))
        .collect();
    let manager_index = choose(
        term,
        "Who is the employee's manager?",
        &manager_labels,
        "managers",
    )?;

    let resolver = ctx.resolver();
    let role_id: RoleId = resolver.role(&role_labels[role_index]).await?;
    let manager_id: Option<EmployeeId> = resolver.manager(&manager_labels[manager_index]).await?;

    let employee_id = ctx
        .store
        .insert_employee(&NewEmployee {
            first_name: first_name.clone(),
            last_name: last_name.clone(),
            role_id,
            manager_id,
        })
        .await
        .map_err(query_failed)?;
    info!(
        employee_id = employee_id.0,
        role_id = role_id.0,
        manager_id = ?manager_id.map(|id| id.0),
        "employee added"
    );
    term.info(&format!("Added {first_name} {last_name} to the database."));
    Ok(())
}

pub async fn delete_employee(
    ctx: &ActionContext,
    term: &mut dyn Terminal,
) -> Result<(), ActionError> {
    let employees = ctx.store.employee_choices().await.map_err(query_failed)?;
    let labels: Vec<String> = employees.iter().map(|e| e.full_name.clone()).collect();
    let index = choose(
        term,
        "Which employee do you want to delete?",
        &labels,
        "employees",
    )?;
    let employee_id = employees[index].id;

    let deleted = ctx
        .store
        .delete_employee(employee_id)
        .await
        .map_err(query_failed)?;
    ensure_deleted(deleted, EntityKind::Employee, &labels[index])?;
    info!(employee_id = employee_id.0, "employee deleted");
    term.info("Employee deleted successfully.");
    Ok(())
}

pub async fn update_employee_role(
    ctx: &ActionContext,
    term: &mut dyn Terminal,
) -> Result<(), ActionError> {
    let employees = ctx.store.employee_choices().await.map_err(query_failed)?;
    let employee_labels: Vec<String> = employees.into_iter().map(|e| e.full_name).collect();
    let employee_index = choose(
        term,
        "Whose role do you want to update?",
        &employee_labels,
        "employees",
    )?;
    let employee_name = &employee_labels[employee_index];

    let roles = ctx.store.role_choices().await.map_err(query_failed)?;
    let role_labels: Vec<String> = roles.into_iter().map(|r| r.title).collect();
    let role_index = choose(
        term,
        "Which role do you want to assign the selected employee?",
        &role_labels,
        "roles",
    )?;
    let role_id = ctx.resolver().role(&role_labels[role_index]).await?;

    let updated = ctx
        .store
        .update_employee_role(employee_name, role_id)
        .await
        .map_err(query_failed)?;
    if updated == 0 {
        return Err(ActionError::not_found(EntityKind::Employee, employee_name));
    }
    info!(%employee_name, role_id = role_id.0, updated, "employee role updated");
    term.info("Updated employee role.");
    Ok(())
}

pub async fn view_employees_by_manager(
    ctx: &ActionContext,
    term: &mut dyn Terminal,
) -> Result<(), ActionError> {
    let rows = ctx
        .store
        .employees_by_manager()
        .await
        .map_err(query_failed)?;
    show(term, &rows);
    Ok(())
}

pub async fn view_employees_by_department(
    ctx: &ActionContext,
    term: &mut dyn Terminal,
) -> Result<(), ActionError> {
    let rows = ctx
        .store
        .employees_by_department()
        .await
        .map_err(query_failed)?;
    show(term, &rows);
    Ok(())
}

pub async fn view_utilized_budget(
    ctx: &ActionContext,
    term: &mut dyn Terminal,
) -> Result<(), ActionError> {
    let rows = ctx.store.utilized_budget().await.map_err(query_failed)?;
    show(term, &rows);
    Ok(())
}

fn show<T: TableRow>(term: &mut dyn Terminal, rows: &[T]) {
    term.table(&Table::from_rows(rows));
}

fn choose(
    term: &mut dyn Terminal,
    message: &str,
    labels: &[String],
    things: &str,
) -> Result<usize, ActionError> {
    if labels.is_empty() {
        return Err(ActionError::validation(format!(
            "There are no {things} to choose from."
        )));
    }
    let index = term.select(message, labels)?;
    if index >= labels.len() {
        return Err(ActionError::validation(format!(
            "choice {index} is out of range"
        )));
    }
    Ok(index)
}

/// A zero-row delete means the record vanished after the choice list was read.
fn ensure_deleted(deleted: u64, kind: EntityKind, label: &str) -> Result<(), ActionError> {
    if deleted == 0 {
        return Err(ActionError::not_found(kind, label));
    }
    Ok(())
}

fn parse_salary(raw: &str) -> Result<f64, ActionError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|salary| salary.is_finite())
        .ok_or_else(|| ActionError::validation(format!("'{raw}' is not a numeric salary")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_parses_to_number() {
        assert_eq!(parse_salary("95000.50").expect("salary"), 95000.50);
        assert_eq!(parse_salary(" 50000 ").expect("salary"), 50000.0);
        assert!(parse_salary("NaN").is_err());
    }

    #[test]
    fn empty_choice_list_is_a_validation_error() {
        let mut term = crate::ScriptedTerminal::new(["0"]);
        let err = choose(&mut term, "Which?", &[], "roles").expect_err("empty");
        assert_eq!(err.message, "There are no roles to choose from.");
        assert!(term.prompts.is_empty());
    }

    #[test]
    fn zero_row_delete_is_not_found() {
        let err = ensure_deleted(0, EntityKind::Role, "Rep").expect_err("gone");
        assert_eq!(err.code, shared::error::ErrorCode::NotFound);
        ensure_deleted(1, EntityKind::Role, "Rep").expect("deleted");
    }
}
