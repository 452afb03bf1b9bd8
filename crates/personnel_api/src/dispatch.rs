use std::fmt;

use shared::error::{ActionError, ErrorCode};
use tracing::{debug, warn};

use crate::{handlers, terminal::Terminal, ActionContext};

pub const MENU_PROMPT: &str =
    "What would you like to do? (Scroll with arrow keys to reveal all choices)";

pub const FAREWELL: &str = "Goodbye!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    ViewDepartments,
    AddDepartment,
    DeleteDepartment,
    ViewRoles,
    AddRole,
    DeleteRole,
    ViewEmployees,
    AddEmployee,
    DeleteEmployee,
    UpdateEmployeeRole,
    ViewEmployeesByManager,
    ViewEmployeesByDepartment,
    ViewUtilizedBudget,
    Quit,
}

impl MenuAction {
    /// Menu order.
    pub const ALL: [MenuAction; 14] = [
        MenuAction::ViewDepartments,
        MenuAction::AddDepartment,
        MenuAction::DeleteDepartment,
        MenuAction::ViewRoles,
        MenuAction::AddRole,
        MenuAction::DeleteRole,
        MenuAction::ViewEmployees,
        MenuAction::AddEmployee,
        MenuAction::DeleteEmployee,
        MenuAction::UpdateEmployeeRole,
        MenuAction::ViewEmployeesByManager,
        MenuAction::ViewEmployeesByDepartment,
        MenuAction::ViewUtilizedBudget,
        MenuAction::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::ViewDepartments => "View all departments",
            MenuAction::AddDepartment => "Add department",
            MenuAction::DeleteDepartment => "Delete department",
            MenuAction::ViewRoles => "View all roles",
            MenuAction::AddRole => "Add role",
            MenuAction::DeleteRole => "Delete role",
            MenuAction::ViewEmployees => "View all employees",
            MenuAction::AddEmployee => "Add employee",
            MenuAction::DeleteEmployee => "Delete employee",
            MenuAction::UpdateEmployeeRole => "Update employee role",
            MenuAction::ViewEmployeesByManager => "View employees by manager",
            MenuAction::ViewEmployeesByDepartment => "View employees by department",
            MenuAction::ViewUtilizedBudget => "View total utilized departmental budget",
            MenuAction::Quit => "Quit",
        }
    }

    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|a| a.label().to_string()).collect()
    }

    /// Runs the handler bound to this action. `Quit` has none.
    pub async fn perform(
        self,
        ctx: &ActionContext,
        term: &mut dyn Terminal,
    ) -> Result<(), ActionError> {
        match self {
            MenuAction::ViewDepartments => handlers::view_departments(ctx, term).await,
            MenuAction::AddDepartment => handlers::add_department(ctx, term).await,
            MenuAction::DeleteDepartment => handlers::delete_department(ctx, term).await,
            MenuAction::ViewRoles => handlers::view_roles(ctx, term).await,
            MenuAction::AddRole => handlers::add_role(ctx, term).await,
            MenuAction::DeleteRole => handlers::delete_role(ctx, term).await,
            MenuAction::ViewEmployees => handlers::view_employees(ctx, term).await,
            MenuAction::AddEmployee => handlers::add_employee(ctx, term).await,
            MenuAction::DeleteEmployee => handlers::delete_employee(ctx, term).await,
            MenuAction::UpdateEmployeeRole => handlers::update_employee_role(ctx, term).await,
            MenuAction::ViewEmployeesByManager => {
                handlers::view_employees_by_manager(ctx, term).await
            }
            MenuAction::ViewEmployeesByDepartment => {
                handlers::view_employees_by_department(ctx, term).await
            }
            MenuAction::ViewUtilizedBudget => handlers::view_utilized_budget(ctx, term).await,
            MenuAction::Quit => Ok(()),
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shows the menu and runs one action at a time until the operator quits or
/// closes the input stream. Handler failures are reported and the menu comes
/// back; only a broken terminal at the menu prompt ends the loop with an error.
pub async fn run(ctx: &ActionContext, term: &mut dyn Terminal) -> Result<(), ActionError> {
    let labels = MenuAction::labels();
    loop {
        let index = match term.select(MENU_PROMPT, &labels) {
            Ok(index) => index,
            Err(err) if err.is_interrupted() => {
                term.info(FAREWELL);
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        let Some(action) = MenuAction::ALL.get(index).copied() else {
            let err = ActionError::validation(format!("choice {index} is out of range"));
            warn!(index, "menu choice out of range");
            term.error(&format!("Error: {}", err.message));
            continue;
        };

        if action == MenuAction::Quit {
            term.info(FAREWELL);
            return Ok(());
        }

        debug!(%action, "running action");
        match action.perform(ctx, term).await {
            Ok(()) => {}
            Err(err) if err.code == ErrorCode::Interrupted => {
                debug!(%action, "action cancelled");
            }
            Err(err) => {
                warn!(%action, code = ?err.code, error = %err.message, "action failed");
                term.error(&format!("Error: {}", err.message));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storage::Storage;

    use super::*;
    use crate::{table::Table, terminal::Validation, ScriptedTerminal};

    #[test]
    fn menu_lists_thirteen_actions_then_quit() {
        let labels = MenuAction::labels();
        assert_eq!(labels.len(), 14);
        assert_eq!(labels[0], "View all departments");
        assert_eq!(labels[13], "Quit");
    }

    #[test]
    fn quit_is_the_last_entry() {
        assert_eq!(MenuAction::ALL.last(), Some(&MenuAction::Quit));
        assert_eq!(MenuAction::Quit.to_string(), "Quit");
    }

    /// Answers the first menu prompt with an index past the end of the menu.
    struct OverrunTerminal {
        inner: ScriptedTerminal,
        overrun_sent: bool,
    }

    impl Terminal for OverrunTerminal {
        fn select(&mut self, message: &str, labels: &[String]) -> Result<usize, ActionError> {
            if !self.overrun_sent {
                self.overrun_sent = true;
                return Ok(labels.len() + 3);
            }
            self.inner.select(message, labels)
        }

        fn input(&mut self, message: &str, rule: Validation) -> Result<String, ActionError> {
            self.inner.input(message, rule)
        }

        fn table(&mut self, table: &Table) {
            self.inner.table(table);
        }

        fn info(&mut self, message: &str) {
            self.inner.info(message);
        }

        fn error(&mut self, message: &str) {
            self.inner.error(message);
        }
    }

    #[tokio::test]
    async fn out_of_range_menu_choice_is_reported_and_menu_returns() {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        let ctx = ActionContext::new(Arc::new(storage.clone()));
        let mut term = OverrunTerminal {
            inner: ScriptedTerminal::new(["View all departments", "Quit"]),
            overrun_sent: false,
        };

        run(&ctx, &mut term).await.expect("session");

        assert_eq!(term.inner.errors, ["Error: choice 17 is out of range"]);
        assert_eq!(term.inner.tables.len(), 1);
        assert_eq!(term.inner.infos, [FAREWELL]);
    }
}
