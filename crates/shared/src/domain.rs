use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(DepartmentId);
id_newtype!(RoleId);
id_newtype!(EmployeeId);

/// Display label meaning "no manager assigned".
pub const NO_MANAGER: &str = "None";

/// Entity reference that can be looked up by its display column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Department,
    Role,
    Employee,
    /// An employee referenced as somebody's manager; accepts [`NO_MANAGER`].
    Manager,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Department => "department",
            EntityKind::Role => "role",
            EntityKind::Employee => "employee",
            EntityKind::Manager => "manager",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

/// Role row for selection prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleChoice {
    pub id: RoleId,
    pub title: String,
}

/// Employee row for selection prompts, labelled by full name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeChoice {
    pub id: EmployeeId,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleListing {
    pub id: RoleId,
    pub title: String,
    pub salary: f64,
    /// `None` once the owning department has been deleted.
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeListing {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
    pub department: Option<String>,
    pub salary: Option<f64>,
    /// Manager full name, or [`NO_MANAGER`].
    pub manager: String,
}

impl EmployeeListing {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerListing {
    pub id: EmployeeId,
    pub employee_name: String,
    pub manager_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentMemberListing {
    pub id: EmployeeId,
    pub employee_name: String,
    pub department_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetListing {
    pub id: DepartmentId,
    pub name: String,
    pub total_budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub role_id: RoleId,
    pub manager_id: Option<EmployeeId>,
}
