use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use personnel_api::{config::load_settings, open_storage, Resolver};
use shared::domain::{NewEmployee, NO_MANAGER};
use storage::{PersonnelStore, Storage};
use tracing::info;

/// Scripted inserts against the database the interactive app uses.
#[derive(Parser, Debug)]
struct Cli {
    /// Overrides the configured database url.
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    AddDepartment {
        name: String,
    },
    AddRole {
        title: String,
        salary: f64,
        department: String,
    },
    AddEmployee {
        first_name: String,
        last_name: String,
        role: String,
        /// Manager full name.
        #[arg(long, default_value = NO_MANAGER)]
        manager: String,
    },
    /// Inserts a small sample organisation into an empty database.
    Seed,
}

const SEED_DEPARTMENTS: [&str; 3] = ["Engineering", "Finance", "Sales"];

const SEED_ROLES: [(&str, f64, &str); 5] = [
    ("Lead Engineer", 150000.0, "Engineering"),
    ("Software Engineer", 120000.0, "Engineering"),
    ("Accountant", 95000.5, "Finance"),
    ("Sales Lead", 100000.0, "Sales"),
    ("Salesperson", 80000.0, "Sales"),
];

/// Managers come before their reports.
const SEED_EMPLOYEES: [(&str, &str, &str, &str); 6] = [
    ("Ashley", "Rodriguez", "Lead Engineer", NO_MANAGER),
    ("Kevin", "Tupik", "Software Engineer", "Ashley Rodriguez"),
    ("Kunal", "Singh", "Accountant", NO_MANAGER),
    ("John", "Doe", "Sales Lead", NO_MANAGER),
    ("Mike", "Chan", "Salesperson", "John Doe"),
    ("Malia", "Brown", "Salesperson", "John Doe"),
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = load_settings()?.with_override(cli.database_url);
    let storage = open_storage(&settings.connection_url()).await?;

    let outcome = execute(&storage, cli.command).await;
    storage.close().await;
    outcome
}

async fn execute(storage: &Storage, command: Command) -> Result<()> {
    match command {
        Command::AddDepartment { name } => {
            let department_id = storage.insert_department(&name).await?;
            println!("created department_id={}", department_id.0);
        }
        Command::AddRole {
            title,
            salary,
            department,
        } => {
            let department_id = Resolver::new(storage).department(&department).await?;
            let role_id = storage.insert_role(&title, salary, department_id).await?;
            println!("created role_id={}", role_id.0);
        }
        Command::AddEmployee {
            first_name,
            last_name,
            role,
            manager,
        } => {
            let employee_id = add_employee(storage, &first_name, &last_name, &role, &manager).await?;
            println!("created employee_id={employee_id}");
        }
        Command::Seed => seed(storage).await?,
    }
    Ok(())
}

async fn add_employee(
    storage: &Storage,
    first_name: &str,
    last_name: &str,
    role: &str,
    manager: &str,
) -> Result<i64> {
    let resolver = Resolver::new(storage);
    let role_id = resolver.role(role).await?;
    let manager_id = resolver.manager(manager).await?;
    let employee_id = storage
        .insert_employee(&NewEmployee {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role_id,
            manager_id,
        })
        .await?;
    Ok(employee_id.0)
}

async fn seed(storage: &Storage) -> Result<()> {
    if !storage.list_departments().await?.is_empty() {
        bail!("refusing to seed: the department table is not empty");
    }

    for name in SEED_DEPARTMENTS {
        storage.insert_department(name).await?;
    }
    let resolver = Resolver::new(storage);
    for (title, salary, department) in SEED_ROLES {
        let department_id = resolver.department(department).await?;
        storage.insert_role(title, salary, department_id).await?;
    }
    for (first_name, last_name, role, manager) in SEED_EMPLOYEES {
        add_employee(storage, first_name, last_name, role, manager).await?;
    }

    info!(
        departments = SEED_DEPARTMENTS.len(),
        roles = SEED_ROLES.len(),
        employees = SEED_EMPLOYEES.len(),
        "seeded sample data"
    );
    println!("seeded sample organisation");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use personnel_api::config::load_settings_from;

    use super::*;

    fn env_of(
        pairs: &'static [(&'static str, &'static str)],
    ) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn database_follows_app_environment_unless_flag_given() {
        let absent = Path::new("no-such-dir/personnel.toml");

        let cli = Cli::try_parse_from(["tools", "seed"]).expect("args");
        let settings = load_settings_from(absent, env_of(&[("DB_NAME", "staff_db")]))
            .expect("settings")
            .with_override(cli.database_url);
        assert_eq!(settings.connection_url(), "sqlite://./data/staff_db.db");

        let cli = Cli::try_parse_from(["tools", "--database-url", "./cli.db", "seed"])
            .expect("args");
        let settings = load_settings_from(absent, env_of(&[("DB_NAME", "staff_db")]))
            .expect("settings")
            .with_override(cli.database_url);
        assert_eq!(settings.connection_url(), "sqlite://./cli.db");
    }

    #[tokio::test]
    async fn writes_to_the_configured_database_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("env_url.db");
        let raw_url = db_path.display().to_string();

        let cli = Cli::try_parse_from(["tools", "add-department", "Ops"]).expect("args");
        let settings = load_settings_from(&dir.path().join("absent.toml"), |key: &str| {
            (key == "DATABASE_URL").then(|| raw_url.clone())
        })
        .expect("settings")
        .with_override(cli.database_url);

        let storage = open_storage(&settings.connection_url()).await.expect("db");
        execute(&storage, cli.command).await.expect("add department");
        storage.close().await;

        assert!(db_path.exists());
        let reopened = Storage::new(&settings.connection_url()).await.expect("reopen");
        let departments = reopened.list_departments().await.expect("departments");
        assert_eq!(departments.len(), 1);
        assert_eq!(departments[0].name, "Ops");
        reopened.close().await;
    }

    #[tokio::test]
    async fn seeds_empty_database_once() {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        seed(&storage).await.expect("seed");

        let employees = storage.list_employees().await.expect("employees");
        assert_eq!(employees.len(), SEED_EMPLOYEES.len());
        let kevin = employees
            .iter()
            .find(|e| e.full_name() == "Kevin Tupik")
            .expect("kevin");
        assert_eq!(kevin.manager, "Ashley Rodriguez");
        assert_eq!(kevin.department.as_deref(), Some("Engineering"));

        seed(&storage).await.expect_err("second seed is refused");
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        let err = add_employee(&storage, "Ann", "Lee", "Astronaut", NO_MANAGER)
            .await
            .expect_err("no such role");
        assert!(err.to_string().contains("no role named 'Astronaut'"));
    }
}
