//! `bank-admin` command line.
//!
//! Each command plays the part of one screen of the admin console: the login
//! form, the customer table with its summary cards, the add/edit form and
//! the delete confirmation.

use std::io::{self, BufRead, Write};

use anyhow::bail;
use clap::{Args, Parser, Subcommand};

use crate::backend_client::{CustomerBackend, HttpCustomerBackend, PublicApiClient};
use crate::collection::{
    Confirmation, CustomerCollectionManager, DeleteOutcome, ListView, SAVE_FAILED_MESSAGE,
};
use crate::config::Config;
use crate::errors::ClientError;
use crate::form::CustomerForm;
use crate::models::{Customer, CustomerId, EmploymentStatus};
use crate::presentation::{format_currency, CustomerRow, CustomerSummary};
use crate::session::{FileSessionStorage, GateDecision, SessionContext, SessionGate};

pub const NOT_SIGNED_IN: &str = "Not signed in. Run 'bank-admin login' first.";

#[derive(Debug, Parser)]
#[command(name = "bank-admin", version, about = "Bank customer management console")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session on this machine
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "BANK_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Manage customer records
    #[command(subcommand)]
    Customers(CustomerCommand),
    /// Show backend health and version
    Health,
}

#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    /// List all customers with summary totals
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show a single customer as stored on the backend
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Add a new customer
    Create(FormArgs),
    /// Edit an existing customer; unspecified fields keep their values
    Update {
        id: String,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Delete a customer
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Form inputs. Every field is optional here; the form itself decides
/// what is required.
#[derive(Debug, Clone, Default, Args)]
pub struct FormArgs {
    /// First name
    #[arg(long)]
    pub name: Option<String>,
    /// Last name
    #[arg(long)]
    pub surname: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    /// Monthly salary, e.g. 4200.50
    #[arg(long)]
    pub salary: Option<String>,
    /// Credit score between 300 and 850
    #[arg(long)]
    pub credit_score: Option<String>,
    /// Employed, Self-Employed or Unemployed
    #[arg(long)]
    pub employment: Option<EmploymentStatus>,
}

impl FormArgs {
    /// Overwrites the form fields that were given on the command line.
    pub fn apply(&self, form: &mut CustomerForm) {
        let text_fields = [
            (&self.name, &mut form.name),
            (&self.surname, &mut form.surname),
            (&self.username, &mut form.username),
            (&self.email, &mut form.email),
            (&self.phone, &mut form.phone),
            (&self.address, &mut form.address),
            (&self.salary, &mut form.monthly_salary),
            (&self.credit_score, &mut form.credit_score),
        ];
        for (given, field) in text_fields {
            if let Some(value) = given {
                *field = value.clone();
            }
        }
        if let Some(status) = self.employment {
            form.employment_status = status;
        }
    }
}

/// Asks on the terminal; anything but `y`/`yes` declines.
pub struct TerminalConfirmation;

impl Confirmation for TerminalConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(_) => false,
        }
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub async fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    let gate = SessionGate::new(FileSessionStorage::new(config.session_file.clone()));

    match cli.command {
        Command::Login { email, password } => {
            let auth = PublicApiClient::from_config(config)?;
            match gate.login(&auth, &email, &password).await {
                Ok(_) => {
                    println!("Signed in as {}", email);
                    Ok(())
                }
                Err(e) => bail!(e.user_message()),
            }
        }
        Command::Logout => {
            gate.logout()?;
            println!("Signed out");
            Ok(())
        }
        Command::Health => {
            let client = PublicApiClient::from_config(config)?;
            println!("{}", client.health().await?);
            println!("{}", client.info().await?);
            Ok(())
        }
        Command::Customers(command) => {
            let session = match gate.check() {
                GateDecision::Allow(session) => session,
                GateDecision::RedirectToLogin => bail!(NOT_SIGNED_IN),
            };
            run_customer_command(command, config, session).await
        }
    }
}

async fn run_customer_command(
    command: CustomerCommand,
    config: &Config,
    session: SessionContext,
) -> anyhow::Result<()> {
    let backend = HttpCustomerBackend::from_config(config, session)?;

    if let CustomerCommand::Show { id, json } = &command {
        let customer = backend
            .fetch_one(&CustomerId::from(id.as_str()))
            .await
            .map_err(explain)?;
        return print_customer(&customer, *json);
    }

    let mut manager = CustomerCollectionManager::new(backend);
    if let Err(e) = manager.list().await {
        if e.is_unauthorized() {
            return Err(explain(e));
        }
    }

    match command {
        CustomerCommand::List { json } => match manager.view() {
            ListView::Ready(customers) if json => {
                println!("{}", serde_json::to_string_pretty(customers)?);
                Ok(())
            }
            ListView::Ready(customers) => {
                print_table(customers, &manager.summary());
                Ok(())
            }
            ListView::Failed(message) => bail!("{}", message),
            ListView::Loading => bail!("Customer list is still loading"),
        },
        CustomerCommand::Create(args) => {
            manager.open_create();
            if let Some(form) = manager.editor_mut() {
                args.apply(form);
            }
            submit(&mut manager).await?;
            println!("Customer added");
            print_list_after_write(&manager);
            Ok(())
        }
        CustomerCommand::Update { id, form: args } => {
            if let Some(message) = manager.error() {
                bail!("{}", message);
            }
            manager
                .open_edit(&CustomerId::from(id))
                .map_err(explain)?;
            if let Some(form) = manager.editor_mut() {
                args.apply(form);
            }
            submit(&mut manager).await?;
            println!("Customer updated");
            print_list_after_write(&manager);
            Ok(())
        }
        CustomerCommand::Delete { id, yes } => {
            let id = CustomerId::from(id);
            let outcome = if yes {
                manager.delete(&id, &|_: &str| true).await
            } else {
                manager.delete(&id, &TerminalConfirmation).await
            };
            match outcome {
                Ok(DeleteOutcome::Deleted) => {
                    println!("Customer {} deleted", id);
                    print_list_after_write(&manager);
                    Ok(())
                }
                Ok(DeleteOutcome::Cancelled) => {
                    println!("Nothing deleted");
                    Ok(())
                }
                Err(e) => {
                    let notice = manager
                        .take_notice()
                        .map(|n| n.message)
                        .unwrap_or_else(|| e.user_message());
                    Err(anyhow::Error::new(e).context(notice))
                }
            }
        }
        CustomerCommand::Show { .. } => Ok(()),
    }
}

async fn submit<B: CustomerBackend>(
    manager: &mut CustomerCollectionManager<B>,
) -> anyhow::Result<()> {
    match manager.submit().await {
        Ok(()) => Ok(()),
        Err(e @ ClientError::InvalidForm(_)) => bail!(e.user_message()),
        Err(e) => {
            let notice = manager
                .take_notice()
                .map(|n| n.message)
                .unwrap_or_else(|| SAVE_FAILED_MESSAGE.to_string());
            Err(anyhow::Error::new(e).context(notice))
        }
    }
}

fn explain(e: ClientError) -> anyhow::Error {
    if e.is_unauthorized() {
        anyhow::anyhow!(
            "The backend rejected the stored session ({}). Run 'bank-admin login' again.",
            e
        )
    } else {
        anyhow::anyhow!(e.user_message())
    }
}

fn print_list_after_write<B: CustomerBackend>(manager: &CustomerCollectionManager<B>) {
    match manager.view() {
        ListView::Ready(customers) => print_table(customers, &manager.summary()),
        ListView::Failed(message) => eprintln!("⚠ {}", message),
        ListView::Loading => {}
    }
}

fn print_customer(customer: &Customer, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(customer)?);
        return Ok(());
    }

    let row = CustomerRow::from_customer(customer);
    println!("[{}] {} ({})", row.initials, row.full_name, row.handle);
    println!("  ID:             {}", row.id);
    println!("  Email:          {}", row.email);
    println!("  Phone:          {}", row.phone);
    println!(
        "  Address:        {}",
        customer.address.as_deref().unwrap_or("N/A")
    );
    println!("  Monthly salary: {}", row.salary);
    match row.credit_band {
        Some(band) => println!("  Credit score:   {} ({})", row.credit_score, band),
        None => println!("  Credit score:   {}", row.credit_score),
    }
    println!("  Employment:     {}", row.employment);
    println!("  Loan eligible:  {}", row.eligibility.label());
    println!("  Max loan:       {}", row.max_loan);
    Ok(())
}

pub fn render_summary(summary: &CustomerSummary) -> String {
    format!(
        "Total Customers: {}   Loan Eligible: {}   Total Loan Capacity: {}",
        summary.total,
        summary.eligible,
        format_currency(&summary.total_loan_capacity)
    )
}

const COLUMNS: [&str; 9] = [
    "ID",
    "Name",
    "Email",
    "Phone",
    "Monthly Salary",
    "Credit Score",
    "Employment",
    "Loan Eligible",
    "Max Loan Amount",
];

/// Renders the customer table as aligned text.
pub fn render_table(customers: &[Customer]) -> String {
    if customers.is_empty() {
        return "No customers found. Add your first customer to get started!".to_string();
    }

    let rows: Vec<[String; 9]> = customers
        .iter()
        .map(CustomerRow::from_customer)
        .map(|row| {
            let score = match row.credit_band {
                Some(band) => format!("{} ({})", row.credit_score, band),
                None => row.credit_score,
            };
            [
                row.id,
                format!("{} {}", row.full_name, row.handle),
                row.email,
                row.phone,
                row.salary,
                score,
                row.employment,
                row.eligibility.label().to_string(),
                row.max_loan,
            ]
        })
        .collect();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, COLUMNS.iter().copied(), &widths);
    for row in &rows {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn print_table(customers: &[Customer], summary: &CustomerSummary) {
    println!("{}", render_summary(summary));
    println!();
    print!("{}", render_table(customers));
    if customers.is_empty() {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use clap::CommandFactory;

    fn customer(id: &str) -> Customer {
        Customer {
            id: CustomerId::from(id),
            name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            address: None,
            monthly_salary: Some(BigDecimal::from(5000)),
            credit_score: Some(760),
            employment_status: Some("Employed".to_string()),
            loan_eligible: Some(true),
            max_loan_amount: Some(BigDecimal::from(360000)),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_update_with_partial_fields() {
        let cli = Cli::try_parse_from([
            "bank-admin",
            "customers",
            "update",
            "7",
            "--salary",
            "6100",
            "--employment",
            "self-employed",
        ])
        .unwrap();

        match cli.command {
            Command::Customers(CustomerCommand::Update { id, form }) => {
                assert_eq!(id, "7");
                assert_eq!(form.salary.as_deref(), Some("6100"));
                assert_eq!(form.employment, Some(EmploymentStatus::SelfEmployed));
                assert_eq!(form.name, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_apply_only_overwrites_given_fields() {
        let mut form = CustomerForm::from_customer(&customer("1"));
        let args = FormArgs {
            phone: Some("555-0199".to_string()),
            ..Default::default()
        };
        args.apply(&mut form);

        assert_eq!(form.phone, "555-0199");
        assert_eq!(form.name, "Ada");
        assert_eq!(form.monthly_salary, "5000");
    }

    #[test]
    fn test_affirmative_answers() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative("\n"));
        assert!(!is_affirmative("no"));
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&[customer("1")]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].contains("Ada Lovelace @ada"));
        assert!(lines[1].contains("760 (excellent)"));
        assert!(lines[1].contains("$360,000.00"));
        assert!(lines[1].contains("✓ Eligible"));
    }

    #[test]
    fn test_render_empty_table() {
        assert!(render_table(&[]).starts_with("No customers found"));
    }

    #[test]
    fn test_render_summary() {
        let summary = crate::presentation::summarize(&[customer("1"), customer("2")]);
        assert_eq!(
            render_summary(&summary),
            "Total Customers: 2   Loan Eligible: 2   Total Loan Capacity: $720,000.00"
        );
    }
}
