//! `allowance_cli` entry-point.
//!
//! Available sub-commands:
//! - `run`: fire every payment schedule due on a date (cron-friendly).
//! - `account`: create accounts.
//! - `schedule`: configure recurring payments on an account.
//! - `deposit`: record a manual deposit or withdrawal.
//! - `status`: print balances and upcoming runs.
//! - `version`: print build metadata.

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use allowance_core::{
    config::ConfigManager,
    ledger::{Account, Interval},
    scheduler::SchedulerService,
    storage::{JsonStorage, LedgerStore},
    time::{Clock, SystemClock},
    utils::{build_info, init_tracing_with, paths::app_data_dir},
    Result,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "allowance_cli",
    about = "Recurring payment scheduler for allowance accounts",
    version
)]
struct Cli {
    /// Directory holding account documents; overrides the configuration file.
    #[arg(long, global = true, env = "ALLOWANCE_CORE_DATA_DIR")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Post every schedule due on the reference date.
    Run {
        /// Reference date (YYYY-MM-DD); defaults to today (UTC).
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Manage accounts.
    #[command(subcommand)]
    Account(AccountCommand),
    /// Manage payment schedules.
    #[command(subcommand)]
    Schedule(ScheduleCommand),
    /// Record a manual deposit (positive) or withdrawal (negative).
    Deposit {
        #[arg(long)]
        account: Uuid,
        #[arg(long, allow_hyphen_values = true)]
        amount: Decimal,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show balances and upcoming runs.
    Status {
        #[arg(long)]
        account: Option<Uuid>,
    },
    /// Print build metadata.
    Version,
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Create an empty account.
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum ScheduleCommand {
    /// Add a recurring payment to an account.
    Add {
        #[arg(long)]
        account: Uuid,
        /// First run date (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,
        /// `weekly`, `monthly`, or a count with a unit such as `2w`.
        #[arg(long)]
        interval: Interval,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        description: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = ConfigManager::with_base_dir(app_data_dir())?.load()?;
    init_tracing_with(&config.log_filter);

    let data_dir = cli.data_dir.or(config.data_dir);
    let open_store = || JsonStorage::new(data_dir.clone()).map(Arc::new);
    let clock = Arc::new(SystemClock);

    match cli.command {
        Command::Run { as_of } => {
            let scheduler = SchedulerService::new(open_store()?, clock.clone());
            let report = scheduler.execute_updates(as_of.unwrap_or_else(|| clock.today()))?;
            for payment in &report.posted {
                println!(
                    "posted {} to {} (next run {})",
                    payment.amount, payment.account_id, payment.next_run
                );
            }
            for failure in &report.failures {
                eprintln!("failed {}: {}", failure.account_id, failure.error);
            }
            println!(
                "{} payment(s) posted as of {}, {} account(s) failed",
                report.posted.len(),
                report.as_of,
                report.failures.len()
            );
            if report.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Account(AccountCommand::Create { owner, name }) => {
            let account = Account::new(owner, name);
            open_store()?.commit_account(&account)?;
            println!("{}", account.id);
            Ok(ExitCode::SUCCESS)
        }
        Command::Schedule(ScheduleCommand::Add {
            account,
            start,
            interval,
            amount,
            description,
        }) => {
            let store = open_store()?;
            let mut loaded = store.load_account(account)?;
            let id = loaded.add_payment_schedule(start, interval, amount, description)?;
            store.commit_account(&loaded)?;
            println!("{id}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Deposit {
            account,
            amount,
            description,
            date,
        } => {
            let store = open_store()?;
            let mut loaded = store.load_account(account)?;
            let date = date.unwrap_or_else(|| clock.today());
            loaded.record(amount, description, date, clock.now())?;
            store.commit_account(&loaded)?;
            println!("balance {}", loaded.balance());
            Ok(ExitCode::SUCCESS)
        }
        Command::Status { account } => {
            let store = open_store()?;
            let accounts = match account {
                Some(id) => vec![store.load_account(id)?],
                None => store.list_accounts()?,
            };
            for account in &accounts {
                print_account(account);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Version => {
            println!("{}", build_info::current().summary());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_account(account: &Account) {
    println!(
        "{}  {} ({})  balance {}",
        account.id,
        account.name,
        account.owner,
        account.balance()
    );
    for schedule in account.schedules() {
        println!(
            "  {}  {} {}  {}  next {}",
            schedule.id(),
            schedule.amount(),
            schedule.interval(),
            schedule.description(),
            schedule.next_run()
        );
    }
}
