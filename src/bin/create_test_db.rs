use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::sync::Arc;

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use dompetku::{
    Amount, AppConfig, AppState, AuthService, LogMailer, TransactionFields, TransactionKind,
    TransactionStore, ValidatedPassword,
};

/// A utility for creating a test database for the DompetKu server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many months of transactions to create, ending with the current month.
    #[arg(long, default_value_t = 6)]
    months: u8,
}

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo123";

/// Income and expenses repeated every month, as (kind, amount, description, day).
const MONTHLY_TRANSACTIONS: [(TransactionKind, &str, &str, u8); 6] = [
    (TransactionKind::Income, "8500000", "Gaji", 1),
    (TransactionKind::Expense, "2500000", "Sewa kos", 2),
    (TransactionKind::Expense, "350000", "Listrik dan air", 5),
    (TransactionKind::Expense, "1200000", "Belanja bulanan", 8),
    (TransactionKind::Expense, "150000", "Pulsa dan internet", 12),
    (TransactionKind::Income, "750000", "Proyek lepas", 20),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;
    let config = AppConfig {
        cookie_secret: "create_test_db".to_owned(),
        local_timezone: "Etc/UTC".to_owned(),
        public_url: "http://localhost:3000".to_owned(),
        password_hash_cost: bcrypt::DEFAULT_COST,
    };
    let state = AppState::new(conn, &config, Arc::new(LogMailer))?;

    println!("Creating demo user {DEMO_EMAIL} with the password {DEMO_PASSWORD}...");
    let email: EmailAddress = DEMO_EMAIL.parse()?;
    let user = state
        .auth_service
        .sign_up(&email, ValidatedPassword::new(DEMO_PASSWORD)?)?;

    println!("Creating {} months of transactions...", args.months);
    let mut month_start = first_of_month(OffsetDateTime::now_utc().date())?;
    let mut count = 0;

    for _ in 0..args.months {
        for (kind, amount, description, day) in MONTHLY_TRANSACTIONS {
            let Ok(date) = month_start.replace_day(day) else {
                continue;
            };

            state.transaction_store.create(
                user.id,
                TransactionFields {
                    kind,
                    amount: Amount::parse(amount)?,
                    description: description.to_owned(),
                    date,
                },
            )?;
            count += 1;
        }

        month_start = first_of_month(month_start - Duration::days(1))?;
    }

    println!("Created {count} transactions.");
    println!("Success!");

    Ok(())
}

fn first_of_month(date: Date) -> Result<Date, time::error::ComponentRange> {
    Date::from_calendar_date(date.year(), date.month(), 1)
}
