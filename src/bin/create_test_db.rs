use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use bextpense::{NewTransaction, UserId, create_transaction, initialize_db};

/// A utility for creating a test database for the REST API server of bextpense.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The user that owns the generated transactions.
    #[arg(long, default_value = "test-fake-user-id")]
    user_id: String,

    /// How many months of transactions to generate, ending today.
    #[arg(long, default_value_t = 15)]
    months: i64,
}

const DAYS_PER_MONTH: i64 = 30;

/// Recurring transactions as (title, amount in cents, type, category, day of month).
const MONTHLY_TRANSACTIONS: [(&str, i64, &str, &str, i64); 6] = [
    ("Salary", 520_000, "income", "salary", 0),
    ("Rent", 180_000, "expense", "rent", 1),
    ("Power bill", 12_345, "expense", "electricity", 5),
    ("Internet", 8_999, "expense", "internet", 9),
    ("Freelance work", 75_000, "income", "freelance", 14),
    ("Streaming", 1_599, "expense", "streaming_services", 20),
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

    initialize_db(&conn)?;

    let user_id = UserId::new(&args.user_id);
    let now = OffsetDateTime::now_utc();
    let now_millis = to_millis(now);

    println!("Creating transactions for {user_id}...");

    let mut count = 0;
    for month in 0..args.months {
        let month_start = now - Duration::days((month + 1) * DAYS_PER_MONTH);

        for (title, cents, transaction_type, category, day) in MONTHLY_TRANSACTIONS {
            // Vary amounts a little from month to month so the charts are not flat.
            let cents = cents + (month * 137) % 2_000;
            let transaction = NewTransaction::new(
                title,
                None,
                Decimal::new(cents, 2),
                to_millis(month_start + Duration::days(day)),
                transaction_type,
                category,
            )?;
            create_transaction(&user_id, transaction, now_millis, &conn)?;
            count += 1;
        }

        for week in 0..4 {
            let transaction = NewTransaction::new(
                "Groceries",
                Some("Weekly shop"),
                Decimal::new(9_000 + (month * 7 + week) * 311 % 6_000, 2),
                to_millis(month_start + Duration::days(week * 7 + 3)),
                "expense",
                "groceries",
            )?;
            create_transaction(&user_id, transaction, now_millis, &conn)?;
            count += 1;
        }
    }

    println!("Created {count} transactions.");
    println!("Success!");

    Ok(())
}

fn to_millis(date_time: OffsetDateTime) -> i64 {
    (date_time.unix_timestamp_nanos() / 1_000_000) as i64
}
