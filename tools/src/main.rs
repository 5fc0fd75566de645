//! report-runner: headless report builder for the cooperative records engine.
//!
//! Usage:
//!   report-runner --db coop.db --report ledger --year 2025 --month Sep
//!   report-runner --db coop.db --report expiry
//!   report-runner --db coop.db --add-quarter Q3 --year 2025 --price 250.0
//!   report-runner --db :memory: --seed-demo --report buckets

use anyhow::Result;
use chrono::Datelike;
use coop_core::{
    aggregate::count_paid_members,
    clock::{Clock, SystemClock},
    config::CoopConfig,
    eligibility::{bucket_members, days_until_eligible},
    member::{InsuranceCategory, InsuranceSet, Member, PaymentRecord},
    report::{
        build_insurance_expiry_report, build_interest_list, build_investment_ledger,
        build_work_interest_list,
    },
    period::Quarter,
    share_price::{group_by_quarter, upsert_quarter_price},
    store::CoopStore,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let clock = SystemClock;

    let db = string_arg(&args, "--db", ":memory:");
    let data_dir = string_arg(&args, "--data-dir", "./data");
    let report = string_arg(&args, "--report", "ledger");
    let year = parse_arg(&args, "--year", clock.today().year());
    let month = string_arg(&args, "--month", "Jan");
    let seed_demo = args.iter().any(|a| a == "--seed-demo");

    let config = CoopConfig::load_or_default(&data_dir)?;

    let store = CoopStore::open(&db)?;
    store.migrate()?;

    if seed_demo {
        seed_demo_members(&store, &clock)?;
    }

    // Administration path: add a whole quarter of share prices, then fall
    // through to the requested report.
    if let Some(label) = optional_arg(&args, "--add-quarter") {
        let quarter = Quarter::parse(&label)
            .ok_or_else(|| anyhow::anyhow!("Unknown quarter label: {label}"))?;
        let price = parse_arg(&args, "--price", 0.0f64);
        let records = upsert_quarter_price(&store, year, quarter, price, &clock)?;
        println!("added {} price records for {quarter} {year}", records.len());
    }

    println!("coop report-runner");
    println!("  db:      {db}");
    println!("  report:  {report}");
    println!("  period:  {month} {year}");
    println!();

    let members = store.all_members()?;

    match report.as_str() {
        "ledger" => print_ledger(&members, year, &month, &config),
        "expiry" => print_expiry(&members, &clock, &config),
        "interest" => print_interest(&members),
        "buckets" => print_buckets(&members, &clock),
        "quarters" => print_quarters(&store)?,
        other => anyhow::bail!("Unknown report type: {other}"),
    }

    println!();
    println!("=== SUMMARY ===");
    println!("  members:       {}", members.len());
    println!(
        "  paid ({month} {year}): {}",
        count_paid_members(&members, year, &month, &config.month_aliases)
    );
    println!("  ledger rows:   {}", store.ledger_count()?);

    Ok(())
}

fn print_ledger(members: &[Member], year: i32, month: &str, config: &CoopConfig) {
    let rows = build_investment_ledger(members, year, month, &config.month_aliases);
    println!(
        "{:>4}  {:<12} {:<28} {:<12} {:>10} {:>8}",
        "SN", "DATE", "MEMBER", "RECEIPT", "AMOUNT", "FINE"
    );
    for row in &rows {
        println!(
            "{:>4}  {:<12} {:<28} {:<12} {:>10.2} {:>8.2}",
            row.serial, row.date, row.member, row.receipt, row.amount, row.fine
        );
    }
    if rows.is_empty() {
        println!("  (no investment facts for {month} {year})");
    }
}

fn print_expiry(members: &[Member], clock: &dyn Clock, config: &CoopConfig) {
    let rows = build_insurance_expiry_report(members, clock, config.expiry_horizon_months);
    println!(
        "{:<28} {:<12} {:<16} {:<12} {:>6}",
        "MEMBER", "CATEGORY", "PLAN", "EXPIRES", "DAYS"
    );
    for row in &rows {
        println!(
            "{:<28} {:<12} {:<16} {:<12} {:>6}",
            row.member, row.category, row.plan, row.expiry_date, row.days_left
        );
    }
    if rows.is_empty() {
        println!("  (no policies expiring in the window)");
    }
}

fn print_interest(members: &[Member]) {
    for category in InsuranceCategory::all() {
        let interested = build_interest_list(members, category);
        println!("{category} interest ({}):", interested.len());
        for m in interested {
            println!("  {} {}", m.member_id, m.name);
        }
    }
    let workers = build_work_interest_list(members);
    println!("willing to work ({}):", workers.len());
    for m in workers {
        println!("  {} {}", m.member_id, m.name);
    }
}

fn print_buckets(members: &[Member], clock: &dyn Clock) {
    let buckets = bucket_members(members, clock);
    println!("eligible ({}):", buckets.eligible.len());
    for m in &buckets.eligible {
        println!("  {} {}", m.member_id, m.name);
    }
    println!("waiting ({}):", buckets.waiting.len());
    for m in &buckets.waiting {
        let days = days_until_eligible(m, clock)
            .map(|d| format!("{d} days"))
            .unwrap_or_else(|| "no joining date".to_string());
        println!("  {} {} ({days})", m.member_id, m.name);
    }
    println!("refunded ({}):", buckets.refunded.len());
    for m in &buckets.refunded {
        println!("  {} {}", m.member_id, m.name);
    }
}

fn print_quarters(store: &CoopStore) -> Result<()> {
    let records = store.all_share_prices()?;
    let views = group_by_quarter(&records);
    println!("{:<6} {:<4} {:>10} {:>9} {:>6}", "YEAR", "QTR", "PRICE", "MONTHS", "DRIFT");
    for view in &views {
        println!(
            "{:<6} {:<4} {:>10.2} {:>9} {:>6}",
            view.year,
            view.quarter.label(),
            view.price,
            format!("{}/3", view.months.len()),
            if view.price_drift { "YES" } else { "" }
        );
    }
    Ok(())
}

/// Insert a handful of members exercising the legacy key variants, so the
/// reports have something to show against an empty database.
fn seed_demo_members(store: &CoopStore, clock: &dyn Clock) -> Result<()> {
    let now = clock.now().to_rfc3339();
    let year = clock.today().year();

    let demo = [
        (
            "m-001",
            "Asha Rai",
            Some("MB-101"),
            serde_json::json!({
                (year.to_string()): {
                    "Sept": { "type": "investment", "amount": 1200, "fine": 0,
                              "receipt": "REC-12", "date": format!("{year}-09-05") }
                }
            }),
        ),
        (
            "m-002",
            "Bimal Karki",
            Some("MB-102"),
            serde_json::json!({
                (year.to_string()): {
                    "9": { "investment": { "amount": "800", "fine": "25",
                           "receipt": "REC-3", "date": format!("{year}-09-02") } }
                }
            }),
        ),
        (
            "m-003",
            "Chandra Thapa",
            None,
            serde_json::json!({
                (year.to_string()): {
                    "September": { "type": "investment", "amount": 500,
                                   "receipt": "REC-27" }
                }
            }),
        ),
    ];

    for (id, name, membership_id, activities) in demo {
        let member = Member {
            member_id: id.to_string(),
            name: name.to_string(),
            phone: None,
            join_date: None,
            payment: PaymentRecord {
                membership_id: membership_id.map(String::from),
                date_of_joining: Some(format!("{}-01-15", year - 2)),
                ..PaymentRecord::default()
            },
            activities,
            payments: serde_json::json!({ (year.to_string()): { "Sep": 100 } }),
            insurance: InsuranceSet::default(),
            willing_to_work: "YES".to_string(),
            worker_name: None,
            worker_phone: None,
        };
        store.insert_member(&member, &now)?;
    }
    log::info!("Seeded {} demo members", 3);
    Ok(())
}

fn string_arg(args: &[String], flag: &str, default: &str) -> String {
    optional_arg(args, flag).unwrap_or_else(|| default.to_string())
}

fn optional_arg(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
