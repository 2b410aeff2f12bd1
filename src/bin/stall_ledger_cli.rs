use std::env;
use std::process;
use std::sync::Arc;

use colored::Colorize;
use uuid::Uuid;

use stall_ledger::config::ConfigManager;
use stall_ledger::core::services::{AllocationService, PaymentService, ServiceError, VendorService};
use stall_ledger::core::{Reconciliation, ReconciliationEngine};
use stall_ledger::domain::{Displayable, PaymentKind, Vendor};
use stall_ledger::errors::LedgerError;
use stall_ledger::storage::JsonStore;
use stall_ledger::{init, utils::build_info};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

type CliResult = Result<(), CliError>;

#[tokio::main]
async fn main() {
    init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(err) = run(&args).await {
        eprintln!("{} {err}", "Error:".red().bold());
        let code = if matches!(err, CliError::Usage(_)) { 2 } else { 1 };
        process::exit(code);
    }
}

async fn run(args: &[String]) -> CliResult {
    let Some((command, rest)) = args.split_first() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "version" | "--version" => {
            println!("{}", build_info::current().summary());
            Ok(())
        }
        _ => {
            let engine = open_engine().await?;
            match command.as_str() {
                "vendors" => vendors(&engine).await,
                "balances" => balances(&engine).await,
                "summary" => summary(&engine).await,
                "collections" => collections(&engine).await,
                "payments" => payments(&engine, rest).await,
                "allocate" => allocate(&engine, rest).await,
                "pay-other" => pay_other(&engine, rest).await,
                "delete-payment" => delete_payment(&engine, rest).await,
                other => Err(CliError::Usage(format!(
                    "unknown command `{other}`; run `help` for the list"
                ))),
            }
        }
    }
}

fn print_usage() {
    println!("{}", "Stall Ledger".bold());
    println!();
    println!("Available commands:");
    println!("  vendors                            list registered vendors");
    println!("  balances                           remaining balance per vendor");
    println!("  summary                            collected, paid and cash balance");
    println!("  collections                        income feed, newest first");
    println!("  payments [participant|other]       recorded payments");
    println!("  allocate <amount> <vendor-id|all>...  split a payout across vendors");
    println!("  pay-other <amount> <narration...>  record a non-vendor expense");
    println!("  delete-payment <payment-id>        remove a payment");
    println!("  version                            build information");
}

async fn open_engine() -> Result<ReconciliationEngine, CliError> {
    let manager = ConfigManager::new()?;
    let config = manager.load()?;
    let store = JsonStore::open(manager.store_path(&config)).await?;
    Ok(ReconciliationEngine::new(Arc::new(store), config))
}

async fn vendors(engine: &ReconciliationEngine) -> CliResult {
    let vendors = VendorService::list(engine.store()).await?;
    if vendors.is_empty() {
        println!("No vendors registered.");
    }
    for vendor in vendors {
        let status = if vendor.is_verified {
            "verified".green()
        } else {
            "unverified".yellow()
        };
        println!("{}  {}  {}", vendor.id, vendor.display_label(), status);
    }
    Ok(())
}

async fn balances(engine: &ReconciliationEngine) -> CliResult {
    let snapshot = engine.snapshot().await?;
    let reconciliation = Reconciliation::compute(&snapshot, engine.config());
    println!(
        "{:<38} {:<24} {:>12} {:>12} {:>12}",
        "Vendor id".bold(),
        "Counter".bold(),
        "Bill".bold(),
        "Paid".bold(),
        "Remaining".bold()
    );
    for vendor in &snapshot.vendors {
        let Some(balance) = reconciliation.balances.get(vendor.id) else {
            continue;
        };
        let remaining = format!("{:.2}", balance.remaining_balance);
        let remaining = if balance.credit() > 0.0 {
            format!("{remaining} (credit {:.2})", balance.credit()).cyan()
        } else if balance.has_pending() {
            remaining.yellow()
        } else {
            remaining.normal()
        };
        println!(
            "{:<38} {:<24} {:>12.2} {:>12.2} {:>12}",
            vendor.id,
            vendor.display_label(),
            balance.bill_balance,
            balance.already_paid,
            remaining
        );
    }
    let all: Vec<Uuid> = snapshot.vendors.iter().map(|vendor| vendor.id).collect();
    println!(
        "Total pending: {:.2}",
        reconciliation.balances.total_pending(&all)
    );
    Ok(())
}

async fn summary(engine: &ReconciliationEngine) -> CliResult {
    let cash_flow = engine.reconcile().await?.cash_flow;
    println!("{}", "Collected".bold());
    println!("  Billing               {:>12.2}", cash_flow.total_billing_collected);
    println!("  Stall booking fees    {:>12.2}", cash_flow.stall_booking_fees);
    for (registration_type, amount) in &cash_flow.registration_subtotals {
        println!("  {:<21} {:>12.2}", registration_type.label(), amount);
    }
    println!("  Total                 {:>12.2}", cash_flow.total_collected);
    println!("{}", "Paid".bold());
    println!("  Stall payments        {:>12.2}", cash_flow.stall_payments_total);
    println!("  Other payments        {:>12.2}", cash_flow.other_payments_total);
    println!("  Total                 {:>12.2}", cash_flow.total_paid);

    let balance = format!("{:.2}", cash_flow.cash_balance);
    let balance = if cash_flow.cash_balance < 0.0 {
        balance.red().bold()
    } else {
        balance.green().bold()
    };
    println!("Cash balance: {balance}");
    Ok(())
}

async fn collections(engine: &ReconciliationEngine) -> CliResult {
    let entries = engine.snapshot().await?.collections();
    if entries.is_empty() {
        println!("No collections recorded.");
    }
    for entry in entries {
        println!(
            "{}  {:<24} {:<28} {:>12.2}",
            entry.date.format("%Y-%m-%d %H:%M"),
            entry.kind.category(),
            entry.description,
            entry.amount
        );
    }
    Ok(())
}

async fn payments(engine: &ReconciliationEngine, args: &[String]) -> CliResult {
    let kind = match args.first().map(String::as_str) {
        None => None,
        Some("participant") => Some(PaymentKind::Participant),
        Some("other") => Some(PaymentKind::Other),
        Some(other) => {
            return Err(CliError::Usage(format!(
                "payment kind must be `participant` or `other`, got `{other}`"
            )))
        }
    };
    for payment in PaymentService::list(engine.store(), kind).await? {
        println!(
            "{}  {}  {:<11} {:>12.2}  {}",
            payment.id,
            payment.created_at.format("%Y-%m-%d %H:%M"),
            payment.kind.as_str(),
            payment.amount,
            payment.narration.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn allocate(engine: &ReconciliationEngine, args: &[String]) -> CliResult {
    let (amount, targets) = args
        .split_first()
        .ok_or_else(|| CliError::Usage("usage: allocate <amount> <vendor-id|all>...".into()))?;
    let amount = parse_amount(amount)?;
    let selection = if targets.iter().any(|target| target == "all") {
        engine.reconcile().await?.balances.vendors_with_pending()
    } else {
        targets
            .iter()
            .map(|target| parse_id(target))
            .collect::<Result<Vec<_>, _>>()?
    };

    let plan = engine.plan_allocation(&selection, amount).await?;
    let vendors = VendorService::list(engine.store()).await?;
    let payments = match AllocationService::execute(engine.store(), &plan).await {
        Ok(payments) => payments,
        Err(ServiceError::PartialAllocation(failure)) => {
            for payment in &failure.succeeded {
                print_allocation(payment.vendor_id, payment.amount, &vendors);
            }
            return Err(ServiceError::PartialAllocation(failure).into());
        }
        Err(err) => return Err(err.into()),
    };

    for payment in &payments {
        print_allocation(payment.vendor_id, payment.amount, &vendors);
    }
    println!(
        "{} {:.2} across {} vendor(s)",
        "Allocated".green().bold(),
        plan.allocated_total(),
        payments.len()
    );
    Ok(())
}

fn print_allocation(vendor_id: Option<Uuid>, amount: f64, vendors: &[Vendor]) {
    let label = vendor_id
        .and_then(|id| vendors.iter().find(|vendor| vendor.id == id))
        .map_or_else(|| "Unknown".to_string(), Displayable::display_label);
    println!("  {label:<30} {amount:>12.2}");
}

async fn pay_other(engine: &ReconciliationEngine, args: &[String]) -> CliResult {
    let (amount, narration) = args
        .split_first()
        .ok_or_else(|| CliError::Usage("usage: pay-other <amount> <narration...>".into()))?;
    let amount = parse_amount(amount)?;
    let payment = engine
        .record_other_payment(&narration.join(" "), amount)
        .await?;
    println!("Recorded payment {} of {:.2}", payment.id, payment.amount);
    Ok(())
}

async fn delete_payment(engine: &ReconciliationEngine, args: &[String]) -> CliResult {
    let id = args
        .first()
        .ok_or_else(|| CliError::Usage("usage: delete-payment <payment-id>".into()))?;
    let id = parse_id(id)?;
    if engine.delete_payment(id).await? {
        println!("Deleted payment {id}");
    } else {
        println!("No payment {id}; nothing to delete");
    }
    Ok(())
}

fn parse_amount(raw: &str) -> Result<f64, CliError> {
    raw.parse::<f64>()
        .map_err(|_| CliError::Usage(format!("`{raw}` is not an amount")))
}

fn parse_id(raw: &str) -> Result<Uuid, CliError> {
    Uuid::parse_str(raw).map_err(|_| CliError::Usage(format!("`{raw}` is not a valid id")))
}
