//! Cartsplit settlement planner.
//!
//! Records a group's payments, then prints each group's balances and the
//! transfers that settle them as JSON.
//!
//! Usage: cargo run --bin settle [payments.json]
//!
//! Without a path, a sample group is planned instead.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cartsplit_core::settlement::{MemberSummary, PaymentStatus, SettlementPlan, SettlementService};
use cartsplit_core::split::{
    Bill, BillSplitter, CreateBillInput, Item, ItemCategory, SplitRequest, purchase_obligations,
};
use cartsplit_shared::AppConfig;
use cartsplit_shared::types::{GroupId, MemberId};
use cartsplit_store::{InMemoryPaymentRepository, NewPayment, PaymentRepository};

#[derive(Debug, Serialize)]
struct GroupReport {
    group_id: GroupId,
    plan: SettlementPlan,
    summaries: Vec<MemberSummary>,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let repo = InMemoryPaymentRepository::new();
    let groups = match std::env::args().nth(1) {
        Some(path) => record_from_file(&repo, Path::new(&path))?,
        None => seed_sample_group(&repo, &BillSplitter::from_config(&config.settlement))?,
    };
    info!(payment_count = repo.len(), group_count = groups.len(), "Payments recorded");

    let service = SettlementService::from_config(&config.settlement);
    let reports = groups
        .into_iter()
        .map(|group_id| group_report(&repo, &service, group_id))
        .collect::<anyhow::Result<Vec<_>>>()?;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

/// Plans the settlement of a group's open obligations.
///
/// Settled payments have already changed hands, so only pending ones are
/// netted.
fn group_report(
    repo: &impl PaymentRepository,
    service: &SettlementService,
    group_id: GroupId,
) -> anyhow::Result<GroupReport> {
    let payments = repo.list_by_group(&group_id, Some(PaymentStatus::Pending));
    let plan = service
        .settle_group(&payments)
        .with_context(|| format!("Failed to settle group {group_id}"))?;
    let summaries = plan.summaries();
    Ok(GroupReport {
        group_id,
        plan,
        summaries,
    })
}

/// Records every payment in a JSON array of payment inputs.
fn record_from_file(repo: &impl PaymentRepository, path: &Path) -> anyhow::Result<BTreeSet<GroupId>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let inputs: Vec<NewPayment> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut groups = BTreeSet::new();
    for input in inputs {
        groups.insert(input.group_id.clone());
        repo.record(input)?;
    }
    Ok(groups)
}

/// Seeds a three-member household: two purchased items, a shared dinner
/// bill, and a grocery reimbursement that was already paid.
fn seed_sample_group(
    repo: &impl PaymentRepository,
    splitter: &BillSplitter,
) -> anyhow::Result<BTreeSet<GroupId>> {
    let group = GroupId::from("group1");
    let user1 = MemberId::from("user1");
    let user2 = MemberId::from("user2");
    let user3 = MemberId::from("user3");

    let mut milk = Item::new("Organic Milk", ItemCategory::Groceries, 2, dec!(5.50), user1.clone());
    milk.assigned_payers = [(user1.clone(), dec!(3.00)), (user2.clone(), dec!(2.50))]
        .into_iter()
        .collect();
    milk.mark_purchased(user1.clone(), Utc::now());

    let mut chicken = Item::new("Chicken Breast", ItemCategory::Groceries, 2, dec!(12.99), user3.clone());
    chicken.assigned_payers = [
        (user1.clone(), dec!(6.50)),
        (user2.clone(), dec!(3.25)),
        (user3.clone(), dec!(3.24)),
    ]
    .into_iter()
    .collect();
    chicken.mark_purchased(user3.clone(), Utc::now());

    for item in [&milk, &chicken] {
        for payment in purchase_obligations(&group, item)? {
            repo.insert(payment)?;
        }
    }

    let dinner = Bill::assign(
        CreateBillInput {
            name: "Pizza night".into(),
            total_amount: dec!(47.20),
            created_by: user2.clone(),
            category: ItemCategory::Groceries,
            split: SplitRequest::Equal(vec![user1.clone(), user2.clone(), user3.clone()]),
        },
        splitter,
    )?;
    for payment in dinner.obligations(&group) {
        repo.insert(payment)?;
    }

    repo.record(NewPayment {
        group_id: group.clone(),
        from: user2,
        to: user1,
        amount: dec!(15.75),
        status: PaymentStatus::Settled,
        description: Some("Grocery reimbursement".into()),
        related_items: vec![milk.id],
    })?;

    Ok(BTreeSet::from([group]))
}
