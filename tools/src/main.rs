//! risk-runner: headless load driver for the ledger risk core.
//!
//! Creates accounts and random monitors, then fans postings out over
//! worker threads. Every posting goes through `on_balance_committed`,
//! the same call a ledger posting pipeline makes.
//!
//! Usage:
//!   risk-runner --seed 12345 --accounts 50 --postings 20000 --threads 8
//!   risk-runner --db risk.db --config risk.json --log-webhooks --json

mod rng;

use anyhow::Result;
use ledger_risk_core::{
    balance::Balance,
    config::RiskConfig,
    engine::RiskEngine,
    monitor::{AlertCondition, BalanceField, BalanceMonitor, Operator},
    notification::{DeliveryStats, DeliveryWorker, LogSink, MemorySink},
    store::SqliteStore,
};
use rng::{for_stream, Stream, StreamRng};
use std::{env, sync::Arc, thread, time::Instant};

const FIELDS: [BalanceField; 3] = [
    BalanceField::Balance,
    BalanceField::CreditBalance,
    BalanceField::DebitBalance,
];

const OPERATORS: [Operator; 4] = [
    Operator::GreaterThan,
    Operator::GreaterThanOrEqual,
    Operator::LessThan,
    Operator::LessThanOrEqual,
];

const HIGH_RISK_SCORE: f64 = 0.5;

struct RunStats {
    postings: usize,
    mean_score: f64,
    max_score: f64,
    high_risk: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let accounts = parse_arg(&args, "--accounts", 25usize).max(1);
    let postings = parse_arg(&args, "--postings", 5_000usize);
    let threads = parse_arg(&args, "--threads", 4usize).clamp(1, accounts);
    let log_webhooks = args.iter().any(|a| a == "--log-webhooks");
    let json_output = args.iter().any(|a| a == "--json");
    let db = find_arg(&args, "--db").unwrap_or(":memory:");

    let config = match find_arg(&args, "--config") {
        Some(path) => RiskConfig::load(path)?,
        None => RiskConfig::default_test(),
    };

    if !json_output {
        println!("risk-runner");
        println!("  seed:      {seed}");
        println!("  accounts:  {accounts}");
        println!("  postings:  {postings}");
        println!("  threads:   {threads}");
        println!("  db:        {db}");
        println!();
    }

    let store = SqliteStore::open(db)?;
    store.migrate()?;

    let (worker, notifier) = if log_webhooks {
        DeliveryWorker::from_config(&config, LogSink)?
    } else {
        DeliveryWorker::from_config(&config, MemorySink::default())?
    };
    let dropped = notifier.clone();

    let engine = Arc::new(RiskEngine::build(&config, Arc::new(store), Arc::new(notifier)));

    let ledger = open_accounts(&engine, accounts, &mut for_stream(seed, Stream::Monitors))?;
    let plan = plan_postings(accounts, postings, &mut for_stream(seed, Stream::Postings));

    let started = Instant::now();
    let scores = run_postings(&engine, ledger, &plan, threads);
    let elapsed = started.elapsed();

    let top = top_accounts(&engine)?;

    // Last notifier handles go with the engine; the worker then drains.
    let dropped_count = dropped.dropped();
    drop(dropped);
    let tracked = engine.tracker().len();
    drop(engine);
    let delivery = worker.shutdown();

    let stats = summarize(&scores);
    if json_output {
        print_json(&stats, &delivery, dropped_count, tracked, &top)?;
    } else {
        print_summary(&stats, &delivery, dropped_count, tracked, &top, elapsed.as_secs_f64());
    }
    Ok(())
}

/// Create `count` balances with 0..=3 random monitors each.
fn open_accounts(engine: &RiskEngine, count: usize, rng: &mut StreamRng) -> Result<Vec<Balance>> {
    let mut ledger = Vec::with_capacity(count);
    for _ in 0..count {
        let balance = engine.create_balance(Balance::new("ldg_runner", "USD"))?;
        let monitors = rng.next_u64_below(4);
        for _ in 0..monitors {
            let condition = AlertCondition {
                field: *rng.pick(&FIELDS),
                operator: *rng.pick(&OPERATORS),
                value: rng.range_i64(10_000, 500_000),
            };
            engine.create_monitor(
                BalanceMonitor::new(balance.balance_id.clone(), condition)
                    .with_description(format!("runner: {condition}")),
            )?;
        }
        ledger.push(balance);
    }
    log::info!("runner: opened {count} accounts");
    Ok(ledger)
}

/// (account index, signed amount). Positive credits, negative debits.
fn plan_postings(accounts: usize, postings: usize, rng: &mut StreamRng) -> Vec<(usize, i64)> {
    (0..postings)
        .map(|_| {
            let account = rng.next_u64_below(accounts as u64) as usize;
            let magnitude = if rng.chance(0.05) {
                rng.range_i64(50_000, 250_000)
            } else {
                rng.range_i64(100, 20_000)
            };
            let amount = if rng.chance(0.7) { magnitude } else { -magnitude };
            (account, amount)
        })
        .collect()
}

/// Each thread owns the accounts with `index % threads == t`, so postings
/// to one account stay in plan order.
fn run_postings(
    engine: &Arc<RiskEngine>,
    ledger: Vec<Balance>,
    plan: &[(usize, i64)],
    threads: usize,
) -> Vec<f64> {
    let mut shards: Vec<Vec<(usize, Balance)>> = (0..threads).map(|_| Vec::new()).collect();
    for (idx, balance) in ledger.into_iter().enumerate() {
        shards[idx % threads].push((idx, balance));
    }

    thread::scope(|s| {
        let handles: Vec<_> = shards
            .into_iter()
            .enumerate()
            .map(|(t, mut shard)| {
                let engine = Arc::clone(engine);
                s.spawn(move || {
                    let mut scores = Vec::new();
                    for &(account, amount) in plan.iter().filter(|(a, _)| a % threads == t) {
                        let slot = account / threads;
                        let next = shard[slot].1.post(amount);
                        scores.push(engine.on_balance_committed(&next, amount.abs()));
                        shard[slot].1 = next;
                    }
                    scores
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| {
                h.join().unwrap_or_else(|_| {
                    log::warn!("runner: posting thread panicked");
                    Vec::new()
                })
            })
            .collect()
    })
}

fn top_accounts(engine: &RiskEngine) -> Result<Vec<(String, u64)>> {
    let mut freq: Vec<(String, u64)> = engine
        .get_all_balances()?
        .into_iter()
        .map(|b| {
            let f = engine.tracker().frequency(&b.balance_id);
            (b.balance_id, f)
        })
        .collect();
    freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    freq.truncate(5);
    Ok(freq)
}

fn summarize(scores: &[f64]) -> RunStats {
    let postings = scores.len();
    let total: f64 = scores.iter().sum();
    RunStats {
        postings,
        mean_score: if postings > 0 { total / postings as f64 } else { 0.0 },
        max_score: scores.iter().copied().fold(0.0, f64::max),
        high_risk: scores.iter().filter(|s| **s >= HIGH_RISK_SCORE).count(),
    }
}

fn print_summary(
    stats: &RunStats,
    delivery: &DeliveryStats,
    dropped: u64,
    tracked: usize,
    top: &[(String, u64)],
    secs: f64,
) {
    let rate = if secs > 0.0 { stats.postings as f64 / secs } else { 0.0 };

    println!("=== RUN SUMMARY ===");
    println!("  postings:        {}", stats.postings);
    println!("  elapsed:         {secs:.2}s ({rate:.0}/s)");
    println!("  tracked:         {tracked}");
    println!("  mean score:      {:.4}", stats.mean_score);
    println!("  max score:       {:.4}", stats.max_score);
    println!("  high risk:       {} (score >= {HIGH_RISK_SCORE})", stats.high_risk);
    println!("  alerts sent:     {}", delivery.delivered);
    println!("  alerts failed:   {}", delivery.failed);
    println!("  alerts dropped:  {dropped}");

    println!();
    println!("=== MOST ACTIVE ACCOUNTS ===");
    for (id, f) in top {
        println!("  {id} | changes: {f}");
    }
}

fn print_json(
    stats: &RunStats,
    delivery: &DeliveryStats,
    dropped: u64,
    tracked: usize,
    top: &[(String, u64)],
) -> Result<()> {
    let summary = serde_json::json!({
        "postings": stats.postings,
        "tracked": tracked,
        "mean_score": stats.mean_score,
        "max_score": stats.max_score,
        "high_risk": stats.high_risk,
        "alerts": {
            "delivered": delivery.delivered,
            "failed": delivery.failed,
            "dropped": dropped,
        },
        "top_accounts": top
            .iter()
            .map(|(id, f)| serde_json::json!({ "balance_id": id, "changes": f }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
