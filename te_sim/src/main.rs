//! Headless multi-table simulator for the table engine.
//!
//! Spawns tables through TableManager, seats scripted bots at each one and
//! lets them play until every table has dealt the requested number of
//! hands. Some bots never act so turn timeouts get exercised too.

mod bot;
mod config;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Error, bail};
use ctrlc::set_handler;
use log::{info, warn};
use pico_args::Arguments;
use rand::{Rng, SeedableRng, rngs::StdRng};
use table_engine::{
    TableId, TableSnapshot,
    entities::{PlayerId, TableStatus},
    table::{LogSink, TableManager},
};

use bot::Bot;
use config::SimConfig;

const HELP: &str = "\
Run table engine simulations with scripted players

USAGE:
  te_sim [OPTIONS]

OPTIONS:
  --tables     N           Number of tables to run     [default: env SIM_TABLES or 2]
  --hands      N           Hands to deal per table     [default: env SIM_HANDS or 20]
  --seed       N           Seed decks and bots         [default: env SIM_SEED or random]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SIM_PLAYERS_PER_TABLE    Bots seated at each table (2-10)
  SIM_SMALL_BLIND          Small blind
  SIM_BIG_BLIND            Big blind
  SIM_BUY_IN               Chips each bot buys in for
  SIM_TABLE_SPEED          normal, turbo or hyper (turn timeout 30s/15s/5s)
  SIM_NEXT_HAND_DELAY_SECS Pause between hands
  SIM_IDLE_PERCENT         Share of bots that never act
  SIM_LOG_EVENTS           Log every table event as JSON
  RUST_LOG                 Log level (e.g. info, debug)
";

struct Args {
    tables: Option<usize>,
    hands: Option<u64>,
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        tables: pargs.opt_value_from_str("--tables")?,
        hands: pargs.opt_value_from_str("--hands")?,
        seed: pargs.opt_value_from_str("--seed")?,
    };

    // First Ctrl+C stops dealing; tables are still closed and paid out.
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    env_logger::builder().format_target(false).init();

    let config = SimConfig::from_env(args.tables, args.hands, args.seed)?;
    config.validate()?;
    info!(
        "Simulating {} table(s) x {} players for {} hands ({} speed)",
        config.tables, config.players_per_table, config.hands, config.table.speed
    );

    let mut manager = TableManager::new();
    if config.log_events {
        manager = manager.with_sink(Arc::new(LogSink));
    }
    let manager = Arc::new(manager);

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut tables = Vec::with_capacity(config.tables);
    let mut bots = Vec::new();
    for index in 0..config.tables {
        let table = manager.create_table(config.table_config(index)).await?;
        for p in 0..config.players_per_table {
            let player_id = (index * 100 + p + 1) as PlayerId;
            let idle = rng.random_range(0..100u8) < config.idle_percent;
            let bot = Bot::new(player_id, table, config.table.buy_in, idle, rng.random());
            bots.push(tokio::spawn(bot.run(manager.clone())));
        }
        tables.push(table);
    }

    let mut finished: HashSet<TableId> = HashSet::new();
    while finished.len() < tables.len() && !stop.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(250)).await;
        for &table in &tables {
            if finished.contains(&table) {
                continue;
            }
            let snapshot = manager.get_snapshot(table, None).await?;
            if is_done(&snapshot, config.hands) {
                info!(
                    "Table {} done after {} hand(s)",
                    table, snapshot.hand_number
                );
                finished.insert(table);
            }
        }
    }
    if stop.load(Ordering::SeqCst) {
        info!("Interrupted, closing tables");
    }

    println!(
        "{:<8} {:>6} {:>8} {:>10} {:>10}",
        "table", "hands", "players", "bought in", "paid out"
    );
    let mut mismatched = Vec::new();
    for &table in &tables {
        let snapshot = manager.get_snapshot(table, None).await?;
        let players = snapshot.seats.iter().flatten().count();
        let bought_in = players as u64 * u64::from(config.table.buy_in);
        let payouts = manager.close_table(table).await?;
        let paid_out: u64 = payouts.iter().map(|&(_, _, chips)| u64::from(chips)).sum();
        println!(
            "{:<8} {:>6} {:>8} {:>10} {:>10}",
            table, snapshot.hand_number, players, bought_in, paid_out
        );
        if let Some(reason) = &snapshot.halted {
            warn!("Table {} halted: {}", table, reason);
        }
        if bought_in != paid_out {
            mismatched.push(table);
        }
    }

    for bot in bots {
        match bot.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Bot stopped: {e}"),
            Err(e) => warn!("Bot task failed: {e}"),
        }
    }

    if !mismatched.is_empty() {
        bail!("chips not conserved at table(s) {mismatched:?}");
    }
    Ok(())
}

/// A table is done once it dealt enough hands, or can no longer deal one.
fn is_done(snapshot: &TableSnapshot, hands: u64) -> bool {
    if snapshot.status == TableStatus::Playing {
        return false;
    }
    let funded = snapshot
        .seats
        .iter()
        .flatten()
        .filter(|s| s.chips > 0)
        .count();
    snapshot.halted.is_some()
        || snapshot.hand_number >= hands
        || (snapshot.hand_number > 0 && funded < 2)
}
