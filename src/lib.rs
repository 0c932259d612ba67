//! Choreboard: a local-first family chore and points engine.
//!
//! Choreboard tracks household chores, a points economy, and reward
//! redemption for one family, with role-gated permissions (ADMIN, PARENT,
//! CHILD). The heart of the crate is the chore lifecycle and points-ledger
//! engine:
//!
//! - **Chore state machine**: ASSIGNED → DONE_PENDING → {APPROVED, REJECTED},
//!   with REJECTED → DONE_PENDING re-attempts and APPROVED terminal.
//! - **Points ledger**: append-only signed deltas per user; a balance is
//!   always the sum of a user's entries, never a stored field.
//! - **Redemptions**: REQUESTED → {APPROVED, DENIED}; points move only at
//!   approval, which re-validates the balance. No escrow.
//! - **Recurrence**: approving a DAILY/WEEKLY chore spawns its successor,
//!   hidden from default listings until its due date arrives.
//! - **Access policy**: one pure predicate over (role, operation, context),
//!   consulted before any state mutation.
//!
//! # Architecture
//!
//! All state lives in a single SQLite database under
//! `<project>/.choreboard/data/`. Mutations route through the
//! [`core::broker::DbBroker`]: one serialized `BEGIN IMMEDIATE` transaction
//! per operation plus a JSONL audit trail, so a chore approval, its ledger
//! credits, and its recurrence successor commit or roll back together.
//!
//! The CLI is a thin caller standing in for an API layer: `--actor` resolves
//! a username to an identity (no credential checks here; authentication is
//! the embedding application's concern) and each subcommand maps onto one
//! library operation.
//!
//! # Examples
//!
//! ```bash
//! # Initialize a board (seeds the admin account)
//! choreboard init
//!
//! # Set up the family
//! choreboard --actor admin user add dad --display-name "Dad" --role parent --password-hash '...'
//! choreboard --actor admin user add maya --display-name "Maya" --role child --password-hash '...'
//!
//! # Run a chore through its lifecycle
//! choreboard --actor dad chore add "Dishes" --points 10 --assignee <maya-id>
//! choreboard --actor maya chore done --id <chore-id>
//! choreboard --actor dad chore approve --id <chore-id>
//!
//! # Spend the points
//! choreboard --actor dad reward add "Movie night" --cost 25
//! choreboard --actor maya redeem request --reward <reward-id>
//! choreboard --actor dad redeem approve --id <redemption-id>
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: store handle, SQLite schema, transactional broker, errors
//! - [`domain`]: users, policy, chores, rewards, redemptions, ledger,
//!   recurrence

pub mod core;
pub mod domain;

use core::{db, error, store::Store};
use domain::{chores, ledger, redemptions, rewards, users, OutputFormat};

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(
    name = "choreboard",
    version = env!("CARGO_PKG_VERSION"),
    about = "The family chore and points engine"
)]
struct Cli {
    /// Acting username; resolved to an identity and role before dispatch.
    #[clap(long, global = true, default_value = "admin")]
    actor: String,
    /// Output format for command results.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct InitCli {
    /// Directory to initialize (defaults to current working directory).
    #[clap(short, long)]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the board database and seed the admin account.
    #[clap(name = "init", visible_alias = "i")]
    Init(InitCli),

    /// Manage family member accounts (ADMIN).
    #[clap(name = "user", visible_alias = "u")]
    User(users::UserCli),

    /// Manage chores through their lifecycle.
    #[clap(name = "chore", visible_alias = "c")]
    Chore(chores::ChoreCli),

    /// Manage the reward catalog.
    #[clap(name = "reward", visible_alias = "rw")]
    Reward(rewards::RewardCli),

    /// Request and decide reward redemptions.
    #[clap(name = "redeem", visible_alias = "rd")]
    Redeem(redemptions::RedeemCli),

    /// Inspect and adjust point balances.
    #[clap(name = "ledger", visible_alias = "l")]
    Ledger(ledger::LedgerCli),

    /// Show version information.
    #[clap(name = "version")]
    Version,
}

fn find_board_root(start_dir: &Path) -> Result<PathBuf, error::ChoreboardError> {
    let mut current_dir = PathBuf::from(start_dir);
    loop {
        if current_dir.join(".choreboard").exists() {
            return Ok(current_dir);
        }
        if !current_dir.pop() {
            return Err(error::ChoreboardError::NotFound(
                "'.choreboard' directory not found in current or parent directories. Run `choreboard init` first.".to_string(),
            ));
        }
    }
}

fn run_init(init: InitCli, current_dir: &Path) -> Result<(), error::ChoreboardError> {
    use colored::Colorize;

    let target_dir = match init.dir {
        Some(d) => d,
        None => current_dir.to_path_buf(),
    };
    let target_dir = std::fs::canonicalize(&target_dir).map_err(error::ChoreboardError::IoError)?;

    let store_root = target_dir.join(".choreboard").join("data");
    std::fs::create_dir_all(&store_root).map_err(error::ChoreboardError::IoError)?;

    let db_path = db::board_db_path(&store_root);
    if db_path.exists() {
        println!(
            "{} {} (preserved - existing data kept)",
            "✓".bright_green(),
            db_path.display()
        );
    } else {
        db::initialize_board_db(&store_root)?;
        println!("{} {}", "●".bright_green(), db_path.display());
    }

    let store = Store::new(store_root);
    if let Some(admin) = users::seed_admin_if_empty(&store)? {
        println!(
            "{} Seeded admin account '{}' with an unset credential. Set a real one before exposing the board.",
            "⚠".bright_yellow(),
            admin.username.bright_cyan().bold()
        );
    }

    println!(
        "Board initialized at {}",
        target_dir.display().to_string().bright_white()
    );
    Ok(())
}

pub fn run() -> Result<(), error::ChoreboardError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;

    match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Init(init) => run_init(init, &current_dir),
        command => {
            let board_root = find_board_root(&current_dir)?;
            let store = Store::new(board_root.join(".choreboard").join("data"));
            let actor = users::resolve_actor(&store, &cli.actor)?;

            match command {
                Command::User(user_cli) => {
                    users::run_user_cli(&store, &actor, user_cli, cli.format)
                }
                Command::Chore(chore_cli) => {
                    chores::run_chore_cli(&store, &actor, chore_cli, cli.format)
                }
                Command::Reward(reward_cli) => {
                    rewards::run_reward_cli(&store, &actor, reward_cli, cli.format)
                }
                Command::Redeem(redeem_cli) => {
                    redemptions::run_redeem_cli(&store, &actor, redeem_cli, cli.format)
                }
                Command::Ledger(ledger_cli) => {
                    ledger::run_ledger_cli(&store, &actor, ledger_cli, cli.format)
                }
                Command::Init(_) | Command::Version => unreachable!(),
            }
        }
    }
}
