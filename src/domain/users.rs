use crate::core::broker::DbBroker;
use crate::core::db::{self, board_db_path};
use crate::core::error;
use crate::core::store::Store;
use crate::core::time;
use crate::domain::policy::{self, Operation, PolicyContext};
use crate::domain::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Parent,
    Child,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Parent => "PARENT",
            Role::Child => "CHILD",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "PARENT" => Some(Role::Parent),
            "CHILD" => Some(Role::Child),
            _ => None,
        }
    }
}

/// The authenticated identity performing an operation.
///
/// Resolution from credentials happens outside this crate; the engine only
/// sees the resolved id and role.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
}

fn role_from_row(s: &str) -> Result<Role, error::ChoreboardError> {
    Role::parse(s).ok_or_else(|| {
        error::ChoreboardError::ValidationError(format!("unknown role '{}' in store", s))
    })
}

fn user_from_row(row: &rusqlite::Row) -> Result<User, error::ChoreboardError> {
    let role: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        role: role_from_row(&role)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const USER_COLUMNS: &str = "id, username, display_name, role, is_active, created_at";

pub fn get_user_conn(
    conn: &Connection,
    user_id: &str,
) -> Result<Option<User>, error::ChoreboardError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE id = ?1",
        USER_COLUMNS
    ))?;
    let mut rows = stmt.query(params![user_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(user_from_row(row)?)),
        None => Ok(None),
    }
}

pub fn get_user_by_username_conn(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, error::ChoreboardError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE username = ?1",
        USER_COLUMNS
    ))?;
    let mut rows = stmt.query(params![username])?;
    match rows.next()? {
        Some(row) => Ok(Some(user_from_row(row)?)),
        None => Ok(None),
    }
}

/// Resolve an acting username to an [`Actor`].
///
/// Stands in for the excluded authentication layer: lookup only, no
/// credential verification. Unknown or deactivated users cannot act.
pub fn resolve_actor(store: &Store, username: &str) -> Result<Actor, error::ChoreboardError> {
    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_conn(&db_path, username, "user.resolve", |conn| {
        db::ensure_schema(conn)?;
        let user = get_user_by_username_conn(conn, username)?;
        match user {
            Some(u) if u.is_active => Ok(Actor {
                id: u.id,
                role: u.role,
            }),
            _ => Err(error::ChoreboardError::Forbidden(format!(
                "unknown or inactive actor '{}'",
                username
            ))),
        }
    })
}

pub fn create_user(
    store: &Store,
    actor: &Actor,
    username: &str,
    display_name: &str,
    role: Role,
    password_hash: &str,
) -> Result<User, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::CreateUser, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "only ADMIN may create accounts".into(),
        ));
    }
    let username = username.trim();
    if username.is_empty() || display_name.trim().is_empty() || password_hash.is_empty() {
        return Err(error::ChoreboardError::ValidationError(
            "username, display_name and password_hash are required".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);
    let user_id = Ulid::new().to_string();
    let ts = time::now_iso();

    broker.with_txn(&db_path, &actor.id, "user.create", |conn| {
        db::ensure_schema(conn)?;
        let inserted = conn.execute(
            "INSERT INTO users(id, username, display_name, role, password_hash, is_active, created_at)
             VALUES(?1, ?2, ?3, ?4, ?5, 1, ?6)",
            params![
                user_id,
                username,
                display_name.trim(),
                role.as_str(),
                password_hash,
                ts
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(error::ChoreboardError::ValidationError(format!(
                    "username '{}' already exists",
                    username
                )));
            }
            Err(e) => return Err(e.into()),
        }
        get_user_conn(conn, &user_id)?.ok_or_else(|| {
            error::ChoreboardError::NotFound(format!("user {} after insert", user_id))
        })
    })
}

pub fn update_user(
    store: &Store,
    actor: &Actor,
    user_id: &str,
    display_name: Option<&str>,
    role: Option<Role>,
    is_active: Option<bool>,
) -> Result<User, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::UpdateUser, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "only ADMIN may modify accounts".into(),
        ));
    }
    if let Some(name) = display_name {
        if name.trim().is_empty() {
            return Err(error::ChoreboardError::ValidationError(
                "display_name cannot be empty".into(),
            ));
        }
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_txn(&db_path, &actor.id, "user.update", |conn| {
        db::ensure_schema(conn)?;
        let existing = get_user_conn(conn, user_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("user {}", user_id)))?;

        let display_name = display_name
            .map(|s| s.trim().to_string())
            .unwrap_or(existing.display_name);
        let role = role.unwrap_or(existing.role);
        let is_active = is_active.unwrap_or(existing.is_active);

        conn.execute(
            "UPDATE users SET display_name = ?1, role = ?2, is_active = ?3 WHERE id = ?4",
            params![display_name, role.as_str(), is_active, user_id],
        )?;
        get_user_conn(conn, user_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("user {}", user_id)))
    })
}

pub fn list_users(store: &Store, actor: &Actor) -> Result<Vec<User>, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::ListUsers, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "listing accounts requires PARENT or ADMIN".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_conn(&db_path, &actor.id, "user.list", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at",
            USER_COLUMNS
        ))?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(user_from_row(row)?);
        }
        Ok(out)
    })
}

/// Seed the initial ADMIN account on an empty board.
///
/// Only runs when the users table is empty, so re-running init preserves
/// existing accounts.
pub fn seed_admin_if_empty(store: &Store) -> Result<Option<User>, error::ChoreboardError> {
    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);
    let user_id = Ulid::new().to_string();
    let ts = time::now_iso();

    broker.with_txn(&db_path, "choreboard", "user.seed", |conn| {
        db::ensure_schema(conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(None);
        }
        conn.execute(
            "INSERT INTO users(id, username, display_name, role, password_hash, is_active, created_at)
             VALUES(?1, 'admin', 'Admin', 'ADMIN', 'UNSET', 1, ?2)",
            params![user_id, ts],
        )?;
        get_user_conn(conn, &user_id)
    })
}

// ===== CLI =====

#[derive(Parser, Debug)]
#[clap(name = "user", about = "Manage family member accounts.")]
pub struct UserCli {
    #[clap(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create an account (ADMIN only).
    Add {
        #[clap(value_name = "USERNAME")]
        username: String,
        #[clap(long)]
        display_name: String,
        #[clap(long, value_enum)]
        role: Role,
        /// Opaque credential produced by the authentication layer.
        #[clap(long)]
        password_hash: String,
    },
    /// List accounts.
    List,
    /// Update display name, role, or active flag (ADMIN only).
    Update {
        #[clap(long)]
        id: String,
        #[clap(long)]
        display_name: Option<String>,
        #[clap(long, value_enum)]
        role: Option<Role>,
        /// Deactivate with --active false; accounts are never deleted.
        #[clap(long)]
        active: Option<bool>,
    },
}

pub fn run_user_cli(
    store: &Store,
    actor: &Actor,
    cli: UserCli,
    format: OutputFormat,
) -> Result<(), error::ChoreboardError> {
    match cli.command {
        UserCommand::Add {
            username,
            display_name,
            role,
            password_hash,
        } => {
            let user = create_user(store, actor, &username, &display_name, role, &password_hash)?;
            print_user(&user, format);
        }
        UserCommand::List => {
            let users = list_users(store, actor)?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&users).unwrap());
            } else {
                for user in users {
                    print_user(&user, OutputFormat::Text);
                }
            }
        }
        UserCommand::Update {
            id,
            display_name,
            role,
            active,
        } => {
            let user = update_user(store, actor, &id, display_name.as_deref(), role, active)?;
            print_user(&user, format);
        }
    }
    Ok(())
}

fn print_user(user: &User, format: OutputFormat) {
    use colored::Colorize;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(user).unwrap()),
        OutputFormat::Text => {
            let state = if user.is_active { "active" } else { "inactive" };
            println!(
                "{} {} [{}] {} ({})",
                user.id.bright_black(),
                user.username.bright_white().bold(),
                user.role.as_str(),
                user.display_name,
                state
            );
        }
    }
}
