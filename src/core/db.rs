use crate::core::broker::DbBroker;
use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

pub fn db_connect(db_path: &str) -> Result<Connection, error::ChoreboardError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::ChoreboardError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::ChoreboardError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::ChoreboardError::RusqliteError)?;
    Ok(conn)
}

pub fn board_db_path(root: &Path) -> PathBuf {
    root.join(schemas::BOARD_DB_NAME)
}

pub fn ensure_schema(conn: &Connection) -> Result<(), error::ChoreboardError> {
    conn.execute(schemas::BOARD_DB_SCHEMA_USERS, [])?;
    conn.execute(schemas::BOARD_DB_SCHEMA_CHORES, [])?;
    conn.execute(schemas::BOARD_DB_SCHEMA_CHORE_ASSIGNMENTS, [])?;
    conn.execute(schemas::BOARD_DB_SCHEMA_CHORE_EVENTS, [])?;
    conn.execute(schemas::BOARD_DB_SCHEMA_REWARDS, [])?;
    conn.execute(schemas::BOARD_DB_SCHEMA_REDEMPTIONS, [])?;
    conn.execute(schemas::BOARD_DB_SCHEMA_LEDGER, [])?;
    for index in schemas::BOARD_DB_INDEXES {
        conn.execute(index, [])?;
    }
    Ok(())
}

pub fn initialize_board_db(root: &Path) -> Result<(), error::ChoreboardError> {
    let db_path = board_db_path(root);
    let parent_dir = db_path.parent().unwrap();
    fs::create_dir_all(parent_dir).map_err(error::ChoreboardError::IoError)?;

    let broker = DbBroker::new(root);
    broker.with_txn(&db_path, "choreboard", "board.init", |conn| {
        ensure_schema(conn)
    })?;

    Ok(())
}
