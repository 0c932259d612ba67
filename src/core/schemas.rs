//! Centralized database schema definitions for the board database.
//!
//! Choreboard keeps all state in a single SQLite database (`board.db`) so
//! that a chore approval, its ledger credits, and its recurrence successor
//! commit as one transaction.

pub const BOARD_DB_NAME: &str = "board.db";

pub const BOARD_DB_SCHEMA_USERS: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        role TEXT NOT NULL CHECK(role IN ('ADMIN','PARENT','CHILD')),
        password_hash TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )
";

pub const BOARD_DB_SCHEMA_CHORES: &str = "
    CREATE TABLE IF NOT EXISTS chores (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        points INTEGER NOT NULL CHECK(points > 0),
        recurrence TEXT NOT NULL CHECK(recurrence IN ('NONE','DAILY','WEEKLY')) DEFAULT 'NONE',
        due_date TEXT,
        status TEXT NOT NULL CHECK(status IN ('ASSIGNED','DONE_PENDING','APPROVED','REJECTED')) DEFAULT 'ASSIGNED',
        created_by TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(created_by) REFERENCES users(id)
    )
";

pub const BOARD_DB_SCHEMA_CHORE_ASSIGNMENTS: &str = "
    CREATE TABLE IF NOT EXISTS chore_assignments (
        chore_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        PRIMARY KEY (chore_id, user_id),
        FOREIGN KEY(chore_id) REFERENCES chores(id) ON DELETE CASCADE,
        FOREIGN KEY(user_id) REFERENCES users(id)
    )
";

pub const BOARD_DB_SCHEMA_CHORE_EVENTS: &str = "
    CREATE TABLE IF NOT EXISTS chore_events (
        id TEXT PRIMARY KEY,
        chore_id TEXT NOT NULL,
        from_status TEXT,
        to_status TEXT NOT NULL,
        actor_id TEXT NOT NULL,
        note TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        FOREIGN KEY(chore_id) REFERENCES chores(id) ON DELETE CASCADE,
        FOREIGN KEY(actor_id) REFERENCES users(id)
    )
";

pub const BOARD_DB_SCHEMA_REWARDS: &str = "
    CREATE TABLE IF NOT EXISTS rewards (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        cost INTEGER NOT NULL CHECK(cost > 0),
        is_active INTEGER NOT NULL DEFAULT 1,
        limit_per_week INTEGER,
        created_by TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(created_by) REFERENCES users(id)
    )
";

pub const BOARD_DB_SCHEMA_REDEMPTIONS: &str = "
    CREATE TABLE IF NOT EXISTS redemptions (
        id TEXT PRIMARY KEY,
        reward_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        status TEXT NOT NULL CHECK(status IN ('REQUESTED','APPROVED','DENIED')) DEFAULT 'REQUESTED',
        note TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        decided_at TEXT,
        decided_by TEXT,
        FOREIGN KEY(reward_id) REFERENCES rewards(id),
        FOREIGN KEY(user_id) REFERENCES users(id),
        FOREIGN KEY(decided_by) REFERENCES users(id)
    )
";

// Append-only. Balances are always SUM(delta); there is no cached balance
// column anywhere in the schema.
pub const BOARD_DB_SCHEMA_LEDGER: &str = "
    CREATE TABLE IF NOT EXISTS ledger (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        delta INTEGER NOT NULL,
        reason TEXT NOT NULL,
        ref_type TEXT NOT NULL CHECK(ref_type IN ('CHORE','REWARD','ADJUST')),
        ref_id TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id)
    )
";

pub const BOARD_DB_INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_chores_status ON chores(status)",
    "CREATE INDEX IF NOT EXISTS idx_assignments_user ON chore_assignments(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_ledger_user_time ON ledger(user_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_redemptions_user_reward ON redemptions(user_id, reward_id, status)",
];
