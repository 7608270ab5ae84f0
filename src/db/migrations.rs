//! Database migrations

/// SQL for creating the database schema
pub const INIT_SCHEMA: &str = r#"
-- Questionnaire responses, one per respondent
CREATE TABLE IF NOT EXISTS questionnaire (
    email TEXT PRIMARY KEY,
    hobbies TEXT,
    topics TEXT,
    gender TEXT,
    year TEXT,
    purpose TEXT,
    submitted_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Group roster; email holds the comma-joined member list
CREATE TABLE IF NOT EXISTS group_roster (
    id TEXT PRIMARY KEY,
    group_name TEXT NOT NULL,
    email TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Chat messages per group
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    group_name TEXT NOT NULL,
    email TEXT NOT NULL,
    message TEXT NOT NULL,
    timestamp TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_questionnaire_submitted ON questionnaire(submitted_at);
CREATE INDEX IF NOT EXISTS idx_group_roster_name ON group_roster(group_name);
CREATE INDEX IF NOT EXISTS idx_messages_group ON messages(group_name, timestamp);
"#;
