use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, categories, sentences)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                email           TEXT NOT NULL UNIQUE,
                hashed_password TEXT NOT NULL,
                nickname        TEXT,
                active          INTEGER NOT NULL DEFAULT 0,
                is_superuser    INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            -- Per-user permission record for the sentence app (1:1 with users)
            CREATE TABLE sentence_user_config (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                is_superuser    INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE sentence_categories (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL UNIQUE,
                description     TEXT,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE sentences (
                id              TEXT PRIMARY KEY,
                content         TEXT NOT NULL UNIQUE,
                from_source     TEXT,
                from_who        TEXT,
                likes           INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
                is_disabled     INTEGER NOT NULL DEFAULT 1,
                category_id     TEXT NOT NULL REFERENCES sentence_categories(id) ON DELETE CASCADE,
                creator_id      TEXT NOT NULL REFERENCES sentence_user_config(id) ON DELETE CASCADE,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_sentences_category ON sentences(category_id);
            CREATE INDEX idx_sentences_creator ON sentences(creator_id);
            CREATE INDEX idx_sentences_created ON sentences(created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
