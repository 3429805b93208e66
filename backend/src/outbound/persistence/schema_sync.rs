//! Idempotent table creation for the relational driver.
//!
//! Runs on every `connect()`. Only `CREATE ... IF NOT EXISTS` statements are
//! issued, so existing tables and data are never altered.

use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};
use tracing::debug;

use crate::domain::ports::PersistenceError;

use super::diesel_error_mapping::map_diesel_error;

/// Tables, keys and constraints created by `DieselPersistence::connect`.
pub(crate) const SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS playlists (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL CHECK (btrim(name) <> ''),
    owner_email TEXT NOT NULL
        REFERENCES users (email) ON DELETE CASCADE ON UPDATE CASCADE,
    owner_id BIGINT
        REFERENCES users (id) ON DELETE SET NULL ON UPDATE CASCADE,
    songs JSONB NOT NULL DEFAULT '[]'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS playlists_owner_email_idx ON playlists (owner_email);
CREATE INDEX IF NOT EXISTS playlists_name_idx ON playlists (name);

CREATE TABLE IF NOT EXISTS songs (
    id BIGSERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    artist TEXT NOT NULL,
    year INTEGER NOT NULL,
    you_tube_id TEXT NOT NULL,
    listens INTEGER NOT NULL DEFAULT 0 CHECK (listens >= 0),
    playlist_count INTEGER NOT NULL DEFAULT 0 CHECK (playlist_count >= 0),
    owner_id TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

/// Create any missing tables and indexes.
pub(crate) async fn sync_schema(conn: &mut AsyncPgConnection) -> Result<(), PersistenceError> {
    conn.batch_execute(SCHEMA_DDL)
        .await
        .map_err(map_diesel_error)?;
    debug!("relational schema in place");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn ddl_only_creates_missing_objects() {
        let statements: Vec<&str> = SCHEMA_DDL
            .split(';')
            .map(str::trim)
            .filter(|statement| !statement.is_empty())
            .collect();

        assert_eq!(statements.len(), 5);
        assert!(
            statements
                .iter()
                .all(|statement| statement.contains("IF NOT EXISTS"))
        );
    }

    #[rstest]
    fn playlists_cascade_from_owner_email() {
        assert!(SCHEMA_DDL.contains(
            "REFERENCES users (email) ON DELETE CASCADE ON UPDATE CASCADE"
        ));
    }
}
