use crate::db::Database;
use crate::error::Result;
use rusqlite::Connection;

const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS machine_types (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT UNIQUE,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS machines (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        machine_type_id INTEGER NOT NULL REFERENCES machine_types(id) ON DELETE CASCADE,
        available INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS analyses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category TEXT NOT NULL,
        species TEXT,
        volume REAL NOT NULL DEFAULT 0,
        input_json TEXT NOT NULL,
        recommendations_json TEXT NOT NULL,
        headline TEXT,
        justification TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    // Migration 2: Add indexes
    r#"
    CREATE INDEX IF NOT EXISTS idx_machines_type
        ON machines(machine_type_id);
    CREATE INDEX IF NOT EXISTS idx_analyses_created_at
        ON analyses(created_at);
    "#,
    // Migration 3: Seed the canonical machine types
    r#"
    INSERT OR IGNORE INTO machine_types (code, name, description) VALUES
        ('chipeadora', 'Chipeadora', 'Astilladora de trozos y costaneros'),
        ('reprocesadora', 'Reprocesadora', 'Cepilladora y moldurera para segunda calidad'),
        ('finger_joint', 'Finger Joint', 'Línea de empalme dentado'),
        ('caldera', 'Caldera', 'Caldera de biomasa de la planta'),
        ('pelletizadora', 'Pelletizadora', 'Prensa de pellets'),
        ('descortezadora', 'Descortezadora', 'Descortezadora de trozos');
    "#,
];

/// Applies pending migrations in order, each in its own transaction.
/// Returns how many were applied.
pub fn run(db: &Database) -> Result<usize> {
    db.with_conn_mut(|conn| {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;

        let current = current_version(conn)?;
        let mut applied = 0;
        for (version, migration) in (1..).zip(MIGRATIONS) {
            if version <= current {
                continue;
            }
            tracing::info!(version, "Applying migration");
            let tx = conn.transaction()?;
            tx.execute_batch(migration)?;
            tx.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [version])?;
            tx.commit()?;
            applied += 1;
        }

        if current > MIGRATIONS.len() as i32 {
            tracing::warn!(
                version = current,
                known = MIGRATIONS.len(),
                "Database schema is newer than this build"
            );
        }

        Ok(applied)
    })
}

pub(super) fn current_version(conn: &Connection) -> Result<i32> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(run(&db).unwrap(), 0);
        assert_eq!(db.schema_version().unwrap(), MIGRATIONS.len() as i32);
    }

    #[test]
    fn only_pending_migrations_are_applied() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute("DELETE FROM schema_migrations WHERE version = 3", [])?;
            conn.execute("DELETE FROM machine_types", [])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(db.schema_version().unwrap(), 2);

        assert_eq!(run(&db).unwrap(), 1);
        assert_eq!(db.schema_version().unwrap(), 3);
        assert_eq!(db.list_machine_types().unwrap().len(), 6);
    }

    #[test]
    fn seeds_machine_types() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM machine_types", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 6);
    }
}
