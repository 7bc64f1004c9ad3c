use crate::db::Database;
use crate::error::{EcoWoodError, Result};
use crate::models::{AnalysisRecord, Machine, MachineAvailability, MachineTypeRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tracing::warn;

// Machine Type Queries

impl Database {
    #[cfg(test)]
    pub fn create_machine_type(&self, machine_type: &MachineTypeRecord) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO machine_types (code, name, description) VALUES (?1, ?2, ?3)",
                params![
                    machine_type.code,
                    machine_type.name,
                    machine_type.description
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_machine_types(&self) -> Result<Vec<MachineTypeRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM machine_types ORDER BY name")?;
            let types = stmt
                .query_map([], row_to_machine_type)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(types)
        })
    }

    /// Looks a type up by code or display name, ignoring case.
    pub fn find_machine_type(&self, key: &str) -> Result<Option<MachineTypeRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                r#"
                SELECT * FROM machine_types
                WHERE code = ?1 COLLATE NOCASE OR name = ?1 COLLATE NOCASE
                ORDER BY code IS NULL, id
                LIMIT 1
                "#,
                [key.trim()],
                row_to_machine_type,
            )
            .optional()
            .map_err(Into::into)
        })
    }
}

fn row_to_machine_type(row: &Row) -> rusqlite::Result<MachineTypeRecord> {
    Ok(MachineTypeRecord {
        id: Some(row.get("id")?),
        code: row.get("code")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

// Machine Queries

const MACHINE_SELECT: &str = r#"
    SELECT m.id, m.name, m.available, m.created_at,
           t.id AS type_id, t.code AS type_code, t.name AS type_name,
           t.description AS type_description
    FROM machines m
    JOIN machine_types t ON t.id = m.machine_type_id
"#;

impl Database {
    pub fn create_machine(&self, machine: &Machine) -> Result<i64> {
        let type_id = machine
            .machine_type
            .id
            .ok_or_else(|| EcoWoodError::InvalidData("Machine type has no ID".into()))?;

        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO machines (name, machine_type_id, available, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    machine.name,
                    type_id,
                    machine.available,
                    machine.created_at.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_machines(&self) -> Result<Vec<Machine>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY m.id", MACHINE_SELECT))?;
            let machines = stmt
                .query_map([], row_to_machine)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(machines)
        })
    }

    pub fn set_machine_available(&self, id: i64, available: bool) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE machines SET available = ?1 WHERE id = ?2",
                params![available, id],
            )?;
            if changed == 0 {
                return Err(EcoWoodError::NotFound(format!("machine {}", id)));
            }
            Ok(())
        })
    }

    pub fn delete_machine(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM machines WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(EcoWoodError::NotFound(format!("machine {}", id)));
            }
            Ok(())
        })
    }

    /// Capability classes of every available machine, read fresh on each call.
    ///
    /// Types are resolved by stable code, falling back to the display-name
    /// classifier. Unresolvable types are skipped.
    pub fn available_machine_types(&self) -> Result<MachineAvailability> {
        let types = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT DISTINCT t.* FROM machine_types t
                JOIN machines m ON m.machine_type_id = t.id
                WHERE m.available = 1
                "#,
            )?;
            let types: Vec<MachineTypeRecord> = stmt
                .query_map([], row_to_machine_type)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(types)
        })?;

        Ok(types
            .iter()
            .filter_map(|t| {
                t.resolve().or_else(|| {
                    warn!(machine_type = %t.name, "Machine type matches no known capability, ignoring");
                    None
                })
            })
            .collect())
    }
}

fn row_to_machine(row: &Row) -> rusqlite::Result<Machine> {
    let created_at_str: String = row.get("created_at")?;

    Ok(Machine {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        machine_type: MachineTypeRecord {
            id: Some(row.get("type_id")?),
            code: row.get("type_code")?,
            name: row.get("type_name")?,
            description: row.get("type_description")?,
        },
        available: row.get("available")?,
        created_at: parse_timestamp(&created_at_str),
    })
}

// Analysis History Queries

impl Database {
    pub fn record_analysis(&self, record: &AnalysisRecord) -> Result<i64> {
        let input_json = serde_json::to_string(&record.input)?;
        let recommendations_json = serde_json::to_string(&record.recommendations)?;

        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO analyses
                    (category, species, volume, input_json, recommendations_json,
                     headline, justification, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    record.category,
                    record.species,
                    record.volume,
                    input_json,
                    recommendations_json,
                    record.headline,
                    record.justification,
                    record.created_at.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn recent_analyses(&self, limit: usize) -> Result<Vec<AnalysisRecord>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM analyses ORDER BY created_at DESC, id DESC LIMIT ?1")?;
            let records = stmt
                .query_map([limit as i64], row_to_analysis)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(records)
        })
    }
}

fn row_to_analysis(row: &Row) -> rusqlite::Result<AnalysisRecord> {
    let id: i64 = row.get("id")?;
    let input_json: String = row.get("input_json")?;
    let recommendations_json: String = row.get("recommendations_json")?;
    let created_at_str: String = row.get("created_at")?;

    let input = serde_json::from_str(&input_json).unwrap_or_else(|e| {
        warn!(analysis = id, error = %e, "Unreadable input_json in database, ignoring");
        serde_json::Value::Null
    });
    let recommendations = serde_json::from_str(&recommendations_json).unwrap_or_else(|e| {
        warn!(analysis = id, error = %e, "Unreadable recommendations_json in database, ignoring");
        Vec::new()
    });

    Ok(AnalysisRecord {
        id: Some(id),
        category: row.get("category")?,
        species: row.get("species")?,
        volume: row.get("volume")?,
        input,
        recommendations,
        headline: row.get("headline")?,
        justification: row.get("justification")?,
        created_at: parse_timestamp(&created_at_str),
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
