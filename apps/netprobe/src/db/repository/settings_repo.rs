//! Repository for settings-related database operations

use rusqlite::Connection;
use std::collections::HashMap;

use crate::error::{NetprobeError, Result};

/// Get a single setting value
///
/// # Arguments
/// * `conn` - Database connection
/// * `key` - The setting key
///
/// # Returns
/// The setting value as JSON, or None if not found
pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<serde_json::Value>> {
    let value: Option<String> = match conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        [key],
        |row| row.get(0),
    ) {
        Ok(v) => Some(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(NetprobeError::Database(e)),
    };

    match value {
        Some(v) => serde_json::from_str(&v)
            .map(Some)
            .map_err(NetprobeError::Json),
        None => Ok(None),
    }
}

/// Set a setting value
///
/// Accepts a plain connection or a transaction (which derefs to one).
pub fn set_setting(conn: &Connection, key: &str, value: &serde_json::Value) -> Result<()> {
    let value_str = serde_json::to_string(value).map_err(NetprobeError::Json)?;
    let now = chrono::Utc::now().to_rfc3339();

    conn.execute(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3
        "#,
        rusqlite::params![key, value_str, now],
    )
    .map_err(NetprobeError::Database)?;

    Ok(())
}

/// Get all settings as a HashMap
///
/// Rows whose value is not valid JSON are skipped.
pub fn get_all_settings(conn: &Connection) -> Result<HashMap<String, serde_json::Value>> {
    let mut stmt = conn
        .prepare("SELECT key, value FROM settings")
        .map_err(NetprobeError::Database)?;

    let settings: HashMap<String, serde_json::Value> = stmt
        .query_map([], |row| {
            let key: String = row.get(0)?;
            let value_str: String = row.get(1)?;
            Ok((key, value_str))
        })
        .map_err(NetprobeError::Database)?
        .filter_map(|r| r.ok())
        .filter_map(|(key, value_str)| {
            serde_json::from_str(&value_str)
                .ok()
                .map(|value| (key, value))
        })
        .collect();

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::schema::init_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_get_setting_not_found() {
        let conn = setup_test_db();
        let result = get_setting(&conn, "nonexistent").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_set_and_get_setting() {
        let conn = setup_test_db();

        set_setting(&conn, "probe.real-web.active", &serde_json::json!(false)).unwrap();

        let result = get_setting(&conn, "probe.real-web.active").unwrap();
        assert_eq!(result, Some(serde_json::json!(false)));
    }

    #[test]
    fn test_set_setting_overwrites() {
        let conn = setup_test_db();

        set_setting(&conn, "key", &serde_json::json!(true)).unwrap();
        set_setting(&conn, "key", &serde_json::json!(false)).unwrap();

        assert_eq!(
            get_setting(&conn, "key").unwrap(),
            Some(serde_json::json!(false))
        );
    }

    #[test]
    fn test_get_all_settings_skips_invalid_json() {
        let conn = setup_test_db();

        set_setting(&conn, "key1", &serde_json::json!("value1")).unwrap();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('broken', '{not json')",
            [],
        )
        .unwrap();

        let result = get_all_settings(&conn).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("key1"), Some(&serde_json::json!("value1")));
    }
}
