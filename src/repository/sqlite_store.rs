// ==========================================
// 车辆排产看板 - SQLite 数据存储
// ==========================================
// 职责: DataStore 的 SQLite 实现（schedule_record / dealer_* / reminder 表）
// 红线: Repository 不含业务逻辑；所有查询参数化
// 说明: 原始记录以 JSON 载荷保存，字段集合随源文件变化
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::dealer::DealerNote;
use crate::domain::record::RawRecord;
use crate::domain::reminder::{NewReminder, Reminder};
use crate::repository::data_store::{DataStore, ImportBatch};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SqliteDataStore
// ==========================================
pub struct SqliteDataStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDataStore {
    /// 打开（必要时创建）数据库文件
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let mut conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        crate::perf::install_sqlite_tracing(&mut conn);
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（会应用统一 PRAGMA 并建表，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 内存库（测试用）
    pub fn in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 共享连接（供 ConfigManager 复用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl DataStore for SqliteDataStore {
    fn load_records(&self) -> RepositoryResult<Vec<RawRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT row_no, payload_json FROM schedule_record ORDER BY row_no")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

        let mut records = Vec::new();
        for row in rows {
            let (row_no, payload) = row?;
            let record: RawRecord =
                serde_json::from_str(&payload).map_err(|e| RepositoryError::CorruptPayload {
                    row: row_no,
                    message: e.to_string(),
                })?;
            records.push(record);
        }
        Ok(records)
    }

    fn replace_records(&self, file_name: &str, records: &[RawRecord]) -> RepositoryResult<ImportBatch> {
        let imported_at = Utc::now();
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "INSERT INTO import_batch (file_name, row_count, imported_at) VALUES (?1, ?2, ?3)",
            params![file_name, records.len() as i64, imported_at.to_rfc3339()],
        )?;
        let batch_id = tx.last_insert_rowid();

        tx.execute("DELETE FROM schedule_record", [])?;
        // 仅保留当前批次
        tx.execute("DELETE FROM import_batch WHERE batch_id <> ?1", params![batch_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO schedule_record (row_no, batch_id, payload_json) VALUES (?1, ?2, ?3)",
            )?;
            for (row_no, record) in records.iter().enumerate() {
                let payload =
                    serde_json::to_string(record).map_err(|e| RepositoryError::FieldValueError {
                        field: "payload_json".to_string(),
                        message: e.to_string(),
                    })?;
                stmt.execute(params![row_no as i64, batch_id, payload])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(ImportBatch {
            batch_id,
            file_name: file_name.to_string(),
            row_count: records.len(),
            imported_at,
        })
    }

    fn load_dealer_colors(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT dealer, color FROM dealer_color")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
    }

    fn save_dealer_color(&self, dealer: &str, color: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO dealer_color (dealer, color) VALUES (?1, ?2)
             ON CONFLICT(dealer) DO UPDATE SET color = ?2",
            params![dealer, color],
        )?;
        Ok(())
    }

    fn load_dealer_notes(&self) -> RepositoryResult<HashMap<String, DealerNote>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT dealer, text, class FROM dealer_note")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                DealerNote {
                    text: row.get(1)?,
                    class: row.get(2)?,
                },
            ))
        })?;
        Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
    }

    fn save_dealer_note(&self, dealer: &str, note: &DealerNote) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO dealer_note (dealer, text, class) VALUES (?1, ?2, ?3)
             ON CONFLICT(dealer) DO UPDATE SET text = ?2, class = ?3",
            params![dealer, note.text, note.class],
        )?;
        Ok(())
    }

    fn list_reminders(&self) -> RepositoryResult<Vec<Reminder>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT reminder_id, chassis, production_stage, email, note, remind_on
            FROM reminder
            ORDER BY reminder_id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Reminder {
                reminder_id: row.get(0)?,
                chassis: row.get(1)?,
                production_stage: row.get(2)?,
                email: row.get(3)?,
                note: row.get(4)?,
                remind_on: row
                    .get::<_, Option<String>>(5)?
                    .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn add_reminder(&self, reminder: &NewReminder) -> RepositoryResult<Reminder> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO reminder (chassis, production_stage, email, note, remind_on)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                reminder.chassis,
                reminder.production_stage,
                reminder.email,
                reminder.note,
                reminder.remind_on.map(|d| d.format("%Y-%m-%d").to_string()),
            ],
        )?;
        Ok(Reminder {
            reminder_id: conn.last_insert_rowid(),
            chassis: reminder.chassis.clone(),
            production_stage: reminder.production_stage.clone(),
            email: reminder.email.clone(),
            note: reminder.note.clone(),
            remind_on: reminder.remind_on,
        })
    }

    fn delete_reminder(&self, reminder_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM reminder WHERE reminder_id = ?1", params![reminder_id])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::DealerClass;

    fn row(chassis: &str, dealer: &str) -> RawRecord {
        let mut record = RawRecord::new();
        record.insert("Chassis".into(), chassis.into());
        record.insert("Dealer".into(), dealer.into());
        record
    }

    #[test]
    fn test_replace_and_load_records_keep_order() {
        let store = SqliteDataStore::in_memory().unwrap();
        let first = store
            .replace_records("old.csv", &[row("OLD1", "A")])
            .unwrap();
        let second = store
            .replace_records("new.csv", &[row("B2", "B"), row("", "A"), row("A1", "C")])
            .unwrap();
        assert!(second.batch_id > first.batch_id);
        assert_eq!(second.row_count, 3);

        let loaded = store.load_records().unwrap();
        let chassis: Vec<_> = loaded.iter().map(|r| r["Chassis"].as_str()).collect();
        assert_eq!(chassis, vec!["B2", "", "A1"]);
    }

    #[test]
    fn test_replace_keeps_only_current_batch() {
        let store = SqliteDataStore::in_memory().unwrap();
        for name in ["a.csv", "b.csv", "c.csv"] {
            store.replace_records(name, &[row("X1", "A")]).unwrap();
        }

        let conn = store.connection();
        let conn = conn.lock().unwrap();
        let names: Vec<String> = conn
            .prepare("SELECT file_name FROM import_batch")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(names, vec!["c.csv".to_string()]);
    }

    #[test]
    fn test_dealer_attributes_upsert() {
        let store = SqliteDataStore::in_memory().unwrap();
        store.save_dealer_color("AutoMax", "#e3f2fd").unwrap();
        store.save_dealer_color("AutoMax", "#ffffff").unwrap();
        store
            .save_dealer_note("AutoMax", &DealerNote::new("Premium", DealerClass::SelfOwnedDealer))
            .unwrap();

        let directory = store.load_dealer_directory().unwrap();
        assert_eq!(directory.color_of("AutoMax"), Some("#ffffff"));
        assert_eq!(directory.class_of("AutoMax"), DealerClass::SelfOwnedDealer);
        assert_eq!(directory.class_of("Nobody"), DealerClass::ExternalDealer);
    }

    #[test]
    fn test_reminder_crud() {
        let store = SqliteDataStore::in_memory().unwrap();
        let added = store
            .add_reminder(&NewReminder {
                chassis: "ABC123".into(),
                production_stage: "Queued".into(),
                email: "ops@example.com".into(),
                note: "call dealer".into(),
                remind_on: NaiveDate::from_ymd_opt(2025, 6, 1),
            })
            .unwrap();

        let listed = store.list_reminders().unwrap();
        assert_eq!(listed, vec![added.clone()]);

        assert!(store.delete_reminder(added.reminder_id).unwrap());
        assert!(store.list_reminders().unwrap().is_empty());
    }
}
