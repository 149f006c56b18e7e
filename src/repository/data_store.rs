// ==========================================
// 车辆排产看板 - 数据存储能力接口
// ==========================================
// 职责: 注入给看板宿主的存储能力（记录 / 经销商属性 / 提醒）
// 实现者: SqliteDataStore（落库），MemoryDataStore（测试/演示）
// 红线: 存储层不含业务逻辑；引擎只消费 load_* 返回的集合
// ==========================================

use crate::domain::dealer::{DealerDirectory, DealerNote};
use crate::domain::record::RawRecord;
use crate::domain::reminder::{NewReminder, Reminder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// 导入批次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: i64,
    pub file_name: String,
    pub row_count: usize,
    pub imported_at: DateTime<Utc>,
}

// ==========================================
// DataStore Trait
// ==========================================
pub trait DataStore: Send + Sync {
    // ===== 排产记录 =====

    /// 当前记录集（保持源行顺序）
    fn load_records(&self) -> RepositoryResult<Vec<RawRecord>>;

    /// 以新文件整体替换记录集
    fn replace_records(&self, file_name: &str, records: &[RawRecord]) -> RepositoryResult<ImportBatch>;

    // ===== 经销商属性 =====

    fn load_dealer_colors(&self) -> RepositoryResult<HashMap<String, String>>;

    fn save_dealer_color(&self, dealer: &str, color: &str) -> RepositoryResult<()>;

    fn load_dealer_notes(&self) -> RepositoryResult<HashMap<String, DealerNote>>;

    fn save_dealer_note(&self, dealer: &str, note: &DealerNote) -> RepositoryResult<()>;

    fn load_dealer_directory(&self) -> RepositoryResult<DealerDirectory> {
        Ok(DealerDirectory::new(
            self.load_dealer_colors()?,
            self.load_dealer_notes()?,
        ))
    }

    // ===== 提醒 =====

    fn list_reminders(&self) -> RepositoryResult<Vec<Reminder>>;

    fn add_reminder(&self, reminder: &NewReminder) -> RepositoryResult<Reminder>;

    /// 返回是否确有删除
    fn delete_reminder(&self, reminder_id: i64) -> RepositoryResult<bool>;
}

// ==========================================
// MemoryDataStore - 内存实现
// ==========================================
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<RawRecord>,
    batches: i64,
    colors: HashMap<String, String>,
    notes: HashMap<String, DealerNote>,
    reminders: Vec<Reminder>,
    next_reminder_id: i64,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<RawRecord>) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.inner.lock() {
            state.records = records;
        }
        store
    }

    fn state(&self) -> RepositoryResult<MutexGuard<'_, MemoryState>> {
        self.inner
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl DataStore for MemoryDataStore {
    fn load_records(&self) -> RepositoryResult<Vec<RawRecord>> {
        Ok(self.state()?.records.clone())
    }

    fn replace_records(&self, file_name: &str, records: &[RawRecord]) -> RepositoryResult<ImportBatch> {
        let mut state = self.state()?;
        state.records = records.to_vec();
        state.batches += 1;
        Ok(ImportBatch {
            batch_id: state.batches,
            file_name: file_name.to_string(),
            row_count: records.len(),
            imported_at: Utc::now(),
        })
    }

    fn load_dealer_colors(&self) -> RepositoryResult<HashMap<String, String>> {
        Ok(self.state()?.colors.clone())
    }

    fn save_dealer_color(&self, dealer: &str, color: &str) -> RepositoryResult<()> {
        self.state()?
            .colors
            .insert(dealer.to_string(), color.to_string());
        Ok(())
    }

    fn load_dealer_notes(&self) -> RepositoryResult<HashMap<String, DealerNote>> {
        Ok(self.state()?.notes.clone())
    }

    fn save_dealer_note(&self, dealer: &str, note: &DealerNote) -> RepositoryResult<()> {
        self.state()?.notes.insert(dealer.to_string(), note.clone());
        Ok(())
    }

    fn list_reminders(&self) -> RepositoryResult<Vec<Reminder>> {
        Ok(self.state()?.reminders.clone())
    }

    fn add_reminder(&self, reminder: &NewReminder) -> RepositoryResult<Reminder> {
        let mut state = self.state()?;
        state.next_reminder_id += 1;
        let stored = Reminder {
            reminder_id: state.next_reminder_id,
            chassis: reminder.chassis.clone(),
            production_stage: reminder.production_stage.clone(),
            email: reminder.email.clone(),
            note: reminder.note.clone(),
            remind_on: reminder.remind_on,
        };
        state.reminders.push(stored.clone());
        Ok(stored)
    }

    fn delete_reminder(&self, reminder_id: i64) -> RepositoryResult<bool> {
        let mut state = self.state()?;
        let before = state.reminders.len();
        state.reminders.retain(|r| r.reminder_id != reminder_id);
        Ok(state.reminders.len() != before)
    }
}
