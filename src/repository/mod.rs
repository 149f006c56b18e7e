// ==========================================
// 车辆排产看板 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供 DataStore 能力接口,屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod data_store;
pub mod error;
pub mod sqlite_store;

// 重导出
pub use data_store::{DataStore, ImportBatch, MemoryDataStore};
pub use error::{RepositoryError, RepositoryResult};
pub use sqlite_store::SqliteDataStore;
