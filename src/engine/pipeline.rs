// ==========================================
// 车辆排产看板 - 表格视图流水线
// ==========================================
// 用途: 按固定顺序组合各引擎，产出表格视图
// 顺序: 隐藏已完工 → 底盘号搜索 → FilterSpec 全部谓词 → 排序
// 红线: 每一步都是纯变换，输入记录集不被修改
// ==========================================

use crate::config::EngineConfig;
use crate::domain::filter::ViewQuery;
use crate::domain::record::ScheduleRecord;
use crate::engine::filter_engine::FilterEngine;
use crate::engine::red_slot::RedSlotDetector;
use crate::engine::sort_search::SortSearchIndex;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

// ==========================================
// TableView - 表格视图结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub rows: Vec<ScheduleRecord>,
    /// 与 rows 一一对应的红色槽位标记
    pub red_slot_flags: Vec<bool>,
    pub red_slot_count: usize,
    /// 流水线输入的记录数
    pub source_count: usize,
}

impl TableView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// ViewPipeline - 视图流水线
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewPipeline {
    filter: FilterEngine,
    sorter: SortSearchIndex,
    red_slot: RedSlotDetector,
}

impl ViewPipeline {
    pub fn new(red_slot: RedSlotDetector) -> Self {
        Self {
            filter: FilterEngine::new(),
            sorter: SortSearchIndex::new(),
            red_slot,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(RedSlotDetector::from_config(config))
    }

    /// 仅筛选（不排序），供汇总视图复用
    pub fn filter_only(&self, records: &[ScheduleRecord], query: &ViewQuery) -> Vec<ScheduleRecord> {
        // 步骤1: 基础策略
        let candidates = if query.hide_finished {
            self.filter.hide_finished(records)
        } else {
            records.to_vec()
        };

        // 步骤2: 搜索
        let searched = self.filter.search(&candidates, &query.search);

        // 步骤3: 筛选
        self.filter.apply(&searched, &query.filter)
    }

    /// 完整表格视图
    #[instrument(skip(self, records, query), fields(input = records.len()))]
    pub fn run(&self, records: &[ScheduleRecord], query: &ViewQuery, today: NaiveDate) -> TableView {
        let filtered = self.filter_only(records, query);

        // 步骤4: 排序
        let rows = self.sorter.sort(&filtered, &query.sort);

        let red_slot_flags = self.red_slot.flags(&rows, today);
        let red_slot_count = red_slot_flags.iter().filter(|f| **f).count();

        debug!(output = rows.len(), red_slot_count, "table view computed");

        TableView {
            rows,
            red_slot_flags,
            red_slot_count,
            source_count: records.len(),
        }
    }
}
