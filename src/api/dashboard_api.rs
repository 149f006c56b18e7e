// ==========================================
// 车辆排产看板 - 看板 API
// ==========================================
// 职责: 装配 DataStore + 引擎，向宿主（CLI / 界面）提供看板查询与维护操作
// 架构: API 层 → 引擎层（纯变换） + Repository 层（DataStore）
// 红线: 引擎只接收快照，不直接访问存储；查询状态整体替换，不做增量修改
// ==========================================

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::EngineConfig;
use crate::domain::dealer::{DealerDirectory, DealerNote};
use crate::domain::filter::{FilterSpec, SortKey, ViewQuery};
use crate::domain::record::{ScheduleRecord, SecondaryDateField};
use crate::domain::reminder::{DueReminder, NewReminder, Reminder};
use crate::domain::types::DealerClass;
use crate::engine::error::EngineError;
use crate::engine::pipeline::{TableView, ViewPipeline};
use crate::engine::pivot::{PivotAggregator, PivotSelection, PivotView};
use crate::engine::stats::{
    check_reminders, DashboardSummary, FilterOptions, StagesByDealerClass, StatsCalculator,
};
use crate::engine::time_bucket::{PeriodGranularity, TimeBucketer};
use crate::export::CsvExporter;
use crate::importer::{ImportSummary, NormalizeReport, RecordNormalizer, ScheduleImporter};
use crate::perf::PerfGuard;
use crate::repository::data_store::DataStore;

// ==========================================
// DashboardSnapshot - 一次加载的只读数据快照
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub records: Vec<ScheduleRecord>,
    pub report: NormalizeReport,
    pub directory: DealerDirectory,
}

// ==========================================
// DashboardApi
// ==========================================
pub struct DashboardApi {
    store: Arc<dyn DataStore>,
    config: EngineConfig,
    normalizer: RecordNormalizer,
    pipeline: ViewPipeline,
    stats: StatsCalculator,
    pivot: PivotAggregator,
    bucketer: TimeBucketer,
    exporter: CsvExporter,
}

impl DashboardApi {
    pub fn new(store: Arc<dyn DataStore>, config: EngineConfig) -> Self {
        Self {
            normalizer: RecordNormalizer::from_config(&config),
            pipeline: ViewPipeline::from_config(&config),
            stats: StatsCalculator::from_config(&config),
            pivot: PivotAggregator::new(),
            bucketer: TimeBucketer::from_config(&config),
            exporter: CsvExporter::default(),
            store,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 新建会话（查询状态取配置默认值）
    pub fn new_session(&self) -> DashboardSession {
        DashboardSession::new(&self.config)
    }

    // ==========================================
    // 数据加载 / 导入
    // ==========================================

    /// 加载并规范化当前记录集及经销商属性
    #[instrument(skip(self))]
    pub fn load_snapshot(&self) -> ApiResult<DashboardSnapshot> {
        let mut perf = PerfGuard::new("load_snapshot");
        let raw = self.store.load_records()?;
        perf.set_rows(raw.len());

        let (records, report) = self.normalizer.normalize(&raw);
        let directory = self.store.load_dealer_directory()?;
        Ok(DashboardSnapshot {
            records,
            report,
            directory,
        })
    }

    /// 导入排产文件（整体替换当前记录集）
    pub fn import_file<P: AsRef<Path>>(&self, path: P) -> ApiResult<ImportSummary> {
        let importer = ScheduleImporter::new(self.store.clone(), self.normalizer);
        Ok(importer.import_file(path)?)
    }

    // ==========================================
    // 视图查询（纯计算）
    // ==========================================

    pub fn table_view(&self, snapshot: &DashboardSnapshot, query: &ViewQuery, today: NaiveDate) -> TableView {
        self.pipeline.run(&snapshot.records, query, today)
    }

    /// 侧边栏汇总（基于当前筛选结果）
    pub fn summary(&self, snapshot: &DashboardSnapshot, query: &ViewQuery, today: NaiveDate) -> DashboardSummary {
        let filtered = self.pipeline.filter_only(&snapshot.records, query);
        self.stats.summary(&filtered, today)
    }

    /// 透视视图；粒度: year / month / week / day，按历史截断隐藏年份
    pub fn pivot(
        &self,
        snapshot: &DashboardSnapshot,
        query: &ViewQuery,
        granularity: &str,
        selection: PivotSelection,
    ) -> ApiResult<PivotView> {
        let granularity = PeriodGranularity::from_str(granularity)?;
        let filtered = self.pipeline.filter_only(&snapshot.records, query);
        let matrix = self.pivot.build(&filtered, granularity);
        Ok(matrix.project(&selection.hiding_years_of(&self.bucketer)))
    }

    /// 下拉筛选项；selected_year 为 YYYY 字面量
    pub fn filter_options(&self, snapshot: &DashboardSnapshot, selected_year: Option<&str>) -> ApiResult<FilterOptions> {
        let year = match selected_year.map(str::trim).filter(|y| !y.is_empty()) {
            None => None,
            Some(y) => Some(parse_year(y)?),
        };
        Ok(self.stats.filter_options(&snapshot.records, year))
    }

    /// 次级日期字段出现过的年月
    pub fn date_field_year_months(&self, snapshot: &DashboardSnapshot, field_name: &str) -> ApiResult<Vec<String>> {
        let field = SecondaryDateField::from_name(field_name)
            .ok_or_else(|| EngineError::UnsupportedDateField(field_name.to_string()))?;
        Ok(self.stats.date_field_year_months(&snapshot.records, field))
    }

    pub fn stages_by_dealer_class(&self, snapshot: &DashboardSnapshot) -> StagesByDealerClass {
        self.stats
            .stages_by_dealer_class(&snapshot.records, &snapshot.directory)
    }

    // ==========================================
    // 经销商属性维护
    // ==========================================

    pub fn dealer_directory(&self) -> ApiResult<DealerDirectory> {
        Ok(self.store.load_dealer_directory()?)
    }

    pub fn set_dealer_color(&self, dealer: &str, color: &str) -> ApiResult<()> {
        let dealer = require_non_empty(dealer, "经销商")?;
        let color = require_non_empty(color, "颜色")?;
        self.store.save_dealer_color(dealer, color)?;
        info!(dealer, color, "dealer color saved");
        Ok(())
    }

    pub fn set_dealer_note(&self, dealer: &str, text: &str, class: DealerClass) -> ApiResult<()> {
        let dealer = require_non_empty(dealer, "经销商")?;
        self.store
            .save_dealer_note(dealer, &DealerNote::new(text.trim(), class))?;
        info!(dealer, class = %class, "dealer note saved");
        Ok(())
    }

    // ==========================================
    // 阶段变更提醒
    // ==========================================

    pub fn list_reminders(&self) -> ApiResult<Vec<Reminder>> {
        Ok(self.store.list_reminders()?)
    }

    pub fn add_reminder(&self, reminder: NewReminder) -> ApiResult<Reminder> {
        require_non_empty(&reminder.chassis, "底盘号")?;
        require_non_empty(&reminder.email, "邮箱")?;
        Ok(self.store.add_reminder(&reminder)?)
    }

    pub fn delete_reminder(&self, reminder_id: i64) -> ApiResult<()> {
        if self.store.delete_reminder(reminder_id)? {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("提醒(id={})不存在", reminder_id)))
        }
    }

    /// 阶段已变化的提醒
    pub fn due_reminders(&self, snapshot: &DashboardSnapshot) -> ApiResult<Vec<DueReminder>> {
        let reminders = self.store.list_reminders()?;
        Ok(check_reminders(&snapshot.records, &reminders))
    }

    // ==========================================
    // 导出
    // ==========================================

    /// 导出当前视图行（保持视图顺序）
    pub fn export_csv(&self, view: &TableView) -> ApiResult<String> {
        Ok(self.exporter.render(&view.rows)?)
    }

    pub fn export_csv_to_path<P: AsRef<Path>>(&self, view: &TableView, path: P) -> ApiResult<usize> {
        Ok(self.exporter.write_to_path(&view.rows, path)?)
    }
}

fn parse_year(value: &str) -> ApiResult<i32> {
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        value
            .parse()
            .map_err(|_| EngineError::InvalidYear(value.to_string()).into())
    } else {
        Err(EngineError::InvalidYear(value.to_string()).into())
    }
}

fn require_non_empty<'a>(value: &'a str, what: &str) -> ApiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::InvalidInput(format!("{}不能为空", what)))
    } else {
        Ok(trimmed)
    }
}

// ==========================================
// DashboardSession - 交互查询状态
// ==========================================
// 每次交互产出新的 ViewQuery 并整体替换
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSession {
    query: ViewQuery,
}

impl DashboardSession {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            query: ViewQuery {
                hide_finished: config.hide_finished_default,
                ..ViewQuery::default()
            },
        }
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.query = ViewQuery {
            filter,
            ..self.query.clone()
        };
    }

    pub fn set_search(&mut self, term: &str) {
        self.query = ViewQuery {
            search: term.to_string(),
            ..self.query.clone()
        };
    }

    pub fn set_hide_finished(&mut self, hide: bool) {
        self.query = ViewQuery {
            hide_finished: hide,
            ..self.query.clone()
        };
    }

    /// 点击列头
    pub fn toggle_sort(&mut self, column: &str) {
        self.query = ViewQuery {
            sort: self.query.sort.toggle(SortKey::from_column(column)),
            ..self.query.clone()
        };
    }

    /// 清空筛选与搜索（保留排序与隐藏已完工策略）
    pub fn reset_filters(&mut self) {
        self.query = ViewQuery {
            filter: FilterSpec::default(),
            search: String::new(),
            ..self.query.clone()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::StageSelection;
    use crate::domain::record::RawRecord;
    use crate::domain::types::SortDirection;
    use crate::repository::data_store::MemoryDataStore;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn api() -> DashboardApi {
        let store = MemoryDataStore::with_records(vec![
            raw(&[("Chassis", "X1"), ("Dealer", "A"), ("Forecast Production Date", "15/03/2025"), ("Regent Production", "Queued")]),
            raw(&[("Chassis", ""), ("Dealer", "A"), ("Forecast Production Date", "15/03/2025")]),
            raw(&[("Chassis", "Y2"), ("Dealer", "B"), ("Forecast Production Date", "02/01/2024"), ("Regent Production", "Finished")]),
            raw(&[("Chassis", "Z3"), ("Dealer", "B"), ("Forecast Production Date", "bad"), ("Regent Production", "Shipped-Perth")]),
        ]);
        DashboardApi::new(Arc::new(store), EngineConfig::default())
    }

    #[test]
    fn test_table_view_hides_finished_by_default() {
        let api = api();
        let snapshot = api.load_snapshot().unwrap();
        assert_eq!(snapshot.report.unparsable_dates(), 1);

        let session = api.new_session();
        let view = api.table_view(&snapshot, session.query(), today());
        assert_eq!(view.len(), 3);
        assert_eq!(view.source_count, 4);
        assert_eq!(view.red_slot_count, 1);
    }

    #[test]
    fn test_pivot_hides_cutoff_year_and_rejects_unknown_granularity() {
        let api = api();
        let snapshot = api.load_snapshot().unwrap();
        let mut session = api.new_session();
        session.set_hide_finished(false);

        let view = api
            .pivot(&snapshot, session.query(), "month", PivotSelection::all())
            .unwrap();
        assert_eq!(view.periods, vec!["2025-03".to_string()]);

        let err = api
            .pivot(&snapshot, session.query(), "quarter", PivotSelection::all())
            .unwrap_err();
        assert!(matches!(err, ApiError::Engine(EngineError::UnknownGranularity(_))));
    }

    #[test]
    fn test_filter_options_validates_year() {
        let api = api();
        let snapshot = api.load_snapshot().unwrap();
        let options = api.filter_options(&snapshot, Some("2025")).unwrap();
        assert_eq!(options.forecast_year_months, vec!["2025-03"]);
        assert!(api.filter_options(&snapshot, Some("25")).is_err());
        assert!(api
            .date_field_year_months(&snapshot, "Price Date")
            .is_err());
    }

    #[test]
    fn test_session_replaces_query_state() {
        let api = api();
        let snapshot = api.load_snapshot().unwrap();
        let mut session = api.new_session();

        session.set_filter(
            FilterSpec::builder()
                .stages(StageSelection::only(["Sea Freighting"]))
                .build(),
        );
        let view = api.table_view(&snapshot, session.query(), today());
        assert_eq!(view.len(), 1);
        assert_eq!(view.rows[0].chassis, "Z3");

        session.toggle_sort("Chassis");
        session.toggle_sort("Chassis");
        assert_eq!(session.query().sort.direction, SortDirection::Descending);

        session.reset_filters();
        assert!(session.query().filter.is_empty());
        assert_eq!(session.query().sort.key, SortKey::Chassis);
    }

    #[test]
    fn test_reminders_and_dealer_admin() {
        let api = api();
        let snapshot = api.load_snapshot().unwrap();

        assert!(api
            .add_reminder(NewReminder {
                chassis: " ".into(),
                production_stage: String::new(),
                email: "ops@example.com".into(),
                note: String::new(),
                remind_on: None,
            })
            .is_err());

        let added = api
            .add_reminder(NewReminder {
                chassis: "X1".into(),
                production_stage: "Pending".into(),
                email: "ops@example.com".into(),
                note: String::new(),
                remind_on: None,
            })
            .unwrap();
        let due = api.due_reminders(&snapshot).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].new_stage, "Queued");

        api.delete_reminder(added.reminder_id).unwrap();
        assert!(matches!(api.delete_reminder(added.reminder_id), Err(ApiError::NotFound(_))));

        api.set_dealer_note("A", "flagship", DealerClass::JvDealer).unwrap();
        api.set_dealer_color("A", "#ff0000").unwrap();
        let directory = api.dealer_directory().unwrap();
        assert_eq!(directory.class_of("A"), DealerClass::JvDealer);
        assert!(api.set_dealer_color("", "#fff").is_err());
    }

    #[test]
    fn test_export_current_view() {
        let api = api();
        let snapshot = api.load_snapshot().unwrap();
        let mut session = api.new_session();
        session.set_search("x1");
        let view = api.table_view(&snapshot, session.query(), today());
        let csv = api.export_csv(&view).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.ends_with("\"\",\"\""));
    }
}
