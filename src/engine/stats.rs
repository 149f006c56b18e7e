// ==========================================
// 车辆排产看板 - 标量汇总与筛选项枚举
// ==========================================
// 职责: 侧边栏统计（红色槽位、阶段分布、年份分布、月度订单/生产）
//       下拉筛选项枚举、经销商分类 × 阶段矩阵、阶段变更提醒检查
// 红线: 全部为对规范化记录集的简单归约；阶段分桶统一走 StageClassifier
// ==========================================

use crate::config::EngineConfig;
use crate::domain::dealer::DealerDirectory;
use crate::domain::filter::ALL_DEALERS;
use crate::domain::record::{ScheduleRecord, SecondaryDateField};
use crate::domain::reminder::{DueReminder, Reminder};
use crate::domain::types::{CanonicalStage, DealerClass, YearMonth};
use crate::engine::red_slot::RedSlotDetector;
use crate::engine::stage_classifier::StageClassifier;
use crate::engine::time_bucket::TimeBucketer;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::instrument;

// ==========================================
// 输出结构
// ==========================================

/// 月度计数点（按 YYYY-MM 升序输出）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub year_month: String,
    pub count: usize,
}

/// 侧边栏汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub red_slots: usize,
    pub stage_counts: BTreeMap<String, usize>,
    pub forecast_year_counts: BTreeMap<String, usize>,
    pub monthly_orders: Vec<MonthlyCount>,
    pub monthly_production: Vec<MonthlyCount>,
}

/// 下拉筛选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// 首项为 "all"
    pub dealers: Vec<String>,
    pub models: Vec<String>,
    pub forecast_years: Vec<String>,
    /// 仅在选定年份时非空
    pub forecast_year_months: Vec<String>,
    pub model_ranges: Vec<String>,
    pub stages: Vec<String>,
}

/// 单个经销商分类的阶段计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerClassRow {
    pub class: DealerClass,
    pub display_name: String,
    /// 阶段 → 计数；覆盖 `StagesByDealerClass::stages` 的全部阶段（缺省补 0）
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagesByDealerClass {
    pub stages: Vec<String>,
    pub rows: Vec<DealerClassRow>,
}

// ==========================================
// StatsCalculator
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct StatsCalculator {
    classifier: StageClassifier,
    bucketer: TimeBucketer,
    red_slot: RedSlotDetector,
    lookback_months: u32,
}

impl StatsCalculator {
    pub fn new(bucketer: TimeBucketer, red_slot: RedSlotDetector, lookback_months: u32) -> Self {
        Self {
            classifier: StageClassifier::new(),
            bucketer,
            red_slot,
            lookback_months,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            TimeBucketer::from_config(config),
            RedSlotDetector::from_config(config),
            config.monthly_order_lookback_months,
        )
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn summary(&self, records: &[ScheduleRecord], today: NaiveDate) -> DashboardSummary {
        DashboardSummary {
            total: records.len(),
            red_slots: self.red_slot.count(records, today),
            stage_counts: self.stage_counts(records),
            forecast_year_counts: self.forecast_year_counts(records),
            monthly_orders: self.monthly_order_counts(records, today),
            monthly_production: self.monthly_production_counts(records),
        }
    }

    /// 阶段分布: 跳过 NoStage 与 Finished，海运子阶段合并
    pub fn stage_counts(&self, records: &[ScheduleRecord]) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for stage in records
            .iter()
            .filter_map(|r| self.countable_stage(&r.production_stage))
        {
            *counts.entry(stage.label().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// 预测年份分布: 仅已占用且日期存在，应用历史截断
    pub fn forecast_year_counts(&self, records: &[ScheduleRecord]) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for date in records
            .iter()
            .filter(|r| r.is_occupied())
            .filter_map(|r| r.forecast_production_date)
            .filter(|d| !self.bucketer.is_excluded(*d))
        {
            *counts.entry(TimeBucketer::year_key(date)).or_insert(0) += 1;
        }
        counts
    }

    /// 月度订单接收量: 自 (当月 - 回看月数) 起
    pub fn monthly_order_counts(&self, records: &[ScheduleRecord], today: NaiveDate) -> Vec<MonthlyCount> {
        let earliest = YearMonth::of(today).minus_months(self.lookback_months);
        monthly_counts(
            records
                .iter()
                .filter_map(|r| r.secondary_date(SecondaryDateField::OrderReceivedDate))
                .filter(|d| YearMonth::of(*d) >= earliest),
        )
    }

    /// 月度预测生产量: 仅已占用
    pub fn monthly_production_counts(&self, records: &[ScheduleRecord]) -> Vec<MonthlyCount> {
        monthly_counts(
            records
                .iter()
                .filter(|r| r.is_occupied())
                .filter_map(|r| r.forecast_production_date),
        )
    }

    /// 经销商分类 × 阶段；分类未设置时为 External
    pub fn stages_by_dealer_class(
        &self,
        records: &[ScheduleRecord],
        directory: &DealerDirectory,
    ) -> StagesByDealerClass {
        let mut groups: BTreeMap<DealerClass, BTreeMap<String, usize>> = BTreeMap::new();
        let mut stages = BTreeSet::new();

        for record in records {
            let Some(stage) = self.countable_stage(&record.production_stage) else {
                continue;
            };
            let label = stage.label().to_string();
            stages.insert(label.clone());
            *groups
                .entry(directory.class_of(&record.dealer))
                .or_default()
                .entry(label)
                .or_insert(0) += 1;
        }

        let rows = DealerClass::ALL
            .into_iter()
            .map(|class| {
                let group = groups.get(&class);
                let counts = stages
                    .iter()
                    .map(|s| (s.clone(), group.and_then(|g| g.get(s)).copied().unwrap_or(0)))
                    .collect();
                DealerClassRow {
                    class,
                    display_name: class.display_name().to_string(),
                    counts,
                }
            })
            .collect();

        StagesByDealerClass {
            stages: stages.into_iter().collect(),
            rows,
        }
    }

    // ==========================================
    // 筛选项枚举
    // ==========================================

    pub fn filter_options(&self, records: &[ScheduleRecord], selected_year: Option<i32>) -> FilterOptions {
        let dealers = std::iter::once(ALL_DEALERS.to_string())
            .chain(distinct_sorted(records.iter().map(|r| r.dealer.as_str())))
            .collect();
        let models = distinct_sorted(records.iter().map(|r| r.model.as_str()));

        let dates = || records.iter().filter_map(|r| r.forecast_production_date);
        let forecast_years = self.bucketer.enumerate_years(dates());
        let forecast_year_months = match selected_year {
            Some(year) => self.bucketer.enumerate_year_months(dates(), Some(year)),
            None => Vec::new(),
        };

        let model_ranges = distinct_sorted(
            records
                .iter()
                .filter_map(|r| r.chassis.get(..3).filter(|_| r.chassis.chars().count() >= 3)),
        );

        let stages = records
            .iter()
            .filter_map(|r| self.countable_stage(&r.production_stage))
            .map(|s| s.label().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        FilterOptions {
            dealers,
            models,
            forecast_years,
            forecast_year_months,
            model_ranges,
            stages,
        }
    }

    /// 某个次级日期字段出现过的年月（不做历史截断）
    pub fn date_field_year_months(&self, records: &[ScheduleRecord], field: SecondaryDateField) -> Vec<String> {
        records
            .iter()
            .filter_map(|r| r.secondary_date(field))
            .map(TimeBucketer::year_month_key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 计入分布的阶段（排除 NoStage / Finished）
    fn countable_stage(&self, raw: &str) -> Option<CanonicalStage> {
        match self.classifier.classify(raw) {
            CanonicalStage::NoStage | CanonicalStage::Finished => None,
            other => Some(other),
        }
    }
}

fn distinct_sorted<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn monthly_counts<I>(dates: I) -> Vec<MonthlyCount>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for date in dates {
        *counts.entry(TimeBucketer::year_month_key(date)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(year_month, count)| MonthlyCount { year_month, count })
        .collect()
}

// ==========================================
// 阶段变更提醒
// ==========================================

/// 底盘当前阶段与提醒记录的阶段不同即触发；找不到底盘的提醒保持沉默
pub fn check_reminders(records: &[ScheduleRecord], reminders: &[Reminder]) -> Vec<DueReminder> {
    reminders
        .iter()
        .filter(|reminder| !reminder.chassis.is_empty())
        .filter_map(|reminder| {
            let record = records.iter().find(|r| r.chassis == reminder.chassis)?;
            if record.production_stage == reminder.production_stage {
                return None;
            }
            Some(DueReminder {
                reminder: reminder.clone(),
                new_stage: record.production_stage.clone(),
            })
        })
        .collect()
}
