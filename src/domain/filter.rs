// ==========================================
// 车辆排产看板 - 筛选条件 / 排序配置
// ==========================================
// 红线: FilterSpec 为不可变值，界面每次变更整体替换，不做局部修改
// ==========================================

use crate::domain::record::SecondaryDateField;
use crate::domain::types::{SortDirection, YearMonth};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::stage_classifier::StageClassifier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 经销商 "全部" 哨兵值
pub const ALL_DEALERS: &str = "all";

// ==========================================
// StageSelection - 阶段选择
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageSelection {
    /// "全选" 模式，跳过阶段判定
    #[default]
    All,
    /// 规范化分桶名集合；空集合等价于 All
    Only(BTreeSet<String>),
}

impl StageSelection {
    /// 由界面选中的阶段名构造，原始名统一映射为分桶名
    pub fn only<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classifier = StageClassifier::new();
        StageSelection::Only(
            labels
                .into_iter()
                .map(|l| classifier.bucket_for_label(l.as_ref()).label().to_string())
                .collect(),
        )
    }

    pub fn is_bypass(&self) -> bool {
        match self {
            StageSelection::All => true,
            StageSelection::Only(set) => set.is_empty(),
        }
    }
}

// ==========================================
// FilterSpec - 筛选条件
// ==========================================
// 所有谓词 AND 组合；缺省谓词恒通过
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    dealer: Option<String>,
    model: Option<String>,
    forecast_year: Option<i32>,
    forecast_year_month: Option<YearMonth>,
    model_range: Option<String>,
    stages: StageSelection,
    date_fields: BTreeMap<SecondaryDateField, YearMonth>,
    sea_freighting_only: bool,
}

impl FilterSpec {
    pub fn builder() -> FilterSpecBuilder {
        FilterSpecBuilder::default()
    }

    /// 以当前值为起点构造新值
    pub fn to_builder(&self) -> FilterSpecBuilder {
        FilterSpecBuilder { spec: self.clone() }
    }

    pub fn dealer(&self) -> Option<&str> {
        self.dealer.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn forecast_year(&self) -> Option<i32> {
        self.forecast_year
    }

    pub fn forecast_year_month(&self) -> Option<YearMonth> {
        self.forecast_year_month
    }

    pub fn model_range(&self) -> Option<&str> {
        self.model_range.as_deref()
    }

    pub fn stages(&self) -> &StageSelection {
        &self.stages
    }

    pub fn date_fields(&self) -> &BTreeMap<SecondaryDateField, YearMonth> {
        &self.date_fields
    }

    pub fn sea_freighting_only(&self) -> bool {
        self.sea_freighting_only
    }

    /// 是否不含任何谓词
    pub fn is_empty(&self) -> bool {
        *self == FilterSpec::default()
    }
}

// ==========================================
// FilterSpecBuilder - 由界面输入构造 FilterSpec
// ==========================================
// 文本输入: 空串表示清除该谓词
#[derive(Debug, Clone, Default)]
pub struct FilterSpecBuilder {
    spec: FilterSpec,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl FilterSpecBuilder {
    /// 经销商（精确匹配）；空串或 "all" 清除
    pub fn dealer(mut self, dealer: &str) -> Self {
        self.spec.dealer = non_empty(dealer).filter(|d| d != ALL_DEALERS);
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.spec.model = non_empty(model);
        self
    }

    /// 预测生产年份；年份变化时清除年月筛选
    pub fn forecast_year(mut self, year: &str) -> EngineResult<Self> {
        let parsed = match non_empty(year) {
            None => None,
            Some(y) => {
                if y.len() != 4 || !y.chars().all(|c| c.is_ascii_digit()) {
                    return Err(EngineError::InvalidYear(y));
                }
                Some(y.parse::<i32>().map_err(|_| EngineError::InvalidYear(y.clone()))?)
            }
        };

        if parsed != self.spec.forecast_year {
            self.spec.forecast_year_month = None;
        }
        self.spec.forecast_year = parsed;
        Ok(self)
    }

    pub fn forecast_year_month(mut self, year_month: &str) -> EngineResult<Self> {
        self.spec.forecast_year_month = parse_year_month(year_month)?;
        Ok(self)
    }

    /// 型号区间（底盘号前缀）
    pub fn model_range(mut self, prefix: &str) -> Self {
        self.spec.model_range = non_empty(prefix);
        self
    }

    pub fn stages(mut self, selection: StageSelection) -> Self {
        self.spec.stages = selection;
        self
    }

    /// 次级日期字段 → 年月；年月为空串时移除该字段筛选
    pub fn date_field(mut self, field_name: &str, year_month: &str) -> EngineResult<Self> {
        let field = SecondaryDateField::from_name(field_name)
            .ok_or_else(|| EngineError::UnsupportedDateField(field_name.to_string()))?;

        match parse_year_month(year_month)? {
            Some(ym) => {
                self.spec.date_fields.insert(field, ym);
            }
            None => {
                self.spec.date_fields.remove(&field);
            }
        }
        Ok(self)
    }

    pub fn sea_freighting_only(mut self, enabled: bool) -> Self {
        self.spec.sea_freighting_only = enabled;
        self
    }

    pub fn build(self) -> FilterSpec {
        self.spec
    }
}

fn parse_year_month(value: &str) -> EngineResult<Option<YearMonth>> {
    match non_empty(value) {
        None => Ok(None),
        Some(v) => YearMonth::parse(&v)
            .map(Some)
            .ok_or(EngineError::InvalidYearMonth(v)),
    }
}

// ==========================================
// SortKey / SortConfig - 排序配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    /// 源集合顺序
    Row,
    ForecastProductionDate,
    Chassis,
    Customer,
    Dealer,
    Model,
    ModelYear,
    ProductionStage,
    SecondaryDate(SecondaryDateField),
    /// 未识别的附加列，按源文本比较
    Field(String),
}

impl SortKey {
    /// 由表格列名解析；"id" 或空串为源顺序
    pub fn from_column(column: &str) -> Self {
        use crate::domain::record::field_names as f;

        match column.trim() {
            "" | "id" => SortKey::Row,
            f::FORECAST_PRODUCTION_DATE => SortKey::ForecastProductionDate,
            f::CHASSIS => SortKey::Chassis,
            f::CUSTOMER => SortKey::Customer,
            f::DEALER => SortKey::Dealer,
            f::MODEL => SortKey::Model,
            f::MODEL_YEAR => SortKey::ModelYear,
            f::REGENT_PRODUCTION => SortKey::ProductionStage,
            other => match SecondaryDateField::ALL
                .into_iter()
                .find(|field| field.field_name() == other)
            {
                Some(field) => SortKey::SecondaryDate(field),
                None => SortKey::Field(other.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::Row,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortConfig {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// 点击列头: 同列升序 → 降序，其余情况 → 升序
    pub fn toggle(&self, key: SortKey) -> SortConfig {
        let direction = if self.key == key && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        SortConfig { key, direction }
    }
}

// ==========================================
// ViewQuery - 表格视图的完整查询状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    pub filter: FilterSpec,
    /// 基础策略: 隐藏已完工（与阶段选择独立，取交集）
    pub hide_finished: bool,
    /// 底盘号自由文本搜索（已去抖）
    pub search: String,
    pub sort: SortConfig,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            filter: FilterSpec::default(),
            hide_finished: true,
            search: String::new(),
            sort: SortConfig::default(),
        }
    }
}
