// ==========================================
// 车辆排产看板 - 领域类型定义
// ==========================================
// 职责: 生产阶段分桶 / 经销商分类 / 占用状态 / 排序方向
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 规范化生产阶段 (Canonical Stage)
// ==========================================
// 由 StageClassifier 统一产出，筛选/阶段分布/经销商分类视图共用
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalStage {
    NoStage,       // 无阶段（空值）
    Finished,      // 已完工（终态）
    SeaFreighting, // 海运中（含 '-' 的子阶段）
    Stage(String), // 其他阶段，原样作为分桶
}

impl CanonicalStage {
    pub const NO_STAGE_LABEL: &'static str = "No Stage";
    pub const FINISHED_LABEL: &'static str = "Finished";
    pub const SEA_FREIGHTING_LABEL: &'static str = "Sea Freighting";

    /// 分桶显示名（筛选集合按该名称比较）
    pub fn label(&self) -> &str {
        match self {
            CanonicalStage::NoStage => Self::NO_STAGE_LABEL,
            CanonicalStage::Finished => Self::FINISHED_LABEL,
            CanonicalStage::SeaFreighting => Self::SEA_FREIGHTING_LABEL,
            CanonicalStage::Stage(s) => s,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, CanonicalStage::Finished)
    }
}

impl fmt::Display for CanonicalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==========================================
// 经销商分类 (Dealer Class)
// ==========================================
// 序列化格式: snake_case (与存储一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealerClass {
    JvDealer,        // 合资经销商
    SelfOwnedDealer, // 自营经销商
    #[default]
    ExternalDealer,  // 外部经销商（未设置时的默认值）
}

impl DealerClass {
    /// 固定展示顺序
    pub const ALL: [DealerClass; 3] = [
        DealerClass::JvDealer,
        DealerClass::SelfOwnedDealer,
        DealerClass::ExternalDealer,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            DealerClass::JvDealer => "JV Dealer",
            DealerClass::SelfOwnedDealer => "Self-owned Dealer",
            DealerClass::ExternalDealer => "External Dealer",
        }
    }

    /// 从存储值解析，未知值回落为 ExternalDealer
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "jv_dealer" => DealerClass::JvDealer,
            "self_owned_dealer" => DealerClass::SelfOwnedDealer,
            _ => DealerClass::ExternalDealer,
        }
    }
}

impl fmt::Display for DealerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealerClass::JvDealer => write!(f, "jv_dealer"),
            DealerClass::SelfOwnedDealer => write!(f, "self_owned_dealer"),
            DealerClass::ExternalDealer => write!(f, "external_dealer"),
        }
    }
}

// ==========================================
// 占用状态 (Occupancy)
// ==========================================
// 红线: chassis 是否为空是唯一的占用信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occupancy {
    Occupied,
    Empty,
}

impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Occupancy::Occupied => write!(f, "occupied"),
            Occupancy::Empty => write!(f, "empty"),
        }
    }
}

// ==========================================
// 排序方向 (Sort Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

// ==========================================
// 年月 (Year-Month)
// ==========================================
// 文本格式: YYYY-MM（月份补零）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// 解析 "YYYY-MM"，格式不符返回 None
    pub fn parse(s: &str) -> Option<Self> {
        let (y, m) = s.trim().split_once('-')?;
        if y.len() != 4 || m.is_empty() || m.len() > 2 {
            return None;
        }
        let year = y.parse::<i32>().ok()?;
        let month = m.parse::<u32>().ok()?;
        Self::new(year, month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        *self == Self::of(date)
    }

    /// 向前回退 n 个月
    /// 向前回退 n 个月；年份低于 i32 范围时饱和
    pub fn minus_months(&self, n: u32) -> Self {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 - i64::from(n);
        Self {
            year: i32::try_from(index.div_euclid(12)).unwrap_or(i32::MIN),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
