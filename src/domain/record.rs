// ==========================================
// 车辆排产看板 - 排产记录领域模型
// ==========================================
// 职责: 定义排产记录（一个生产槽位/订单）及源字段名
// 红线: chassis 非空 ⇔ 已占用；日期缺失不丢弃记录
// ==========================================

use crate::domain::types::Occupancy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 原始记录（字段名 → 文本值），来自持久化协作方或导入文件
pub type RawRecord = BTreeMap<String, String>;

// ==========================================
// 源字段名（人类可读列名）
// ==========================================
pub mod field_names {
    pub const CHASSIS: &str = "Chassis";
    pub const DEALER: &str = "Dealer";
    pub const MODEL: &str = "Model";
    pub const MODEL_YEAR: &str = "Model Year";
    pub const CUSTOMER: &str = "Customer";
    pub const FORECAST_PRODUCTION_DATE: &str = "Forecast Production Date";
    pub const REGENT_PRODUCTION: &str = "Regent Production";
    pub const REQUEST_DELIVERY_DATE: &str = "Request Delivery Date";
    pub const SIGNED_PLANS_RECEIVED: &str = "Signed Plans Received";
    pub const ORDER_RECEIVED_DATE: &str = "Order Received Date";
    pub const ORDER_SENT_TO_LONGTREE: &str = "Order Sent to Longtree";
    pub const PLANS_SENT_TO_DEALER: &str = "Plans Sent to Dealer";
    pub const PURCHASE_ORDER_SENT: &str = "Purchase Order Sent";
}

/// 经销商缺失时的占位名
pub const UNKNOWN_DEALER: &str = "Unknown";

// ==========================================
// 次级日期字段
// ==========================================
// 仅用于通用 "日期字段 → 年月" 筛选
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecondaryDateField {
    RequestDeliveryDate,
    SignedPlansReceived,
    OrderReceivedDate,
    OrderSentToLongtree,
    PlansSentToDealer,
    PurchaseOrderSent,
}

impl SecondaryDateField {
    pub const ALL: [SecondaryDateField; 6] = [
        SecondaryDateField::RequestDeliveryDate,
        SecondaryDateField::SignedPlansReceived,
        SecondaryDateField::OrderReceivedDate,
        SecondaryDateField::OrderSentToLongtree,
        SecondaryDateField::PlansSentToDealer,
        SecondaryDateField::PurchaseOrderSent,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            SecondaryDateField::RequestDeliveryDate => field_names::REQUEST_DELIVERY_DATE,
            SecondaryDateField::SignedPlansReceived => field_names::SIGNED_PLANS_RECEIVED,
            SecondaryDateField::OrderReceivedDate => field_names::ORDER_RECEIVED_DATE,
            SecondaryDateField::OrderSentToLongtree => field_names::ORDER_SENT_TO_LONGTREE,
            SecondaryDateField::PlansSentToDealer => field_names::PLANS_SENT_TO_DEALER,
            SecondaryDateField::PurchaseOrderSent => field_names::PURCHASE_ORDER_SENT,
        }
    }

    /// 按列名或紧凑键解析
    ///
    /// 接受 "Signed Plans Received"、"SignedPlansReceived" 以及
    /// "SignedPlansReceivedYearMonth"（界面筛选键）三种写法，大小写不敏感
    pub fn from_name(name: &str) -> Option<Self> {
        let compact: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        let compact = compact.strip_suffix("yearmonth").unwrap_or(&compact);

        Self::ALL.into_iter().find(|field| {
            field
                .field_name()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase()
                == compact
        })
    }
}

// ==========================================
// ScheduleRecord - 排产记录
// ==========================================
// 用途: RecordNormalizer 写入，引擎层只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    // ===== 元信息 =====
    pub row_number: usize, // 源集合中的位置（默认排序键）

    // ===== 标识 =====
    pub chassis: String, // 底盘号；空串表示未分配的开放槽位
    pub dealer: String,  // 经销商（缺失时为 "Unknown"）

    // ===== 展示字段 =====
    pub model: String,
    pub model_year: String,
    pub customer: String,
    pub production_stage: String, // 自由文本生产阶段

    // ===== 日期 =====
    pub forecast_production_date: Option<NaiveDate>,
    pub secondary_dates: BTreeMap<SecondaryDateField, NaiveDate>,

    // ===== 源字段（原样保留，含未识别字段）=====
    pub source: RawRecord,
}

impl ScheduleRecord {
    pub fn occupancy(&self) -> Occupancy {
        if self.chassis.is_empty() {
            Occupancy::Empty
        } else {
            Occupancy::Occupied
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupancy() == Occupancy::Occupied
    }

    pub fn secondary_date(&self, field: SecondaryDateField) -> Option<NaiveDate> {
        self.secondary_dates.get(&field).copied()
    }

    /// 列的展示值（源文本），缺失为空串
    pub fn display_value(&self, column: &str) -> &str {
        self.source.get(column).map(String::as_str).unwrap_or("")
    }

    /// 未被识别的附加字段
    pub fn extra_fields(&self) -> impl Iterator<Item = (&String, &String)> {
        self.source.iter().filter(|(name, _)| !is_recognized_field(name))
    }
}

/// 是否为引擎识别的字段
pub fn is_recognized_field(name: &str) -> bool {
    matches!(
        name,
        field_names::CHASSIS
            | field_names::DEALER
            | field_names::MODEL
            | field_names::MODEL_YEAR
            | field_names::CUSTOMER
            | field_names::FORECAST_PRODUCTION_DATE
            | field_names::REGENT_PRODUCTION
    ) || SecondaryDateField::ALL
        .iter()
        .any(|field| field.field_name() == name)
}
