// ==========================================
// 排产记录构建器 - 用于集成测试
// ==========================================
// 以原始字段字典构建，再经 RecordNormalizer 规范化，与真实数据路径一致
// ==========================================

use chrono::NaiveDate;
use schedule_dashboard::domain::record::{field_names as f, RawRecord, ScheduleRecord};
use schedule_dashboard::importer::RecordNormalizer;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// NaiveDate → "DD/MM/YYYY"
pub fn dmy(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

// ==========================================
// RecordBuilder
// ==========================================

#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    raw: RawRecord,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.raw.insert(name.to_string(), value.to_string());
        self
    }

    pub fn chassis(self, chassis: &str) -> Self {
        self.field(f::CHASSIS, chassis)
    }

    pub fn dealer(self, dealer: &str) -> Self {
        self.field(f::DEALER, dealer)
    }

    pub fn model(self, model: &str) -> Self {
        self.field(f::MODEL, model)
    }

    pub fn model_year(self, year: &str) -> Self {
        self.field(f::MODEL_YEAR, year)
    }

    pub fn customer(self, customer: &str) -> Self {
        self.field(f::CUSTOMER, customer)
    }

    pub fn stage(self, stage: &str) -> Self {
        self.field(f::REGENT_PRODUCTION, stage)
    }

    /// 源文本形式（DD/MM/YYYY 或任意畸形文本）
    pub fn forecast(self, text: &str) -> Self {
        self.field(f::FORECAST_PRODUCTION_DATE, text)
    }

    pub fn forecast_on(self, date: NaiveDate) -> Self {
        self.forecast(&dmy(date))
    }

    pub fn order_received_on(self, date: NaiveDate) -> Self {
        self.field(f::ORDER_RECEIVED_DATE, &dmy(date))
    }

    pub fn signed_plans_on(self, date: NaiveDate) -> Self {
        self.field(f::SIGNED_PLANS_RECEIVED, &dmy(date))
    }

    pub fn raw(self) -> RawRecord {
        self.raw
    }
}

/// 规范化一组原始记录（row_number = 下标）
pub fn normalize(rows: Vec<RawRecord>) -> Vec<ScheduleRecord> {
    RecordNormalizer::default().normalize(&rows).0
}

// ==========================================
// 样例数据集
// ==========================================

/// 覆盖 已占用/空槽、缺失日期、海运、已完工、跨年份 的样例集
pub fn sample_raw_records() -> Vec<RawRecord> {
    let dealers = ["AutoMax", "CarWorld", "MotorHub"];
    let stages = [
        "Queued",
        "In Progress",
        "Shipped-Perth",
        "Finished",
        "",
        "In Progress-Sydney",
    ];
    let models = ["Premium XL", "Sport", "Touring"];
    let prefixes = ["ABC", "DEF", "XYZ"];

    let mut rows = Vec::new();
    for i in 0..60u32 {
        let dealer = dealers[(i % 3) as usize];
        let mut builder = RecordBuilder::new()
            .dealer(dealer)
            .model(models[(i % 5 % 3) as usize])
            .model_year(&format!("{}", 2023 + (i % 4)))
            .customer(&format!("Customer {}", i % 7))
            .stage(stages[(i % 6) as usize]);

        // 每 4 条一个空槽位
        if i % 4 != 0 {
            builder = builder.chassis(&format!("{}{:03}", prefixes[(i % 3) as usize], i));
        }

        // 每 10 条一个缺失/畸形日期
        builder = match i % 10 {
            7 => builder,
            9 => builder.forecast("TBC"),
            _ => builder.forecast_on(date(2024 + (i % 3) as i32, 1 + i % 12, 1 + (i * 3) % 28)),
        };

        if i % 2 == 0 {
            builder = builder.order_received_on(date(2025, 1 + i % 12, 10));
        }
        if i % 5 == 0 {
            builder = builder.signed_plans_on(date(2025, 2 + i % 6, 5));
        }
        rows.push(builder.raw());
    }
    rows
}

pub fn sample_records() -> Vec<ScheduleRecord> {
    normalize(sample_raw_records())
}
