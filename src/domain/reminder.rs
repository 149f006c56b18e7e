// ==========================================
// 车辆排产看板 - 阶段变更提醒
// ==========================================
// 用途: 记录设置提醒时底盘所处的生产阶段，阶段变化后触发
// 说明: 邮件投递不在本库范围内
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub reminder_id: i64,
    pub chassis: String,
    /// 设置提醒时观察到的生产阶段
    pub production_stage: String,
    pub email: String,
    pub note: String,
    pub remind_on: Option<NaiveDate>,
}

/// 新建提醒请求（id 由存储分配）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReminder {
    pub chassis: String,
    pub production_stage: String,
    pub email: String,
    pub note: String,
    pub remind_on: Option<NaiveDate>,
}

/// 阶段已变化、需要发送的提醒
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueReminder {
    pub reminder: Reminder,
    pub new_stage: String,
}
