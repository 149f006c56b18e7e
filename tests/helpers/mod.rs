// ==========================================
// 集成测试共享辅助
// ==========================================
#![allow(dead_code)]

pub mod record_builder;
