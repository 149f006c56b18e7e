// ==========================================
// 车辆排产看板 - 生产阶段分类器
// ==========================================
// 职责: 自由文本生产阶段 → 规范化分桶
// 红线: 阶段筛选 / 阶段分布 / 经销商分类视图必须共用本分类器
// ==========================================

use crate::domain::types::CanonicalStage;

// ==========================================
// StageClassifier - 阶段分类器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct StageClassifier;

impl StageClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 分类规则（顺序执行，命中即返回）:
    /// 1) 空/空白 → NoStage
    /// 2) 大小写不敏感等于 "finished" → Finished
    /// 3) 含 '-' → SeaFreighting
    /// 4) 其他 → 原样作为分桶
    pub fn classify(&self, stage: &str) -> CanonicalStage {
        let trimmed = stage.trim();
        if trimmed.is_empty() {
            return CanonicalStage::NoStage;
        }
        if trimmed.eq_ignore_ascii_case("finished") {
            return CanonicalStage::Finished;
        }
        if trimmed.contains('-') {
            return CanonicalStage::SeaFreighting;
        }
        CanonicalStage::Stage(trimmed.to_string())
    }

    /// 界面选中的名称 → 分桶
    ///
    /// 分桶显示名（"Sea Freighting" / "No Stage"）映射回对应分桶，
    /// 其余名称按 `classify` 规则处理
    pub fn bucket_for_label(&self, label: &str) -> CanonicalStage {
        let trimmed = label.trim();
        if trimmed == CanonicalStage::SEA_FREIGHTING_LABEL {
            CanonicalStage::SeaFreighting
        } else if trimmed == CanonicalStage::NO_STAGE_LABEL {
            CanonicalStage::NoStage
        } else {
            self.classify(trimmed)
        }
    }
}
