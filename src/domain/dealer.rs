// ==========================================
// 车辆排产看板 - 经销商属性
// ==========================================
// 用途: 外部维护（颜色 + 分类备注），引擎只读，仅作标签/分组维度
// ==========================================

use crate::domain::types::DealerClass;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 经销商备注（存储形态: {text, class}）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerNote {
    #[serde(default)]
    pub text: String,
    /// 原样保留存储值，解析见 `dealer_class`
    #[serde(default)]
    pub class: Option<String>,
}

impl DealerNote {
    pub fn new(text: impl Into<String>, class: DealerClass) -> Self {
        Self {
            text: text.into(),
            class: Some(class.to_string()),
        }
    }

    pub fn dealer_class(&self) -> DealerClass {
        self.class
            .as_deref()
            .map(DealerClass::from_str)
            .unwrap_or_default()
    }
}

/// 单个经销商的合并属性
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerAttributes {
    pub color: Option<String>,
    pub note: Option<String>,
    pub class: DealerClass,
}

// ==========================================
// DealerDirectory - 经销商属性目录
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerDirectory {
    pub colors: HashMap<String, String>,
    pub notes: HashMap<String, DealerNote>,
}

impl DealerDirectory {
    pub fn new(colors: HashMap<String, String>, notes: HashMap<String, DealerNote>) -> Self {
        Self { colors, notes }
    }

    pub fn class_of(&self, dealer: &str) -> DealerClass {
        self.notes
            .get(dealer)
            .map(DealerNote::dealer_class)
            .unwrap_or_default()
    }

    pub fn color_of(&self, dealer: &str) -> Option<&str> {
        self.colors.get(dealer).map(String::as_str)
    }

    pub fn attributes(&self, dealer: &str) -> DealerAttributes {
        DealerAttributes {
            color: self.colors.get(dealer).cloned(),
            note: self
                .notes
                .get(dealer)
                .map(|n| n.text.clone())
                .filter(|t| !t.is_empty()),
            class: self.class_of(dealer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_class_is_external() {
        let mut notes = HashMap::new();
        notes.insert(
            "AutoMax".to_string(),
            DealerNote {
                text: "Premium dealer".to_string(),
                class: None,
            },
        );
        let dir = DealerDirectory::new(HashMap::new(), notes);

        assert_eq!(dir.class_of("AutoMax"), DealerClass::ExternalDealer);
        assert_eq!(dir.class_of("Nobody"), DealerClass::ExternalDealer);
    }

    #[test]
    fn test_attributes_merge_color_and_note() {
        let mut colors = HashMap::new();
        colors.insert("CarWorld".to_string(), "#f3e5f5".to_string());
        let mut notes = HashMap::new();
        notes.insert(
            "CarWorld".to_string(),
            DealerNote::new("Mid-tier dealer", DealerClass::SelfOwnedDealer),
        );
        let dir = DealerDirectory::new(colors, notes);

        let attrs = dir.attributes("CarWorld");
        assert_eq!(attrs.color.as_deref(), Some("#f3e5f5"));
        assert_eq!(attrs.note.as_deref(), Some("Mid-tier dealer"));
        assert_eq!(attrs.class, DealerClass::SelfOwnedDealer);
    }

    #[test]
    fn test_note_deserializes_storage_shape() {
        let note: DealerNote =
            serde_json::from_str(r#"{"text":"Strategic partner","class":"jv_dealer"}"#).unwrap();
        assert_eq!(note.dealer_class(), DealerClass::JvDealer);

        let bare: DealerNote = serde_json::from_str("{}").unwrap();
        assert_eq!(bare.dealer_class(), DealerClass::ExternalDealer);
    }
}
