// Reference categories - grouping used by the category filter

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceCategory {
    Vitamins,
    Minerals,
    Lipids,
    Metabolic,
    Blood,
    Hormones,
}

impl ReferenceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceCategory::Vitamins => "Vitamins",
            ReferenceCategory::Minerals => "Minerals",
            ReferenceCategory::Lipids => "Lipids",
            ReferenceCategory::Metabolic => "Metabolic",
            ReferenceCategory::Blood => "Blood",
            ReferenceCategory::Hormones => "Hormones",
        }
    }

    /// Read a picker value; `"All"` (or anything unknown) means no category
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "vitamins" => Some(ReferenceCategory::Vitamins),
            "minerals" => Some(ReferenceCategory::Minerals),
            "lipids" => Some(ReferenceCategory::Lipids),
            "metabolic" => Some(ReferenceCategory::Metabolic),
            "blood" => Some(ReferenceCategory::Blood),
            "hormones" => Some(ReferenceCategory::Hormones),
            _ => None,
        }
    }
}

impl fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
