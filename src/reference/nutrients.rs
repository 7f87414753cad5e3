// Nutrient table - which nutrients move which blood markers
// Static, read-only; searched by free text and filtered by category.

use super::category::ReferenceCategory;
use serde::{Deserialize, Serialize};

// ============================================================================
// ENTRY
// ============================================================================

/// One row of the reference table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientEntry {
    /// Marker name as it usually appears on a lab report
    pub marker: String,

    /// Other spellings of the marker
    /// Example: ["25-OH Vitamin D", "Calcidiol"]
    pub aliases: Vec<String>,

    pub category: ReferenceCategory,

    /// Nutrients that influence this marker
    pub nutrients: Vec<String>,

    pub notes: String,
}

impl NutrientEntry {
    pub fn new(marker: &str, category: ReferenceCategory, nutrients: &[&str], notes: &str) -> Self {
        NutrientEntry {
            marker: marker.to_string(),
            aliases: Vec::new(),
            category,
            nutrients: nutrients.iter().map(|n| n.to_string()).collect(),
            notes: notes.to_string(),
        }
    }

    pub fn add_alias(&mut self, alias: &str) {
        if !self.aliases.iter().any(|a| a == alias) {
            self.aliases.push(alias.to_string());
        }
    }

    fn with_aliases(mut self, aliases: &[&str]) -> Self {
        for alias in aliases {
            self.add_alias(alias);
        }
        self
    }

    /// Does a marker name from a lab record refer to this entry?
    pub fn matches_marker(&self, marker: &str) -> bool {
        let wanted = marker.trim().to_lowercase();
        if wanted.is_empty() {
            return false;
        }
        self.marker.to_lowercase() == wanted
            || self.aliases.iter().any(|a| a.to_lowercase() == wanted)
    }

    /// Case-insensitive substring match over marker, aliases, nutrients and
    /// notes. `needle` must already be lower-cased.
    fn contains(&self, needle: &str) -> bool {
        self.marker.to_lowercase().contains(needle)
            || self.aliases.iter().any(|a| a.to_lowercase().contains(needle))
            || self.nutrients.iter().any(|n| n.to_lowercase().contains(needle))
            || self.notes.to_lowercase().contains(needle)
    }
}

// ============================================================================
// REFERENCE TABLE
// ============================================================================

#[derive(Debug, Clone)]
pub struct NutrientReference {
    entries: Vec<NutrientEntry>,
}

impl NutrientReference {
    /// Table with the default entries
    pub fn new() -> Self {
        let mut reference = NutrientReference {
            entries: Vec::new(),
        };
        reference.register_defaults();
        reference
    }

    /// Empty table, for callers that bring their own rows
    pub fn empty() -> Self {
        NutrientReference {
            entries: Vec::new(),
        }
    }

    fn register_defaults(&mut self) {
        use ReferenceCategory::*;

        // Vitamins
        self.register(
            NutrientEntry::new(
                "Vitamin D",
                Vitamins,
                &["Vitamin D3", "Magnesium", "Vitamin K2"],
                "Sun exposure matters as much as diet; magnesium is needed for activation",
            )
            .with_aliases(&["25-OH Vitamin D", "Calcidiol"]),
        );
        self.register(
            NutrientEntry::new(
                "Vitamin B12",
                Vitamins,
                &["Cobalamin", "Folate"],
                "Low levels are common with plant-based diets and long-term antacid use",
            )
            .with_aliases(&["B12", "Cobalamin"]),
        );
        self.register(NutrientEntry::new(
            "Folate",
            Vitamins,
            &["Folate", "Vitamin B12", "Vitamin B6"],
            "Leafy greens and legumes; interpret together with B12",
        ));

        // Minerals
        self.register(
            NutrientEntry::new(
                "Ferritin",
                Minerals,
                &["Iron", "Vitamin C"],
                "Iron stores; also rises with inflammation",
            )
            .with_aliases(&["Serum Ferritin"]),
        );
        self.register(NutrientEntry::new(
            "Magnesium",
            Minerals,
            &["Magnesium"],
            "Serum levels stay normal until stores are badly depleted",
        ));
        self.register(NutrientEntry::new(
            "Zinc",
            Minerals,
            &["Zinc", "Copper"],
            "High-dose zinc can lower copper",
        ));

        // Lipids
        self.register(
            NutrientEntry::new(
                "LDL Cholesterol",
                Lipids,
                &["Soluble fiber", "Plant sterols", "Omega-3"],
                "Saturated fat intake raises LDL in most people",
            )
            .with_aliases(&["LDL", "LDL-C"]),
        );
        self.register(
            NutrientEntry::new(
                "HDL Cholesterol",
                Lipids,
                &["Omega-3", "Niacin"],
                "Exercise has a larger effect than any single nutrient",
            )
            .with_aliases(&["HDL", "HDL-C"]),
        );
        self.register(NutrientEntry::new(
            "Triglycerides",
            Lipids,
            &["Omega-3", "Refined carbohydrates"],
            "Fasting sample required; alcohol and sugar raise it quickly",
        ));

        // Metabolic
        self.register(
            NutrientEntry::new(
                "HbA1c",
                Metabolic,
                &["Chromium", "Fiber"],
                "Reflects average glucose over roughly three months",
            )
            .with_aliases(&["Hemoglobin A1c", "A1C"]),
        );
        self.register(
            NutrientEntry::new(
                "Fasting Glucose",
                Metabolic,
                &["Fiber", "Magnesium", "Chromium"],
                "Single-point value; confirm trends with HbA1c",
            )
            .with_aliases(&["Glucose"]),
        );

        // Blood
        self.register(
            NutrientEntry::new(
                "Hemoglobin",
                Blood,
                &["Iron", "Vitamin B12", "Folate"],
                "Low values with low ferritin point to iron deficiency",
            )
            .with_aliases(&["Hgb", "Haemoglobin"]),
        );
        self.register(
            NutrientEntry::new(
                "CRP",
                Blood,
                &["Omega-3", "Polyphenols"],
                "Non-specific inflammation marker",
            )
            .with_aliases(&["C-Reactive Protein", "hs-CRP"]),
        );

        // Hormones
        self.register(
            NutrientEntry::new(
                "TSH",
                Hormones,
                &["Iodine", "Selenium", "Iron"],
                "Thyroid function screen; iodine excess can also disturb it",
            )
            .with_aliases(&["Thyroid Stimulating Hormone"]),
        );
        self.register(NutrientEntry::new(
            "Testosterone",
            Hormones,
            &["Zinc", "Vitamin D"],
            "Morning sample; sleep and body weight dominate",
        ));
    }

    pub fn register(&mut self, entry: NutrientEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[NutrientEntry] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Rows whose marker, aliases, nutrients or notes contain `term`
    /// (case-insensitive). A blank term matches every row.
    pub fn search(&self, term: &str) -> Vec<&NutrientEntry> {
        self.query(term, None)
    }

    /// Rows in `category`; `None` means all rows
    pub fn by_category(&self, category: Option<ReferenceCategory>) -> Vec<&NutrientEntry> {
        self.query("", category)
    }

    /// Search and category filter combined with AND, table order preserved
    pub fn query(&self, term: &str, category: Option<ReferenceCategory>) -> Vec<&NutrientEntry> {
        let needle = term.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| category.map_or(true, |c| e.category == c))
            .filter(|e| needle.is_empty() || e.contains(&needle))
            .collect()
    }

    /// Categories present in the table, in table order
    pub fn categories(&self) -> Vec<ReferenceCategory> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.category) {
                seen.push(entry.category);
            }
        }
        seen
    }

    /// Entry for a marker name taken from a lab record
    pub fn find_for_marker(&self, marker: &str) -> Option<&NutrientEntry> {
        self.entries.iter().find(|e| e.matches_marker(marker))
    }
}

impl Default for NutrientReference {
    fn default() -> Self {
        Self::new()
    }
}
