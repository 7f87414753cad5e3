// Nutrient Reference - static table correlating blood markers with nutrients
// Independent of the loaded record set; informational only.
//
// Each entry has:
// - A marker name plus aliases (matched case-insensitively)
// - A category used by the category filter
// - The nutrients commonly associated with that marker

pub mod category;
pub mod nutrients;

pub use category::ReferenceCategory;
pub use nutrients::{NutrientEntry, NutrientReference};
