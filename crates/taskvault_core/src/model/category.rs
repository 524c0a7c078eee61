//! Category record and color palette.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed palette cycled by insertion order.
pub const PRESET_COLORS: [&str; 8] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Category {
    /// Creates a category with a fresh id and the palette color for the
    /// `existing`-th insertion.
    pub fn new(name: &str, existing: usize) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.trim().to_string(),
            color: color_for_index(existing).to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyCategoryName);
        }
        Ok(())
    }
}

/// Returns `PRESET_COLORS[index % 8]`.
pub fn color_for_index(index: usize) -> &'static str {
    PRESET_COLORS[index % PRESET_COLORS.len()]
}

/// Categories seeded into an empty store on first start.
pub fn default_categories() -> Vec<Category> {
    [("work", "Work"), ("personal", "Personal"), ("ideas", "Ideas")]
        .iter()
        .enumerate()
        .map(|(index, (id, name))| Category {
            id: (*id).to_string(),
            name: (*name).to_string(),
            color: color_for_index(index).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{color_for_index, default_categories, Category, PRESET_COLORS};

    #[test]
    fn palette_cycles_after_eight() {
        assert_eq!(color_for_index(0), PRESET_COLORS[0]);
        assert_eq!(color_for_index(8), PRESET_COLORS[0]);
        assert_eq!(color_for_index(13), PRESET_COLORS[5]);
    }

    #[test]
    fn defaults_use_first_three_colors() {
        let defaults = default_categories();
        let ids: Vec<&str> = defaults.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["work", "personal", "ideas"]);
        assert_eq!(defaults[2].color, PRESET_COLORS[2]);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(Category::new("   ", 0).validate().is_err());
    }
}
