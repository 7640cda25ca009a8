//! Topic categories assigned to chat messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of maintenance topics plus a catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Airframe,
    Powerplant,
    Avionics,
    Environmental,
    Hydraulics,
    Electrical,
    Regulatory,
    General,
}

impl Category {
    /// Every category, catch-all last.
    pub const ALL: [Category; 8] = [
        Category::Airframe,
        Category::Powerplant,
        Category::Avionics,
        Category::Environmental,
        Category::Hydraulics,
        Category::Electrical,
        Category::Regulatory,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Airframe => "airframe",
            Category::Powerplant => "powerplant",
            Category::Avionics => "avionics",
            Category::Environmental => "environmental",
            Category::Hydraulics => "hydraulics",
            Category::Electrical => "electrical",
            Category::Regulatory => "regulatory",
            Category::General => "general",
        }
    }

    /// Exact label match, case-insensitive, ignoring surrounding whitespace
    /// and trailing punctuation.
    pub fn parse_label(label: &str) -> Option<Category> {
        let normalized = label
            .trim()
            .trim_matches(|c: char| c == '.' || c == '"' || c == '\'' || c == '`')
            .to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
    }

    /// Like [`Category::parse_label`] but resolves anything unrecognized to
    /// [`Category::General`].
    pub fn from_label_or_general(label: &str) -> Category {
        Self::parse_label(label).unwrap_or(Category::General)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
