//! Item ordering for list views

use crate::types::Item;
use std::cmp::Reverse;

/// Sort key for item lists; every order is descending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemSort {
    /// Most recently seen first
    #[default]
    Recent,
    /// Most occurrences first
    Occurrences,
    /// Newest items first
    FirstSeen,
    /// Most severe first
    Level,
}

impl ItemSort {
    /// Parse a sort name, falling back to [`ItemSort::Recent`] for anything unrecognized
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Occurrences => "occurrences",
            Self::FirstSeen => "first-seen",
            Self::Level => "level",
        }
    }

    /// Sort in place; ties keep their incoming order
    pub fn apply(&self, items: &mut [Item]) {
        match self {
            Self::Recent => items.sort_by_key(|i| Reverse(i.last_occurrence_timestamp)),
            Self::Occurrences => items.sort_by_key(|i| Reverse(i.total_occurrences)),
            Self::FirstSeen => items.sort_by_key(|i| Reverse(i.first_occurrence_timestamp)),
            Self::Level => items.sort_by_key(|i| Reverse(i.level)),
        }
    }
}

impl std::fmt::Display for ItemSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recent" => Ok(Self::Recent),
            "occurrences" => Ok(Self::Occurrences),
            "first-seen" => Ok(Self::FirstSeen),
            "level" => Ok(Self::Level),
            _ => Err(format!("Invalid sort: {}", s)),
        }
    }
}
