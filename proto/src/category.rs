//! The fixed category registry.
//!
//! Entries carry their category as a plain string. It is either the `name` of
//! one of the descriptors below (what the entry form stores), the numeric `id`
//! of one, or arbitrary text typed into the custom category field. Resolution
//! never fails: anything that is not a known id or name maps to
//! [`UNKNOWN_CATEGORY`] so the table and form can always render.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryDescriptor {
    pub id: u32,
    pub name: &'static str,
}

impl fmt::Display for CategoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl CategoryDescriptor {
    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_CATEGORY.id
    }
}

pub const UNKNOWN_CATEGORY: CategoryDescriptor = CategoryDescriptor {
    id: 0,
    name: "Unknown",
};

const CATEGORIES: [CategoryDescriptor; 8] = [
    CategoryDescriptor {
        id: 1,
        name: "Technology",
    },
    CategoryDescriptor {
        id: 2,
        name: "Business",
    },
    CategoryDescriptor {
        id: 3,
        name: "Science",
    },
    CategoryDescriptor {
        id: 4,
        name: "Arts",
    },
    CategoryDescriptor {
        id: 5,
        name: "Education",
    },
    CategoryDescriptor {
        id: 6,
        name: "Health",
    },
    CategoryDescriptor {
        id: 7,
        name: "Government",
    },
    CategoryDescriptor {
        id: 8,
        name: "Nonprofit",
    },
];

/// The predefined categories, in the order the entry form offers them.
pub fn categories() -> &'static [CategoryDescriptor] {
    &CATEGORIES
}

/// Resolve an identifier or name to its descriptor, falling back to
/// [`UNKNOWN_CATEGORY`].
pub fn resolve(identifier: &str) -> CategoryDescriptor {
    lookup(identifier).unwrap_or(UNKNOWN_CATEGORY)
}

/// Strict variant of [`resolve`], used where "is this a predefined category"
/// matters (the form deciding whether a stored value is custom text).
pub fn lookup(identifier: &str) -> Option<CategoryDescriptor> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return None;
    }

    if let Ok(id) = identifier.parse::<u32>() {
        return CATEGORIES.iter().find(|c| c.id == id).copied();
    }

    CATEGORIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(identifier))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_name_and_id() {
        assert_eq!(resolve("Technology").name, "Technology");
        assert_eq!(resolve("technology").name, "Technology");
        assert_eq!(resolve("  Science ").name, "Science");
        assert_eq!(resolve("4").name, "Arts");
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        for junk in ["", "   ", "Keynote", "99", "0", "-1", "Tech nology"] {
            let d = resolve(junk);
            assert!(d.is_unknown(), "{junk:?} resolved to {d:?}");
            assert_eq!(d.name, "Unknown");
        }
        assert!(lookup("Keynote").is_none());
    }

    #[test]
    fn test_registry_ids_unique() {
        let mut ids: Vec<u32> = categories().iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), categories().len());
        assert!(!ids.contains(&UNKNOWN_CATEGORY.id));
    }
}
