//! Library rule module

/// Conditions under which an item of a library becomes eligible for deletion
///
/// Either condition is sufficient. A rule with both conditions disabled
/// never makes anything eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LibraryRule {
    /// Eligible once every known user has played the item
    pub delete_if_watched_by_all: bool,

    /// Eligible once the item has been in the library for more than this
    /// many whole days. Zero disables the age check.
    pub max_age_days: u32,
}

impl LibraryRule {
    /// Whether the rule can ever make an item eligible
    pub fn is_active(&self) -> bool {
        self.delete_if_watched_by_all || self.max_age_days > 0
    }
}
