//! Screen identifiers.

use std::fmt;

use coursedesk_core::EntityKind;

/// Identifies each TUI screen. Listings are navigable by number keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Users,
    Subjects,
    Tasks,
    /// One entity, reached from a listing's view action.
    Detail,
    /// Token gate, shown while the session has no token.
    Login,
}

impl ScreenId {
    /// Listing screens in tab-bar order.
    pub const ALL: [ScreenId; 3] = [Self::Users, Self::Subjects, Self::Tasks];

    /// Numeric key (1-3). Detail and Login have no number key.
    pub fn number(self) -> u8 {
        match self {
            Self::Users => 1,
            Self::Subjects => 2,
            Self::Tasks => 3,
            Self::Detail | Self::Login => 0,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Users),
            2 => Some(Self::Subjects),
            3 => Some(Self::Tasks),
            _ => None,
        }
    }

    /// Next listing in tab order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous listing in tab order (wraps around).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::Subjects => "Subjects",
            Self::Tasks => "Tasks",
            Self::Detail => "Detail",
            Self::Login => "Login",
        }
    }

    /// The entity kind a listing screen shows.
    pub fn entity_kind(self) -> Option<EntityKind> {
        match self {
            Self::Users => Some(EntityKind::Users),
            Self::Subjects => Some(EntityKind::Subjects),
            Self::Tasks => Some(EntityKind::Tasks),
            Self::Detail | Self::Login => None,
        }
    }

    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Users => Self::Users,
            EntityKind::Subjects => Self::Subjects,
            EntityKind::Tasks => Self::Tasks,
        }
    }

    pub fn is_listing(self) -> bool {
        self.entity_kind().is_some()
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_round_trip() {
        for screen in ScreenId::ALL {
            assert_eq!(ScreenId::from_number(screen.number()), Some(screen));
        }
        assert_eq!(ScreenId::from_number(0), None);
        assert_eq!(ScreenId::from_number(4), None);
    }

    #[test]
    fn tab_order_wraps() {
        assert_eq!(ScreenId::Tasks.next(), ScreenId::Users);
        assert_eq!(ScreenId::Users.prev(), ScreenId::Tasks);
        assert_eq!(ScreenId::Detail.next(), ScreenId::Subjects);
    }

    #[test]
    fn listings_map_to_kinds() {
        for kind in [EntityKind::Users, EntityKind::Subjects, EntityKind::Tasks] {
            let screen = ScreenId::for_kind(kind);
            assert!(screen.is_listing());
            assert_eq!(screen.entity_kind(), Some(kind));
        }
        assert!(!ScreenId::Login.is_listing());
    }
}
