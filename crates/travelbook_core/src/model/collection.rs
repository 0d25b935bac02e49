//! Fixed collection registry.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Named, unordered set of records keyed by `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Clients,
    Flights,
    Visas,
    WorkVisas,
    Notifications,
    Activity,
}

impl Collection {
    pub const COUNT: usize = 6;

    /// Every collection, in schema declaration order.
    pub const ALL: [Collection; Self::COUNT] = [
        Collection::Clients,
        Collection::Flights,
        Collection::Visas,
        Collection::WorkVisas,
        Collection::Notifications,
        Collection::Activity,
    ];

    /// Stable external name; doubles as the SQLite table name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Flights => "flights",
            Self::Visas => "visas",
            Self::WorkVisas => "workvisas",
            Self::Notifications => "notifications",
            Self::Activity => "activity",
        }
    }

    /// Parses an exact (case-sensitive) collection name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|collection| collection.as_str() == value)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Clients => 0,
            Self::Flights => 1,
            Self::Visas => 2,
            Self::WorkVisas => 3,
            Self::Notifications => 4,
            Self::Activity => 5,
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
