//! Grouping metadata records by external identifier.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::nfo::{ExternalId, MetadataRecord};

/// Which identifier index a group belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Imdb,
    Tmdb,
}

/// Records sharing one identifier, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityGroup {
    identifier: String,
    records: Vec<MetadataRecord>,
}

/// Records keyed by IMDB id, with TMDB id as fallback for records without one.
#[derive(Debug, Default)]
pub struct IdentityIndex {
    imdb: HashMap<String, IdentityGroup>,
    tmdb: HashMap<String, IdentityGroup>,
    without_identifier: usize,
}

impl IdentifierKind {
    pub const ALL: [Self; 2] = [Self::Imdb, Self::Tmdb];
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imdb => write!(f, "IMDB"),
            Self::Tmdb => write!(f, "TMDB"),
        }
    }
}

impl IdentityGroup {
    pub(crate) const fn new(identifier: String) -> Self {
        Self {
            identifier,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IdentityIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the group of its identifier.
    ///
    /// Records without an identifier can not be correlated and are dropped.
    /// Returns `true` if the record was indexed.
    pub fn record(&mut self, record: MetadataRecord) -> bool {
        let (map, identifier) = match record.external_id() {
            ExternalId::Imdb(id) => (&mut self.imdb, id.clone()),
            ExternalId::Tmdb(id) => (&mut self.tmdb, id.clone()),
            ExternalId::None => {
                self.without_identifier += 1;
                return false;
            }
        };
        map.entry(identifier.clone())
            .or_insert_with(|| IdentityGroup::new(identifier))
            .records
            .push(record);
        true
    }

    /// Groups with at least two records, sorted by identifier.
    #[must_use]
    pub fn groups(&self, kind: IdentifierKind) -> Vec<&IdentityGroup> {
        self.all_groups(kind).into_iter().filter(|group| group.len() > 1).collect()
    }

    /// All groups including single records, sorted by identifier.
    #[must_use]
    pub fn all_groups(&self, kind: IdentifierKind) -> Vec<&IdentityGroup> {
        self.map(kind)
            .values()
            .sorted_by(|a, b| a.identifier.cmp(&b.identifier))
            .collect()
    }

    /// Look up the group for an identifier.
    #[must_use]
    pub fn get(&self, kind: IdentifierKind, identifier: &str) -> Option<&IdentityGroup> {
        self.map(kind).get(identifier)
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.imdb.values().chain(self.tmdb.values()).map(IdentityGroup::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imdb.is_empty() && self.tmdb.is_empty()
    }

    /// Number of records dropped for lacking an identifier.
    #[must_use]
    pub const fn without_identifier(&self) -> usize {
        self.without_identifier
    }

    const fn map(&self, kind: IdentifierKind) -> &HashMap<String, IdentityGroup> {
        match kind {
            IdentifierKind::Imdb => &self.imdb,
            IdentifierKind::Tmdb => &self.tmdb,
        }
    }
}
