//! Duplicate detection and naming checks for NFO sidecar files.
//!
//! Sidecars are read into [`MetadataRecord`]s, grouped by their IMDB or TMDB identifier
//! in an [`IdentityIndex`], and each group is classified by how its files are laid out on disk.
//! Groups that share one folder but do not follow the `"<folder> - <version>"` naming
//! get advisory [`RenameSuggestion`]s computed by the [`FilenameAligner`].

mod align;
mod command;
mod identity;
mod layout;
mod metadata;
mod rename;
mod report;
mod scan;

pub use align::{DEFAULT_JUNK_PREFIXES, DEFAULT_JUNK_SUFFIXES, FilenameAligner};
pub use command::CommandStyle;
pub use identity::{IdentifierKind, IdentityGroup, IdentityIndex};
pub use layout::{LayoutClassification, classify, version_prefix};
pub use metadata::{
    ExternalId, MetadataFields, MetadataRecord, ReadError, SIDECAR_EXTENSION, parse_metadata, read_metadata,
    sidecar_stem,
};
pub use rename::{RenameSuggestion, suggest_renames};
pub use report::{Finding, FindingKind, Report, build_report};
pub use scan::{
    DEFAULT_VIDEO_EXTENSIONS, LoadStats, MissingVideo, SidecarWalker, find_missing_videos, is_sidecar, load_index,
};
