//! Classifying how the files of one title are laid out on disk.

use crate::nfo::{IdentityGroup, MetadataRecord};

/// Verdict for a group of records sharing one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutClassification<'a> {
    /// Only one file for the title.
    Singleton,
    /// The same title lives in more than one folder and needs a manual merge.
    CrossFolderDuplicate,
    /// Multiple versions in one folder, all named `"<folder> - <version>"`.
    ConformingMultiVersion,
    /// Multiple versions in one folder where some files lack the folder name prefix.
    NonConformingMultiVersion {
        folder_name: String,
        non_conforming: Vec<&'a MetadataRecord>,
    },
}

/// Separator between the folder name and the version tag.
const VERSION_SEPARATOR: &str = " - ";

/// Name prefix a media server expects for files of a multi-version folder.
#[must_use]
pub fn version_prefix(folder_name: &str) -> String {
    format!("{folder_name}{VERSION_SEPARATOR}")
}

/// Classify a group by directory layout and file name prefix.
///
/// Directories and file names are compared exactly as stored on disk,
/// so canonically equivalent Unicode spellings count as different folders.
#[must_use]
pub fn classify(group: &IdentityGroup) -> LayoutClassification<'_> {
    let records = group.records();
    let Some((first, rest)) = records.split_first() else {
        return LayoutClassification::Singleton;
    };
    if rest.is_empty() {
        return LayoutClassification::Singleton;
    }

    let directory = first.directory();
    if rest.iter().any(|record| record.directory() != directory) {
        return LayoutClassification::CrossFolderDuplicate;
    }

    let folder = directory.file_name().unwrap_or_default();
    let prefix = [folder.as_encoded_bytes(), VERSION_SEPARATOR.as_bytes()].concat();
    let non_conforming: Vec<&MetadataRecord> = records
        .iter()
        .filter(|record| {
            !record
                .source_path()
                .file_name()
                .is_some_and(|name| name.as_encoded_bytes().starts_with(&prefix))
        })
        .collect();

    if non_conforming.is_empty() {
        LayoutClassification::ConformingMultiVersion
    } else {
        LayoutClassification::NonConformingMultiVersion {
            folder_name: folder.to_string_lossy().into_owned(),
            non_conforming,
        }
    }
}
