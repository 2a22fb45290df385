//! Advisory renames for files of a non-conforming multi-version folder.

use std::path::PathBuf;

use serde::Serialize;

use crate::nfo::{FilenameAligner, MetadataRecord, SIDECAR_EXTENSION, sidecar_stem, version_prefix};

/// One suggested rename, without extensions.
///
/// Every file starting with `source_stem` in `source_dir` is meant to be renamed,
/// so the video and subtitle files follow the sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameSuggestion {
    pub source_dir: PathBuf,
    pub source_stem: String,
    pub target_stem: String,
}

impl RenameSuggestion {
    /// Sidecar file name after the rename.
    #[must_use]
    pub fn target_file_name(&self) -> String {
        format!("{}.{SIDECAR_EXTENSION}", self.target_stem)
    }

    /// Sidecar file name before the rename.
    #[must_use]
    pub fn source_file_name(&self) -> String {
        format!("{}.{SIDECAR_EXTENSION}", self.source_stem)
    }
}

/// Suggest `"<folder name> - <version tag>"` names for the given records.
///
/// Records whose file name already starts with the folder name are left alone.
#[must_use]
pub fn suggest_renames<'a>(
    records: impl IntoIterator<Item = &'a MetadataRecord>,
    folder_name: &str,
    aligner: &FilenameAligner,
) -> Vec<RenameSuggestion> {
    records
        .into_iter()
        .filter_map(|record| {
            let file_name = record.file_name();
            if file_name.starts_with(folder_name) {
                return None;
            }
            let source_stem = sidecar_stem(&file_name);
            let tag = aligner.version_tag(source_stem, folder_name);
            Some(RenameSuggestion {
                source_dir: record.directory().to_path_buf(),
                source_stem: source_stem.to_string(),
                target_stem: format!("{}{tag}", version_prefix(folder_name)),
            })
        })
        .collect()
}
