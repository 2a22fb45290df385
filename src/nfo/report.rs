//! Classification pass over all identity groups.

use std::path::PathBuf;

use serde::Serialize;

use crate::nfo::{
    FilenameAligner, IdentifierKind, IdentityGroup, IdentityIndex, LayoutClassification, MetadataRecord,
    RenameSuggestion, classify, suggest_renames,
};

/// What is wrong with a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum FindingKind {
    /// Same title in more than one folder. Needs a manual merge.
    CrossFolder { paths: Vec<PathBuf> },
    /// Versions share a folder but some are not named `"<folder> - <version>"`.
    BadMultiVersion {
        folder_name: String,
        non_conforming: Vec<PathBuf>,
        suggestions: Vec<RenameSuggestion>,
    },
}

/// One reportable group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub identifier_kind: IdentifierKind,
    pub identifier: String,
    pub title: String,
    #[serde(flatten)]
    pub kind: FindingKind,
}

/// All findings from one run, IMDB groups first.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub findings: Vec<Finding>,
    /// Number of groups with more than one record.
    pub groups: usize,
    /// Number of correctly named multi-version groups.
    pub conforming: usize,
}

impl Report {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings for titles spread over several folders.
    pub fn cross_folder(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| matches!(finding.kind, FindingKind::CrossFolder { .. }))
    }

    /// Findings for badly named multi-version folders.
    pub fn bad_multi_version(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| matches!(finding.kind, FindingKind::BadMultiVersion { .. }))
    }

    /// Every rename suggestion in the report.
    pub fn suggestions(&self) -> impl Iterator<Item = &RenameSuggestion> {
        self.findings
            .iter()
            .filter_map(|finding| match &finding.kind {
                FindingKind::CrossFolder { .. } => None,
                FindingKind::BadMultiVersion { suggestions, .. } => Some(suggestions),
            })
            .flatten()
    }
}

/// Classify every group with more than one record and collect the ones needing attention.
#[must_use]
pub fn build_report(index: &IdentityIndex, aligner: &FilenameAligner) -> Report {
    let mut report = Report::default();
    for kind in IdentifierKind::ALL {
        for group in index.groups(kind) {
            report.groups += 1;
            match classify(group) {
                LayoutClassification::Singleton => {}
                LayoutClassification::ConformingMultiVersion => report.conforming += 1,
                LayoutClassification::CrossFolderDuplicate => {
                    report.findings.push(finding(
                        kind,
                        group,
                        FindingKind::CrossFolder {
                            paths: paths(group.records()),
                        },
                    ));
                }
                LayoutClassification::NonConformingMultiVersion {
                    folder_name,
                    non_conforming,
                } => {
                    let suggestions = suggest_renames(non_conforming.iter().copied(), &folder_name, aligner);
                    report.findings.push(finding(
                        kind,
                        group,
                        FindingKind::BadMultiVersion {
                            non_conforming: paths(non_conforming.iter().copied()),
                            folder_name,
                            suggestions,
                        },
                    ));
                }
            }
        }
    }
    report
}

fn finding(identifier_kind: IdentifierKind, group: &IdentityGroup, kind: FindingKind) -> Finding {
    Finding {
        identifier_kind,
        identifier: group.identifier().to_string(),
        title: group
            .records()
            .first()
            .map(MetadataRecord::display_title)
            .unwrap_or_default(),
        kind,
    }
}

fn paths<'a>(records: impl IntoIterator<Item = &'a MetadataRecord>) -> Vec<PathBuf> {
    records
        .into_iter()
        .map(|record| record.source_path().to_path_buf())
        .collect()
}
