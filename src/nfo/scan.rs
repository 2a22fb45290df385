//! Walking library roots for sidecar files.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ParallelProgressIterator, ProgressBar};
#[cfg(not(test))]
use indicatif::ProgressStyle;
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::nfo::{IdentityIndex, MetadataRecord, ReadError, SIDECAR_EXTENSION, read_metadata, sidecar_stem};
use crate::{print_error, print_warning};

/// All video extensions
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[
    "avi", "mpg", "mkv", "mp4", "m4v", "wmv", "ts", "wmtv", "ogv", "wtv", "flv", "mov", "dvr-ms", "iso",
];

/// Blu-ray folder structure directory name.
const BLURAY_DIR: &str = "BDMV";

/// Blu-ray disc index file that looks like a sidecar.
const BLURAY_INDEX: &str = "index.nfo";

#[cfg(not(test))]
const PROGRESS_BAR_CHARS: &str = "=>-";
#[cfg(not(test))]
const PROGRESS_BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:80.magenta/blue} {pos}/{len} {percent}%";

/// Recursive walk over one library root yielding sidecar file paths.
#[derive(Debug, Clone)]
pub struct SidecarWalker {
    root: PathBuf,
}

/// Counts from loading sidecars into an index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub sidecars: usize,
    pub indexed: usize,
    pub without_identifier: usize,
    pub failed: usize,
}

/// A sidecar with no matching video file next to it.
///
/// The file name is kept as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingVideo {
    pub directory: PathBuf,
    pub file_name: String,
}

/// Video file stems and Blu-ray presence for one directory.
#[derive(Debug, Default)]
struct DirectoryListing {
    video_stems: HashSet<String>,
    has_bluray: bool,
}

impl SidecarWalker {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Sidecar paths in traversal order.
    ///
    /// Unreadable entries are reported as warnings and skipped.
    pub fn paths(self) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !crate::is_hidden(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(error) => {
                    print_warning!("Skipping unreadable path: {error}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| is_sidecar(path))
    }
}

/// Check if path is a sidecar file, excluding the Blu-ray `BDMV/index.nfo`.
#[must_use]
pub fn is_sidecar(path: &Path) -> bool {
    if path.extension().is_none_or(|extension| extension != SIDECAR_EXTENSION) {
        return false;
    }
    let is_bluray_index = path.file_name().is_some_and(|name| name == BLURAY_INDEX)
        && path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name == BLURAY_DIR);
    !is_bluray_index
}

/// Read every sidecar under the given roots into the index.
///
/// Files are parsed in parallel but recorded in traversal order.
/// Unreadable files are reported as errors and unparsable ones as warnings.
/// Both are counted as failed and skipped.
pub fn load_index(roots: &[PathBuf], index: &mut IdentityIndex) -> LoadStats {
    let paths: Vec<PathBuf> = roots
        .iter()
        .flat_map(|root| SidecarWalker::new(root.as_path()).paths())
        .collect();

    #[cfg(test)]
    let progress_bar = ProgressBar::hidden();
    #[cfg(not(test))]
    let progress_bar = {
        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_BAR_TEMPLATE)
                .expect("Failed to set progress bar template")
                .progress_chars(PROGRESS_BAR_CHARS),
        );
        pb
    };

    let results: Vec<Result<MetadataRecord, ReadError>> = paths
        .par_iter()
        .progress_with(progress_bar.clone())
        .map(|path| read_metadata(path))
        .collect();
    progress_bar.finish_and_clear();

    let mut stats = LoadStats {
        sidecars: paths.len(),
        ..LoadStats::default()
    };
    for result in results {
        match result {
            Ok(record) => {
                if index.record(record) {
                    stats.indexed += 1;
                } else {
                    stats.without_identifier += 1;
                }
            }
            Err(error @ ReadError::NotFound { .. }) => {
                print_error!("{error}");
                stats.failed += 1;
            }
            Err(error) => {
                print_warning!("{error}");
                stats.failed += 1;
            }
        }
    }
    stats
}

/// Find sidecars that have no video file with the same name in their directory.
///
/// Directories containing a Blu-ray `BDMV` folder are accepted as having a video.
/// Extensions are compared case-insensitively and without the leading dot.
pub fn find_missing_videos(root: &Path, video_extensions: &[String]) -> Vec<MissingVideo> {
    let extensions: HashSet<String> = video_extensions
        .iter()
        .map(|extension| extension.trim_start_matches('.').to_lowercase())
        .collect();
    let mut listings: HashMap<PathBuf, Option<DirectoryListing>> = HashMap::new();
    let mut missing = Vec::new();

    for path in SidecarWalker::new(root).paths() {
        let Some(directory) = path.parent() else {
            continue;
        };
        let listing = listings
            .entry(directory.to_path_buf())
            .or_insert_with(|| list_directory(directory, &extensions));
        let Some(listing) = listing else {
            continue;
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if listing.video_stems.contains(sidecar_stem(&file_name)) || listing.has_bluray {
            continue;
        }
        missing.push(MissingVideo {
            directory: directory.to_path_buf(),
            file_name,
        });
    }
    missing
}

fn list_directory(directory: &Path, extensions: &HashSet<String>) -> Option<DirectoryListing> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) => {
            print_warning!("Failed to read directory {}: {error}", directory.display());
            return None;
        }
    };

    let mut listing = DirectoryListing::default();
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if entry.file_type().is_ok_and(|file_type| file_type.is_dir()) {
            if entry.file_name() == BLURAY_DIR {
                listing.has_bluray = true;
            }
            continue;
        }
        if extensions.contains(&crate::path_to_file_extension_string(&path)) {
            if let Some(stem) = path.file_stem() {
                listing.video_stems.insert(stem.to_string_lossy().into_owned());
            }
        }
    }
    Some(listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    use crate::nfo::IdentifierKind;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, content).expect("write file");
    }

    fn nfo(imdb_id: &str) -> String {
        format!("<movie><title>Test</title><imdbid>{imdb_id}</imdbid></movie>")
    }

    fn default_extensions() -> Vec<String> {
        DEFAULT_VIDEO_EXTENSIONS.iter().map(|&s| s.to_string()).collect()
    }

    #[test]
    fn walker_finds_nested_sidecars() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Alien (1979)/Alien (1979).nfo"), "");
        write(&dir.path().join("Alien (1979)/Alien (1979).mkv"), "");
        write(&dir.path().join("a/b/c/Deep.nfo"), "");
        write(&dir.path().join("notes.txt"), "");

        let paths: Vec<PathBuf> = SidecarWalker::new(dir.path()).paths().collect();
        assert_eq!(
            paths,
            vec![
                dir.path().join("Alien (1979)/Alien (1979).nfo"),
                dir.path().join("a/b/c/Deep.nfo")
            ]
        );
    }

    #[test]
    fn walker_skips_bluray_index_and_hidden_dirs() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Alien (1979)/BDMV/index.nfo"), "");
        write(&dir.path().join("Alien (1979)/index.nfo"), "");
        write(&dir.path().join(".trash/Alien.nfo"), "");

        let paths: Vec<PathBuf> = SidecarWalker::new(dir.path()).paths().collect();
        assert_eq!(paths, vec![dir.path().join("Alien (1979)/index.nfo")]);
    }

    #[test]
    fn is_sidecar_requires_exact_extension() {
        assert!(is_sidecar(Path::new("/movies/Alien.nfo")));
        assert!(!is_sidecar(Path::new("/movies/Alien.NFO")));
        assert!(!is_sidecar(Path::new("/movies/Alien.mkv")));
        assert!(!is_sidecar(Path::new("/movies/BDMV/index.nfo")));
    }

    #[test]
    fn load_index_records_and_counts() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Alien/Alien.nfo"), &nfo("tt0078748"));
        write(&dir.path().join("Alien (1979)/Alien (1979).nfo"), &nfo("tt0078748"));
        write(&dir.path().join("Home/Home.nfo"), "<movie><title>Home</title></movie>");
        write(&dir.path().join("Broken/Broken.nfo"), "not xml at all");

        let mut index = IdentityIndex::new();
        let stats = load_index(&[dir.path().to_path_buf()], &mut index);

        assert_eq!(
            stats,
            LoadStats {
                sidecars: 4,
                indexed: 2,
                without_identifier: 1,
                failed: 1,
            }
        );
        let group = index.get(IdentifierKind::Imdb, "tt0078748").expect("group");
        assert_eq!(group.records()[0].source_path(), dir.path().join("Alien/Alien.nfo"));
        assert_eq!(
            group.records()[1].source_path(),
            dir.path().join("Alien (1979)/Alien (1979).nfo")
        );
    }

    #[test]
    fn load_index_merges_multiple_roots() {
        let movies = tempdir().expect("tempdir");
        let mpgs = tempdir().expect("tempdir");
        write(&movies.path().join("Alien (1979)/Alien (1979).nfo"), &nfo("tt0078748"));
        write(&mpgs.path().join("Alien (1979)/Alien (1979).nfo"), &nfo("tt0078748"));

        let mut index = IdentityIndex::new();
        load_index(&[movies.path().to_path_buf(), mpgs.path().to_path_buf()], &mut index);
        assert_eq!(index.groups(IdentifierKind::Imdb).len(), 1);
    }

    #[test]
    fn missing_video_is_reported() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Alien (1979)/Alien (1979).nfo"), "");
        write(&dir.path().join("Alien (1979)/Alien.1979.mkv"), "");

        let missing = find_missing_videos(dir.path(), &default_extensions());
        assert_eq!(
            missing,
            vec![MissingVideo {
                directory: dir.path().join("Alien (1979)"),
                file_name: "Alien (1979).nfo".to_string(),
            }]
        );
    }

    #[test]
    fn matching_video_is_accepted() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Alien (1979)/Alien (1979) - 4K.nfo"), "");
        write(&dir.path().join("Alien (1979)/Alien (1979) - 4K.MKV"), "");
        write(&dir.path().join("Aliens (1986)/Aliens (1986).nfo"), "");
        write(&dir.path().join("Aliens (1986)/Aliens (1986).dvr-ms"), "");

        assert!(find_missing_videos(dir.path(), &default_extensions()).is_empty());
    }

    #[test]
    fn bluray_folder_is_accepted() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Alien (1979)/Alien (1979).nfo"), "");
        write(&dir.path().join("Alien (1979)/BDMV/index.bdmv"), "");

        assert!(find_missing_videos(dir.path(), &default_extensions()).is_empty());
    }

    #[test]
    fn missing_video_keeps_decomposed_file_name() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Ame\u{301}lie (2001)/Ame\u{301}lie (2001).nfo"), "");

        let missing = find_missing_videos(dir.path(), &default_extensions());
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].file_name, "Ame\u{301}lie (2001).nfo");
        assert!(missing[0].directory.join(&missing[0].file_name).exists());
    }

    #[test]
    fn custom_extensions_are_normalized() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Alien (1979)/Alien (1979).nfo"), "");
        write(&dir.path().join("Alien (1979)/Alien (1979).webm"), "");

        assert!(find_missing_videos(dir.path(), &[".WEBM".to_string()]).is_empty());
        assert_eq!(find_missing_videos(dir.path(), &default_extensions()).len(), 1);
    }
}
