//! Fuzzy alignment of a file name against its folder name.
//!
//! Folder names are treated as the curated title, for example `Alien (1979)`,
//! while file names carry the same title in arbitrary release formatting
//! followed by the part that tells versions apart: `Alien.1979.Director.Cut`.
//! The aligner walks the letters and digits of the folder name through the file name
//! and returns whatever is left after the last matched character as the version tag.

use unicode_normalization::UnicodeNormalization;

/// Release group prefixes removed from file names before alignment.
pub const DEFAULT_JUNK_PREFIXES: &[&str] = &["TwoDDL_", "HDPOPCORNS", "[snahp.it]]", "jauto_"];

/// Site tags removed from the end of a version tag.
pub const DEFAULT_JUNK_SUFFIXES: &[&str] = &["www.tuserie.com", "_snahp.it"];

/// Computes version tags for renaming files to `"<folder name> - <version tag>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameAligner {
    junk_prefixes: Vec<String>,
    junk_suffixes: Vec<String>,
}

impl Default for FilenameAligner {
    fn default() -> Self {
        Self::new(
            DEFAULT_JUNK_PREFIXES.iter().map(|&s| s.to_string()).collect(),
            DEFAULT_JUNK_SUFFIXES.iter().map(|&s| s.to_string()).collect(),
        )
    }
}

impl FilenameAligner {
    /// Create an aligner with the given literal junk prefixes and suffixes.
    ///
    /// Prefixes are removed at most once each, in list order.
    /// Suffixes are removed repeatedly together with trailing periods.
    #[must_use]
    pub const fn new(junk_prefixes: Vec<String>, junk_suffixes: Vec<String>) -> Self {
        Self {
            junk_prefixes,
            junk_suffixes,
        }
    }

    /// Derive the version tag of `file_stem` relative to `folder_name`.
    ///
    /// The file stem must not contain the extension.
    /// Both names are compared in Unicode NFC form.
    /// If the folder name consumes the whole file name,
    /// the full file name is used as the tag.
    ///
    /// ```rust
    /// use nfo_dupes::nfo::FilenameAligner;
    ///
    /// let aligner = FilenameAligner::default();
    /// assert_eq!(aligner.version_tag("Alien.1979.Director.Cut", "Alien (1979)"), "Director.Cut");
    /// assert_eq!(aligner.version_tag("TwoDDL_xyz-release", "Alien (1979)"), "xyz-release");
    /// ```
    #[must_use]
    pub fn version_tag(&self, file_stem: &str, folder_name: &str) -> String {
        let file_stem: String = file_stem.nfc().collect();
        let folder_name: String = folder_name.nfc().collect();
        let filename = self.strip_junk_prefixes(&file_stem);
        let file_chars: Vec<char> = filename.chars().collect();
        let file_cursor = align(&folder_name, &file_chars);

        let tag = if file_cursor == file_chars.len() {
            filename.to_string()
        } else {
            file_chars[file_cursor..]
                .iter()
                .skip_while(|&&c| is_separator(c))
                .collect()
        };

        self.strip_junk_suffixes(&tag).to_string()
    }

    fn strip_junk_prefixes<'a>(&self, name: &'a str) -> &'a str {
        self.junk_prefixes
            .iter()
            .fold(name, |name, prefix| name.strip_prefix(prefix.as_str()).unwrap_or(name))
    }

    /// Strip junk suffixes and trailing periods until the tag no longer changes.
    fn strip_junk_suffixes<'a>(&self, mut tag: &'a str) -> &'a str {
        loop {
            let stripped = self
                .junk_suffixes
                .iter()
                .fold(tag, |tag, suffix| tag.strip_suffix(suffix.as_str()).unwrap_or(tag));
            let stripped = stripped.strip_suffix('.').unwrap_or(stripped);
            if stripped.len() == tag.len() {
                return tag;
            }
            tag = stripped;
        }
    }
}

/// Greedy single pass alignment of the folder name skeleton over the file name.
///
/// Returns the position in `file` after the last consumed character.
/// Characters in the file name that do not match are skipped over,
/// and the walk stops as soon as the file name runs out.
fn align(folder_name: &str, file: &[char]) -> usize {
    let mut file_cursor = 0;
    for folder_char in folder_name.chars().filter(|&c| is_alphanumeric(c)) {
        while file_cursor < file.len() && !chars_match(folder_char, file[file_cursor]) {
            file_cursor += 1;
        }
        if file_cursor == file.len() {
            break;
        }
        file_cursor += 1;
    }
    file_cursor
}

fn is_alphanumeric(c: char) -> bool {
    c.is_alphabetic() || c.is_numeric()
}

/// Leftover punctuation between the title and the version tag.
/// Opening braces start a tag like `{edition-Extended}` or `(Unrated)`.
fn is_separator(c: char) -> bool {
    !is_alphanumeric(c) && c != '{' && c != '('
}

/// Digits only match the same digit, letters match case-insensitively.
fn chars_match(a: char, b: char) -> bool {
    if a.is_numeric() && b.is_numeric() {
        return a == b;
    }
    if a.is_alphabetic() && b.is_alphabetic() {
        return a.to_lowercase().eq(b.to_lowercase());
    }
    false
}
