//! Reading NFO sidecar files into metadata records.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use regex::{Captures, Regex};
use serde::Serialize;
use thiserror::Error;

/// File extension of metadata sidecar files.
pub const SIDECAR_EXTENSION: &str = "nfo";

/// Markup that can precede the root element: XML declaration, processing instructions,
/// comments and doctype.
static RE_PROLOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\?.*?\?>|<!--.*?-->|<!DOCTYPE[^>]*>").expect("Invalid prolog regex"));

/// First start tag in the document.
static RE_ROOT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z_][\w.:-]*)(?:\s[^>]*?)?(/?)>").expect("Invalid root element regex"));

/// Encoding label from the XML declaration.
static RE_DECLARED_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<\?xml[^>]*encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).expect("Invalid encoding regex")
});

static RE_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("Invalid entity regex"));

static RE_CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("Invalid CDATA regex"));

/// Kodi style `<uniqueid type="imdb">` element.
static RE_UNIQUE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<uniqueid\s[^>]*?type\s*=\s*["'](imdb|tmdb)["'][^>]*>(.*?)</uniqueid\s*>"#)
        .expect("Invalid uniqueid regex")
});

static RE_TITLE: LazyLock<Regex> = LazyLock::new(|| element_regex("title"));
static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| element_regex("year"));
static RE_ORIGINAL_TITLE: LazyLock<Regex> = LazyLock::new(|| element_regex("originaltitle"));
static RE_DATE_ADDED: LazyLock<Regex> = LazyLock::new(|| element_regex("dateadded"));
static RE_IMDB_ID: LazyLock<Regex> = LazyLock::new(|| element_regex("imdbid"));
static RE_TMDB_ID: LazyLock<Regex> = LazyLock::new(|| element_regex("tmdbid"));

/// External database identifier of a title.
///
/// IMDB takes precedence: a record with an IMDB id is never identified by its TMDB id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ExternalId {
    #[default]
    None,
    Imdb(String),
    Tmdb(String),
}

/// Raw field values read from a sidecar, before the identifier is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFields {
    pub title: String,
    pub year: String,
    pub original_title: String,
    pub date_added: String,
    pub imdb_id: String,
    pub tmdb_id: String,
}

/// One parsed sidecar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    title: String,
    year: String,
    original_title: String,
    date_added: String,
    external_id: ExternalId,
    source_path: PathBuf,
}

/// Failure to turn a sidecar file into a [`MetadataRecord`].
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Unable to read {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to parse file content as xml {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl ExternalId {
    /// Resolve the identifier from raw IMDB and TMDB values.
    #[must_use]
    pub fn from_ids(imdb_id: &str, tmdb_id: &str) -> Self {
        let imdb_id = imdb_id.trim();
        let tmdb_id = tmdb_id.trim();
        if !imdb_id.is_empty() {
            Self::Imdb(imdb_id.to_string())
        } else if !tmdb_id.is_empty() {
            Self::Tmdb(tmdb_id.to_string())
        } else {
            Self::None
        }
    }

    /// Identifier value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Imdb(value) | Self::Tmdb(value) => Some(value),
        }
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Imdb(value) => write!(f, "imdb:{value}"),
            Self::Tmdb(value) => write!(f, "tmdb:{value}"),
        }
    }
}

impl MetadataRecord {
    /// Create a record, resolving the external identifier once.
    #[must_use]
    pub fn new(fields: MetadataFields, source_path: PathBuf) -> Self {
        let external_id = ExternalId::from_ids(&fields.imdb_id, &fields.tmdb_id);
        Self {
            title: fields.title,
            year: fields.year,
            original_title: fields.original_title,
            date_added: fields.date_added,
            external_id,
            source_path,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn year(&self) -> &str {
        &self.year
    }

    #[must_use]
    pub fn original_title(&self) -> &str {
        &self.original_title
    }

    #[must_use]
    pub fn date_added(&self) -> &str {
        &self.date_added
    }

    #[must_use]
    pub const fn external_id(&self) -> &ExternalId {
        &self.external_id
    }

    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Sidecar file name including the extension, as stored on disk.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory containing the sidecar.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Title with year for display, for example `Alien (1979)`.
    #[must_use]
    pub fn display_title(&self) -> String {
        if self.year.is_empty() {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, self.year)
        }
    }
}

/// Remove the sidecar extension from a file name.
///
/// Names without the extension are returned unchanged.
#[must_use]
pub fn sidecar_stem(file_name: &str) -> &str {
    file_name
        .strip_suffix(SIDECAR_EXTENSION)
        .and_then(|name| name.strip_suffix('.'))
        .unwrap_or(file_name)
}

/// Read and parse a sidecar file.
///
/// # Errors
/// Returns [`ReadError::NotFound`] if the file can not be read,
/// and [`ReadError::Parse`] if the content is not an XML document.
pub fn read_metadata(path: &Path) -> Result<MetadataRecord, ReadError> {
    let bytes = fs::read(path).map_err(|source| ReadError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let content = decode_sidecar(&bytes);
    parse_metadata(&content, path.to_path_buf())
}

/// Parse sidecar content into a record.
///
/// Missing elements read as empty strings.
///
/// # Errors
/// Returns [`ReadError::Parse`] if the content has no root element or the root is never closed.
pub fn parse_metadata(content: &str, source_path: PathBuf) -> Result<MetadataRecord, ReadError> {
    let body = RE_PROLOG.replace_all(content, "");
    let Some(root) = RE_ROOT_ELEMENT.captures(&body) else {
        return Err(ReadError::Parse {
            path: source_path,
            reason: "no root element".to_string(),
        });
    };

    let root_name = &root[1];
    let self_closing = !root[2].is_empty();
    let root_end = root.get(0).map_or(0, |start_tag| start_tag.end());

    let inner = if self_closing {
        ""
    } else {
        let rest = &body[root_end..];
        let Some(end) = rest.rfind(&format!("</{root_name}")) else {
            return Err(ReadError::Parse {
                path: source_path,
                reason: format!("missing closing tag </{root_name}>"),
            });
        };
        &rest[..end]
    };

    let mut fields = MetadataFields {
        title: element_text(&RE_TITLE, inner),
        year: element_text(&RE_YEAR, inner),
        original_title: element_text(&RE_ORIGINAL_TITLE, inner),
        date_added: element_text(&RE_DATE_ADDED, inner),
        imdb_id: element_text(&RE_IMDB_ID, inner),
        tmdb_id: element_text(&RE_TMDB_ID, inner),
    };

    for unique_id in RE_UNIQUE_ID.captures_iter(inner) {
        let value = unescape(&unique_id[2]);
        let target = if unique_id[1].eq_ignore_ascii_case("imdb") {
            &mut fields.imdb_id
        } else {
            &mut fields.tmdb_id
        };
        if target.is_empty() {
            *target = value;
        }
    }

    Ok(MetadataRecord::new(fields, source_path))
}

/// Decode raw sidecar bytes to a string.
///
/// Uses the byte order mark if present, then the encoding declared in the XML header,
/// then UTF-8 with a Windows-1252 fallback for files with invalid UTF-8.
fn decode_sidecar(bytes: &[u8]) -> String {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return text.into_owned();
    }

    let header = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let declared = RE_DECLARED_ENCODING
        .captures(&header)
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
        .filter(|encoding| *encoding != UTF_8 && *encoding != UTF_16LE && *encoding != UTF_16BE);

    if let Some(encoding) = declared {
        let (text, _) = encoding.decode_without_bom_handling(bytes);
        return text.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    }
}

fn element_regex(name: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{name}(?:\s[^>]*)?>(.*?)</{name}\s*>")).expect("Invalid element regex")
}

/// Text content of the first matching element, unescaped and trimmed.
fn element_text(pattern: &Regex, content: &str) -> String {
    pattern
        .captures(content)
        .map(|caps| unescape(&caps[1]))
        .unwrap_or_default()
}

fn unescape(text: &str) -> String {
    let text = RE_CDATA.replace_all(text, "$1");
    RE_ENTITY
        .replace_all(&text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map_or_else(
                        || entity.strip_prefix('#').and_then(|dec| dec.parse::<u32>().ok()),
                        |hex| u32::from_str_radix(hex, 16).ok(),
                    )
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::File;
    use std::io::Write;

    use tempfile::tempdir;

    const ALIEN_NFO: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<movie>
  <title>Alien</title>
  <originaltitle>Alien</originaltitle>
  <year>1979</year>
  <dateadded>2021-03-04 18:22:01</dateadded>
  <imdbid>tt0078748</imdbid>
  <tmdbid>348</tmdbid>
</movie>
"#;

    fn parse(content: &str) -> Result<MetadataRecord, ReadError> {
        parse_metadata(content, PathBuf::from("/movies/Alien (1979)/Alien (1979).nfo"))
    }

    #[test]
    fn parses_all_fields() {
        let record = parse(ALIEN_NFO).expect("should parse");
        assert_eq!(record.title(), "Alien");
        assert_eq!(record.original_title(), "Alien");
        assert_eq!(record.year(), "1979");
        assert_eq!(record.date_added(), "2021-03-04 18:22:01");
        assert_eq!(record.external_id(), &ExternalId::Imdb("tt0078748".to_string()));
        assert_eq!(record.display_title(), "Alien (1979)");
        assert_eq!(record.file_name(), "Alien (1979).nfo");
        assert_eq!(record.directory(), Path::new("/movies/Alien (1979)"));
    }

    #[test]
    fn tmdb_is_fallback_when_imdb_missing() {
        let record = parse("<movie><title>Alien</title><tmdbid> 348 </tmdbid><imdbid></imdbid></movie>")
            .expect("should parse");
        assert_eq!(record.external_id(), &ExternalId::Tmdb("348".to_string()));
    }

    #[test]
    fn missing_identifiers_resolve_to_none() {
        let record = parse("<movie><title>Home video</title></movie>").expect("should parse");
        assert_eq!(record.external_id(), &ExternalId::None);
        assert!(record.year().is_empty());
        assert_eq!(record.display_title(), "Home video");
    }

    #[test]
    fn reads_kodi_unique_ids() {
        let content = r#"<movie>
  <title>Alien</title>
  <uniqueid type="tmdb">348</uniqueid>
  <uniqueid type="imdb" default="true">tt0078748</uniqueid>
</movie>"#;
        let record = parse(content).expect("should parse");
        assert_eq!(record.external_id(), &ExternalId::Imdb("tt0078748".to_string()));
    }

    #[test]
    fn explicit_imdbid_wins_over_unique_id() {
        let content = r#"<movie><imdbid>tt1</imdbid><uniqueid type="imdb">tt2</uniqueid></movie>"#;
        let record = parse(content).expect("should parse");
        assert_eq!(record.external_id(), &ExternalId::Imdb("tt1".to_string()));
    }

    #[test]
    fn unescapes_entities_and_cdata() {
        let content = "<movie><title>Fast &amp; Furious &#233;&#xE9;</title>\
                       <originaltitle><![CDATA[Tom & Jerry]]></originaltitle></movie>";
        let record = parse(content).expect("should parse");
        assert_eq!(record.title(), "Fast & Furious éé");
        assert_eq!(record.original_title(), "Tom & Jerry");
    }

    #[test]
    fn unknown_entities_are_kept() {
        let record = parse("<movie><title>A &nbsp; B</title></movie>").expect("should parse");
        assert_eq!(record.title(), "A &nbsp; B");
    }

    #[test]
    fn skips_comments_before_root() {
        let content = "<!-- created by some scraper --><movie><imdbid>tt42</imdbid></movie>";
        let record = parse(content).expect("should parse");
        assert_eq!(record.external_id().value(), Some("tt42"));
    }

    #[test]
    fn self_closing_root_is_empty_record() {
        let record = parse("<?xml version=\"1.0\"?><movie/>").expect("should parse");
        assert_eq!(record.external_id(), &ExternalId::None);
        assert!(record.title().is_empty());
    }

    #[test]
    fn plain_text_is_parse_failure() {
        let result = parse("https://www.imdb.com/title/tt0078748/");
        assert!(matches!(result, Err(ReadError::Parse { .. })));
    }

    #[test]
    fn unclosed_root_is_parse_failure() {
        let result = parse("<movie><title>Alien</title>");
        assert!(matches!(result, Err(ReadError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let result = read_metadata(&dir.path().join("missing.nfo"));
        assert!(matches!(result, Err(ReadError::NotFound { .. })));
    }

    #[test]
    fn reads_windows_1252_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("Amelie.nfo");
        let mut file = File::create(&path).expect("create");
        file.write_all(b"<movie><title>Am\xe9lie</title><imdbid>tt0211915</imdbid></movie>")
            .expect("write");

        let record = read_metadata(&path).expect("should read");
        assert_eq!(record.title(), "Amélie");
        assert_eq!(record.source_path(), path);
    }

    #[test]
    fn reads_utf16_file_with_bom() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("Alien.nfo");
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<movie><imdbid>tt0078748</imdbid></movie>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        fs::write(&path, bytes).expect("write");

        let record = read_metadata(&path).expect("should read");
        assert_eq!(record.external_id().value(), Some("tt0078748"));
    }

    #[test]
    fn honours_declared_encoding() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><movie><title>Le P\xe8re</title></movie>";
        let text = decode_sidecar(bytes);
        assert!(text.contains("Le Père"));
    }

    #[test]
    fn sidecar_stem_strips_extension() {
        assert_eq!(sidecar_stem("Alien.1979.Director.Cut.nfo"), "Alien.1979.Director.Cut");
        assert_eq!(sidecar_stem("Alien (1979)"), "Alien (1979)");
        assert_eq!(sidecar_stem("info"), "info");
    }

    #[test]
    fn external_id_display() {
        assert_eq!(ExternalId::Imdb("tt1".to_string()).to_string(), "imdb:tt1");
        assert_eq!(ExternalId::Tmdb("1".to_string()).to_string(), "tmdb:1");
        assert_eq!(ExternalId::None.to_string(), "none");
    }
}
