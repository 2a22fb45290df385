use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use nfo_dupes::nfo::{
    FindingKind, IdentifierKind, IdentityIndex, LoadStats, MissingVideo, Report, build_report, find_missing_videos,
    load_index,
};

use crate::Args;
use crate::config::{Config, NfoDupesConfig};

pub struct NfoDupes {
    config: Config,
    roots: Vec<PathBuf>,
}

/// Everything found in one run.
#[derive(Debug, Default, Serialize)]
struct ScanResult {
    roots: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_videos: Option<Vec<MissingVideo>>,
    stats: LoadStats,
    report: Report,
}

impl NfoDupes {
    pub fn new(args: Args) -> anyhow::Result<Self> {
        let user_config = NfoDupesConfig::get_user_config()?;
        let roots = resolve_roots(&args, &user_config)?;
        let config = Config::from_args_and_user_config(args, user_config);
        Ok(Self { config, roots })
    }

    pub fn run(&self) -> anyhow::Result<()> {
        if self.config.verbose && !self.config.json {
            let paths_display = self
                .roots
                .iter()
                .map(|path| nfo_dupes::path_to_string(path))
                .collect::<Vec<_>>()
                .join(", ");
            println!("Scanning paths: {}", paths_display.magenta());
            if self.config.missing {
                println!("Video extensions: {:?}", self.config.video_extensions);
            }
        }

        let result = self.scan();

        if self.config.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            self.print_result(&result);
        }
        Ok(())
    }

    fn scan(&self) -> ScanResult {
        let missing_videos = self.config.missing.then(|| {
            self.roots
                .iter()
                .flat_map(|root| {
                    if !self.config.json {
                        println!("Checking for dirs with no video at {}", nfo_dupes::path_to_string(root));
                    }
                    find_missing_videos(root, &self.config.video_extensions)
                })
                .collect::<Vec<_>>()
        });

        if !self.config.json {
            for root in &self.roots {
                println!("Loading data from {}", nfo_dupes::path_to_string(root));
            }
        }
        let mut index = IdentityIndex::new();
        let stats = load_index(&self.roots, &mut index);
        let report = build_report(&index, &self.config.aligner);

        ScanResult {
            roots: self.roots.clone(),
            missing_videos,
            stats,
            report,
        }
    }

    fn print_result(&self, result: &ScanResult) {
        if let Some(missing_videos) = &result.missing_videos {
            for missing in missing_videos {
                println!(
                    "{}  {}",
                    nfo_dupes::path_to_string(&missing.directory),
                    missing.file_name.yellow()
                );
            }
        }

        if self.config.verbose {
            let stats = &result.stats;
            println!(
                "Read {} NFO files: {} with id, {} without id, {} failed",
                stats.sidecars, stats.indexed, stats.without_identifier, stats.failed
            );
        }

        for kind in IdentifierKind::ALL {
            println!("{}", format!("\nDupes by {kind} id:").bold());
            for finding in result
                .report
                .findings
                .iter()
                .filter(|finding| finding.identifier_kind == kind)
            {
                match &finding.kind {
                    FindingKind::CrossFolder { paths } => {
                        println!("{} {}", "Multi folder Dupe:".yellow(), finding.title.cyan());
                        for path in paths {
                            println!(" {}", nfo_dupes::path_to_string(path));
                        }
                    }
                    FindingKind::BadMultiVersion {
                        non_conforming,
                        suggestions,
                        ..
                    } => {
                        println!("{} {}", "Bad Multi-Version content:".yellow(), finding.title.cyan());
                        for path in non_conforming {
                            println!(" {}", nfo_dupes::path_to_string(path));
                        }
                        if suggestions.is_empty() {
                            continue;
                        }
                        println!("Suggested renames:");
                        for suggestion in suggestions {
                            if self.config.verbose {
                                nfo_dupes::show_diff(&suggestion.source_file_name(), &suggestion.target_file_name());
                            }
                            println!("{}", self.config.style.render(suggestion));
                        }
                    }
                }
            }
        }

        let report = &result.report;
        if report.is_empty() {
            println!("{}", "\nNo duplicates found".green());
        } else {
            println!(
                "{}",
                format!(
                    "\nFound {} multi folder dupes and {} badly named multi-version groups",
                    report.cross_folder().count(),
                    report.bad_multi_version().count()
                )
                .yellow()
                .bold()
            );
        }
    }
}

/// Resolve all input paths.
///
/// CLI args take priority, then default paths from config if the default flag is set,
/// then paths from config, and finally the current directory.
fn resolve_roots(args: &Args, user_config: &NfoDupesConfig) -> anyhow::Result<Vec<PathBuf>> {
    let paths = if !args.paths.is_empty() {
        &args.paths
    } else if args.default && !user_config.default_paths.is_empty() {
        &user_config.default_paths
    } else if !user_config.paths.is_empty() {
        &user_config.paths
    } else {
        return Ok(vec![nfo_dupes::resolve_input_path(None)?]);
    };

    paths
        .iter()
        .map(|path| nfo_dupes::resolve_input_path(Some(path)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::path::Path;

    use clap::Parser;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, content).expect("write file");
    }

    fn nfo(title: &str, imdb_id: &str) -> String {
        format!("<movie><title>{title}</title><year>1979</year><imdbid>{imdb_id}</imdbid></movie>")
    }

    fn finder(args: &[&str], roots: Vec<PathBuf>) -> NfoDupes {
        let args = Args::try_parse_from(args).expect("should parse");
        NfoDupes {
            config: Config::from_args_and_user_config(args, NfoDupesConfig::default()),
            roots,
        }
    }

    #[test]
    fn cli_paths_take_priority() {
        let cli = tempdir().expect("tempdir");
        let configured = tempdir().expect("tempdir");
        let path = nfo_dupes::path_to_string(cli.path());
        let args = Args::try_parse_from(["test", "-d", path.as_str()]).expect("should parse");
        let user_config = NfoDupesConfig::from_toml_str(&format!(
            "[nfodupes]\ndefault_paths = ['{}']",
            nfo_dupes::path_to_string(configured.path())
        ))
        .expect("should parse");

        let roots = resolve_roots(&args, &user_config).expect("should resolve");
        assert_eq!(roots, vec![dunce::canonicalize(cli.path()).expect("canonicalize")]);
    }

    #[test]
    fn default_paths_used_with_flag() {
        let default_dir = tempdir().expect("tempdir");
        let other_dir = tempdir().expect("tempdir");
        let user_config = NfoDupesConfig::from_toml_str(&format!(
            "[nfodupes]\ndefault_paths = ['{}']\npaths = ['{}']",
            nfo_dupes::path_to_string(default_dir.path()),
            nfo_dupes::path_to_string(other_dir.path())
        ))
        .expect("should parse");

        let args = Args::try_parse_from(["test", "-d"]).expect("should parse");
        let roots = resolve_roots(&args, &user_config).expect("should resolve");
        assert_eq!(roots, vec![dunce::canonicalize(default_dir.path()).expect("canonicalize")]);

        let args = Args::try_parse_from(["test"]).expect("should parse");
        let roots = resolve_roots(&args, &user_config).expect("should resolve");
        assert_eq!(roots, vec![dunce::canonicalize(other_dir.path()).expect("canonicalize")]);
    }

    #[test]
    fn missing_cli_path_is_an_error() {
        let args = Args::try_parse_from(["test", "/this/path/does/not/exist"]).expect("should parse");
        assert!(resolve_roots(&args, &NfoDupesConfig::default()).is_err());
    }

    #[test]
    fn scan_finds_duplicates_and_missing_videos() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Alien/Alien.nfo"), &nfo("Alien", "tt0078748"));
        write(&dir.path().join("Alien/Alien.mkv"), "");
        write(&dir.path().join("Alien (1979)/Alien (1979).nfo"), &nfo("Alien", "tt0078748"));
        write(
            &dir.path().join("Aliens (1986)/Aliens (1986) - Theatrical.nfo"),
            &nfo("Aliens", "tt0090605"),
        );
        write(
            &dir.path().join("Aliens (1986)/Aliens.1986.Special.Edition.nfo"),
            &nfo("Aliens", "tt0090605"),
        );

        let result = finder(&["test", "-m", "-j"], vec![dir.path().to_path_buf()]).scan();

        assert_eq!(result.stats.sidecars, 4);
        assert_eq!(result.stats.indexed, 4);
        assert_eq!(result.report.cross_folder().count(), 1);
        assert_eq!(result.report.bad_multi_version().count(), 1);
        let suggestion = result.report.suggestions().next().expect("suggestion");
        assert_eq!(suggestion.target_stem, "Aliens (1986) - Special.Edition");
        assert_eq!(result.missing_videos.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn scan_skips_missing_check_by_default() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Alien/Alien.nfo"), &nfo("Alien", "tt0078748"));

        let result = finder(&["test", "-j"], vec![dir.path().to_path_buf()]).scan();
        assert!(result.missing_videos.is_none());
        assert!(result.report.is_empty());
    }

    #[test]
    fn result_serializes_to_json() {
        let dir = tempdir().expect("tempdir");
        write(&dir.path().join("Alien/Alien.nfo"), &nfo("Alien", "tt0078748"));
        write(&dir.path().join("Alien (1979)/Alien (1979).nfo"), &nfo("Alien", "tt0078748"));

        let result = finder(&["test", "-j"], vec![dir.path().to_path_buf()]).scan();
        let json = serde_json::to_value(&result).expect("should serialize");
        assert_eq!(json["stats"]["indexed"], 2);
        assert_eq!(json["report"]["findings"][0]["layout"], "cross_folder");
        assert!(json.get("missing_videos").is_none());
    }
}
