//! Render rename suggestions as shell commands for the user to review and paste.

use clap::ValueEnum;
use serde::Deserialize;

use crate::nfo::RenameSuggestion;

/// Shell syntax used for printed rename commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStyle {
    /// `PowerShell` one-liner using `Rename-Item`
    #[default]
    #[value(name = "powershell")]
    #[serde(rename = "powershell")]
    PowerShell,
    /// POSIX shell loop using `mv`
    Posix,
}

impl CommandStyle {
    /// Command renaming every file in the source directory whose name starts with the source stem.
    #[must_use]
    pub fn render(self, suggestion: &RenameSuggestion) -> String {
        let directory = crate::path_to_string(&suggestion.source_dir);
        match self {
            Self::PowerShell => {
                // Literal ' becomes '' inside single quoted strings
                let directory = powershell_quote(&directory);
                let filter = powershell_quote(&format!("{}*.*", suggestion.source_stem));
                let source = powershell_quote(&suggestion.source_stem);
                let target = powershell_quote(&suggestion.target_stem);
                format!(
                    "$loc = [Management.Automation.WildcardPattern]::Escape({directory}) ; cd $loc ; \
                     Get-ChildItem -Filter {filter} | Rename-Item -Newname {{ $_.Name -replace [regex]::escape({source}),{target}}}"
                )
            }
            Self::Posix => {
                let directory = posix_quote(&directory);
                let source = posix_quote(&suggestion.source_stem);
                let target = posix_quote(&suggestion.target_stem);
                format!(
                    "cd {directory} && for f in {source}*; do [ -e \"$f\" ] && mv -n -- \"$f\" {target}\"${{f#{source}}}\"; done"
                )
            }
        }
    }
}

fn powershell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn posix_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
