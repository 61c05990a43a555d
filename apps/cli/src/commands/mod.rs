//! Command line surface: argument parsing and one module per subcommand.

pub mod anki;
pub mod audio;
pub mod check;
pub mod mochi;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use vocab_core::{OrdinalPolicy, RowSource, SkillGrouper, SourceError, VocabularyRecord};

pub const DEFAULT_CSV: &str = "Duolingo Hebrew Vocab COMPLETE - Words.csv";
pub const DEFAULT_AUDIO_DIR: &str = "audio";
pub const DEFAULT_APKG: &str = "Hebrew_Vocabulary.apkg";
pub const DEFAULT_ANKI_DECK: &str = "Hebrew Duolingo 2023 🇮🇱";

#[derive(Parser, Debug)]
#[command(
    name = "hebcards",
    about = "Hebrew vocabulary flashcards: Mochi sync, Anki export and audio",
    version
)]
pub struct Cli {
    /// Vocabulary CSV file
    #[arg(long, global = true, default_value = DEFAULT_CSV)]
    pub csv: PathBuf,

    /// Directory holding <niqqud>.mp3 pronunciation files
    #[arg(long, global = true, default_value = DEFAULT_AUDIO_DIR)]
    pub audio_dir: PathBuf,

    /// What to do with a row whose skill has no valid ordinal yet
    #[arg(long, global = true, value_enum, default_value_t = PolicyArg::Strict)]
    pub ordinal_policy: PolicyArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Skip the row
    Strict,
    /// Reuse the last valid ordinal seen in the file
    CarryForward,
}

impl From<PolicyArg> for OrdinalPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Strict => OrdinalPolicy::Strict,
            PolicyArg::CarryForward => OrdinalPolicy::CarryForward,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sync the vocabulary into Mochi, creating only what is missing
    Mochi,

    /// Write an Anki package
    Anki {
        /// Output .apkg path
        #[arg(long, default_value = DEFAULT_APKG)]
        output: PathBuf,
        /// Top-level deck name
        #[arg(long, default_value = DEFAULT_ANKI_DECK)]
        deck_name: String,
        /// Stylesheet for the note model (built-in style if omitted)
        #[arg(long)]
        css: Option<PathBuf>,
    },

    /// Generate missing pronunciation audio with Google Text-to-Speech
    Audio {
        /// Attempts per word when rate limited
        #[arg(long, default_value_t = 5)]
        max_attempts: u32,
    },

    /// Report rows whose skill ordinal is not an integer
    Check,
}

/// Records read from the dataset, in source order.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<VocabularyRecord>,
    /// Rows dropped for undecodable content, an unusable ordinal or skill.
    pub rejected: usize,
}

/// Read and group the dataset. Only failing to open it is an error; bad rows
/// are logged and counted.
pub fn load_records(path: &Path, policy: OrdinalPolicy) -> Result<LoadedRecords, SourceError> {
    let source = RowSource::open(path)?;
    let mut grouper = SkillGrouper::new(policy);
    let mut loaded = LoadedRecords::default();

    for row in source {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Skipping unreadable row: {}", e);
                loaded.rejected += 1;
                continue;
            }
        };

        let (line, hebrew) = (row.line, row.hebrew.clone());
        match grouper.assign(row) {
            Ok(assigned) => {
                if assigned.carried_forward {
                    tracing::warn!(
                        "Row {} ({}): invalid ordinal, using {} from an earlier row",
                        line,
                        hebrew,
                        assigned.record.skill.ordinal
                    );
                }
                loaded.records.push(assigned.record);
            }
            Err(e) => {
                tracing::warn!("Skipping row {} ({}): {}", line, hebrew, e);
                loaded.rejected += 1;
            }
        }
    }

    tracing::info!(
        "Loaded {} records from {} ({} rejected)",
        loaded.records.len(),
        path.display(),
        loaded.rejected
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DATASET: &str = "\
#,Skill,Hebrew,Niqqud,Transliteration,Translation,Gender,Number,Form,Type
5,Food,לחם,לֶחֶם,lechem,bread,masculine,singular,,noun
bad,Food,מים,מַיִם,mayim,water,masculine,plural,,noun
bad,Family,אמא,אִמָּא,ima,mother,feminine,singular,,noun
";

    fn write_dataset(dir: &Path) -> PathBuf {
        let path = dir.join("words.csv");
        std::fs::write(&path, DATASET).unwrap();
        path
    }

    #[test]
    fn strict_policy_rejects_new_skill_without_ordinal() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_records(&write_dataset(dir.path()), OrdinalPolicy::Strict).unwrap();

        assert_eq!(loaded.rejected, 1);
        let ordinals: Vec<(&str, i64)> = loaded
            .records
            .iter()
            .map(|r| (r.translation.as_str(), r.skill.ordinal))
            .collect();
        assert_eq!(ordinals, vec![("bread", 5), ("water", 5)]);
    }

    #[test]
    fn carry_forward_keeps_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_records(&write_dataset(dir.path()), OrdinalPolicy::CarryForward).unwrap();

        assert_eq!(loaded.rejected, 0);
        assert_eq!(loaded.records[2].skill, vocab_core::SkillGroup::new(5, "Family"));
    }

    #[test]
    fn missing_dataset_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_records(&dir.path().join("nope.csv"), OrdinalPolicy::Strict);
        assert!(matches!(result, Err(SourceError::Io(_))));
    }

    #[test]
    fn policy_flag_values() {
        let cli =
            Cli::try_parse_from(["hebcards", "--ordinal-policy", "carry-forward", "check"])
                .unwrap();
        assert_eq!(OrdinalPolicy::from(cli.ordinal_policy), OrdinalPolicy::CarryForward);
        assert_eq!(cli.csv, PathBuf::from(DEFAULT_CSV));

        let cli = Cli::try_parse_from(["hebcards", "anki", "--css", "minimal.css"]).unwrap();
        assert_eq!(cli.ordinal_policy, PolicyArg::Strict);
        match cli.command {
            Command::Anki { output, deck_name, css } => {
                assert_eq!(output, PathBuf::from(DEFAULT_APKG));
                assert_eq!(deck_name, DEFAULT_ANKI_DECK);
                assert_eq!(css, Some(PathBuf::from("minimal.css")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
