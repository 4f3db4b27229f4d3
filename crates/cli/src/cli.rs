use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Answer Korean questions about KBO statistics.
///
/// Configuration comes from the environment (and `.env`); set
/// `DUGOUT_PROFILE` to prefer `{PROFILE}_`-prefixed keys.
#[derive(Parser, Debug)]
#[command(name = "dugout", about = "KBO statistics question answering")]
pub struct CliArgs {
    /// Date that relative words like "내일" are counted from (YYYY-MM-DD)
    #[arg(long, env = "DUGOUT_REFERENCE_DATE", global = true)]
    pub reference_date: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer one question, or every stdin line when no question is given
    Ask {
        utterance: Option<String>,

        /// Print the resolved entities, intent and plan as JSON before the answer
        #[arg(long)]
        trace: bool,
    },

    /// Inspect or rebuild the entity catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// Rebuild from the seed and the store's player listing, then persist
    Rebuild,

    /// Print the persisted catalog
    Show {
        /// List every entry instead of counts only
        #[arg(long)]
        entries: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_takes_optional_utterance() {
        let args = CliArgs::parse_from(["dugout", "ask", "문동주 기록", "--trace"]);
        match args.command {
            Command::Ask { utterance, trace } => {
                assert_eq!(utterance.as_deref(), Some("문동주 기록"));
                assert!(trace);
            }
            other => panic!("unexpected {other:?}"),
        }

        let args = CliArgs::parse_from(["dugout", "ask"]);
        assert!(matches!(args.command, Command::Ask { utterance: None, trace: false }));
    }

    #[test]
    fn reference_date_parses() {
        let args = CliArgs::parse_from(["dugout", "--reference-date", "2025-09-22", "catalog", "show"]);
        assert_eq!(args.reference_date, NaiveDate::from_ymd_opt(2025, 9, 22));
        assert!(matches!(
            args.command,
            Command::Catalog { action: CatalogAction::Show { entries: false } }
        ));
    }
}
