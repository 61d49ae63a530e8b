use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Inkwell: an AI-powered assistant for a shared recruitment inbox.
/// Starts an interactive session by default, or runs a single turn non-interactively.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase message verbosity.
    ///
    /// Specify multiple times for more verbose output:
    ///  -v:  INFO level
    ///  -vv: DEBUG level
    ///  -vvv: TRACE level (most verbose)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Run a single turn non-interactively and print the reply.
    #[arg(short, long)]
    pub turn: Option<String>,

    /// Path to an Inkwell.toml. Defaults to searching upward from the current directory.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draft and send a rejection letter for every row of a CSV file.
    ///
    /// The file needs a header row with `first_name`, `email` and `feedback` columns.
    Batch {
        /// CSV file with one applicant per row.
        file: PathBuf,

        /// Subject line used for every letter.
        #[arg(short, long, default_value = "Your application")]
        subject: String,

        /// Draft the letters and print them without sending anything.
        #[arg(long)]
        dry_run: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_batch_subcommand() {
        let cli = Cli::parse_from([
            "inkwell",
            "-vv",
            "batch",
            "applicants.csv",
            "--subject",
            "Thanks for applying",
            "--dry-run",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Batch {
                file,
                subject,
                dry_run,
            }) => {
                assert_eq!(file, PathBuf::from("applicants.csv"));
                assert_eq!(subject, "Thanks for applying");
                assert!(dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_single_turn() {
        let cli = Cli::parse_from(["inkwell", "--turn", "list my last 5 emails"]);
        assert_eq!(cli.turn.as_deref(), Some("list my last 5 emails"));
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }
}
