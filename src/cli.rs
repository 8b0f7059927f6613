//! This module contains the command-line interface [`Cli`] parser for serving and managing student
//! attendance records.

use clap::{ArgAction, Parser, Subcommand};

use crate::settings::DEFAULT_CONFIG_FILE;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(version, about = "Record and report student attendance")]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// The different commands available for managing student attendance records.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the web application.
    Serve {
        /// Address to listen on, overriding the configured `bind_addr`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Show the roster.
    Roster {
        /// Include every column, not just roll number, name and section.
        #[arg(long)]
        full: bool,
    },

    /// Add a new student to the roster.
    AddStudent {
        #[arg(long)]
        roll_no: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        section: String,
    },

    /// Remove a student, and all of their attendance, from the roster.
    RemoveStudent { id: i32 },

    /// Mark attendance for a date: the listed students are present, everyone else is absent.
    Mark {
        /// The date, as YYYY-MM-DD.
        #[arg(long)]
        date: String,

        /// IDs of the students who were present.
        present: Vec<i32>,
    },

    /// Show attendance records, optionally filtered by date and section.
    Show {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        section: Option<String>,
    },

    /// Export every attendance record to an Excel workbook.
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_mark() {
        let cli = Cli::try_parse_from(["attendance", "-v", "mark", "--date", "2025-01-15", "3", "7"])
            .unwrap();

        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.config, DEFAULT_CONFIG_FILE);
        match cli.command {
            Command::Mark { date, present } => {
                assert_eq!(date, "2025-01-15");
                assert_eq!(present, [3, 7]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_show_without_filters() {
        let cli = Cli::try_parse_from(["attendance", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Show {
                date: None,
                section: None
            }
        ));
    }
}
