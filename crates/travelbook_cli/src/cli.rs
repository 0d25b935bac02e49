//! CLI argument definitions for the travelbook binary.
//!
//! Priority resolution: CLI args > env vars > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use travelbook_core::Collection;

/// travelbook: inspect and maintain the local record store.
#[derive(Parser, Debug)]
#[command(name = "travelbook", version, about)]
pub struct CliArgs {
    /// Data directory holding the SQLite file and the flat fallback.
    #[arg(short = 'd', long = "data-dir", env = "TRAVELBOOK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Skip SQLite and use the flat fallback store.
    #[arg(long = "fallback")]
    pub fallback: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the number of records in a collection.
    Count {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
    },
    /// Print every record of a collection, one JSON document per line.
    List {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
    },
    /// Insert one JSON record.
    Add {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
        /// Record as a JSON object; an empty or missing `id` is generated.
        record: String,
    },
    /// Delete a record by id.
    Delete {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
        id: String,
    },
    /// Write a snapshot of every collection.
    Export {
        /// Output file; stdout when omitted.
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },
    /// Load a snapshot file into the store.
    Import {
        file: PathBuf,
        /// Clear each collection in the snapshot before inserting.
        #[arg(long = "replace")]
        replace: bool,
    },
    /// Run one expiry scan now.
    Scan,
    /// Run the expiry scheduler until interrupted.
    Watch {
        /// Seconds between scans.
        #[arg(long = "interval-secs", default_value_t = 3600)]
        interval_secs: u64,
    },
}

impl CliArgs {
    /// Resolve the data directory.
    ///
    /// Priority: --data-dir flag > TRAVELBOOK_DATA_DIR > `<temp>/travelbook`.
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("travelbook"))
    }

    /// Resolve the log level, defaulting to the build profile's level.
    pub fn resolve_log_level(&self) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| travelbook_core::default_log_level().to_string())
    }
}

fn parse_collection(raw: &str) -> Result<Collection, String> {
    Collection::parse(raw.trim()).ok_or_else(|| {
        let names: Vec<&str> = Collection::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown collection `{raw}`; expected one of {}", names.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_count_subcommand() {
        let args = CliArgs::try_parse_from(["travelbook", "count", "visas"]).unwrap();
        assert_eq!(
            args.command,
            Command::Count {
                collection: Collection::Visas
            }
        );
        assert!(!args.fallback);
    }

    #[test]
    fn rejects_unknown_collection() {
        let err = CliArgs::try_parse_from(["travelbook", "list", "passports"]).unwrap_err();
        assert!(err.to_string().contains("unknown collection"));
    }

    #[test]
    fn data_dir_flag_wins() {
        let args =
            CliArgs::try_parse_from(["travelbook", "-d", "/srv/travelbook", "scan"]).unwrap();
        assert_eq!(args.resolve_data_dir(), PathBuf::from("/srv/travelbook"));
    }

    #[test]
    fn import_replace_flag() {
        let args =
            CliArgs::try_parse_from(["travelbook", "import", "backup.json", "--replace"]).unwrap();
        assert_eq!(
            args.command,
            Command::Import {
                file: PathBuf::from("backup.json"),
                replace: true
            }
        );
    }

    #[test]
    fn watch_interval_defaults_to_one_hour() {
        let args = CliArgs::try_parse_from(["travelbook", "watch"]).unwrap();
        assert_eq!(args.command, Command::Watch { interval_secs: 3600 });
    }
}
