use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "singer-inspect", about = "Inspect captured Singer tap/target output")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count messages per type and records per stream
    Summary(SummaryArgs),
    /// Print the record payloads of one stream as NDJSON
    Records(RecordsArgs),
}

#[derive(Args, Clone, Debug)]
pub struct SummaryArgs {
    /// NDJSON file to read (`-` for stdin)
    #[arg(env = "SINGER_CAPTURE")]
    pub file: PathBuf,

    /// Fail if any message has an unknown type
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Clone, Debug)]
pub struct RecordsArgs {
    /// NDJSON file to read (`-` for stdin)
    #[arg(env = "SINGER_CAPTURE")]
    pub file: PathBuf,

    /// Stream whose records to print
    #[arg(long, short)]
    pub stream: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_selects_stdin() {
        let cli = Cli::try_parse_from(["singer-inspect", "summary", "-", "--strict"]).unwrap();
        match cli.command {
            Commands::Summary(args) => {
                assert_eq!(args.file, PathBuf::from("-"));
                assert!(args.strict);
            }
            Commands::Records(_) => panic!("expected summary"),
        }
    }

    #[test]
    fn capture_path_defaults_to_env() {
        // SAFETY: no other test in this binary reads or writes SINGER_CAPTURE.
        unsafe { std::env::set_var("SINGER_CAPTURE", "/tmp/capture.jsonl") };
        let cli = Cli::try_parse_from(["singer-inspect", "records", "--stream", "users"]).unwrap();
        unsafe { std::env::remove_var("SINGER_CAPTURE") };

        match cli.command {
            Commands::Records(args) => {
                assert_eq!(args.file, PathBuf::from("/tmp/capture.jsonl"));
                assert_eq!(args.stream, "users");
            }
            Commands::Summary(_) => panic!("expected records"),
        }
    }
}
