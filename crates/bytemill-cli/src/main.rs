//! # `bytemill` CLI

mod commands;

use clap::Parser;

/// Byte-level BPE tokenizer training and inspection.
#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Silence all log output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Raise log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Timestamp log lines.
    #[arg(long, global = true)]
    timestamps: bool,

    #[command(subcommand)]
    command: commands::Commands,
}

impl Cli {
    /// Training progress reports at info by default; `-v` raises the level
    /// toward trace.
    fn setup_logging(&self) -> Result<(), log::SetLoggerError> {
        let verbosity = match self.verbose {
            0 => stderrlog::LogLevelNum::Info,
            1 => stderrlog::LogLevelNum::Debug,
            _ => stderrlog::LogLevelNum::Trace,
        };

        stderrlog::new()
            .quiet(self.quiet)
            .verbosity(verbosity)
            .timestamp(if self.timestamps {
                stderrlog::Timestamp::Second
            } else {
                stderrlog::Timestamp::Off
            })
            .init()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    cli.setup_logging()?;
    cli.command.run()
}
