mod longest_tokens;
mod train;

/// Subcommands for bytemill.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Train a BPE tokenizer and save vocab/merges to disk.
    Train(train::TrainArgs),

    /// Find the longest tokens in a vocab.json file.
    LongestTokens(longest_tokens::LongestTokensArgs),
}

impl Commands {
    /// Run the subcommand.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Commands::Train(cmd) => cmd.run(),
            Commands::LongestTokens(cmd) => cmd.run(),
        }
    }
}
