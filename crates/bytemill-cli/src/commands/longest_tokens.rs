use std::path::PathBuf;

use bytemill::vocab::io::read_token_id_pairs;

/// Args for the longest-tokens command.
#[derive(clap::Args, Debug)]
pub struct LongestTokensArgs {
    /// Path to vocab.json.
    vocab_path: PathBuf,

    /// How many tokens to print.
    #[arg(long, default_value = "10")]
    top_k: usize,
}

impl LongestTokensArgs {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(&self.vocab_path)
            .map_err(|e| bytemill::BytemillError::io(&self.vocab_path, e))?;
        let mut pairs = read_token_id_pairs(&contents)?;

        pairs.sort_by(|a, b| {
            (a.0.chars().count(), &a.0, a.1)
                .cmp(&(b.0.chars().count(), &b.0, b.1))
                .reverse()
        });

        for (rank, (token, id)) in pairs.iter().take(self.top_k).enumerate() {
            println!(
                "{:>2}. len={:>4} id={:>6} token={:?}",
                rank + 1,
                token.chars().count(),
                id,
                token,
            );
        }

        Ok(())
    }
}
