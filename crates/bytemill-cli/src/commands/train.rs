use std::path::PathBuf;

use bytemill::training::{BpeTrainer, BpeTrainerOptions};
use bytemill::vocab::io::{save_merges, save_vocab_json};

/// Args for the train command.
#[derive(clap::Args, Debug)]
pub struct TrainArgs {
    /// Path to training text file.
    input_path: PathBuf,

    /// Directory where vocab.json and merges.txt are saved.
    output_dir: PathBuf,

    /// Total vocabulary size including special tokens.
    #[arg(long, default_value = "1000")]
    vocab_size: usize,

    /// Special token to keep atomic. Can be repeated. Default: <|endoftext|>
    #[arg(long = "special-token")]
    special_tokens: Vec<String>,

    /// Number of workers for chunk pre-tokenization.
    #[arg(long)]
    num_processes: Option<usize>,
}

impl TrainArgs {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let special_tokens = if self.special_tokens.is_empty() {
            vec!["<|endoftext|>".to_string()]
        } else {
            self.special_tokens.clone()
        };

        let mut options = BpeTrainerOptions::new(self.vocab_size)
            .with_special_tokens(special_tokens);
        if let Some(num_processes) = self.num_processes {
            options = options.with_num_workers(num_processes);
        }

        log::info!("Training tokenizer from {}", self.input_path.display());
        let trainer: BpeTrainer = options.init();
        let output = trainer.train_file::<u32>(&self.input_path)?;

        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| bytemill::BytemillError::io(&self.output_dir, e))?;
        let vocab_path = self.output_dir.join("vocab.json");
        let merges_path = self.output_dir.join("merges.txt");

        // Remove partial outputs rather than leaving a half-written model.
        if let Err(err) = save_vocab_json(&output.vocab, &vocab_path)
            .and_then(|()| save_merges(&output.merges, &merges_path))
        {
            let _ = std::fs::remove_file(&vocab_path);
            let _ = std::fs::remove_file(&merges_path);
            return Err(err.into());
        }

        println!("Saved vocab: {}", vocab_path.display());
        println!("Saved merges: {}", merges_path.display());
        println!("Vocab size: {}", output.vocab.len());
        println!("Num merges: {}", output.merges.len());

        Ok(())
    }
}
