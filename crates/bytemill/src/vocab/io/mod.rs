//! # Vocabulary I/O
//!
//! GPT-2 convention persistence: `vocab.json` maps printable alias strings
//! to token IDs, and `merges.txt` holds one merge per line as two aliases
//! separated by a space, in creation order. The core data model stays bytes;
//! aliases exist only in these files.

mod byte_alias;

#[doc(inline)]
pub use byte_alias::{alias_to_byte, alias_to_bytes, byte_to_alias, bytes_to_alias};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::{BmResult, BytemillError};
use crate::symbol::{Symbol, SymbolPair};
use crate::types::TokenType;
use crate::vocab::Vocabulary;

/// Write a vocabulary to a `vocab.json` file.
pub fn save_vocab_json<T: TokenType>(
    vocab: &Vocabulary<T>,
    path: &Path,
) -> BmResult<()> {
    let mut map = serde_json::Map::with_capacity(vocab.len());
    for (id, symbol) in vocab.iter() {
        map.insert(
            bytes_to_alias(symbol.as_bytes()),
            serde_json::Value::from(id.to_u64().unwrap()),
        );
    }

    let file = File::create(path).map_err(|e| BytemillError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &serde_json::Value::Object(map))
        .map_err(|e| BytemillError::io(path, std::io::Error::other(e)))?;
    writer.flush().map_err(|e| BytemillError::io(path, e))?;
    Ok(())
}

/// Load a vocabulary from a `vocab.json` file.
///
/// The file must be a JSON object mapping alias strings to integer IDs,
/// with IDs dense from 0 and unique; anything else is a configuration
/// error.
pub fn load_vocab_json<T: TokenType>(path: &Path) -> BmResult<Vocabulary<T>> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| BytemillError::io(path, e))?;

    let value: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| BytemillError::VocabFormat(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| BytemillError::VocabFormat("expected a JSON object".to_string()))?;

    let mut slots: Vec<Option<Symbol>> = vec![None; object.len()];
    for (alias, value) in object {
        let id = value.as_u64().ok_or_else(|| {
            BytemillError::VocabFormat(format!("non-integer ID for {alias:?}"))
        })? as usize;
        let bytes = alias_to_bytes(alias).ok_or_else(|| {
            BytemillError::VocabFormat(format!("unrecognised alias {alias:?}"))
        })?;
        if bytes.is_empty() {
            return Err(BytemillError::VocabFormat("empty token".to_string()));
        }

        let slot = slots.get_mut(id).ok_or_else(|| {
            BytemillError::VocabFormat(format!("IDs not dense: {id} out of range"))
        })?;
        if slot.is_some() {
            return Err(BytemillError::VocabFormat(format!("duplicate ID {id}")));
        }
        *slot = Some(Symbol::from_bytes(&bytes));
    }

    // Every slot filled means IDs are exactly 0..len, unique.
    let symbols = slots
        .into_iter()
        .collect::<Option<Vec<Symbol>>>()
        .ok_or_else(|| BytemillError::VocabFormat("IDs not dense from 0".to_string()))?;

    Vocabulary::from_symbols(symbols)
}

/// Write merges to a `merges.txt` file, in creation order.
pub fn save_merges(
    merges: &[SymbolPair],
    path: &Path,
) -> BmResult<()> {
    let file = File::create(path).map_err(|e| BytemillError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for (left, right) in merges {
        writeln!(
            writer,
            "{} {}",
            bytes_to_alias(left.as_bytes()),
            bytes_to_alias(right.as_bytes()),
        )
        .map_err(|e| BytemillError::io(path, e))?;
    }
    writer.flush().map_err(|e| BytemillError::io(path, e))?;
    Ok(())
}

/// Load merges from a `merges.txt` file.
///
/// Blank lines are skipped; trailing whitespace is tolerated; a line that is
/// not exactly two decodable aliases is skipped. An unreadable file is an
/// I/O error.
pub fn load_merges(path: &Path) -> BmResult<Vec<SymbolPair>> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| BytemillError::io(path, e))?;

    let mut merges = Vec::new();
    for line in contents.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split(' ').collect();
        let [left, right] = parts.as_slice() else {
            continue;
        };

        let (Some(left), Some(right)) = (alias_to_bytes(left), alias_to_bytes(right))
        else {
            continue;
        };
        if left.is_empty() || right.is_empty() {
            continue;
        }

        merges.push((Symbol::from_bytes(&left), Symbol::from_bytes(&right)));
    }
    Ok(merges)
}

/// Read `(token_text, id)` pairs from vocab JSON contents.
///
/// Accepts both the GPT-2 `token -> id` shape and the inverted
/// `id -> token` shape.
pub fn read_token_id_pairs(contents: &str) -> BmResult<Vec<(String, u64)>> {
    let value: serde_json::Value = serde_json::from_str(contents)
        .map_err(|e| BytemillError::VocabFormat(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| BytemillError::VocabFormat("expected a JSON object".to_string()))?;

    if object.values().all(|v| v.is_u64()) {
        return Ok(object
            .iter()
            .map(|(token, id)| (token.clone(), id.as_u64().unwrap()))
            .collect());
    }

    if object.values().all(|v| v.is_string()) {
        let mut pairs = Vec::with_capacity(object.len());
        for (id, token) in object {
            let id = id.parse::<u64>().map_err(|_| {
                BytemillError::VocabFormat(format!(
                    "id->token shape with non-integer key {id:?}"
                ))
            })?;
            pairs.push((token.as_str().unwrap().to_string(), id));
        }
        return Ok(pairs);
    }

    Err(BytemillError::VocabFormat(
        "unsupported vocab shape".to_string(),
    ))
}
