//! BATCH assembly.
//!
//! Statements are grouped into contiguous chunks, each wrapped as
//!
//! ```text
//! BEGIN BATCH USING CONSISTENCY QUORUM
//! <statement>;
//! <statement>;
//! APPLY BATCH;
//! ```
//!
//! with the members' values and row keys concatenated in order.

use cassy_core::{DEFAULT_BATCH_CHUNK_SIZE, StatementSpec};

const BATCH_HEADER: &str = "BEGIN BATCH USING CONSISTENCY QUORUM\n";
const BATCH_FOOTER: &str = "APPLY BATCH;";

/// Groups statements into BATCH statements of at most `chunk_size` members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchAssembler {
    chunk_size: usize,
}

impl Default for BatchAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_CHUNK_SIZE)
    }
}

impl BatchAssembler {
    /// Create an assembler; a chunk size of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Members per batch.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Wrap `statements` into `ceil(n / chunk_size)` batches, preserving
    /// order within and across batches.
    pub fn assemble<I>(&self, statements: I) -> Vec<StatementSpec>
    where
        I: IntoIterator<Item = StatementSpec>,
    {
        let statements: Vec<StatementSpec> = statements.into_iter().collect();
        let batches: Vec<StatementSpec> = statements
            .chunks(self.chunk_size)
            .map(wrap_chunk)
            .collect();
        tracing::debug!(
            statements = statements.len(),
            batches = batches.len(),
            chunk_size = self.chunk_size,
            "Assembled batch"
        );
        batches
    }
}

fn wrap_chunk(chunk: &[StatementSpec]) -> StatementSpec {
    let mut text = String::from(BATCH_HEADER);
    let mut values = Vec::new();
    let mut keys = Vec::new();
    for member in chunk {
        text.push_str(member.statement());
        text.push_str(";\n");
        values.extend_from_slice(member.values());
        if let Some(key) = member.key() {
            keys.extend_from_slice(key);
        }
    }
    text.push_str(BATCH_FOOTER);
    StatementSpec::with_key(text, values, keys)
}

/// Assemble with the given chunk size.
pub fn build_batch<I>(statements: I, chunk_size: usize) -> Vec<StatementSpec>
where
    I: IntoIterator<Item = StatementSpec>,
{
    BatchAssembler::new(chunk_size).assemble(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassy_core::Value;

    fn member(i: i64) -> StatementSpec {
        StatementSpec::with_key(
            "UPDATE 'c' SET 'v' = ? WHERE KEY = ?".to_string(),
            vec![Value::BigInt(i), Value::from(format!("k{i}"))],
            vec![format!("k{i}")],
        )
    }

    #[test]
    fn test_chunk_count_and_value_order() {
        for (n, chunk) in [(1, 50), (50, 50), (51, 50), (7, 3), (6, 1)] {
            let input: Vec<_> = (0..n).map(member).collect();
            let batches = build_batch(input.clone(), chunk);
            assert_eq!(batches.len(), (n as usize).div_ceil(chunk), "n={n} chunk={chunk}");

            let flat: Vec<Value> = batches.iter().flat_map(|b| b.values().to_vec()).collect();
            let expected: Vec<Value> = input.iter().flat_map(|s| s.values().to_vec()).collect();
            assert_eq!(flat, expected);
        }
    }

    #[test]
    fn test_batch_text_and_keys() {
        let batches = build_batch(vec![member(1), StatementSpec::new("SELECT 1", vec![])], 50);
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].statement(),
            "BEGIN BATCH USING CONSISTENCY QUORUM\n\
             UPDATE 'c' SET 'v' = ? WHERE KEY = ?;\n\
             SELECT 1;\n\
             APPLY BATCH;"
        );
        assert_eq!(batches[0].key(), Some(&["k1".to_string()][..]));
    }

    #[test]
    fn test_zero_chunk_size_and_empty_input() {
        assert_eq!(BatchAssembler::new(0).chunk_size(), 1);
        assert!(BatchAssembler::default().assemble(Vec::new()).is_empty());
        assert_eq!(BatchAssembler::default().chunk_size(), 50);
    }
}
