//! Token counting for context-budget accounting

use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Counts model tokens in a text
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    /// Short label recorded next to the count
    fn name(&self) -> &'static str;
}

/// Exact counts with the cl100k_base BPE
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn new() -> Result<Self, String> {
        tiktoken_rs::cl100k_base()
            .map(|bpe| Self { bpe })
            .map_err(|e| e.to_string())
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn name(&self) -> &'static str {
        "cl100k_base"
    }
}

/// Roughly four characters per token
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateCounter;

impl TokenCounter for ApproximateCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }

    fn name(&self) -> &'static str {
        "approximate"
    }
}

/// The BPE counter, or the approximation when its tables cannot be loaded
pub fn default_counter() -> Arc<dyn TokenCounter> {
    match TiktokenCounter::new() {
        Ok(counter) => Arc::new(counter),
        Err(e) => {
            log::warn!("Falling back to approximate token counts: {}", e);
            Arc::new(ApproximateCounter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approximate_counter() {
        assert_eq!(ApproximateCounter.count(""), 0);
        assert_eq!(ApproximateCounter.count("abcd"), 1);
        assert_eq!(ApproximateCounter.count("abcde"), 2);
    }

    #[test]
    fn test_default_counter_counts_something() {
        let counter = default_counter();
        let n = counter.count("contract Vault is Ownable { function withdraw() external {} }");
        assert!(n > 0);
        assert!(n < 64);
    }
}
