use std::collections::VecDeque;

use crate::core::quote::PriceQuote;

pub const DEFAULT_HISTORY_CAPACITY: usize = 24;

/// Fixed-capacity window of accepted quotes, oldest first.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    quotes: VecDeque<PriceQuote>,
    capacity: usize,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            quotes: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends `quote`, dropping the oldest entry once over capacity.
    pub fn push(&mut self, quote: PriceQuote) {
        self.quotes.push_back(quote);
        while self.quotes.len() > self.capacity {
            self.quotes.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&PriceQuote> {
        self.quotes.back()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn to_vec(&self) -> Vec<PriceQuote> {
        self.quotes.iter().cloned().collect()
    }
}
