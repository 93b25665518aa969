use std::collections::HashMap;

use crate::models::quote::Quote;

/// 代码到行情的内存缓存，不做淘汰，只能整体清空
#[derive(Debug, Default)]
pub struct QuoteCache {
    quotes: HashMap<String, Quote>,
    // 每次 clear 加一
    generation: u64,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    pub fn has(&self, symbol: &str) -> bool {
        self.quotes.contains_key(symbol)
    }

    /// 无条件整体替换
    pub fn set(&mut self, symbol: &str, quote: Quote) {
        self.quotes.insert(symbol.to_string(), quote);
    }

    pub fn clear(&mut self) {
        self.quotes.clear();
        self.generation += 1;
    }

    /// 已清空的次数，用来识别清空前发起的请求
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.quotes.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}
