use serde::{Deserialize, Serialize};
use std::fmt;

use crate::util::dna::{Symbol, SIGMA};

/// 字母表上的定长计数器，`counts[s as usize]` 即字符 `s` 的计数。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaCount {
    counts: [u64; SIGMA],
}

impl AlphaCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: [u64; SIGMA]) -> Self {
        Self { counts }
    }

    #[inline]
    pub fn increment(&mut self, s: Symbol) {
        self.counts[s.index()] += 1;
    }

    #[inline]
    pub fn get(&self, s: Symbol) -> u64 {
        self.counts[s.index()]
    }

    #[inline]
    pub fn set(&mut self, s: Symbol, v: u64) {
        self.counts[s.index()] = v;
    }

    /// 所有字符计数之和，即已计数的位置数
    pub fn sum(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn counts(&self) -> &[u64; SIGMA] {
        &self.counts
    }

    /// 统计一段字符串中每个字符的出现次数
    pub fn tally(syms: &[Symbol]) -> Self {
        let mut c = Self::new();
        for &s in syms {
            c.increment(s);
        }
        c
    }
}

impl fmt::Display for AlphaCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.counts.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// C 表：`C(a)` = BWT 串中字典序严格小于 `a` 的字符总数。
///
/// 按字母表顺序做前缀和：`C($) = 0`，`C(next) = C(prev) + total(prev)`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeTable {
    pred: AlphaCount,
}

impl CumulativeTable {
    pub fn from_totals(totals: &AlphaCount) -> Self {
        let mut pred = AlphaCount::new();
        let mut acc = 0u64;
        for s in Symbol::ALL {
            pred.set(s, acc);
            acc += totals.get(s);
        }
        Self { pred }
    }

    /// 直接由已序列化的计数构造；一致性由调用方（记录校验）负责
    pub fn from_counts(counts: [u64; SIGMA]) -> Self {
        Self { pred: AlphaCount::from_counts(counts) }
    }

    #[inline]
    pub fn get(&self, s: Symbol) -> u64 {
        self.pred.get(s)
    }

    pub fn as_counts(&self) -> &AlphaCount {
        &self.pred
    }
}

impl fmt::Display for CumulativeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.pred, f)
    }
}
