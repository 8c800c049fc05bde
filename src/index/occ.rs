use log::{debug, warn};

use crate::error::{FmError, Result};
use crate::index::count::AlphaCount;
use crate::util::dna::Symbol;

/// 默认 Occ 采样间隔
pub const DEFAULT_SAMPLE_RATE: usize = 64;

/// BWT 串上的 rank 结构。
///
/// FM 索引只通过这个接口访问 BWT 串，替换成其他编码（如小波树）时调用方不需要改动。
pub trait OccIndex {
    /// BWT 串长度 N
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// BWT[i]
    fn symbol_at(&self, i: usize) -> Symbol;

    /// O(s, i)：BWT[0..=i] 中 s 的出现次数。
    ///
    /// 要求 `i < N`，越界时 panic（调用方负责，空区间不会走到这里）。
    fn rank(&self, s: Symbol, i: usize) -> u64;

    /// O(s, i - 1)，约定 `rank_before(s, 0) == O(s, -1) == 0`
    #[inline]
    fn rank_before(&self, s: Symbol, i: usize) -> u64 {
        if i == 0 {
            0
        } else {
            self.rank(s, i - 1)
        }
    }

    /// 整个 BWT 串的字符计数
    fn totals(&self) -> &AlphaCount;
}

/// 定长采样的 Occ 表：
/// - `samples[k]` 记录 BWT[0..k*rate) 的累计计数，覆盖所有 `k*rate <= N`；
/// - 查询时取最近的采样点（前一个或后一个），块内顺扫补偿，最坏 O(rate)。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankTable {
    bwt: Vec<Symbol>,
    sample_rate: usize,
    samples: Vec<AlphaCount>,
    totals: AlphaCount,
}

impl RankTable {
    /// 单次从左到右扫描构建。`sample_rate == 0` 按 1 处理。
    pub fn build(bwt: Vec<Symbol>, sample_rate: usize) -> Self {
        let rate = sample_rate.max(1);
        let n = bwt.len();
        let mut samples = Vec::with_capacity(n / rate + 1);
        let mut running = AlphaCount::new();
        for (i, &s) in bwt.iter().enumerate() {
            if i % rate == 0 {
                samples.push(running);
            }
            running.increment(s);
        }
        if n % rate == 0 {
            samples.push(running);
        }
        debug!("occ table: n={} rate={} samples={}", n, rate, samples.len());
        Self { bwt, sample_rate: rate, samples, totals: running }
    }

    /// 由反序列化得到的各部分组装，采样点必须与 BWT 串完全一致，否则整体拒绝。
    pub fn from_parts(bwt: Vec<Symbol>, sample_rate: usize, samples: Vec<AlphaCount>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(FmError::MalformedRecord("sample rate must be positive".into()));
        }
        let expected = Self::build(bwt, sample_rate);
        if samples.len() != expected.samples.len() {
            return Err(FmError::MalformedRecord(format!(
                "expected {} occ samples for n={} rate={}, found {}",
                expected.samples.len(),
                expected.bwt.len(),
                sample_rate,
                samples.len()
            )));
        }
        if let Some(k) = samples.iter().zip(&expected.samples).position(|(a, b)| a != b) {
            return Err(FmError::MalformedRecord(format!(
                "occ sample {} ({}) does not match the BWT string ({})",
                k, samples[k], expected.samples[k]
            )));
        }
        Ok(expected)
    }

    pub fn bwt(&self) -> &[Symbol] {
        &self.bwt
    }

    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }

    pub fn samples(&self) -> &[AlphaCount] {
        &self.samples
    }

    /// BWT[0..p) 中 s 的个数
    #[inline]
    fn count_prefix(&self, s: Symbol, p: usize) -> u64 {
        let rate = self.sample_rate;
        let k = p / rate;
        let start = k * rate;
        let next = start + rate;
        if p - start > rate / 2 && next <= self.bwt.len() {
            // 离后一个采样点更近：从后向前扣除
            let over = self.bwt[p..next].iter().filter(|&&c| c == s).count() as u64;
            self.samples[k + 1].get(s) - over
        } else {
            let add = self.bwt[start..p].iter().filter(|&&c| c == s).count() as u64;
            self.samples[k].get(s) + add
        }
    }

    /// 采样表占用的字节数
    pub fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.samples.len() * std::mem::size_of::<AlphaCount>()
    }

    /// 从头重新计算每个位置的 rank 并与采样结构比对。O(N * sigma)，仅用于测试/诊断。
    pub fn validate(&self) -> Result<()> {
        warn!("occ validation is enabled, this is slow");
        let mut running = AlphaCount::new();
        for (i, &c) in self.bwt.iter().enumerate() {
            running.increment(c);
            for s in Symbol::ALL {
                let got = self.rank(s, i);
                if got != running.get(s) {
                    return Err(FmError::Validation(format!(
                        "O({}, {}) = {} but brute force gives {}",
                        s.to_ascii() as char,
                        i,
                        got,
                        running.get(s)
                    )));
                }
            }
        }
        if running != self.totals {
            return Err(FmError::Validation(format!("totals {} != recomputed {}", self.totals, running)));
        }
        Ok(())
    }
}

impl OccIndex for RankTable {
    #[inline]
    fn len(&self) -> usize {
        self.bwt.len()
    }

    #[inline]
    fn symbol_at(&self, i: usize) -> Symbol {
        self.bwt[i]
    }

    #[inline]
    fn rank(&self, s: Symbol, i: usize) -> u64 {
        assert!(i < self.bwt.len(), "rank position {} out of range (n={})", i, self.bwt.len());
        self.count_prefix(s, i + 1)
    }

    fn totals(&self) -> &AlphaCount {
        &self.totals
    }
}
