use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::error::{FmError, Result};
use crate::index::bwt::build_bwt;
use crate::index::count::CumulativeTable;
use crate::index::occ::{OccIndex, RankTable, DEFAULT_SAMPLE_RATE};
use crate::index::record::FmRecord;
use crate::index::sa::SuffixArray;
use crate::io::reads::ReadTable;
use crate::util::dna::{self, Symbol};

/// 索引构建参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOpt {
    /// Occ 表采样间隔，0 按 1 处理
    pub sample_rate: usize,
}

impl Default for IndexOpt {
    fn default() -> Self {
        Self { sample_rate: DEFAULT_SAMPLE_RATE }
    }
}

/// 索引构建信息，仅保存在二进制记录中
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub reads_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

/// 后缀数组上的闭区间 `[lower, upper]`。
///
/// `lower > upper` 表示空区间（模式不存在），这是正常的查询结果而不是错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaInterval {
    pub lower: i64,
    pub upper: i64,
}

impl SaInterval {
    pub const EMPTY: SaInterval = SaInterval { lower: 0, upper: -1 };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.upper - self.lower + 1) as usize
        }
    }

    /// 区间内的后缀数组下标
    pub fn rows(&self) -> impl Iterator<Item = usize> {
        (self.lower..=self.upper).map(|i| i as usize)
    }
}

impl fmt::Display for SaInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

/// 由广义后缀数组得到的 FM 索引：BWT 串 + Occ 表 + C 表。
///
/// 构建完成后只读，可在多个线程间共享查询。
/// rank 结构通过 [`OccIndex`] 访问，默认是定长采样的 [`RankTable`]。
#[derive(Debug, Clone)]
pub struct FMIndex<O: OccIndex = RankTable> {
    num_strings: usize,
    pred: CumulativeTable,
    occ: O,
    meta: IndexMeta,
}

impl FMIndex<RankTable> {
    /// 从后缀数组和 read 表构建。后缀数组越界时返回错误，不会产生半成品索引。
    pub fn build(sa: &SuffixArray, reads: &ReadTable, opt: &IndexOpt) -> Result<Self> {
        let bwt = build_bwt(sa, reads)?;
        let sentinels = bwt.iter().filter(|&&s| s == Symbol::Sentinel).count();
        if sentinels != sa.num_strings() {
            return Err(FmError::Validation(format!(
                "suffix array declares {} strings but yields {} sentinels",
                sa.num_strings(),
                sentinels
            )));
        }
        let fm = Self::from_bwt(bwt, sa.num_strings(), opt.sample_rate);
        info!(
            "built FM index: {} strings, n={}, sample rate {}",
            fm.num_strings,
            fm.len(),
            fm.occ.sample_rate()
        );
        Ok(fm)
    }

    pub fn from_bwt(bwt: Vec<Symbol>, num_strings: usize, sample_rate: usize) -> Self {
        Self::from_occ(num_strings, RankTable::build(bwt, sample_rate))
    }

    pub fn bwt(&self) -> &[Symbol] {
        self.occ.bwt()
    }

    pub fn sample_rate(&self) -> usize {
        self.occ.sample_rate()
    }

    /// 暴力重算所有 rank 并与采样结构比对（很慢，仅用于测试/诊断）
    pub fn validate(&self) -> Result<()> {
        warn!("BWT validation is turned on");
        self.occ.validate()
    }

    pub fn size_report(&self) -> SizeReport {
        SizeReport {
            n: self.len(),
            occ_bytes: self.occ.byte_size(),
            pred_bytes: std::mem::size_of::<CumulativeTable>(),
            bwt_bytes: std::mem::size_of::<Vec<Symbol>>() + self.len() * std::mem::size_of::<Symbol>(),
            misc_bytes: std::mem::size_of::<usize>(),
        }
    }

    pub fn set_meta(&mut self, meta: IndexMeta) {
        self.meta = meta;
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let f = std::fs::File::create(path.as_ref())?;
        let mut w = std::io::BufWriter::new(f);
        bincode::serialize_into(&mut w, &FmRecord::from_index(self))?;
        w.flush()?;
        info!("FM index saved: {}", path.as_ref().display());
        Ok(())
    }

    /// 读取并校验完整记录；任何字段不一致都会拒绝整个记录
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(path.as_ref())?;
        let record: FmRecord = bincode::deserialize_from(std::io::BufReader::new(f))?;
        let fm = record.into_index()?;
        info!("FM index loaded: {} (n={}, {} strings)", path.as_ref().display(), fm.len(), fm.num_strings);
        Ok(fm)
    }
}

impl<O: OccIndex> FMIndex<O> {
    /// 由任意 rank 结构组装索引，C 表由字符总数推出
    pub fn from_occ(num_strings: usize, occ: O) -> Self {
        let pred = CumulativeTable::from_totals(occ.totals());
        debug!("C table: {}", pred);
        Self { num_strings, pred, occ, meta: IndexMeta::default() }
    }

    pub fn num_strings(&self) -> usize {
        self.num_strings
    }

    /// BWT 串长度 N
    pub fn len(&self) -> usize {
        self.occ.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occ.is_empty()
    }

    pub fn occ(&self) -> &O {
        &self.occ
    }

    #[inline]
    pub fn symbol_at(&self, i: usize) -> Symbol {
        self.occ.symbol_at(i)
    }

    /// C(s)
    #[inline]
    pub fn cumulative(&self, s: Symbol) -> u64 {
        self.pred.get(s)
    }

    pub fn cumulative_table(&self) -> &CumulativeTable {
        &self.pred
    }

    /// O(s, i)，`i` 为闭区间右端
    #[inline]
    pub fn rank(&self, s: Symbol, i: usize) -> u64 {
        self.occ.rank(s, i)
    }

    /// L -> F 映射：第 i 行的 BWT 字符在首列中的行号。
    ///
    /// 终止符行统一映射到第 0 行，不区分是哪条序列的 `$`。
    #[inline]
    pub fn lf(&self, i: usize) -> usize {
        let c = self.occ.symbol_at(i);
        if c == Symbol::Sentinel {
            0
        } else {
            // rank 含第 i 位本身，行号从 0 开始
            (self.pred.get(c) + self.occ.rank(c, i) - 1) as usize
        }
    }

    /// 整个后缀数组 `[0, N - 1]`
    pub fn full_interval(&self) -> SaInterval {
        SaInterval { lower: 0, upper: self.len() as i64 - 1 }
    }

    /// 向左扩展一个字符：
    /// `lower = C(c) + O(c, lower - 1)`, `upper = C(c) + O(c, upper) - 1`。
    /// 空区间保持为空。
    #[inline]
    pub fn extend(&self, iv: SaInterval, c: Symbol) -> SaInterval {
        if iv.is_empty() {
            return iv;
        }
        let base = self.pred.get(c) as i64;
        SaInterval {
            lower: base + self.occ.rank_before(c, iv.lower as usize) as i64,
            upper: base + self.occ.rank(c, iv.upper as usize) as i64 - 1,
        }
    }

    /// 后缀数组区间中 BWT 字符为 `$` 的子区间：这些行对应从某条序列起点开始的后缀
    pub fn terminated_interval(&self, iv: SaInterval) -> SaInterval {
        self.extend(iv, Symbol::Sentinel)
    }

    /// 反向搜索主循环。每完成一次扩展（包括用最后一个字符初始化），
    /// 以 `(j, 当前区间)` 回调，`pattern[j..]` 为已匹配的后缀。
    /// 区间变空后立即停止。
    pub fn backward_search_with<F>(&self, pattern: &[Symbol], mut on_step: F) -> SaInterval
    where
        F: FnMut(usize, SaInterval),
    {
        let mut iv = self.full_interval();
        for (j, &c) in pattern.iter().enumerate().rev() {
            iv = self.extend(iv, c);
            trace!("step j={} c={} interval={}", j, c.to_ascii() as char, iv);
            if iv.is_empty() {
                return iv;
            }
            on_step(j, iv);
        }
        iv
    }

    /// 精确匹配：返回以 pattern 为前缀的所有后缀的区间
    pub fn backward_search_symbols(&self, pattern: &[Symbol]) -> SaInterval {
        self.backward_search_with(pattern, |_, _| {})
    }

    /// ASCII 模式的精确匹配；字母表之外的字符返回 `InvalidSymbol`
    pub fn backward_search(&self, pattern: &[u8]) -> Result<SaInterval> {
        let syms = dna::encode(pattern)?;
        Ok(self.backward_search_symbols(&syms))
    }

    /// pattern 的出现次数
    pub fn count(&self, pattern: &[u8]) -> Result<usize> {
        Ok(self.backward_search(pattern)?.len())
    }

    /// 逐行输出 `i, L(i), O(L(i), i), 后缀`（调试用）
    pub fn write_table<W: Write>(&self, w: &mut W, sa: &SuffixArray, reads: &ReadTable) -> Result<()> {
        writeln!(w, "i\tL(i)\tO(-,i)\tSUFF")?;
        for i in 0..self.len() {
            let c = self.occ.symbol_at(i);
            let suffix = if i < sa.len() { sa.suffix(i, reads) } else { String::new() };
            writeln!(w, "{}\t{}\t{}\t{}", i, c.to_ascii() as char, self.occ.rank(c, i), suffix)?;
        }
        Ok(())
    }
}

/// 索引内存占用明细
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeReport {
    pub n: usize,
    pub occ_bytes: usize,
    pub pred_bytes: usize,
    pub bwt_bytes: usize,
    pub misc_bytes: usize,
}

impl SizeReport {
    pub fn total_bytes(&self) -> usize {
        self.occ_bytes + self.pred_bytes + self.bwt_bytes + self.misc_bytes
    }

    pub fn total_mb(&self) -> f64 {
        self.total_bytes() as f64 / (1024.0 * 1024.0)
    }

    pub fn bytes_per_suffix(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.total_bytes() as f64 / self.n as f64
        }
    }
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "BWT Size -- OCC: {} C: {} Str: {} Misc: {} TOTAL: {} ({:.6} MB)",
            self.occ_bytes,
            self.pred_bytes,
            self.bwt_bytes,
            self.misc_bytes,
            self.total_bytes(),
            self.total_mb()
        )?;
        write!(f, "N: {} Bytes per suffix: {:.6}", self.n, self.bytes_per_suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FmError;
    use crate::index::count::AlphaCount;

    fn build(seqs: &[&str], rate: usize) -> (FMIndex, SuffixArray, ReadTable) {
        let reads = ReadTable::from_seqs(seqs).unwrap();
        let sa = SuffixArray::build(&reads);
        let fm = FMIndex::build(&sa, &reads, &IndexOpt { sample_rate: rate }).unwrap();
        (fm, sa, reads)
    }

    fn make_seq(len: usize, seed: u32) -> String {
        let bases = ['A', 'C', 'G', 'T'];
        let mut x = seed;
        (0..len)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                bases[(x >> 16) as usize % 4]
            })
            .collect()
    }

    /// 朴素统计：所有序列（含终止符）中以 pattern 开头的后缀个数
    fn naive_count(seqs: &[&str], pattern: &str) -> usize {
        seqs.iter()
            .map(|s| {
                let t = format!("{}$", s);
                (0..t.len()).filter(|&i| t[i..].starts_with(pattern)).count()
            })
            .sum()
    }

    /// 不采样、逐位置保存计数的 rank 结构
    struct NaiveOcc {
        bwt: Vec<Symbol>,
        prefix: Vec<AlphaCount>,
    }

    impl NaiveOcc {
        fn new(bwt: Vec<Symbol>) -> Self {
            let mut prefix = Vec::with_capacity(bwt.len());
            let mut running = AlphaCount::new();
            for &s in &bwt {
                running.increment(s);
                prefix.push(running);
            }
            Self { bwt, prefix }
        }
    }

    impl OccIndex for NaiveOcc {
        fn len(&self) -> usize {
            self.bwt.len()
        }
        fn symbol_at(&self, i: usize) -> Symbol {
            self.bwt[i]
        }
        fn rank(&self, s: Symbol, i: usize) -> u64 {
            self.prefix[i].get(s)
        }
        fn totals(&self) -> &AlphaCount {
            self.prefix.last().expect("non-empty bwt")
        }
    }

    #[test]
    fn index_opt_sets_sample_rate() {
        assert_eq!(IndexOpt::default().sample_rate, DEFAULT_SAMPLE_RATE);
        let reads = ReadTable::from_seqs(&["GATTACA", "ACAG"]).unwrap();
        let sa = SuffixArray::build(&reads);
        let fm = FMIndex::build(&sa, &reads, &IndexOpt::default()).unwrap();
        assert_eq!(fm.sample_rate(), 64);
        let fm = FMIndex::build(&sa, &reads, &IndexOpt { sample_rate: 0 }).unwrap();
        assert_eq!(fm.sample_rate(), 1);
        fm.validate().unwrap();
    }

    #[test]
    fn cumulative_table_matches_totals() {
        let (fm, _, _) = build(&["ACGT", "CGTA"], 4);
        assert_eq!(dna::decode(fm.bwt()), "TAT$A$CCGG");
        let expect = [0u64, 2, 4, 6, 8];
        for s in Symbol::ALL {
            assert_eq!(fm.cumulative(s), expect[s.index()]);
            let total = fm.rank(s, fm.len() - 1);
            match s.next() {
                Some(n) => assert_eq!(fm.cumulative(n) - fm.cumulative(s), total),
                None => assert_eq!(fm.cumulative(s) + total, fm.len() as u64),
            }
        }
    }

    #[test]
    fn backward_search_two_reads() {
        let (fm, sa, _) = build(&["ACGT", "CGTA"], 64);
        let iv = fm.backward_search(b"CGT").unwrap();
        assert_eq!(iv, SaInterval { lower: 4, upper: 5 });
        let hits: Vec<_> = iv.rows().map(|r| sa.get(r)).collect();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|e| (e.id == 0 && e.pos == 1) || (e.id == 1 && e.pos == 0)));

        assert_eq!(fm.count(b"T").unwrap(), 2);
        assert_eq!(fm.count(b"ACGTA").unwrap(), 0);
        assert_eq!(fm.count(b"GT$").unwrap(), 1);
    }

    #[test]
    fn backward_search_matches_naive_count() {
        let s0 = make_seq(120, 3);
        let s1 = make_seq(80, 11);
        let s2 = s0[30..90].to_string();
        let seqs = [s0.as_str(), s1.as_str(), s2.as_str()];
        for rate in [1usize, 5, 64] {
            let (fm, _, _) = build(&seqs, rate);
            for (start, len) in [(0usize, 1usize), (5, 3), (10, 6), (40, 12), (100, 20), (0, 120)] {
                let pat = &s0[start..start + len];
                assert_eq!(fm.count(pat.as_bytes()).unwrap(), naive_count(&seqs, pat), "pattern {}", pat);
            }
            for pat in ["AAAAAAAAAAAAAAAAAA", "ACGTTGCA", "GGGG", "TTTTTTTTT"] {
                assert_eq!(fm.count(pat.as_bytes()).unwrap(), naive_count(&seqs, pat), "pattern {}", pat);
            }
        }
    }

    #[test]
    fn absent_pattern_gives_empty_interval() {
        let (fm, _, _) = build(&["AAAA", "CCCC"], 64);
        let mut steps = Vec::new();
        let iv = fm.backward_search_with(&dna::encode(b"AGAA").unwrap(), |j, iv| steps.push((j, iv)));
        assert!(iv.is_empty());
        assert_eq!(iv.len(), 0);
        assert_eq!(iv.rows().count(), 0);
        // "AA" 匹配后，扩展 'G' 即为空，之后不再回调
        assert_eq!(steps.iter().map(|&(j, _)| j).collect::<Vec<_>>(), vec![3, 2]);

        // 比任何序列都长
        assert!(fm.backward_search(b"AAAAAAAAAA").unwrap().is_empty());
        // 字母表里存在但序列里没有的字符
        assert!(fm.backward_search(b"T").unwrap().is_empty());
    }

    #[test]
    fn symbol_outside_alphabet_is_error() {
        let (fm, _, _) = build(&["ACGT"], 64);
        assert!(matches!(fm.backward_search(b"ACNT"), Err(FmError::InvalidSymbol { byte: b'N', pos: 2 })));
    }

    #[test]
    fn backward_search_is_idempotent() {
        let (fm, _, _) = build(&["GATTACA", "TACAGAT", "ACAG"], 2);
        let a = fm.backward_search(b"ACA").unwrap();
        let b = fm.backward_search(b"ACA").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn empty_pattern_matches_everything() {
        let (fm, _, _) = build(&["ACGT"], 64);
        assert_eq!(fm.backward_search(b"").unwrap(), fm.full_interval());
    }

    #[test]
    fn empty_index() {
        let (fm, _, _) = build(&[], 64);
        assert!(fm.is_empty());
        assert!(fm.backward_search(b"A").unwrap().is_empty());
    }

    #[test]
    fn lf_cycles_on_single_sequence() {
        let seq = make_seq(150, 17);
        let (fm, _, _) = build(&[seq.as_str()], 8);
        let n = fm.len();
        assert_eq!(fm.bwt().iter().filter(|&&s| s == Symbol::Sentinel).count(), 1);
        for start in [0usize, 1, n / 2, n - 1] {
            let mut row = start;
            for step in 1..=n {
                row = fm.lf(row);
                if step < n {
                    assert_ne!(row, start, "returned early after {} steps", step);
                }
            }
            assert_eq!(row, start);
        }
    }

    #[test]
    fn lf_steps_one_position_left() {
        let (fm, sa, _) = build(&["GATTACA", "TACAGAT", "ACAG"], 3);
        for i in 0..fm.len() {
            let e = sa.get(i);
            if fm.symbol_at(i) == Symbol::Sentinel {
                assert_eq!(e.pos, 0);
                assert_eq!(fm.lf(i), 0);
            } else {
                let prev = sa.get(fm.lf(i));
                assert_eq!((prev.id, prev.pos + 1), (e.id, e.pos));
            }
        }
    }

    #[test]
    fn terminated_interval_selects_read_starts() {
        let (fm, sa, _) = build(&["ACGT", "CGTA", "CGTT"], 64);
        let iv = fm.backward_search(b"CGT").unwrap();
        assert_eq!(iv.len(), 3);
        let t = fm.terminated_interval(iv);
        // CGTA 与 CGTT 从序列起点匹配 CGT
        assert_eq!(t.len(), 2);
        let ids: Vec<usize> = t.rows().map(|r| sa.get(r).id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn alternative_rank_structure_gives_same_answers() {
        let seqs = ["GATTACA", "TACAGAT", "ACAG"];
        let (fm, _, _) = build(&seqs, 4);
        let naive = FMIndex::from_occ(fm.num_strings(), NaiveOcc::new(fm.bwt().to_vec()));
        for s in Symbol::ALL {
            assert_eq!(naive.cumulative(s), fm.cumulative(s));
        }
        for i in 0..fm.len() {
            assert_eq!(naive.lf(i), fm.lf(i));
        }
        for pat in ["A", "ACA", "GAT", "TAC", "CAGAT", "TTT"] {
            assert_eq!(naive.backward_search(pat.as_bytes()).unwrap(), fm.backward_search(pat.as_bytes()).unwrap());
        }
    }

    #[test]
    fn size_report_and_validate() {
        let (fm, _, _) = build(&["GATTACA", "TACAGAT"], 4);
        fm.validate().unwrap();
        let r = fm.size_report();
        assert_eq!(r.n, 16);
        assert!(r.total_bytes() > r.bwt_bytes);
        assert!(r.to_string().starts_with("BWT Size -- OCC:"));
        assert!(r.bytes_per_suffix() > 0.0);
    }

    #[test]
    fn write_table_lists_every_row() {
        let (fm, sa, reads) = build(&["ACGT", "CGTA"], 64);
        let mut out = Vec::new();
        fm.write_table(&mut out, &sa, &reads).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), fm.len() + 1);
        assert_eq!(lines[4], "3\t$\t1\tACGT$");
    }

    #[test]
    fn shared_across_threads() {
        let (fm, _, _) = build(&["GATTACA", "TACAGAT", "ACAG"], 4);
        let fm = std::sync::Arc::new(fm);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let fm = std::sync::Arc::clone(&fm);
                std::thread::spawn(move || fm.count(b"ACA").unwrap())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 3);
        }
    }
}
