//! 索引的持久化记录。
//!
//! 字段顺序固定：序列数、N、BWT 串、C 表、Occ 采样间隔与采样表。
//! 文本格式每个字段占一行（采样表每个采样点一行）；二进制格式是同一记录的 bincode 编码。
//! 读取时校验全部字段，任何不一致都会拒绝整个记录，不会产生部分可用的索引。

use log::info;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{FmError, Result};
use crate::index::count::{AlphaCount, CumulativeTable};
use crate::index::fm::{FMIndex, IndexMeta};
use crate::index::occ::{OccIndex, RankTable};
use crate::util::dna::{Symbol, SIGMA};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FmRecord {
    pub num_strings: u64,
    pub n: u64,
    /// BWT 串（ASCII）
    pub bwt: Vec<u8>,
    pub pred: [u64; SIGMA],
    pub sample_rate: u64,
    pub samples: Vec<[u64; SIGMA]>,
    pub meta: IndexMeta,
}

fn malformed(msg: impl Into<String>) -> FmError {
    FmError::MalformedRecord(msg.into())
}

impl FmRecord {
    pub fn from_index(fm: &FMIndex) -> Self {
        Self {
            num_strings: fm.num_strings() as u64,
            n: fm.len() as u64,
            bwt: fm.bwt().iter().map(|s| s.to_ascii()).collect(),
            pred: *fm.cumulative_table().as_counts().counts(),
            sample_rate: fm.sample_rate() as u64,
            samples: fm.occ().samples().iter().map(|c| *c.counts()).collect(),
            meta: fm.meta().clone(),
        }
    }

    /// 校验并还原索引
    pub fn into_index(self) -> Result<FMIndex> {
        if self.bwt.len() as u64 != self.n {
            return Err(malformed(format!("declared length {} but BWT string has {} symbols", self.n, self.bwt.len())));
        }
        let bwt = self
            .bwt
            .iter()
            .enumerate()
            .map(|(i, &b)| {
                Symbol::from_ascii(b)
                    .filter(|s| s.to_ascii() == b)
                    .ok_or_else(|| malformed(format!("byte {:#04x} at BWT position {} is not in $ACGT", b, i)))
            })
            .collect::<Result<Vec<Symbol>>>()?;

        let sentinels = bwt.iter().filter(|&&s| s == Symbol::Sentinel).count() as u64;
        if sentinels != self.num_strings {
            return Err(malformed(format!(
                "record declares {} strings but the BWT string has {} sentinels",
                self.num_strings, sentinels
            )));
        }

        let samples = self.samples.into_iter().map(AlphaCount::from_counts).collect();
        let occ = RankTable::from_parts(bwt, self.sample_rate as usize, samples)?;
        let expected = CumulativeTable::from_totals(occ.totals());
        let pred = CumulativeTable::from_counts(self.pred);
        if pred != expected {
            return Err(malformed(format!("C table {} does not match the BWT string ({})", pred, expected)));
        }

        let mut fm = FMIndex::from_occ(self.num_strings as usize, occ);
        fm.set_meta(self.meta);
        Ok(fm)
    }
}

/// 写出文本记录
pub fn write_text<W: Write>(fm: &FMIndex, w: &mut W) -> Result<()> {
    writeln!(w, "{}", fm.num_strings())?;
    writeln!(w, "{}", fm.len())?;
    let bwt: String = fm.bwt().iter().map(|s| s.to_ascii() as char).collect();
    writeln!(w, "{}", bwt)?;
    writeln!(w, "{}", fm.cumulative_table())?;
    writeln!(w, "{} {}", fm.sample_rate(), fm.occ().samples().len())?;
    for s in fm.occ().samples() {
        writeln!(w, "{}", s)?;
    }
    Ok(())
}

/// 逐行读取文本记录的游标，错误信息带行号
struct Lines<'a> {
    iter: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lines<'a> {
    fn next(&mut self, what: &str) -> Result<(usize, &'a str)> {
        self.iter
            .next()
            .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
            .ok_or_else(|| malformed(format!("missing {}", what)))
    }

    fn ints(&mut self, what: &str) -> Result<Vec<u64>> {
        let (no, line) = self.next(what)?;
        line.split_whitespace()
            .map(|t| t.parse::<u64>().map_err(|_| malformed(format!("line {}: bad {} value {:?}", no, what, t))))
            .collect()
    }

    fn int(&mut self, what: &str) -> Result<u64> {
        let v = self.ints(what)?;
        match v.as_slice() {
            [x] => Ok(*x),
            _ => Err(malformed(format!("{}: expected one integer, found {}", what, v.len()))),
        }
    }

    fn counts(&mut self, what: &str) -> Result<[u64; SIGMA]> {
        let v = self.ints(what)?;
        v.as_slice()
            .try_into()
            .map_err(|_| malformed(format!("{}: expected {} counts, found {}", what, SIGMA, v.len())))
    }
}

/// 读取文本记录
pub fn read_text<R: Read>(r: R) -> Result<FMIndex> {
    let mut content = String::new();
    BufReader::new(r).read_to_string(&mut content)?;

    let mut lines = Lines { iter: content.lines().enumerate() };
    let num_strings = lines.int("string count")?;
    let n = lines.int("BWT length")?;
    let bwt = lines.next("BWT string")?.1.as_bytes().to_vec();
    let pred = lines.counts("C table")?;
    let header = lines.ints("occ header")?;
    let (sample_rate, num_samples) = match header.as_slice() {
        [rate, count] => (*rate, *count),
        _ => return Err(malformed(format!("occ header: expected rate and sample count, found {} values", header.len()))),
    };
    // 样本数不可信，不用它预分配
    let mut samples = Vec::new();
    for k in 0..num_samples {
        samples.push(lines.counts(&format!("occ sample {}", k))?);
    }
    if let Some((no, extra)) = lines.iter.find(|(_, l)| !l.trim().is_empty()) {
        return Err(malformed(format!("line {}: unexpected trailing data {:?}", no + 1, extra)));
    }

    FmRecord { num_strings, n, bwt, pred, sample_rate, samples, meta: IndexMeta::default() }.into_index()
}

pub fn save_text<P: AsRef<Path>>(fm: &FMIndex, path: P) -> Result<()> {
    let f = std::fs::File::create(path.as_ref())?;
    let mut w = BufWriter::new(f);
    write_text(fm, &mut w)?;
    w.flush()?;
    info!("BWT text record saved: {}", path.as_ref().display());
    Ok(())
}

pub fn load_text<P: AsRef<Path>>(path: P) -> Result<FMIndex> {
    let f = std::fs::File::open(path.as_ref())?;
    let fm = read_text(f)?;
    info!("BWT text record loaded: {} (n={})", path.as_ref().display(), fm.len());
    Ok(fm)
}

/// 按扩展名选择格式：`.bwt` 为文本记录，其他为二进制
pub fn load_any<P: AsRef<Path>>(path: P) -> Result<FMIndex> {
    let path = path.as_ref();
    if path.extension().is_some_and(|e| e == "bwt") {
        load_text(path)
    } else {
        FMIndex::load_from_file(path)
    }
}
