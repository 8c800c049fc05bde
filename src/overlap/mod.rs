use log::{debug, info};
use rayon::prelude::*;
use std::io::Write;

use crate::error::{FmError, Result};
use crate::index::fm::FMIndex;
use crate::index::sa::SuffixArray;
use crate::io::reads::ReadTable;
use crate::util::dna;

pub mod search;

pub use search::{prefix_hits, Hit};

/// 重叠搜索参数
#[derive(Debug, Clone, Copy)]
pub struct OverlapOpt {
    pub min_overlap: usize,
    pub threads: usize,
    /// 同时用反向互补序列查询
    pub reverse_complement: bool,
}

impl Default for OverlapOpt {
    fn default() -> Self {
        Self { min_overlap: 45, threads: 1, reverse_complement: true }
    }
}

/// 目标序列已确定的重叠记录，交给下游组装图构建
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub query_id: usize,
    pub target_id: usize,
    pub query_offset: usize,
    pub overlap_len: usize,
    pub query_rev: bool,
    pub target_rev: bool,
    pub sa_idx: usize,
}

/// 由后缀数组回查命中的目标序列
pub fn resolve(hit: &Hit, sa: &SuffixArray) -> Overlap {
    Overlap {
        query_id: hit.query_id,
        target_id: sa.get(hit.sa_idx).id,
        query_offset: hit.query_offset,
        overlap_len: hit.overlap_len,
        query_rev: hit.query_rev,
        target_rev: hit.target_rev,
        sa_idx: hit.sa_idx,
    }
}

/// 单条 read 的重叠：正向序列，以及（可选）反向互补序列。
/// 目标为自身的命中被丢弃。
pub fn overlaps_for_read(fm: &FMIndex, sa: &SuffixArray, query_id: usize, seq: &[dna::Symbol], opt: &OverlapOpt) -> Vec<Overlap> {
    let mut hits = Vec::new();
    prefix_hits(fm, query_id, seq, opt.min_overlap, false, false, &mut hits);
    if opt.reverse_complement {
        let rc = dna::revcomp(seq);
        prefix_hits(fm, query_id, &rc, opt.min_overlap, false, true, &mut hits);
    }
    hits.iter().map(|h| resolve(h, sa)).filter(|o| o.target_id != o.query_id).collect()
}

/// 对 read 表中每条序列做重叠搜索。
///
/// 按 read 切分到 rayon 线程池，各线程只读共享索引；结果按 read 顺序合并。
pub fn find_overlaps(fm: &FMIndex, sa: &SuffixArray, reads: &ReadTable, opt: &OverlapOpt) -> Result<Vec<Overlap>> {
    if sa.len() != fm.len() || sa.num_strings() != fm.num_strings() {
        return Err(FmError::Validation(format!(
            "suffix array (n={}, {} strings) does not match the index (n={}, {} strings)",
            sa.len(),
            sa.num_strings(),
            fm.len(),
            fm.num_strings()
        )));
    }
    let threads = opt.threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    debug!("overlap search: {} reads, {} threads, min overlap {}", reads.len(), threads, opt.min_overlap);

    let per_read: Vec<Vec<Overlap>> = pool.install(|| {
        reads
            .as_slice()
            .par_iter()
            .enumerate()
            .map(|(qid, item)| overlaps_for_read(fm, sa, qid, &item.seq, opt))
            .collect()
    });
    let overlaps: Vec<Overlap> = per_read.into_iter().flatten().collect();
    info!("found {} overlaps among {} reads", overlaps.len(), reads.len());
    Ok(overlaps)
}

/// 以 TSV 输出：`query  target  query_offset  overlap_len  query_rev  target_rev  sa_idx`
pub fn write_overlaps<W: Write>(w: &mut W, overlaps: &[Overlap], reads: &ReadTable) -> Result<()> {
    let name = |id: usize| reads.get(id).map_or("*", |r| r.id.as_str());
    for o in overlaps {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            name(o.query_id),
            name(o.target_id),
            o.query_offset,
            o.overlap_len,
            u8::from(o.query_rev),
            u8::from(o.target_rev),
            o.sa_idx
        )?;
    }
    Ok(())
}
