use crate::index::fm::FMIndex;
use crate::index::occ::OccIndex;
use crate::util::dna::Symbol;

/// 一次前缀命中：查询串 w 的后缀 `w[query_offset..]`（长度 `overlap_len`）
/// 与某条序列从起点开始的前缀完全相同。
///
/// `sa_idx` 位于后缀数组的 `$` 行区间内；方向标记原样透传，索引本身不关心反向互补。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub query_id: usize,
    pub sa_idx: usize,
    pub query_offset: usize,
    pub overlap_len: usize,
    pub target_rev: bool,
    pub query_rev: bool,
}

/// 在反向搜索的每一步检查已匹配后缀是否达到 `min_overlap`，
/// 若达到则把当前区间中 BWT 为 `$` 的行（即从某条序列起点开始的匹配）作为命中追加到 `hits`。
///
/// 只在真正的扩展步之后检查（用最后一个字符初始化区间那一步不算），
/// 因此重叠长度至少为 2，单字符查询不会产生命中。
/// 不同长度的重叠分别报告，同一目标可能出现多次。返回新增命中数。
pub fn prefix_hits<O: OccIndex>(
    fm: &FMIndex<O>,
    query_id: usize,
    w: &[Symbol],
    min_overlap: usize,
    target_rev: bool,
    query_rev: bool,
    hits: &mut Vec<Hit>,
) -> usize {
    let before = hits.len();
    let len = w.len();
    fm.backward_search_with(w, |j, iv| {
        let overlap_len = len - j;
        if j + 1 == len || overlap_len < min_overlap {
            return;
        }
        let t = fm.terminated_interval(iv);
        for sa_idx in t.rows() {
            hits.push(Hit { query_id, sa_idx, query_offset: j, overlap_len, target_rev, query_rev });
        }
    });
    hits.len() - before
}
