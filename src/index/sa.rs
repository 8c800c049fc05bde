use crate::io::reads::ReadTable;
use crate::util::dna::{self, Symbol};

/// 广义后缀数组中的一项：后缀起始于第 `id` 条序列的 `pos` 位置。
/// `pos == len` 表示只含终止符的后缀。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaElem {
    pub id: usize,
    pub pos: usize,
}

/// 多条序列上的广义后缀数组（每条序列隐式以 `$` 结尾）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuffixArray {
    elems: Vec<SaElem>,
    num_strings: usize,
}

impl SuffixArray {
    pub fn new(elems: Vec<SaElem>, num_strings: usize) -> Self {
        Self { elems, num_strings }
    }

    /// 构建广义后缀数组（倍增法，O(n log n) 排序）。
    ///
    /// 各序列的 `$` 互不相同且都小于任何碱基，`$` 之间按所在序列的字典序排列
    /// （序列相同再按编号）。这样只含 `$` 的后缀排在最前，且第 k 个 `$` 行
    /// 恰好对应 BWT 中按行序第 k 个 `$`，重叠搜索得到的 `$` 行可以直接回查序列。
    pub fn build(reads: &ReadTable) -> Self {
        let num_strings = reads.len();
        let n = reads.total_bases() + num_strings;
        if n == 0 {
            return Self { elems: Vec::new(), num_strings };
        }
        let sentinel_rank = sentinel_order(reads);

        // 拼接文本：碱基的初始 rank 排在所有终止符之后
        let mut owner: Vec<SaElem> = Vec::with_capacity(n);
        let mut rank: Vec<i64> = Vec::with_capacity(n);
        for (id, item) in reads.iter().enumerate() {
            for (pos, &s) in item.seq.iter().enumerate() {
                owner.push(SaElem { id, pos });
                rank.push((num_strings + s.index()) as i64);
            }
            owner.push(SaElem { id, pos: item.seq.len() });
            rank.push(sentinel_rank[id] as i64);
        }

        let mut sa: Vec<usize> = (0..n).collect();
        let mut tmp: Vec<i64> = vec![0; n];
        let mut k = 1usize;
        loop {
            let key = |i: usize| (rank[i], if i + k < n { rank[i + k] } else { -1 });
            sa.sort_unstable_by_key(|&i| key(i));

            tmp[sa[0]] = 0;
            for i in 1..n {
                let a = sa[i - 1];
                let b = sa[i];
                tmp[b] = tmp[a] + i64::from(key(a) != key(b));
            }
            rank.copy_from_slice(&tmp);
            if rank[sa[n - 1]] as usize == n - 1 || k >= n {
                break;
            }
            k <<= 1;
        }

        Self { elems: sa.into_iter().map(|i| owner[i]).collect(), num_strings }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn num_strings(&self) -> usize {
        self.num_strings
    }

    #[inline]
    pub fn get(&self, i: usize) -> SaElem {
        self.elems[i]
    }

    pub fn elems(&self) -> &[SaElem] {
        &self.elems
    }

    pub fn iter(&self) -> impl Iterator<Item = &SaElem> {
        self.elems.iter()
    }

    /// 第 i 个后缀的文本（含结尾 `$`），用于调试输出
    pub fn suffix(&self, i: usize, reads: &ReadTable) -> String {
        let e = self.elems[i];
        match reads.get(e.id) {
            Some(item) if e.pos <= item.seq.len() => {
                let mut s = dna::decode(&item.seq[e.pos..]);
                s.push(Symbol::Sentinel.to_ascii() as char);
                s
            }
            _ => String::new(),
        }
    }
}

/// 每条序列的 `$` 的次序：按序列内容排序，内容相同按编号
fn sentinel_order(reads: &ReadTable) -> Vec<usize> {
    let seqs: Vec<&[Symbol]> = reads.iter().map(|r| r.seq.as_slice()).collect();
    let mut ids: Vec<usize> = (0..seqs.len()).collect();
    ids.sort_by(|&a, &b| seqs[a].cmp(seqs[b]).then(a.cmp(&b)));
    let mut order = vec![0usize; ids.len()];
    for (r, id) in ids.into_iter().enumerate() {
        order[id] = r;
    }
    order
}
