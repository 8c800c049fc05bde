use crate::error::{FmError, Result};
use crate::index::sa::SuffixArray;
use crate::io::reads::ReadTable;
use crate::util::dna::Symbol;

/// 根据广义后缀数组构建 BWT 串（循环 BWT）。
///
/// 第 i 行对应后缀 (id, pos)：`pos == 0` 时前驱是该序列的终止符 `$`，
/// 否则是 `seq[pos - 1]`。后缀数组引用了 read 表之外的序列或偏移时返回错误。
pub fn build_bwt(sa: &SuffixArray, reads: &ReadTable) -> Result<Vec<Symbol>> {
    let mut bwt = Vec::with_capacity(sa.len());
    for (row, e) in sa.iter().enumerate() {
        let out_of_bounds = || FmError::SuffixOutOfBounds { row, id: e.id, pos: e.pos };
        let item = reads.get(e.id).ok_or_else(out_of_bounds)?;
        if e.pos > item.seq.len() {
            return Err(out_of_bounds());
        }
        let prev = if e.pos == 0 { Symbol::Sentinel } else { item.seq[e.pos - 1] };
        bwt.push(prev);
    }
    Ok(bwt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::sa::SaElem;
    use crate::util::dna;

    #[test]
    fn bwt_two_reads() {
        let reads = ReadTable::from_seqs(&["ACGT", "CGTA"]).unwrap();
        let sa = SuffixArray::build(&reads);
        let bwt = build_bwt(&sa, &reads).unwrap();
        assert_eq!(dna::decode(&bwt), "TAT$A$CCGG");
    }

    #[test]
    fn one_sentinel_per_read() {
        let reads = ReadTable::from_seqs(&["GATTACA", "TTAG", "C"]).unwrap();
        let sa = SuffixArray::build(&reads);
        let bwt = build_bwt(&sa, &reads).unwrap();
        assert_eq!(bwt.len(), reads.total_bases() + reads.len());
        assert_eq!(bwt.iter().filter(|&&s| s == Symbol::Sentinel).count(), 3);
    }

    #[test]
    fn out_of_bounds_reference_is_error() {
        let reads = ReadTable::from_seqs(&["AC"]).unwrap();
        let bad_pos = SuffixArray::new(vec![SaElem { id: 0, pos: 2 }, SaElem { id: 0, pos: 3 }], 1);
        assert!(matches!(
            build_bwt(&bad_pos, &reads),
            Err(FmError::SuffixOutOfBounds { row: 1, id: 0, pos: 3 })
        ));
        let bad_id = SuffixArray::new(vec![SaElem { id: 4, pos: 0 }], 1);
        assert!(matches!(build_bwt(&bad_id, &reads), Err(FmError::SuffixOutOfBounds { row: 0, id: 4, .. })));
    }
}
