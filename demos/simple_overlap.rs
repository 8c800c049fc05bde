//! 演示如何在 library 模式下使用 fm-overlap 做精确匹配和重叠检测。
//!
//! 运行方式：
//! ```bash
//! cargo run --example simple_overlap
//! ```

use fm_overlap::index::fm::{FMIndex, IndexOpt};
use fm_overlap::index::sa::SuffixArray;
use fm_overlap::io::reads::ReadTable;
use fm_overlap::overlap::{self, OverlapOpt};
use fm_overlap::util::dna;

fn main() -> fm_overlap::Result<()> {
    // 1. 一组首尾相互重叠的 read
    let seqs = ["ACGTACGTAGCTGATC", "GTAGCTGATCGTAGCT", "GATCGTAGCTAGCTAG", "AGCTAGCTAGCTGATC"];
    let reads = ReadTable::from_seqs(&seqs)?;
    println!("reads: {}", reads.len());

    // 2. 构建广义后缀数组与 FM 索引
    let sa = SuffixArray::build(&reads);
    let fm = FMIndex::build(&sa, &reads, &IndexOpt { sample_rate: 16 })?;
    println!("BWT: {}", dna::decode(fm.bwt()));
    println!("{}", fm.size_report());

    // 3. 精确匹配
    for pattern in ["GCTGATC", "TAGCT", "AAAA"] {
        let iv = fm.backward_search(pattern.as_bytes())?;
        println!("\n'{}' -> interval {} ({} hits)", pattern, iv, iv.len());
        for row in iv.rows() {
            let e = sa.get(row);
            println!("  read={} offset={}", reads.get(e.id).map_or("*", |r| r.id.as_str()), e.pos);
        }
    }

    // 4. 重叠检测
    let opt = OverlapOpt { min_overlap: 6, threads: 2, reverse_complement: false };
    let overlaps = overlap::find_overlaps(&fm, &sa, &reads, &opt)?;
    println!("\noverlaps (min {}):", opt.min_overlap);
    let mut out = std::io::stdout();
    overlap::write_overlaps(&mut out, &overlaps, &reads)?;
    Ok(())
}
