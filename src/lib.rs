//! # fm-overlap
//!
//! 基于广义后缀数组的 BWT / FM 索引，面向序列组装中的两类查询：
//!
//! - **精确匹配**：反向搜索（backward search）得到后缀数组区间
//! - **重叠检测**：查找某条序列的后缀与其他序列前缀完全相同、且长度不小于阈值的所有重叠
//!
//! ## 快速示例
//!
//! ```rust
//! use fm_overlap::index::{fm::{FMIndex, IndexOpt}, sa::SuffixArray};
//! use fm_overlap::io::reads::ReadTable;
//! use fm_overlap::overlap::{self, OverlapOpt};
//!
//! let reads = ReadTable::from_seqs(&["ACGT", "CGTA"]).unwrap();
//! let sa = SuffixArray::build(&reads);
//! let fm = FMIndex::build(&sa, &reads, &IndexOpt::default()).unwrap();
//!
//! // 精确匹配
//! let iv = fm.backward_search(b"CGT").unwrap();
//! assert_eq!(iv.len(), 2);
//!
//! // ACGT 的后缀 CGT 与 CGTA 的前缀重叠
//! let opt = OverlapOpt { min_overlap: 3, threads: 1, reverse_complement: false };
//! let ovs = overlap::find_overlaps(&fm, &sa, &reads, &opt).unwrap();
//! assert_eq!((ovs[0].query_id, ovs[0].target_id, ovs[0].overlap_len), (0, 1, 3));
//! ```
//!
//! ## 模块说明
//!
//! - [`index`] — 后缀数组、BWT、Occ / C 表、FM 索引与持久化记录
//! - [`overlap`] — 前缀命中搜索与批量重叠检测
//! - [`io`] — FASTA / FASTQ 解析与 read 表
//! - [`util`] — 字母表编码、反向互补
//! - [`error`] — 错误类型

pub mod error;
pub mod index;
pub mod io;
pub mod overlap;
pub mod util;

pub use error::{FmError, Result};
