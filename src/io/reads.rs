use log::info;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{FmError, Result};
use crate::io::{fasta::FastaReader, fastq::FastqReader};
use crate::util::dna::{self, Symbol};

/// read 表中的一条序列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqItem {
    pub id: String,
    pub seq: Vec<Symbol>,
}

/// 按输入顺序编号的序列集合；索引中的序列编号即这里的下标
#[derive(Debug, Clone, Default)]
pub struct ReadTable {
    reads: Vec<SeqItem>,
}

impl ReadTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: SeqItem) {
        self.reads.push(item);
    }

    /// 由裸序列构造，编号依次命名为 `read0`, `read1`, ...
    pub fn from_seqs<S: AsRef<[u8]>>(seqs: &[S]) -> Result<Self> {
        let mut table = Self::new();
        for (i, s) in seqs.iter().enumerate() {
            table.push(SeqItem { id: format!("read{}", i), seq: dna::encode_bases(s.as_ref())? });
        }
        Ok(table)
    }

    /// 读取 FASTA 或 FASTQ（按第一个非空白字节判断格式）
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut buf = BufReader::new(reader);
        let first = loop {
            let chunk = buf.fill_buf()?;
            if chunk.is_empty() {
                return Ok(Self::new());
            }
            match chunk.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(i) => break chunk[i],
                None => {
                    let len = chunk.len();
                    buf.consume(len);
                }
            }
        };

        let mut table = Self::new();
        match first {
            b'>' => {
                let mut r = FastaReader::new(buf);
                while let Some(rec) = r.next_record()? {
                    table.push_encoded(rec.id, &rec.seq)?;
                }
            }
            b'@' => {
                let mut r = FastqReader::new(buf);
                while let Some(rec) = r.next_record()? {
                    table.push_encoded(rec.id, &rec.seq)?;
                }
            }
            other => {
                return Err(FmError::Parse(format!(
                    "unrecognised read file: expected '>' or '@', found {:?}",
                    other as char
                )))
            }
        }
        Ok(table)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)?;
        let table = Self::from_reader(f)?;
        info!("loaded {} reads ({} bases) from {}", table.len(), table.total_bases(), path.display());
        Ok(table)
    }

    fn push_encoded(&mut self, id: String, seq: &[u8]) -> Result<()> {
        let syms = dna::encode_bases(seq).map_err(|e| match e {
            FmError::InvalidSymbol { byte, pos } => {
                FmError::Parse(format!("read '{}': byte {:?} at position {} is not A/C/G/T", id, byte as char, pos))
            }
            other => other,
        })?;
        self.push(SeqItem { id, seq: syms });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&SeqItem> {
        self.reads.get(idx)
    }

    pub fn as_slice(&self) -> &[SeqItem] {
        &self.reads
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeqItem> {
        self.reads.iter()
    }

    pub fn total_bases(&self) -> usize {
        self.reads.iter().map(|r| r.seq.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn sniff_fasta() {
        let data = b"\n>r1 desc\nACGT\n>r2\ncgta\n";
        let t = ReadTable::from_reader(Cursor::new(&data[..])).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0).unwrap().id, "r1");
        assert_eq!(dna::decode(&t.get(1).unwrap().seq), "CGTA");
        assert_eq!(t.total_bases(), 8);
    }

    #[test]
    fn slice_view_keeps_input_order() {
        let t = ReadTable::from_seqs(&["GATT", "ACA", "T"]).unwrap();
        let ids: Vec<&str> = t.as_slice().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["read0", "read1", "read2"]);
        assert_eq!(t.as_slice().len(), t.len());
        assert_eq!(t.as_slice()[1].seq, dna::encode(b"ACA").unwrap());
    }

    #[test]
    fn sniff_fastq() {
        let data = b"@q1\nACGT\n+\nIIII\n@q2\nGG\n+\nII\n";
        let t = ReadTable::from_reader(Cursor::new(&data[..])).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(1).unwrap().id, "q2");
        assert_eq!(t.get(1).unwrap().seq, vec![Symbol::G, Symbol::G]);
    }

    #[test]
    fn rejects_ambiguous_bases() {
        let data = b">r1\nACNT\n";
        let err = ReadTable::from_reader(Cursor::new(&data[..])).unwrap_err();
        assert!(matches!(err, FmError::Parse(_)));
    }

    #[test]
    fn rejects_unknown_format() {
        let err = ReadTable::from_reader(Cursor::new(&b"ACGT\n"[..])).unwrap_err();
        assert!(matches!(err, FmError::Parse(_)));
        assert!(ReadTable::from_reader(Cursor::new(&b"  \n"[..])).unwrap().is_empty());
    }
}
