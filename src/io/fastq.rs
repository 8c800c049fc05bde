use std::io::BufRead;

use crate::error::{FmError, Result};
use crate::io::fasta::split_header;

#[derive(Debug, Clone)]
pub struct FastqRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

/// 四行一条的 FASTQ 读取器（不支持折行序列）
pub struct FastqReader<R: BufRead> {
    reader: R,
    buf: String,
    line_no: usize,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: String::new(), line_no: 0 }
    }

    fn read_line(&mut self) -> Result<bool> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf)?;
        self.line_no += 1;
        Ok(n > 0)
    }

    fn fail(&self, msg: &str) -> FmError {
        FmError::Parse(format!("FASTQ line {}: {}", self.line_no, msg))
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>> {
        // 跳过记录之间的空行
        loop {
            if !self.read_line()? {
                return Ok(None);
            }
            if !self.buf.trim().is_empty() {
                break;
            }
        }
        let header = match self.buf.trim_end().strip_prefix('@') {
            Some(h) => h.to_string(),
            None => return Err(self.fail("header not starting with '@'")),
        };
        let (id, desc) = split_header(&header);

        if !self.read_line()? {
            return Err(self.fail("unexpected EOF after header"));
        }
        let seq: Vec<u8> = self.buf.trim_end().bytes().map(|b| b.to_ascii_uppercase()).collect();

        if !self.read_line()? || !self.buf.starts_with('+') {
            return Err(self.fail("missing '+' line"));
        }

        if !self.read_line()? {
            return Err(self.fail("missing quality line"));
        }
        let qual = self.buf.trim_end().as_bytes().to_vec();
        if qual.len() != seq.len() {
            return Err(self.fail("seq/qual length mismatch"));
        }

        Ok(Some(FastqRecord { id, desc, seq, qual }))
    }
}
