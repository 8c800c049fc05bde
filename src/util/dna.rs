use crate::error::{FmError, Result};

/// 字母表大小：{$, A, C, G, T}
pub const SIGMA: usize = 5;

/// 索引字母表中的一个字符，按字典序排列：`$ < A < C < G < T`。
///
/// `$` 是每条序列的终止符。计数结构都是以 `Symbol as usize` 为下标的定长数组。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Symbol {
    Sentinel = 0,
    A = 1,
    C = 2,
    G = 3,
    T = 4,
}

impl Symbol {
    /// 字母表顺序的全部字符
    pub const ALL: [Symbol; SIGMA] = [Symbol::Sentinel, Symbol::A, Symbol::C, Symbol::G, Symbol::T];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(i: usize) -> Option<Symbol> {
        Self::ALL.get(i).copied()
    }

    /// 字母表中的下一个字符（`T` 之后为 `None`）
    #[inline]
    pub fn next(self) -> Option<Symbol> {
        Self::from_index(self.index() + 1)
    }

    #[inline]
    pub fn from_ascii(b: u8) -> Option<Symbol> {
        match b.to_ascii_uppercase() {
            b'$' => Some(Symbol::Sentinel),
            b'A' => Some(Symbol::A),
            b'C' => Some(Symbol::C),
            b'G' => Some(Symbol::G),
            b'T' | b'U' => Some(Symbol::T),
            _ => None,
        }
    }

    #[inline]
    pub fn to_ascii(self) -> u8 {
        match self {
            Symbol::Sentinel => b'$',
            Symbol::A => b'A',
            Symbol::C => b'C',
            Symbol::G => b'G',
            Symbol::T => b'T',
        }
    }

    /// 互补碱基；`$` 映射到自身
    #[inline]
    pub fn complement(self) -> Symbol {
        match self {
            Symbol::Sentinel => Symbol::Sentinel,
            Symbol::A => Symbol::T,
            Symbol::C => Symbol::G,
            Symbol::G => Symbol::C,
            Symbol::T => Symbol::A,
        }
    }
}

/// 将 ASCII 序列编码为字母表字符，遇到 `$ACGTU`（大小写不敏感）之外的字节报错。
pub fn encode(seq: &[u8]) -> Result<Vec<Symbol>> {
    seq.iter()
        .enumerate()
        .map(|(pos, &byte)| Symbol::from_ascii(byte).ok_or(FmError::InvalidSymbol { byte, pos }))
        .collect()
}

/// 编码碱基序列：与 [`encode`] 相同，但不允许出现 `$`。
pub fn encode_bases(seq: &[u8]) -> Result<Vec<Symbol>> {
    let syms = encode(seq)?;
    if let Some(pos) = syms.iter().position(|&s| s == Symbol::Sentinel) {
        return Err(FmError::InvalidSymbol { byte: seq[pos], pos });
    }
    Ok(syms)
}

pub fn decode(syms: &[Symbol]) -> String {
    syms.iter().map(|&s| s.to_ascii() as char).collect()
}

pub fn revcomp(seq: &[Symbol]) -> Vec<Symbol> {
    let mut out = Vec::with_capacity(seq.len());
    for &s in seq.iter().rev() {
        out.push(s.complement());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_order() {
        for w in Symbol::ALL.windows(2) {
            assert!(w[0] < w[1]);
            assert!(w[0].to_ascii() < w[1].to_ascii());
            assert_eq!(w[0].next(), Some(w[1]));
        }
        assert_eq!(Symbol::T.next(), None);
    }

    #[test]
    fn encode_decode() {
        let syms = encode(b"acgTu$").unwrap();
        assert_eq!(syms, vec![Symbol::A, Symbol::C, Symbol::G, Symbol::T, Symbol::T, Symbol::Sentinel]);
        assert_eq!(decode(&syms), "ACGTT$");
    }

    #[test]
    fn encode_rejects_outside_alphabet() {
        match encode(b"ACNT") {
            Err(FmError::InvalidSymbol { byte, pos }) => {
                assert_eq!(byte, b'N');
                assert_eq!(pos, 2);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(encode_bases(b"AC$T"), Err(FmError::InvalidSymbol { pos: 2, .. })));
    }

    #[test]
    fn revcomp_basic() {
        let s = encode(b"AACGT").unwrap();
        assert_eq!(decode(&revcomp(&s)), "ACGTT");
    }
}
