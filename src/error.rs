use thiserror::Error;

/// crate 统一的错误类型。
///
/// 构建与反序列化阶段的错误对当前索引实例不可恢复，直接返回给调用方；
/// 查询阶段的"未找到"不是错误，由空区间表示。
#[derive(Debug, Error)]
pub enum FmError {
    /// 字母表之外的字符（合法字符为 `$ACGT`）
    #[error("byte {byte:#04x} at position {pos} is outside the alphabet $ACGT")]
    InvalidSymbol { byte: u8, pos: usize },

    /// 后缀数组引用了 read 表之外的序列或偏移
    #[error("suffix array row {row} references read {id} offset {pos}, outside the read table")]
    SuffixOutOfBounds { row: usize, id: usize, pos: usize },

    /// 持久化记录格式错误，整条记录被拒绝
    #[error("malformed index record: {0}")]
    MalformedRecord(String),

    /// rank 结构与 BWT 串不一致
    #[error("validation failed: {0}")]
    Validation(String),

    /// 输入文件（FASTA / FASTQ）解析错误
    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, FmError>;
