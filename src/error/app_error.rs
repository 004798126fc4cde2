use thiserror::Error;

/// 应用错误
///
/// 只有威胁到资金连续性或哈希链完整性的情况才会成为 Err，
/// 整个小时单元原子性中止、零部分写入。
/// 正常业务结果（入场被风控拒绝、重试耗尽、禁止做空拒单）
/// 不走错误通道，作为可审计事件记录在行数据与日志中。
#[derive(Error, Debug)]
pub enum AppError {
    /// 前置条件缺失或歧义（运行上下文 / 风控配置 / 资金引导状态）
    #[error("precondition abort: {0}")]
    PreconditionAbort(String),

    /// 已存在行哈希与期望不一致，完整性硬失败，需要人工介入
    #[error("hash mismatch on {table} key={key}: expected {expected}, actual {actual}")]
    LedgerHashMismatchAbort {
        table: &'static str,
        key: String,
        expected: String,
        actual: String,
    },

    /// 非零持仓找不到任何估值来源
    #[error("no mark source for non-zero position: {0}")]
    MarkSourceMissing(String),

    /// 追加写保护（迁移锁）被占用
    #[error("append-only guard rejected write: {0}")]
    WriteGuardRejected(String),

    /// 数据库错误
    #[error("database error: {0}")]
    DbError(#[from] sqlx::Error),

    /// 序列化错误
    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// 交易所适配器错误
    #[error("exchange adapter error: {0}")]
    ExchangeError(String),

    #[error("{0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
