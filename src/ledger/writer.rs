//! 小时批次写入器
//!
//! 整小时的行 + 清单在一个事务里落库。逐行三态写结果的处理策略：
//! Inserted / AlreadyPresentMatching 计数后继续，Conflict 立即
//! 回滚并升级为完整性硬失败。

use tracing::{error, info};

use crate::domain::entities::ReplayManifest;
use crate::domain::HourScope;
use crate::error::{AppError, AppResult};
use crate::store::{ReplayRow, RowSink, WriteOutcome};

/// 一次小时提交的写入统计
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitStats {
    pub inserted: usize,
    /// 幂等命中（重复执行同一小时）
    pub matched: usize,
}

/// 以事务提交一个小时的全部行与清单
pub async fn commit_hour_rows<S: RowSink + ?Sized>(
    sink: &S,
    scope: &HourScope,
    rows: &[ReplayRow],
    manifest: &ReplayManifest,
) -> AppResult<CommitStats> {
    sink.begin_hour(scope).await?;

    let mut stats = CommitStats::default();
    for row in rows {
        let outcome = match sink.insert_row(row).await {
            Ok(outcome) => outcome,
            Err(e) => {
                sink.abort_hour().await?;
                return Err(e);
            }
        };
        match outcome {
            WriteOutcome::Inserted => stats.inserted += 1,
            WriteOutcome::AlreadyPresentMatching => stats.matched += 1,
            WriteOutcome::Conflict { expected, actual } => {
                sink.abort_hour().await?;
                error!(
                    scope = %scope,
                    table = row.table().table_name(),
                    key = row.natural_key(),
                    "行哈希冲突，小时批次已回滚"
                );
                return Err(AppError::LedgerHashMismatchAbort {
                    table: row.table().table_name(),
                    key: row.natural_key().to_string(),
                    expected,
                    actual,
                });
            }
        }
    }

    let outcome = match sink.insert_manifest(manifest).await {
        Ok(outcome) => outcome,
        Err(e) => {
            sink.abort_hour().await?;
            return Err(e);
        }
    };
    match outcome {
        WriteOutcome::Inserted => stats.inserted += 1,
        WriteOutcome::AlreadyPresentMatching => stats.matched += 1,
        WriteOutcome::Conflict { expected, actual } => {
            sink.abort_hour().await?;
            error!(scope = %scope, "清单根哈希冲突，小时批次已回滚");
            return Err(AppError::LedgerHashMismatchAbort {
                table: "replay_manifests",
                key: manifest.manifest_id.clone(),
                expected,
                actual,
            });
        }
    }

    sink.commit_hour().await?;
    info!(
        scope = %scope,
        inserted = stats.inserted,
        matched = stats.matched,
        root = %manifest.root_hash,
        "小时批次已提交"
    );
    Ok(stats)
}
