//! 重放比对
//!
//! 独立重走一个小时的推导并与清单对账。失配按固定优先级分类，
//! 一次只报告最先命中的一类：清单缺失 → seed 失配 → 行数失配 →
//! 根失配 → 未分类兜底。

use tracing::{info, warn};

use crate::context::load_hour_context;
use crate::domain::enums::MismatchKind;
use crate::domain::HourScope;
use crate::error::{AppError, AppResult};
use crate::replay::recompute::recompute_row_hashes;
use crate::replay::root::{compute_root, table_counts};
use crate::store::row::RowTable;
use crate::store::{ManifestFilter, SnapshotReader};

/// 一个小时的重放结论
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub scope: HourScope,
    pub ok: bool,
    pub mismatch: Option<MismatchKind>,
    pub detail: String,
}

impl ReplayOutcome {
    fn parity(scope: &HourScope) -> Self {
        Self {
            scope: scope.clone(),
            ok: true,
            mismatch: None,
            detail: String::new(),
        }
    }

    fn mismatch(scope: &HourScope, kind: MismatchKind, detail: String) -> Self {
        Self {
            scope: scope.clone(),
            ok: false,
            mismatch: Some(kind),
            detail,
        }
    }
}

/// 重放单个小时并与清单对账
pub async fn replay_hour<S: SnapshotReader + ?Sized>(
    store: &S,
    scope: &HourScope,
) -> AppResult<ReplayOutcome> {
    let Some(manifest) = store
        .manifest(&scope.run_id, &scope.account_id, scope.hour_ts)
        .await?
    else {
        return Ok(ReplayOutcome::mismatch(
            scope,
            MismatchKind::MissingManifest,
            "no manifest for scope".to_string(),
        ));
    };

    // seed 重算：边界输入任何变化都会在这里暴露
    let ctx = match load_hour_context(store, scope).await {
        Ok(ctx) => ctx,
        Err(AppError::PreconditionAbort(detail)) => {
            return Ok(ReplayOutcome::mismatch(
                scope,
                MismatchKind::UnclassifiedFallback,
                format!("context no longer loadable: {}", detail),
            ))
        }
        Err(e) => return Err(e),
    };
    if ctx.seed_hash != manifest.seed_hash {
        return Ok(ReplayOutcome::mismatch(
            scope,
            MismatchKind::SeedMismatch,
            format!("seed {} != manifest {}", ctx.seed_hash, manifest.seed_hash),
        ));
    }

    let rows = store
        .hour_rows(&scope.run_id, &scope.account_id, scope.hour_ts)
        .await?;
    let counts = table_counts(&rows);
    let expected_counts = manifest.row_counts();
    if rows.len() as i64 != manifest.row_total || counts != expected_counts {
        return Ok(ReplayOutcome::mismatch(
            scope,
            MismatchKind::RowCountMismatch,
            format!(
                "rows {} vs manifest {}; counts {:?} vs {:?}",
                rows.len(),
                manifest.row_total,
                counts,
                expected_counts
            ),
        ));
    }

    let recomputed = recompute_row_hashes(&rows);
    let hashed: Vec<(RowTable, String, String)> = recomputed
        .iter()
        .map(|r| (r.table, r.natural_key.clone(), r.recomputed_hash.clone()))
        .collect();
    let root = compute_root(&ctx.seed_hash, &hashed);
    if root != manifest.root_hash {
        let first_bad = recomputed.iter().find(|r| !r.matches());
        let detail = match first_bad {
            Some(r) => format!(
                "root {} != manifest {}; first divergent row {}:{}",
                root,
                manifest.root_hash,
                r.table.table_name(),
                r.natural_key
            ),
            None => format!("root {} != manifest {}", root, manifest.root_hash),
        };
        return Ok(ReplayOutcome::mismatch(scope, MismatchKind::RootMismatch, detail));
    }

    // 根一致但存在行级偏差在构造上不可能，留兜底分类
    if let Some(bad) = recomputed.iter().find(|r| !r.matches()) {
        return Ok(ReplayOutcome::mismatch(
            scope,
            MismatchKind::UnclassifiedFallback,
            format!("row {}:{} diverges under matching root", bad.table.table_name(), bad.natural_key),
        ));
    }

    Ok(ReplayOutcome::parity(scope))
}

/// 重放一个小时窗口内的全部已见证小时
///
/// 窗口内没有清单则目标集为空，空集平凡为真。
pub async fn replay_window<S: SnapshotReader + ?Sized>(
    store: &S,
    run_id: &str,
    account_id: &str,
    from_hour_ts: i64,
    to_hour_ts: i64,
) -> AppResult<Vec<ReplayOutcome>> {
    let filter = ManifestFilter {
        run_id: Some(run_id.to_string()),
        account_id: Some(account_id.to_string()),
        run_mode: None,
        from_hour_ts: Some(from_hour_ts),
        to_hour_ts: Some(to_hour_ts),
    };
    replay_sweep(store, &filter).await
}

/// 按清单过滤器做重放清扫
pub async fn replay_sweep<S: SnapshotReader + ?Sized>(
    store: &S,
    filter: &ManifestFilter,
) -> AppResult<Vec<ReplayOutcome>> {
    let manifests = store.manifests_filtered(filter).await?;
    let mut outcomes = Vec::with_capacity(manifests.len());
    for manifest in &manifests {
        let scope = HourScope::new(&manifest.run_id, &manifest.account_id, manifest.hour_ts);
        let outcome = replay_hour(store, &scope).await?;
        match (&outcome.ok, &outcome.mismatch) {
            (true, _) => info!(scope = %outcome.scope, "重放对账一致"),
            (false, Some(kind)) => warn!(
                scope = %outcome.scope,
                kind = kind.as_str(),
                detail = %outcome.detail,
                "重放对账失配"
            ),
            _ => {}
        }
        outcomes.push(outcome);
    }
    Ok(outcomes)
}
