//! 小时上下文装载
//!
//! 执行一个小时单元所需的全部输入在这里一次性装载并校验，
//! 装载完成后立即计算 seed 哈希。seed 是本小时所有派生行的
//! 哈希链根，上下文装载之后执行过程不再读库。
//!
//! 前置校验失败一律整小时中止：运行上下文缺失、风控配置区间
//! 不恰好命中一条、资金引导状态缺失，都不允许"带病执行"。

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::domain::entities::*;
use crate::domain::enums::RunMode;
use crate::domain::HourScope;
use crate::error::{AppError, AppResult};
use crate::hashing::GENESIS_HASH;
use crate::store::SnapshotReader;
use crate::time_util::HOUR_MS;

/// 带剩余量的持仓批次（批次行 + 此前全部分配的差）
#[derive(Debug, Clone)]
pub struct OpenLot {
    pub lot: PositionLot,
    pub remaining: f64,
}

/// 一个 (run, account, hour) 单元的完整执行输入
#[derive(Debug, Clone)]
pub struct HourContext {
    pub scope: HourScope,
    pub run: RunContext,
    pub profile: RiskProfile,
    /// 剩余量 > 0 的批次，按 (acquired_ts, lot_id) 升序
    pub open_lots: Vec<OpenLot>,
    /// 小时开始时的现金（流水尾 / 初始资金）
    pub cash_balance: f64,
    /// 本小时第一条流水的 prev_hash
    pub ledger_head_hash: String,
    pub prior_risk: Option<RiskHourlyState>,
    /// 本小时市场快照，按资产索引
    pub market: BTreeMap<String, AssetMarketData>,
    /// 本小时模型预测，按资产索引
    pub predictions: BTreeMap<String, PredictionRecord>,
    /// 持有资产的最近成交价（市场快照缺失时的估值回退）
    pub fallback_marks: BTreeMap<String, f64>,
    pub seed_hash: String,
}

impl HourContext {
    /// 某资产当前持有总量
    pub fn held_quantity(&self, asset: &str) -> f64 {
        self.open_lots
            .iter()
            .filter(|l| l.lot.asset == asset)
            .map(|l| l.remaining)
            .sum()
    }

    /// 当前持有的资产集合（确定性升序）
    pub fn held_assets(&self) -> Vec<String> {
        let mut assets: Vec<String> = self
            .open_lots
            .iter()
            .map(|l| l.lot.asset.clone())
            .collect();
        assets.sort();
        assets.dedup();
        assets
    }
}

const LOT_EPSILON: f64 = 1e-9;

/// 装载并校验一个小时单元的执行上下文
pub async fn load_hour_context<S: SnapshotReader + ?Sized>(
    store: &S,
    scope: &HourScope,
) -> AppResult<HourContext> {
    if scope.hour_ts % HOUR_MS != 0 {
        return Err(AppError::PreconditionAbort(format!(
            "hour_ts {} is not aligned to an hour boundary",
            scope.hour_ts
        )));
    }

    let run = store
        .run_context(&scope.run_id)
        .await?
        .ok_or_else(|| {
            AppError::PreconditionAbort(format!("run context {} not found", scope.run_id))
        })?;
    if run.account_id != scope.account_id {
        return Err(AppError::PreconditionAbort(format!(
            "run {} belongs to account {}, not {}",
            scope.run_id, run.account_id, scope.account_id
        )));
    }
    if scope.hour_ts < run.origin_hour_ts {
        return Err(AppError::PreconditionAbort(format!(
            "hour {} precedes run origin {}",
            scope.hour_ts, run.origin_hour_ts
        )));
    }

    // 风控配置区间必须恰好命中一条
    let assignments = store
        .profile_assignments_at(&scope.account_id, scope.hour_ts)
        .await?;
    let assignment = match assignments.len() {
        1 => &assignments[0],
        0 => {
            return Err(AppError::PreconditionAbort(format!(
                "no risk profile assignment covers account {} at {}",
                scope.account_id, scope.hour_ts
            )))
        }
        n => {
            return Err(AppError::PreconditionAbort(format!(
                "{} risk profile assignments cover account {} at {}",
                n, scope.account_id, scope.hour_ts
            )))
        }
    };
    let profile = store
        .risk_profile(&assignment.profile_id, assignment.profile_version)
        .await?
        .ok_or_else(|| {
            AppError::PreconditionAbort(format!(
                "risk profile {} v{} not found",
                assignment.profile_id, assignment.profile_version
            ))
        })?;

    // 批次 + 此前分配 → 剩余量
    let lots = store
        .lots_before(&scope.run_id, &scope.account_id, scope.hour_ts)
        .await?;
    let allocations = store
        .allocations_before(&scope.run_id, &scope.account_id, scope.hour_ts)
        .await?;
    let mut consumed: BTreeMap<&str, f64> = BTreeMap::new();
    for alloc in &allocations {
        *consumed.entry(alloc.lot_id.as_str()).or_insert(0.0) += alloc.quantity;
    }
    let open_lots: Vec<OpenLot> = lots
        .iter()
        .filter_map(|lot| {
            let remaining = lot.quantity - consumed.get(lot.lot_id.as_str()).copied().unwrap_or(0.0);
            (remaining > LOT_EPSILON).then(|| OpenLot {
                lot: lot.clone(),
                remaining,
            })
        })
        .collect();

    // 资金引导：流水尾优先，BACKTEST 链首允许初始资金
    let tail = store
        .ledger_tail(&scope.run_id, &scope.account_id, scope.hour_ts)
        .await?;
    let (cash_balance, ledger_head_hash) = match (&tail, run.run_mode) {
        (Some(entry), _) => (entry.balance_after, entry.row_hash.clone()),
        (None, RunMode::Backtest) => {
            let capital = run.initial_capital.ok_or_else(|| {
                AppError::PreconditionAbort(format!(
                    "backtest run {} has no initial capital and no ledger history",
                    scope.run_id
                ))
            })?;
            (capital, GENESIS_HASH.to_string())
        }
        (None, mode) => {
            return Err(AppError::PreconditionAbort(format!(
                "{} run {} has no ledger history to bootstrap from",
                mode.as_str(),
                scope.run_id
            )))
        }
    };

    let prior_risk = store
        .risk_state_before(&scope.run_id, &scope.account_id, scope.hour_ts)
        .await?;

    let market: BTreeMap<String, AssetMarketData> = store
        .market_snapshot(scope.hour_ts)
        .await?
        .into_iter()
        .map(|m| (m.asset.clone(), m))
        .collect();
    let predictions: BTreeMap<String, PredictionRecord> = store
        .predictions(scope.hour_ts)
        .await?
        .into_iter()
        .map(|p| (p.asset.clone(), p))
        .collect();

    // 持有但无本小时市场行的资产，预取最近成交价作估值回退
    let mut fallback_marks: BTreeMap<String, f64> = BTreeMap::new();
    {
        let mut held: Vec<&str> = open_lots.iter().map(|l| l.lot.asset.as_str()).collect();
        held.sort();
        held.dedup();
        for asset in held {
            if let Some(price) = store
                .latest_fill_price(&scope.run_id, &scope.account_id, asset, scope.hour_ts)
                .await?
            {
                fallback_marks.insert(asset.to_string(), price);
            }
        }
    }

    let seed_hash = derive_seed_hash(
        scope,
        &run,
        &profile,
        &open_lots,
        &ledger_head_hash,
        prior_risk.as_ref(),
        &market,
        &predictions,
        &fallback_marks,
    );

    debug!(
        scope = %scope,
        open_lots = open_lots.len(),
        assets = market.len(),
        "小时上下文装载完成"
    );
    info!(scope = %scope, seed = %seed_hash, "seed 哈希已确定");

    Ok(HourContext {
        scope: scope.clone(),
        run,
        profile,
        open_lots,
        cash_balance,
        ledger_head_hash,
        prior_risk,
        market,
        predictions,
        fallback_marks,
        seed_hash,
    })
}

/// seed = SHA-256(全部已校验输入的规范化帧，固定顺序)
///
/// 任何输入变化（配置版本、持仓边界、市场行、预测行）都会改变
/// seed，进而改变本小时每一行的哈希。
#[allow(clippy::too_many_arguments)]
fn derive_seed_hash(
    scope: &HourScope,
    run: &RunContext,
    profile: &RiskProfile,
    open_lots: &[OpenLot],
    ledger_head_hash: &str,
    prior_risk: Option<&RiskHourlyState>,
    market: &BTreeMap<String, AssetMarketData>,
    predictions: &BTreeMap<String, PredictionRecord>,
    fallback_marks: &BTreeMap<String, f64>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("scope|{}\n", scope));
    hasher.update(run.canonical());
    hasher.update("\n");
    hasher.update(profile.canonical());
    hasher.update("\n");
    for lot in open_lots {
        hasher.update(&lot.lot.row_hash);
        hasher.update(format!("|remaining={:.8}\n", lot.remaining));
    }
    hasher.update(format!("ledger_head|{}\n", ledger_head_hash));
    match prior_risk {
        Some(state) => hasher.update(format!("risk_prior|{}\n", state.row_hash)),
        None => hasher.update("risk_prior|none\n"),
    }
    for data in market.values() {
        hasher.update(data.canonical());
        hasher.update("\n");
    }
    for prediction in predictions.values() {
        hasher.update(prediction.canonical());
        hasher.update("\n");
    }
    for (asset, price) in fallback_marks {
        hasher.update(format!("fallback_mark|{}={:.8}\n", asset, price));
    }
    hex::encode(hasher.finalize())
}
