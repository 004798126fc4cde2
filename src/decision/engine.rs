//! 决策引擎
//!
//! 输入固定（上下文 + 预测历史），输出固定：同一上下文永远产出
//! 同一组信号。资产按字典序处理，持仓评估先于入场评估，巨亏恢复
//! 先于其它持仓逻辑。
//!
//! 风控拒绝不是错误：被拒绝的入场候选以 RiskEvent 留在小时报告
//! 与日志里，不产生信号行。

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::context::HourContext;
use crate::decision::classifier::classify;
use crate::decision::reason;
use crate::domain::entities::TradeSignal;
use crate::domain::enums::{RecoveryAction, SignalAction, SignalClass};
use crate::error::AppResult;
use crate::risk::drawdown::{assess_drawdown, DrawdownAssessment};
use crate::risk::marks::{portfolio_valuation, PortfolioValuation};
use crate::risk::{entry_fraction, evaluate_recovery, resolve_exposure_limit, should_continue_holding};
use crate::store::SnapshotReader;

/// 入场候选被风控拒绝的可审计事件
#[derive(Debug, Clone)]
pub struct RiskEvent {
    pub asset: String,
    pub reason_code: &'static str,
    pub detail: String,
}

/// 一个小时的决策结果
#[derive(Debug)]
pub struct DecisionOutcome {
    /// 已去重、平仓在前入场在后的信号序列
    pub signals: Vec<TradeSignal>,
    pub risk_events: Vec<RiskEvent>,
    pub drawdown: DrawdownAssessment,
    pub valuation: PortfolioValuation,
}

const CASH_EPSILON: f64 = 1e-9;

/// 对一个小时单元做完整决策
pub async fn decide_hour<S: SnapshotReader + ?Sized>(
    store: &S,
    ctx: &HourContext,
) -> AppResult<DecisionOutcome> {
    let profile = &ctx.profile;
    let valuation = portfolio_valuation(ctx)?;
    let drawdown = assess_drawdown(ctx.prior_risk.as_ref(), valuation.total_value, profile);

    let mut signals: BTreeMap<(String, SignalAction, String), TradeSignal> = BTreeMap::new();
    let mut risk_events: Vec<RiskEvent> = Vec::new();

    let mut emit = |asset: &str, action: SignalAction, class: SignalClass, fraction: f64, code: &str| {
        let key = (asset.to_string(), action, code.to_string());
        signals.entry(key).or_insert_with(|| {
            TradeSignal {
                signal_id: TradeSignal::make_id(&ctx.scope.run_id, ctx.scope.hour_ts, asset, action),
                run_id: ctx.scope.run_id.clone(),
                account_id: ctx.scope.account_id.clone(),
                hour_ts: ctx.scope.hour_ts,
                asset: asset.to_string(),
                action,
                signal_class: class,
                size_fraction: fraction,
                reason_code: code.to_string(),
                drawdown_state: drawdown.state,
                profile_id: profile.profile_id.clone(),
                profile_version: profile.version,
                seed_hash: ctx.seed_hash.clone(),
                row_hash: String::new(),
            }
            .seal()
        });
    };

    // 持仓评估（字典序），巨亏恢复优先
    for asset in ctx.held_assets() {
        let prediction = ctx.predictions.get(&asset);
        let class = prediction
            .map(|p| classify(profile, p.direction_prob))
            .unwrap_or(SignalClass::Neutral);

        let cost_basis: f64 = ctx
            .open_lots
            .iter()
            .filter(|l| l.lot.asset == asset)
            .map(|l| l.remaining * l.lot.price)
            .sum();
        let value = valuation.per_asset_value.get(&asset).copied().unwrap_or(0.0);
        let loss_pct = if cost_basis > 0.0 {
            ((cost_basis - value) / cost_basis).max(0.0)
        } else {
            0.0
        };

        if let Some(action) = evaluate_recovery(profile, loss_pct, prediction) {
            debug!(asset = %asset, loss_pct, ?action, "巨亏恢复评估触发");
            match action {
                RecoveryAction::Hold => {
                    emit(&asset, SignalAction::Hold, class, 0.0, reason::RECOVERY_HOLD)
                }
                RecoveryAction::PartialDeRisk => emit(
                    &asset,
                    SignalAction::DeRisk,
                    class,
                    profile.derisk_fraction,
                    reason::RECOVERY_PARTIAL,
                ),
                RecoveryAction::FullExit => {
                    emit(&asset, SignalAction::Exit, class, 1.0, reason::RECOVERY_EXIT)
                }
            }
            continue;
        }

        if class == SignalClass::StrongNegative {
            let rebound = prediction.map(|p| p.rebound_prob).unwrap_or(0.0);
            if rebound < profile.min_rebound_prob {
                emit(&asset, SignalAction::Exit, class, 1.0, reason::EXIT_STRONG_NEGATIVE);
                continue;
            }
        }

        if let Some(p) = prediction {
            if !should_continue_holding(profile, p) {
                emit(
                    &asset,
                    SignalAction::DeRisk,
                    class,
                    profile.derisk_fraction,
                    reason::ADAPTIVE_DERISK,
                );
            }
        }
    }

    // 入场评估（字典序），候选 = 同时有市场行与预测行的非持仓资产
    let held = ctx.held_assets();
    let mut open_positions = held.len() as i32;
    let total_limit = resolve_exposure_limit(
        profile.exposure_mode,
        profile.max_total_exposure,
        valuation.total_value,
    );
    let cluster_limit = resolve_exposure_limit(
        profile.exposure_mode,
        profile.max_cluster_exposure,
        valuation.total_value,
    );
    let mut total_exposure = valuation.position_value;
    let mut cluster_exposure: BTreeMap<String, f64> = BTreeMap::new();
    for (asset, value) in &valuation.per_asset_value {
        if let Some(data) = ctx.market.get(asset) {
            *cluster_exposure.entry(data.cluster_id.clone()).or_insert(0.0) += value;
        }
    }

    for (asset, prediction) in &ctx.predictions {
        if held.contains(asset) {
            continue;
        }
        let Some(market) = ctx.market.get(asset) else {
            continue;
        };
        let class = classify(profile, prediction.direction_prob);
        if !class.is_positive() {
            continue;
        }

        let Some(entry_code) =
            entry_path(store, ctx, asset, prediction.rebound_prob).await?
        else {
            continue;
        };

        if drawdown.kill_switch_active {
            risk_events.push(RiskEvent {
                asset: asset.clone(),
                reason_code: reason::KILL_SWITCH,
                detail: format!("drawdown {:.4} past hard limit", drawdown.drawdown_pct),
            });
            continue;
        }
        if open_positions >= profile.max_concurrent_positions {
            risk_events.push(RiskEvent {
                asset: asset.clone(),
                reason_code: reason::MAX_POSITIONS,
                detail: format!("{} positions open", open_positions),
            });
            continue;
        }

        // 流动性闸门
        let Some(book) = market.book_top() else {
            risk_events.push(RiskEvent {
                asset: asset.clone(),
                reason_code: reason::LIQUIDITY_UNAVAILABLE,
                detail: "no book top for entry".to_string(),
            });
            continue;
        };
        let spread = book.spread_bps();
        if spread > profile.max_spread_bps {
            risk_events.push(RiskEvent {
                asset: asset.clone(),
                reason_code: reason::SPREAD_TOO_WIDE,
                detail: format!("spread {:.2}bps > {:.2}bps", spread, profile.max_spread_bps),
            });
            continue;
        }
        if book.bid_sz.min(book.ask_sz) < profile.min_book_depth {
            risk_events.push(RiskEvent {
                asset: asset.clone(),
                reason_code: reason::BOOK_DEPTH_LOW,
                detail: format!("depth {:.4} < {:.4}", book.bid_sz.min(book.ask_sz), profile.min_book_depth),
            });
            continue;
        }

        // 尺寸与敞口余量，名义被余量截断
        let fraction = entry_fraction(profile, market.volatility);
        let notional = fraction * ctx.cash_balance;
        let cluster_used = cluster_exposure
            .get(&market.cluster_id)
            .copied()
            .unwrap_or(0.0);
        let headroom = (total_limit - total_exposure).min(cluster_limit - cluster_used);
        let clipped = notional.min(headroom);
        if clipped <= CASH_EPSILON || ctx.cash_balance <= CASH_EPSILON {
            risk_events.push(RiskEvent {
                asset: asset.clone(),
                reason_code: reason::EXPOSURE_LIMIT,
                detail: format!("headroom {:.2} for notional {:.2}", headroom, notional),
            });
            continue;
        }

        open_positions += 1;
        total_exposure += clipped;
        *cluster_exposure.entry(market.cluster_id.clone()).or_insert(0.0) += clipped;
        emit(
            asset,
            SignalAction::Enter,
            class,
            clipped / ctx.cash_balance,
            entry_code,
        );
    }

    let mut signals: Vec<TradeSignal> = signals.into_values().collect();
    signals.sort_by(|a, b| (a.action, &a.asset).cmp(&(b.action, &b.asset)));

    for event in &risk_events {
        info!(
            scope = %ctx.scope,
            asset = %event.asset,
            code = %event.reason_code,
            detail = %event.detail,
            "入场候选被风控拒绝"
        );
    }
    info!(
        scope = %ctx.scope,
        signals = signals.len(),
        rejected = risk_events.len(),
        drawdown = %drawdown.state.as_str(),
        "决策完成"
    );

    Ok(DecisionOutcome {
        signals,
        risk_events,
        drawdown,
        valuation,
    })
}

/// 入场路径判定：持续性入场或回调入场，二者皆不满足则无信号
///
/// 持续性：含当前小时在内连续 persistence_bars 根正向分类。
/// 回调：上一小时负向且本小时反弹概率达标。
async fn entry_path<S: SnapshotReader + ?Sized>(
    store: &S,
    ctx: &HourContext,
    asset: &str,
    rebound_prob: f64,
) -> AppResult<Option<&'static str>> {
    let profile = &ctx.profile;
    let prior_bars = (profile.persistence_bars - 1).max(0);
    let history = store
        .prediction_history(asset, ctx.scope.hour_ts, prior_bars)
        .await?;

    if history.len() == prior_bars as usize
        && history
            .iter()
            .all(|p| classify(profile, p.direction_prob).is_positive())
    {
        return Ok(Some(reason::ENTRY_SIGNAL));
    }

    if let Some(last) = history.last() {
        if classify(profile, last.direction_prob).is_negative()
            && rebound_prob >= profile.dip_rebound_prob
        {
            return Ok(Some(reason::DIP_ENTRY));
        }
    }

    Ok(None)
}
