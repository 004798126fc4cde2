//! 订单生命周期引擎
//!
//! 信号 → 订单尝试 → 成交 → 批次/分配/已实现交易，全部在内存中
//! 按固定顺序推进，产出的行最后由账本写入器一次落库。
//!
//! 重试是逻辑时间上的额外尝试行（偏移 0/+1m/+2m/+4m），从不真正
//! 等待。禁止做空在订单创建前整单拒绝：可用量不足时一股也不卖。

use tracing::{info, warn};

use crate::context::HourContext;
use crate::decision::reason;
use crate::domain::entities::*;
use crate::domain::enums::{AttemptStatus, OrderSide, SignalAction};
use crate::error::AppResult;
use crate::lifecycle::exchange::{ExchangeAdapter, FillQuote, OrderSubmission, SubmitOutcome};
use crate::lifecycle::lots::LotBook;
use crate::time_util::offset_ts;

/// 重试调度偏移（分钟），首次尝试在小时起点
pub const RETRY_OFFSETS_MIN: [i64; 4] = [0, 1, 2, 4];

const QTY_EPSILON: f64 = 1e-9;

/// 生命周期推进的全部产出
#[derive(Debug)]
pub struct LifecycleOutput {
    pub orders: Vec<OrderRequest>,
    pub fills: Vec<OrderFill>,
    pub new_lots: Vec<PositionLot>,
    pub allocations: Vec<LotAllocation>,
    pub trades: Vec<ExecutedTrade>,
    /// 小时结束时的批次簿（小时态物化用）
    pub lot_book: LotBook,
    /// 小时结束时的现金
    pub cash_balance: f64,
}

/// 按信号顺序推进全部订单生命周期
pub async fn run_lifecycle<A: ExchangeAdapter + ?Sized>(
    ctx: &HourContext,
    signals: &[TradeSignal],
    adapter: &A,
) -> AppResult<LifecycleOutput> {
    let mut out = LifecycleOutput {
        orders: Vec::new(),
        fills: Vec::new(),
        new_lots: Vec::new(),
        allocations: Vec::new(),
        trades: Vec::new(),
        lot_book: LotBook::from_open_lots(&ctx.open_lots),
        cash_balance: ctx.cash_balance,
    };

    for signal in signals {
        let side = match signal.action {
            SignalAction::Enter => OrderSide::Buy,
            SignalAction::Exit | SignalAction::DeRisk => OrderSide::Sell,
            SignalAction::Hold => continue,
        };

        let quantity = match side {
            OrderSide::Buy => {
                let Some(price) = entry_reference_price(ctx, &signal.asset) else {
                    warn!(asset = %signal.asset, "入场信号无参考价，跳过订单创建");
                    continue;
                };
                // 名义按小时起点现金折算：决策核准的敞口即执行上限，
                // 同小时卖出回笼的现金不放大买入
                let admitted = signal.size_fraction * ctx.cash_balance;
                // 费用与滑点一并占用现金
                let cost_rate =
                    1.0 + ctx.profile.fee_rate + ctx.profile.slippage_bps / 10_000.0;
                let affordable = (out.cash_balance / cost_rate).max(0.0);
                admitted.min(affordable) / price
            }
            OrderSide::Sell => {
                let available = out.lot_book.available(&signal.asset);
                let requested = signal.size_fraction * available;
                // 禁止做空：超量即整单拒绝，不做部分接受
                if requested > available + QTY_EPSILON {
                    out.orders.push(rejected_order(ctx, signal, side, requested));
                    warn!(
                        asset = %signal.asset,
                        requested,
                        available,
                        "卖出量超过持有量，整单拒绝"
                    );
                    continue;
                }
                requested
            }
        };
        if quantity <= QTY_EPSILON {
            continue;
        }

        drive_order(ctx, signal, side, quantity, adapter, &mut out).await?;
    }

    info!(
        scope = %ctx.scope,
        orders = out.orders.len(),
        fills = out.fills.len(),
        trades = out.trades.len(),
        cash = out.cash_balance,
        "订单生命周期推进完成"
    );
    Ok(out)
}

/// 入场数量换算的参考价：盘口卖一，退 OHLCV 收盘
fn entry_reference_price(ctx: &HourContext, asset: &str) -> Option<f64> {
    let data = ctx.market.get(asset)?;
    if let Some(book) = data.book_top() {
        return Some(book.ask_px);
    }
    data.ohlcv_close
}

/// 未提交即拒绝的订单行（attempt 0，EXHAUSTED）
fn rejected_order(
    ctx: &HourContext,
    signal: &TradeSignal,
    side: OrderSide,
    quantity: f64,
) -> OrderRequest {
    let logical_order_id =
        OrderRequest::make_logical_id(&ctx.scope.run_id, ctx.scope.hour_ts, &signal.asset, side);
    OrderRequest {
        request_id: OrderRequest::make_request_id(&logical_order_id, 0),
        logical_order_id,
        attempt_index: 0,
        scheduled_offset_min: RETRY_OFFSETS_MIN[0],
        run_id: ctx.scope.run_id.clone(),
        account_id: ctx.scope.account_id.clone(),
        hour_ts: ctx.scope.hour_ts,
        asset: signal.asset.clone(),
        side,
        quantity,
        status: AttemptStatus::Exhausted,
        reason_code: reason::NO_SHORTING.to_string(),
        signal_hash: signal.row_hash.clone(),
        row_hash: String::new(),
    }
    .seal()
}

/// 一个逻辑订单的尝试循环
async fn drive_order<A: ExchangeAdapter + ?Sized>(
    ctx: &HourContext,
    signal: &TradeSignal,
    side: OrderSide,
    initial_quantity: f64,
    adapter: &A,
    out: &mut LifecycleOutput,
) -> AppResult<()> {
    let logical_order_id =
        OrderRequest::make_logical_id(&ctx.scope.run_id, ctx.scope.hour_ts, &signal.asset, side);
    let mut remaining = initial_quantity;

    for (attempt_index, offset_min) in RETRY_OFFSETS_MIN.iter().enumerate() {
        let as_of_ts = offset_ts(ctx.scope.hour_ts, *offset_min);
        let outcome = adapter
            .submit_order(&OrderSubmission {
                asset: signal.asset.clone(),
                side,
                quantity: remaining,
                as_of_ts,
            })
            .await?;

        let last_attempt = attempt_index + 1 == RETRY_OFFSETS_MIN.len();
        let (status, reason_code, quote) = match &outcome {
            SubmitOutcome::Filled(quote) => {
                let status = if remaining - quote.quantity <= QTY_EPSILON {
                    AttemptStatus::Filled
                } else {
                    AttemptStatus::PartiallyFilled
                };
                (status, signal.reason_code.clone(), Some(quote.clone()))
            }
            SubmitOutcome::Pending if last_attempt => (
                AttemptStatus::Exhausted,
                reason::RETRY_EXHAUSTED.to_string(),
                None,
            ),
            SubmitOutcome::Pending => (
                AttemptStatus::RetryScheduled,
                reason::RETRY_PENDING.to_string(),
                None,
            ),
        };

        let request = OrderRequest {
            request_id: OrderRequest::make_request_id(&logical_order_id, attempt_index as i32),
            logical_order_id: logical_order_id.clone(),
            attempt_index: attempt_index as i32,
            scheduled_offset_min: *offset_min,
            run_id: ctx.scope.run_id.clone(),
            account_id: ctx.scope.account_id.clone(),
            hour_ts: ctx.scope.hour_ts,
            asset: signal.asset.clone(),
            side,
            quantity: remaining,
            status,
            reason_code,
            signal_hash: signal.row_hash.clone(),
            row_hash: String::new(),
        }
        .seal();

        if let Some(quote) = quote {
            apply_fill(ctx, &request, &quote, as_of_ts, out);
            remaining -= quote.quantity;
        }
        out.orders.push(request);

        if remaining <= QTY_EPSILON {
            break;
        }
    }
    Ok(())
}

/// 成交落账：行生成 + 批次簿推进 + 现金推进
fn apply_fill(
    ctx: &HourContext,
    request: &OrderRequest,
    quote: &FillQuote,
    fill_ts: i64,
    out: &mut LifecycleOutput,
) {
    let notional = quote.price * quote.quantity;
    let fill = OrderFill {
        fill_id: OrderFill::make_id(&request.request_id),
        request_id: request.request_id.clone(),
        logical_order_id: request.logical_order_id.clone(),
        run_id: ctx.scope.run_id.clone(),
        account_id: ctx.scope.account_id.clone(),
        hour_ts: ctx.scope.hour_ts,
        asset: request.asset.clone(),
        side: request.side,
        price: quote.price,
        quantity: quote.quantity,
        notional,
        fee_paid: quote.fee_paid,
        slippage_cost: quote.slippage_cost,
        price_source: quote.price_source,
        fill_ts,
        request_hash: request.row_hash.clone(),
        row_hash: String::new(),
    }
    .seal();

    match request.side {
        OrderSide::Buy => {
            let lot = PositionLot {
                lot_id: PositionLot::make_id(&fill.fill_id),
                run_id: ctx.scope.run_id.clone(),
                account_id: ctx.scope.account_id.clone(),
                asset: fill.asset.clone(),
                quantity: fill.quantity,
                price: fill.price,
                acquired_ts: fill_ts,
                hour_ts: ctx.scope.hour_ts,
                fill_hash: fill.row_hash.clone(),
                row_hash: String::new(),
            }
            .seal();
            out.lot_book.push_lot(lot.clone());
            out.new_lots.push(lot);
            out.cash_balance -= notional + quote.fee_paid + quote.slippage_cost;
        }
        OrderSide::Sell => {
            let draws = out.lot_book.allocate_fifo(&fill.asset, fill.quantity);
            let mut cost_basis = 0.0;
            let mut opened_ts = fill_ts;
            for draw in &draws {
                cost_basis += draw.quantity * draw.lot.price;
                opened_ts = opened_ts.min(draw.lot.acquired_ts);
                out.allocations.push(
                    LotAllocation {
                        allocation_id: LotAllocation::make_id(&fill.fill_id, &draw.lot.lot_id),
                        run_id: ctx.scope.run_id.clone(),
                        account_id: ctx.scope.account_id.clone(),
                        lot_id: draw.lot.lot_id.clone(),
                        fill_id: fill.fill_id.clone(),
                        asset: fill.asset.clone(),
                        quantity: draw.quantity,
                        cost_basis: draw.quantity * draw.lot.price,
                        hour_ts: ctx.scope.hour_ts,
                        lot_hash: draw.lot_hash.clone(),
                        fill_hash: fill.row_hash.clone(),
                        row_hash: String::new(),
                    }
                    .seal(),
                );
            }
            out.trades.push(ExecutedTrade::derive(
                &ctx.scope.run_id,
                &ctx.scope.account_id,
                &fill.fill_id,
                &fill.asset,
                fill.quantity,
                notional,
                cost_basis,
                quote.fee_paid,
                quote.slippage_cost,
                opened_ts,
                fill_ts,
                ctx.scope.hour_ts,
                &fill.row_hash,
            ));
            out.cash_balance += notional - quote.fee_paid - quote.slippage_cost;
        }
    }
    out.fills.push(fill);
}
