//! 交易所适配器
//!
//! 订单提交走统一接口：回测/重放用确定性模拟盘，实盘用 HTTP 场所
//! 适配器。模拟盘的成交语义完全由小时市场快照决定，同一快照同一
//! 订单序列永远给出同一成交序列。

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app_config::env::env_f64;
use crate::domain::entities::{AssetMarketData, RiskProfile};
use crate::domain::enums::{OrderSide, PriceSource};
use crate::error::{AppError, AppResult};

/// 一次订单尝试的提交载荷
#[derive(Debug, Clone, Serialize)]
pub struct OrderSubmission {
    pub asset: String,
    pub side: OrderSide,
    pub quantity: f64,
    /// 尝试的逻辑时刻（小时起点 + 调度偏移）
    pub as_of_ts: i64,
}

/// 场所回报的成交
#[derive(Debug, Clone)]
pub struct FillQuote {
    pub price: f64,
    pub quantity: f64,
    pub fee_paid: f64,
    pub slippage_cost: f64,
    pub price_source: PriceSource,
}

/// 提交结果：有成交（可能部分）或本次无流动性
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Filled(FillQuote),
    Pending,
}

#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn submit_order(&self, order: &OrderSubmission) -> AppResult<SubmitOutcome>;
}

/// 模拟盘费用参数
#[derive(Debug, Clone, Copy)]
pub struct SimulatorConfig {
    /// 成交名义的费率（0.004 = 40bps）
    pub fee_rate: f64,
    /// 滑点（bps）
    pub slippage_bps: f64,
}

impl SimulatorConfig {
    /// 费用参数取自风控配置：随配置行哈希与 seed 一起被见证
    pub fn from_profile(profile: &RiskProfile) -> Self {
        Self {
            fee_rate: profile.fee_rate,
            slippage_bps: profile.slippage_bps,
        }
    }
}

/// 无配置可用时的引导默认（环境变量兜底）
impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            fee_rate: env_f64("SIM_FEE_RATE", 0.004),
            slippage_bps: env_f64("SIM_SLIPPAGE_BPS", 20.0),
        }
    }
}

/// 确定性模拟盘
///
/// 盘口头档可成交量即本次可成交量，超出部分留给后续尝试；
/// 盘口缺失时按 OHLCV 收盘价全量成交；两者皆缺则本次无流动性。
pub struct SimulatedExchange {
    market: BTreeMap<String, AssetMarketData>,
    config: SimulatorConfig,
}

impl SimulatedExchange {
    pub fn new(market: BTreeMap<String, AssetMarketData>, config: SimulatorConfig) -> Self {
        Self { market, config }
    }

    fn quote(&self, order: &OrderSubmission) -> Option<FillQuote> {
        let data = self.market.get(&order.asset)?;
        if let Some(book) = data.book_top() {
            let (price, depth) = match order.side {
                OrderSide::Buy => (book.ask_px, book.ask_sz),
                OrderSide::Sell => (book.bid_px, book.bid_sz),
            };
            let quantity = order.quantity.min(depth);
            if quantity <= 0.0 {
                return None;
            }
            let notional = price * quantity;
            return Some(FillQuote {
                price,
                quantity,
                fee_paid: notional * self.config.fee_rate,
                slippage_cost: notional * self.config.slippage_bps / 10_000.0,
                price_source: PriceSource::BookTop,
            });
        }
        let close = data.ohlcv_close?;
        let notional = close * order.quantity;
        Some(FillQuote {
            price: close,
            quantity: order.quantity,
            fee_paid: notional * self.config.fee_rate,
            slippage_cost: notional * self.config.slippage_bps / 10_000.0,
            price_source: PriceSource::BarClose,
        })
    }
}

#[async_trait]
impl ExchangeAdapter for SimulatedExchange {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn submit_order(&self, order: &OrderSubmission) -> AppResult<SubmitOutcome> {
        match self.quote(order) {
            Some(quote) => {
                debug!(
                    asset = %order.asset,
                    side = %order.side.as_str(),
                    quantity = quote.quantity,
                    price = quote.price,
                    source = %quote.price_source.as_str(),
                    "模拟盘成交"
                );
                Ok(SubmitOutcome::Filled(quote))
            }
            None => Ok(SubmitOutcome::Pending),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VenueFillResponse {
    filled: bool,
    price: Option<f64>,
    quantity: Option<f64>,
    fee: Option<f64>,
    slippage: Option<f64>,
}

/// 实盘场所适配器（HTTP）
pub struct LiveVenueAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl LiveVenueAdapter {
    pub fn from_env() -> AppResult<Self> {
        let base_url = std::env::var("VENUE_API_URL")
            .map_err(|_| AppError::ExchangeError("VENUE_API_URL must be set".to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }
}

#[async_trait]
impl ExchangeAdapter for LiveVenueAdapter {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn submit_order(&self, order: &OrderSubmission) -> AppResult<SubmitOutcome> {
        let url = format!("{}/orders", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(order)
            .send()
            .await
            .map_err(|e| AppError::ExchangeError(format!("submit failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(AppError::ExchangeError(format!(
                "venue returned {}",
                response.status()
            )));
        }
        let body: VenueFillResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExchangeError(format!("bad venue response: {}", e)))?;
        if !body.filled {
            return Ok(SubmitOutcome::Pending);
        }
        match (body.price, body.quantity) {
            (Some(price), Some(quantity)) => Ok(SubmitOutcome::Filled(FillQuote {
                price,
                quantity,
                fee_paid: body.fee.unwrap_or(0.0),
                slippage_cost: body.slippage.unwrap_or(0.0),
                price_source: PriceSource::BookTop,
            })),
            _ => Err(AppError::ExchangeError(
                "venue fill missing price/quantity".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_market;
    use approx::assert_relative_eq;

    fn sim(market: AssetMarketData) -> SimulatedExchange {
        let mut map = BTreeMap::new();
        map.insert(market.asset.clone(), market);
        SimulatedExchange::new(
            map,
            SimulatorConfig {
                fee_rate: 0.004,
                slippage_bps: 20.0,
            },
        )
    }

    #[tokio::test]
    async fn test_buy_fills_at_ask_with_costs() -> anyhow::Result<()> {
        let exchange = sim(test_market(0, "BTC-USDT", 100.0));
        let outcome = exchange
            .submit_order(&OrderSubmission {
                asset: "BTC-USDT".to_string(),
                side: OrderSide::Buy,
                quantity: 5.0,
                as_of_ts: 0,
            })
            .await?;
        let SubmitOutcome::Filled(quote) = outcome else {
            panic!("expected fill");
        };
        assert_relative_eq!(quote.price, 100.1); // ask
        assert_relative_eq!(quote.quantity, 5.0);
        let notional = 100.1 * 5.0;
        assert_relative_eq!(quote.fee_paid, notional * 0.004);
        assert_relative_eq!(quote.slippage_cost, notional * 0.002);
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_fill_capped_by_depth() -> anyhow::Result<()> {
        let mut market = test_market(0, "BTC-USDT", 100.0);
        market.ask_sz = Some(2.0);
        let exchange = sim(market);
        let outcome = exchange
            .submit_order(&OrderSubmission {
                asset: "BTC-USDT".to_string(),
                side: OrderSide::Buy,
                quantity: 5.0,
                as_of_ts: 0,
            })
            .await?;
        let SubmitOutcome::Filled(quote) = outcome else {
            panic!("expected fill");
        };
        assert_relative_eq!(quote.quantity, 2.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_bar_close_fallback_and_pending() -> anyhow::Result<()> {
        let mut market = test_market(0, "BTC-USDT", 100.0);
        market.bid_px = None;
        market.bid_sz = None;
        market.ask_px = None;
        market.ask_sz = None;
        let exchange = sim(market.clone());
        let order = OrderSubmission {
            asset: "BTC-USDT".to_string(),
            side: OrderSide::Sell,
            quantity: 1.0,
            as_of_ts: 0,
        };
        let SubmitOutcome::Filled(quote) = exchange.submit_order(&order).await? else {
            panic!("expected bar close fill");
        };
        assert_eq!(quote.price_source, PriceSource::BarClose);
        assert_relative_eq!(quote.price, 100.0);

        market.ohlcv_close = None;
        let exchange = sim(market);
        assert!(matches!(
            exchange.submit_order(&order).await?,
            SubmitOutcome::Pending
        ));
        Ok(())
    }
}
