//! 存储抽象
//!
//! 持久层是唯一同步点。读侧 SnapshotReader 组装小时上下文与重放
//! 边界；写侧 RowSink 以事务方式落一个小时的批次，逐行返回三态
//! 写结果，调用方必须显式处理全部三种情况。

use async_trait::async_trait;

use crate::domain::entities::*;
use crate::domain::enums::RunMode;
use crate::domain::HourScope;
use crate::error::AppResult;
use crate::store::row::ReplayRow;

/// 逐行写结果（插入 / 幂等命中 / 冲突）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// 行不存在，已插入
    Inserted,
    /// 行已存在且哈希一致，安全空操作
    AlreadyPresentMatching,
    /// 行已存在但哈希不一致，必须整小时中止
    Conflict { expected: String, actual: String },
}

/// 清单发现过滤器
///
/// run_mode 不在清单行上，由存储实现对照运行上下文解析。
#[derive(Debug, Clone, Default)]
pub struct ManifestFilter {
    pub run_id: Option<String>,
    pub account_id: Option<String>,
    pub run_mode: Option<RunMode>,
    pub from_hour_ts: Option<i64>,
    pub to_hour_ts: Option<i64>,
}

impl ManifestFilter {
    /// 清单行自身字段的匹配（不含 run_mode）
    pub fn matches(&self, m: &ReplayManifest) -> bool {
        if let Some(run_id) = &self.run_id {
            if &m.run_id != run_id {
                return false;
            }
        }
        if let Some(account_id) = &self.account_id {
            if &m.account_id != account_id {
                return false;
            }
        }
        if let Some(from) = self.from_hour_ts {
            if m.hour_ts < from {
                return false;
            }
        }
        if let Some(to) = self.to_hour_ts {
            if m.hour_ts > to {
                return false;
            }
        }
        true
    }
}

/// 读侧：小时上下文与重放边界装载
#[async_trait]
pub trait SnapshotReader: Send + Sync {
    async fn run_context(&self, run_id: &str) -> AppResult<Option<RunContext>>;

    /// 覆盖给定小时的全部配置区间（调用方校验恰好一条）
    async fn profile_assignments_at(
        &self,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<RiskProfileAssignment>>;

    async fn risk_profile(&self, profile_id: &str, version: i32) -> AppResult<Option<RiskProfile>>;

    /// 给定小时之前取得的全部批次
    async fn lots_before(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<PositionLot>>;

    /// 给定小时之前的全部批次消耗
    async fn allocations_before(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<LotAllocation>>;

    /// 给定小时之前的最后一条现金流水
    async fn ledger_tail(
        &self,
        run_id: &str,
        account_id: &str,
        before_hour_ts: i64,
    ) -> AppResult<Option<CashLedgerEntry>>;

    /// 给定小时之前最近的风控小时态
    async fn risk_state_before(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Option<RiskHourlyState>>;

    async fn market_snapshot(&self, hour_ts: i64) -> AppResult<Vec<AssetMarketData>>;

    async fn predictions(&self, hour_ts: i64) -> AppResult<Vec<PredictionRecord>>;

    /// 给定小时之前最近 bars 根预测（按时间升序）
    async fn prediction_history(
        &self,
        asset: &str,
        hour_ts: i64,
        bars: i32,
    ) -> AppResult<Vec<PredictionRecord>>;

    /// 给定小时之前该资产最近一笔成交价（无市场数据持仓的估值回退）
    async fn latest_fill_price(
        &self,
        run_id: &str,
        account_id: &str,
        asset: &str,
        before_hour_ts: i64,
    ) -> AppResult<Option<f64>>;

    /// 作用域内全部重放权威行
    async fn hour_rows(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<ReplayRow>>;

    async fn manifest(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Option<ReplayManifest>>;

    async fn manifests_filtered(&self, filter: &ManifestFilter)
        -> AppResult<Vec<ReplayManifest>>;
}

/// 写侧：小时批次落库
///
/// begin_hour 以比较交换方式检查追加写保护控制记录并开启事务；
/// commit_hour 之前任何行都不可见，abort_hour 零部分写入。
#[async_trait]
pub trait RowSink: Send + Sync {
    async fn begin_hour(&self, scope: &HourScope) -> AppResult<()>;

    async fn insert_row(&self, row: &ReplayRow) -> AppResult<WriteOutcome>;

    async fn insert_manifest(&self, manifest: &ReplayManifest) -> AppResult<WriteOutcome>;

    async fn commit_hour(&self) -> AppResult<()>;

    async fn abort_hour(&self) -> AppResult<()>;
}
