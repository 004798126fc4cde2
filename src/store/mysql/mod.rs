//! MySQL 存储
//!
//! 读侧直接走连接池；写侧在 begin_hour 时开启事务并以 FOR UPDATE
//! 检查追加写保护控制记录，整小时批次在 commit_hour 一次提交。
//! 追加写约束（禁 UPDATE/DELETE）由库侧 DDL 触发器兜底，这里的
//! 先查后插只负责幂等与冲突判定。

pub mod models;

use async_trait::async_trait;
use sqlx::{MySql, Pool, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::entities::*;
use crate::domain::HourScope;
use crate::error::{AppError, AppResult};
use crate::store::row::{ReplayRow, RowTable};
use crate::store::traits::{ManifestFilter, RowSink, SnapshotReader, WriteOutcome};

use models::*;

fn pk_column(table: RowTable) -> &'static str {
    match table {
        RowTable::TradeSignals => "signal_id",
        RowTable::OrderRequests => "request_id",
        RowTable::OrderFills => "fill_id",
        RowTable::PositionLots => "lot_id",
        RowTable::LotAllocations => "allocation_id",
        RowTable::ExecutedTrades => "trade_id",
        RowTable::CashLedger => "entry_id",
        RowTable::PortfolioHourly => "state_id",
        RowTable::RiskHourly => "state_id",
        RowTable::ClusterExposureHourly => "state_id",
    }
}

/// MySQL 实现
pub struct MysqlStore {
    pool: Pool<MySql>,
    tx: Mutex<Option<Transaction<'static, MySql>>>,
}

impl MysqlStore {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self {
            pool,
            tx: Mutex::new(None),
        }
    }

    async fn existing_row_hash(
        tx: &mut Transaction<'static, MySql>,
        table: RowTable,
        key: &str,
    ) -> AppResult<Option<String>> {
        let sql = format!(
            "SELECT row_hash FROM {} WHERE {} = ?",
            table.table_name(),
            pk_column(table)
        );
        let found: Option<(String,)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(found.map(|(h,)| h))
    }

    async fn insert_new_row(
        tx: &mut Transaction<'static, MySql>,
        row: &ReplayRow,
    ) -> AppResult<()> {
        match row {
            ReplayRow::Signal(r) => {
                sqlx::query(
                    "INSERT INTO trade_signals \
                     (signal_id, run_id, account_id, hour_ts, asset, action, signal_class, \
                      size_fraction, reason_code, drawdown_state, profile_id, profile_version, \
                      seed_hash, row_hash) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&r.signal_id)
                .bind(&r.run_id)
                .bind(&r.account_id)
                .bind(r.hour_ts)
                .bind(&r.asset)
                .bind(r.action.as_str())
                .bind(r.signal_class.as_str())
                .bind(r.size_fraction)
                .bind(&r.reason_code)
                .bind(r.drawdown_state.as_str())
                .bind(&r.profile_id)
                .bind(r.profile_version)
                .bind(&r.seed_hash)
                .bind(&r.row_hash)
                .execute(&mut **tx)
                .await?;
            }
            ReplayRow::Order(r) => {
                sqlx::query(
                    "INSERT INTO order_requests \
                     (request_id, logical_order_id, attempt_index, scheduled_offset_min, run_id, \
                      account_id, hour_ts, asset, side, quantity, status, reason_code, \
                      signal_hash, row_hash) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&r.request_id)
                .bind(&r.logical_order_id)
                .bind(r.attempt_index)
                .bind(r.scheduled_offset_min)
                .bind(&r.run_id)
                .bind(&r.account_id)
                .bind(r.hour_ts)
                .bind(&r.asset)
                .bind(r.side.as_str())
                .bind(r.quantity)
                .bind(r.status.as_str())
                .bind(&r.reason_code)
                .bind(&r.signal_hash)
                .bind(&r.row_hash)
                .execute(&mut **tx)
                .await?;
            }
            ReplayRow::Fill(r) => {
                sqlx::query(
                    "INSERT INTO order_fills \
                     (fill_id, request_id, logical_order_id, run_id, account_id, hour_ts, asset, \
                      side, price, quantity, notional, fee_paid, slippage_cost, price_source, \
                      fill_ts, request_hash, row_hash) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&r.fill_id)
                .bind(&r.request_id)
                .bind(&r.logical_order_id)
                .bind(&r.run_id)
                .bind(&r.account_id)
                .bind(r.hour_ts)
                .bind(&r.asset)
                .bind(r.side.as_str())
                .bind(r.price)
                .bind(r.quantity)
                .bind(r.notional)
                .bind(r.fee_paid)
                .bind(r.slippage_cost)
                .bind(r.price_source.as_str())
                .bind(r.fill_ts)
                .bind(&r.request_hash)
                .bind(&r.row_hash)
                .execute(&mut **tx)
                .await?;
            }
            ReplayRow::Lot(r) => {
                sqlx::query(
                    "INSERT INTO position_lots \
                     (lot_id, run_id, account_id, asset, quantity, price, acquired_ts, hour_ts, \
                      fill_hash, row_hash) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&r.lot_id)
                .bind(&r.run_id)
                .bind(&r.account_id)
                .bind(&r.asset)
                .bind(r.quantity)
                .bind(r.price)
                .bind(r.acquired_ts)
                .bind(r.hour_ts)
                .bind(&r.fill_hash)
                .bind(&r.row_hash)
                .execute(&mut **tx)
                .await?;
            }
            ReplayRow::Allocation(r) => {
                sqlx::query(
                    "INSERT INTO lot_allocations \
                     (allocation_id, run_id, account_id, lot_id, fill_id, asset, quantity, \
                      cost_basis, hour_ts, lot_hash, fill_hash, row_hash) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&r.allocation_id)
                .bind(&r.run_id)
                .bind(&r.account_id)
                .bind(&r.lot_id)
                .bind(&r.fill_id)
                .bind(&r.asset)
                .bind(r.quantity)
                .bind(r.cost_basis)
                .bind(r.hour_ts)
                .bind(&r.lot_hash)
                .bind(&r.fill_hash)
                .bind(&r.row_hash)
                .execute(&mut **tx)
                .await?;
            }
            ReplayRow::Trade(r) => {
                sqlx::query(
                    "INSERT INTO executed_trades \
                     (trade_id, run_id, account_id, fill_id, asset, quantity, proceeds, \
                      cost_basis, fee, slippage, net_pnl, opened_ts, closed_ts, hour_ts, \
                      fill_hash, row_hash) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&r.trade_id)
                .bind(&r.run_id)
                .bind(&r.account_id)
                .bind(&r.fill_id)
                .bind(&r.asset)
                .bind(r.quantity)
                .bind(r.proceeds)
                .bind(r.cost_basis)
                .bind(r.fee)
                .bind(r.slippage)
                .bind(r.net_pnl)
                .bind(r.opened_ts)
                .bind(r.closed_ts)
                .bind(r.hour_ts)
                .bind(&r.fill_hash)
                .bind(&r.row_hash)
                .execute(&mut **tx)
                .await?;
            }
            ReplayRow::Ledger(r) => {
                sqlx::query(
                    "INSERT INTO cash_ledger \
                     (entry_id, run_id, account_id, hour_ts, fill_id, side, delta, \
                      balance_before, balance_after, prev_hash, fill_hash, row_hash) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&r.entry_id)
                .bind(&r.run_id)
                .bind(&r.account_id)
                .bind(r.hour_ts)
                .bind(&r.fill_id)
                .bind(r.side.as_str())
                .bind(r.delta)
                .bind(r.balance_before)
                .bind(r.balance_after)
                .bind(&r.prev_hash)
                .bind(&r.fill_hash)
                .bind(&r.row_hash)
                .execute(&mut **tx)
                .await?;
            }
            ReplayRow::Portfolio(r) => {
                sqlx::query(
                    "INSERT INTO portfolio_hourly_state \
                     (state_id, run_id, account_id, hour_ts, cash_balance, position_value, \
                      total_value, open_position_count, seed_hash, last_ledger_hash, row_hash) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&r.state_id)
                .bind(&r.run_id)
                .bind(&r.account_id)
                .bind(r.hour_ts)
                .bind(r.cash_balance)
                .bind(r.position_value)
                .bind(r.total_value)
                .bind(r.open_position_count)
                .bind(&r.seed_hash)
                .bind(&r.last_ledger_hash)
                .bind(&r.row_hash)
                .execute(&mut **tx)
                .await?;
            }
            ReplayRow::Risk(r) => {
                sqlx::query(
                    "INSERT INTO risk_hourly_state \
                     (state_id, run_id, account_id, hour_ts, drawdown_state, drawdown_pct, \
                      peak_value, kill_switch_active, seed_hash, row_hash) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&r.state_id)
                .bind(&r.run_id)
                .bind(&r.account_id)
                .bind(r.hour_ts)
                .bind(r.drawdown_state.as_str())
                .bind(r.drawdown_pct)
                .bind(r.peak_value)
                .bind(r.kill_switch_active)
                .bind(&r.seed_hash)
                .bind(&r.row_hash)
                .execute(&mut **tx)
                .await?;
            }
            ReplayRow::Cluster(r) => {
                sqlx::query(
                    "INSERT INTO cluster_exposure_hourly_state \
                     (state_id, run_id, account_id, hour_ts, cluster_id, exposure_value, \
                      exposure_limit, exposure_mode, seed_hash, row_hash) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&r.state_id)
                .bind(&r.run_id)
                .bind(&r.account_id)
                .bind(r.hour_ts)
                .bind(&r.cluster_id)
                .bind(r.exposure_value)
                .bind(r.exposure_limit)
                .bind(r.exposure_mode.as_str())
                .bind(&r.seed_hash)
                .bind(&r.row_hash)
                .execute(&mut **tx)
                .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotReader for MysqlStore {
    async fn run_context(&self, run_id: &str) -> AppResult<Option<RunContext>> {
        let model: Option<RunContextModel> = sqlx::query_as(
            "SELECT run_id, account_id, run_mode, origin_hour_ts, initial_capital \
             FROM run_contexts WHERE run_id = ?",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;
        model.map(|m| m.to_domain()).transpose()
    }

    async fn profile_assignments_at(
        &self,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<RiskProfileAssignment>> {
        let models: Vec<AssignmentModel> = sqlx::query_as(
            "SELECT account_id, profile_id, profile_version, effective_from_ts, effective_to_ts \
             FROM risk_profile_assignments \
             WHERE account_id = ? AND effective_from_ts <= ? \
               AND (effective_to_ts IS NULL OR effective_to_ts > ?) \
             ORDER BY effective_from_ts",
        )
        .bind(account_id)
        .bind(hour_ts)
        .bind(hour_ts)
        .fetch_all(&self.pool)
        .await?;
        Ok(models.iter().map(|m| m.to_domain()).collect())
    }

    async fn risk_profile(&self, profile_id: &str, version: i32) -> AppResult<Option<RiskProfile>> {
        let model: Option<RiskProfileModel> = sqlx::query_as(
            "SELECT * FROM risk_profiles WHERE profile_id = ? AND version = ?",
        )
        .bind(profile_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;
        model.map(|m| m.to_domain()).transpose()
    }

    async fn lots_before(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<PositionLot>> {
        let models: Vec<LotModel> = sqlx::query_as(
            "SELECT * FROM position_lots \
             WHERE run_id = ? AND account_id = ? AND hour_ts < ? \
             ORDER BY acquired_ts, lot_id",
        )
        .bind(run_id)
        .bind(account_id)
        .bind(hour_ts)
        .fetch_all(&self.pool)
        .await?;
        Ok(models.iter().map(|m| m.to_domain()).collect())
    }

    async fn allocations_before(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<LotAllocation>> {
        let models: Vec<AllocationModel> = sqlx::query_as(
            "SELECT * FROM lot_allocations \
             WHERE run_id = ? AND account_id = ? AND hour_ts < ? \
             ORDER BY allocation_id",
        )
        .bind(run_id)
        .bind(account_id)
        .bind(hour_ts)
        .fetch_all(&self.pool)
        .await?;
        Ok(models.iter().map(|m| m.to_domain()).collect())
    }

    async fn ledger_tail(
        &self,
        run_id: &str,
        account_id: &str,
        before_hour_ts: i64,
    ) -> AppResult<Option<CashLedgerEntry>> {
        let model: Option<LedgerModel> = sqlx::query_as(
            "SELECT * FROM cash_ledger \
             WHERE run_id = ? AND account_id = ? AND hour_ts < ? \
             ORDER BY hour_ts DESC, entry_id DESC LIMIT 1",
        )
        .bind(run_id)
        .bind(account_id)
        .bind(before_hour_ts)
        .fetch_optional(&self.pool)
        .await?;
        model.map(|m| m.to_domain()).transpose()
    }

    async fn risk_state_before(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Option<RiskHourlyState>> {
        let model: Option<RiskStateModel> = sqlx::query_as(
            "SELECT * FROM risk_hourly_state \
             WHERE run_id = ? AND account_id = ? AND hour_ts < ? \
             ORDER BY hour_ts DESC LIMIT 1",
        )
        .bind(run_id)
        .bind(account_id)
        .bind(hour_ts)
        .fetch_optional(&self.pool)
        .await?;
        model.map(|m| m.to_domain()).transpose()
    }

    async fn market_snapshot(&self, hour_ts: i64) -> AppResult<Vec<AssetMarketData>> {
        let models: Vec<MarketModel> = sqlx::query_as(
            "SELECT * FROM market_snapshots WHERE hour_ts = ? ORDER BY asset",
        )
        .bind(hour_ts)
        .fetch_all(&self.pool)
        .await?;
        Ok(models.iter().map(|m| m.to_domain()).collect())
    }

    async fn predictions(&self, hour_ts: i64) -> AppResult<Vec<PredictionRecord>> {
        let models: Vec<PredictionModel> = sqlx::query_as(
            "SELECT * FROM model_predictions WHERE hour_ts = ? ORDER BY asset",
        )
        .bind(hour_ts)
        .fetch_all(&self.pool)
        .await?;
        Ok(models.iter().map(|m| m.to_domain()).collect())
    }

    async fn prediction_history(
        &self,
        asset: &str,
        hour_ts: i64,
        bars: i32,
    ) -> AppResult<Vec<PredictionRecord>> {
        let models: Vec<PredictionModel> = sqlx::query_as(
            "SELECT * FROM model_predictions \
             WHERE asset = ? AND hour_ts < ? \
             ORDER BY hour_ts DESC LIMIT ?",
        )
        .bind(asset)
        .bind(hour_ts)
        .bind(bars.max(0) as i64)
        .fetch_all(&self.pool)
        .await?;
        let mut history: Vec<PredictionRecord> =
            models.iter().map(|m| m.to_domain()).collect();
        history.reverse();
        Ok(history)
    }

    async fn latest_fill_price(
        &self,
        run_id: &str,
        account_id: &str,
        asset: &str,
        before_hour_ts: i64,
    ) -> AppResult<Option<f64>> {
        let found: Option<(f64,)> = sqlx::query_as(
            "SELECT price FROM order_fills \
             WHERE run_id = ? AND account_id = ? AND asset = ? AND hour_ts < ? \
             ORDER BY fill_ts DESC, fill_id DESC LIMIT 1",
        )
        .bind(run_id)
        .bind(account_id)
        .bind(asset)
        .bind(before_hour_ts)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.map(|(price,)| price))
    }

    async fn hour_rows(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<ReplayRow>> {
        let mut rows = Vec::new();

        macro_rules! collect_table {
            ($model:ty, $variant:path, $table:expr, $pk:expr, fallible) => {{
                let models: Vec<$model> = sqlx::query_as(&format!(
                    "SELECT * FROM {} WHERE run_id = ? AND account_id = ? AND hour_ts = ? \
                     ORDER BY {}",
                    $table, $pk
                ))
                .bind(run_id)
                .bind(account_id)
                .bind(hour_ts)
                .fetch_all(&self.pool)
                .await?;
                for m in &models {
                    rows.push($variant(m.to_domain()?));
                }
            }};
            ($model:ty, $variant:path, $table:expr, $pk:expr) => {{
                let models: Vec<$model> = sqlx::query_as(&format!(
                    "SELECT * FROM {} WHERE run_id = ? AND account_id = ? AND hour_ts = ? \
                     ORDER BY {}",
                    $table, $pk
                ))
                .bind(run_id)
                .bind(account_id)
                .bind(hour_ts)
                .fetch_all(&self.pool)
                .await?;
                for m in &models {
                    rows.push($variant(m.to_domain()));
                }
            }};
        }

        collect_table!(SignalModel, ReplayRow::Signal, "trade_signals", "signal_id", fallible);
        collect_table!(OrderModel, ReplayRow::Order, "order_requests", "request_id", fallible);
        collect_table!(FillModel, ReplayRow::Fill, "order_fills", "fill_id", fallible);
        collect_table!(LotModel, ReplayRow::Lot, "position_lots", "lot_id");
        collect_table!(AllocationModel, ReplayRow::Allocation, "lot_allocations", "allocation_id");
        collect_table!(TradeModel, ReplayRow::Trade, "executed_trades", "trade_id");
        collect_table!(LedgerModel, ReplayRow::Ledger, "cash_ledger", "entry_id", fallible);
        collect_table!(
            PortfolioModel,
            ReplayRow::Portfolio,
            "portfolio_hourly_state",
            "state_id"
        );
        collect_table!(RiskStateModel, ReplayRow::Risk, "risk_hourly_state", "state_id", fallible);
        collect_table!(
            ClusterStateModel,
            ReplayRow::Cluster,
            "cluster_exposure_hourly_state",
            "state_id",
            fallible
        );

        Ok(rows)
    }

    async fn manifest(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Option<ReplayManifest>> {
        let model: Option<ManifestModel> = sqlx::query_as(
            "SELECT * FROM replay_manifests \
             WHERE run_id = ? AND account_id = ? AND hour_ts = ?",
        )
        .bind(run_id)
        .bind(account_id)
        .bind(hour_ts)
        .fetch_optional(&self.pool)
        .await?;
        Ok(model.map(|m| m.to_domain()))
    }

    async fn manifests_filtered(
        &self,
        filter: &ManifestFilter,
    ) -> AppResult<Vec<ReplayManifest>> {
        // run_mode 对照运行上下文解析，其余条件在内存过滤
        let mode = filter.run_mode.map(|m| m.as_str());
        let models: Vec<ManifestModel> = sqlx::query_as(
            "SELECT m.* FROM replay_manifests m \
             WHERE ? IS NULL OR EXISTS \
                   (SELECT 1 FROM run_contexts rc \
                    WHERE rc.run_id = m.run_id AND rc.run_mode = ?) \
             ORDER BY m.run_id, m.account_id, m.hour_ts",
        )
        .bind(mode)
        .bind(mode)
        .fetch_all(&self.pool)
        .await?;
        Ok(models
            .iter()
            .map(|m| m.to_domain())
            .filter(|m| filter.matches(m))
            .collect())
    }
}

#[async_trait]
impl RowSink for MysqlStore {
    async fn begin_hour(&self, scope: &HourScope) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        if guard.is_some() {
            return Err(AppError::Other(
                "hour transaction already in progress".to_string(),
            ));
        }
        let mut tx = self.pool.begin().await?;
        let control: Option<ControlModel> = sqlx::query_as(
            "SELECT scope, writes_enabled, holder FROM replay_control \
             WHERE scope = 'global' FOR UPDATE",
        )
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(control) = control {
            if !control.writes_enabled {
                tx.rollback().await?;
                warn!(scope = %scope, holder = ?control.holder, "追加写保护拒绝写入");
                return Err(AppError::WriteGuardRejected(format!(
                    "writes disabled by {:?}",
                    control.holder
                )));
            }
        }
        debug!(scope = %scope, "开启小时写事务");
        *guard = Some(tx);
        Ok(())
    }

    async fn insert_row(&self, row: &ReplayRow) -> AppResult<WriteOutcome> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::Other("no active hour transaction".to_string()))?;

        match Self::existing_row_hash(tx, row.table(), row.natural_key()).await? {
            Some(actual) if actual == row.stored_hash() => {
                Ok(WriteOutcome::AlreadyPresentMatching)
            }
            Some(actual) => Ok(WriteOutcome::Conflict {
                expected: row.stored_hash().to_string(),
                actual,
            }),
            None => {
                Self::insert_new_row(tx, row).await?;
                Ok(WriteOutcome::Inserted)
            }
        }
    }

    async fn insert_manifest(&self, manifest: &ReplayManifest) -> AppResult<WriteOutcome> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::Other("no active hour transaction".to_string()))?;

        let existing: Option<(String,)> = sqlx::query_as(
            "SELECT root_hash FROM replay_manifests WHERE manifest_id = ?",
        )
        .bind(&manifest.manifest_id)
        .fetch_optional(&mut **tx)
        .await?;

        match existing {
            Some((actual,)) if actual == manifest.root_hash => {
                Ok(WriteOutcome::AlreadyPresentMatching)
            }
            Some((actual,)) => Ok(WriteOutcome::Conflict {
                expected: manifest.root_hash.clone(),
                actual,
            }),
            None => {
                sqlx::query(
                    "INSERT INTO replay_manifests \
                     (manifest_id, run_id, account_id, hour_ts, seed_hash, root_hash, \
                      row_counts_json, row_total) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&manifest.manifest_id)
                .bind(&manifest.run_id)
                .bind(&manifest.account_id)
                .bind(manifest.hour_ts)
                .bind(&manifest.seed_hash)
                .bind(&manifest.root_hash)
                .bind(&manifest.row_counts_json)
                .bind(manifest.row_total)
                .execute(&mut **tx)
                .await?;
                Ok(WriteOutcome::Inserted)
            }
        }
    }

    async fn commit_hour(&self) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::Other("no active hour transaction".to_string()))?;
        tx.commit().await?;
        Ok(())
    }

    async fn abort_hour(&self) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        if let Some(tx) = guard.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}
