//! 内存存储
//!
//! 确定性模拟 / 回测 / 测试用的存储实现，与 MySQL 实现共享同一组
//! 读写契约。暂存区在 commit_hour 之前对读侧不可见，天然满足
//! "完成的小时之外观察不到部分写入"。

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entities::*;
use crate::domain::HourScope;
use crate::error::{AppError, AppResult};
use crate::store::row::{ReplayRow, RowTable};
use crate::store::traits::{ManifestFilter, RowSink, SnapshotReader, WriteOutcome};

#[derive(Default)]
struct Tables {
    run_contexts: BTreeMap<String, RunContext>,
    profiles: BTreeMap<(String, i32), RiskProfile>,
    assignments: Vec<RiskProfileAssignment>,
    market: BTreeMap<(i64, String), AssetMarketData>,
    predictions: BTreeMap<(i64, String), PredictionRecord>,
    rows: BTreeMap<(RowTable, String), ReplayRow>,
    manifests: BTreeMap<String, ReplayManifest>,
    control: Option<ControlRecord>,
}

struct Staged {
    scope: HourScope,
    rows: BTreeMap<(RowTable, String), ReplayRow>,
    manifests: BTreeMap<String, ReplayManifest>,
}

/// 内存实现
pub struct MemoryStore {
    tables: RwLock<Tables>,
    staged: RwLock<Option<Staged>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            staged: RwLock::new(None),
        }
    }

    pub async fn seed_run_context(&self, ctx: RunContext) {
        let mut t = self.tables.write().await;
        t.run_contexts.insert(ctx.run_id.clone(), ctx);
    }

    pub async fn seed_profile(&self, profile: RiskProfile) {
        let mut t = self.tables.write().await;
        t.profiles
            .insert((profile.profile_id.clone(), profile.version), profile);
    }

    pub async fn seed_assignment(&self, assignment: RiskProfileAssignment) {
        let mut t = self.tables.write().await;
        t.assignments.push(assignment);
    }

    pub async fn seed_market(&self, data: AssetMarketData) {
        let mut t = self.tables.write().await;
        t.market.insert((data.hour_ts, data.asset.clone()), data);
    }

    pub async fn seed_prediction(&self, p: PredictionRecord) {
        let mut t = self.tables.write().await;
        t.predictions.insert((p.hour_ts, p.asset.clone()), p);
    }

    pub async fn set_writes_enabled(&self, enabled: bool, holder: Option<String>) {
        let mut t = self.tables.write().await;
        t.control = Some(ControlRecord {
            scope: "global".to_string(),
            writes_enabled: enabled,
            holder,
        });
    }

    /// 绕过追加写契约直接改行，仅用于在测试里模拟带外篡改
    pub async fn tamper_row<F>(&self, table: RowTable, key: &str, f: F) -> bool
    where
        F: FnOnce(&mut ReplayRow),
    {
        let mut t = self.tables.write().await;
        match t.rows.get_mut(&(table, key.to_string())) {
            Some(row) => {
                f(row);
                true
            }
            None => false,
        }
    }

    /// 作用域内已提交的行数（幂等性断言用）
    pub async fn committed_row_count(&self, scope: &HourScope) -> usize {
        let t = self.tables.read().await;
        t.rows
            .values()
            .filter(|r| r.hour_ts() == scope.hour_ts)
            .count()
    }
}

#[async_trait]
impl SnapshotReader for MemoryStore {
    async fn run_context(&self, run_id: &str) -> AppResult<Option<RunContext>> {
        let t = self.tables.read().await;
        Ok(t.run_contexts.get(run_id).cloned())
    }

    async fn profile_assignments_at(
        &self,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<RiskProfileAssignment>> {
        let t = self.tables.read().await;
        Ok(t.assignments
            .iter()
            .filter(|a| a.account_id == account_id && a.covers(hour_ts))
            .cloned()
            .collect())
    }

    async fn risk_profile(&self, profile_id: &str, version: i32) -> AppResult<Option<RiskProfile>> {
        let t = self.tables.read().await;
        Ok(t.profiles.get(&(profile_id.to_string(), version)).cloned())
    }

    async fn lots_before(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<PositionLot>> {
        let t = self.tables.read().await;
        let mut lots: Vec<PositionLot> = t
            .rows
            .values()
            .filter_map(|r| match r {
                ReplayRow::Lot(lot)
                    if lot.run_id == run_id
                        && lot.account_id == account_id
                        && lot.hour_ts < hour_ts =>
                {
                    Some(lot.clone())
                }
                _ => None,
            })
            .collect();
        lots.sort_by(|a, b| (a.acquired_ts, &a.lot_id).cmp(&(b.acquired_ts, &b.lot_id)));
        Ok(lots)
    }

    async fn allocations_before(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<LotAllocation>> {
        let t = self.tables.read().await;
        Ok(t.rows
            .values()
            .filter_map(|r| match r {
                ReplayRow::Allocation(a)
                    if a.run_id == run_id
                        && a.account_id == account_id
                        && a.hour_ts < hour_ts =>
                {
                    Some(a.clone())
                }
                _ => None,
            })
            .collect())
    }

    async fn ledger_tail(
        &self,
        run_id: &str,
        account_id: &str,
        before_hour_ts: i64,
    ) -> AppResult<Option<CashLedgerEntry>> {
        let t = self.tables.read().await;
        let mut entries: Vec<&CashLedgerEntry> = t
            .rows
            .values()
            .filter_map(|r| match r {
                ReplayRow::Ledger(e)
                    if e.run_id == run_id
                        && e.account_id == account_id
                        && e.hour_ts < before_hour_ts =>
                {
                    Some(e)
                }
                _ => None,
            })
            .collect();
        // 同小时内 entry_id 含成交序号，字典序即写入序
        entries.sort_by(|a, b| (a.hour_ts, &a.entry_id).cmp(&(b.hour_ts, &b.entry_id)));
        Ok(entries.last().map(|e| (*e).clone()))
    }

    async fn risk_state_before(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Option<RiskHourlyState>> {
        let t = self.tables.read().await;
        let mut states: Vec<&RiskHourlyState> = t
            .rows
            .values()
            .filter_map(|r| match r {
                ReplayRow::Risk(s)
                    if s.run_id == run_id
                        && s.account_id == account_id
                        && s.hour_ts < hour_ts =>
                {
                    Some(s)
                }
                _ => None,
            })
            .collect();
        states.sort_by_key(|s| s.hour_ts);
        Ok(states.last().map(|s| (*s).clone()))
    }

    async fn market_snapshot(&self, hour_ts: i64) -> AppResult<Vec<AssetMarketData>> {
        let t = self.tables.read().await;
        Ok(t.market
            .range((hour_ts, String::new())..(hour_ts + 1, String::new()))
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn predictions(&self, hour_ts: i64) -> AppResult<Vec<PredictionRecord>> {
        let t = self.tables.read().await;
        Ok(t.predictions
            .range((hour_ts, String::new())..(hour_ts + 1, String::new()))
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn prediction_history(
        &self,
        asset: &str,
        hour_ts: i64,
        bars: i32,
    ) -> AppResult<Vec<PredictionRecord>> {
        let t = self.tables.read().await;
        let mut history: Vec<PredictionRecord> = t
            .predictions
            .values()
            .filter(|p| p.asset == asset && p.hour_ts < hour_ts)
            .cloned()
            .collect();
        history.sort_by_key(|p| p.hour_ts);
        let skip = history.len().saturating_sub(bars.max(0) as usize);
        Ok(history.into_iter().skip(skip).collect())
    }

    async fn latest_fill_price(
        &self,
        run_id: &str,
        account_id: &str,
        asset: &str,
        before_hour_ts: i64,
    ) -> AppResult<Option<f64>> {
        let t = self.tables.read().await;
        let mut fills: Vec<&OrderFill> = t
            .rows
            .values()
            .filter_map(|r| match r {
                ReplayRow::Fill(f)
                    if f.run_id == run_id
                        && f.account_id == account_id
                        && f.asset == asset
                        && f.hour_ts < before_hour_ts =>
                {
                    Some(f)
                }
                _ => None,
            })
            .collect();
        fills.sort_by(|a, b| (a.fill_ts, &a.fill_id).cmp(&(b.fill_ts, &b.fill_id)));
        Ok(fills.last().map(|f| f.price))
    }

    async fn hour_rows(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Vec<ReplayRow>> {
        let t = self.tables.read().await;
        Ok(t.rows
            .values()
            .filter(|r| r.hour_ts() == hour_ts && row_belongs(r, run_id, account_id))
            .cloned()
            .collect())
    }

    async fn manifest(
        &self,
        run_id: &str,
        account_id: &str,
        hour_ts: i64,
    ) -> AppResult<Option<ReplayManifest>> {
        let t = self.tables.read().await;
        let id = ReplayManifest::make_id(run_id, account_id, hour_ts);
        Ok(t.manifests.get(&id).cloned())
    }

    async fn manifests_filtered(
        &self,
        filter: &ManifestFilter,
    ) -> AppResult<Vec<ReplayManifest>> {
        let t = self.tables.read().await;
        let mut found: Vec<ReplayManifest> = t
            .manifests
            .values()
            .filter(|m| filter.matches(m))
            .filter(|m| match filter.run_mode {
                Some(mode) => t
                    .run_contexts
                    .get(&m.run_id)
                    .map_or(false, |rc| rc.run_mode == mode),
                None => true,
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            (&a.run_id, &a.account_id, a.hour_ts).cmp(&(&b.run_id, &b.account_id, b.hour_ts))
        });
        Ok(found)
    }
}

fn row_belongs(row: &ReplayRow, run_id: &str, account_id: &str) -> bool {
    match row {
        ReplayRow::Signal(r) => r.run_id == run_id && r.account_id == account_id,
        ReplayRow::Order(r) => r.run_id == run_id && r.account_id == account_id,
        ReplayRow::Fill(r) => r.run_id == run_id && r.account_id == account_id,
        ReplayRow::Lot(r) => r.run_id == run_id && r.account_id == account_id,
        ReplayRow::Allocation(r) => r.run_id == run_id && r.account_id == account_id,
        ReplayRow::Trade(r) => r.run_id == run_id && r.account_id == account_id,
        ReplayRow::Ledger(r) => r.run_id == run_id && r.account_id == account_id,
        ReplayRow::Portfolio(r) => r.run_id == run_id && r.account_id == account_id,
        ReplayRow::Risk(r) => r.run_id == run_id && r.account_id == account_id,
        ReplayRow::Cluster(r) => r.run_id == run_id && r.account_id == account_id,
    }
}

#[async_trait]
impl RowSink for MemoryStore {
    async fn begin_hour(&self, scope: &HourScope) -> AppResult<()> {
        {
            let t = self.tables.read().await;
            if let Some(control) = &t.control {
                if !control.writes_enabled {
                    return Err(AppError::WriteGuardRejected(format!(
                        "writes disabled by {:?}",
                        control.holder
                    )));
                }
            }
        }
        let mut staged = self.staged.write().await;
        if staged.is_some() {
            return Err(AppError::Other(
                "hour transaction already in progress".to_string(),
            ));
        }
        *staged = Some(Staged {
            scope: scope.clone(),
            rows: BTreeMap::new(),
            manifests: BTreeMap::new(),
        });
        Ok(())
    }

    async fn insert_row(&self, row: &ReplayRow) -> AppResult<WriteOutcome> {
        let mut staged = self.staged.write().await;
        let staged = staged
            .as_mut()
            .ok_or_else(|| AppError::Other("no active hour transaction".to_string()))?;
        let key = (row.table(), row.natural_key().to_string());

        let existing = {
            let t = self.tables.read().await;
            t.rows
                .get(&key)
                .map(|r| r.stored_hash().to_string())
                .or_else(|| staged.rows.get(&key).map(|r| r.stored_hash().to_string()))
        };

        match existing {
            Some(actual) if actual == row.stored_hash() => {
                Ok(WriteOutcome::AlreadyPresentMatching)
            }
            Some(actual) => Ok(WriteOutcome::Conflict {
                expected: row.stored_hash().to_string(),
                actual,
            }),
            None => {
                staged.rows.insert(key, row.clone());
                Ok(WriteOutcome::Inserted)
            }
        }
    }

    async fn insert_manifest(&self, manifest: &ReplayManifest) -> AppResult<WriteOutcome> {
        let mut staged = self.staged.write().await;
        let staged = staged
            .as_mut()
            .ok_or_else(|| AppError::Other("no active hour transaction".to_string()))?;

        let existing = {
            let t = self.tables.read().await;
            t.manifests
                .get(&manifest.manifest_id)
                .map(|m| m.root_hash.clone())
        };

        match existing {
            Some(actual) if actual == manifest.root_hash => {
                Ok(WriteOutcome::AlreadyPresentMatching)
            }
            Some(actual) => Ok(WriteOutcome::Conflict {
                expected: manifest.root_hash.clone(),
                actual,
            }),
            None => {
                staged
                    .manifests
                    .insert(manifest.manifest_id.clone(), manifest.clone());
                Ok(WriteOutcome::Inserted)
            }
        }
    }

    async fn commit_hour(&self) -> AppResult<()> {
        let mut staged_guard = self.staged.write().await;
        let staged = staged_guard
            .take()
            .ok_or_else(|| AppError::Other("no active hour transaction".to_string()))?;
        let mut t = self.tables.write().await;
        tracing::debug!(
            scope = %staged.scope,
            rows = staged.rows.len(),
            "提交小时批次"
        );
        t.rows.extend(staged.rows);
        t.manifests.extend(staged.manifests);
        Ok(())
    }

    async fn abort_hour(&self) -> AppResult<()> {
        let mut staged = self.staged.write().await;
        *staged = None;
        Ok(())
    }
}
