//! 重放对账测试：一致、各类失配分类、空目标集

use quant_replay::domain::entities::{OrderFill, OrderRequest};
use quant_replay::domain::enums::{MismatchKind, OrderSide, RunMode, SignalAction};
use quant_replay::domain::HourScope;
use quant_replay::executor::execute_hour;
use quant_replay::lifecycle::{SimulatedExchange, SimulatorConfig};
use quant_replay::replay::{replay_hour, replay_sweep, replay_window};
use quant_replay::store::row::RowTable;
use quant_replay::store::{ManifestFilter, MemoryStore, ReplayRow, RowSink};
use quant_replay::test_support::*;

async fn executed_store() -> (MemoryStore, HourScope) {
    let store = MemoryStore::new();
    store.seed_run_context(test_run_context("r1", "acct")).await;
    store.seed_profile(test_profile()).await;
    store.seed_assignment(test_assignment("acct")).await;
    store.seed_market(test_market(hour(2), "BTC-USDT", 100.0)).await;
    let mut prior = test_prediction("BTC-USDT", 0.60);
    prior.hour_ts = hour(1);
    store.seed_prediction(prior).await;
    let mut current = test_prediction("BTC-USDT", 0.60);
    current.hour_ts = hour(2);
    store.seed_prediction(current).await;

    let scope = HourScope::new("r1", "acct", hour(2));
    let adapter = SimulatedExchange::new(
        [("BTC-USDT".to_string(), test_market(hour(2), "BTC-USDT", 100.0))]
            .into_iter()
            .collect(),
        SimulatorConfig::from_profile(&test_profile()),
    );
    execute_hour(&store, &adapter, &scope).await.unwrap();
    (store, scope)
}

fn fill_key() -> String {
    let logical = OrderRequest::make_logical_id("r1", hour(2), "BTC-USDT", OrderSide::Buy);
    OrderFill::make_id(&OrderRequest::make_request_id(&logical, 0))
}

#[tokio::test]
async fn test_untouched_hour_replays_true() -> anyhow::Result<()> {
    let (store, scope) = executed_store().await;
    let outcome = replay_hour(&store, &scope).await?;
    assert!(outcome.ok, "unexpected mismatch: {}", outcome.detail);
    assert_eq!(outcome.mismatch, None);
    Ok(())
}

#[tokio::test]
async fn test_missing_manifest_classified_first() -> anyhow::Result<()> {
    let (store, _) = executed_store().await;
    let other = HourScope::new("r1", "acct", hour(3));
    let outcome = replay_hour(&store, &other).await?;
    assert!(!outcome.ok);
    assert_eq!(outcome.mismatch, Some(MismatchKind::MissingManifest));
    Ok(())
}

#[tokio::test]
async fn test_changed_boundary_input_is_seed_mismatch() -> anyhow::Result<()> {
    let (store, scope) = executed_store().await;
    // 事后改写本小时预测行：seed 重算值必然偏离清单
    let mut altered = test_prediction("BTC-USDT", 0.99);
    altered.hour_ts = hour(2);
    store.seed_prediction(altered).await;

    let outcome = replay_hour(&store, &scope).await?;
    assert!(!outcome.ok);
    assert_eq!(outcome.mismatch, Some(MismatchKind::SeedMismatch));
    Ok(())
}

#[tokio::test]
async fn test_injected_row_is_count_mismatch() -> anyhow::Result<()> {
    let (store, scope) = executed_store().await;
    let ctx = test_hour_context(hour(2), 1.0, vec![], vec![], vec![]);
    let extra = test_signal(&ctx, "ZZZ-USDT", SignalAction::Enter, 0.1, "ENTRY_SIGNAL");
    store.begin_hour(&scope).await?;
    store.insert_row(&ReplayRow::Signal(extra)).await?;
    store.commit_hour().await?;

    let outcome = replay_hour(&store, &scope).await?;
    assert!(!outcome.ok);
    assert_eq!(outcome.mismatch, Some(MismatchKind::RowCountMismatch));
    Ok(())
}

#[tokio::test]
async fn test_tampered_row_field_is_root_mismatch() -> anyhow::Result<()> {
    let (store, scope) = executed_store().await;
    let tampered = store
        .tamper_row(RowTable::OrderFills, &fill_key(), |row| {
            if let ReplayRow::Fill(fill) = row {
                fill.fill_ts += 1;
            }
        })
        .await;
    assert!(tampered, "fill row not found");

    let outcome = replay_hour(&store, &scope).await?;
    assert!(!outcome.ok);
    assert_eq!(outcome.mismatch, Some(MismatchKind::RootMismatch));
    assert!(outcome.detail.contains("order_fills"));
    Ok(())
}

#[tokio::test]
async fn test_window_sweep_and_vacuous_truth() -> anyhow::Result<()> {
    let (store, _) = executed_store().await;

    let covered = replay_window(&store, "r1", "acct", hour(0), hour(5)).await?;
    assert_eq!(covered.len(), 1);
    assert!(covered.iter().all(|o| o.ok));

    // 窗口内无清单：目标集为空，平凡为真
    let empty = replay_window(&store, "r1", "acct", hour(10), hour(20)).await?;
    assert!(empty.is_empty());
    assert!(empty.iter().all(|o| o.ok));
    Ok(())
}

#[tokio::test]
async fn test_sweep_honors_run_mode_filter() -> anyhow::Result<()> {
    let (store, _) = executed_store().await; // 回测运行
    let live = replay_sweep(
        &store,
        &ManifestFilter {
            run_mode: Some(RunMode::Live),
            ..Default::default()
        },
    )
    .await?;
    assert!(live.is_empty());

    let backtest = replay_sweep(
        &store,
        &ManifestFilter {
            run_mode: Some(RunMode::Backtest),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(backtest.len(), 1);
    assert!(backtest[0].ok);
    Ok(())
}

#[tokio::test]
async fn test_sweep_reports_mismatch_per_manifest() -> anyhow::Result<()> {
    let (store, _) = executed_store().await;
    store
        .tamper_row(RowTable::OrderFills, &fill_key(), |row| {
            if let ReplayRow::Fill(fill) = row {
                fill.price += 0.5;
            }
        })
        .await;

    let outcomes = replay_sweep(
        &store,
        &ManifestFilter {
            run_id: Some("r1".to_string()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].ok);
    assert_eq!(outcomes[0].mismatch, Some(MismatchKind::RootMismatch));
    Ok(())
}
