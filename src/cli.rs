//! 命令行入口
//!
//! execute-hour 执行小时单元；replay-hour / replay-window /
//! replay-manifest 做重放对账；replay-tool 是 CI 闸门形态，
//! 打印 `REPLAY PARITY: TRUE|FALSE` 并以退出码表达结论。

use clap::{Parser, Subcommand};

use crate::app_config::db::{close_db_pool, get_db_pool, health_check, init_db_pool};
use crate::context::load_hour_context;
use crate::domain::enums::RunMode;
use crate::domain::HourScope;
use crate::executor::execute_hour;
use crate::lifecycle::{LiveVenueAdapter, SimulatedExchange, SimulatorConfig};
use crate::replay::{replay_hour, replay_sweep, replay_window, ReplayOutcome};
use crate::store::{ManifestFilter, MysqlStore, SnapshotReader};
use crate::time_util::parse_hour_arg;

#[derive(Parser)]
#[command(name = "quant_replay", version, about = "确定性小时执行核心与重放审计")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// 执行一个 (run, account, hour) 单元
    ExecuteHour {
        #[arg(long)]
        run_id: String,
        #[arg(long)]
        account_id: String,
        /// 毫秒时间戳或 "YYYY-MM-DD HH:MM:SS"
        #[arg(long)]
        hour: String,
    },
    /// 重放单个小时并与清单对账
    ReplayHour {
        #[arg(long)]
        run_id: String,
        #[arg(long)]
        account_id: String,
        #[arg(long)]
        hour: String,
    },
    /// 重放一个小时窗口内的全部已见证小时
    ReplayWindow {
        #[arg(long)]
        run_id: String,
        #[arg(long)]
        account_id: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// 按清单过滤器做重放清扫
    ReplayManifest {
        #[arg(long)]
        run_id: Option<String>,
        #[arg(long)]
        account_id: Option<String>,
        /// 运行模式过滤：BACKTEST / PAPER / LIVE
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// CI 对账闸门：任一小时失配即退出码非零
    ReplayTool {
        #[arg(long)]
        run_id: Option<String>,
        #[arg(long)]
        account_id: Option<String>,
        /// 运行模式过滤：BACKTEST / PAPER / LIVE
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
}

/// 运行命令，返回进程退出码
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    init_db_pool().await?;
    health_check().await?;
    let store = MysqlStore::new(get_db_pool().clone());

    let code = match cli.command {
        Command::ExecuteHour {
            run_id,
            account_id,
            hour,
        } => {
            let hour_ts = parse_hour_arg(&hour).map_err(anyhow::Error::msg)?;
            let scope = HourScope::new(&run_id, &account_id, hour_ts);
            let run = store
                .run_context(&run_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("run context {} not found", run_id))?;

            let report = match run.run_mode {
                RunMode::Live => {
                    let adapter = LiveVenueAdapter::from_env()?;
                    execute_hour(&store, &adapter, &scope).await?
                }
                _ => {
                    // 模拟盘的费用参数随配置行进入 seed，不读环境
                    let ctx = load_hour_context(&store, &scope).await?;
                    let adapter = SimulatedExchange::new(
                        ctx.market.clone(),
                        SimulatorConfig::from_profile(&ctx.profile),
                    );
                    execute_hour(&store, &adapter, &scope).await?
                }
            };
            println!(
                "{} signals={} orders={} fills={} trades={} inserted={} matched={}",
                report.scope,
                report.signal_count,
                report.order_count,
                report.fill_count,
                report.trade_count,
                report.stats.inserted,
                report.stats.matched
            );
            println!("seed={}", report.seed_hash);
            println!("root={}", report.root_hash);
            0
        }
        Command::ReplayHour {
            run_id,
            account_id,
            hour,
        } => {
            let hour_ts = parse_hour_arg(&hour).map_err(anyhow::Error::msg)?;
            let scope = HourScope::new(&run_id, &account_id, hour_ts);
            let outcome = replay_hour(&store, &scope).await?;
            print_outcomes(std::slice::from_ref(&outcome));
            i32::from(!outcome.ok)
        }
        Command::ReplayWindow {
            run_id,
            account_id,
            from,
            to,
        } => {
            let from_ts = parse_hour_arg(&from).map_err(anyhow::Error::msg)?;
            let to_ts = parse_hour_arg(&to).map_err(anyhow::Error::msg)?;
            let outcomes = replay_window(&store, &run_id, &account_id, from_ts, to_ts).await?;
            print_outcomes(&outcomes);
            i32::from(!outcomes.iter().all(|o| o.ok))
        }
        Command::ReplayManifest {
            run_id,
            account_id,
            mode,
            from,
            to,
        } => {
            let filter = build_filter(run_id, account_id, mode, from, to)?;
            let outcomes = replay_sweep(&store, &filter).await?;
            print_outcomes(&outcomes);
            i32::from(!outcomes.iter().all(|o| o.ok))
        }
        Command::ReplayTool {
            run_id,
            account_id,
            mode,
            from,
            to,
        } => {
            let filter = build_filter(run_id, account_id, mode, from, to)?;
            let outcomes = replay_sweep(&store, &filter).await?;
            print_outcomes(&outcomes);
            // 空目标集平凡为真
            let parity = outcomes.iter().all(|o| o.ok);
            println!("REPLAY PARITY: {}", if parity { "TRUE" } else { "FALSE" });
            i32::from(!parity)
        }
    };

    close_db_pool().await?;
    Ok(code)
}

fn build_filter(
    run_id: Option<String>,
    account_id: Option<String>,
    mode: Option<String>,
    from: Option<String>,
    to: Option<String>,
) -> anyhow::Result<ManifestFilter> {
    Ok(ManifestFilter {
        run_id,
        account_id,
        run_mode: mode
            .map(|s| {
                RunMode::from_str(&s).ok_or_else(|| anyhow::anyhow!("invalid run mode: {}", s))
            })
            .transpose()?,
        from_hour_ts: from
            .map(|s| parse_hour_arg(&s).map_err(anyhow::Error::msg))
            .transpose()?,
        to_hour_ts: to
            .map(|s| parse_hour_arg(&s).map_err(anyhow::Error::msg))
            .transpose()?,
    })
}

fn print_outcomes(outcomes: &[ReplayOutcome]) {
    for outcome in outcomes {
        match (&outcome.ok, &outcome.mismatch) {
            (true, _) => println!("{} OK", outcome.scope),
            (false, Some(kind)) => {
                println!("{} {} {}", outcome.scope, kind.as_str(), outcome.detail)
            }
            (false, None) => println!("{} MISMATCH {}", outcome.scope, outcome.detail),
        }
    }
}
