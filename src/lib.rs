//! 确定性小时执行核心
//!
//! 以 (run, account, hour) 为原子单元的交易执行与审计系统：
//! 每个小时单元从已校验的边界状态出发，决策、下单、记账全部
//! 确定性推导，行级哈希链 + 小时清单让任何一小时都可以被独立
//! 重放并逐字节对账。
//!
//! 模块分层：
//! - `context`：小时上下文装载与 seed 哈希
//! - `risk` / `decision`：风控运行时与信号决策
//! - `lifecycle`：订单尝试/成交/批次推进
//! - `ledger`：现金流水、小时态物化、事务写入
//! - `replay`：独立重放与清单对账
//! - `store`：MySQL 与内存两套存储实现

pub mod app_config;
pub mod cli;
pub mod context;
pub mod decision;
pub mod domain;
pub mod error;
pub mod executor;
pub mod hashing;
pub mod ledger;
pub mod lifecycle;
pub mod replay;
pub mod risk;
pub mod store;
pub mod test_support;
pub mod time_util;
