//! 回撤状态机
//!
//! 峰值逐小时前滚，回撤 = (峰值 - 当前市值) / 峰值。
//! HARD_HALT 只阻断新开仓，存量仓位照常评估与退出。

use crate::domain::entities::{RiskHourlyState, RiskProfile};
use crate::domain::enums::DrawdownState;

/// 本小时的回撤评估
#[derive(Debug, Clone)]
pub struct DrawdownAssessment {
    pub state: DrawdownState,
    pub drawdown_pct: f64,
    pub peak_value: f64,
    pub kill_switch_active: bool,
}

/// 由上一小时风控态与小时初估值推导回撤档位（纯函数）
pub fn assess_drawdown(
    prior: Option<&RiskHourlyState>,
    total_value: f64,
    profile: &RiskProfile,
) -> DrawdownAssessment {
    let prior_peak = prior.map(|s| s.peak_value).unwrap_or(total_value);
    let peak_value = prior_peak.max(total_value);
    let drawdown_pct = if peak_value > 0.0 {
        (peak_value - total_value) / peak_value
    } else {
        0.0
    };
    let state = if drawdown_pct >= profile.drawdown_hard_pct {
        DrawdownState::HardHalt
    } else if drawdown_pct >= profile.drawdown_soft_pct {
        DrawdownState::SoftLimit
    } else {
        DrawdownState::Normal
    };
    DrawdownAssessment {
        state,
        drawdown_pct,
        peak_value,
        kill_switch_active: state == DrawdownState::HardHalt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_profile;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_hour_peak_is_current_value() {
        let assessment = assess_drawdown(None, 10_000.0, &test_profile());
        assert_eq!(assessment.state, DrawdownState::Normal);
        assert_relative_eq!(assessment.peak_value, 10_000.0);
        assert_relative_eq!(assessment.drawdown_pct, 0.0);
    }

    #[test]
    fn test_tiers_from_peak() {
        let profile = test_profile(); // soft 0.10, hard 0.20
        let prior = RiskHourlyState {
            state_id: "rkh:x".to_string(),
            run_id: "r".to_string(),
            account_id: "a".to_string(),
            hour_ts: 0,
            drawdown_state: DrawdownState::Normal,
            drawdown_pct: 0.0,
            peak_value: 10_000.0,
            kill_switch_active: false,
            seed_hash: String::new(),
            row_hash: String::new(),
        };
        let soft = assess_drawdown(Some(&prior), 8_900.0, &profile);
        assert_eq!(soft.state, DrawdownState::SoftLimit);
        assert!(!soft.kill_switch_active);

        let hard = assess_drawdown(Some(&prior), 7_900.0, &profile);
        assert_eq!(hard.state, DrawdownState::HardHalt);
        assert!(hard.kill_switch_active);

        // 峰值不回退
        assert_relative_eq!(hard.peak_value, 10_000.0);
    }
}
