//! 巨亏恢复评估
//!
//! 未实现亏损达到阈值的持仓优先于其它信号处理。动作由反弹概率
//! 与配置阈值的精确映射决定，不允许临场调整。

use crate::domain::entities::{PredictionRecord, RiskProfile};
use crate::domain::enums::RecoveryAction;

/// 达到巨亏阈值时给出恢复动作，否则 None
///
/// unrealized_loss_pct 为正数亏损比例（0.15 = 亏 15%）。
pub fn evaluate_recovery(
    profile: &RiskProfile,
    unrealized_loss_pct: f64,
    prediction: Option<&PredictionRecord>,
) -> Option<RecoveryAction> {
    if unrealized_loss_pct < profile.severe_loss_pct {
        return None;
    }
    // 预测缺失时反弹概率按 0 处理，落入 FULL_EXIT
    let rebound_prob = prediction.map(|p| p.rebound_prob).unwrap_or(0.0);
    let action = if rebound_prob >= profile.recovery_hold_prob {
        RecoveryAction::Hold
    } else if rebound_prob >= profile.recovery_partial_prob {
        RecoveryAction::PartialDeRisk
    } else {
        RecoveryAction::FullExit
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_prediction, test_profile};

    #[test]
    fn test_below_threshold_no_action() {
        let profile = test_profile(); // severe_loss_pct 0.15
        let p = test_prediction("BTC-USDT", 0.5);
        assert_eq!(evaluate_recovery(&profile, 0.10, Some(&p)), None);
    }

    #[test]
    fn test_rebound_prob_mapping() {
        let profile = test_profile(); // hold 0.65, partial 0.45
        let mut p = test_prediction("BTC-USDT", 0.5);

        p.rebound_prob = 0.70;
        assert_eq!(
            evaluate_recovery(&profile, 0.20, Some(&p)),
            Some(RecoveryAction::Hold)
        );
        p.rebound_prob = 0.50;
        assert_eq!(
            evaluate_recovery(&profile, 0.20, Some(&p)),
            Some(RecoveryAction::PartialDeRisk)
        );
        p.rebound_prob = 0.30;
        assert_eq!(
            evaluate_recovery(&profile, 0.20, Some(&p)),
            Some(RecoveryAction::FullExit)
        );
    }

    #[test]
    fn test_missing_prediction_exits() {
        let profile = test_profile();
        assert_eq!(
            evaluate_recovery(&profile, 0.20, None),
            Some(RecoveryAction::FullExit)
        );
    }
}
