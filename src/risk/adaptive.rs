//! 自适应持仓
//!
//! 持有时长不进入判断：只看当前小时的方向概率是否仍然支持持有。

use crate::domain::entities::{PredictionRecord, RiskProfile};

/// 方向概率跌破继续持有阈值即触发减仓
pub fn should_continue_holding(profile: &RiskProfile, prediction: &PredictionRecord) -> bool {
    prediction.direction_prob >= profile.adaptive_continue_prob
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_prediction, test_profile};

    #[test]
    fn test_threshold_is_inclusive() {
        let profile = test_profile(); // adaptive_continue_prob 0.40
        let mut p = test_prediction("BTC-USDT", 0.40);
        assert!(should_continue_holding(&profile, &p));
        p.direction_prob = 0.39;
        assert!(!should_continue_holding(&profile, &p));
    }
}
