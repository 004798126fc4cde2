//! 五级信号分类
//!
//! 方向概率对配置阈值的纯映射，阈值不合法（区间重叠）属于配置
//! 缺陷，分类器按强档优先解析。

use crate::domain::entities::RiskProfile;
use crate::domain::enums::SignalClass;

pub fn classify(profile: &RiskProfile, direction_prob: f64) -> SignalClass {
    if direction_prob >= profile.strong_positive_prob {
        SignalClass::StrongPositive
    } else if direction_prob >= profile.positive_prob {
        SignalClass::Positive
    } else if direction_prob <= profile.strong_negative_prob {
        SignalClass::StrongNegative
    } else if direction_prob <= profile.negative_prob {
        SignalClass::Negative
    } else {
        SignalClass::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_profile;

    #[test]
    fn test_five_bands() {
        let p = test_profile(); // 0.70 / 0.55 / 0.45 / 0.30
        assert_eq!(classify(&p, 0.75), SignalClass::StrongPositive);
        assert_eq!(classify(&p, 0.60), SignalClass::Positive);
        assert_eq!(classify(&p, 0.50), SignalClass::Neutral);
        assert_eq!(classify(&p, 0.40), SignalClass::Negative);
        assert_eq!(classify(&p, 0.25), SignalClass::StrongNegative);
    }

    #[test]
    fn test_boundaries_inclusive() {
        let p = test_profile();
        assert_eq!(classify(&p, 0.70), SignalClass::StrongPositive);
        assert_eq!(classify(&p, 0.55), SignalClass::Positive);
        assert_eq!(classify(&p, 0.45), SignalClass::Negative);
        assert_eq!(classify(&p, 0.30), SignalClass::StrongNegative);
    }
}
