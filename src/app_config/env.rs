use std::env;

/// 读取布尔型环境变量：支持 true/false/1/0（大小写不敏感）
pub fn env_is_true(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => {
            let v = v.trim();
            v.eq_ignore_ascii_case("true") || v == "1"
        }
        Err(_) => default,
    }
}

/// 读取字符串环境变量，若不存在则返回默认值
pub fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) => v,
        Err(_) => default.to_string(),
    }
}

/// 读取 f64 环境变量，不存在或解析失败返回默认值
pub fn env_f64(key: &str, default: f64) -> f64 {
    match env::var(key) {
        Ok(v) => v.trim().parse::<f64>().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_is_true_parses_variants() {
        std::env::set_var("QR_TEST_FLAG", "TRUE");
        assert!(env_is_true("QR_TEST_FLAG", false));
        std::env::set_var("QR_TEST_FLAG", "0");
        assert!(!env_is_true("QR_TEST_FLAG", true));
        std::env::remove_var("QR_TEST_FLAG");
        assert!(env_is_true("QR_TEST_FLAG", true));
    }
}
