/// 一小时的毫秒数
pub const HOUR_MS: i64 = 3_600_000;
/// 一分钟的毫秒数
pub const MINUTE_MS: i64 = 60_000;

/// 将毫秒时间戳对齐到所在小时的起点
pub fn hour_bucket(timestamp_ms: i64) -> i64 {
    timestamp_ms - timestamp_ms.rem_euclid(HOUR_MS)
}

/// 小时起点 + 分钟偏移
pub fn offset_ts(hour_ts: i64, offset_min: i64) -> i64 {
    hour_ts + offset_min * MINUTE_MS
}

/// 解析 "2024-01-01 10:00:00" 或毫秒时间戳为小时起点
pub fn parse_hour_arg(arg: &str) -> Result<i64, String> {
    if let Ok(ms) = arg.parse::<i64>() {
        return Ok(hour_bucket(ms));
    }
    let dt = chrono::NaiveDateTime::parse_from_str(arg, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("invalid hour '{}': {}", arg, e))?;
    Ok(hour_bucket(dt.and_utc().timestamp_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_bucket_truncates() {
        assert_eq!(hour_bucket(HOUR_MS + 59 * MINUTE_MS + 999), HOUR_MS);
        assert_eq!(hour_bucket(HOUR_MS), HOUR_MS);
    }

    #[test]
    fn parse_hour_accepts_both_forms() {
        assert_eq!(parse_hour_arg("3600000").unwrap(), HOUR_MS);
        let ts = parse_hour_arg("2024-01-01 10:30:00").unwrap();
        assert_eq!(ts % HOUR_MS, 0);
    }
}
