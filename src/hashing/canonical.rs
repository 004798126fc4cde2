//! 规范化序列化
//!
//! 任何重放权威行在哈希前都先渲染为确定性的文本帧：
//! 字段顺序固定、浮点固定 8 位小数、时间戳为十进制毫秒。
//! 跨执行、跨平台必须产生逐字节相同的结果。

/// 浮点规范化：固定 8 位小数，归一化负零
pub fn fmt_f64(v: f64) -> String {
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{:.8}", v)
}

pub fn fmt_opt_f64(v: Option<f64>) -> String {
    match v {
        Some(v) => fmt_f64(v),
        None => "null".to_string(),
    }
}

/// 规范化帧构造器
///
/// 产出形如 `table|k=v|k=v|...` 的文本帧，字段按 push 顺序排列，
/// 每个实体的 push 顺序是其序列化契约的一部分。
pub struct CanonicalFrame {
    parts: Vec<String>,
}

impl CanonicalFrame {
    pub fn new(table: &str) -> Self {
        Self {
            parts: vec![table.to_string()],
        }
    }

    pub fn field(mut self, key: &str, value: &str) -> Self {
        self.parts.push(format!("{}={}", key, value));
        self
    }

    pub fn f64(self, key: &str, value: f64) -> Self {
        let v = fmt_f64(value);
        self.field(key, &v)
    }

    pub fn opt_f64(self, key: &str, value: Option<f64>) -> Self {
        let v = fmt_opt_f64(value);
        self.field(key, &v)
    }

    pub fn i64(self, key: &str, value: i64) -> Self {
        let v = value.to_string();
        self.field(key, &v)
    }

    pub fn i32(self, key: &str, value: i32) -> Self {
        let v = value.to_string();
        self.field(key, &v)
    }

    pub fn bool(self, key: &str, value: bool) -> Self {
        self.field(key, if value { "true" } else { "false" })
    }

    pub fn finish(self) -> String {
        self.parts.join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_formatting_is_stable() {
        assert_eq!(fmt_f64(1.5), "1.50000000");
        assert_eq!(fmt_f64(0.0), "0.00000000");
        assert_eq!(fmt_f64(-0.0), "0.00000000");
        assert_eq!(fmt_opt_f64(None), "null");
    }

    #[test]
    fn frame_preserves_push_order() {
        let frame = CanonicalFrame::new("t").field("a", "1").i64("b", 2).finish();
        assert_eq!(frame, "t|a=1|b=2");
    }
}
