//! 行哈希与哈希链
//!
//! 行哈希是规范化帧 + 显式传入的父哈希的纯函数，
//! 绝不依赖之后会变动的内存状态（行写入后不再变更）。

use sha2::{Digest, Sha256};

/// 链首哨兵（账户首条现金流水的 prev_hash）
pub const GENESIS_HASH: &str = "genesis";

/// sha256 十六进制
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// 行哈希 = sha256(规范化帧 || 父哈希序列)
pub fn row_hash(canonical: &str, parents: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    for p in parents {
        hasher.update(b"|p=");
        hasher.update(p.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_hash_changes_with_parent() {
        let a = row_hash("frame", &["p1"]);
        let b = row_hash("frame", &["p2"]);
        let c = row_hash("frame", &["p1"]);
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(sha256_hex("").len(), 64);
    }
}
