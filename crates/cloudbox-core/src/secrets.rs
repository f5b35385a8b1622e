//! ランダムな秘密文字列の生成

use rand::Rng;
use rand::distributions::Alphanumeric;

/// 秘密文字列の生成器
///
/// テストでは決定的な実装に差し替えられる。
pub trait SecretGenerator: Send + Sync {
    /// `length` 文字の英数字文字列を生成
    fn generate(&self, length: usize) -> String;
}

/// スレッドローカルな乱数源を使う標準の生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSecrets;

impl SecretGenerator for RandomSecrets {
    fn generate(&self, length: usize) -> String {
        generate_random_string(length)
    }
}

/// `[A-Za-z0-9]` から一様に選んだ `length` 文字の文字列
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
