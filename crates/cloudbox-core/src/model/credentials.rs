//! スタック認証情報

use crate::secrets::SecretGenerator;
use serde::{Deserialize, Serialize};

/// データベースのルートユーザー名
pub const ROOT_USER: &str = "dbuser";

/// ルートパスワードの長さ
pub const ROOT_PASSWORD_LENGTH: usize = 24;

/// 1回の構成で生成される認証情報（stack-creds.json）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackCredentials {
    pub mongo_root_user: String,
    pub mongo_root_pass: String,
    pub identity: DatabaseCredentials,
}

/// サービス個別のDB認証情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseCredentials {
    pub db_user: String,
    pub db_password: String,
}

impl StackCredentials {
    /// 新しい認証情報を生成
    ///
    /// identity 用のDB認証情報は現状ルートと同じ値を使う。
    pub fn generate(secrets: &dyn SecretGenerator) -> Self {
        let root_pass = secrets.generate(ROOT_PASSWORD_LENGTH);
        Self {
            mongo_root_user: ROOT_USER.to_string(),
            mongo_root_pass: root_pass.clone(),
            identity: DatabaseCredentials {
                db_user: ROOT_USER.to_string(),
                db_password: root_pass,
            },
        }
    }

    /// ルートユーザーでのMongoDB接続文字列
    pub fn mongo_url(&self, host: &str) -> String {
        format!(
            "mongodb://{}:{}@{}:27017",
            self.mongo_root_user, self.mongo_root_pass, host
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::RandomSecrets;

    struct Fixed;

    impl SecretGenerator for Fixed {
        fn generate(&self, length: usize) -> String {
            "x".repeat(length)
        }
    }

    #[test]
    fn test_generate_shares_root_pair_with_identity() {
        let creds = StackCredentials::generate(&RandomSecrets);

        assert_eq!(creds.mongo_root_user, "dbuser");
        assert_eq!(creds.mongo_root_pass.len(), 24);
        assert_eq!(creds.identity.db_user, creds.mongo_root_user);
        assert_eq!(creds.identity.db_password, creds.mongo_root_pass);
    }

    #[test]
    fn test_mongo_url() {
        let creds = StackCredentials::generate(&Fixed);
        assert_eq!(
            creds.mongo_url("mongo"),
            format!("mongodb://dbuser:{}@mongo:27017", "x".repeat(24))
        );
    }

    #[test]
    fn test_json_layout() {
        let creds = StackCredentials::generate(&Fixed);
        let value = serde_json::to_value(&creds).unwrap();

        assert_eq!(value["mongoRootUser"], "dbuser");
        assert_eq!(value["identity"]["dbUser"], "dbuser");
        assert!(value["identity"]["dbPassword"].is_string());
    }
}
