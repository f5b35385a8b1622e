//! 構成処理の進捗通知

use tokio::sync::mpsc::UnboundedSender;

/// 表示用の進捗イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEvent {
    /// 一時的な状態表示（スピナーなど）
    Status(String),
    /// 完了した段階の記録
    Milestone(String),
}

impl StackEvent {
    pub fn message(&self) -> &str {
        match self {
            Self::Status(message) | Self::Milestone(message) => message,
        }
    }
}

/// 通知の送り手
///
/// 受け手がいなくても処理には影響しない。`scoped` で作った Reporter は
/// メッセージを `"<識別子>: <メッセージ>"` の形式で送る。
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    scope: Option<String>,
    sender: Option<UnboundedSender<StackEvent>>,
}

impl Reporter {
    pub fn new(sender: UnboundedSender<StackEvent>) -> Self {
        Self {
            scope: None,
            sender: Some(sender),
        }
    }

    /// 通知先なし
    pub fn silent() -> Self {
        Self::default()
    }

    /// 識別子で名前空間を付けた Reporter
    pub fn scoped(&self, identifier: &str) -> Self {
        Self {
            scope: Some(identifier.to_string()),
            sender: self.sender.clone(),
        }
    }

    pub fn status(&self, message: impl AsRef<str>) {
        self.send(StackEvent::Status(self.format(message.as_ref())));
    }

    pub fn milestone(&self, message: impl AsRef<str>) {
        self.send(StackEvent::Milestone(self.format(message.as_ref())));
    }

    fn format(&self, message: &str) -> String {
        match &self.scope {
            Some(scope) => format!("{}: {}", scope, message),
            None => message.to_string(),
        }
    }

    fn send(&self, event: StackEvent) {
        if let Some(sender) = &self.sender {
            // 受信側が閉じていても無視
            let _ = sender.send(event);
        }
    }
}
