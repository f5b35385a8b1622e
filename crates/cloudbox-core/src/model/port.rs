//! ポート定義

/// ホストポートとコンテナポートの対応
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl PortMapping {
    pub fn new(host: u16, container: u16) -> Self {
        Self { host, container }
    }
}
