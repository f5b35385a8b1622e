//! ビルダーに渡される実行環境

use crate::reporter::Reporter;
use crate::runner::CommandRunner;
use cloudbox_config::StackPaths;
use cloudbox_core::SecretGenerator;
use std::path::PathBuf;
use std::sync::Arc;

/// 外部コマンド・乱数・パス・通知先をまとめたもの
///
/// 構成1回につき1つ作られ、ビルダーごとに `scoped` で名前空間付きの
/// 通知先を持つコピーが渡される。
#[derive(Clone)]
pub struct BuildContext {
    runner: Arc<dyn CommandRunner>,
    secrets: Arc<dyn SecretGenerator>,
    paths: StackPaths,
    reporter: Reporter,
}

impl BuildContext {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        secrets: Arc<dyn SecretGenerator>,
        paths: StackPaths,
    ) -> Self {
        Self {
            runner,
            secrets,
            paths,
            reporter: Reporter::silent(),
        }
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// ビルダー識別子で名前空間を付けたコピー
    pub fn scoped(&self, identifier: &str) -> Self {
        Self {
            reporter: self.reporter.scoped(identifier),
            ..self.clone()
        }
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    pub fn secrets(&self) -> &dyn SecretGenerator {
        self.secrets.as_ref()
    }

    pub fn paths(&self) -> &StackPaths {
        &self.paths
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// `configs/<name>`
    pub fn config_dir(&self, name: &str) -> PathBuf {
        self.paths.configs_dir().join(name)
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("paths", &self.paths)
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}
