pub mod error;

pub use error::*;

use ahab_core::StopMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 設定ファイルのパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "AHAB_CONFIG_PATH";

/// 設定ディレクトリ内のファイル名（優先順）
const CONFIG_FILENAMES: &[&str] = &["config.yaml", "config.yml"];

/// compose コマンドの指定
///
/// `"docker compose"` のような文字列、または引数の配列で書ける。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ComposeCommand {
    Line(String),
    Args(Vec<String>),
}

impl ComposeCommand {
    pub fn to_args(&self) -> Vec<String> {
        match self {
            ComposeCommand::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            ComposeCommand::Args(args) => args.clone(),
        }
    }
}

/// ユーザー設定 (`~/.config/ahab/config.yaml`)
///
/// すべての項目は省略可能。CLI 引数・環境変数が指定された場合はそちらが優先される。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AhabConfig {
    /// compose ファイルを探索するルートディレクトリ
    pub docker_dir: Option<PathBuf>,
    pub compose_command: Option<ComposeCommand>,
    /// stop アクションの意味 (stop / down)
    pub stop_mode: StopMode,
    pub max_parallel: Option<usize>,
    /// 1 ファイルあたりのタイムアウト（秒）
    pub timeout_secs: Option<u64>,
}

impl AhabConfig {
    /// 設定ファイルを探して読み込む
    ///
    /// 見つからない場合はデフォルト値を返す。
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        debug!(config = %path.display(), "Loading config file");
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        // 空ファイルはデフォルト扱い
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn compose_args(&self) -> Option<Vec<String>> {
        self.compose_command
            .as_ref()
            .map(ComposeCommand::to_args)
            .filter(|args| !args.is_empty())
    }
}

/// ahab の設定ディレクトリを取得
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("ahab"))
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 AHAB_CONFIG_PATH (直接パス指定)
/// 2. ~/.config/ahab/config.yaml, config.yml
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(&config_path);
        if path.exists() {
            return Some(path);
        }
        warn!(env_path = %config_path, "AHAB_CONFIG_PATH is set but file does not exist");
    }

    let config_dir = get_config_dir().ok()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_parse_full_config() {
        let config = AhabConfig::parse(
            r#"
docker_dir: ~/docker
compose_command: docker compose
stop_mode: down
max_parallel: 4
timeout_secs: 120
"#,
            Path::new("config.yaml"),
        )
        .unwrap();

        assert_eq!(config.docker_dir, Some(PathBuf::from("~/docker")));
        assert_eq!(
            config.compose_args(),
            Some(vec!["docker".to_string(), "compose".to_string()])
        );
        assert_eq!(config.stop_mode, StopMode::Down);
        assert_eq!(config.max_parallel, Some(4));
        assert_eq!(config.timeout_secs, Some(120));
    }

    #[test]
    fn test_compose_command_as_list() {
        let config = AhabConfig::parse(
            "compose_command: [podman-compose, --podman-path, /usr/bin/podman]\n",
            Path::new("config.yaml"),
        )
        .unwrap();

        assert_eq!(
            config.compose_args(),
            Some(vec![
                "podman-compose".to_string(),
                "--podman-path".to_string(),
                "/usr/bin/podman".to_string(),
            ])
        );
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = AhabConfig::parse("\n", Path::new("config.yaml")).unwrap();
        assert_eq!(config, AhabConfig::default());
        assert_eq!(config.stop_mode, StopMode::Stop);
        assert_eq!(config.compose_args(), None);
    }

    #[test]
    fn test_unknown_field_is_error() {
        let result = AhabConfig::parse("dockr_dir: /srv\n", Path::new("config.yaml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_invalid_stop_mode_is_error() {
        let result = AhabConfig::parse("stop_mode: pause\n", Path::new("config.yaml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("ahab"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "max_parallel: 2\n").unwrap();

        temp_env::with_var(CONFIG_PATH_ENV, Some(&config_path), || {
            assert_eq!(find_config_file(), Some(config_path.clone()));

            let config = AhabConfig::load().unwrap();
            assert_eq!(config.max_parallel, Some(2));
        });
    }

    #[test]
    #[serial]
    fn test_load_from_home_config_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let xdg = temp_dir.path().join("xdg");
        fs::create_dir_all(xdg.join("ahab")).unwrap();
        fs::write(xdg.join("ahab/config.yml"), "timeout_secs: 5\n").unwrap();

        // dirs::config_dir は Linux では XDG_CONFIG_HOME を参照する
        if cfg!(target_os = "linux") {
            temp_env::with_vars(
                [
                    (CONFIG_PATH_ENV, None),
                    ("XDG_CONFIG_HOME", Some(xdg.as_os_str())),
                ],
                || {
                    let config = AhabConfig::load().unwrap();
                    assert_eq!(config.timeout_secs, Some(5));
                },
            );
        }
    }
}
