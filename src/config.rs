use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// 配置文件名（位于项目根目录，可选）
pub const CONFIG_FILE_NAME: &str = "emr_upload.toml";

/// 程序配置
///
/// 进程启动时构造一次，显式传入 FileResolver / BatchSource / Session
#[derive(Clone)]
pub struct Config {
    /// 项目根目录，files/ logs/ screenshots/ downloads/ 都在其下
    pub project_root: PathBuf,
    /// 批量模式的患者列表（表格导出的 CSV）
    pub patient_list: PathBuf,
    /// 上传结果日志（只追加）
    pub outcome_log: PathBuf,
    /// 目标站点
    pub target_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 设置后连接到已打开的浏览器，而不是启动新浏览器
    pub browser_debug_port: Option<u16>,
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 批量模式最多处理的患者数量
    pub max_patients: usize,
    /// 可接受的文档扩展名（不区分大小写）
    pub document_extension: String,
    /// 单个页面步骤的等待上限（秒）
    pub step_timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("project_root", &self.project_root)
            .field("patient_list", &self.patient_list)
            .field("outcome_log", &self.outcome_log)
            .field("target_url", &self.target_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("browser_debug_port", &self.browser_debug_port)
            .field("headless", &self.headless)
            .field("max_patients", &self.max_patients)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_root(PathBuf::from("."))
    }
}

/// 配置文件内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    patient_list: Option<PathBuf>,
    outcome_log: Option<PathBuf>,
    target_url: Option<String>,
    username: Option<String>,
    browser_debug_port: Option<u16>,
    chrome_executable: Option<PathBuf>,
    max_patients: Option<usize>,
    document_extension: Option<String>,
    step_timeout_secs: Option<u64>,
}

impl Config {
    /// 以指定根目录构造默认配置
    pub fn with_root(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            patient_list: project_root.join("files").join("patients.csv"),
            outcome_log: project_root.join("logs").join("uploads_log.csv"),
            project_root,
            target_url: "https://app.elationemr.com/".to_string(),
            username: None,
            password: None,
            browser_debug_port: None,
            chrome_executable: None,
            headless: false,
            verbose_logging: false,
            max_patients: 2,
            document_extension: "pdf".to_string(),
            step_timeout_secs: 30,
        }
    }

    /// 加载配置：默认值 → emr_upload.toml → 环境变量
    pub fn load(project_root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::with_root(project_root);
        let file_path = config.project_root.join(CONFIG_FILE_NAME);
        if file_path.is_file() {
            debug!("读取配置文件: {}", file_path.display());
            config.apply_file(&file_path)?;
        }
        config.apply_env();
        Ok(config)
    }

    /// 从环境变量加载（根目录取 EMR_PROJECT_ROOT，否则为当前目录）
    pub fn from_env() -> Result<Self, ConfigError> {
        let root = std::env::var("EMR_PROJECT_ROOT")
            .map(PathBuf::from)
            .or_else(|_| std::env::current_dir())
            .unwrap_or_else(|_| PathBuf::from("."));
        Self::load(root)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file: FileConfig = toml::from_str(&content).map_err(|e| ConfigError::FileParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(p) = file.patient_list {
            self.patient_list = self.project_root.join(p);
        }
        if let Some(p) = file.outcome_log {
            self.outcome_log = self.project_root.join(p);
        }
        if let Some(url) = file.target_url {
            self.target_url = url;
        }
        if file.username.is_some() {
            self.username = file.username;
        }
        if file.browser_debug_port.is_some() {
            self.browser_debug_port = file.browser_debug_port;
        }
        if let Some(p) = file.chrome_executable {
            self.chrome_executable = Some(p);
        }
        if let Some(n) = file.max_patients {
            self.max_patients = n;
        }
        if let Some(ext) = file.document_extension {
            self.document_extension = ext;
        }
        if let Some(secs) = file.step_timeout_secs {
            self.step_timeout_secs = secs;
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("EMR_URL") {
            self.target_url = url;
        }
        if let Ok(user) = std::env::var("EMR_USERNAME") {
            self.username = Some(user);
        }
        if let Ok(pass) = std::env::var("EMR_PASSWORD") {
            self.password = Some(pass);
        }
        if let Some(port) = std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()) {
            self.browser_debug_port = Some(port);
        }
        if let Ok(path) = std::env::var("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(PathBuf::from(path));
        }
        self.verbose_logging = std::env::var("VERBOSE_LOGGING")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.verbose_logging);
    }

    pub fn files_dir(&self) -> PathBuf {
        self.project_root.join("files")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.project_root.join("logs")
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.project_root.join("screenshots")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.project_root.join("downloads")
    }

    /// 创建运行所需的目录
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [
            self.files_dir(),
            self.logs_dir(),
            self.screenshots_dir(),
            self.downloads_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// 取出登录凭据，缺失时在会话开始前报错
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let username = self
            .username
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingCredentials { field: "username" })?;
        let password = self
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::MissingCredentials { field: "password" })?;
        Ok(Credentials {
            username,
            password,
            url: self.target_url.clone(),
        })
    }
}

/// 登录凭据
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("url", &self.url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_follow_root() {
        let config = Config::with_root("/srv/emr");
        assert_eq!(config.patient_list, PathBuf::from("/srv/emr/files/patients.csv"));
        assert_eq!(config.outcome_log, PathBuf::from("/srv/emr/logs/uploads_log.csv"));
        assert_eq!(config.max_patients, 2);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "max_patients = 5\npatient_list = \"data/list.csv\"\ntarget_url = \"https://emr.test/\"\n",
        )
        .unwrap();

        let mut config = Config::with_root(dir.path());
        config.apply_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();

        assert_eq!(config.max_patients, 5);
        assert_eq!(config.patient_list, dir.path().join("data/list.csv"));
        assert_eq!(config.target_url, "https://emr.test/");
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = Config::with_root("/srv/emr");
        config.username = Some("doctor".to_string());

        let err = config.credentials().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials { field: "password" }));

        config.password = Some("secret".to_string());
        let creds = config.credentials().unwrap();
        assert!(!format!("{:?}", creds).contains("secret"));
    }

    #[test]
    fn test_ensure_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_root(dir.path());
        config.ensure_directories().unwrap();
        assert!(dir.path().join("files").is_dir());
        assert!(dir.path().join("screenshots").is_dir());
    }
}
