use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
///
/// 除 `Session` 外均发生在会话创建之前，不会产生任何浏览器开销
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（参数冲突、缺少凭据等）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件/文件夹定位错误
    #[error("文件错误: {0}")]
    Resolution(#[from] ResolutionError),
    /// 患者描述解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),
    /// 批量数据源读取错误
    #[error("数据源错误: {0}")]
    Source(#[from] SourceError),
    /// 批量预检：没有任何记录拥有可用文件
    #[error("前 {total} 位患者中没有任何匹配的 PDF 文件")]
    NoBatchWork { total: usize },
    /// 会话生命周期错误（初始化/登录）
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
}

impl AppError {
    /// 给用户的后续操作建议
    pub fn hint(&self) -> &'static str {
        match self {
            AppError::Config(ConfigError::PatientWithBatch) => {
                "For batch processing, patient data will be read from the patient list."
            }
            AppError::Config(ConfigError::MissingCredentials { .. }) => {
                "Set EMR_USERNAME / EMR_PASSWORD / EMR_URL or pass --username / --password / --url."
            }
            AppError::Config(_) => "Check the command line flags and emr_upload.toml.",
            AppError::Resolution(ResolutionError::Unreadable { .. }) => {
                "Please check file permissions."
            }
            AppError::Resolution(_) => "Please provide a valid file path.",
            AppError::Parse(_) => {
                "Expected format: 'First Last MM/DD/YYYY' (e.g., 'Mark Long 11/13/1965')."
            }
            AppError::Source(_) => "Check the patient list export under files/.",
            AppError::NoBatchWork { .. } => {
                "Place the PDFs named in the patient list under files/ and retry."
            }
            AppError::Session(_) => "Check the logs and screenshots for more details.",
        }
    }

    /// 进程退出码，所有致命错误均为 1
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 批量模式下指定了 `--patient`
    #[error("Cannot specify --patient for batch processing")]
    PatientWithBatch,
    /// 单文件模式收到了多个文件
    #[error("Single mode requires exactly one file, got {count}")]
    SingleModeFileCount { count: usize },
    /// `--max-patients` 非法
    #[error("--max-patients must be at least 1, got {value}")]
    InvalidMaxPatients { value: usize },
    /// 缺少登录凭据
    #[error("Missing credential: {field}")]
    MissingCredentials { field: &'static str },
    /// 配置文件解析失败
    #[error("Failed to parse {path}: {message}")]
    FileParseFailed { path: PathBuf, message: String },
}

/// 文件定位错误
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// 所有候选位置都不存在该文件
    #[error("Could not find file: {reference}")]
    NotFound { reference: String },
    /// 文件夹不存在
    #[error("Folder does not exist: {}", path.display())]
    FolderNotFound { path: PathBuf },
    /// 文件夹中没有可接受的文档
    #[error("No {extension} files found in folder: {}", path.display())]
    EmptyFolder { path: PathBuf, extension: String },
    /// 文件存在但无法读取
    #[error("Cannot read file: {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 患者描述解析错误
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Could not extract patient name from '{input}'")]
    EmptyName { input: String },
}

/// 批量数据源错误
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Cannot read patient list {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Malformed row {row} in {}: {message}", path.display())]
    MalformedRow {
        path: PathBuf,
        row: usize,
        message: String,
    },
}

/// 会话错误
///
/// `Init` 与 `Login` 是致命错误；`Submit` 只影响单条记录
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Bot initialization failed: {0}")]
    Init(String),
    #[error("Login failed: {0}")]
    Login(String),
    #[error("Upload failed: {0}")]
    Submit(String),
}

impl SessionError {
    /// 从 anyhow 错误链构造，保留完整上下文
    pub fn init(err: anyhow::Error) -> Self {
        SessionError::Init(format!("{:#}", err))
    }

    pub fn login(err: anyhow::Error) -> Self {
        SessionError::Login(format!("{:#}", err))
    }

    pub fn submit(err: anyhow::Error) -> Self {
        SessionError::Submit(format!("{:#}", err))
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
