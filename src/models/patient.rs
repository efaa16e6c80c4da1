//! 患者记录模型

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// 患者身份（姓名 + 可选出生日期）
///
/// 由 `--patient` 参数解析得到，或由批量数据源的一行构造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientIdentity {
    pub name: String,
    pub date_of_birth: Option<String>,
}

impl PatientIdentity {
    pub fn new(name: impl Into<String>, date_of_birth: Option<String>) -> Self {
        Self {
            name: name.into(),
            date_of_birth,
        }
    }

    /// 出生日期的显示文本
    pub fn dob_display(&self) -> &str {
        self.date_of_birth.as_deref().unwrap_or("Not provided")
    }
}

/// 一条待上传的患者记录
///
/// 构造后不可变，由编排器消费一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientRecord {
    identity: PatientIdentity,
    file_path: PathBuf,
    sequence_index: usize,
}

impl PatientRecord {
    /// 创建新的患者记录
    ///
    /// `sequence_index` 从 1 开始，表示记录在数据源中的顺序
    pub fn new(identity: PatientIdentity, file_path: impl Into<PathBuf>, sequence_index: usize) -> Self {
        Self {
            identity,
            file_path: file_path.into(),
            sequence_index,
        }
    }

    pub fn identity(&self) -> &PatientIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn date_of_birth(&self) -> Option<&str> {
        self.identity.date_of_birth.as_deref()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    /// 文件当前是否存在（每次调用都重新检查磁盘）
    pub fn file_exists(&self) -> bool {
        self.file_path.is_file()
    }

    /// 文件名（用于日志显示）
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

impl Display for PatientRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[患者#{} {} ({})]",
            self.sequence_index,
            self.identity.name,
            self.identity.dob_display()
        )
    }
}
