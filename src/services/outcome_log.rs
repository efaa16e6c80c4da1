//! 上传结果日志 - 业务能力层
//!
//! 只负责"追加一行结果"，不关心流程

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 结果日志中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRow {
    pub timestamp: String,
    pub patient: String,
    pub dob: String,
    pub file: String,
    pub status: String,
    pub detail: String,
}

impl OutcomeRow {
    pub const UPLOADED: &'static str = "uploaded";
    pub const FAILED: &'static str = "failed";

    pub fn new(
        patient: &str,
        dob: Option<&str>,
        file: &Path,
        status: &str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            patient: patient.to_string(),
            dob: dob.unwrap_or_default().to_string(),
            file: file.to_string_lossy().to_string(),
            status: status.to_string(),
            detail: detail.into(),
        }
    }
}

/// 只追加的结果日志（CSV）
pub struct OutcomeLog {
    path: PathBuf,
}

impl OutcomeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一行，文件为空时先写表头
    pub fn append(&self, row: &OutcomeRow) -> Result<()> {
        debug!("写入结果日志: {} | {}", row.patient, row.status);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建目录: {}", parent.display()))?;
        }

        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("无法打开结果日志: {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    /// 读取全部行（用于审计与测试对账）
    pub fn read_all(&self) -> Result<Vec<OutcomeRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("无法读取结果日志: {}", self.path.display()))?;
        let rows = reader
            .deserialize::<OutcomeRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let log = OutcomeLog::new(dir.path().join("logs").join("uploads_log.csv"));

        log.append(&OutcomeRow::new(
            "Mark Long",
            Some("11/13/1965"),
            Path::new("/files/a.pdf"),
            OutcomeRow::UPLOADED,
            "",
        ))
        .unwrap();
        log.append(&OutcomeRow::new(
            "Jane Roe",
            None,
            Path::new("/files/b.pdf"),
            OutcomeRow::FAILED,
            "patient not found",
        ))
        .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.matches("timestamp,patient").count(), 1);

        let rows = log.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, "uploaded");
        assert_eq!(rows[1].dob, "");
        assert_eq!(rows[1].detail, "patient not found");
    }
}
