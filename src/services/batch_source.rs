//! 批量数据源 - 业务能力层
//!
//! 提供有序的 (患者, 文件) 列表，不检查文件是否存在

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::SourceError;
use crate::models::{PatientIdentity, PatientRecord};

/// 批量数据源
///
/// 返回最多 `max_patients` 条记录，顺序即处理顺序
#[async_trait]
pub trait BatchSource: Send + Sync {
    async fn load(&self, max_patients: usize) -> Result<Vec<PatientRecord>, SourceError>;
}

/// 表格导出的一行
#[derive(Debug, Deserialize)]
struct PatientRow {
    #[serde(alias = "Name", alias = "Patient", alias = "patient_name", alias = "Patient Name")]
    name: String,
    #[serde(default, alias = "DOB", alias = "Dob", alias = "date_of_birth", alias = "Date of Birth")]
    dob: Option<String>,
    #[serde(alias = "File", alias = "pdf", alias = "PDF", alias = "pdf_path", alias = "File Name")]
    file: String,
}

/// 基于 CSV 导出的批量数据源
///
/// 相对文件路径以 `files_dir` 为基准
#[derive(Debug, Clone)]
pub struct CsvBatchSource {
    path: PathBuf,
    files_dir: PathBuf,
}

impl CsvBatchSource {
    pub fn new(path: impl Into<PathBuf>, files_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            files_dir: files_dir.into(),
        }
    }

    /// 同步读取，供 `load` 在阻塞线程中调用
    fn read_records(&self, max_patients: usize) -> Result<Vec<PatientRecord>, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|source| SourceError::ReadFailed {
                path: self.path.clone(),
                source,
            })?;

        let mut records = Vec::new();
        for (row_index, row) in reader.deserialize::<PatientRow>().enumerate() {
            if records.len() >= max_patients {
                break;
            }
            // 表头占第 1 行
            let row_number = row_index + 2;
            let row = row.map_err(|e| SourceError::MalformedRow {
                path: self.path.clone(),
                row: row_number,
                message: e.to_string(),
            })?;

            if row.name.is_empty() {
                warn!("⚠️ 第 {} 行缺少患者姓名，已跳过", row_number);
                continue;
            }
            if row.file.is_empty() {
                return Err(SourceError::MalformedRow {
                    path: self.path.clone(),
                    row: row_number,
                    message: "missing file column".to_string(),
                });
            }

            let dob = row.dob.filter(|d| !d.is_empty());
            let file_path = self.files_dir.join(&row.file);
            records.push(PatientRecord::new(
                PatientIdentity::new(row.name, dob),
                file_path,
                records.len() + 1,
            ));
        }

        info!("✓ 从 {} 读取到 {} 位患者", self.path.display(), records.len());
        Ok(records)
    }
}

#[async_trait]
impl BatchSource for CsvBatchSource {
    async fn load(&self, max_patients: usize) -> Result<Vec<PatientRecord>, SourceError> {
        let source = self.clone();
        match tokio::task::spawn_blocking(move || source.read_records(max_patients)).await {
            Ok(result) => result,
            Err(e) => Err(SourceError::MalformedRow {
                path: self.path.clone(),
                row: 0,
                message: format!("reader task failed: {}", e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_list(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("patients.csv");
        fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_preserves_order_and_truncates() {
        let dir = TempDir::new().unwrap();
        let path = write_list(
            &dir,
            "name,dob,file\nMark Long,11/13/1965,9318873.pdf\nJane Roe,,jr.pdf\nSam Poe,1/2/1970,sp.pdf\n",
        );
        let source = CsvBatchSource::new(&path, dir.path().join("files"));

        let records = source.load(2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), "Mark Long");
        assert_eq!(records[0].date_of_birth(), Some("11/13/1965"));
        assert_eq!(records[0].file_path(), dir.path().join("files").join("9318873.pdf"));
        assert_eq!(records[0].sequence_index(), 1);
        assert_eq!(records[1].name(), "Jane Roe");
        assert_eq!(records[1].date_of_birth(), None);
        assert_eq!(records[1].sequence_index(), 2);
    }

    #[tokio::test]
    async fn test_header_aliases_and_blank_names() {
        let dir = TempDir::new().unwrap();
        let path = write_list(
            &dir,
            "Patient Name,DOB,File Name\n , 1/1/2000, ghost.pdf\nMark Long,11/13/1965,/abs/9318873.pdf\n",
        );
        let source = CsvBatchSource::new(&path, dir.path());

        let records = source.load(5).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_path(), Path::new("/abs/9318873.pdf"));
        assert_eq!(records[0].sequence_index(), 1);
    }

    #[tokio::test]
    async fn test_missing_list_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = CsvBatchSource::new(dir.path().join("absent.csv"), dir.path());
        let err = source.load(2).await.unwrap_err();
        assert!(matches!(err, SourceError::ReadFailed { .. }));
    }
}
