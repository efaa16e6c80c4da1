//! 文件定位服务 - 业务能力层
//!
//! 只负责"找到用户说的那个文件"，不读取文件内容

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ResolutionError;

/// 候选目录的根
///
/// 显式持有当前目录与用户主目录，测试时可指向临时目录
#[derive(Debug, Clone)]
pub struct SearchRoots {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
}

impl SearchRoots {
    pub fn new(cwd: impl Into<PathBuf>, home: Option<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home,
        }
    }

    /// 从当前进程环境构造
    pub fn from_environment() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(cwd, dirs::home_dir())
    }
}

/// 文件定位器
///
/// 候选顺序固定：原样 → 当前目录 → Documents → OneDrive/Documents
/// → Desktop → OneDrive/Desktop。桌面目录只作为兜底
pub struct FileResolver {
    roots: SearchRoots,
}

impl FileResolver {
    pub fn new(roots: SearchRoots) -> Self {
        Self { roots }
    }

    /// 按优先级列出某个引用的全部候选路径（已去重）
    pub fn candidates(&self, reference: &str) -> Vec<PathBuf> {
        let given = Path::new(reference);
        let mut candidates = vec![self.absolutize(given), self.roots.cwd.join(given)];

        if let Some(home) = &self.roots.home {
            for base in [
                home.join("Documents"),
                home.join("OneDrive").join("Documents"),
                home.join("Desktop"),
                home.join("OneDrive").join("Desktop"),
            ] {
                candidates.push(base.join(given));
            }
        }

        let mut unique: Vec<PathBuf> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }
        unique
    }

    /// 定位文件，返回第一个存在的绝对路径
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, ResolutionError> {
        if reference.trim().is_empty() {
            return Err(ResolutionError::NotFound {
                reference: reference.to_string(),
            });
        }

        for candidate in self.candidates(reference) {
            debug!("检查候选路径: {}", candidate.display());
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(ResolutionError::NotFound {
            reference: reference.to_string(),
        })
    }

    /// 定位并确认文件可读
    pub fn resolve_readable(&self, reference: &str) -> Result<PathBuf, ResolutionError> {
        let path = self.resolve(reference)?;
        File::open(&path).map_err(|source| ResolutionError::Unreadable {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// 文件夹模式：列出直接子文件中扩展名匹配的文档
    ///
    /// 按文件名字典序排序，截断到 `max_count`
    pub fn list_folder(
        &self,
        folder: &str,
        extension: &str,
        max_count: usize,
    ) -> Result<Vec<PathBuf>, ResolutionError> {
        let folder_path = self.absolutize(Path::new(folder));
        if !folder_path.is_dir() {
            return Err(ResolutionError::FolderNotFound { path: folder_path });
        }

        let entries = std::fs::read_dir(&folder_path).map_err(|source| {
            ResolutionError::Unreadable {
                path: folder_path.clone(),
                source,
            }
        })?;

        let mut documents: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_extension(path, extension))
            .collect();

        if documents.is_empty() {
            return Err(ResolutionError::EmptyFolder {
                path: folder_path,
                extension: extension.to_string(),
            });
        }

        documents.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        documents.truncate(max_count);
        Ok(documents)
    }

    fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.roots.cwd.join(path)
        }
    }
}

/// 扩展名是否匹配（不区分大小写）
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension.trim_start_matches('.')))
        .unwrap_or(false)
}
