//! 上传处理上下文
//!
//! 封装"我正在处理第几位患者，共几位"这一信息

use std::fmt::Display;

/// 上传处理上下文
#[derive(Debug, Clone, Copy)]
pub struct UploadCtx {
    /// 当前记录在数据源中的序号（从1开始）
    pub sequence_index: usize,

    /// 本次运行的记录总数（仅用于日志显示）
    pub total: usize,
}

impl UploadCtx {
    pub fn new(sequence_index: usize, total: usize) -> Self {
        Self {
            sequence_index,
            total,
        }
    }
}

impl Display for UploadCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[患者 {}/{}]", self.sequence_index, self.total)
    }
}
