//! 单条上传流程 - 流程层
//!
//! 核心职责：定义"一位患者一份文档"的处理流程
//!
//! 流程顺序：
//! 1. 重新检查文件是否存在（列表与执行之间文件可能被移动）
//! 2. 通过共享会话提交
//! 3. 把提交结果转换为 `ItemResult`，错误不向外传播

use std::path::Path;

use tracing::{error, info, warn};

use crate::error::SessionError;
use crate::models::PatientRecord;
use crate::session::{OwnedSession, SessionHandle, SubmitStatus};
use crate::workflow::upload_ctx::UploadCtx;

/// 单条记录的处理结果
#[derive(Debug)]
pub enum ItemResult {
    /// 上传成功
    Uploaded,
    /// 外部系统拒绝（预期内的失败）
    Rejected { reason: String },
    /// 提交过程中出现意外故障
    Faulted(SessionError),
    /// 文件已不存在，未提交
    SkippedMissing,
}

impl ItemResult {
    /// 是否计入 attempted
    pub fn was_attempted(&self) -> bool {
        !matches!(self, ItemResult::SkippedMissing)
    }
}

/// 单条上传流程
///
/// - 不持有会话，由编排层借给它
/// - 一次只处理一条记录
pub struct UploadFlow;

impl UploadFlow {
    pub fn new() -> Self {
        Self
    }

    /// 处理批量中的一条记录
    pub async fn run<S: SessionHandle>(
        &self,
        session: &mut OwnedSession<S>,
        record: &PatientRecord,
        ctx: &UploadCtx,
    ) -> ItemResult {
        if !record.file_exists() {
            warn!(
                "{} 跳过 {} (文件缺失: {})",
                ctx,
                record.name(),
                record.file_path().display()
            );
            return ItemResult::SkippedMissing;
        }

        log_item_start(ctx, record);
        let result = self.submit(session, Some(record), record.file_path()).await;
        match &result {
            ItemResult::Uploaded => info!("{} ✅ 已为 {} 上传文件", ctx, record.name()),
            ItemResult::Rejected { reason } => {
                error!("{} ❌ 为 {} 上传失败: {}", ctx, record.name(), reason)
            }
            ItemResult::Faulted(e) => error!("{} ❌ 处理 {} 时出错: {}", ctx, record.name(), e),
            ItemResult::SkippedMissing => {}
        }
        result
    }

    /// 提交一份文档，`patient` 为空时由会话决定患者
    pub async fn submit<S: SessionHandle>(
        &self,
        session: &mut OwnedSession<S>,
        patient: Option<&PatientRecord>,
        file_path: &Path,
    ) -> ItemResult {
        if !file_path.is_file() {
            return ItemResult::SkippedMissing;
        }

        match session.submit_document(patient, file_path).await {
            Ok(SubmitStatus::Uploaded) => ItemResult::Uploaded,
            Ok(SubmitStatus::Rejected { reason }) => ItemResult::Rejected { reason },
            Err(e) => ItemResult::Faulted(e),
        }
    }
}

impl Default for UploadFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn log_item_start(ctx: &UploadCtx, record: &PatientRecord) {
    info!("\n{}", "=".repeat(60));
    info!("📋 PROCESSING PATIENT {}/{}", ctx.sequence_index, ctx.total);
    info!("👤 Patient: {}", record.name());
    info!("📅 DOB: {}", record.identity().dob_display());
    info!("📁 File: {}", record.file_name());
    info!("{}", "=".repeat(60));
}
