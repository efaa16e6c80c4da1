//! 会话层
//!
//! `SessionHandle` 是编排器与外部系统之间唯一的接口：
//! 一次运行只有一个实例，独占、不可重入、按顺序调用

pub mod browser_session;

use std::path::Path;

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::SessionError;
use crate::models::PatientRecord;

pub use browser_session::BrowserSession;

/// 单次提交的结果
///
/// `Err(SessionError)` 表示意外故障；`Rejected` 表示外部系统正常地拒绝了这次上传
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    Uploaded,
    Rejected { reason: String },
}

/// 外部会话
#[async_trait]
pub trait SessionHandle: Send {
    /// 建立会话（启动或连接浏览器）
    async fn initialize(&mut self) -> Result<(), SessionError>;

    /// 登录，整个运行期间只调用一次
    async fn login(&mut self, credentials: &Credentials) -> Result<(), SessionError>;

    /// 为患者上传一份文档
    ///
    /// `patient` 为 `None` 时由会话自行决定患者（单文件模式未指定 `--patient`）
    async fn submit_document(
        &mut self,
        patient: Option<&PatientRecord>,
        file_path: &Path,
    ) -> Result<SubmitStatus, SessionError>;

    /// 关闭会话
    async fn close(&mut self);
}

/// 会话所有者
///
/// 包装 `SessionHandle`，保证 `close` 至多调用一次
pub struct OwnedSession<S: SessionHandle> {
    inner: S,
    opened: bool,
    closed: bool,
}

impl<S: SessionHandle> OwnedSession<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            opened: false,
            closed: false,
        }
    }

    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        self.opened = true;
        self.inner.initialize().await
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), SessionError> {
        self.inner.login(credentials).await
    }

    pub async fn submit_document(
        &mut self,
        patient: Option<&PatientRecord>,
        file_path: &Path,
    ) -> Result<SubmitStatus, SessionError> {
        self.inner.submit_document(patient, file_path).await
    }

    /// 关闭会话；未打开或已关闭时什么也不做
    pub async fn close(&mut self) {
        if self.opened && !self.closed {
            self.closed = true;
            self.inner.close().await;
        }
    }

    pub fn is_open(&self) -> bool {
        self.opened && !self.closed
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}
