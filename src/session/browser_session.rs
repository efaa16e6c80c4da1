//! 基于 chromiumoxide 的会话实现
//!
//! 登录、查找患者、打开病历并上传文档。页面选择器集中在 `selectors` 中

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::Browser;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::browser::{self, LaunchOptions};
use crate::config::{Config, Credentials};
use crate::error::SessionError;
use crate::infrastructure::JsExecutor;
use crate::models::{PatientIdentity, PatientRecord};
use crate::services::{BatchSource, OutcomeLog, OutcomeRow};
use crate::session::{SessionHandle, SubmitStatus};

mod selectors {
    pub const USERNAME: &str = "#id_username";
    pub const PASSWORD: &str = "#id_password";
    pub const LOGIN_SUBMIT: &str = "form button[type='submit']";
    pub const PATIENT_SEARCH: &str = "input[placeholder*='Find Patient']";
    pub const SEARCH_RESULT: &str = ".patient-search-result";
    pub const CHART_HEADER: &str = ".patient-chart-header";
    pub const UPLOAD_BUTTON: &str = "[data-action='upload-document']";
    pub const FILE_INPUT: &str = "input[type='file']";
    pub const SAVE_BUTTON: &str = "[data-action='save-document']";
    pub const UPLOAD_SUCCESS: &str = ".upload-success";
    pub const UPLOAD_ERROR: &str = ".upload-error";
}

/// 页面标题关键字，用于复用已打开的标签页
const PAGE_TITLE_HINT: &str = "Elation";

/// 查找患者结果
#[derive(Debug, Deserialize)]
struct PatientMatch {
    found: bool,
    candidates: usize,
}

/// 浏览器会话
pub struct BrowserSession {
    config: Config,
    /// 未指定患者时的记录来源
    patient_source: Option<Box<dyn BatchSource>>,
    outcome_log: OutcomeLog,
    browser: Option<Browser>,
    executor: Option<JsExecutor>,
    events: Option<JoinHandle<()>>,
}

impl BrowserSession {
    pub fn new(config: Config) -> Self {
        let outcome_log = OutcomeLog::new(config.outcome_log.clone());
        Self {
            config,
            patient_source: None,
            outcome_log,
            browser: None,
            executor: None,
            events: None,
        }
    }

    /// 设置未指定患者时使用的记录来源
    pub fn with_patient_source(mut self, source: Box<dyn BatchSource>) -> Self {
        self.patient_source = Some(source);
        self
    }

    fn executor(&self) -> Result<&JsExecutor> {
        self.executor.as_ref().context("会话尚未初始化")
    }

    /// 单文件模式未指定患者：取记录来源的第一条
    async fn default_patient(&self) -> Result<PatientIdentity> {
        let source = self
            .patient_source
            .as_ref()
            .context("未指定患者，且没有可用的患者列表")?;
        let records = source.load(1).await?;
        let record = records.into_iter().next().context("患者列表为空")?;
        info!("👤 从患者列表读取: {} ({})", record.name(), record.identity().dob_display());
        Ok(record.identity().clone())
    }

    /// 查找并打开患者病历
    async fn open_chart(&self, patient: &PatientIdentity) -> Result<PatientMatch> {
        let executor = self.executor()?;
        executor.fill(selectors::PATIENT_SEARCH, &patient.name).await?;
        executor.wait_for(selectors::SEARCH_RESULT).await?;

        let js_code = format!(
            r#"
            (() => {{
                const name = {}.toLowerCase();
                const dob = {};
                const rows = Array.from(document.querySelectorAll({}));
                const hits = rows.filter(r => {{
                    const text = r.innerText.toLowerCase();
                    return text.includes(name) && (dob === null || text.includes(dob));
                }});
                if (hits.length > 0) {{
                    hits[0].click();
                }}
                return {{ found: hits.length > 0, candidates: rows.length }};
            }})()
            "#,
            serde_json::to_string(&patient.name)?,
            serde_json::to_string(&patient.date_of_birth)?,
            serde_json::to_string(selectors::SEARCH_RESULT)?
        );
        let matched: PatientMatch = executor.eval_as(js_code).await?;
        debug!("患者搜索: {:?}", matched);

        if matched.found {
            executor.wait_for(selectors::CHART_HEADER).await?;
        }
        Ok(matched)
    }

    /// 在已打开的病历中上传文件
    async fn upload(&self, file_path: &Path) -> Result<SubmitStatus> {
        let executor = self.executor()?;
        executor.click(selectors::UPLOAD_BUTTON).await?;
        executor.set_input_file(selectors::FILE_INPUT, file_path).await?;
        executor.click(selectors::SAVE_BUTTON).await?;

        let outcome = executor
            .wait_for_any(&[selectors::UPLOAD_SUCCESS, selectors::UPLOAD_ERROR])
            .await?;
        if outcome == 0 {
            return Ok(SubmitStatus::Uploaded);
        }

        let js_code = format!(
            "(document.querySelector({}) || {{}}).innerText || 'upload rejected'",
            serde_json::to_string(selectors::UPLOAD_ERROR)?
        );
        let reason: String = executor.eval_as(js_code).await?;
        Ok(SubmitStatus::Rejected { reason })
    }

    async fn submit_inner(&self, patient: &PatientIdentity, file_path: &Path) -> Result<SubmitStatus> {
        if !file_path.is_file() {
            return Ok(SubmitStatus::Rejected {
                reason: format!("file missing: {}", file_path.display()),
            });
        }

        let matched = self.open_chart(patient).await?;
        if !matched.found {
            return Ok(SubmitStatus::Rejected {
                reason: format!(
                    "patient not found ({} search results checked)",
                    matched.candidates
                ),
            });
        }

        self.upload(file_path).await
    }

    /// 失败时保存截图，截图本身失败只记录警告
    async fn capture_failure(&self, patient: &PatientIdentity) {
        let Ok(executor) = self.executor() else {
            return;
        };
        let file_name = format!(
            "upload_failed_{}_{}.png",
            patient.name.replace(char::is_whitespace, "_"),
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        let path: PathBuf = self.config.screenshots_dir().join(file_name);
        match executor.screenshot(&path).await {
            Ok(()) => info!("📸 已保存截图: {}", path.display()),
            Err(e) => warn!("⚠️ 保存截图失败: {:#}", e),
        }
    }

    fn record(&self, patient: &PatientIdentity, file_path: &Path, status: &str, detail: &str) {
        let row = OutcomeRow::new(
            &patient.name,
            patient.date_of_birth.as_deref(),
            file_path,
            status,
            detail,
        );
        if let Err(e) = self.outcome_log.append(&row) {
            warn!("⚠️ 写入结果日志失败: {:#}", e);
        }
    }
}

#[async_trait]
impl SessionHandle for BrowserSession {
    async fn initialize(&mut self) -> Result<(), SessionError> {
        self.config.ensure_directories().map_err(|e| {
            SessionError::init(anyhow::Error::new(e).context("无法创建运行目录"))
        })?;

        let timeout = Duration::from_secs(self.config.step_timeout_secs);
        let connected = match self.config.browser_debug_port {
            Some(port) => {
                browser::connect_to_browser_and_page(port, &self.config.target_url, Some(PAGE_TITLE_HINT))
                    .await
            }
            None => {
                let download_dir = self.config.downloads_dir();
                browser::launch_browser(
                    &self.config.target_url,
                    LaunchOptions {
                        headless: self.config.headless,
                        chrome_executable: self.config.chrome_executable.as_deref(),
                        download_dir: &download_dir,
                    },
                )
                .await
            }
        };

        let (browser, page, events) = connected.map_err(SessionError::init)?;
        self.browser = Some(browser);
        self.executor = Some(JsExecutor::new(page, timeout));
        self.events = Some(events);
        info!("✓ 会话初始化完成");
        Ok(())
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<(), SessionError> {
        let executor = self.executor().map_err(SessionError::login)?;

        executor
            .page()
            .goto(credentials.url.as_str())
            .await
            .map_err(|e| SessionError::login(anyhow::Error::new(e).context("打开登录页失败")))?;

        let landing = executor
            .wait_for_any(&[selectors::PATIENT_SEARCH, selectors::USERNAME])
            .await
            .map_err(SessionError::login)?;
        if landing == 0 {
            info!("✓ 已处于登录状态，跳过登录");
            return Ok(());
        }

        info!("🔐 正在登录: {}", credentials.username);
        let attempt = async {
            executor.fill(selectors::USERNAME, &credentials.username).await?;
            executor.fill(selectors::PASSWORD, &credentials.password).await?;
            executor.click(selectors::LOGIN_SUBMIT).await?;
            executor
                .wait_for(selectors::PATIENT_SEARCH)
                .await
                .context("登录后未出现患者搜索框，请检查用户名和密码")
        };
        attempt.await.map_err(SessionError::login)?;

        info!("✓ 登录成功");
        Ok(())
    }

    async fn submit_document(
        &mut self,
        patient: Option<&PatientRecord>,
        file_path: &Path,
    ) -> Result<SubmitStatus, SessionError> {
        let identity = match patient {
            Some(record) => record.identity().clone(),
            None => self.default_patient().await.map_err(SessionError::submit)?,
        };

        match self.submit_inner(&identity, file_path).await {
            Ok(SubmitStatus::Uploaded) => {
                self.record(&identity, file_path, OutcomeRow::UPLOADED, "");
                Ok(SubmitStatus::Uploaded)
            }
            Ok(SubmitStatus::Rejected { reason }) => {
                warn!("⚠️ 上传被拒绝: {}", reason);
                self.capture_failure(&identity).await;
                self.record(&identity, file_path, OutcomeRow::FAILED, &reason);
                Ok(SubmitStatus::Rejected { reason })
            }
            Err(e) => {
                error!("❌ 上传过程中发生错误: {:#}", e);
                self.capture_failure(&identity).await;
                self.record(&identity, file_path, OutcomeRow::FAILED, &format!("{:#}", e));
                Err(SessionError::submit(e))
            }
        }
    }

    async fn close(&mut self) {
        self.executor = None;
        if let Some(mut browser) = self.browser.take() {
            info!("🧹 正在关闭浏览器...");
            // 连接到外部浏览器时只断开，不关闭用户的浏览器
            if self.config.browser_debug_port.is_none() {
                if let Err(e) = browser.close().await {
                    warn!("⚠️ 关闭浏览器失败: {}", e);
                }
                let _ = browser.wait().await;
            }
        }
        if let Some(events) = self.events.take() {
            events.abort();
        }
        info!("✓ 会话已关闭");
    }
}
