//! 上传编排器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的控制核心，负责模式选择、会话生命周期和结果统计。
//!
//! ## 状态
//!
//! ```text
//! Idle → Validating → SingleRun → AwaitingManualClose ─┐
//!                   ↘ BatchInit → BatchLoop ───────────┴→ Disposing → Terminal
//! ```
//!
//! - **Validating**：定位所有文件、解析患者描述、检查凭据；任何错误都发生在会话开始前
//! - **SingleRun**：一份文件，成功或失败都保持会话打开，直到中断
//! - **BatchInit**：读取患者列表，逐条检查文件；全部缺失时不打开会话
//! - **BatchLoop**：一次初始化、一次登录，逐条提交，单条失败不影响其他记录，结束后关闭会话
//!
//! 任何时刻收到中断（不打断进行中的提交）都会关闭会话，且只关闭一次

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::{Config, Credentials};
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::{BatchOutcome, Disposition, ExecutionMode, PatientIdentity, PatientRecord};
use crate::orchestrator::interrupt::Interrupt;
use crate::services::{parse_patient_descriptor, BatchSource, FileResolver};
use crate::session::{OwnedSession, SessionHandle};
use crate::utils::logging;
use crate::workflow::{ItemResult, UploadCtx, UploadFlow};

/// 文件输入：`--file`（可重复）或 `--folder`，二选一
#[derive(Debug, Clone)]
pub enum FileInput {
    Files(Vec<String>),
    Folder(String),
}

/// 一次运行的请求
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: FileInput,
    /// 患者描述，如 `"Mark Long 11/13/1965"`
    pub patient: Option<String>,
}

/// 校验后的执行计划
#[derive(Debug)]
pub struct UploadPlan {
    pub mode: ExecutionMode,
    pub files: Vec<PathBuf>,
    pub patient: Option<PatientIdentity>,
    pub credentials: Credentials,
}

/// 编排器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Validating,
    SingleRun,
    BatchInit,
    BatchLoop,
    /// 单文件模式结束后保持会话打开，只有中断能离开
    AwaitingManualClose,
    Disposing,
    Terminal,
}

/// 运行报告
#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: ExecutionMode,
    pub outcome: BatchOutcome,
    pub disposition: Disposition,
    /// 运行是否因中断而结束
    pub interrupted: bool,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.disposition.exit_code()
    }
}

/// 上传编排器
///
/// 独占 SessionHandle，所有提交严格按顺序执行
pub struct UploadOrchestrator<S: SessionHandle, B: BatchSource> {
    config: Config,
    resolver: FileResolver,
    source: B,
    session: OwnedSession<S>,
    interrupt: Interrupt,
    flow: UploadFlow,
    phase: RunPhase,
}

impl<S: SessionHandle, B: BatchSource> UploadOrchestrator<S, B> {
    pub fn new(
        config: Config,
        resolver: FileResolver,
        source: B,
        session: S,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            config,
            resolver,
            source,
            session: OwnedSession::new(session),
            interrupt,
            flow: UploadFlow::new(),
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// 取回会话（测试中检查调用记录）
    pub fn into_session(self) -> S {
        self.session.into_inner()
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!("状态: {:?} → {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// 运行一次完整流程
    pub async fn run(&mut self, request: RunRequest) -> AppResult<RunReport> {
        let plan = self.validate(&request)?;
        logging::log_startup(plan.mode, self.config.headless);

        let result = match plan.mode {
            ExecutionMode::Single => self.run_single(plan).await,
            ExecutionMode::Batch => self.run_batch(plan).await,
        };

        self.enter(RunPhase::Terminal);
        result
    }

    /// 校验阶段：所有错误都在会话开始之前返回
    pub fn validate(&mut self, request: &RunRequest) -> AppResult<UploadPlan> {
        self.enter(RunPhase::Validating);

        let max_patients = self.config.max_patients;
        if max_patients == 0 {
            return Err(ConfigError::InvalidMaxPatients {
                value: max_patients,
            }
            .into());
        }

        let files = match &request.input {
            FileInput::Files(references) => {
                let mut files = Vec::with_capacity(references.len());
                for reference in references {
                    let path = self.resolver.resolve_readable(reference)?;
                    info!("Found file at: {}", path.display());
                    files.push(path);
                }
                files
            }
            FileInput::Folder(folder) => {
                let files = self.resolver.list_folder(
                    folder,
                    &self.config.document_extension,
                    max_patients,
                )?;
                logging::log_folder_listing(folder, &files);
                files
            }
        };

        let mode = ExecutionMode::for_file_count(files.len());
        if mode == ExecutionMode::Single && files.len() != 1 {
            return Err(ConfigError::SingleModeFileCount { count: files.len() }.into());
        }
        if mode == ExecutionMode::Batch && request.patient.is_some() {
            return Err(ConfigError::PatientWithBatch.into());
        }

        let patient = request
            .patient
            .as_deref()
            .map(parse_patient_descriptor)
            .transpose()?;

        let credentials = self.config.credentials()?;

        Ok(UploadPlan {
            mode,
            files,
            patient,
            credentials,
        })
    }

    /// 初始化并登录；失败时关闭会话并返回致命错误
    async fn open_session(&mut self, credentials: &Credentials) -> AppResult<()> {
        if let Err(e) = self.session.initialize().await {
            self.session.close().await;
            return Err(AppError::Session(e));
        }
        if let Err(e) = self.session.login(credentials).await {
            self.session.close().await;
            return Err(AppError::Session(e));
        }
        Ok(())
    }

    /// 收到中断：关闭会话，以当前计数结束
    async fn finish_interrupted(&mut self, mode: ExecutionMode, outcome: BatchOutcome) -> RunReport {
        warn!("⚠️ 收到中断，正在关闭会话...");
        self.session.close().await;
        self.enter(RunPhase::Disposing);
        let disposition = outcome.disposition();
        if mode == ExecutionMode::Batch {
            logging::print_batch_summary(&outcome, disposition, &self.config.outcome_log);
        }
        RunReport {
            mode,
            outcome,
            disposition,
            interrupted: true,
        }
    }

    /// 单文件模式：提交结果（成功或失败）都保持会话打开；初始化或登录失败则关闭会话并返回致命错误
    async fn run_single(&mut self, plan: UploadPlan) -> AppResult<RunReport> {
        self.enter(RunPhase::SingleRun);

        let file = plan
            .files
            .into_iter()
            .next()
            .ok_or(ConfigError::SingleModeFileCount { count: 0 })?;
        let record = plan.patient.map(|identity| PatientRecord::new(identity, file.clone(), 1));
        logging::log_single_input(record.as_ref(), &file);

        let mut outcome = BatchOutcome::default();
        if self.interrupt.is_raised() {
            return Ok(self.finish_interrupted(ExecutionMode::Single, outcome).await);
        }

        self.open_session(&plan.credentials).await?;
        if self.interrupt.is_raised() {
            return Ok(self.finish_interrupted(ExecutionMode::Single, outcome).await);
        }

        let item = self.flow.submit(&mut self.session, record.as_ref(), &file).await;
        match &item {
            ItemResult::Uploaded => {}
            ItemResult::SkippedMissing => {
                warn!("❌ Cannot read file: {} (no longer exists)", file.display())
            }
            ItemResult::Rejected { reason } => warn!("❌ Upload rejected: {}", reason),
            ItemResult::Faulted(e) => warn!("❌ An error occurred: {}", e),
        }
        tally(&mut outcome, &item);

        let disposition = outcome.disposition();
        logging::log_single_result(disposition);

        self.enter(RunPhase::AwaitingManualClose);
        self.interrupt.wait().await;
        self.session.close().await;

        self.enter(RunPhase::Disposing);
        Ok(RunReport {
            mode: ExecutionMode::Single,
            outcome,
            disposition,
            interrupted: true,
        })
    }

    async fn run_batch(&mut self, plan: UploadPlan) -> AppResult<RunReport> {
        self.enter(RunPhase::BatchInit);
        let max_patients = self.config.max_patients;
        info!("👤 Patients: Will be read from {}", self.config.patient_list.display());

        let records = self.source.load(max_patients).await?;
        logging::log_precheck(&records, max_patients);

        let missing = records.iter().filter(|r| !r.file_exists()).count();
        if missing == records.len() {
            return Err(AppError::NoBatchWork {
                total: records.len(),
            });
        }
        if missing > 0 {
            logging::log_missing_warning(missing);
        }

        let mut outcome = BatchOutcome::default();
        if self.interrupt.is_raised() {
            return Ok(self.finish_interrupted(ExecutionMode::Batch, outcome).await);
        }

        self.enter(RunPhase::BatchLoop);
        self.open_session(&plan.credentials).await?;

        let total = records.len();
        for record in &records {
            if self.interrupt.is_raised() {
                return Ok(self.finish_interrupted(ExecutionMode::Batch, outcome).await);
            }

            let ctx = UploadCtx::new(record.sequence_index(), total);
            let item = self.flow.run(&mut self.session, record, &ctx).await;
            tally(&mut outcome, &item);
        }

        self.session.close().await;

        self.enter(RunPhase::Disposing);
        let disposition = outcome.disposition();
        logging::print_batch_summary(&outcome, disposition, &self.config.outcome_log);

        Ok(RunReport {
            mode: ExecutionMode::Batch,
            outcome,
            disposition,
            interrupted: false,
        })
    }
}

/// 把单条结果计入计数；未提交的记录只计入 skipped_missing
fn tally(outcome: &mut BatchOutcome, item: &ItemResult) {
    match item {
        ItemResult::Uploaded => outcome.record_success(),
        _ if item.was_attempted() => outcome.record_failure(),
        _ => outcome.record_skipped(),
    }
}
