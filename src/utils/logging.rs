//! 日志工具模块
//!
//! 初始化 tracing，并提供运行横幅与汇总输出的辅助函数

use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::models::{BatchOutcome, Disposition, ExecutionMode, PatientRecord};

/// 初始化日志
///
/// `RUST_LOG` 优先；否则 `--debug` 时为 debug 级别
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "emr_upload_bot=debug,info"
    } else {
        "emr_upload_bot=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .try_init();
}

fn divider() {
    info!("{}", "-".repeat(50));
}

/// 记录程序启动信息
pub fn log_startup(mode: ExecutionMode, headless: bool) {
    info!("🤖 Starting EMR Upload Bot ({})...", mode);
    info!("🖥️ Headless mode: {}", headless);
}

/// 记录单文件模式的输入
pub fn log_single_input(patient: Option<&PatientRecord>, file: &Path) {
    match patient {
        Some(record) => {
            info!("👤 Patient: {}", record.name());
            info!("📅 DOB: {}", record.identity().dob_display());
        }
        None => {
            info!("👤 Patient: Will be read from patient list");
            info!("📅 DOB: Will be read from patient list");
        }
    }
    info!("📁 File: {}", file.display());
    divider();
}

/// 记录文件夹模式找到的文件
pub fn log_folder_listing(folder: &str, files: &[std::path::PathBuf]) {
    info!("Found {} document(s) in folder: {}", files.len(), folder);
    for (i, file) in files.iter().enumerate() {
        info!(
            "  {}. {}",
            i + 1,
            file.file_name().unwrap_or_default().to_string_lossy()
        );
    }
}

/// 记录批量预检结果
pub fn log_precheck(records: &[PatientRecord], max_patients: usize) {
    info!("👥 Max patients: {}", max_patients);
    for record in records {
        let status = if record.file_exists() {
            "(will process)"
        } else {
            "(MISSING FILE - will skip)"
        };
        info!("  {}. {} {}", record.sequence_index(), record.file_name(), status);
    }
}

/// 部分记录缺少文件的警告
pub fn log_missing_warning(missing: usize) {
    warn!(
        "⚠️ Warning: {} patient(s) do not have a matching PDF and will be skipped.",
        missing
    );
    divider();
}

/// 单文件模式的结果与等待提示
pub fn log_single_result(disposition: Disposition) {
    if disposition.is_success() {
        info!("✅ Workflow completed successfully!");
        info!("The file has been uploaded to the patient's chart.");
        info!("🔄 Browser will remain open. Press Ctrl+C to close when finished.");
    } else {
        warn!("❌ Workflow failed!");
        warn!("Check the logs and screenshots for more details.");
        warn!("🔄 Browser will remain open for manual inspection. Press Ctrl+C to close when finished.");
    }
}

/// 打印批量汇总
pub fn print_batch_summary(outcome: &BatchOutcome, disposition: Disposition, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 BATCH SUMMARY");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ Successful uploads: {}", outcome.succeeded);
    info!("❌ Failed uploads: {}", outcome.failed);
    info!("📊 Total processed: {}", outcome.attempted);
    if outcome.skipped_missing > 0 {
        info!("⏭️ Skipped (missing file): {}", outcome.skipped_missing);
    }
    divider();
    match disposition {
        Disposition::Complete => info!("✅ Batch workflow completed!"),
        Disposition::Partial => warn!(
            "⚠️ Batch workflow completed with failures ({}/{} uploaded)",
            outcome.succeeded,
            outcome.attempted + outcome.skipped_missing
        ),
        Disposition::Failed => warn!("❌ Batch workflow failed or had no successful uploads!"),
    }
    info!(
        "Check the logs and {} for details.",
        log_file_path.display()
    );
}
