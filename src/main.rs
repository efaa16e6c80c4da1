use clap::Parser;
use emr_upload_bot::cli::Cli;
use emr_upload_bot::services::{CsvBatchSource, FileResolver, SearchRoots};
use emr_upload_bot::utils::logging;
use emr_upload_bot::{BrowserSession, Config, Interrupt, UploadOrchestrator};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 加载配置
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    cli.apply_to(&mut config);

    // 初始化日志
    logging::init(config.verbose_logging);
    tracing::debug!("项目根目录: {}", config.project_root.display());

    let source = CsvBatchSource::new(config.patient_list.clone(), config.files_dir());
    let session = BrowserSession::new(config.clone()).with_patient_source(Box::new(source.clone()));
    let resolver = FileResolver::new(SearchRoots::from_environment());

    let mut orchestrator =
        UploadOrchestrator::new(config, resolver, source, session, Interrupt::ctrl_c());

    let exit_code = match orchestrator.run(cli.run_request()).await {
        Ok(report) => report.exit_code(),
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ Error: {}", e);
            eprintln!("💡 {}", e.hint());
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}
