//! 命令行参数

use clap::{ArgGroup, Parser};

use crate::config::Config;
use crate::orchestrator::{FileInput, RunRequest};

#[derive(Parser, Debug)]
#[command(name = "emr-upload-bot")]
#[command(about = "EMR upload bot - log in, find patients and upload documents to their charts")]
#[command(group(ArgGroup::new("input").required(true).args(["file", "folder"])))]
pub struct Cli {
    /// Patient name and DOB (e.g., 'Mark Long 11/13/1965'). If not provided, data is read from the patient list
    #[arg(short, long)]
    pub patient: Option<String>,

    /// File to upload. Repeat for batch processing: --file a.pdf --file b.pdf
    #[arg(short, long)]
    pub file: Vec<String>,

    /// Folder containing PDF files to upload. Up to --max-patients files are processed
    #[arg(long)]
    pub folder: Option<String>,

    /// EMR username (overrides EMR_USERNAME)
    #[arg(short, long)]
    pub username: Option<String>,

    /// EMR password (overrides EMR_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// EMR URL (overrides EMR_URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Run browser in headless mode (no GUI)
    #[arg(long)]
    pub headless: bool,

    /// Enable debug mode with verbose logging
    #[arg(long)]
    pub debug: bool,

    /// Maximum number of patients to process in batch mode [default: 2]
    #[arg(long)]
    pub max_patients: Option<usize>,
}

impl Cli {
    /// 命令行参数覆盖配置
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if let Some(url) = &self.url {
            config.target_url = url.clone();
        }
        config.headless = self.headless;
        config.verbose_logging = config.verbose_logging || self.debug;
        if let Some(max_patients) = self.max_patients {
            config.max_patients = max_patients;
        }
    }

    pub fn run_request(&self) -> RunRequest {
        let input = match &self.folder {
            Some(folder) => FileInput::Folder(folder.clone()),
            None => FileInput::Files(self.file.clone()),
        };
        RunRequest {
            input,
            patient: self.patient.clone(),
        }
    }
}
