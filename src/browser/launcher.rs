use std::path::Path;

use anyhow::{Context, Result};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 启动参数
pub struct LaunchOptions<'a> {
    pub headless: bool,
    pub chrome_executable: Option<&'a Path>,
    pub download_dir: &'a Path,
}

/// 启动浏览器并导航到指定 URL
///
/// 返回浏览器、页面和后台事件任务
pub async fn launch_browser(url: &str, options: LaunchOptions<'_>) -> Result<(Browser, Page, JoinHandle<()>)> {
    info!("🚀 启动浏览器 (headless: {})...", options.headless);
    debug!("目标 URL: {}", url);

    let mut builder = BrowserConfig::builder();
    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head().window_size(1400, 1000)
    };
    if let Some(executable) = options.chrome_executable {
        builder = builder.chrome_executable(executable);
    }

    let download_arg = format!("--download-default-directory={}", options.download_dir.display());
    let config = builder
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            download_arg.as_str(),
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            anyhow::anyhow!("配置浏览器失败: {}", e)
        })?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .context("启动浏览器失败")?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let events = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser
        .new_page(url)
        .await
        .with_context(|| format!("创建页面并导航到 {} 失败", url))?;

    info!("✅ 浏览器已导航到: {}", url);
    Ok((browser, page, events))
}
