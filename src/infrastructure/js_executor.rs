//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS / 操作元素"的能力

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(300);

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() / 等待 / 填写 / 点击 / 上传文件能力
/// - 不认识患者，不处理业务流程
pub struct JsExecutor {
    page: Page,
    timeout: Duration,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page, timeout: Duration) -> Self {
        Self { page, timeout }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 元素当前是否存在
    pub async fn exists(&self, selector: &str) -> Result<bool> {
        let js_code = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        self.eval_as(js_code).await
    }

    /// 等待元素出现，超时报错
    pub async fn wait_for(&self, selector: &str) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if self.exists(selector).await.unwrap_or(false) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                anyhow::bail!("等待元素超时 ({}s): {}", self.timeout.as_secs(), selector);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 等待任意一个元素出现，返回其下标
    pub async fn wait_for_any(&self, selectors: &[&str]) -> Result<usize> {
        let deadline = Instant::now() + self.timeout;
        loop {
            for (index, selector) in selectors.iter().enumerate() {
                if self.exists(selector).await.unwrap_or(false) {
                    return Ok(index);
                }
            }
            if Instant::now() >= deadline {
                anyhow::bail!("等待元素超时 ({}s): {:?}", self.timeout.as_secs(), selectors);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 填写输入框并触发 input / change 事件
    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.wait_for(selector).await?;
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                el.focus();
                el.value = {};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            serde_json::to_string(selector)?,
            serde_json::to_string(value)?
        );
        self.eval(js_code).await?;
        Ok(())
    }

    /// 点击元素
    pub async fn click(&self, selector: &str) -> Result<()> {
        self.wait_for(selector).await?;
        debug!("点击: {}", selector);
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到元素: {}", selector))?
            .click()
            .await?;
        Ok(())
    }

    /// 给 `<input type=file>` 设置文件
    pub async fn set_input_file(&self, selector: &str, file_path: &Path) -> Result<()> {
        self.wait_for(selector).await?;
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到文件输入框: {}", selector))?;

        let mut params = SetFileInputFilesParams::new(vec![file_path.to_string_lossy().to_string()]);
        params.backend_node_id = Some(element.backend_node_id);
        self.page.execute(params).await?;
        Ok(())
    }

    /// 保存整页截图
    pub async fn screenshot(&self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page
            .save_screenshot(params, path)
            .await
            .with_context(|| format!("保存截图失败: {}", path.display()))?;
        Ok(())
    }
}
