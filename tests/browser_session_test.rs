use emr_upload_bot::browser::connect_to_browser_and_page;
use emr_upload_bot::utils::logging;
use emr_upload_bot::{BrowserSession, Config, SessionHandle};

/// 需要一个开启了调试端口的浏览器：
///
/// ```bash
/// BROWSER_DEBUG_PORT=9222 cargo test --test browser_session_test -- --ignored
/// ```
#[tokio::test]
#[ignore]
async fn test_browser_connection() {
    logging::init(true);

    let config = Config::from_env().expect("加载配置失败");
    let port = config.browser_debug_port.expect("需要设置 BROWSER_DEBUG_PORT");

    let result = connect_to_browser_and_page(port, &config.target_url, None).await;
    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

/// 需要真实账号：EMR_USERNAME / EMR_PASSWORD / EMR_URL
#[tokio::test]
#[ignore]
async fn test_login_once() {
    logging::init(true);

    let config = Config::from_env().expect("加载配置失败");
    let credentials = config.credentials().expect("缺少登录凭据");

    let mut session = BrowserSession::new(config);
    session.initialize().await.expect("会话初始化失败");
    let login = session.login(&credentials).await;
    session.close().await;

    assert!(login.is_ok(), "登录失败: {:?}", login.err());
}
