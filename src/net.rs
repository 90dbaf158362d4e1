//! 网络公共工具
//!
//! 图片抓取与文档下载共用的 HTTP 辅助函数：客户端构建、日志脱敏、状态码文案。

use std::time::Duration;

/// 浏览器风格 UA，部分文档镜像会拒绝默认 UA。
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// 构建带连接超时与重定向上限的客户端。
///
/// `total_timeout` 为 `None` 时不设整体超时（大文件下载依赖分块超时控制）。
pub(crate) fn build_client(
    connect_timeout: Duration,
    total_timeout: Option<Duration>,
    max_redirects: usize,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .redirect(reqwest::redirect::Policy::limited(max_redirects))
        .user_agent(USER_AGENT);

    if let Some(timeout) = total_timeout {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

/// 去掉 query 与 fragment 后再写日志，避免泄露签名参数。
pub fn redact_url_for_log(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "<invalid-url>".to_string();
    };

    let host = parsed.host_str().unwrap_or("<unknown-host>");
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
    let path = parsed.path();

    format!("{}://{}{}{}", parsed.scheme(), host, port, path)
}

/// 常见 HTTP 状态码本地化文案。
pub(crate) fn status_message(code: u16) -> &'static str {
    match code {
        404 => "未找到",
        403 => "访问被拒绝",
        500..=599 => "服务器错误",
        _ => "请求失败",
    }
}

/// 从响应头读取 Content-Length。
pub(crate) fn content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|cl| cl.to_str().ok())
        .and_then(|cl| cl.trim().parse::<u64>().ok())
}
