//! 终止信号监听
//!
//! 主机挂断或管理员终止时进程会收到 SIGHUP / SIGTERM / SIGINT

/// 等待任一终止信号，返回信号名
///
/// 无法注册监听时只记录警告，返回的 future 永不完成
#[cfg(unix)]
pub async fn wait_for_shutdown() -> &'static str {
    let (mut interrupt, mut terminate, mut hangup) = match register_unix() {
        Ok(streams) => streams,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install signal handlers");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = hangup.recv() => "SIGHUP",
    }
}

#[cfg(unix)]
fn register_unix() -> std::io::Result<(
    tokio::signal::unix::Signal,
    tokio::signal::unix::Signal,
    tokio::signal::unix::Signal,
)> {
    use tokio::signal::unix::{signal, SignalKind};

    Ok((
        signal(SignalKind::interrupt())?,
        signal(SignalKind::terminate())?,
        signal(SignalKind::hangup())?,
    ))
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install ctrl-c handler");
        return std::future::pending().await;
    }
    "ctrl-c"
}
