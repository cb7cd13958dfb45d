use std::path::PathBuf;

use autopub::RunOptions;
use tokio_util::sync::CancellationToken;

// 使用 mimalloc 作为全局内存分配器
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn print_usage_and_exit() -> ! {
    eprintln!("Usage: autopub <topics.toml> [--dry-run]");
    std::process::exit(2);
}

fn parse_args() -> RunOptions {
    let mut topics_path = None;
    let mut dry_run = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "-h" | "--help" => print_usage_and_exit(),
            flag if flag.starts_with('-') => {
                eprintln!("Unknown option: {flag}");
                print_usage_and_exit();
            }
            path if topics_path.is_none() => topics_path = Some(PathBuf::from(path)),
            _ => {
                eprintln!("Too many arguments provided.");
                print_usage_and_exit();
            }
        }
    }

    let topics_path = topics_path.unwrap_or_else(|| {
        eprintln!("Missing <topics.toml>");
        print_usage_and_exit();
    });

    RunOptions {
        topics_path,
        dry_run,
    }
}

/// 等待中断信号：第一次取消批次，第二次返回 `true` 表示需要立即退出
///
/// 信号监听失败时返回 `false`，批次照常运行。
async fn escalate<F, Fut>(mut next_signal: F, cancel: &CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_signal().await.is_err() {
        return false;
    }
    tracing::warn!("interrupt received, finishing current topic (press Ctrl-C again to abort)");
    cancel.cancel();

    next_signal().await.is_ok()
}

async fn watch_interrupts(cancel: CancellationToken) {
    if escalate(tokio::signal::ctrl_c, &cancel).await {
        tracing::error!("second interrupt received, aborting");
        std::process::exit(130);
    }
}

#[tokio::main]
async fn main() {
    let options = parse_args();
    autopub::init_tracing();

    let cancel = CancellationToken::new();
    tokio::spawn(watch_interrupts(cancel.clone()));

    match autopub::run(options, cancel).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(%e, "failed to serialize run report"),
        },
        Err(e) => {
            tracing::error!(error = %e, kind = ?e.kind(), "batch aborted before processing any topic");
            std::process::exit(1);
        }
    }
}
