use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const QUIET_DIRECTIVES: &str = "site_cms=info,tower_http=warn";
const VERBOSE_DIRECTIVES: &str = "site_cms=debug,tower_http=debug,info";

/// `RUST_LOG` wins over the built-in directives.
fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

pub fn init_cli_logger(verbose: bool) {
    let directives = if verbose {
        VERBOSE_DIRECTIVES
    } else {
        QUIET_DIRECTIVES
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(verbose)
        .with_file(false)
        .with_line_number(false)
        .compact();

    // 重複初始化時（例如測試中）僅忽略
    let _ = tracing_subscriber::registry()
        .with(env_filter(directives))
        .with(fmt_layer)
        .try_init();
}

pub fn init_lambda_logger() {
    tracing_subscriber::registry()
        .with(env_filter(QUIET_DIRECTIVES))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .json(), // CloudWatch 自帶時間戳
        )
        .init();
}
