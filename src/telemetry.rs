use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 구조화된 로깅을 초기화합니다.
/// JSON 형식의 로그를 출력하며, RUST_LOG 환경 변수로 로그 레벨을 제어합니다.
/// `log` 크레이트 레코드도 같은 subscriber로 전달됩니다.
pub fn init_telemetry() {
    if let Err(e) = try_init_telemetry("info") {
        eprintln!("Telemetry already initialised: {}", e);
    }
}

/// Install the JSON subscriber unless one is already set.
///
/// Tests spawn many servers in one process, so a second call returns an
/// error instead of panicking.
pub fn try_init_telemetry(default_filter: &str) -> Result<(), TryInitError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()
}
