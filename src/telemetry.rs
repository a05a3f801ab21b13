use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 구조화된 로깅을 초기화합니다.
/// JSON 형식의 로그를 stdout으로 출력하며, RUST_LOG 환경 변수가 `default_filter`보다 우선합니다.
/// `log` 매크로로 남긴 레코드도 같은 subscriber로 전달됩니다.
///
/// 이미 전역 subscriber가 설치되어 있으면 `false`를 반환합니다 (테스트에서 여러 번 호출되는 경우).
pub fn init_telemetry(default_filter: &str) -> bool {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()
        .is_ok()
}
