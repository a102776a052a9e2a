use rstest::fixture;
use tracing::info;

mod mock_platform;
pub use self::mock_platform::*;

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

#[fixture]
pub async fn platform() -> MockPlatform {
    init_tracing();
    match MockPlatform::start().await {
        Ok(platform) => platform,
        Err(error) => {
            panic!("fail to start mock platform: {error:?}");
        }
    }
}
