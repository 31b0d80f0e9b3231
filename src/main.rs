use std::future::IntoFuture;

use tokio::net::TcpListener;
use tracing::info;

use wordwave::config;
use wordwave::http::routes::{self, AppState};
use wordwave::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let state = AppState::new();
    let page = routes::page_router(state.clone());
    let realtime = routes::realtime_router(state);

    let page_addr = config::page_addr();
    let realtime_addr = config::realtime_addr();
    let page_listener = TcpListener::bind(page_addr).await?;
    let realtime_listener = TcpListener::bind(realtime_addr).await?;
    info!(%page_addr, "page server listening");
    info!(%realtime_addr, "realtime server listening");

    tokio::try_join!(
        axum::serve(page_listener, page).into_future(),
        axum::serve(realtime_listener, realtime).into_future(),
    )?;
    Ok(())
}
