//! Web server exposing the batch generation pipeline.
//!
//! Three surfaces:
//! - a streaming generate endpoint whose body is the progress channel
//!   framed as tagged lines
//! - an out-of-band cancellation endpoint (the generate connection is busy
//!   streaming, so cancellation arrives on the side)
//! - a downloadable example spreadsheet

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::export::SheetsPublisher;
use crate::llm::{LlmClient, TextGenerator};
use crate::pipeline::{CancelToken, SchedulerConfig};

/// Shared state for the web server.
///
/// One cancellation token is shared by every request: the control surface
/// sets it, the active run polls it. One token means one active run at a
/// time; a second concurrent run would reset the flag under the first.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn TextGenerator>,
    pub scheduler_config: SchedulerConfig,
    pub publisher: Arc<SheetsPublisher>,
    pub cancel: CancelToken,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let backend = LlmClient::new(settings.llm.clone())?;
        Ok(Self {
            backend: Arc::new(backend),
            scheduler_config: settings.pipeline.clone(),
            publisher: Arc::new(SheetsPublisher::new(settings.export.sheets_webhook.clone())),
            cancel: CancelToken::new(),
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
