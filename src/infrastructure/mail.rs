pub mod html;
pub mod proxy;
pub mod relay_api;
pub mod smtp;
pub mod transport;

use crate::{
    errors::AppError,
    settings::{AppConfig, TransportKind},
};

use proxy::ProxyTransport;
use relay_api::RelayApiTransport;
use smtp::SmtpTransport;
use transport::Transport;

/// Builds the transport selected by `config.transport`.
///
/// Missing credentials do not fail here; the transport reports them from
/// `missing_config` and refuses to send.
pub fn build_transport(config: &AppConfig) -> Result<Box<dyn Transport>, AppError> {
    let timeout = config.request_timeout();

    let transport: Box<dyn Transport> = match config.transport {
        TransportKind::Smtp => Box::new(SmtpTransport::new(config.smtp(), timeout)),
        TransportKind::RelayApi => Box::new(RelayApiTransport::new(config.relay_api(), timeout)?),
        TransportKind::Proxy => Box::new(ProxyTransport::new(&config.api_base_url, timeout)?),
    };

    let missing = transport.missing_config();
    if missing.is_empty() {
        tracing::info!(transport = transport.name(), "Mail transport ready");
    } else {
        tracing::warn!(
            transport = transport.name(),
            missing = ?missing,
            "Mail transport is not configured; submissions will fail until it is"
        );
    }

    Ok(transport)
}
