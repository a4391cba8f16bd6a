use crate::{InternalError, OrderdeskError, Unit};
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

pub struct Telemetry<T>
where
    T: SubscriberExt + Send + Sync + 'static,
{
    pub subscriber: T,
}

/// Bunyan JSON lines on `sink`. `RUST_LOG` wins over `default_filter` when set.
pub fn get_subscriber<Sink>(
    service: &str,
    default_filter: &str,
    sink: Sink,
) -> Telemetry<impl SubscriberExt + Send + Sync + 'static>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let formatting_layer: BunyanFormattingLayer<Sink> =
        BunyanFormattingLayer::new(service.to_owned(), sink);

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    Telemetry {
        subscriber: Registry::default()
            .with(filter_layer)
            .with(JsonStorageLayer)
            .with(formatting_layer),
    }
}

pub fn init_subscriber(
    telemetry: Telemetry<impl SubscriberExt + Send + Sync + 'static>,
) -> Result<Unit, OrderdeskError> {
    LogTracer::init().map_err(|e| {
        InternalError::configuration_error(&format!("Failed to set logger: {e}"), Some("telemetry"))
    })?;

    set_global_default(telemetry.subscriber).map_err(|e| {
        InternalError::configuration_error(
            &format!("Failed to set subscriber: {e}"),
            Some("telemetry"),
        )
    })
}
