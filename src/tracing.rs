//! Logging and OpenTelemetry setup
//!
//! Logs go to stderr so stdout stays free for the discovery result. Spans
//! can additionally be exported over OTLP when an endpoint is configured:
//!
//! ```text
//! vendor-tracepoints → stderr (text or JSON)
//!                    → OTLP (gRPC) → OTel Collector   (optional)
//! ```

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "info,vendor_tracepoints=debug";

/// Logging options
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
    /// OTLP collector endpoint; spans are only exported when set
    pub otlp_endpoint: Option<String>,
}

/// Initialize the global subscriber.
///
/// OTLP export uses the Tokio batch exporter, so call this from inside a
/// Tokio runtime when `otlp_endpoint` is set.
pub fn init_tracing(
    service_name: &str,
    options: &LogOptions,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let otel_layer = match &options.otlp_endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint);

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(exporter)
                .with_trace_config(sdktrace::Config::default().with_resource(Resource::new(
                    vec![
                        KeyValue::new("service.name", service_name.to_string()),
                        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                    ],
                )))
                .install_batch(runtime::Tokio)?;

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    let (text_layer, json_layer) = if options.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true);
        (None, Some(layer))
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false);
        (Some(layer), None)
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .init();

    tracing::debug!(
        service = service_name,
        otlp = options.otlp_endpoint.as_deref().unwrap_or("disabled"),
        "Tracing initialized"
    );

    Ok(())
}

/// Flush pending spans to the collector, if OTLP export was enabled.
pub fn shutdown_tracing() {
    opentelemetry::global::shutdown_tracer_provider();
}
