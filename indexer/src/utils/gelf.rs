//! GELF 1.1 over UDP tracing layer

use std::net::UdpSocket;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Buffer size for the datagram channel
pub const GELF_BUFFER: usize = 4_096;

/// Largest datagram sent without chunking
const MAX_DATAGRAM: usize = 65_000;

/// Collects tracing fields as GELF additional fields
#[derive(Default)]
struct GelfVisitor {
    message: Option<String>,
    fields: JsonMap<String, JsonValue>,
}

impl GelfVisitor {
    fn insert(&mut self, field: &tracing::field::Field, value: JsonValue) {
        if field.name() == "message" {
            self.message = Some(match value {
                JsonValue::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(format!("_{}", field.name()), value);
        }
    }
}

impl tracing::field::Visit for GelfVisitor {
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.insert(field, JsonValue::Bool(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.insert(field, JsonValue::Number(value.into()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.insert(field, JsonValue::Number(value.into()));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        let number = serde_json::Number::from_f64(value)
            .map_or_else(|| JsonValue::String(value.to_string()), JsonValue::Number);
        self.insert(field, number);
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.insert(field, JsonValue::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.insert(field, JsonValue::String(format!("{value:?}")));
    }
}

/// Syslog severity for a tracing level
fn syslog_level(level: &Level) -> u8 {
    match *level {
        Level::ERROR => 3,
        Level::WARN => 4,
        Level::INFO => 6,
        Level::DEBUG | Level::TRACE => 7,
    }
}

/// Sends every event as one GELF datagram from a background thread.
/// Events are dropped when the channel is full.
pub struct GelfLayer {
    host: String,
    facility: String,
    sender: SyncSender<Vec<u8>>,
    dropped: AtomicU64,
}

impl GelfLayer {
    /// Connects a UDP socket to `addr` ("host:port")
    pub fn connect(addr: &str, facility: &str) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(addr)?;

        let (sender, receiver) = mpsc::sync_channel::<Vec<u8>>(GELF_BUFFER);
        std::thread::Builder::new()
            .name("gelf-sender".to_string())
            .spawn(move || {
                for datagram in receiver {
                    // Nothing useful to do when the collector is unreachable
                    let _ = socket.send(&datagram);
                }
            })?;

        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        Ok(Self {
            host,
            facility: facility.to_string(),
            sender,
            dropped: AtomicU64::new(0),
        })
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn encode(&self, event: &Event<'_>) -> JsonValue {
        let metadata = event.metadata();
        let mut visitor = GelfVisitor::default();
        event.record(&mut visitor);

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        let mut record = JsonMap::new();
        record.insert("version".into(), "1.1".into());
        record.insert("host".into(), self.host.clone().into());
        record.insert(
            "short_message".into(),
            visitor
                .message
                .unwrap_or_else(|| metadata.name().to_string())
                .into(),
        );
        record.insert("timestamp".into(), timestamp.into());
        record.insert("level".into(), syslog_level(metadata.level()).into());
        record.insert("_facility".into(), self.facility.clone().into());
        record.insert("_target".into(), metadata.target().into());
        if let Some(file) = metadata.file() {
            record.insert("_file".into(), file.into());
        }
        if let Some(line) = metadata.line() {
            record.insert("_line".into(), line.into());
        }
        for (key, value) in visitor.fields {
            // GELF reserves `_id`
            if key != "_id" {
                record.insert(key, value);
            }
        }
        JsonValue::Object(record)
    }
}

impl<S: Subscriber> Layer<S> for GelfLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Ok(datagram) = serde_json::to_vec(&self.encode(event)) else {
            return;
        };
        if datagram.len() > MAX_DATAGRAM {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        match self.sender.try_send(datagram) {
            Ok(()) => {}
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn sends_events_as_gelf_json() {
        let collector = UdpSocket::bind("127.0.0.1:0").unwrap();
        collector
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let addr = collector.local_addr().unwrap().to_string();

        let layer = GelfLayer::connect(&addr, "tests").unwrap();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(block_level = 42u64, mode = "historical", "cycle failed");
        });

        let mut buf = [0u8; 65_535];
        let len = collector.recv(&mut buf).unwrap();
        let record: JsonValue = serde_json::from_slice(&buf[..len]).unwrap();

        assert_eq!(record["version"], "1.1");
        assert_eq!(record["short_message"], "cycle failed");
        assert_eq!(record["level"], 4);
        assert_eq!(record["_facility"], "tests");
        assert_eq!(record["_block_level"], 42);
        assert_eq!(record["_mode"], "historical");
    }
}
