use stockroom_core::{AuditEvent, AuditSink};

/// Log target used for every audit line.
pub const AUDIT_TARGET: &str = "audit";

/// Emits each audit event as one `info` line on the `audit` target, with the
/// full event as a JSON payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => {
                tracing::info!(target: AUDIT_TARGET, event = event.name(), %payload, "audit");
            }
            Err(e) => {
                tracing::error!(target: AUDIT_TARGET, event = event.name(), error = %e, "audit event not serializable");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use stockroom_core::{ProductId, UserId};

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn audit_lines_carry_event_name_and_payload() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            TracingAuditSink.record(AuditEvent::StockSet {
                product_id: ProductId::new(),
                user_id: UserId::new(),
                old_stock: 3,
                new_stock: 10,
                change: 7,
                notes: Some("restock".to_string()),
            });
        });

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("\"target\":\"audit\""));
        assert!(out.contains("stock_set"));
        assert!(out.contains("restock"));
    }
}
