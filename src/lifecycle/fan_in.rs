//! Merges every subsystem's error channel into one supervisor-owned channel.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::subsystem::{ErrorReporter, SubsystemError};

/// A runtime error tagged with the subsystem that reported it.
#[derive(Debug)]
pub struct SubsystemFailure {
    pub subsystem: String,
    pub error: SubsystemError,
}

/// Error fan-in multiplexer.
///
/// Each call to [`ErrorFanIn::reporter`] creates a capacity-1 channel for one
/// subsystem and a forwarder task moving its errors into the merged channel.
#[derive(Debug)]
pub struct ErrorFanIn {
    merged_tx: mpsc::Sender<SubsystemFailure>,
    merged_rx: mpsc::Receiver<SubsystemFailure>,
    forwarders: Vec<JoinHandle<()>>,
}

impl ErrorFanIn {
    /// `capacity` is the number of subsystems feeding the fan-in.
    pub fn new(capacity: usize) -> Self {
        let (merged_tx, merged_rx) = mpsc::channel(capacity.max(1));
        Self {
            merged_tx,
            merged_rx,
            forwarders: Vec::new(),
        }
    }

    /// Create the error reporter for `subsystem`. Must be called from within
    /// a Tokio runtime.
    pub fn reporter(&mut self, subsystem: &str) -> ErrorReporter {
        let (reporter, mut rx) = ErrorReporter::channel(subsystem);
        let merged = self.merged_tx.clone();
        let name = subsystem.to_string();

        self.forwarders.push(tokio::spawn(async move {
            while let Some(error) = rx.recv().await {
                let failure = SubsystemFailure {
                    subsystem: name.clone(),
                    error,
                };
                if merged.send(failure).await.is_err() {
                    break;
                }
            }
        }));

        reporter
    }

    /// Wait for the next failure from any subsystem.
    pub async fn recv(&mut self) -> Option<SubsystemFailure> {
        self.merged_rx.recv().await
    }

    /// Stop forwarding.
    pub fn close(&mut self) {
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
        self.merged_rx.close();
    }
}

impl Drop for ErrorFanIn {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failures_tagged_by_subsystem() {
        let mut fan_in = ErrorFanIn::new(3);
        let _service = fan_in.reporter("netplane");
        let ipam = fan_in.reporter("netplane-ipam");

        assert!(ipam.report(SubsystemError::Runtime("pool exhausted".into())));

        let failure = tokio::time::timeout(Duration::from_secs(1), fan_in.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failure.subsystem, "netplane-ipam");
        assert_eq!(failure.error.to_string(), "pool exhausted");
    }

    #[tokio::test]
    async fn test_each_subsystem_reaches_merged_channel() {
        let mut fan_in = ErrorFanIn::new(2);
        let net = fan_in.reporter("netplane-net");
        let ipam = fan_in.reporter("netplane-ipam");

        net.report(SubsystemError::Runtime("a".into()));
        ipam.report(SubsystemError::Runtime("b".into()));

        let mut seen = Vec::new();
        for _ in 0..2 {
            let failure = tokio::time::timeout(Duration::from_secs(1), fan_in.recv())
                .await
                .unwrap()
                .unwrap();
            seen.push(failure.subsystem);
        }
        seen.sort();
        assert_eq!(seen, vec!["netplane-ipam", "netplane-net"]);
    }
}
