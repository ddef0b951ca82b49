use tokio::sync::watch;

/// Process-wide stop flag. Relay runs poll it between sends; the collector
/// and the scheduler stop when it fires.
#[derive(Clone)]
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> (Self, ShutdownListener) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, ShutdownListener { receiver })
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

impl ShutdownListener {
    pub async fn notified(&mut self) {
        if *self.receiver.borrow() {
            return;
        }
        if self.receiver.changed().await.is_err() {
            // Sender dropped without triggering: never resolve.
            std::future::pending::<()>().await;
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }
}

pub fn install_signal_handlers(shutdown: Shutdown) {
    let ctrlc = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: "lifecycle", "CTRL+C received");
            ctrlc.trigger();
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let term = shutdown.clone();
        tokio::spawn(async move {
            if let Ok(mut sig) = signal(SignalKind::terminate()) {
                sig.recv().await;
                tracing::info!(target: "lifecycle", "SIGTERM received");
                term.trigger();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn late_subscribers_see_trigger() {
        let (shutdown, first) = Shutdown::new();
        assert!(!first.is_triggered());
        shutdown.trigger();
        let mut late = shutdown.subscribe();
        assert!(first.is_triggered());
        assert!(late.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), late.notified())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_sender_does_not_fire() {
        let (shutdown, mut listener) = Shutdown::new();
        drop(shutdown);
        let fired = tokio::time::timeout(Duration::from_millis(50), listener.notified()).await;
        assert!(fired.is_err());
        assert!(!listener.is_triggered());
    }
}
