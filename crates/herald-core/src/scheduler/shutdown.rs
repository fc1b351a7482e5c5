use tokio::sync::watch;

/// Process-wide cancellation signal; `true` means shut down.
pub type ShutdownSignal = watch::Receiver<bool>;

/// Create the sender/receiver pair shared by every loop and task
pub fn shutdown_channel() -> (watch::Sender<bool>, ShutdownSignal) {
    watch::channel(false)
}

/// Whether shutdown has already been requested
pub fn is_shutdown(signal: &ShutdownSignal) -> bool {
    *signal.borrow()
}

/// Resolve once shutdown is requested. A dropped sender counts as a shutdown request.
pub async fn wait_for_shutdown(signal: &mut ShutdownSignal) {
    let _ = signal.wait_for(|stop| *stop).await;
}
