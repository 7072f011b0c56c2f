use std::future::Future;

use anyhow::{Context, Result};
use tokio::signal::unix::{self, SignalKind};
use tokio::sync::oneshot;

pub fn termination_signals() -> [SignalKind; 4] {
    [
        SignalKind::interrupt(),
        SignalKind::terminate(),
        SignalKind::quit(),
        SignalKind::hangup(),
    ]
}

/// Runs `f` until it completes or a termination signal arrives.
pub async fn run_or_terminate<F>(f: F) -> Result<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let stop_fut = any_signal(termination_signals())?;
    let run_fut = tokio::spawn(f);

    tokio::select! {
        res = run_fut => res?,
        signal = stop_fut => {
            let signal = signal?;
            tracing::info!(?signal, "received termination signal");
            Ok(())
        }
    }
}

/// Resolves with the first of `signals` to be delivered.
pub fn any_signal<I>(signals: I) -> Result<oneshot::Receiver<SignalKind>>
where
    I: IntoIterator<Item = SignalKind>,
{
    let mut listeners = Vec::new();
    for kind in signals {
        let listener =
            unix::signal(kind).with_context(|| format!("failed to subscribe to {kind:?}"))?;
        listeners.push((kind, listener));
    }
    anyhow::ensure!(!listeners.is_empty(), "no signals to wait for");

    let any_signal =
        futures_util::future::select_all(listeners.into_iter().map(|(kind, mut listener)| {
            Box::pin(async move {
                listener.recv().await;
                kind
            })
        }));

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (signal, ..) = any_signal.await;
        tx.send(signal).ok();
    });

    Ok(rx)
}
