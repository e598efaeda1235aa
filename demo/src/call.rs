//! Request client

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::info;
use turborpc::{Envelope, SessionConfig, SessionOptions, TracingHandler};

use crate::cli::CallArgs;

pub(crate) async fn run(args: CallArgs) -> Result<()> {
    let payload: Value = serde_json::from_str(&args.payload)
        .with_context(|| format!("payload is not valid JSON: {}", args.payload))?;

    let mut config = match &args.config {
        Some(path) => SessionOptions::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?
            .resolve(),
        None => SessionConfig::default(),
    };
    for (key, value) in args.headers {
        config = config.with_global_header(key, value);
    }

    let session = turborpc::connect_websocket("demo", &args.url, Arc::new(TracingHandler), config)?;
    session
        .wait_until_open()
        .await
        .with_context(|| format!("could not connect to {}", args.url))?;

    let requests = (0..args.count.max(1)).map(|_| {
        let session = session.clone();
        let envelope = Envelope::new(args.route.clone(), payload.clone());
        async move { session.request(envelope).await }
    });
    let replies = futures::future::join_all(requests).await;

    let mut failed = 0;
    for reply in replies {
        match reply?.into_envelope() {
            Some(envelope) => println!("{}", envelope.to_json()?),
            None => failed += 1,
        }
    }

    let stats = session.stats();
    info!(
        "Sent {} messages, received {}, {} requests expired",
        stats.messages_sent, stats.messages_received, stats.requests_expired
    );

    session.close();
    session.closed().await;

    if failed > 0 {
        bail!("{failed} of {} requests failed", args.count.max(1));
    }
    Ok(())
}
