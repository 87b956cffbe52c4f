use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use adshield_core_types::NodeId;
use adshield_host_dom::HostTree;

use crate::model::{ScanConfig, ScanSink};

/// Watches host mutation batches and drives the sink on a debounced
/// cadence. One scheduler per page; `start` replaces any running task.
pub struct ScanScheduler {
    host: Arc<dyn HostTree>,
    sink: Arc<dyn ScanSink>,
    config: ScanConfig,
    task: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl ScanScheduler {
    pub fn new(host: Arc<dyn HostTree>, sink: Arc<dyn ScanSink>, config: ScanConfig) -> Self {
        Self {
            host,
            sink,
            config,
            task: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Sweep the whole tree once, as on page load.
    pub async fn scan_now(&self) {
        let mut pending: Vec<NodeId> = Vec::new();
        for tag in &self.config.interesting_tags {
            let nodes = adshield_host_dom::ports::query_or_empty(
                self.host.as_ref(),
                &adshield_core_types::Selector::new(tag.clone()),
            )
            .await;
            pending.extend(nodes);
        }
        flush(&*self.host, &*self.sink, &self.config, pending, &mut None).await;
    }

    /// Start the background loop over mutation batches.
    pub fn start(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
        }

        let host = Arc::clone(&self.host);
        let sink = Arc::clone(&self.sink);
        let config = self.config.clone();
        let shutdown = self.shutdown.clone();
        let mut rx = self.host.subscribe_mutations();

        self.task = Some(tokio::spawn(async move {
            debug!("scan loop started");
            let mut pending: Vec<NodeId> = Vec::new();
            let mut deadline: Option<Instant> = None;
            let mut last_rules: Option<Instant> = None;
            loop {
                select! {
                    _ = shutdown.cancelled() => {
                        debug!("scan loop shutting down");
                        break;
                    }
                    batch = rx.recv() => {
                        match batch {
                            Ok(batch) => {
                                pending.extend(batch.inserted);
                                // every new batch pushes the flush out
                                deadline = Some(Instant::now() + config.flush_idle());
                            }
                            Err(RecvError::Lagged(missed)) => {
                                warn!(missed, "mutation stream lagged");
                            }
                            Err(RecvError::Closed) => {
                                debug!("mutation stream closed");
                                break;
                            }
                        }
                    }
                    _ = sleep_until(deadline.unwrap_or_else(Instant::now)),
                        if deadline.is_some() =>
                    {
                        deadline = None;
                        let nodes = std::mem::take(&mut pending);
                        flush(&*host, &*sink, &config, nodes, &mut last_rules).await;
                    }
                }
            }
            debug!("scan loop exited");
        }));
    }

    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.task.take() {
            let _ = handle.await;
        }
    }
}

/// One debounced pass: rules first (throttled), then the heuristic
/// batches. Queued nodes are always consumed, even when skipped.
async fn flush(
    host: &dyn HostTree,
    sink: &dyn ScanSink,
    config: &ScanConfig,
    pending: Vec<NodeId>,
    last_rules: &mut Option<Instant>,
) {
    if sink.paused().await {
        debug!(dropped = pending.len(), "paused, skipping flush");
        return;
    }

    let rules_due = last_rules
        .map(|at| at.elapsed() >= config.rule_throttle())
        .unwrap_or(true);
    if rules_due {
        sink.apply_rules().await;
        *last_rules = Some(Instant::now());
    }

    if !sink.heuristics_enabled().await {
        return;
    }

    let mut candidates = Vec::new();
    let mut resources = Vec::new();
    for node in pending {
        if !host.is_attached(node).await {
            continue;
        }
        let Some(tag) = host.tag_name(node).await else {
            continue;
        };
        if !config.is_interesting(&tag) {
            continue;
        }
        if ScanConfig::is_resource_tag(&tag) {
            resources.push(node);
        } else {
            candidates.push(node);
        }
    }

    dispatch(sink, config, candidates, resources).await;
}

async fn dispatch(
    sink: &dyn ScanSink,
    config: &ScanConfig,
    candidates: Vec<NodeId>,
    resources: Vec<NodeId>,
) {
    let candidate_batch = config.candidate_batch.max(1);
    let resource_batch = config.resource_batch.max(1);
    let mut first = true;

    for chunk in candidates.chunks(candidate_batch) {
        yield_between(&mut first, config.batch_yield()).await;
        sink.process_candidates(chunk.to_vec()).await;
    }
    for chunk in resources.chunks(resource_batch) {
        yield_between(&mut first, config.batch_yield()).await;
        sink.process_resources(chunk.to_vec()).await;
    }
}

async fn yield_between(first: &mut bool, pause: Duration) {
    if *first {
        *first = false;
    } else {
        sleep(pause).await;
    }
}
