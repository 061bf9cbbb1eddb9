//! Single-flight tool execution queue
//!
//! Tool calls are serialized through one worker task: submissions go
//! into an unbounded channel and a single consumer drains them in FIFO
//! order, running the full pipeline for each item before touching the
//! next. The worker parked on `recv` is the one and only drain loop, so
//! concurrent submissions can never start a second one.

use std::future::Future;

use async_channel::{unbounded, Sender};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{PedefError, Result};
use crate::pipeline::{Pipeline, PipelineResult, ToolKind};

/// One tool invocation waiting to run
#[derive(Debug)]
pub struct ToolCall {
    pub tool: ToolKind,
    pub arguments: Value,
}

struct QueuedCall {
    call: ToolCall,
    done: oneshot::Sender<Result<PipelineResult>>,
}

/// Handle for submitting tool calls to the worker
#[derive(Clone)]
pub struct ToolQueue {
    sender: Sender<QueuedCall>,
}

impl ToolQueue {
    /// Start the queue worker and return the submission handle.
    ///
    /// The worker task runs for the life of the process; it exits only
    /// when every `ToolQueue` handle has been dropped.
    pub fn start(pipeline: Pipeline) -> Self {
        let (sender, receiver) = unbounded::<QueuedCall>();

        tokio::spawn(async move {
            while let Ok(queued) = receiver.recv().await {
                let tool = queued.call.tool;
                let result = pipeline.run(tool, &queued.call.arguments);
                if let Err(ref e) = result {
                    tracing::debug!("Pipeline failed for {}: {}", tool.as_str(), e);
                }
                // The submitter may have gone away; nothing to do then.
                let _ = queued.done.send(result);
            }
        });

        Self { sender }
    }

    /// Submit a call and return a future resolving when its pipeline
    /// completes.
    ///
    /// The call enters the queue before this method returns, so calls
    /// are ordered by when `submit` ran, not by when (or whether) the
    /// returned futures are polled. Calls run strictly one at a time,
    /// in submission order; a failure settles only its own call.
    pub fn submit(&self, call: ToolCall) -> impl Future<Output = Result<PipelineResult>> + Send {
        let (done, completion) = oneshot::channel();
        // The channel is unbounded; try_send only fails once closed.
        let sent = self
            .sender
            .try_send(QueuedCall { call, done })
            .map_err(|e| PedefError::Queue(format!("Queue send error: {}", e)));
        async move {
            sent?;
            completion
                .await
                .map_err(|_| PedefError::Queue("Worker dropped the call".to_string()))?
        }
    }
}
