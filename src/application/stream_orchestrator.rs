//! StreamOrchestrator - relays one assistant run to one consumer.
//!
//! All preconditions are checked before the provider run is opened. Once
//! open, a supervised pump task forwards provider events in order through a
//! bounded channel, accumulates the response text, and hands settlement to
//! the supervisor after the terminal `end` event has been delivered.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use super::{AccessValidator, ChatError, Settlement, SettlementInput, TaskSupervisor};
use crate::domain::chat::Thread;
use crate::domain::entitlement::Grant;
use crate::domain::foundation::{ProviderThreadHandle, ThreadId, UserId};
use crate::domain::stream::{ResponseAccumulator, RunOutcome, StreamEvent};
use crate::ports::{AssistantProvider, EventStream, ThreadRepository};

/// Live event stream for a single consumer.
///
/// Not `Clone` and not restartable. Dropping it does not cancel the
/// upstream run.
pub struct AssistantStream {
    thread_id: ThreadId,
    events: ReceiverStream<StreamEvent>,
}

impl AssistantStream {
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }
}

impl Stream for AssistantStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl std::fmt::Debug for AssistantStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantStream")
            .field("thread_id", &self.thread_id)
            .finish_non_exhaustive()
    }
}

pub struct StreamOrchestrator {
    threads: Arc<dyn ThreadRepository>,
    validator: Arc<AccessValidator>,
    provider: Arc<dyn AssistantProvider>,
    settlement: Arc<Settlement>,
    supervisor: TaskSupervisor,
    buffer: usize,
}

impl StreamOrchestrator {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        validator: Arc<AccessValidator>,
        provider: Arc<dyn AssistantProvider>,
        settlement: Arc<Settlement>,
        supervisor: TaskSupervisor,
        buffer: usize,
    ) -> Self {
        Self {
            threads,
            validator,
            provider,
            settlement,
            supervisor,
            buffer: buffer.max(1),
        }
    }

    /// Opens a run on the thread behind `handle` for `user_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the thread is missing, deleted, or owned by someone else
    /// - `AccessDenied` if the validator refuses
    /// - `Upstream` if the provider refuses to open the run
    pub async fn open(
        &self,
        handle: &ProviderThreadHandle,
        user_id: &UserId,
    ) -> Result<AssistantStream, ChatError> {
        let thread = self
            .threads
            .find_by_handle(handle)
            .await?
            .filter(|t| t.is_owned_by(user_id))
            .ok_or_else(|| ChatError::thread_not_found(handle))?;

        let grant = self.validator.require(user_id, thread.assistant_id()).await?;

        let upstream = self
            .provider
            .open_run(handle, thread.assistant_id())
            .await
            .map_err(|e| {
                warn!(
                    thread_id = %thread.id(),
                    assistant_id = %thread.assistant_id(),
                    error = %e,
                    "provider refused to open run"
                );
                ChatError::Upstream(e)
            })?;

        info!(
            thread_id = %thread.id(),
            user_id = %user_id,
            assistant_id = %thread.assistant_id(),
            "assistant stream opened"
        );

        let (tx, rx) = mpsc::channel(self.buffer);
        let thread_id = thread.id();
        let pump = Pump {
            thread,
            user_id: user_id.clone(),
            grant,
            settlement: Arc::clone(&self.settlement),
            supervisor: self.supervisor.clone(),
        };
        self.supervisor.spawn("stream_pump", pump.run(upstream, tx));

        Ok(AssistantStream {
            thread_id,
            events: ReceiverStream::new(rx),
        })
    }
}

/// Per-stream state owned by the pump task.
struct Pump {
    thread: Thread,
    user_id: UserId,
    grant: Grant,
    settlement: Arc<Settlement>,
    supervisor: TaskSupervisor,
}

impl Pump {
    async fn run(
        self,
        mut upstream: EventStream,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<(), Infallible> {
        let mut accumulator = ResponseAccumulator::new();
        let mut consumer_gone = false;

        while let Some(item) = upstream.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    warn!(thread_id = %self.thread.id(), error = %e, "provider stream failed");
                    e.to_event()
                }
            };
            accumulator.observe(&event);
            self.deliver(&tx, event, &mut consumer_gone).await;
            if accumulator.is_finished() {
                break;
            }
        }

        if !accumulator.is_finished() {
            warn!(thread_id = %self.thread.id(), "provider stream closed without a terminal event");
            let event = StreamEvent::error("stream_closed", "provider stream ended unexpectedly");
            accumulator.observe(&event);
            self.deliver(&tx, event, &mut consumer_gone).await;
        }
        drop(tx);

        match accumulator.outcome().cloned() {
            Some(RunOutcome::Completed { model, usage }) => {
                let input = SettlementInput {
                    thread: self.thread,
                    user_id: self.user_id,
                    grant: self.grant,
                    text: accumulator.into_text(),
                    model,
                    usage,
                };
                let settlement = self.settlement;
                self.supervisor.spawn("settlement", async move {
                    let report = settlement.settle(input).await;
                    if report.is_complete() {
                        Ok(())
                    } else {
                        Err(report)
                    }
                });
            }
            Some(RunOutcome::Failed { code, .. }) => {
                info!(
                    thread_id = %self.thread.id(),
                    code = %code,
                    "run failed; settlement skipped"
                );
            }
            None => {}
        }
        Ok(())
    }

    /// Sends to the consumer unless it has gone. A vanished consumer does not
    /// stop the pump: the run is drained so settlement still happens.
    async fn deliver(
        &self,
        tx: &mpsc::Sender<StreamEvent>,
        event: StreamEvent,
        consumer_gone: &mut bool,
    ) {
        if *consumer_gone {
            return;
        }
        if tx.send(event).await.is_err() {
            *consumer_gone = true;
            debug!(thread_id = %self.thread.id(), "consumer disconnected; draining run");
        }
    }
}
