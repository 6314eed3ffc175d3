//! Narration Player
//!
//! Drains the [`NarrationQueue`] one item at a time: synthesize, load into
//! the output, play, wait for the end. A failed item is reported and
//! skipped; draining continues with the next one.

use super::queue::{NarrationQueue, NarrationTicket};
use super::tts::{text_utils, AudioOutput, SpeechSynthesizer, VoiceCredentials};
use super::{AudioError, NarrationCategory, NarrationConfig, NarrationEvent};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Caller-supplied handler for synthesis and playback failures
pub type ErrorHandler = Box<dyn Fn(&AudioError) + Send + Sync>;

/// How an item's playback ended
enum Outcome {
    Completed,
    Failed(AudioError),
    Stopped,
}

/// Plays queued narration through injected capabilities
pub struct NarrationPlayer<S, A> {
    queue: NarrationQueue,
    synthesizer: S,
    output: A,
    credentials: VoiceCredentials,
    enabled: bool,
    item_gap: Duration,
    event_tx: broadcast::Sender<NarrationEvent>,
    on_error: Option<ErrorHandler>,
}

impl<S, A> NarrationPlayer<S, A>
where
    S: SpeechSynthesizer,
    A: AudioOutput,
{
    /// Create a player for `queue`
    pub fn new(queue: NarrationQueue, synthesizer: S, output: A, config: &NarrationConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            queue,
            synthesizer,
            output,
            credentials: config.credentials(),
            enabled: config.enabled,
            item_gap: Duration::from_millis(config.item_gap_ms),
            event_tx,
            on_error: None,
        }
    }

    /// Install a failure handler
    pub fn with_error_handler(
        mut self,
        handler: impl Fn(&AudioError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Subscribe to narration events
    pub fn subscribe(&self) -> broadcast::Receiver<NarrationEvent> {
        self.event_tx.subscribe()
    }

    /// Event sender, for subscribing after the player has been moved
    pub fn event_sender(&self) -> broadcast::Sender<NarrationEvent> {
        self.event_tx.clone()
    }

    /// Run until the task is aborted.
    pub async fn run(mut self) {
        let mut stop_rx = self.queue.subscribe_stop();

        loop {
            self.drain(&mut stop_rx).await;

            let stopped = tokio::select! {
                _ = self.queue.notified() => false,
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    true
                }
            };

            if stopped {
                self.halt();
            }
        }
    }

    /// Play queued items until the queue is empty or playback is stopped.
    pub async fn drain(&mut self, stop_rx: &mut watch::Receiver<u64>) {
        while let Some(ticket) = self.queue.begin_next() {
            let generation = ticket.generation;
            let outcome = self.play_item(ticket, stop_rx).await;
            self.queue.end_item(generation);

            match outcome {
                Outcome::Completed => {}
                Outcome::Failed(e) => self.report(e),
                Outcome::Stopped => {
                    self.halt();
                    return;
                }
            }

            if !self.item_gap.is_zero() && !self.queue.is_empty() {
                tokio::time::sleep(self.item_gap).await;
            }
        }
    }

    async fn play_item(
        &mut self,
        ticket: NarrationTicket,
        stop_rx: &mut watch::Receiver<u64>,
    ) -> Outcome {
        let NarrationTicket { item, generation } = ticket;
        tracing::debug!(
            "Playing {:?}: {}",
            item.category,
            text_utils::truncate_for_log(&item.text)
        );

        if !self.enabled {
            return Outcome::Completed;
        }

        let text = match item.category {
            NarrationCategory::Count => text_utils::insert_count_breaks(&item.text),
            _ => item.text.clone(),
        };

        // Synthesis is allowed to finish even if playback stops meanwhile
        let clip = match self.synthesizer.synthesize(&text, &self.credentials).await {
            Ok(clip) => clip,
            Err(e) => return Outcome::Failed(e),
        };

        // Marks the stop signal seen so only a later stop interrupts playback
        if *stop_rx.borrow_and_update() != generation || !self.queue.is_current(generation) {
            tracing::debug!("Discarding narration synthesized after stop");
            return Outcome::Stopped;
        }

        if let Err(e) = self.output.set_source(clip) {
            return Outcome::Failed(e);
        }

        let _ = self.event_tx.send(NarrationEvent::Started {
            text: item.text.clone(),
            category: item.category,
        });

        let output = &mut self.output;
        let result = tokio::select! {
            result = async {
                output.play().await?;
                output.ended().await
            } => Some(result),
            _ = stop_rx.changed() => None,
        };

        match result {
            Some(Ok(())) => {
                let _ = self.event_tx.send(NarrationEvent::Completed {
                    category: item.category,
                });
                Outcome::Completed
            }
            Some(Err(e)) => Outcome::Failed(e),
            None => Outcome::Stopped,
        }
    }

    fn report(&self, error: AudioError) {
        tracing::error!("Narration failed: {}", error);
        if let Some(handler) = &self.on_error {
            handler(&error);
        }
        let _ = self.event_tx.send(NarrationEvent::Error {
            message: error.to_string(),
        });
    }

    /// Pause and rewind the output after a stop.
    fn halt(&mut self) {
        self.output.pause();
        self.output.reset();
        let _ = self.event_tx.send(NarrationEvent::QueueCleared);
        tracing::debug!("Narration halted");
    }
}
