//! Playback session.
//!
//! Binds a [`WorkoutSequencer`], its auto-advance timers and a
//! [`NarrationPlayer`] task on the tokio runtime. The sequencer sits behind
//! a mutex that is never held across an await; timers only carry the token
//! they were armed with, so a timer that fires after `stop()` or after a
//! manual advance is discarded by the sequencer.

use crate::audio::{AudioOutput, NarrationEvent, NarrationPlayer, NarrationQueue, SpeechSynthesizer};
use crate::config::AppConfig;
use crate::workouts::{PlaybackPosition, PlaybackState, SequencerSettings, Workout, WorkoutSequencer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Poll interval of [`PlaybackSession::wait_until_finished`].
const FINISH_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A running workout with narration.
pub struct PlaybackSession {
    sequencer: Arc<Mutex<WorkoutSequencer>>,
    queue: NarrationQueue,
    events: broadcast::Sender<NarrationEvent>,
    player: JoinHandle<()>,
}

impl PlaybackSession {
    /// Load `workout` and spawn the narration player. Must be called from
    /// within a tokio runtime. Playback begins with [`PlaybackSession::start`].
    pub fn spawn<S, A>(workout: Arc<Workout>, synthesizer: S, output: A, config: &AppConfig) -> Self
    where
        S: SpeechSynthesizer + 'static,
        A: AudioOutput + 'static,
    {
        let queue = NarrationQueue::new();

        let rng = match config.playback.motivation_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let settings = SequencerSettings::from(&config.playback);
        let mut sequencer = WorkoutSequencer::new(queue.clone(), settings, rng);
        sequencer.load(workout);

        let player = NarrationPlayer::new(queue.clone(), synthesizer, output, &config.narration);
        let events = player.event_sender();
        let player = tokio::spawn(player.run());

        Self {
            sequencer: Arc::new(Mutex::new(sequencer)),
            queue,
            events,
            player,
        }
    }

    /// Start playback.
    pub fn start(&self) {
        lock(&self.sequencer).start();
        schedule(&self.sequencer);
    }

    /// Skip to the next exercise.
    pub fn next_exercise(&self) {
        lock(&self.sequencer).advance_exercise();
        schedule(&self.sequencer);
    }

    /// Skip to the next phase.
    pub fn next_phase(&self) {
        lock(&self.sequencer).advance_phase();
        schedule(&self.sequencer);
    }

    /// Stop playback and silence narration.
    pub fn stop(&self) {
        lock(&self.sequencer).stop();
    }

    pub fn position(&self) -> PlaybackPosition {
        lock(&self.sequencer).position()
    }

    pub fn state(&self) -> PlaybackState {
        lock(&self.sequencer).state()
    }

    /// Subscribe to narration events.
    pub fn subscribe(&self) -> broadcast::Receiver<NarrationEvent> {
        self.events.subscribe()
    }

    pub fn queue(&self) -> &NarrationQueue {
        &self.queue
    }

    /// Playing, with narration drained and no timer that will move on.
    pub fn is_waiting_for_user(&self) -> bool {
        let sequencer = lock(&self.sequencer);
        sequencer.is_playing() && sequencer.armed_timer().is_none() && self.queue.is_idle()
    }

    /// Not playing and all narration has been played.
    pub fn is_finished(&self) -> bool {
        !lock(&self.sequencer).is_playing() && self.queue.is_idle()
    }

    /// Resolve once the workout has finished or was stopped and narration
    /// has drained.
    pub async fn wait_until_finished(&self) {
        while !self.is_finished() {
            tokio::time::sleep(FINISH_POLL_INTERVAL).await;
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.player.abort();
    }
}

fn lock(sequencer: &Mutex<WorkoutSequencer>) -> MutexGuard<'_, WorkoutSequencer> {
    sequencer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Spawn the sequencer's pending timer, if any.
fn schedule(sequencer: &Arc<Mutex<WorkoutSequencer>>) {
    let Some(request) = lock(sequencer).take_timer_request() else {
        return;
    };

    let sequencer = Arc::clone(sequencer);
    tokio::spawn(async move {
        tokio::time::sleep(request.delay).await;
        let fired = lock(&sequencer).fire_timer(request.token);
        if fired {
            schedule(&sequencer);
        }
    });
}
