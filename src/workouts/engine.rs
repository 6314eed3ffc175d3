//! Workout sequencer.
//!
//! State machine that walks a parsed [`Workout`] exercise by exercise and
//! feeds the narration queue. It never sleeps itself: auto-advance timers
//! are handed out as [`TimerRequest`]s which the driver (see
//! [`crate::session`]) schedules and reports back through
//! [`WorkoutSequencer::fire_timer`]. Every request carries a token, so a
//! timer that was cancelled by a manual advance or a stop is recognised
//! and ignored when it fires late.

use crate::audio::{
    circuit_announcement, pick_motivation, CueTemplate, NarrationCategory, NarrationItem,
    NarrationQueue,
};
use crate::workouts::types::{Exercise, Phase, Workout};
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Default buffer added to an exercise's duration before it completes.
const DEFAULT_COMPLETION_BUFFER_MS: u64 = 1000;

/// Default pause between queuing the end narration and advancing.
const DEFAULT_END_DELAY_MS: u64 = 1000;

/// Timing and announcement settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerSettings {
    pub completion_buffer: Duration,
    pub end_delay: Duration,
    /// Multiplier applied to every timer delay (0.5 = twice as fast)
    pub time_scale: f64,
    pub circuit_announcement: CueTemplate,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            completion_buffer: Duration::from_millis(DEFAULT_COMPLETION_BUFFER_MS),
            end_delay: Duration::from_millis(DEFAULT_END_DELAY_MS),
            time_scale: 1.0,
            circuit_announcement: CueTemplate::default(),
        }
    }
}

impl SequencerSettings {
    fn scaled(&self, delay: Duration) -> Duration {
        if self.time_scale.is_finite() && self.time_scale > 0.0 {
            delay.mul_f64(self.time_scale)
        } else {
            delay
        }
    }
}

/// Indices of the current exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_phase_index: usize,
    pub current_exercise_index: usize,
    pub current_circuit_index: usize,
}

/// What an armed timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// The exercise's duration (plus buffer) elapsed
    ExerciseComplete,
    /// The end narration had its head start; advance now
    AdvanceAfterEnd,
}

/// A timer the driver must schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub token: u64,
    pub kind: TimerKind,
    pub delay: Duration,
}

/// Snapshot of the playback position for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackPosition {
    pub phase_index: usize,
    pub circuit_index: usize,
    pub exercise_index: usize,
    pub total_phases: usize,
    /// `phase_index / total_phases`
    pub progress: f32,
    pub phase_name: Option<String>,
    pub circuit_name: Option<String>,
    pub exercise_name: Option<String>,
    pub is_playing: bool,
}

/// Workout sequencer.
pub struct WorkoutSequencer {
    workout: Option<Arc<Workout>>,
    state: PlaybackState,
    queue: NarrationQueue,
    settings: SequencerSettings,
    rng: StdRng,
    /// The only timer whose firing is honoured
    armed: Option<TimerRequest>,
    /// Armed but not yet handed to the driver
    pending: Option<TimerRequest>,
    next_token: u64,
}

impl WorkoutSequencer {
    /// Create a sequencer feeding `queue`.
    pub fn new(queue: NarrationQueue, settings: SequencerSettings, rng: StdRng) -> Self {
        Self {
            workout: None,
            state: PlaybackState::default(),
            queue,
            settings,
            rng,
            armed: None,
            pending: None,
            next_token: 0,
        }
    }

    /// Load a workout. Stops any running playback first.
    pub fn load(&mut self, workout: Arc<Workout>) {
        self.stop();
        tracing::info!(
            "Workout loaded: {} ({} phases)",
            workout.display_title(),
            workout.phases.len()
        );
        self.workout = Some(workout);
        self.state = PlaybackState::default();
    }

    /// Start playback from the first exercise of the first phase.
    pub fn start(&mut self) {
        let Some(workout) = self.workout.clone() else {
            tracing::debug!("Start ignored: no workout loaded");
            return;
        };
        if self.state.is_playing {
            tracing::debug!("Start ignored: already playing");
            return;
        }
        let Some(first_phase) = workout.phases.first() else {
            tracing::debug!("Start ignored: workout has no phases");
            return;
        };

        self.clear_timers();
        self.state = PlaybackState {
            is_playing: true,
            ..Default::default()
        };
        tracing::info!("Workout started: {}", workout.display_title());

        self.queue_phase_start(first_phase);
        self.enter_exercise(true);
    }

    /// Move to the next exercise, circuit or phase; finishes the workout
    /// after the last exercise.
    pub fn advance_exercise(&mut self) {
        let Some(workout) = self.workout.clone() else {
            tracing::debug!("Advance ignored: no workout loaded");
            return;
        };
        if !self.state.is_playing {
            tracing::debug!("Advance ignored: not playing");
            return;
        }
        let Some(phase) = workout.phases.get(self.state.current_phase_index) else {
            return;
        };
        self.clear_timers();

        let container_len = phase.container(self.state.current_circuit_index).len();
        let last_exercise = self.state.current_exercise_index + 1 >= container_len;
        let last_circuit = self.state.current_circuit_index + 1 >= phase.container_count();
        let last_phase = self.state.current_phase_index + 1 >= workout.phases.len();

        if !last_exercise {
            self.state.current_exercise_index += 1;
            tracing::debug!("Advanced to exercise {}", self.state.current_exercise_index);
        } else if !last_circuit {
            self.state.current_exercise_index = 0;
            self.state.current_circuit_index += 1;
            tracing::debug!("Advanced to circuit {}", self.state.current_circuit_index + 1);

            let number = self.state.current_circuit_index + 1;
            let announcement =
                circuit_announcement(&self.settings.circuit_announcement, number, &mut self.rng);
            self.narrate(&announcement, NarrationCategory::Circuit);
            if let Some(intro) = phase
                .circuits()
                .get(self.state.current_circuit_index)
                .and_then(|c| c.voice_start.as_deref())
            {
                self.narrate(intro, NarrationCategory::Circuit);
            }
        } else if !last_phase {
            self.state.current_exercise_index = 0;
            self.state.current_circuit_index = 0;
            self.state.current_phase_index += 1;

            let next = &workout.phases[self.state.current_phase_index];
            tracing::info!("Phase changed: {}", next.name);
            self.queue_phase_start(next);
        } else {
            if let Some(end) = phase.voice_instructions.end.as_deref() {
                self.narrate(end, NarrationCategory::WorkoutEnd);
            }
            self.state.is_playing = false;
            tracing::info!("Workout complete: {}", workout.display_title());
            return;
        }

        self.enter_exercise(true);
    }

    /// Jump to the first exercise of the next phase. Pending narration is
    /// dropped and no completion timer is armed.
    pub fn advance_phase(&mut self) {
        let Some(workout) = self.workout.clone() else {
            tracing::debug!("Phase skip ignored: no workout loaded");
            return;
        };
        if !self.state.is_playing {
            tracing::debug!("Phase skip ignored: not playing");
            return;
        }
        let next_index = self.state.current_phase_index + 1;
        let Some(next) = workout.phases.get(next_index) else {
            tracing::debug!("Phase skip ignored: already in the last phase");
            return;
        };

        self.queue.clear();
        self.clear_timers();
        self.state.current_phase_index = next_index;
        self.state.current_circuit_index = 0;
        self.state.current_exercise_index = 0;
        tracing::info!("Phase changed: {}", next.name);

        self.queue_phase_start(next);
        self.enter_exercise(false);
    }

    /// Stop playback and silence narration. Idempotent.
    pub fn stop(&mut self) {
        if !self.state.is_playing && self.armed.is_none() && self.queue.is_idle() {
            tracing::debug!("Stop ignored: already stopped");
            return;
        }

        self.state = PlaybackState::default();
        self.clear_timers();
        self.queue.stop();
        tracing::info!("Workout stopped");
    }

    /// Report that the timer identified by `token` elapsed.
    ///
    /// Returns false when the timer was cancelled in the meantime.
    pub fn fire_timer(&mut self, token: u64) -> bool {
        let Some(timer) = self.armed.filter(|t| t.token == token) else {
            tracing::debug!("Ignoring stale timer {}", token);
            return false;
        };
        if !self.state.is_playing {
            tracing::debug!("Ignoring timer {} after stop", token);
            self.clear_timers();
            return false;
        }
        self.armed = None;

        match timer.kind {
            TimerKind::ExerciseComplete => {
                if let Some(end) = self
                    .current_exercise()
                    .and_then(|e| e.voice_instructions.end.clone())
                {
                    self.narrate(&end, NarrationCategory::ExerciseEnd);
                }
                let delay = self.settings.scaled(self.settings.end_delay);
                self.arm(TimerKind::AdvanceAfterEnd, delay);
            }
            TimerKind::AdvanceAfterEnd => self.advance_exercise(),
        }

        true
    }

    /// Timer armed since the last call, for the driver to schedule.
    pub fn take_timer_request(&mut self) -> Option<TimerRequest> {
        self.pending.take()
    }

    /// Currently armed timer, if any.
    pub fn armed_timer(&self) -> Option<TimerRequest> {
        self.armed
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn workout(&self) -> Option<&Workout> {
        self.workout.as_deref()
    }

    pub fn queue(&self) -> &NarrationQueue {
        &self.queue
    }

    fn current_phase(&self) -> Option<&Phase> {
        self.workout
            .as_deref()?
            .phases
            .get(self.state.current_phase_index)
    }

    /// Exercise at the current indices.
    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.current_phase()?
            .container(self.state.current_circuit_index)
            .get(self.state.current_exercise_index)
    }

    /// Position snapshot for display.
    pub fn position(&self) -> PlaybackPosition {
        let total_phases = self.workout.as_ref().map(|w| w.phases.len()).unwrap_or(0);
        let progress = if total_phases > 0 {
            self.state.current_phase_index as f32 / total_phases as f32
        } else {
            0.0
        };
        let phase = self.current_phase();

        PlaybackPosition {
            phase_index: self.state.current_phase_index,
            circuit_index: self.state.current_circuit_index,
            exercise_index: self.state.current_exercise_index,
            total_phases,
            progress,
            phase_name: phase.map(|p| p.name.clone()),
            circuit_name: phase
                .and_then(|p| p.circuits().get(self.state.current_circuit_index))
                .map(|c| c.name.clone()),
            exercise_name: self.current_exercise().map(|e| e.name.clone()),
            is_playing: self.state.is_playing,
        }
    }

    /// Queue the current exercise's instructions and optionally arm its
    /// completion timer.
    fn enter_exercise(&mut self, arm_timer: bool) {
        let Some(workout) = self.workout.clone() else {
            return;
        };
        let Some(exercise) = workout
            .phases
            .get(self.state.current_phase_index)
            .map(|p| p.container(self.state.current_circuit_index))
            .and_then(|c| c.get(self.state.current_exercise_index))
        else {
            tracing::debug!("No exercise at the current position");
            return;
        };

        let voice = &exercise.voice_instructions;
        let scripted = [
            (&voice.start, NarrationCategory::Start),
            (&voice.main, NarrationCategory::Main),
            (&voice.form, NarrationCategory::Form),
            (&voice.count, NarrationCategory::Count),
        ];
        for (text, category) in scripted {
            if let Some(text) = text {
                self.narrate(text, category);
            }
        }

        let pool = voice.motivation.as_deref().unwrap_or(&[]);
        if let Some(message) = pick_motivation(pool, &mut self.rng) {
            self.narrate(message, NarrationCategory::Motivation);
        }

        if !arm_timer {
            return;
        }
        if let Some(seconds) = exercise.timed_duration() {
            let delay = self.settings.scaled(
                Duration::from_secs(u64::from(seconds)) + self.settings.completion_buffer,
            );
            self.arm(TimerKind::ExerciseComplete, delay);
        }
    }

    fn queue_phase_start(&self, phase: &Phase) {
        if let Some(start) = phase.voice_instructions.start.as_deref() {
            self.narrate(start, NarrationCategory::PhaseStart);
        }
    }

    fn narrate(&self, text: &str, category: NarrationCategory) {
        self.queue.enqueue(NarrationItem::new(text, category));
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration) {
        self.next_token += 1;
        let request = TimerRequest {
            token: self.next_token,
            kind,
            delay,
        };
        tracing::debug!("Timer {} armed: {:?} in {:?}", request.token, kind, delay);
        self.armed = Some(request);
        self.pending = Some(request);
    }

    fn clear_timers(&mut self) {
        self.armed = None;
        self.pending = None;
    }
}
