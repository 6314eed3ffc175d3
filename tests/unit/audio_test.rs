//! Unit tests for the narration player.

use coachvoice::audio::{
    AudioClip, AudioError, NarrationCategory, NarrationConfig, NarrationEvent, NarrationItem,
    NarrationPlayer, NarrationQueue, SimulatedOutput, SpeechSynthesizer, VoiceCredentials,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records every request and fails the ones containing "fail".
#[derive(Clone, Default)]
struct RecordingSynthesizer {
    requests: Arc<Mutex<Vec<String>>>,
}

impl SpeechSynthesizer for RecordingSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        credentials: &VoiceCredentials,
    ) -> Result<AudioClip, AudioError> {
        credentials.require_api_key()?;
        self.requests.lock().unwrap().push(text.to_string());

        if text.contains("fail") {
            return Err(AudioError::SynthesisFailed(format!("rejected: {}", text)));
        }
        Ok(AudioClip {
            bytes: text.as_bytes().to_vec(),
            mime_type: "audio/mpeg".to_string(),
        })
    }
}

fn config_with_key() -> NarrationConfig {
    NarrationConfig {
        api_key: Some("test-key".to_string()),
        voice_id: Some("coach".to_string()),
        item_gap_ms: 0,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_item_is_skipped_and_reported() {
    let queue = NarrationQueue::new();
    let synthesizer = RecordingSynthesizer::default();
    let failures = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&failures);

    let mut player = NarrationPlayer::new(
        queue.clone(),
        synthesizer.clone(),
        SimulatedOutput::new(),
        &config_with_key(),
    )
    .with_error_handler(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let mut events = player.subscribe();
    let mut stop_rx = queue.subscribe_stop();

    queue.enqueue(NarrationItem::new("first", NarrationCategory::Main));
    queue.enqueue(NarrationItem::new("this will fail", NarrationCategory::Form));
    queue.enqueue(NarrationItem::new("last", NarrationCategory::Motivation));
    player.drain(&mut stop_rx).await;

    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert_eq!(
        *synthesizer.requests.lock().unwrap(),
        vec!["first", "this will fail", "last"]
    );
    assert!(queue.is_idle());

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert!(received
        .iter()
        .any(|e| matches!(e, NarrationEvent::Error { message } if message.contains("rejected"))));
    assert!(received.contains(&NarrationEvent::Completed {
        category: NarrationCategory::Motivation
    }));
}

#[tokio::test(start_paused = true)]
async fn test_count_narration_gets_breaks() {
    let queue = NarrationQueue::new();
    let synthesizer = RecordingSynthesizer::default();
    let mut player = NarrationPlayer::new(
        queue.clone(),
        synthesizer.clone(),
        SimulatedOutput::new(),
        &config_with_key(),
    );
    let mut stop_rx = queue.subscribe_stop();

    queue.enqueue(NarrationItem::new("1, 2, 3", NarrationCategory::Count));
    queue.enqueue(NarrationItem::new("1, 2, 3", NarrationCategory::Main));
    player.drain(&mut stop_rx).await;

    let requests = synthesizer.requests.lock().unwrap();
    assert_eq!(
        requests[0],
        "1<break time=\"1.0s\" />, 2<break time=\"1.0s\" />, 3"
    );
    assert_eq!(requests[1], "1, 2, 3");
}

#[tokio::test(start_paused = true)]
async fn test_missing_credentials_reported() {
    let queue = NarrationQueue::new();
    let config = NarrationConfig {
        item_gap_ms: 0,
        ..Default::default()
    };
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);

    let mut player = NarrationPlayer::new(
        queue.clone(),
        RecordingSynthesizer::default(),
        SimulatedOutput::new(),
        &config,
    )
    .with_error_handler(move |e| sink.lock().unwrap().push(e.clone()));
    let mut stop_rx = queue.subscribe_stop();

    queue.enqueue(NarrationItem::new("hello", NarrationCategory::Main));
    player.drain(&mut stop_rx).await;

    assert_eq!(*errors.lock().unwrap(), vec![AudioError::MissingCredentials]);
    assert!(queue.is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_playback_halts_draining() {
    let queue = NarrationQueue::new();
    let player = NarrationPlayer::new(
        queue.clone(),
        RecordingSynthesizer::default(),
        SimulatedOutput::new(),
        &config_with_key(),
    );
    let mut events = player.subscribe();
    let handle = tokio::spawn(player.run());

    queue.enqueue(NarrationItem::new("a long instruction", NarrationCategory::Main));
    queue.enqueue(NarrationItem::new("never played", NarrationCategory::Form));

    // Wait until the first item is playing
    loop {
        if let NarrationEvent::Started { .. } = events.recv().await.unwrap() {
            break;
        }
    }
    queue.stop();

    loop {
        match events.recv().await.unwrap() {
            NarrationEvent::QueueCleared => break,
            NarrationEvent::Started { text, .. } => panic!("{} played after stop", text),
            _ => {}
        }
    }
    assert!(queue.is_idle());

    // Draining resumes with new work
    queue.enqueue(NarrationItem::new("after restart", NarrationCategory::Start));
    loop {
        if let NarrationEvent::Completed { category } = events.recv().await.unwrap() {
            assert_eq!(category, NarrationCategory::Start);
            break;
        }
    }

    handle.abort();
}
