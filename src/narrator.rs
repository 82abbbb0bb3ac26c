use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use crate::speech::SpeechEngine;

/// Background narration with at most one utterance in flight.
///
/// Requests go through a bounded queue to a single consumer task. The
/// `speaking` flag is claimed with one compare-and-swap when a request is
/// accepted and released by the consumer once playback ends, so callers
/// can use it to decide whether a detection gets narrated.
pub struct Narrator {
    tx: mpsc::Sender<String>,
    speaking: Arc<AtomicBool>,
    idle: Arc<Notify>,
    worker: JoinHandle<()>,
}

impl Narrator {
    /// Starts the consumer task. Must be called inside a tokio runtime.
    pub fn spawn<E: SpeechEngine>(engine: E, delay: Duration, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let speaking = Arc::new(AtomicBool::new(false));
        let idle = Arc::new(Notify::new());
        let worker = tokio::spawn(run_worker(
            Arc::new(engine),
            rx,
            Arc::clone(&speaking),
            Arc::clone(&idle),
            delay,
        ));
        Self { tx, speaking, idle, worker }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::Acquire)
    }

    /// Claims the narrator and queues `summary`. Returns false without
    /// queueing anything if a narration is already in progress.
    pub fn try_speak(&self, summary: String) -> bool {
        if self
            .speaking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        match self.tx.try_send(summary) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Narration request dropped: {}", err);
                self.speaking.store(false, Ordering::Release);
                self.idle.notify_waiters();
                false
            }
        }
    }

    /// Resolves once no narration is in progress
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if !self.is_speaking() {
                return;
            }
            notified.await;
        }
    }

    /// Closes the queue and waits for queued narration to finish playing
    pub async fn drain(self) -> Result<()> {
        let Narrator { tx, worker, .. } = self;
        drop(tx);
        worker.await.context("Narration worker panicked")?;
        Ok(())
    }
}

async fn run_worker<E: SpeechEngine>(
    engine: Arc<E>,
    mut rx: mpsc::Receiver<String>,
    speaking: Arc<AtomicBool>,
    idle: Arc<Notify>,
    delay: Duration,
) {
    while let Some(summary) = rx.recv().await {
        tokio::time::sleep(delay).await;

        let engine = Arc::clone(&engine);
        let spoken = tokio::task::spawn_blocking(move || engine.say(&summary)).await;
        match spoken {
            Ok(Ok(())) => log::debug!("Narration finished"),
            Ok(Err(err)) => log::error!("Narration failed: {:#}", err),
            Err(err) => log::error!("Narration task aborted: {}", err),
        }

        speaking.store(false, Ordering::Release);
        idle.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Clone, Default)]
    struct RecordingEngine {
        spoken: Arc<Mutex<Vec<(String, Instant)>>>,
    }

    impl SpeechEngine for RecordingEngine {
        fn say(&self, text: &str) -> Result<()> {
            self.spoken.lock().unwrap().push((text.to_string(), Instant::now()));
            Ok(())
        }
    }

    struct FailingEngine;

    impl SpeechEngine for FailingEngine {
        fn say(&self, _text: &str) -> Result<()> {
            anyhow::bail!("no audio device")
        }
    }

    #[tokio::test]
    async fn test_second_request_rejected_while_speaking() {
        let engine = RecordingEngine::default();
        let narrator = Narrator::spawn(engine.clone(), Duration::from_millis(50), 4);

        assert!(narrator.try_speak("first".to_string()));
        assert!(narrator.is_speaking());
        assert!(!narrator.try_speak("second".to_string()));

        narrator.drain().await.unwrap();
        let spoken = engine.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].0, "first");
    }

    #[tokio::test]
    async fn test_delay_precedes_speech() {
        let engine = RecordingEngine::default();
        let narrator = Narrator::spawn(engine.clone(), Duration::from_millis(100), 4);

        let requested = Instant::now();
        assert!(narrator.try_speak("hello".to_string()));
        narrator.drain().await.unwrap();

        let spoken = engine.spoken.lock().unwrap();
        assert!(spoken[0].1.duration_since(requested) >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_flag_released_after_speech() {
        let engine = RecordingEngine::default();
        let narrator = Narrator::spawn(engine.clone(), Duration::from_millis(10), 4);

        assert!(narrator.try_speak("one".to_string()));
        narrator.wait_idle().await;
        assert!(!narrator.is_speaking());
        assert!(narrator.try_speak("two".to_string()));

        narrator.drain().await.unwrap();
        assert_eq!(engine.spoken.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_speech_releases_flag() {
        let narrator = Narrator::spawn(FailingEngine, Duration::ZERO, 1);
        assert!(narrator.try_speak("lost".to_string()));
        narrator.wait_idle().await;
        assert!(!narrator.is_speaking());
        narrator.drain().await.unwrap();
    }
}
