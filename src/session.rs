//! The slideshow event loop.
//!
//! A single task drives the controller: it waits on transport commands, element
//! signals and the deadline of the one armed image timer, feeds whichever fires into the
//! controller and renders afterwards. Nothing runs concurrently with a transition, so the
//! cleanup of one always completes before the next one starts.

use super::media_deck::{MediaElement, MediaSignal};
use super::playback::{Advance, PlaybackController, Trigger};
use super::transport::TransportCommand;
use log::{debug, info};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep_until, Instant};

/// Why the loop returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionExit {
    /// The user asked to leave.
    Quit,
    /// Every transport sender was dropped.
    CommandsClosed,
}

/// Runs the slideshow until the user quits. The controller is torn down before returning.
pub async fn run_session<E, R>(
    controller: &mut PlaybackController<E>,
    commands: &mut UnboundedReceiver<TransportCommand>,
    signals: &mut UnboundedReceiver<MediaSignal>,
    mut render: R,
) -> SessionExit
where
    E: MediaElement,
    R: FnMut(&PlaybackController<E>),
{
    controller.start();
    render(controller);

    let mut deadline: Option<(u64, Instant)> = None;
    let mut signals_open = true;

    let exit = loop {
        // Track the armed timer; a new arming restarts the countdown.
        deadline = match (controller.armed(), deadline) {
            (Advance::Timer { seq, .. }, Some((armed_seq, at))) if armed_seq == seq => Some((seq, at)),
            (Advance::Timer { seq, after }, _) => Some((seq, Instant::now() + after)),
            _ => None,
        };
        let timer_at = deadline.map(|(_, at)| at).unwrap_or_else(Instant::now);

        tokio::select! {
            command = commands.recv() => match command {
                Some(TransportCommand::Quit) => break SessionExit::Quit,
                None => break SessionExit::CommandsClosed,
                Some(TransportCommand::Next) => controller.next(),
                Some(TransportCommand::Previous) => controller.previous(),
                Some(TransportCommand::TogglePlay) => controller.toggle_play(),
            },
            signal = signals.recv(), if signals_open => match signal {
                Some(MediaSignal::Ended { kind, entry }) => {
                    debug!("{} element finished entry {}", kind, entry);
                    controller.handle(Trigger::MediaEnded { entry });
                }
                None => signals_open = false,
            },
            _ = sleep_until(timer_at), if deadline.is_some() => {
                if let Some((seq, _)) = deadline.take() {
                    controller.handle(Trigger::TimerElapsed { seq });
                }
            }
        }
        render(controller);
    };

    info!("Slideshow session ended: {:?}", exit);
    controller.teardown();
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_deck::fake::{deck, FakeElement};
    use crate::model::{MediaDescriptor, MediaKind};
    use crate::playback::PlayerState;
    use crate::playlist::Playlist;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn item(id: &str, kind: MediaKind) -> MediaDescriptor {
        MediaDescriptor {
            id: id.to_string(),
            kind,
            display_url: format!("http://media/{}", id),
            download_url: None,
            label: id.to_string(),
            mimetype: String::new(),
        }
    }

    fn controller(kinds: &[MediaKind]) -> PlaybackController<FakeElement> {
        let items = kinds.iter().enumerate().map(|(i, k)| item(&i.to_string(), *k)).collect();
        PlaybackController::new(Playlist::new(items), deck(), Duration::from_millis(15_000))
    }

    type Frame = (PlayerState, Advance);

    #[tokio::test(start_paused = true)]
    async fn image_timer_advances_to_video() {
        let mut c = controller(&[MediaKind::Image, MediaKind::Video]);
        let (tx, mut commands) = mpsc::unbounded_channel();
        let (_signal_tx, mut signals) = mpsc::unbounded_channel();
        let mut frames: Vec<Frame> = Vec::new();

        let driver = async move {
            tokio::time::sleep(Duration::from_millis(14_999)).await;
            tokio::time::sleep(Duration::from_millis(2)).await;
            tx.send(TransportCommand::Quit).unwrap();
        };
        let (exit, ()) = tokio::join!(
            run_session(&mut c, &mut commands, &mut signals, |c| frames.push((c.state(), c.armed()))),
            driver
        );

        assert_eq!(exit, SessionExit::Quit);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].0, PlayerState::Showing { index: 0, kind: MediaKind::Image, playing: true });
        assert_eq!(frames[1].0, PlayerState::Showing { index: 1, kind: MediaKind::Video, playing: true });
        assert!(matches!(frames[1].1, Advance::MediaEnd { kind: MediaKind::Video, .. }));
        assert_eq!(c.state(), PlayerState::Idle);
        assert_eq!(c.armed(), Advance::None);
    }

    #[tokio::test(start_paused = true)]
    async fn media_end_signal_advances_and_stale_one_is_ignored() {
        let mut c = controller(&[MediaKind::Audio, MediaKind::Video, MediaKind::Image]);
        let (tx, mut commands) = mpsc::unbounded_channel();
        let (signal_tx, mut signals) = mpsc::unbounded_channel();
        let mut indices = Vec::new();

        let driver = async move {
            signal_tx.send(MediaSignal::Ended { kind: MediaKind::Audio, entry: 1 }).unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            // Entry 1 is no longer current.
            signal_tx.send(MediaSignal::Ended { kind: MediaKind::Audio, entry: 1 }).unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send(TransportCommand::Quit).unwrap();
        };
        let (exit, ()) =
            tokio::join!(run_session(&mut c, &mut commands, &mut signals, |c| indices.push(c.current_index())), driver);

        assert_eq!(exit, SessionExit::Quit);
        assert_eq!(indices, vec![Some(0), Some(1), Some(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_image_never_advances() {
        let mut c = controller(&[MediaKind::Image, MediaKind::Image]);
        let (tx, mut commands) = mpsc::unbounded_channel();
        let (_signal_tx, mut signals) = mpsc::unbounded_channel();
        let mut last = None;

        let driver = async move {
            tx.send(TransportCommand::TogglePlay).unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
            tx.send(TransportCommand::Quit).unwrap();
        };
        tokio::join!(run_session(&mut c, &mut commands, &mut signals, |c| last = Some(c.state())), driver);

        assert_eq!(last, Some(PlayerState::Showing { index: 0, kind: MediaKind::Image, playing: false }));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_navigation_restarts_the_image_countdown() {
        let mut c = controller(&[MediaKind::Image, MediaKind::Image, MediaKind::Image]);
        let (tx, mut commands) = mpsc::unbounded_channel();
        let (_signal_tx, mut signals) = mpsc::unbounded_channel();
        let mut indices = Vec::new();

        let driver = async move {
            tokio::time::sleep(Duration::from_millis(10_000)).await;
            tx.send(TransportCommand::Next).unwrap();
            // 20s after start: only 10s into item 1, so no auto-advance yet.
            tokio::time::sleep(Duration::from_millis(10_000)).await;
            tx.send(TransportCommand::Quit).unwrap();
        };
        tokio::join!(run_session(&mut c, &mut commands, &mut signals, |c| indices.push(c.current_index())), driver);

        assert_eq!(indices, vec![Some(0), Some(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_senders_end_the_session_and_empty_playlist_stays_idle() {
        let mut c = controller(&[]);
        let (tx, mut commands) = mpsc::unbounded_channel::<TransportCommand>();
        let (signal_tx, mut signals) = mpsc::unbounded_channel();
        drop(signal_tx);
        drop(tx);
        let mut frames = 0;
        let exit = run_session(&mut c, &mut commands, &mut signals, |c| {
            frames += 1;
            assert_eq!(c.state(), PlayerState::Idle);
            assert_eq!(c.armed(), Advance::None);
        })
        .await;
        assert_eq!(exit, SessionExit::CommandsClosed);
        assert!(frames >= 1);
    }
}
