//! Transport commands and the keyboard bindings that produce them.
//!
//! Right-arrow goes to the next item, Left-arrow to the previous one and Space toggles
//! play/pause. Bound keys are consumed so the terminal does nothing else with them.
//! The terminal binding lives exactly as long as a [`KeyBinding`] value.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::{debug, info, trace, warn};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

const KEY_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportCommand {
    Next,
    Previous,
    TogglePlay,
    /// Leave the slideshow.
    Quit,
}

/// The keys the adapter distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowRight,
    ArrowLeft,
    Space,
    Escape,
    /// Ctrl+C, which raw mode delivers as a key instead of a signal.
    Interrupt,
    Char(char),
    Other,
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        match (event.code, event.modifiers) {
            (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => Key::Interrupt,
            (KeyCode::Right, _) => Key::ArrowRight,
            (KeyCode::Left, _) => Key::ArrowLeft,
            (KeyCode::Char(' '), _) => Key::Space,
            (KeyCode::Esc, _) => Key::Escape,
            (KeyCode::Char(c), _) => Key::Char(c),
            _ => Key::Other,
        }
    }
}

/// Result of feeding one key to the adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyOutcome {
    pub command: Option<TransportCommand>,
    /// The key was handled here and must not reach any default behaviour.
    pub prevent_default: bool,
}

/// Maps keys to transport commands.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyboardAdapter;

impl KeyboardAdapter {
    pub fn handle(&self, key: Key) -> KeyOutcome {
        let command = match key {
            Key::ArrowRight => Some(TransportCommand::Next),
            Key::ArrowLeft => Some(TransportCommand::Previous),
            Key::Space => Some(TransportCommand::TogglePlay),
            Key::Escape | Key::Interrupt | Key::Char('q') => Some(TransportCommand::Quit),
            Key::Char(_) | Key::Other => None,
        };
        KeyOutcome { command, prevent_default: command.is_some() }
    }
}

/// Terminal key binding: raw mode plus a reader forwarding commands.
///
/// Installing switches the terminal to raw mode; dropping (or [`KeyBinding::uninstall`])
/// stops the reader and restores the terminal.
pub struct KeyBinding {
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl KeyBinding {
    pub fn install(commands: UnboundedSender<TransportCommand>) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        info!("Keyboard bindings installed (Right: next, Left: previous, Space: play/pause, q: quit).");
        let stop = Arc::new(AtomicBool::new(false));
        let reader_stop = stop.clone();
        let reader = tokio::task::spawn_blocking(move || read_keys(commands, reader_stop));
        Ok(Self { stop, reader: Some(reader) })
    }

    /// Stops the reader, waits for it to finish and restores the terminal.
    pub async fn uninstall(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            if let Err(e) = reader.await {
                warn!("Key reader task failed: {}", e);
            }
        }
        // Drop restores the terminal.
    }
}

impl Drop for KeyBinding {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", e);
        }
        debug!("Keyboard bindings removed.");
    }
}

fn read_keys(commands: UnboundedSender<TransportCommand>, stop: Arc<AtomicBool>) {
    let adapter = KeyboardAdapter;
    while !stop.load(Ordering::SeqCst) {
        match event::poll(KEY_POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!("Polling terminal events failed: {}", e);
                break;
            }
        }
        let key_event = match event::read() {
            Ok(Event::Key(key_event)) if key_event.kind == KeyEventKind::Press => key_event,
            Ok(_) => continue,
            Err(e) => {
                warn!("Reading terminal event failed: {}", e);
                break;
            }
        };
        let key = Key::from(key_event);
        let outcome = adapter.handle(key);
        trace!("Key {:?} -> {:?}", key, outcome);
        if let Some(command) = outcome.command {
            if commands.send(command).is_err() {
                debug!("Transport receiver closed; key reader exiting.");
                break;
            }
        }
    }
}
