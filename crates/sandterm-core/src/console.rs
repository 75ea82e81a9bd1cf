//! Console session controller.
//!
//! One `ConsoleSession` per attached channel. It owns both screen buffers, the view-mode
//! stack, the command history and the input line, and it is the only thing that writes to
//! a buffer. Events are handled one at a time, in arrival order, by the task that owns it.

use crate::classifier::CommandClassifier;
use crate::decoder::ChunkDecoder;
use crate::escape::{interpret, Interpreted};
use crate::history::CommandHistory;
use crate::mode::ModeStack;
use crate::render::RenderView;
use crate::screen::ScreenBuffer;
use crate::transport::{ChannelEvent, Transport};
use crate::{ConsoleError, Result};
use sandterm_types::{ChannelRequest, ConnectionState, ViewMode};
use tracing::{debug, info, trace, warn};

/// What an interrupt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// A streaming command was terminated and the console is back in the main view.
    Terminated,
    /// Nothing was streaming.
    Ignored,
}

pub struct ConsoleSession<T: Transport> {
    transport: T,
    classifier: Box<dyn CommandClassifier>,
    transcript: ScreenBuffer,
    live_view: ScreenBuffer,
    modes: ModeStack,
    history: CommandHistory,
    input: String,
    decoder: ChunkDecoder,
    state: ConnectionState,
    /// Prompt label echoed into the transcript on submit.
    local_echo: Option<String>,
    closed: bool,
}

impl<T: Transport> ConsoleSession<T> {
    pub fn new(transport: T, classifier: impl CommandClassifier + 'static) -> Self {
        Self {
            transport,
            classifier: Box::new(classifier),
            transcript: ScreenBuffer::new(),
            live_view: ScreenBuffer::new(),
            modes: ModeStack::new(),
            history: CommandHistory::new(),
            input: String::new(),
            decoder: ChunkDecoder::new(),
            state: ConnectionState::Connected,
            local_echo: None,
            closed: false,
        }
    }

    /// Echo `"<prompt> <command>"` into the transcript for every submitted command.
    pub fn with_local_echo(mut self, prompt: impl Into<String>) -> Self {
        self.local_echo = Some(prompt.into());
        self
    }

    pub fn mode(&self) -> ViewMode {
        self.modes.top()
    }

    pub fn modes(&self) -> &ModeStack {
        &self.modes
    }

    pub fn transcript(&self) -> &ScreenBuffer {
        &self.transcript
    }

    pub fn live_view(&self) -> &ScreenBuffer {
        &self.live_view
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Buffer selected by the top of the mode stack.
    pub fn active_buffer(&self) -> &ScreenBuffer {
        match self.modes.top() {
            ViewMode::Main => &self.transcript,
            ViewMode::Stream => &self.live_view,
        }
    }

    fn active_buffer_mut(&mut self) -> &mut ScreenBuffer {
        match self.modes.top() {
            ViewMode::Main => &mut self.transcript,
            ViewMode::Stream => &mut self.live_view,
        }
    }

    pub fn view(&self) -> RenderView<'_> {
        RenderView::new(self.active_buffer(), self.modes.top(), &self.input, &self.state)
    }

    // ------------------------------------------------------------------------
    // Input line
    // ------------------------------------------------------------------------

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn history_previous(&mut self) {
        self.input = self.history.previous().to_string();
    }

    pub fn history_next(&mut self) {
        self.input = self.history.next().to_string();
    }

    /// Submit the input line as a command.
    ///
    /// Streaming commands switch the console to the live view before this returns, so
    /// their first output already lands there.
    pub fn submit(&mut self) -> Result<()> {
        self.ensure_accepting()?;

        let command = std::mem::take(&mut self.input);
        if command.trim().is_empty() {
            self.history.reset_cursor();
        } else {
            self.history.record(command.clone());
        }

        if let Some(prompt) = &self.local_echo {
            if !self.modes.is_streaming() {
                self.transcript.push_line(&format!("{} {}", prompt, command));
            }
        }

        debug!(target: "sandterm::console", "Submitting command: {}", command);
        self.send(&ChannelRequest::command(command.clone()))?;

        if self.classifier.is_streaming(&command) {
            self.live_view.clear();
            self.modes.push_stream();
            info!(target: "sandterm::console", "Entered stream view for: {}", command);
        }
        Ok(())
    }

    /// Cancel the streaming command, if there is one.
    ///
    /// Sends one terminate request, clears the live view and returns to the main view.
    /// In the main view this does nothing.
    pub fn interrupt(&mut self) -> Result<InterruptOutcome> {
        if !self.modes.is_streaming() {
            return Ok(InterruptOutcome::Ignored);
        }

        let sent = match self.ensure_accepting() {
            Ok(()) => self.send(&ChannelRequest::terminate()),
            Err(e) => Err(e),
        };
        self.live_view.clear();
        self.modes.pop_to_base();
        info!(target: "sandterm::console", "Left stream view");

        sent.map(|()| InterruptOutcome::Terminated)
    }

    /// Dispatch a key press from the browser.
    pub fn handle_key(&mut self, key: &str, ctrl: bool) -> Result<()> {
        if ctrl {
            if key.eq_ignore_ascii_case("c") {
                self.interrupt()?;
            }
            return Ok(());
        }

        match key {
            "Enter" => self.submit()?,
            "Backspace" => self.backspace(),
            "ArrowUp" => self.history_previous(),
            "ArrowDown" => self.history_next(),
            _ => {
                if let Some(c) = single_char(key) {
                    self.push_char(c);
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Channel side
    // ------------------------------------------------------------------------

    /// Apply one output chunk to the active buffer.
    ///
    /// An empty chunk clears the active buffer. A malformed chunk is skipped and reported;
    /// the session keeps going.
    pub fn receive(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            self.active_buffer_mut().clear();
            return Ok(());
        }

        let text = match self.decoder.decode(chunk) {
            Ok(text) => text,
            Err(e) => {
                warn!(target: "sandterm::console", "Skipping output chunk ({} bytes): {}", chunk.len(), e);
                return Err(e);
            }
        };
        if text.is_empty() {
            return Ok(());
        }

        let buffer = std::mem::take(self.active_buffer_mut());
        let Interpreted { buffer, display: shown } = interpret(buffer, &text);
        trace!(
            target: "sandterm::console",
            "Applied {} bytes to {:?} buffer ({} lines): {:?}",
            chunk.len(),
            self.modes.top(),
            buffer.len(),
            shown.chars().take(200).collect::<String>()
        );
        *self.active_buffer_mut() = buffer;
        Ok(())
    }

    /// Handle an event from the channel.
    pub fn handle_event(&mut self, event: ChannelEvent) -> Result<()> {
        match event {
            ChannelEvent::Output(data) => self.receive(&data),
            ChannelEvent::Closed => {
                info!(target: "sandterm::console", "Channel closed");
                if self.state.accepts_input() {
                    self.state = ConnectionState::Disconnected;
                }
                Ok(())
            }
            ChannelEvent::Failed(message) => {
                self.fail(message);
                Ok(())
            }
        }
    }

    /// Release the transport. Safe to call more than once; also runs on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.transport.close();
        if self.state.accepts_input() {
            self.state = ConnectionState::Disconnected;
        }
        debug!(target: "sandterm::console", "Console closed");
    }

    fn send(&mut self, request: &ChannelRequest) -> Result<()> {
        if let Err(e) = self.transport.send(request) {
            self.fail(e.to_string());
            return Err(e);
        }
        Ok(())
    }

    fn fail(&mut self, message: String) {
        warn!(target: "sandterm::console", "Channel failed: {}", message);
        self.state = ConnectionState::Failed { message };
    }

    fn ensure_accepting(&self) -> Result<()> {
        match &self.state {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Disconnected => Err(ConsoleError::SessionUnavailable(
                "channel disconnected".to_string(),
            )),
            ConnectionState::Failed { message } => {
                Err(ConsoleError::SessionUnavailable(message.clone()))
            }
        }
    }
}

impl<T: Transport> Drop for ConsoleSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}

fn single_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::AllowList;
    use std::sync::{Arc, Mutex};

    /// Records everything sent; optionally fails every send.
    #[derive(Clone, Default)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<ChannelRequest>>>,
        closes: Arc<Mutex<usize>>,
        broken: bool,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<ChannelRequest> {
            self.sent.lock().unwrap().clone()
        }

        fn terminates(&self) -> usize {
            self.sent()
                .iter()
                .filter(|r| **r == ChannelRequest::terminate())
                .count()
        }

        fn closes(&self) -> usize {
            *self.closes.lock().unwrap()
        }
    }

    impl Transport for RecordingTransport {
        fn send(&mut self, request: &ChannelRequest) -> Result<()> {
            if self.broken {
                return Err(ConsoleError::Transport("broken pipe".to_string()));
            }
            self.sent.lock().unwrap().push(request.clone());
            Ok(())
        }

        fn close(&mut self) {
            *self.closes.lock().unwrap() += 1;
        }
    }

    fn session() -> (ConsoleSession<RecordingTransport>, RecordingTransport) {
        let transport = RecordingTransport::default();
        (ConsoleSession::new(transport.clone(), AllowList::default()), transport)
    }

    fn submit(session: &mut ConsoleSession<RecordingTransport>, command: &str) {
        session.set_input(command);
        session.submit().unwrap();
    }

    #[test]
    fn test_ls_appends_to_transcript() {
        let (mut session, transport) = session();
        submit(&mut session, "ls");
        let before = session.transcript().len();

        session.receive(b"a.txt\nb.txt\n").unwrap();

        assert_eq!(session.transcript().len(), before + 2);
        assert_eq!(&session.transcript().lines()[before..], &["a.txt", "b.txt"]);
        assert_eq!(session.modes().modes(), vec![ViewMode::Main]);
        assert_eq!(transport.sent(), vec![ChannelRequest::command("ls")]);
        assert_eq!(session.input(), "");
    }

    #[test]
    fn test_top_writes_only_live_view() {
        let (mut session, _transport) = session();
        session.receive(b"earlier output\n").unwrap();
        let transcript_before = session.transcript().clone();

        submit(&mut session, "top");
        assert_eq!(session.modes().modes(), vec![ViewMode::Main, ViewMode::Stream]);

        session.receive(b"\x1b[Kload: 0.5").unwrap();
        assert_eq!(session.live_view().line(0), Some("load: 0.5"));
        assert_eq!(session.live_view().len(), 1);
        assert_eq!(session.transcript(), &transcript_before);

        session.receive(b"\x1b[Kload: 0.7").unwrap();
        assert_eq!(session.live_view().lines(), &["load: 0.7"]);
    }

    #[test]
    fn test_interrupt_in_main_is_noop() {
        let (mut session, transport) = session();
        session.receive(b"x\n").unwrap();
        let transcript = session.transcript().clone();

        assert_eq!(session.interrupt().unwrap(), InterruptOutcome::Ignored);
        assert_eq!(session.transcript(), &transcript);
        assert!(session.live_view().is_empty());
        assert_eq!(session.modes().modes(), vec![ViewMode::Main]);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_interrupt_in_stream_terminates_once() {
        let (mut session, transport) = session();
        submit(&mut session, "top");
        session.receive(b"\x1b[H\x1b[2Jtop - 10:00\n").unwrap();
        assert!(!session.live_view().is_empty());

        assert_eq!(session.interrupt().unwrap(), InterruptOutcome::Terminated);
        assert_eq!(session.modes().modes(), vec![ViewMode::Main]);
        assert!(session.live_view().is_empty());
        assert_eq!(transport.terminates(), 1);

        // A second interrupt has nothing left to cancel.
        assert_eq!(session.interrupt().unwrap(), InterruptOutcome::Ignored);
        assert_eq!(transport.terminates(), 1);
    }

    #[test]
    fn test_history_scenario() {
        let (mut session, _transport) = session();
        submit(&mut session, "ls");
        submit(&mut session, "pwd");
        assert_eq!(session.history().cursor(), 2);

        session.history_previous();
        session.history_previous();
        assert_eq!(session.input(), "ls");
        assert_eq!(session.history().cursor(), 0);

        session.history_next();
        assert_eq!(session.input(), "pwd");
        assert_eq!(session.history().cursor(), 1);
        assert_eq!(session.history().entries(), &["ls", "pwd"]);
    }

    #[test]
    fn test_blank_command_sent_but_not_recorded() {
        let (mut session, transport) = session();
        submit(&mut session, "   ");
        assert!(session.history().is_empty());
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn test_local_echo() {
        let transport = RecordingTransport::default();
        let mut session =
            ConsoleSession::new(transport, AllowList::default()).with_local_echo("user@sandbox:~$");
        session.receive(b"$ ").unwrap();
        submit(&mut session, "ls");
        session.receive(b"a.txt\n").unwrap();
        assert_eq!(session.transcript().lines(), &["$ ", "user@sandbox:~$ ls", "a.txt"]);
    }

    #[test]
    fn test_empty_chunk_clears_active_buffer() {
        let (mut session, _transport) = session();
        session.receive(b"one\ntwo\n").unwrap();
        session.receive(b"").unwrap();
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_malformed_chunk_skipped() {
        let (mut session, _transport) = session();
        session.receive(b"good\n").unwrap();
        let err = session.receive(&[0xFF, 0xFE, b'\n']).unwrap_err();
        assert!(matches!(err, ConsoleError::MalformedChunk(_)));
        assert_eq!(session.transcript().lines(), &["good"]);
        assert_eq!(session.state(), &ConnectionState::Connected);

        session.receive(b"still here\n").unwrap();
        assert_eq!(session.transcript().lines(), &["good", "still here"]);
    }

    #[test]
    fn test_split_chunks_match_whole_chunk() {
        let whole = "\x1b[2Jhead caf\u{e9}\nnext\n\x1b[3;2H\x1b(Bmore\n";
        let (mut expected, _t1) = session();
        expected.receive(whole.as_bytes()).unwrap();

        let bytes = whole.as_bytes();
        for split in 1..bytes.len() {
            let (mut split_session, _t2) = session();
            split_session.receive(&bytes[..split]).unwrap();
            split_session.receive(&bytes[split..]).unwrap();
            assert_eq!(
                split_session.transcript().lines(),
                expected.transcript().lines(),
                "split at {}",
                split
            );
        }
    }

    #[test]
    fn test_transport_failure_stops_input() {
        let transport = RecordingTransport {
            broken: true,
            ..Default::default()
        };
        let mut session = ConsoleSession::new(transport, AllowList::default());
        session.set_input("ls");
        assert!(session.submit().is_err());
        assert!(matches!(session.state(), ConnectionState::Failed { .. }));

        session.set_input("pwd");
        let err = session.submit().unwrap_err();
        assert!(matches!(err, ConsoleError::SessionUnavailable(_)));
    }

    #[test]
    fn test_channel_events() {
        let (mut session, _transport) = session();
        session.handle_event(ChannelEvent::Output(b"hi\n".to_vec())).unwrap();
        assert_eq!(session.transcript().lines(), &["hi"]);

        session.handle_event(ChannelEvent::Closed).unwrap();
        assert_eq!(session.state(), &ConnectionState::Disconnected);

        session.handle_event(ChannelEvent::Failed("reset".into())).unwrap();
        assert_eq!(
            session.state(),
            &ConnectionState::Failed { message: "reset".into() }
        );
        assert!(!session.view().state().accepts_input());
    }

    #[test]
    fn test_handle_key_dispatch() {
        let (mut session, transport) = session();
        for key in ["l", "s", "x"] {
            session.handle_key(key, false).unwrap();
        }
        session.handle_key("Backspace", false).unwrap();
        session.handle_key("Shift", false).unwrap();
        assert_eq!(session.input(), "ls");

        session.handle_key("Enter", false).unwrap();
        assert_eq!(transport.sent(), vec![ChannelRequest::command("ls")]);

        session.handle_key("ArrowUp", false).unwrap();
        assert_eq!(session.input(), "ls");
        session.handle_key("ArrowDown", false).unwrap();
        assert_eq!(session.input(), "");

        session.set_input("vim notes");
        session.handle_key("Enter", false).unwrap();
        assert_eq!(session.mode(), ViewMode::Stream);
        session.handle_key("c", true).unwrap();
        assert_eq!(session.mode(), ViewMode::Main);
        assert_eq!(transport.terminates(), 1);
    }

    #[test]
    fn test_injected_classifier() {
        let transport = RecordingTransport::default();
        let mut session =
            ConsoleSession::new(transport, |cmd: &str| cmd.starts_with("tail -f"));
        session.set_input("top");
        session.submit().unwrap();
        assert_eq!(session.mode(), ViewMode::Main);

        session.set_input("tail -f app.log");
        session.submit().unwrap();
        assert_eq!(session.mode(), ViewMode::Stream);
    }

    #[test]
    fn test_close_is_idempotent_and_runs_on_drop() {
        let (mut session, transport) = session();
        session.close();
        session.close();
        assert_eq!(transport.closes(), 1);
        drop(session);
        assert_eq!(transport.closes(), 1);

        let (session, transport) = self::session();
        drop(session);
        assert_eq!(transport.closes(), 1);
    }
}
