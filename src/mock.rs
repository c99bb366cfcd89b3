//! Recording collaborators for tests.
//!
//! Transport and feedback can share one [`Journal`] so tests can assert the
//! relative order of HID and display calls (e.g. release before a mode's
//! display is loaded).

use crate::controller::{RawInputFrame, Sampler, SamplerError};
use crate::feedback::{Feedback, Rgbw};
use crate::hid::{ConsumerCode, HidTransport, KeyCode, MouseButton, TransportError};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

pub type Journal = Rc<RefCell<Vec<String>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HidCall {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    ReleaseAll,
    Consumer(ConsumerCode),
    MouseMove(i32, i32),
    MouseButton(MouseButton, bool),
}

#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub calls: Vec<HidCall>,
    /// Every call fails with `Unavailable` while set
    pub unavailable: bool,
    /// Number of upcoming calls to reject
    pub fail_next: usize,
    pub journal: Option<Journal>,
}

impl RecordingTransport {
    pub fn with_journal(journal: &Journal) -> Self {
        Self {
            journal: Some(journal.clone()),
            ..Default::default()
        }
    }

    pub fn take(&mut self) -> Vec<HidCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, call: &HidCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    fn record(&mut self, call: HidCall) -> Result<(), TransportError> {
        if self.unavailable {
            return Err(TransportError::Unavailable);
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(TransportError::Rejected("scripted failure".to_string()));
        }
        if let Some(journal) = &self.journal {
            journal.borrow_mut().push(format!("hid:{:?}", call));
        }
        self.calls.push(call);
        Ok(())
    }
}

impl HidTransport for RecordingTransport {
    fn send_key(&mut self, code: KeyCode) -> Result<(), TransportError> {
        self.record(HidCall::KeyDown(code))
    }

    fn release_key(&mut self, code: KeyCode) -> Result<(), TransportError> {
        self.record(HidCall::KeyUp(code))
    }

    fn release_all(&mut self) -> Result<(), TransportError> {
        self.record(HidCall::ReleaseAll)
    }

    fn send_consumer(&mut self, code: ConsumerCode) -> Result<(), TransportError> {
        self.record(HidCall::Consumer(code))
    }

    fn move_mouse(&mut self, dx: i32, dy: i32) -> Result<(), TransportError> {
        self.record(HidCall::MouseMove(dx, dy))
    }

    fn set_mouse_button(&mut self, button: MouseButton, down: bool) -> Result<(), TransportError> {
        self.record(HidCall::MouseButton(button, down))
    }
}

#[derive(Debug, Default)]
pub struct RecordingFeedback {
    pub pixels: HashMap<usize, Rgbw>,
    pub texts: Vec<(String, String)>,
    pub rotations: Vec<u16>,
    pub tones: Vec<Option<u32>>,
    pub flashes: usize,
    pub journal: Option<Journal>,
}

impl RecordingFeedback {
    pub fn with_journal(journal: &Journal) -> Self {
        Self {
            journal: Some(journal.clone()),
            ..Default::default()
        }
    }

    pub fn pixel(&self, index: usize) -> Option<Rgbw> {
        self.pixels.get(&index).copied()
    }

    pub fn last_text(&self) -> Option<(&str, &str)> {
        self.texts
            .last()
            .map(|(title, body)| (title.as_str(), body.as_str()))
    }
}

impl Feedback for RecordingFeedback {
    fn set_pixel(&mut self, index: usize, color: Rgbw) {
        self.pixels.insert(index, color);
    }

    fn show_display_text(&mut self, title: &str, body: &str) {
        if let Some(journal) = &self.journal {
            journal
                .borrow_mut()
                .push(format!("display:{}/{}", title, body));
        }
        self.texts.push((title.to_string(), body.to_string()));
    }

    fn set_display_rotation(&mut self, degrees: u16) {
        self.rotations.push(degrees);
    }

    fn start_tone(&mut self, hz: u32) {
        self.tones.push(Some(hz));
    }

    fn stop_tone(&mut self) {
        self.tones.push(None);
    }

    fn flash(&mut self, _color: Rgbw, _times: u8) {
        self.flashes += 1;
    }
}

/// Replays a fixed list of poll results, then empty frames
#[derive(Debug, Default)]
pub struct ScriptedSampler {
    pub frames: VecDeque<Result<RawInputFrame, SamplerError>>,
    pub polls: usize,
}

impl ScriptedSampler {
    pub fn new(frames: impl IntoIterator<Item = Result<RawInputFrame, SamplerError>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            polls: 0,
        }
    }
}

impl Sampler for ScriptedSampler {
    fn poll(&mut self) -> Result<RawInputFrame, SamplerError> {
        self.polls += 1;
        self.frames
            .pop_front()
            .unwrap_or_else(|| Ok(RawInputFrame::default()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
