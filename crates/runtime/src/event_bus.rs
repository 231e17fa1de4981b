use crate::frame::Frame;

/// Things the globe loop reports back to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobeEvent {
    SpinPaused,
    SpinResumed,
    /// Hover moved to a marker (`Some(uri)`) or off all markers (`None`).
    HoverChanged { uri: Option<String> },
    /// A non-drag click landed on a marker; the host opens `url`.
    OpenUrl { url: String },
    MarkersRebuilt { count: usize },
}

impl GlobeEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GlobeEvent::SpinPaused => "spin_paused",
            GlobeEvent::SpinResumed => "spin_resumed",
            GlobeEvent::HoverChanged { .. } => "hover_changed",
            GlobeEvent::OpenUrl { .. } => "open_url",
            GlobeEvent::MarkersRebuilt { .. } => "markers_rebuilt",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub frame_index: u64,
    pub event: GlobeEvent,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, frame: Frame, event: GlobeEvent) {
        tracing::trace!(frame = frame.index, kind = event.kind(), "globe event");
        self.events.push(Event {
            frame_index: frame.index,
            event,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
