use crate::event::{
  CalendarEvent,
  EventKind,
  EventStatus
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Tone {
  Blue,
  Green,
  Purple,
  Orange,
  Yellow,
  Red,
  Gray
}

/// Token for anything the classifier
/// does not recognize.
pub const FALLBACK_TONE: Tone =
  Tone::Gray;
pub const FALLBACK_ICON: EventIcon =
  EventIcon::Calendar;

impl Tone {
  #[must_use]
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Blue => "blue",
      | Self::Green => "green",
      | Self::Purple => "purple",
      | Self::Orange => "orange",
      | Self::Yellow => "yellow",
      | Self::Red => "red",
      | Self::Gray => "gray"
    }
  }

  /// SGR foreground code for terminal
  /// output.
  #[must_use]
  pub fn ansi_code(
    self
  ) -> &'static str {
    match self {
      | Self::Blue => "34",
      | Self::Green => "32",
      | Self::Purple => "35",
      | Self::Orange => "38;5;208",
      | Self::Yellow => "33",
      | Self::Red => "31",
      | Self::Gray => "90"
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum EventIcon {
  Phone,
  Video,
  Calendar
}

impl EventIcon {
  #[must_use]
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Phone => "phone",
      | Self::Video => "video",
      | Self::Calendar => "calendar"
    }
  }

  /// Single-column glyph used by the
  /// terminal renderer.
  #[must_use]
  pub fn glyph(self) -> &'static str {
    match self {
      | Self::Phone => "T",
      | Self::Video => "V",
      | Self::Calendar => "*"
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct Presentation {
  pub type_color:   Tone,
  pub status_color: Tone,
  pub icon:         EventIcon
}

#[must_use]
pub fn classify(
  event: &CalendarEvent
) -> Presentation {
  Presentation {
    type_color:   type_color(
      &event.kind
    ),
    status_color: status_color(
      &event.status
    ),
    icon:         icon_for(&event.kind)
  }
}

#[must_use]
pub fn type_color(
  kind: &EventKind
) -> Tone {
  match kind {
    | EventKind::Demo => Tone::Blue,
    | EventKind::Call => Tone::Green,
    | EventKind::Discovery => {
      Tone::Purple
    }
    | EventKind::Meeting => {
      Tone::Orange
    }
    | EventKind::Other
    | EventKind::Unrecognized(_) => {
      FALLBACK_TONE
    }
  }
}

#[must_use]
pub fn status_color(
  status: &EventStatus
) -> Tone {
  match status {
    | EventStatus::Confirmed => {
      Tone::Green
    }
    | EventStatus::Pending => {
      Tone::Yellow
    }
    | EventStatus::Cancelled => {
      Tone::Red
    }
    | EventStatus::Unrecognized(_) => {
      FALLBACK_TONE
    }
  }
}

#[must_use]
pub fn icon_for(
  kind: &EventKind
) -> EventIcon {
  match kind {
    | EventKind::Call => {
      EventIcon::Phone
    }
    | EventKind::Demo
    | EventKind::Meeting => {
      EventIcon::Video
    }
    | EventKind::Discovery
    | EventKind::Other
    | EventKind::Unrecognized(_) => {
      FALLBACK_ICON
    }
  }
}
