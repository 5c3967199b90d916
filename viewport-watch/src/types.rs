use core::fmt;

/// Horizontal scroll direction since the last completed notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DirectionX {
    Left,
    Right,
    #[default]
    None,
}

/// Vertical scroll direction since the last completed notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DirectionY {
    Up,
    Down,
    #[default]
    None,
}

/// A scroll position in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Raw box geometry reported by a [`crate::Host`].
///
/// For the whole document this is the window's inner size and page offsets; for an element it is
/// the element's offset box and its own scroll offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metrics {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Metrics {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.scroll_x, self.scroll_y)
    }
}

/// A snapshot of the viewport handed to every observer on a notification.
///
/// With `feature = "serde"` this serializes as
/// `{ width, height, positionX, positionY, directionX, directionY }`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ViewportState {
    pub width: f64,
    pub height: f64,
    pub position_x: f64,
    pub position_y: f64,
    pub direction_x: DirectionX,
    pub direction_y: DirectionY,
}

impl ViewportState {
    /// Builds a state from raw geometry, inferring direction against `last`.
    pub fn from_metrics(metrics: Metrics, last: Position) -> Self {
        Self {
            width: metrics.width,
            height: metrics.height,
            position_x: metrics.scroll_x,
            position_y: metrics.scroll_y,
            direction_x: DirectionX::infer(last.x, metrics.scroll_x),
            direction_y: DirectionY::infer(last.y, metrics.scroll_y),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.position_x, self.position_y)
    }

    pub fn is_moving(&self) -> bool {
        self.direction_x != DirectionX::None || self.direction_y != DirectionY::None
    }
}

/// The observed scrollable region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Container<E> {
    /// The document's top-level scrolling area (window metrics).
    Document,
    /// A specific scrollable element.
    Element(E),
}

impl<E> Container<E> {
    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document)
    }

    pub fn element(&self) -> Option<&E> {
        match self {
            Self::Document => None,
            Self::Element(e) => Some(e),
        }
    }
}

/// Native events the controller subscribes to on the global event target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeEvent {
    Scroll,
    Resize,
}

impl NativeEvent {
    pub const ALL: [Self; 2] = [Self::Scroll, Self::Resize];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Resize => "resize",
        }
    }
}

impl fmt::Display for NativeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document loading state as reported by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadyState {
    #[default]
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn is_loading(self) -> bool {
        self == Self::Loading
    }
}

/// What a structural-change watch reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationOptions {
    pub attributes: bool,
    pub child_list: bool,
    pub subtree: bool,
}

impl MutationOptions {
    /// Attribute changes and child insertions/removals anywhere in the document.
    pub const DOCUMENT: Self = Self {
        attributes: true,
        child_list: true,
        subtree: true,
    };
}

/// Lifecycle of the controller's structural-change watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchPhase {
    /// Waiting for the document to become ready.
    Pending,
    Active,
    /// The host refused the deferred watch.
    Failed,
    /// The controller was destroyed.
    Released,
}
