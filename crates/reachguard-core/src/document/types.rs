//! Shared document types: node identity, geometry and presentation overrides.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Native tags that act as interactive controls.
const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea", "summary", "option"];

/// ARIA roles that act as interactive controls.
const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "checkbox", "radio", "menuitem", "tab", "option", "switch", "treeitem",
];

/// Stable identity of a node within one document handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to an element plus a snapshot of its structural role tags.
///
/// The document owns the node; an `ElementRef` is only meaningful against
/// the document that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    pub node: NodeId,
    pub parent: Option<NodeId>,
    /// Tag name (lowercase).
    pub tag: String,
    /// Element `id` attribute.
    pub dom_id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    /// ARIA role attribute.
    pub role: Option<String>,
    /// `type` attribute (inputs and buttons).
    pub input_type: Option<String>,
}

impl ElementRef {
    pub fn new(node: NodeId, tag: impl Into<String>) -> Self {
        Self {
            node,
            parent: None,
            tag: tag.into().to_ascii_lowercase(),
            dom_id: None,
            classes: Vec::new(),
            role: None,
            input_type: None,
        }
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.dom_id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Whether this element is an interactive control by tag or ARIA role.
    pub fn is_interactive(&self) -> bool {
        if self.tag == "input" && self.input_type.as_deref() == Some("hidden") {
            return false;
        }
        if INTERACTIVE_TAGS.contains(&self.tag.as_str()) {
            return true;
        }
        self.role
            .as_deref()
            .is_some_and(|role| INTERACTIVE_ROLES.contains(&role))
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        if let Some(ref id) = self.dom_id {
            write!(f, "#{}", id)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        if let Some(ref role) = self.role {
            write!(f, " role={}", role)?;
        }
        write!(f, "> {}", self.node)
    }
}

/// Viewport information for coordinate calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportInfo {
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Device pixel ratio.
    pub device_pixel_ratio: f64,
    /// Scroll X offset.
    pub scroll_x: f64,
    /// Scroll Y offset.
    pub scroll_y: f64,
}

impl Default for ViewportInfo {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            device_pixel_ratio: 1.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

impl ViewportInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Whether a viewport-relative point lies inside the viewport.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f64 && y < self.height as f64
    }
}

/// Bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Check if a point is inside this bounding box.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Get the center point of this bounding box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Zero width or zero height: the element is not laid out.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// CSS `position` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    pub fn as_css(&self) -> &'static str {
        match self {
            Position::Static => "static",
            Position::Relative => "relative",
            Position::Absolute => "absolute",
            Position::Fixed => "fixed",
            Position::Sticky => "sticky",
        }
    }

    /// Parse a computed `position` value. Unknown values read as `static`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "relative" => Position::Relative,
            "absolute" => Position::Absolute,
            "fixed" => Position::Fixed,
            "sticky" | "-webkit-sticky" => Position::Sticky,
            _ => Position::Static,
        }
    }
}

/// CSS `pointer-events` values relevant to hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerEvents {
    Auto,
    None,
}

impl PointerEvents {
    pub fn as_css(&self) -> &'static str {
        match self {
            PointerEvents::Auto => "auto",
            PointerEvents::None => "none",
        }
    }
}

/// Computed `z-index` of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZIndex {
    Auto,
    Value(i64),
}

impl ZIndex {
    /// Parse a computed `z-index` value; anything non-numeric reads as `auto`.
    pub fn parse(value: &str) -> Self {
        value
            .trim()
            .parse::<i64>()
            .map(ZIndex::Value)
            .unwrap_or(ZIndex::Auto)
    }
}

impl fmt::Display for ZIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZIndex::Auto => f.write_str("auto"),
            ZIndex::Value(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for ZIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ZIndex::Auto => serializer.serialize_str("auto"),
            ZIndex::Value(v) => serializer.serialize_i64(*v),
        }
    }
}

/// Presentation override written by the layering pipeline.
///
/// `None` fields leave the document's own value in effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub z_index: Option<i64>,
    pub position: Option<Position>,
    pub pointer_events: Option<PointerEvents>,
}

impl Presentation {
    pub fn is_empty(&self) -> bool {
        self.z_index.is_none() && self.position.is_none() && self.pointer_events.is_none()
    }
}

/// A screen-anchored container created for remediation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySpec {
    /// DOM id of the container.
    pub panel_id: String,
    pub z_index: i64,
    /// Offset from the top of the viewport.
    pub top: f64,
    /// Offset from the right edge of the viewport.
    pub right: f64,
    /// Spacing around and between children.
    pub gap: f64,
    /// Pointer policy of the container itself; children set their own.
    pub pointer_events: PointerEvents,
}
