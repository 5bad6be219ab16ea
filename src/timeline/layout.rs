use super::TimelineError;
use std::fmt;
use std::str::FromStr;

/// Position along a box, measured from its top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    /// Fraction of the box height.
    Fraction(f32),
}

impl Edge {
    fn offset(self, height: f32) -> f32 {
        match self {
            Self::Top => 0.0,
            Self::Center => height * 0.5,
            Self::Bottom => height,
            Self::Fraction(fraction) => height * fraction,
        }
    }
}

impl FromStr for Edge {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            _ => s
                .strip_suffix('%')
                .and_then(|percent| percent.parse::<f32>().ok())
                .filter(|percent| percent.is_finite())
                .map(|percent| Self::Fraction(percent / 100.0))
                .ok_or_else(|| TimelineError::InvalidAnchor(s.to_string())),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("top"),
            Self::Center => f.write_str("center"),
            Self::Bottom => f.write_str("bottom"),
            Self::Fraction(fraction) => write!(f, "{}%", fraction * 100.0),
        }
    }
}

/// "`<element edge> <viewport edge>`": the scroll offset at which the trigger
/// region's edge meets the viewport's edge, e.g. `"top bottom"`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Anchor {
    pub element: Edge,
    pub viewport: Edge,
}

impl FromStr for Anchor {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(element), Some(viewport), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(TimelineError::InvalidAnchor(s.to_string()));
        };
        Ok(Self {
            element: element.parse()?,
            viewport: viewport.parse()?,
        })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

impl TryFrom<String> for Anchor {
    type Error = TimelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Anchor> for String {
    fn from(anchor: Anchor) -> Self {
        anchor.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageRegion {
    pub name: String,
    pub top: f32,
    pub height: f32,
}

/// Vertical page geometry in CSS pixels.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageLayout {
    pub page_height: f32,
    pub viewport_height: f32,
    pub regions: Vec<PageRegion>,
}

impl PageLayout {
    pub fn max_scroll(&self) -> f32 {
        (self.page_height - self.viewport_height).max(0.0)
    }

    pub fn region(&self, name: &str) -> Option<&PageRegion> {
        self.regions.iter().find(|region| region.name == name)
    }

    /// Scroll progress in [0, 1] for a pixel offset.
    pub fn progress_at(&self, scroll_y: f32) -> f32 {
        let max = self.max_scroll();
        if max <= 0.0 {
            0.0
        } else {
            (scroll_y / max).clamp(0.0, 1.0)
        }
    }

    /// Converts an anchor on `trigger` to a progress fraction. The result is
    /// not clamped; anchors may sit before the top or past the end of the page.
    pub fn resolve(&self, trigger: &str, anchor: Anchor) -> Result<f32, TimelineError> {
        let region = self
            .region(trigger)
            .ok_or_else(|| TimelineError::UnknownRegion(trigger.to_string()))?;
        let max = self.max_scroll();
        if max <= 0.0 {
            return Err(TimelineError::NotScrollable {
                page_height: self.page_height,
                viewport_height: self.viewport_height,
            });
        }
        let scroll_y = region.top + anchor.element.offset(region.height)
            - anchor.viewport.offset(self.viewport_height);
        Ok(scroll_y / max)
    }

    pub fn with_viewport_height(&self, viewport_height: f32) -> Self {
        Self {
            viewport_height,
            ..self.clone()
        }
    }
}
