//! Core value types shared across the pipeline.
//!
//! The four thumbnail variants form a fixed style/orientation grid. Instead of
//! addressing them by concatenated string keys, [`Slot`] is a two-field tagged
//! value and [`SlotMap`] holds exactly one entry per slot, so "all four keys
//! are always present" holds by construction.

use serde::{Deserialize, Serialize};

/// Tone axis of a synthesized thumbnail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    Normal,
    Clickbait,
}

impl Style {
    pub const ALL: [Style; 2] = [Style::Normal, Style::Clickbait];

    /// Lowercase label used in filenames and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Style::Normal => "normal",
            Style::Clickbait => "clickbait",
        }
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Framing axis. Vertical variants are always derived from horizontal ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Aspect-ratio directive understood by the image model.
    pub fn ratio(&self) -> &'static str {
        match self {
            Orientation::Horizontal => "16:9",
            Orientation::Vertical => "9:16",
        }
    }

    /// Filename-safe form of the ratio.
    pub fn ratio_slug(&self) -> &'static str {
        match self {
            Orientation::Horizontal => "16-9",
            Orientation::Vertical => "9-16",
        }
    }
}

/// One cell of the style/orientation grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub style: Style,
    pub orientation: Orientation,
}

impl Slot {
    pub const ALL: [Slot; 4] = [
        Slot { style: Style::Normal, orientation: Orientation::Horizontal },
        Slot { style: Style::Clickbait, orientation: Orientation::Horizontal },
        Slot { style: Style::Normal, orientation: Orientation::Vertical },
        Slot { style: Style::Clickbait, orientation: Orientation::Vertical },
    ];

    pub fn new(style: Style, orientation: Orientation) -> Self {
        Self { style, orientation }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.style, self.orientation.ratio())
    }
}

/// Fixed map with exactly one value per [`Slot`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotMap<T> {
    pub normal: T,
    pub clickbait: T,
    pub normal_vertical: T,
    pub clickbait_vertical: T,
}

impl<T> SlotMap<T> {
    /// Builds a map by evaluating `f` once per slot.
    pub fn from_fn(mut f: impl FnMut(Slot) -> T) -> Self {
        Self {
            normal: f(Slot::ALL[0]),
            clickbait: f(Slot::ALL[1]),
            normal_vertical: f(Slot::ALL[2]),
            clickbait_vertical: f(Slot::ALL[3]),
        }
    }

    pub fn get(&self, slot: Slot) -> &T {
        match (slot.style, slot.orientation) {
            (Style::Normal, Orientation::Horizontal) => &self.normal,
            (Style::Clickbait, Orientation::Horizontal) => &self.clickbait,
            (Style::Normal, Orientation::Vertical) => &self.normal_vertical,
            (Style::Clickbait, Orientation::Vertical) => &self.clickbait_vertical,
        }
    }

    pub fn get_mut(&mut self, slot: Slot) -> &mut T {
        match (slot.style, slot.orientation) {
            (Style::Normal, Orientation::Horizontal) => &mut self.normal,
            (Style::Clickbait, Orientation::Horizontal) => &mut self.clickbait,
            (Style::Normal, Orientation::Vertical) => &mut self.normal_vertical,
            (Style::Clickbait, Orientation::Vertical) => &mut self.clickbait_vertical,
        }
    }

    /// Iterates all four slots in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &T)> {
        Slot::ALL.iter().map(move |slot| (*slot, self.get(*slot)))
    }

    /// Maps every value, preserving slot positions.
    pub fn map<U>(&self, mut f: impl FnMut(Slot, &T) -> U) -> SlotMap<U> {
        SlotMap::from_fn(|slot| f(slot, self.get(slot)))
    }
}

/// Working-resolution images for one completed generation.
pub type ThumbnailSet = SlotMap<String>;

impl ThumbnailSet {
    /// True when every slot holds a non-empty payload.
    pub fn is_complete(&self) -> bool {
        self.iter().all(|(_, payload)| !payload.is_empty())
    }
}

/// User input admitted by the usage gate. Immutable once submitted.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    pub video_url: String,
    pub additional_context: String,
    /// Normalized base64 reference images, in upload order.
    pub reference_images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_map_holds_all_four_slots() {
        let set = ThumbnailSet::from_fn(|slot| slot.to_string());
        let slots: Vec<Slot> = set.iter().map(|(slot, _)| slot).collect();
        assert_eq!(slots, Slot::ALL.to_vec());
        assert_eq!(set.get(Slot::new(Style::Clickbait, Orientation::Vertical)), "clickbait 9:16");
    }

    #[test]
    fn completeness_requires_every_slot() {
        let mut set = ThumbnailSet::from_fn(|_| "img".to_string());
        assert!(set.is_complete());
        set.normal_vertical.clear();
        assert!(!set.is_complete());
    }

    #[test]
    fn get_mut_targets_one_slot_only() {
        let mut set = ThumbnailSet::default();
        *set.get_mut(Slot::new(Style::Normal, Orientation::Horizontal)) = "a".into();
        assert_eq!(set.normal, "a");
        assert!(set.clickbait.is_empty());
        assert!(set.normal_vertical.is_empty());
    }
}
