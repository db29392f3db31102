//! # Physical and Touch Controls
//!
//! The control surface of the remote: physical button mappings, slider
//! gesture mappings, and multi-page touch screen layouts.
//!
//! A [`TouchButtonPage`] is the canonical "variable tail" case. Firmware
//! indexes the page array by stride alone, so every page record must be the
//! same size — a count and an offset — while the buttons each page owns are
//! laid out after the whole page array as trailing data.

use crate::image::RemoteImage;
use crate::pack::{EntityId, OffsetTable, Package, Packable, Ref, TextBlob};

/// Maps an exact physical button state to an event.
///
/// Fires when the pressed-button bitmask equals `mask` — equality, not
/// subset match, so chords and single presses are distinct mappings.
pub struct ButtonMapping {
    id: EntityId,
    mask: u32,
    event: Ref,
}

impl ButtonMapping {
    pub fn new(mask: u32, event: EntityId) -> Self {
        ButtonMapping {
            id: EntityId::fresh(),
            mask,
            event: Ref::to(event),
        }
    }
}

impl Packable for ButtonMapping {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("ButtonMapping {:08x}", self.mask)
    }

    fn size(&self) -> u32 {
        8
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = self.describe();
        self.event.resolve(table, &owner, "event");
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.mask.to_le_bytes());
        out.extend_from_slice(&self.event.offset().to_le_bytes());
    }
}

/// Slider gestures recognised by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    None = 0,
    Tap = 1,
    DragLeft = 2,
    DragRight = 3,
    SwipeLeft = 4,
    SwipeRight = 5,
}

/// Maps a slider gesture to an event.
pub struct GestureMapping {
    id: EntityId,
    gesture: Gesture,
    event: Ref,
}

impl GestureMapping {
    pub fn new(gesture: Gesture, event: EntityId) -> Self {
        GestureMapping {
            id: EntityId::fresh(),
            gesture,
            event: Ref::to(event),
        }
    }
}

impl Packable for GestureMapping {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("GestureMapping {:?}", self.gesture)
    }

    fn size(&self) -> u32 {
        8
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = self.describe();
        self.event.resolve(table, &owner, "event");
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.gesture as u32).to_le_bytes());
        out.extend_from_slice(&self.event.offset().to_le_bytes());
    }
}

/// A touch screen button: geometry, colour, flags, an event, an optional
/// interned label and up to two images. 28 bytes on the wire.
pub struct TouchButton {
    id: EntityId,
    name: String,
    event: Ref,
    text: Ref,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    colour: u16,
    flags: u16,
    image_refs: [Ref; 2],
    label: Option<TextBlob>,
    images: Vec<RemoteImage>,
}

impl TouchButton {
    /// Fire on press rather than on release.
    pub const PRESS_ACTIVATE: u16 = 0x0001;
    /// Centre the label inside the button rectangle.
    pub const CENTRE_TEXT: u16 = 0x0002;
    /// Draw no border.
    pub const NO_BORDER: u16 = 0x0004;
    /// Draw no fill.
    pub const NO_FILL: u16 = 0x0008;

    pub fn new(name: &str, x: u16, y: u16, width: u16, height: u16) -> Self {
        TouchButton {
            id: EntityId::fresh(),
            name: name.to_string(),
            event: Ref::null(),
            text: Ref::null(),
            x,
            y,
            width,
            height,
            colour: 0xFFFF,
            flags: 0,
            image_refs: [Ref::null(), Ref::null()],
            label: None,
            images: Vec::new(),
        }
    }

    pub fn event(mut self, event: EntityId) -> Self {
        self.event = Ref::to(event);
        self
    }

    /// Set the label. The text is interned into the blob pool when the
    /// button is appended.
    pub fn label(mut self, text: &str) -> Self {
        let blob = TextBlob::text(text);
        self.text = Ref::to(blob.id());
        self.label = Some(blob);
        self
    }

    pub fn colour(mut self, colour: u16) -> Self {
        self.colour = colour;
        self
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    /// Attach an image. The first call fills the primary slot, the second
    /// the secondary; further calls are ignored.
    pub fn image(mut self, image: RemoteImage) -> Self {
        if self.images.len() < 2 {
            self.image_refs[self.images.len()] = Ref::to(image.id());
            self.images.push(image);
        }
        self
    }

    /// Strip the owned images so the page can lay them out after its
    /// uniform button array.
    pub(crate) fn take_images(&mut self) -> Vec<RemoteImage> {
        std::mem::take(&mut self.images)
    }
}

impl Packable for TouchButton {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("TouchButton '{}'", self.name)
    }

    fn size(&self) -> u32 {
        28
    }

    fn enqueue_children(&mut self, package: &mut Package) {
        if let Some(blob) = self.label.take() {
            package.append_text(blob);
        }
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = self.describe();
        self.event.resolve(table, &owner, "event");
        self.text.resolve(table, &owner, "text");
        self.image_refs[0].resolve(table, &owner, "image 1");
        self.image_refs[1].resolve(table, &owner, "image 2");
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.event.offset().to_le_bytes());
        out.extend_from_slice(&self.text.offset().to_le_bytes());
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.colour.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.image_refs[0].offset().to_le_bytes());
        out.extend_from_slice(&self.image_refs[1].offset().to_le_bytes());
    }
}

/// One page of touch buttons: a fixed `{count, offset}` record regardless
/// of how many buttons the page holds.
pub struct TouchButtonPage {
    id: EntityId,
    name: String,
    count: usize,
    buttons: Ref,
    pending: Vec<TouchButton>,
}

impl TouchButtonPage {
    pub fn new(name: &str, buttons: Vec<TouchButton>) -> Self {
        let first = buttons.first().map(|b| b.id());
        TouchButtonPage {
            id: EntityId::fresh(),
            name: name.to_string(),
            count: buttons.len(),
            buttons: first.map(Ref::to).unwrap_or_default(),
            pending: buttons,
        }
    }

    /// Append this page's buttons, then their images, as trailing data.
    /// Called by the owning activity after every page record is laid out.
    pub(crate) fn enqueue_buttons(buttons: Vec<TouchButton>, package: &mut Package) {
        let mut images = Vec::new();
        for mut button in buttons {
            images.extend(button.take_images());
            package.append(Box::new(button));
        }
        for image in images {
            package.append(Box::new(image));
        }
    }

    pub(crate) fn take_buttons(&mut self) -> Vec<TouchButton> {
        std::mem::take(&mut self.pending)
    }
}

impl Packable for TouchButtonPage {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("TouchButtonPage '{}'", self.name)
    }

    fn size(&self) -> u32 {
        8
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = self.describe();
        self.buttons.resolve(table, &owner, "touch buttons array");
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.count as i32).to_le_bytes());
        out.extend_from_slice(&self.buttons.offset().to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_mapping_layout() {
        let mut mapping = ButtonMapping::new(0x0001_0000, EntityId::fresh());
        mapping.event = Ref::null();
        let mut out = Vec::new();
        mapping.encode(&mut out);
        assert_eq!(out.len(), 8);
        assert_eq!(&out[0..4], &0x0001_0000u32.to_le_bytes());
    }

    #[test]
    fn test_touch_button_is_28_bytes() {
        let button = TouchButton::new("vol+", 0, 0, 60, 40)
            .colour(0x07E0)
            .flags(TouchButton::PRESS_ACTIVATE | TouchButton::CENTRE_TEXT);
        let mut out = Vec::new();
        button.encode(&mut out);
        assert_eq!(out.len(), 28);
        // flags at bytes 18..20
        assert_eq!(&out[18..20], &0x0003u16.to_le_bytes());
    }

    #[test]
    fn test_empty_page_encodes_zero_count_and_offset() {
        let page = TouchButtonPage::new("blank", Vec::new());
        let mut out = Vec::new();
        page.encode(&mut out);
        assert_eq!(out, vec![0; 8]);
    }

    #[test]
    fn test_gesture_tags() {
        assert_eq!(Gesture::SwipeRight as u32, 5);
        assert_eq!(Gesture::Tap as u32, 1);
    }
}
