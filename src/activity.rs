//! # Activities
//!
//! An [`Activity`] is one mode of the remote ("watch TV", "listen to
//! records"): the button mappings, gesture mappings and touch button pages
//! that are live while it is selected, plus the device states it expects.
//!
//! All four child collections are variable-length, so each is packed as an
//! independently counted contiguous array directly after the activity
//! record, with each array's own variable-size data (page buttons, state
//! value arrays) following after all of them.

use crate::device::{Device, DeviceState};
use crate::pack::{ByteArray, EntityId, OffsetTable, Package, Packable, Ref};
use crate::ui::{ButtonMapping, Gesture, GestureMapping, TouchButton, TouchButtonPage};

/// One mode of the remote, with its controls and expected device states.
pub struct Activity {
    id: EntityId,
    name: String,
    flags: u32,
    mappings: Vec<ButtonMapping>,
    gestures: Vec<GestureMapping>,
    pages: Vec<TouchButtonPage>,
    states: Vec<DeviceState>,
    mappings_ref: Ref,
    gestures_ref: Ref,
    pages_ref: Ref,
    states_ref: Ref,
    counts: [usize; 4],
    pending_buttons: Vec<Vec<TouchButton>>,
    pending_values: Vec<ByteArray>,
}

impl Activity {
    /// The activity neither uses nor changes any device state. Copied
    /// through for the firmware; the packer does not interpret it.
    pub const NO_DEVICES: u32 = 0x0001;

    pub fn new(name: &str) -> Self {
        Activity {
            id: EntityId::fresh(),
            name: name.to_string(),
            flags: 0,
            mappings: Vec::new(),
            gestures: Vec::new(),
            pages: Vec::new(),
            states: Vec::new(),
            mappings_ref: Ref::null(),
            gestures_ref: Ref::null(),
            pages_ref: Ref::null(),
            states_ref: Ref::null(),
            counts: [0; 4],
            pending_buttons: Vec::new(),
            pending_values: Vec::new(),
        }
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Fire `event` when the physical button state equals `mask` exactly.
    pub fn add_button_mapping(&mut self, mask: u32, event: EntityId) {
        let mapping = ButtonMapping::new(mask, event);
        if self.mappings.is_empty() {
            self.mappings_ref = Ref::to(Packable::id(&mapping));
        }
        self.mappings.push(mapping);
        self.counts[0] = self.mappings.len();
    }

    pub fn add_gesture_mapping(&mut self, gesture: Gesture, event: EntityId) {
        let mapping = GestureMapping::new(gesture, event);
        if self.gestures.is_empty() {
            self.gestures_ref = Ref::to(Packable::id(&mapping));
        }
        self.gestures.push(mapping);
        self.counts[1] = self.gestures.len();
    }

    pub fn add_page(&mut self, page: TouchButtonPage) {
        if self.pages.is_empty() {
            self.pages_ref = Ref::to(Packable::id(&page));
        }
        self.pages.push(page);
        self.counts[2] = self.pages.len();
    }

    pub fn add_state(&mut self, state: DeviceState) {
        if self.states.is_empty() {
            self.states_ref = Ref::to(Packable::id(&state));
        }
        self.states.push(state);
        self.counts[3] = self.states.len();
    }

    /// Re-densify every state against its device's final option table.
    /// Called by the root config before anything is laid out, so options
    /// declared after a state was built still get their slot.
    pub(crate) fn densify_states(&mut self, devices: &[Device]) {
        for state in &mut self.states {
            if let Some(device) = devices.iter().find(|d| d.id() == state.device_id()) {
                state.densify(device);
            }
        }
    }
}

impl Packable for Activity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("Activity '{}'", self.name)
    }

    fn size(&self) -> u32 {
        36
    }

    fn enqueue_children(&mut self, package: &mut Package) {
        for mapping in self.mappings.drain(..) {
            package.append(Box::new(mapping));
        }
        for gesture in self.gestures.drain(..) {
            package.append(Box::new(gesture));
        }
        for mut page in self.pages.drain(..) {
            self.pending_buttons.push(page.take_buttons());
            package.append(Box::new(page));
        }
        for mut state in self.states.drain(..) {
            self.pending_values.push(state.take_values());
            package.append(Box::new(state));
        }
    }

    fn enqueue_trailing(&mut self, package: &mut Package) {
        for buttons in self.pending_buttons.drain(..) {
            TouchButtonPage::enqueue_buttons(buttons, package);
        }
        for values in self.pending_values.drain(..) {
            package.append(Box::new(values));
        }
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = self.describe();
        self.mappings_ref
            .resolve(table, &owner, "button mappings array");
        self.gestures_ref
            .resolve(table, &owner, "gesture mappings array");
        self.pages_ref
            .resolve(table, &owner, "touch button pages array");
        self.states_ref
            .resolve(table, &owner, "device states array");
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.flags.to_le_bytes());
        let pairs = [
            (self.counts[0], self.mappings_ref),
            (self.counts[1], self.gestures_ref),
            (self.counts[2], self.pages_ref),
            (self.counts[3], self.states_ref),
        ];
        for (count, reference) in pairs {
            out.extend_from_slice(&(count as i32).to_le_bytes());
            out.extend_from_slice(&reference.offset().to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_record_is_36_bytes() {
        let activity = Activity::new("empty").flags(Activity::NO_DEVICES);
        let mut out = Vec::new();
        activity.encode(&mut out);
        assert_eq!(out.len(), 36);
        assert_eq!(&out[0..4], &1u32.to_le_bytes());
    }

    #[test]
    fn test_empty_collections_encode_zero_pairs() {
        let activity = Activity::new("empty");
        let mut out = Vec::new();
        activity.encode(&mut out);
        // flags then four zeroed {count, offset} pairs
        assert_eq!(out, vec![0; 36]);
    }

    #[test]
    fn test_counts_track_additions() {
        let mut activity = Activity::new("watch");
        activity.add_button_mapping(0x1, EntityId::fresh());
        activity.add_button_mapping(0x2, EntityId::fresh());
        activity.add_page(TouchButtonPage::new("p1", Vec::new()));
        assert_eq!(activity.counts, [2, 0, 1, 0]);
    }
}
