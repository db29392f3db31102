//! # Events
//!
//! An [`Event`] is what a button press or gesture fires: transmit an IR
//! action, switch activity, flip a touch page, go home, enter download
//! mode, or power everything off.
//!
//! On the wire an event is a tag word plus two data words. Only two
//! variants carry references — an IR action event holds the action *and*
//! the device it targets (the firmware needs the device to track the RC6
//! toggle flag), an activity event holds the activity. The asymmetry lives
//! in the variant shapes here, not in a conditionally-interpreted array.

use crate::pack::{EntityId, OffsetTable, Packable, Ref};

/// Payload of an [`Event`], one shape per tag.
#[derive(Debug, Clone, Copy, Default)]
pub enum EventKind {
    /// Inert placeholder.
    #[default]
    None,
    /// Transmit an IR action on the device that owns it.
    IrAction { action: Ref, device: Ref },
    /// Switch to another activity.
    Activity { activity: Ref },
    /// Advance to the next touch button page.
    NextPage,
    /// Go back to the previous touch button page.
    PrevPage,
    /// Return to the home activity.
    Home,
    /// Enter firmware download mode.
    Download,
    /// Power the remote off.
    PowerOff,
}

/// A firable event, 12 bytes on the wire: tag plus two payload words.
pub struct Event {
    id: EntityId,
    name: String,
    kind: EventKind,
}

impl Event {
    pub fn new(name: &str, kind: EventKind) -> Self {
        Event {
            id: EntityId::fresh(),
            name: name.to_string(),
            kind,
        }
    }

    /// Event that transmits `action` on `device` when fired.
    pub fn ir_action(name: &str, action: EntityId, device: EntityId) -> Self {
        Event::new(
            name,
            EventKind::IrAction {
                action: Ref::to(action),
                device: Ref::to(device),
            },
        )
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Event that switches to the given activity.
    pub fn activity(name: &str, activity: EntityId) -> Self {
        Event::new(
            name,
            EventKind::Activity {
                activity: Ref::to(activity),
            },
        )
    }

    fn tag(&self) -> u32 {
        match self.kind {
            EventKind::None => 0,
            EventKind::IrAction { .. } => 1,
            EventKind::Activity { .. } => 2,
            EventKind::NextPage => 3,
            EventKind::PrevPage => 4,
            EventKind::Home => 5,
            EventKind::Download => 6,
            EventKind::PowerOff => 7,
        }
    }
}

impl Packable for Event {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("Event '{}'", self.name)
    }

    fn size(&self) -> u32 {
        12
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = format!("Event '{}'", self.name);
        match &mut self.kind {
            EventKind::IrAction { action, device } => {
                // Both attempted even if one is missing; each failure is
                // independently diagnosable.
                action.resolve(table, &owner, "action");
                device.resolve(table, &owner, "device");
            }
            EventKind::Activity { activity } => {
                activity.resolve(table, &owner, "activity");
            }
            _ => {}
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tag().to_le_bytes());
        let (data0, data1) = match &self.kind {
            EventKind::IrAction { action, device } => (action.offset(), device.offset()),
            EventKind::Activity { activity } => (activity.offset(), 0),
            _ => (0, 0),
        };
        out.extend_from_slice(&data0.to_le_bytes());
        out.extend_from_slice(&data1.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_free_event_encodes_zero_data() {
        let event = Event::new("home", EventKind::Home);
        let mut out = Vec::new();
        event.encode(&mut out);
        assert_eq!(out.len(), 12);
        assert_eq!(&out[0..4], &5u32.to_le_bytes());
        assert_eq!(&out[4..12], &[0u8; 8]);
    }

    #[test]
    fn test_ir_action_event_reports_both_missing_refs() {
        let mut event = Event::ir_action("power", EntityId::fresh(), EntityId::fresh());
        let mut table = OffsetTable::new();
        event.resolve(&mut table);
        assert_eq!(table.issues().len(), 2);
    }

    #[test]
    fn test_tags_are_stable() {
        let tags: Vec<u32> = [
            EventKind::None,
            EventKind::NextPage,
            EventKind::PrevPage,
            EventKind::Home,
            EventKind::Download,
            EventKind::PowerOff,
        ]
        .into_iter()
        .map(|kind| Event::new("t", kind).tag())
        .collect();
        assert_eq!(tags, vec![0, 3, 4, 5, 6, 7]);
    }
}
