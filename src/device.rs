//! # Devices, Options and Device States
//!
//! A [`Device`] is a physical appliance the remote drives: a name-keyed
//! catalog of IR actions plus a set of tracked [`DeviceOption`]s (power,
//! input selection, and so on) that the firmware keeps in sync when
//! switching activities.
//!
//! A [`DeviceState`] is the snapshot an activity expects a device to be in:
//! a sparse name → value mapping, densified at build time into a byte array
//! covering the device's full option table in declaration order.
//!
//! Option change-action lists encode a small protocol interpreted by the
//! firmware, not by the packer:
//!
//! - with [`DeviceOption::CYCLED`]: one action steps the value up (wrapping
//!   past `max_value` to 0); two actions step down/up, wrapping at both
//!   ends;
//! - without it: exactly one action per representable value, and firing
//!   action *n* sets the option to *n*.
//!
//! The packer only preserves `action_count` and lays the reference array
//! out as trailing data.

use std::collections::HashMap;

use crate::error::PackError;
use crate::ir::{IrAction, IrCode};
use crate::pack::{ByteArray, EntityId, OffsetTable, Package, Packable, Ref, RefArray, WordArray};

/// A tracked device setting with values in `[0, max_value]`,
/// `max_value < 256`.
pub struct DeviceOption {
    id: EntityId,
    name: String,
    flags: u16,
    max_value: u8,
    action_count: u8,
    pre_action: Ref,
    actions: Ref,
    post_delays: Ref,
    action_array: Option<RefArray>,
    delay_array: Option<WordArray>,
}

impl DeviceOption {
    /// Value advances through its range rather than being set absolutely.
    pub const CYCLED: u16 = 0x0001;
    /// Resets to zero when an activity leaves it unset.
    pub const DEFAULT_TO_ZERO: u16 = 0x0002;
    /// Returning to the default emits the change actions.
    pub const ACTION_ON_DEFAULT: u16 = 0x0004;
    /// Re-asserted even when unchanged, to force a known state.
    pub const ALWAYS_SET: u16 = 0x0008;
    /// Cycled options reset to zero and count up to the target;
    /// action 1 resets, action 2 steps.
    pub const ABSOLUTE_FROM_ZERO: u16 = 0x0010;

    fn new(
        name: &str,
        flags: u16,
        max_value: u8,
        change_actions: Vec<EntityId>,
        pre_action: Option<EntityId>,
        post_delays: Option<Vec<u32>>,
    ) -> Self {
        let action_count = change_actions.len() as u8;
        let action_array = RefArray::new(&format!("{name}-actions"), change_actions);
        let delay_array = post_delays.map(|d| WordArray::new(&format!("{name}-postdelays"), d));
        DeviceOption {
            id: EntityId::fresh(),
            name: name.to_string(),
            flags,
            max_value,
            action_count,
            pre_action: pre_action.map(Ref::to).unwrap_or_default(),
            actions: Ref::to(action_array.id()),
            post_delays: delay_array
                .as_ref()
                .map(|d| Ref::to(d.id()))
                .unwrap_or_default(),
            action_array: Some(action_array),
            delay_array,
        }
    }

    /// Strip the trailing arrays so the owning device can lay them out
    /// after its uniform option array.
    fn take_arrays(&mut self) -> (Option<RefArray>, Option<WordArray>) {
        (self.action_array.take(), self.delay_array.take())
    }
}

impl Packable for DeviceOption {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("Option '{}'", self.name)
    }

    fn size(&self) -> u32 {
        16
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = self.describe();
        self.pre_action.resolve(table, &owner, "pre-action");
        self.actions.resolve(table, &owner, "change actions array");
        self.post_delays.resolve(table, &owner, "post delays array");
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.push(self.max_value);
        out.push(self.action_count);
        out.extend_from_slice(&self.pre_action.offset().to_le_bytes());
        out.extend_from_slice(&self.actions.offset().to_le_bytes());
        out.extend_from_slice(&self.post_delays.offset().to_le_bytes());
    }
}

/// Everything a device lays out after the uniform device array: its
/// options, their change-action and delay arrays, and its action catalog.
pub(crate) struct DevicePayload {
    options: Vec<DeviceOption>,
    actions: Vec<IrAction>,
}

impl DevicePayload {
    pub(crate) fn enqueue(self, package: &mut Package) {
        let mut tails = Vec::new();
        for mut option in self.options {
            tails.push(option.take_arrays());
            package.append(Box::new(option));
        }
        for (actions, delays) in tails {
            if let Some(actions) = actions {
                package.append(Box::new(actions));
            }
            if let Some(delays) = delays {
                package.append(Box::new(delays));
            }
        }
        for action in self.actions {
            package.append(Box::new(action));
        }
    }
}

/// A named appliance: an action catalog plus tracked options.
///
/// Wire layout is just `{option_count, options_offset}`; the option array
/// and everything it references follow the whole device array as trailing
/// data, so devices stay uniformly strided.
pub struct Device {
    id: EntityId,
    name: String,
    options: Vec<DeviceOption>,
    option_lookup: HashMap<String, usize>,
    actions: Vec<IrAction>,
    action_lookup: HashMap<String, EntityId>,
    options_ref: Ref,
    option_count: usize,
}

impl Device {
    pub fn new(name: &str) -> Self {
        Device {
            id: EntityId::fresh(),
            name: name.to_string(),
            options: Vec::new(),
            option_lookup: HashMap::new(),
            actions: Vec::new(),
            action_lookup: HashMap::new(),
            options_ref: Ref::null(),
            option_count: 0,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare an IR action. Actions are packed in declaration order.
    pub fn add_action(&mut self, name: &str, codes: Vec<IrCode>) -> EntityId {
        let action = IrAction::new(&format!("{}-{}", self.name, name), codes);
        let id = action.id();
        self.action_lookup.insert(name.to_string(), id);
        self.actions.push(action);
        id
    }

    /// Look an action up by name. Unknown names are authoring errors.
    pub fn action(&self, name: &str) -> Result<EntityId, PackError> {
        self.action_lookup
            .get(name)
            .copied()
            .ok_or_else(|| PackError::UnknownAction {
                owner: format!("Device '{}'", self.name),
                name: name.to_string(),
            })
    }

    /// Declare a tracked option whose change actions are named entries of
    /// this device's action catalog.
    pub fn add_option(
        &mut self,
        name: &str,
        flags: u16,
        max_value: u8,
        change_actions: &[&str],
    ) -> Result<(), PackError> {
        self.add_option_with(name, flags, max_value, change_actions, None, None)
    }

    /// [`Device::add_option`] with an optional pre-action and per-action
    /// post delays.
    pub fn add_option_with(
        &mut self,
        name: &str,
        flags: u16,
        max_value: u8,
        change_actions: &[&str],
        pre_action: Option<&str>,
        post_delays: Option<Vec<u32>>,
    ) -> Result<(), PackError> {
        let pre_action = pre_action.map(|n| self.action(n)).transpose()?;
        let change_actions = change_actions
            .iter()
            .map(|n| self.action(n))
            .collect::<Result<Vec<_>, _>>()?;

        let option = DeviceOption::new(
            &format!("{}-{}", self.name, name),
            flags,
            max_value,
            change_actions,
            pre_action,
            post_delays,
        );
        if self.options.is_empty() {
            self.options_ref = Ref::to(option.id());
        }
        self.option_lookup.insert(name.to_string(), self.options.len());
        self.options.push(option);
        self.option_count = self.options.len();
        Ok(())
    }

    /// Position of an option in declaration order, used to densify states.
    pub fn option_index(&self, name: &str) -> Option<usize> {
        self.option_lookup.get(name).copied()
    }

    pub fn option_count(&self) -> usize {
        self.option_count
    }

    pub(crate) fn take_payload(&mut self) -> DevicePayload {
        DevicePayload {
            options: std::mem::take(&mut self.options),
            actions: std::mem::take(&mut self.actions),
        }
    }
}

impl Packable for Device {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("Device '{}'", self.name)
    }

    fn size(&self) -> u32 {
        8
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = self.describe();
        self.options_ref.resolve(table, &owner, "options");
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.option_count as i32).to_le_bytes());
        out.extend_from_slice(&self.options_ref.offset().to_le_bytes());
    }
}

/// The option values an activity expects a device to hold.
///
/// Built from a sparse name → value list; unspecified options default
/// to 0. The list is kept sparse until build time and densified against
/// the device's option table as it stands then, so options declared
/// after the state still get a slot. Wire layout is
/// `{device_offset, values_offset}` with the byte array as trailing
/// data.
#[derive(Debug)]
pub struct DeviceState {
    id: EntityId,
    name: String,
    device: Ref,
    device_id: EntityId,
    values: Ref,
    sparse: Vec<(String, u8)>,
    dense: Vec<u8>,
}

impl DeviceState {
    pub fn new(name: &str, device: &Device, values: &[(&str, u8)]) -> Result<Self, PackError> {
        for (option, _) in values {
            if device.option_index(option).is_none() {
                return Err(PackError::UnknownOption {
                    owner: format!("DeviceState '{name}'"),
                    name: option.to_string(),
                });
            }
        }
        let mut state = DeviceState {
            id: EntityId::fresh(),
            name: name.to_string(),
            device: Ref::to(device.id()),
            device_id: device.id(),
            values: Ref::null(),
            sparse: values
                .iter()
                .map(|(option, value)| (option.to_string(), *value))
                .collect(),
            dense: Vec::new(),
        };
        state.densify(device);
        Ok(state)
    }

    pub(crate) fn device_id(&self) -> EntityId {
        self.device_id
    }

    /// Rebuild the dense value array against the device's current option
    /// table. One slot per option in declaration order, so the array
    /// length always matches the device's emitted option count.
    pub(crate) fn densify(&mut self, device: &Device) {
        let mut dense = vec![0u8; device.option_count()];
        for (option, value) in &self.sparse {
            if let Some(index) = device.option_index(option) {
                dense[index] = *value;
            }
        }
        self.dense = dense;
    }

    pub(crate) fn take_values(&mut self) -> ByteArray {
        let array = ByteArray::new(
            &format!("{}-options", self.name),
            std::mem::take(&mut self.dense),
        );
        self.values = Ref::to(array.id());
        array
    }
}

impl Packable for DeviceState {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("DeviceState '{}'", self.name)
    }

    fn size(&self) -> u32 {
        8
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = self.describe();
        self.device.resolve(table, &owner, "device");
        self.values.resolve(table, &owner, "option values");
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.device.offset().to_le_bytes());
        out.extend_from_slice(&self.values.offset().to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrEncoding;

    fn tv() -> Device {
        let mut tv = Device::new("tv");
        tv.add_action("power", vec![IrCode::new(IrEncoding::Sirc, 12, 0x0A90)]);
        tv.add_action("input", vec![IrCode::new(IrEncoding::Sirc, 12, 0x0A50)]);
        tv
    }

    #[test]
    fn test_unknown_change_action_is_authoring_error() {
        let mut tv = tv();
        let err = tv
            .add_option("power", DeviceOption::CYCLED, 1, &["nonesuch"])
            .unwrap_err();
        assert!(matches!(err, PackError::UnknownAction { .. }));
    }

    #[test]
    fn test_unknown_pre_action_is_authoring_error() {
        let mut tv = tv();
        let err = tv
            .add_option_with("power", 0, 1, &["power", "power"], Some("warmup"), None)
            .unwrap_err();
        assert!(matches!(err, PackError::UnknownAction { .. }));
    }

    #[test]
    fn test_action_count_tracks_change_actions() {
        let mut tv = tv();
        tv.add_option("input", 0, 1, &["power", "input"]).unwrap();
        let option = &tv.options[0];
        assert_eq!(option.action_count, 2);
    }

    #[test]
    fn test_state_densified_in_declaration_order() {
        let mut tv = tv();
        tv.add_option("power", DeviceOption::CYCLED, 1, &["power"])
            .unwrap();
        tv.add_option("input", 0, 1, &["power", "input"]).unwrap();
        let mut state = DeviceState::new("watch-tv", &tv, &[("input", 1)]).unwrap();
        let values = state.take_values();
        assert_eq!(values.len(), 2);
        let mut out = Vec::new();
        values.encode(&mut out);
        // power unspecified -> 0, input -> 1
        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn test_state_covers_options_declared_after_it() {
        let mut tv = tv();
        tv.add_option("power", DeviceOption::CYCLED, 1, &["power"])
            .unwrap();
        let mut state = DeviceState::new("watch-tv", &tv, &[("power", 1)]).unwrap();
        tv.add_option("input", 0, 1, &["power", "input"]).unwrap();
        state.densify(&tv);
        let values = state.take_values();
        assert_eq!(values.len(), tv.option_count());
        let mut out = Vec::new();
        values.encode(&mut out);
        assert_eq!(out, vec![1, 0]);
    }

    #[test]
    fn test_state_rejects_unknown_option() {
        let tv = tv();
        let err = DeviceState::new("watch-tv", &tv, &[("volume", 3)]).unwrap_err();
        assert!(matches!(err, PackError::UnknownOption { .. }));
    }

    #[test]
    fn test_option_record_is_16_bytes() {
        let mut tv = tv();
        tv.add_option("power", DeviceOption::CYCLED, 1, &["power"])
            .unwrap();
        let mut out = Vec::new();
        tv.options[0].encode(&mut out);
        assert_eq!(out.len(), 16);
    }
}
