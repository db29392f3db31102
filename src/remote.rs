//! # The Root Configuration
//!
//! [`RemoteConfig`] is the root of the graph: it designates the home
//! activity, owns the full device list, and registers every activity and
//! event that should reach the blob.
//!
//! Registration is the reachability contract: only entities registered
//! here (or owned, transitively, by something registered here) are
//! emitted. Anything referenced but never registered fails resolution
//! loudly at pack time; anything registered by construction but never
//! referenced packs fine and is simply never fired.
//!
//! Devices are packed as one contiguous uniformly-sized array — their
//! option tables, change-action arrays and action catalogs all follow
//! after the last device record, mirroring the page/button pattern.

use crate::activity::Activity;
use crate::device::{Device, DevicePayload};
use crate::error::PackError;
use crate::event::Event;
use crate::pack::{EntityId, OffsetTable, Package, Packable, Ref};

/// Root record: home activity, device array, and the registration lists.
///
/// 12 bytes on the wire; firmware reads it at data offset 0.
pub struct RemoteConfig {
    id: EntityId,
    home: Ref,
    activities: Vec<Activity>,
    devices: Vec<Device>,
    events: Vec<Event>,
    devices_ref: Ref,
    device_count: usize,
    payloads: Vec<DevicePayload>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig::new()
    }
}

impl RemoteConfig {
    pub fn new() -> Self {
        RemoteConfig {
            id: EntityId::fresh(),
            home: Ref::null(),
            activities: Vec::new(),
            devices: Vec::new(),
            events: Vec::new(),
            devices_ref: Ref::null(),
            device_count: 0,
            payloads: Vec::new(),
        }
    }

    /// Designate the home activity. Required; packing fails without one.
    pub fn set_home_activity(&mut self, activity: EntityId) {
        self.home = Ref::to(activity);
    }

    pub fn add_activity(&mut self, activity: Activity) -> EntityId {
        let id = activity.id();
        self.activities.push(activity);
        id
    }

    pub fn add_device(&mut self, device: Device) -> EntityId {
        let id = device.id();
        if self.devices.is_empty() {
            self.devices_ref = Ref::to(id);
        }
        self.devices.push(device);
        self.device_count = self.devices.len();
        id
    }

    pub fn add_event(&mut self, event: Event) -> EntityId {
        let id = event.id();
        self.events.push(event);
        id
    }

    /// Flatten the whole configuration into a blob.
    ///
    /// Convenience for the common case: one fresh [`Package`], this config
    /// as the only root.
    pub fn pack(self) -> Result<Vec<u8>, PackError> {
        let mut package = Package::new();
        package.append(Box::new(self));
        package.pack()
    }
}

impl Packable for RemoteConfig {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        "RemoteConfig".to_string()
    }

    fn size(&self) -> u32 {
        12
    }

    fn enqueue_children(&mut self, package: &mut Package) {
        // States are re-densified against the final option tables before
        // any layout happens; a device may have grown options since the
        // state was built.
        for activity in &mut self.activities {
            activity.densify_states(&self.devices);
        }
        for activity in self.activities.drain(..) {
            package.append(Box::new(activity));
        }
        for mut device in self.devices.drain(..) {
            // Strip the variable-size payload first so the device array
            // stays contiguous; it is enqueued as trailing data below.
            self.payloads.push(device.take_payload());
            package.append(Box::new(device));
        }
        for event in self.events.drain(..) {
            package.append(Box::new(event));
        }
    }

    fn enqueue_trailing(&mut self, package: &mut Package) {
        for payload in self.payloads.drain(..) {
            payload.enqueue(package);
        }
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        if self.home.is_null() {
            table.report_missing("RemoteConfig", "home activity");
        } else {
            self.home.resolve(table, "RemoteConfig", "home activity");
        }
        self.devices_ref.resolve(table, "RemoteConfig", "devices");
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.home.offset().to_le_bytes());
        out.extend_from_slice(&(self.device_count as i32).to_le_bytes());
        out.extend_from_slice(&self.devices_ref.offset().to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_without_home_activity_fails() {
        let mut config = RemoteConfig::new();
        let activity = Activity::new("solo");
        config.add_activity(activity);
        match config.pack() {
            Err(PackError::Unresolved(issues)) => {
                assert!(issues.iter().any(|i| i.contains("home activity")));
            }
            other => panic!("expected aggregate error, got {other:?}"),
        }
    }

    #[test]
    fn test_dangling_home_activity_fails() {
        let mut config = RemoteConfig::new();
        let unregistered = Activity::new("ghost");
        config.set_home_activity(unregistered.id());
        match config.pack() {
            Err(PackError::Unresolved(issues)) => assert_eq!(issues.len(), 1),
            other => panic!("expected aggregate error, got {other:?}"),
        }
    }

    #[test]
    fn test_minimal_config_packs() {
        let mut config = RemoteConfig::new();
        let home = config.add_activity(Activity::new("home"));
        config.set_home_activity(home);
        let blob = config.pack().unwrap();
        // watermark + root at offset 0 + activity
        assert_eq!(&blob[0..4], &[0xBE, 0xBE, 0xBA, 0xBA]);
        let home_offset = u32::from_le_bytes(blob[4..8].try_into().unwrap());
        assert_eq!(home_offset, 12);
    }

    #[test]
    fn test_devices_form_contiguous_array() {
        let mut config = RemoteConfig::new();
        let home = config.add_activity(Activity::new("home"));
        config.set_home_activity(home);
        let mut tv = Device::new("tv");
        tv.add_action("power", Vec::new());
        tv.add_option("power", 0x0001, 1, &["power"]).unwrap();
        config.add_device(tv);
        config.add_device(Device::new("amp"));

        let mut package = Package::new();
        package.append(Box::new(config));
        let layout = package.layout();
        let tv_entry = layout
            .iter()
            .find(|e| e.description == "Device 'tv'")
            .unwrap();
        let amp_entry = layout
            .iter()
            .find(|e| e.description == "Device 'amp'")
            .unwrap();
        // 8-byte device records back to back; tv's option table follows
        // only after the whole device array
        assert_eq!(amp_entry.offset, tv_entry.offset + 8);
        let option_entry = layout
            .iter()
            .find(|e| e.description.starts_with("Option"))
            .unwrap();
        assert!(option_entry.offset >= amp_entry.offset + 8);
    }
}
