//! # Remotepack - Remote Control Data Packer
//!
//! Remotepack flattens a programmable remote control's configuration —
//! IR codes, button mappings, touch pages, devices and activities — into
//! a single relocatable binary blob the remote's firmware reads directly
//! out of flash. It provides:
//!
//! - **Packing engine**: offset allocation, reference resolution and
//!   little-endian serialization for an object graph
//! - **Domain records**: IR actions, events, touch UI, devices with
//!   tracked option state, activities
//! - **Images**: paletted RGB565 conversion for touch button artwork
//! - **Transport**: serial download and verify against the remote
//!
//! ## Quick Start
//!
//! ```
//! use remotepack::{
//!     device::Device,
//!     event::Event,
//!     ir::{IrCode, IrEncoding},
//!     remote::RemoteConfig,
//!     activity::Activity,
//!     ui::{TouchButton, TouchButtonPage},
//! };
//!
//! // A TV with a single power action
//! let mut tv = Device::new("tv");
//! tv.add_action("power", vec![IrCode::new(IrEncoding::Sirc, 12, 0xA90)]);
//!
//! let mut config = RemoteConfig::new();
//! let power = config.add_event(Event::ir_action("tv-power", tv.action("power")?, tv.id()));
//!
//! // One activity with a single touch button
//! let mut watch = Activity::new("watch-tv");
//! watch.add_page(TouchButtonPage::new(
//!     "main",
//!     vec![TouchButton::new("power", 10, 10, 100, 60).label("Power").event(power)],
//! ));
//! let watch = config.add_activity(watch);
//! config.set_home_activity(watch);
//! config.add_device(tv);
//!
//! // Flatten to the firmware blob
//! let blob = config.pack()?;
//! assert_eq!(&blob[0..4], &[0xBE, 0xBE, 0xBA, 0xBA]);
//!
//! # Ok::<(), remotepack::error::PackError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pack`] | Packing engine: offsets, references, serialization |
//! | [`ir`] | IR codes and actions |
//! | [`event`] | Events bound to buttons and gestures |
//! | [`ui`] | Button mappings, gestures, touch pages |
//! | [`device`] | Devices, options, tracked state |
//! | [`activity`] | Activities grouping mappings, pages and states |
//! | [`remote`] | Top-level configuration and pack entry point |
//! | [`image`] | Paletted image conversion |
//! | [`demo`] | Built-in demo configuration |
//! | [`transport`] | Serial download to the remote |
//! | [`error`] | Error types |

pub mod activity;
pub mod demo;
pub mod device;
pub mod error;
pub mod event;
pub mod image;
pub mod ir;
pub mod pack;
pub mod remote;
pub mod transport;
pub mod ui;

// Re-exports for convenience
pub use error::PackError;
pub use pack::{Package, WATERMARK};
pub use remote::RemoteConfig;
