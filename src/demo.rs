//! # Demo Configuration
//!
//! A built-in living-room setup used by the CLI: a Sony-style TV (SIRC)
//! and an RC6 amplifier, a home menu, and a watch-TV activity with two
//! touch pages, slider gestures and tracked device state. It exercises
//! every record type the packer emits, so the resulting blob doubles as a
//! smoke test for firmware changes.

use crate::activity::Activity;
use crate::device::{Device, DeviceOption, DeviceState};
use crate::error::PackError;
use crate::event::{Event, EventKind};
use crate::ir::{IrCode, IrEncoding};
use crate::remote::RemoteConfig;
use crate::ui::{Gesture, TouchButton, TouchButtonPage};

// Physical button masks
const BUTTON_HOME: u32 = 0x0001_0000;
const BUTTON_PREV: u32 = 0x0002_0000;
const BUTTON_NEXT: u32 = 0x0004_0000;
const BUTTON_POWER: u32 = 0x0008_0000;

// RGB565 colours
const GREEN: u16 = 0x07E0;
const RED: u16 = 0xF800;
const GREY: u16 = 0x8410;

fn sirc(code: u32) -> IrCode {
    IrCode::new(IrEncoding::Sirc, 12, code)
}

fn rc6(code: u32) -> IrCode {
    IrCode::new(IrEncoding::Rc6, 21, code).with_toggle(0x10000)
}

fn tv() -> Result<Device, PackError> {
    let mut tv = Device::new("tv");
    tv.add_action("power", vec![sirc(0x0A90)]);
    tv.add_action("input-tv", vec![sirc(0x0250)]);
    tv.add_action("input-hdmi", vec![sirc(0x0258)]);
    // Powering on needs a pause before the set accepts input selection
    tv.add_option_with(
        "power",
        DeviceOption::CYCLED | DeviceOption::DEFAULT_TO_ZERO | DeviceOption::ACTION_ON_DEFAULT,
        1,
        &["power"],
        None,
        Some(vec![3000]),
    )?;
    tv.add_option_with(
        "input",
        DeviceOption::ALWAYS_SET,
        1,
        &["input-tv", "input-hdmi"],
        None,
        None,
    )?;
    Ok(tv)
}

fn amp() -> Result<Device, PackError> {
    let mut amp = Device::new("amp");
    amp.add_action(
        "power",
        vec![
            rc6(0xFFB38),
            IrCode::new(IrEncoding::Nop, 0, 250),
            rc6(0xEFB38),
        ],
    );
    amp.add_action("volume-up", vec![rc6(0xFEFEF)]);
    amp.add_action("volume-down", vec![rc6(0xFEFF0)]);
    amp.add_action("mute", vec![rc6(0xFEFF2)]);
    amp.add_option(
        "power",
        DeviceOption::CYCLED | DeviceOption::DEFAULT_TO_ZERO | DeviceOption::ACTION_ON_DEFAULT,
        1,
        &["power"],
    )?;
    Ok(amp)
}

/// Build the demo living-room configuration.
pub fn living_room() -> Result<RemoteConfig, PackError> {
    let tv = tv()?;
    let amp = amp()?;

    let mut config = RemoteConfig::new();

    let next_page = config.add_event(Event::new("next-page", EventKind::NextPage));
    let prev_page = config.add_event(Event::new("prev-page", EventKind::PrevPage));
    let go_home = config.add_event(Event::new("home", EventKind::Home));
    let power_off = config.add_event(Event::new("power-off", EventKind::PowerOff));

    let tv_power = config.add_event(Event::ir_action("tv-power", tv.action("power")?, tv.id()));
    let volume_up = config.add_event(Event::ir_action(
        "volume-up",
        amp.action("volume-up")?,
        amp.id(),
    ));
    let volume_down = config.add_event(Event::ir_action(
        "volume-down",
        amp.action("volume-down")?,
        amp.id(),
    ));
    let mute = config.add_event(Event::ir_action("mute", amp.action("mute")?, amp.id()));

    // Watch TV: both devices on, TV on the tuner input
    let mut watch_tv = Activity::new("watch-tv");
    watch_tv.add_button_mapping(BUTTON_HOME, go_home);
    watch_tv.add_button_mapping(BUTTON_PREV, prev_page);
    watch_tv.add_button_mapping(BUTTON_NEXT, next_page);
    watch_tv.add_gesture_mapping(Gesture::SwipeLeft, prev_page);
    watch_tv.add_gesture_mapping(Gesture::SwipeRight, next_page);
    watch_tv.add_page(TouchButtonPage::new(
        "watch-tv-page-1",
        vec![
            TouchButton::new("volume-up", 10, 10, 100, 60)
                .label("Vol +")
                .colour(GREEN)
                .flags(TouchButton::CENTRE_TEXT)
                .event(volume_up),
            TouchButton::new("volume-down", 10, 80, 100, 60)
                .label("Vol -")
                .colour(GREEN)
                .flags(TouchButton::CENTRE_TEXT)
                .event(volume_down),
            TouchButton::new("mute", 10, 150, 100, 60)
                .label("Mute")
                .colour(GREY)
                .flags(TouchButton::CENTRE_TEXT | TouchButton::PRESS_ACTIVATE)
                .event(mute),
        ],
    ));
    watch_tv.add_page(TouchButtonPage::new(
        "watch-tv-page-2",
        vec![
            TouchButton::new("tv-power", 10, 10, 100, 60)
                .label("TV")
                .colour(RED)
                .flags(TouchButton::CENTRE_TEXT)
                .event(tv_power),
        ],
    ));
    watch_tv.add_state(DeviceState::new(
        "watch-tv-tv",
        &tv,
        &[("power", 1), ("input", 0)],
    )?);
    watch_tv.add_state(DeviceState::new("watch-tv-amp", &amp, &[("power", 1)])?);
    let watch_tv = config.add_activity(watch_tv);

    let select_watch_tv = config.add_event(Event::activity("select-watch-tv", watch_tv));

    // Home menu: everything off, no state enforcement while browsing
    let mut home = Activity::new("home").flags(Activity::NO_DEVICES);
    home.add_button_mapping(BUTTON_POWER, power_off);
    home.add_page(TouchButtonPage::new(
        "home-page-1",
        vec![
            TouchButton::new("watch-tv", 10, 10, 220, 60)
                .label("Watch TV")
                .colour(GREEN)
                .flags(TouchButton::CENTRE_TEXT)
                .event(select_watch_tv),
            TouchButton::new("power-off", 10, 240, 220, 60)
                .label("Power Off")
                .colour(RED)
                .flags(TouchButton::CENTRE_TEXT)
                .event(power_off),
        ],
    ));
    let home = config.add_activity(home);
    config.set_home_activity(home);

    config.add_device(tv);
    config.add_device(amp);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_config_packs() {
        let blob = living_room().unwrap().pack().unwrap();
        assert_eq!(&blob[0..4], &[0xBE, 0xBE, 0xBA, 0xBA]);
        assert_eq!(blob.len() % 4, 0);
    }

    #[test]
    fn test_demo_config_is_deterministic() {
        let first = living_room().unwrap().pack().unwrap();
        let second = living_room().unwrap().pack().unwrap();
        assert_eq!(first, second);
    }
}
