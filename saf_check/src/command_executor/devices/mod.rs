pub mod command_sender;
pub mod commands;

use saf_devices::{Ccd, CheckResult, DeviceProxy, Focuser};

use crate::command_executor::{
    DeviceHandler,
    devices::commands::{CheckOutcome, DeviceSnapshot, SessionCommand, WheelSlots},
};

/// Owns the proxy and the device records for one control session.
pub struct SessionHandler {
    proxy: Box<dyn DeviceProxy + Send>,
    ccd: Ccd,
    focuser: Focuser,
}

impl DeviceHandler for SessionHandler {
    type Command = SessionCommand;
}

impl SessionHandler {
    pub fn new(proxy: Box<dyn DeviceProxy + Send>, ccd: Ccd, focuser: Focuser) -> Self {
        Self {
            proxy,
            ccd,
            focuser,
        }
    }

    pub fn check_filter_wheels(&mut self) -> Vec<CheckOutcome> {
        self.ccd
            .filter_wheels
            .iter()
            .map(|wheel| CheckOutcome {
                device: wheel.name().to_string(),
                passed: wheel.check(&mut self.proxy),
            })
            .collect()
    }

    pub fn check_focuser(&mut self) -> CheckOutcome {
        CheckOutcome {
            device: self.focuser.name.clone(),
            passed: self.focuser.check(&mut self.proxy),
        }
    }

    pub fn check_camera(&mut self) -> CheckOutcome {
        CheckOutcome {
            device: self.ccd.name.clone(),
            passed: self.ccd.check(&mut self.proxy),
        }
    }

    pub fn write_focus_default(&mut self, target: Option<i64>) -> CheckResult<i64> {
        self.focuser
            .write_focus_default(Some(&mut self.proxy), target)
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        let (focus_min, focus_max) = self.focuser.travel();

        DeviceSnapshot {
            focus_min,
            focus_max,
            focus_default: self.focuser.focus_default,
            wheels: self
                .ccd
                .filter_wheels
                .iter()
                .map(|wheel| WheelSlots {
                    wheel: wheel.name().to_string(),
                    empty_slots: wheel
                        .empty_slot_filters()
                        .map(|filter| filter.name.clone())
                        .collect(),
                })
                .collect(),
        }
    }
}
