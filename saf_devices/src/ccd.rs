use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{CheckError, CheckResult, DeviceKind},
    filter_wheel::FilterWheel,
    proxy::{self, DeviceProxy},
};

/// Camera property naming the selected filter wheel.
pub const WHEEL_PROPERTY: &str = "wheel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset_x: i64,
    pub offset_y: i64,
    pub width: i64,
    pub height: i64,
}

#[derive(Deserialize, Debug, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Ccd {
    pub name: String,
    pub binning: Option<String>,
    /// Window geometry in pixels, `-1` everywhere reads the full frame.
    pub window_offset_x: i64,
    pub window_offset_y: i64,
    pub window_width: i64,
    pub window_height: i64,
    pub pixel_size: f64,
    pub base_exposure: f64,
    pub filter_wheels: Vec<FilterWheel>,

    #[serde(skip)]
    pub ft_offsets: Option<BTreeMap<String, i64>>,
}

impl Default for Ccd {
    fn default() -> Self {
        Self {
            name: "C0".to_string(),
            binning: None,
            window_offset_x: -1,
            window_offset_y: -1,
            window_width: -1,
            window_height: -1,
            pixel_size: 9.0e-6,
            base_exposure: 10.0,
            filter_wheels: vec![FilterWheel::absent()],
            ft_offsets: None,
        }
    }
}

impl Ccd {
    pub fn new(name: impl Into<String>, filter_wheels: Vec<FilterWheel>) -> Self {
        Self {
            name: name.into(),
            filter_wheels,
            ..Default::default()
        }
    }

    /// `None` when any window coordinate asks for the full frame.
    pub fn window(&self) -> Option<Window> {
        let window = Window {
            offset_x: self.window_offset_x,
            offset_y: self.window_offset_y,
            width: self.window_width,
            height: self.window_height,
        };

        let full_frame = [window.offset_x, window.offset_y, window.width, window.height]
            .iter()
            .any(|&v| v < 0);

        (!full_frame).then_some(window)
    }

    pub fn has_absent_wheel(&self) -> bool {
        self.filter_wheels.iter().any(FilterWheel::is_absent)
    }

    pub fn verify<P: DeviceProxy + ?Sized>(&self, proxy: &mut P) -> CheckResult {
        proxy::refresh(proxy);

        proxy
            .resolve(&self.name)
            .map_err(|_| CheckError::DeviceNotFound {
                kind: DeviceKind::Camera,
                device: self.name.clone(),
            })?;

        if self.has_absent_wheel() {
            tracing::debug!("CCD: {} uses FAKE_FTW", self.name);
            return Ok(());
        }

        // One wheel property per camera, whatever the number of wheels.
        proxy
            .read_property(&self.name, WHEEL_PROPERTY)
            .map(|_| ())
            .map_err(|_| CheckError::PropertyNotFound {
                device: self.name.clone(),
                property: WHEEL_PROPERTY.to_string(),
            })
    }

    pub fn check<P: DeviceProxy + ?Sized>(&self, proxy: &mut P) -> bool {
        match self.verify(proxy) {
            Ok(()) => true,
            Err(CheckError::PropertyNotFound { .. }) => {
                tracing::error!("CCD: {}: no filter wheel present", self.name);
                false
            }
            Err(e) => {
                tracing::error!("CCD: {}", e);
                false
            }
        }
    }

    /// Checks every physical wheel on its own. Absent wheels are skipped.
    pub fn verify_filter_wheels<P: DeviceProxy + ?Sized>(&self, proxy: &mut P) -> CheckResult {
        self.filter_wheels
            .iter()
            .filter(|wheel| !wheel.is_absent())
            .try_for_each(|wheel| wheel.verify(proxy))
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::{proxy::Device, simulated::SimulatedProxy, testing::RefusingProxy};

    fn physical_ccd() -> Ccd {
        Ccd::new(
            "C0",
            vec![FilterWheel::new("W0", Vec::new()), FilterWheel::new("W1", Vec::new())],
        )
    }

    #[test]
    fn absent_wheel_skips_wheel_property() {
        let mut proxy = SimulatedProxy::new();
        proxy.add_device(Device::new("C0"));
        let ccd = Ccd::new("C0", vec![FilterWheel::absent()]);

        assert!(ccd.check(&mut proxy));
        assert_eq!(proxy.resolve_count("C0"), 1);
    }

    #[traced_test]
    #[test]
    fn missing_camera_fails() {
        let mut proxy = RefusingProxy::default();
        let ccd = Ccd::new("C0", vec![FilterWheel::absent()]);

        assert!(!ccd.check(&mut proxy));
        assert!(logs_contain("camera device C0 not present"));
    }

    #[traced_test]
    #[test]
    fn physical_wheels_need_wheel_property() {
        let mut proxy = SimulatedProxy::new();
        proxy.add_device(Device::new("C0"));
        let ccd = physical_ccd();

        assert_eq!(
            ccd.verify(&mut proxy),
            Err(CheckError::PropertyNotFound {
                device: "C0".to_string(),
                property: WHEEL_PROPERTY.to_string(),
            })
        );
        assert!(!ccd.check(&mut proxy));
        assert!(logs_contain("no filter wheel present"));
    }

    #[test]
    fn wheel_property_is_enough_for_check() {
        let mut proxy = SimulatedProxy::new();
        proxy.add_device(Device::new("C0").with_property(WHEEL_PROPERTY, "W0"));
        let ccd = physical_ccd();

        assert!(ccd.check(&mut proxy));
        assert_eq!(proxy.resolve_count("W0"), 0);
        assert_eq!(
            ccd.verify_filter_wheels(&mut proxy),
            Err(CheckError::DeviceNotFound {
                kind: DeviceKind::FilterWheel,
                device: "W0".to_string(),
            })
        );
    }

    #[test]
    fn every_physical_wheel_is_resolved() {
        let mut proxy = SimulatedProxy::new();
        proxy.add_device(Device::new("W0"));
        proxy.add_device(Device::new("W1"));
        let mut ccd = physical_ccd();
        ccd.filter_wheels.push(FilterWheel::absent());

        assert_eq!(ccd.verify_filter_wheels(&mut proxy), Ok(()));
        assert_eq!(proxy.resolve_count("W0"), 1);
        assert_eq!(proxy.resolve_count("W1"), 1);
        assert_eq!(proxy.resolve_count("FAKE_FTW"), 0);
    }

    #[test]
    fn full_frame_has_no_window() {
        let mut ccd = Ccd::default();
        assert_eq!(ccd.window(), None);

        ccd.window_offset_x = 10;
        ccd.window_offset_y = 20;
        ccd.window_width = 512;
        ccd.window_height = 256;
        assert_eq!(
            ccd.window(),
            Some(Window {
                offset_x: 10,
                offset_y: 20,
                width: 512,
                height: 256,
            })
        );
    }
}
