use serde::{Deserialize, Serialize};

use crate::{
    error::{CheckError, CheckResult, DeviceKind},
    filter::Filter,
    proxy::{self, DeviceProxy},
};

/// Configured name of a wheel that is not physically attached.
pub const ABSENT_WHEEL_NAME: &str = "FAKE_FTW";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum WheelDevice {
    Physical(String),
    #[default]
    Absent,
}

impl From<String> for WheelDevice {
    fn from(name: String) -> Self {
        if name == ABSENT_WHEEL_NAME {
            WheelDevice::Absent
        } else {
            WheelDevice::Physical(name)
        }
    }
}

impl From<WheelDevice> for String {
    fn from(device: WheelDevice) -> Self {
        match device {
            WheelDevice::Physical(name) => name,
            WheelDevice::Absent => ABSENT_WHEEL_NAME.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Serialize, Clone, PartialEq, Default)]
pub struct FilterWheel {
    #[serde(rename = "name")]
    pub device: WheelDevice,
    /// One offset per camera sharing this wheel.
    #[serde(default)]
    pub ccd_filter_offsets: Vec<i64>,
    /// Physical slot order.
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(skip)]
    pub empty_slots: Option<Vec<usize>>,
}

impl FilterWheel {
    pub fn new(name: impl Into<String>, filters: Vec<Filter>) -> Self {
        Self {
            device: WheelDevice::from(name.into()),
            ccd_filter_offsets: Vec::new(),
            filters,
            empty_slots: None,
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        match &self.device {
            WheelDevice::Physical(name) => name,
            WheelDevice::Absent => ABSENT_WHEEL_NAME,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.device, WheelDevice::Absent)
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|filter| filter.name == name)
    }

    /// Records which slots hold no glass, matched by filter name.
    pub fn mark_empty_slots<S: AsRef<str>>(&mut self, names: &[S]) {
        let slots = self
            .filters
            .iter()
            .enumerate()
            .filter(|(_, filter)| names.iter().any(|name| name.as_ref() == filter.name))
            .map(|(slot, _)| slot)
            .collect();

        self.empty_slots = Some(slots);
    }

    pub fn empty_slot_filters(&self) -> impl Iterator<Item = &Filter> + '_ {
        self.empty_slots
            .iter()
            .flatten()
            .filter_map(|&slot| self.filters.get(slot))
    }

    pub fn verify<P: DeviceProxy + ?Sized>(&self, proxy: &mut P) -> CheckResult {
        proxy::refresh(proxy);

        let WheelDevice::Physical(name) = &self.device else {
            return Ok(());
        };

        proxy
            .resolve(name)
            .map(|_| ())
            .map_err(|_| CheckError::DeviceNotFound {
                kind: DeviceKind::FilterWheel,
                device: name.clone(),
            })
    }

    pub fn check<P: DeviceProxy + ?Sized>(&self, proxy: &mut P) -> bool {
        match self.verify(proxy) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("FilterWheel: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::testing::RefusingProxy;

    #[test]
    fn sentinel_name_parses_to_absent() {
        let wheel: FilterWheel = toml::from_str(r#"name = "FAKE_FTW""#).unwrap();
        assert!(wheel.is_absent());
        assert_eq!(wheel.name(), ABSENT_WHEEL_NAME);

        let wheel: FilterWheel = toml::from_str(r#"name = "FAKE""#).unwrap();
        assert_eq!(wheel.device, WheelDevice::Physical("FAKE".to_string()));
    }

    #[test]
    fn absent_wheel_serializes_as_sentinel() {
        let text = toml::to_string(&FilterWheel::absent()).unwrap();
        assert!(text.contains(r#"name = "FAKE_FTW""#));
    }

    #[traced_test]
    #[test]
    fn absent_wheel_passes_without_resolving() {
        let mut proxy = RefusingProxy::default();
        let wheel = FilterWheel::new(ABSENT_WHEEL_NAME, Vec::new());

        assert!(wheel.check(&mut proxy));
        assert_eq!(proxy.resolve_calls, 0);
        assert_eq!(proxy.refresh_calls, 1);
        assert!(!logs_contain("not present"));
    }

    #[traced_test]
    #[test]
    fn missing_wheel_logs_once() {
        let mut proxy = RefusingProxy::default();
        let wheel = FilterWheel::new("W0", Vec::new());

        assert!(!wheel.check(&mut proxy));
        assert_eq!(proxy.resolve_calls, 1);
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("filter wheel device W0 not present"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected one error line, got {n}")),
            }
        });
    }

    #[test]
    fn verify_reports_device_kind() {
        let mut proxy = RefusingProxy::default();
        let wheel = FilterWheel::new("W0", Vec::new());

        assert_eq!(
            wheel.verify(&mut proxy),
            Err(CheckError::DeviceNotFound {
                kind: DeviceKind::FilterWheel,
                device: "W0".to_string(),
            })
        );
    }

    #[test]
    fn empty_slots_follow_slot_order() {
        let mut wheel = FilterWheel::new(
            "W0",
            vec![
                Filter::new("open"),
                Filter::new("R"),
                Filter::new("empty8"),
                Filter::new("V"),
            ],
        );
        assert!(wheel.empty_slots.is_none());

        wheel.mark_empty_slots(&["empty8", "open"]);

        assert_eq!(wheel.empty_slots, Some(vec![0, 2]));
        let names: Vec<_> = wheel.empty_slot_filters().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["open", "empty8"]);
        assert_eq!(wheel.filter("V").map(|f| f.name.as_str()), Some("V"));
    }
}
