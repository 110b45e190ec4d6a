use std::{
    thread,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CheckError, CheckResult, DeviceKind, ProxyError},
    proxy::{self, DeviceProxy, Value},
};

pub const FOCUS_MIN: &str = "foc_min";
pub const FOCUS_MAX: &str = "foc_max";
pub const FOCUS_DEFAULT: &str = "FOC_DEF";

/// Bounds on how long a written focus default may take to show up on the device.
#[derive(Deserialize, Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct SettlePolicy {
    pub max_polls: u32,
    pub poll_interval_ms: u64,
    pub time_limit_ms: u64,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            max_polls: 100,
            poll_interval_ms: 10,
            time_limit_ms: 5000,
        }
    }
}

impl SettlePolicy {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

/// Where [`Focuser::verify`] took the travel range from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSource {
    Device,
    AbsoluteLimits,
}

#[derive(Deserialize, Debug, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Focuser {
    pub name: String,
    pub resolution: f64,
    pub abs_lower_limit: i64,
    pub abs_upper_limit: i64,
    pub lower_limit: i64,
    pub upper_limit: i64,
    pub step_size: i64,
    pub speed: f64,
    pub temperature_compensation: bool,
    pub focus_offset: Option<i64>,
    pub focus_default: Option<i64>,
    pub settle: SettlePolicy,

    #[serde(skip)]
    pub focus_min: Option<i64>,
    #[serde(skip)]
    pub focus_max: Option<i64>,
}

impl Default for Focuser {
    fn default() -> Self {
        Self {
            name: "F0".to_string(),
            resolution: 20.0,
            abs_lower_limit: -12000,
            abs_upper_limit: 12000,
            lower_limit: -1000,
            upper_limit: 1000,
            step_size: 100,
            speed: 100.0,
            temperature_compensation: false,
            focus_offset: None,
            focus_default: None,
            settle: SettlePolicy::default(),
            focus_min: None,
            focus_max: None,
        }
    }
}

impl Focuser {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Travel range reported by the last check, absolute limits before that.
    pub fn travel(&self) -> (i64, i64) {
        (
            self.focus_min.unwrap_or(self.abs_lower_limit),
            self.focus_max.unwrap_or(self.abs_upper_limit),
        )
    }

    pub fn is_within_limits(&self, position: i64) -> bool {
        let (min, max) = self.travel();
        (min..=max).contains(&position)
    }

    pub fn clamp(&self, position: i64) -> i64 {
        let (min, max) = self.travel();
        position.max(min).min(max)
    }

    pub fn verify<P: DeviceProxy + ?Sized>(&mut self, proxy: &mut P) -> CheckResult<LimitSource> {
        proxy::refresh(proxy);

        let device = proxy
            .resolve(&self.name)
            .map_err(|_| CheckError::DeviceNotFound {
                kind: DeviceKind::Focuser,
                device: self.name.clone(),
            })?;

        let reported = device
            .value(FOCUS_MIN)
            .and_then(Value::as_i64)
            .zip(device.value(FOCUS_MAX).and_then(Value::as_i64));

        match reported {
            Some((min, max)) => {
                self.focus_min = Some(min);
                self.focus_max = Some(max);
                Ok(LimitSource::Device)
            }
            None => {
                tracing::warn!(
                    "check: {} has no {} or {} properties, using absolute limits",
                    self.name,
                    FOCUS_MIN,
                    FOCUS_MAX
                );
                self.focus_min = Some(self.abs_lower_limit);
                self.focus_max = Some(self.abs_upper_limit);
                Ok(LimitSource::AbsoluteLimits)
            }
        }
    }

    pub fn check<P: DeviceProxy + ?Sized>(&mut self, proxy: &mut P) -> bool {
        match self.verify(proxy) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("check: {}", e);
                false
            }
        }
    }

    /// Writes `FOC_DEF` and polls until the device reports a value within
    /// `resolution` of `target`. The truncated readback becomes `focus_default`.
    pub fn write_focus_default<P: DeviceProxy + ?Sized>(
        &mut self,
        proxy: Option<&mut P>,
        target: Option<i64>,
    ) -> CheckResult<i64> {
        let (proxy, target) = match (proxy, target) {
            (Some(proxy), Some(target)) => (proxy, target),
            (proxy, _) => {
                let argument = if proxy.is_none() { "proxy" } else { FOCUS_DEFAULT };
                tracing::error!(
                    "writeFocDef: {} specify proxy and {}, missing {}",
                    self.name,
                    FOCUS_DEFAULT,
                    argument
                );
                return Err(CheckError::MissingArgument {
                    device: self.name.clone(),
                    argument,
                });
            }
        };

        proxy.write_property(&self.name, FOCUS_DEFAULT, Value::Integer(target))?;

        let started = Instant::now();
        let mut last = None;
        let mut polls = 0;

        while polls < self.settle.max_polls {
            polls += 1;
            proxy::refresh(proxy);

            let value = proxy.read_property(&self.name, FOCUS_DEFAULT)?;
            let readback = value.as_f64().ok_or_else(|| ProxyError::InvalidValue {
                device: self.name.clone(),
                property: FOCUS_DEFAULT.to_string(),
                value: value.clone(),
            })?;
            last = Some(readback);

            if (readback - target as f64).abs() < self.resolution {
                let settled = readback.trunc() as i64;
                tracing::debug!(
                    "writeFocDef: {} settled at {} after {} polls",
                    self.name,
                    settled,
                    polls
                );
                self.focus_default = Some(settled);
                return Ok(settled);
            }

            if started.elapsed() >= self.settle.time_limit() {
                break;
            }

            tracing::trace!("writeFocDef: {} reads {}, waiting", self.name, readback);
            if polls < self.settle.max_polls {
                thread::sleep(self.settle.poll_interval());
            }
        }

        Err(CheckError::SettleTimeout {
            device: self.name.clone(),
            property: FOCUS_DEFAULT.to_string(),
            target,
            last,
            polls,
        })
    }
}
