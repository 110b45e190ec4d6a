//! In-memory device daemon.
//!
//! Used where no hardware is attached and as the proxy in tests. Writes can be
//! delayed by a number of refreshes to behave like slow devices such as the
//! dummy focuser, and readbacks can be scripted per property.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{
    error::ProxyError,
    proxy::{Device, DeviceProxy, Property, Value},
};

#[derive(Deserialize, Debug, Serialize, Clone, PartialEq, Default)]
pub struct SimulatedDevice {
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

#[derive(Deserialize, Debug, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Refreshes that pass before a written value can be read back.
    pub write_lag_refreshes: u32,
    pub devices: Vec<SimulatedDevice>,
}

#[derive(Debug)]
struct PendingWrite {
    device: String,
    property: String,
    value: Value,
    refreshes_left: u32,
}

#[derive(Debug, Default)]
pub struct SimulatedProxy {
    devices: BTreeMap<String, Device>,
    offline: BTreeSet<String>,
    pending: Vec<PendingWrite>,
    scripted: HashMap<(String, String), VecDeque<Value>>,
    write_lag_refreshes: u32,

    refreshes: usize,
    resolves: BTreeMap<String, usize>,
    writes: Vec<(String, String, Value)>,
}

impl SimulatedProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        let mut proxy = Self {
            write_lag_refreshes: config.write_lag_refreshes,
            ..Self::default()
        };

        for simulated in &config.devices {
            let mut device = Device::new(simulated.name.clone());
            for (name, value) in &simulated.properties {
                device
                    .properties
                    .insert(name.clone(), Property::new(value.clone()));
            }
            proxy.add_device(device);
        }

        proxy
    }

    pub fn add_device(&mut self, device: Device) {
        self.devices.insert(device.name.clone(), device);
    }

    pub fn set_offline(&mut self, device: &str) {
        self.offline.insert(device.to_string());
    }

    pub fn set_online(&mut self, device: &str) {
        self.offline.remove(device);
    }

    pub fn set_write_lag(&mut self, refreshes: u32) {
        self.write_lag_refreshes = refreshes;
    }

    /// Queues values returned by successive reads of one property, ahead of its stored value.
    pub fn script_readbacks<V: Into<Value>>(
        &mut self,
        device: &str,
        property: &str,
        values: impl IntoIterator<Item = V>,
    ) {
        self.scripted
            .entry((device.to_string(), property.to_string()))
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    pub fn resolve_count(&self, device: &str) -> usize {
        self.resolves.get(device).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> &[(String, String, Value)] {
        &self.writes
    }

    fn online_device(&mut self, device: &str) -> Result<&mut Device, ProxyError> {
        if self.offline.contains(device) {
            return Err(ProxyError::DeviceNotFound {
                device: device.to_string(),
            });
        }

        self.devices
            .get_mut(device)
            .ok_or_else(|| ProxyError::DeviceNotFound {
                device: device.to_string(),
            })
    }

    fn apply(&mut self, device: &str, property: &str, value: Value) {
        let Some(device) = self.devices.get_mut(device) else {
            return;
        };

        match device.properties.get_mut(property) {
            Some(entry) => entry.value = value,
            None => {
                device
                    .properties
                    .insert(property.to_string(), Property::new(value));
            }
        }
    }
}

impl DeviceProxy for SimulatedProxy {
    fn refresh(&mut self) -> Result<(), ProxyError> {
        self.refreshes += 1;

        let mut due = Vec::new();
        self.pending.retain_mut(|write| {
            write.refreshes_left = write.refreshes_left.saturating_sub(1);
            if write.refreshes_left == 0 {
                due.push((
                    write.device.clone(),
                    write.property.clone(),
                    write.value.clone(),
                ));
                false
            } else {
                true
            }
        });

        for (device, property, value) in due {
            self.apply(&device, &property, value);
        }

        Ok(())
    }

    fn resolve(&mut self, device: &str) -> Result<Device, ProxyError> {
        *self.resolves.entry(device.to_string()).or_default() += 1;
        self.online_device(device).map(|device| device.clone())
    }

    fn read_property(&mut self, device: &str, property: &str) -> Result<Value, ProxyError> {
        self.online_device(device)?;

        let key = (device.to_string(), property.to_string());
        if let Some(value) = self.scripted.get_mut(&key).and_then(VecDeque::pop_front) {
            self.apply(device, property, value.clone());
            return Ok(value);
        }

        self.online_device(device)?
            .value(property)
            .cloned()
            .ok_or_else(|| ProxyError::PropertyNotFound {
                device: device.to_string(),
                property: property.to_string(),
            })
    }

    fn write_property(
        &mut self,
        device: &str,
        property: &str,
        value: Value,
    ) -> Result<(), ProxyError> {
        if self.online_device(device)?.property(property).is_none() {
            return Err(ProxyError::PropertyNotFound {
                device: device.to_string(),
                property: property.to_string(),
            });
        }

        self.writes
            .push((device.to_string(), property.to_string(), value.clone()));

        if self.write_lag_refreshes == 0 {
            self.apply(device, property, value);
        } else {
            self.pending.push(PendingWrite {
                device: device.to_string(),
                property: property.to_string(),
                value,
                refreshes_left: self.write_lag_refreshes,
            });
        }

        Ok(())
    }
}
