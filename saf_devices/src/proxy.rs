use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Double(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value. Text is parsed, booleans are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::Text(text) => text.trim().parse().ok(),
            Value::Bool(_) => None,
        }
    }

    /// Same as [`Value::as_f64`], truncated toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => self.as_f64().map(|v| v.trunc() as i64),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// One row of a device's property table: daemon flags followed by the current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub flags: u32,
    pub value: Value,
}

impl Property {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            flags: 0,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub name: String,
    pub properties: BTreeMap<String, Property>,
}

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), Property::new(value));
        self
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.property(name).map(|property| &property.value)
    }
}

/// Client side of the device daemon.
///
/// Every call is a blocking round trip. Implementations own whatever cache
/// they keep; `refresh` is the only way callers ask for it to be updated.
pub trait DeviceProxy {
    fn refresh(&mut self) -> Result<(), ProxyError>;

    fn resolve(&mut self, device: &str) -> Result<Device, ProxyError>;

    fn read_property(&mut self, device: &str, property: &str) -> Result<Value, ProxyError>;

    fn write_property(
        &mut self,
        device: &str,
        property: &str,
        value: Value,
    ) -> Result<(), ProxyError>;
}

impl<P: DeviceProxy + ?Sized> DeviceProxy for &mut P {
    fn refresh(&mut self) -> Result<(), ProxyError> {
        (**self).refresh()
    }

    fn resolve(&mut self, device: &str) -> Result<Device, ProxyError> {
        (**self).resolve(device)
    }

    fn read_property(&mut self, device: &str, property: &str) -> Result<Value, ProxyError> {
        (**self).read_property(device, property)
    }

    fn write_property(
        &mut self,
        device: &str,
        property: &str,
        value: Value,
    ) -> Result<(), ProxyError> {
        (**self).write_property(device, property, value)
    }
}

impl<P: DeviceProxy + ?Sized> DeviceProxy for Box<P> {
    fn refresh(&mut self) -> Result<(), ProxyError> {
        (**self).refresh()
    }

    fn resolve(&mut self, device: &str) -> Result<Device, ProxyError> {
        (**self).resolve(device)
    }

    fn read_property(&mut self, device: &str, property: &str) -> Result<Value, ProxyError> {
        (**self).read_property(device, property)
    }

    fn write_property(
        &mut self,
        device: &str,
        property: &str,
        value: Value,
    ) -> Result<(), ProxyError> {
        (**self).write_property(device, property, value)
    }
}

/// A failed refresh is logged and otherwise ignored.
pub(crate) fn refresh<P: DeviceProxy + ?Sized>(proxy: &mut P) {
    if let Err(e) = proxy.refresh() {
        tracing::warn!("proxy refresh failed: {}", e);
    }
}
