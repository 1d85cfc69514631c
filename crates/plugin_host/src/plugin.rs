//! Plugin trait, identity and lifecycle events

use crate::error::{PluginError, PluginHostError};
use crate::event::Event;
use crate::manager::PluginManager;
use compact_str::CompactString;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Plugin contract
///
/// Every hook receives the manager driving the transition and defaults to a
/// no-op. Hook failures (returned errors or panics) are reported by the
/// manager and never block the transition's bookkeeping.
///
/// Disabling a plugin purges every handler it registered. Plugins that should
/// survive a disable/enable cycle register their listeners in
/// [`Plugin::on_enable`] rather than [`Plugin::on_load`].
pub trait Plugin: Send + Sync + 'static {
    /// Returns the unique name of this plugin
    fn name(&self) -> &str;

    /// Returns the version of this plugin
    fn version(&self) -> Version;

    /// Called once when the plugin is loaded, before it is enabled
    fn on_load(&self, _manager: &PluginManager) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called each time the plugin is enabled, after `PluginEnableEvent` is sent
    fn on_enable(&self, _manager: &PluginManager) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called each time the plugin is disabled, after `PluginDisableEvent` is sent
    fn on_disable(&self, _manager: &PluginManager) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called once when the plugin is unloaded, after its handlers are revoked
    fn on_unload(&self, _manager: &PluginManager) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Key identifying a plugin inside the host
///
/// Handler entries store this key rather than a reference to the plugin, so
/// revoking a plugin's handlers is a table filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(CompactString);

impl PluginId {
    pub fn new(name: &str) -> Self {
        Self(CompactString::new(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for PluginId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Borrow<str> for PluginId {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plugin version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Check if two versions are compatible (major.minor matching)
    pub fn is_compatible_with(&self, other: &Version) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = PluginHostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(PluginHostError::InvalidVersion(s.to_string()));
        }

        let parse = |part: &str| {
            part.parse::<u32>()
                .map_err(|_| PluginHostError::InvalidVersion(s.to_string()))
        };

        Ok(Self::new(parse(parts[0])?, parse(parts[1])?, parse(parts[2])?))
    }
}

/// Registry state of a known plugin
///
/// A disabled plugin is simply `Loaded`: disabling returns it to the state it
/// had right after loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Loaded,
    Enabled,
}

/// Snapshot of a plugin's registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub id: PluginId,
    pub version: Version,
    pub state: PluginState,
    /// Position in load order, lower loaded earlier
    pub load_order: u64,
}

/// Common shape of the lifecycle events emitted by the manager
pub trait PluginEvent: Event {
    /// The plugin the transition applies to
    fn plugin(&self) -> &PluginId;

    /// Version of that plugin
    fn version(&self) -> Version;
}

/// Sent when a loaded plugin becomes enabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEnableEvent {
    pub plugin: PluginId,
    pub version: Version,
}

/// Sent when an enabled plugin is disabled, before its handlers are revoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDisableEvent {
    pub plugin: PluginId,
    pub version: Version,
}

impl Event for PluginEnableEvent {
    fn event_type() -> &'static str {
        "plugin_enable"
    }
}

impl Event for PluginDisableEvent {
    fn event_type() -> &'static str {
        "plugin_disable"
    }
}

impl PluginEvent for PluginEnableEvent {
    fn plugin(&self) -> &PluginId {
        &self.plugin
    }

    fn version(&self) -> Version {
        self.version
    }
}

impl PluginEvent for PluginDisableEvent {
    fn plugin(&self) -> &PluginId {
        &self.plugin
    }

    fn version(&self) -> Version {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    #[test]
    fn test_version_parsing() {
        assert_eq!("1.2.3".parse::<Version>().unwrap(), Version::new(1, 2, 3));
        assert_eq!(" 0.1.0 ".parse::<Version>().unwrap(), Version::new(0, 1, 0));
        assert!("1.2".parse::<Version>().is_err());
        assert!("1.x.3".parse::<Version>().is_err());
        assert!(matches!(
            "invalid".parse::<Version>(),
            Err(PluginHostError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_version_compatibility() {
        let base = Version::new(1, 2, 3);
        assert!(base.is_compatible_with(&Version::new(1, 2, 9)));
        assert!(!base.is_compatible_with(&Version::new(1, 3, 0)));
        assert!(!base.is_compatible_with(&Version::new(2, 2, 3)));
        assert_eq!(base.to_string(), "1.2.3");
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 9));
    }

    #[test]
    fn plugin_id_looks_up_by_str() {
        let map: DashMap<PluginId, u32> = DashMap::new();
        map.insert(PluginId::new("greeter"), 7);
        assert_eq!(map.get("greeter").map(|v| *v), Some(7));
        assert!(map.get("other").is_none());
        assert_eq!(PluginId::from("greeter").to_string(), "greeter");
    }
}
