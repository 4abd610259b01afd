//! Parsing and serialization of [`EventKind`]

use super::EventKind;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Bare plugin lifecycle names used before the `plugin.*` family existed.
const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("pluginActivated", "plugin.activated"),
    ("pluginDeactivated", "plugin.deactivated"),
    ("pluginUninstalled", "plugin.uninstalled"),
];

impl EventKind {
    /// Parse an event name, normalizing `:` separators and legacy aliases.
    ///
    /// Never fails: unknown names become [`EventKind::Custom`].
    pub fn parse(name: &str) -> EventKind {
        let name = name.trim();
        if let Some((_, canonical)) = LEGACY_ALIASES.iter().find(|(legacy, _)| *legacy == name) {
            return Self::from_builtin(canonical).unwrap_or_else(|| EventKind::Custom(name.into()));
        }

        let normalized = name.replacen(':', ".", 1);
        Self::from_builtin(&normalized).unwrap_or(EventKind::Custom(normalized))
    }

    /// Custom kind for an event relayed from a plugin: `plugin.<name>`.
    pub fn plugin(name: &str) -> EventKind {
        EventKind::parse(&format!("plugin.{}", name))
    }

    /// Component part of the name, e.g. `toolManager`.
    pub fn component(&self) -> &str {
        let name = self.as_str();
        name.split_once('.').map(|(c, _)| c).unwrap_or(name)
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, EventKind::Custom(_))
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EventKind::parse(s))
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(EventKind::parse(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colon_separator_is_normalized() {
        assert_eq!(
            EventKind::parse("integration:ocrResultsAvailable"),
            EventKind::OcrResultsAvailable
        );
        assert_eq!(
            EventKind::parse("imageEditor:imageUpdated"),
            EventKind::ImageUpdated
        );
        assert_eq!(
            EventKind::parse("toolManager.toolActivated"),
            EventKind::ManagerToolActivated
        );
    }

    #[test]
    fn test_legacy_plugin_names() {
        assert_eq!(EventKind::parse("pluginActivated"), EventKind::PluginActivated);
        assert_eq!(EventKind::parse("pluginUninstalled"), EventKind::PluginUninstalled);
    }

    #[test]
    fn test_unknown_name_is_custom() {
        assert_eq!(
            EventKind::parse("reader:pageTurned"),
            EventKind::Custom("reader.pageTurned".into())
        );
        assert_eq!(EventKind::plugin("sfxPlaced"), EventKind::Custom("plugin.sfxPlaced".into()));
        assert_eq!(EventKind::plugin("activated"), EventKind::PluginActivated);
    }

    #[test]
    fn test_component() {
        assert_eq!(EventKind::ManagerCommandFailed.component(), "toolManager");
        assert_eq!(EventKind::TranslationReady.component(), "integration");
    }

    #[test]
    fn test_serde_round_trip_uses_names() {
        let json = serde_json::to_string(&EventKind::UiModeChanged).unwrap();
        assert_eq!(json, "\"ui.modeChanged\"");
        let kind: EventKind = serde_json::from_str("\"ui:displayChanged\"").unwrap();
        assert_eq!(kind, EventKind::UiDisplayChanged);
    }
}
