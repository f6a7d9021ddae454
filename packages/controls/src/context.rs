use blocks_common::{EditorSettings, HostData, I18n};

/// Read-only inputs every control renders against
#[derive(Debug, Clone, Copy)]
pub struct ControlContext<'a> {
    pub host: &'a HostData,
    pub settings: &'a EditorSettings,
}

impl<'a> ControlContext<'a> {
    pub fn new(host: &'a HostData, settings: &'a EditorSettings) -> Self {
        Self { host, settings }
    }

    pub fn i18n(&self) -> &'a I18n {
        &self.host.i18n
    }

    /// Localized string, falling back to the key
    pub fn t(&self, key: &'a str) -> &'a str {
        self.host.i18n.get(key)
    }
}
