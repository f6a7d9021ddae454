pub mod blocks;
pub mod controls;
pub mod inspect;
pub mod preview;

pub use blocks::{blocks, BlocksArgs};
pub use controls::{controls, ControlsArgs};
pub use inspect::{inspect, InspectArgs};
pub use preview::{preview, PreviewArgs};

use anyhow::{anyhow, Result};
use blocks_editor::{BlockRegistration, BlockRegistry};

/// Registration by block name or bare component id
pub(crate) fn find_block<'a>(registry: &'a BlockRegistry, name: &str) -> Result<&'a BlockRegistration> {
    registry
        .get(name)
        .or_else(|| registry.for_component(name))
        .ok_or_else(|| anyhow!("No component block named '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocks_common::{EditorSettings, HostData};
    use blocks_editor::BlockRegistrar;
    use std::sync::Arc;

    #[test]
    fn test_find_block_by_name_or_component_id() {
        let host = HostData::from_json(r#"{"components":[{"id":"hero","elements":[{"label":"Hero"}]}]}"#).unwrap();
        let registry =
            BlockRegistrar::new(Arc::new(host), Arc::new(EditorSettings::default())).register_all();

        assert_eq!(find_block(&registry, "component-blocks/hero").unwrap().title, "Hero");
        assert_eq!(find_block(&registry, "hero").unwrap().name, "component-blocks/hero");
        assert!(find_block(&registry, "missing").is_err());
    }
}
