use anyhow::{bail, Context, Result};
use blocks_common::{EditorSettings, HostData};
use blocks_schema::{AttributeMap, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Host snapshot plus the editor settings that sit next to it
#[derive(Debug, Clone)]
pub struct Loaded {
    pub host: Arc<HostData>,
    pub settings: Arc<EditorSettings>,
}

impl Loaded {
    /// Load a snapshot; settings come from `config_dir`, else the snapshot's directory
    pub fn load(snapshot: &Path, config_dir: Option<&Path>) -> Result<Self> {
        let host = HostData::load(snapshot)
            .with_context(|| format!("Cannot read host snapshot {}", snapshot.display()))?;

        let dir = match config_dir {
            Some(dir) => dir.to_path_buf(),
            None => snapshot
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let settings = EditorSettings::load(&dir)
            .with_context(|| format!("Cannot read editor settings in {}", dir.display()))?;

        Ok(Self {
            host: Arc::new(host),
            settings: Arc::new(settings),
        })
    }
}

/// Block attributes from a JSON file
///
/// Accepts either a full `{componentId, properties, blockId}` map or a bare
/// properties object.
pub fn load_attributes(path: Option<&Path>, component_id: &str) -> Result<AttributeMap> {
    let Some(path) = path else {
        return Ok(AttributeMap::for_component(component_id));
    };

    let content =
        std::fs::read_to_string(path).with_context(|| format!("Cannot read attributes {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)?;

    let attrs = match value {
        Value::Object(map) if map.contains_key("properties") || map.contains_key("componentId") => {
            serde_json::from_value::<AttributeMap>(Value::Object(map))?
        }
        Value::Object(map) => AttributeMap::for_component(component_id).with_properties(map),
        _ => bail!("Attributes in {} must be a JSON object", path.display()),
    };
    Ok(attrs)
}
