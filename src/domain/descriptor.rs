use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use super::error::DescriptorError;

/// Field whose truthiness marks a JSON file as a render descriptor.
pub const DISCRIMINATOR_FIELD: &str = "renderform";

/// Substitution values sent to the service exactly as the descriptor holds them.
pub type RenderData = Map<String, Value>;

/// A JSON file describing one image to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderDescriptor {
    path: PathBuf,
    template_id: Option<String>,
    data: RenderData,
}

impl RenderDescriptor {
    /// Parse raw file contents.
    ///
    /// Returns `Ok(None)` for well-formed JSON that is not a descriptor: a
    /// non-object document, or one whose discriminator is absent or falsy.
    pub fn parse(
        path: impl Into<PathBuf>,
        contents: &[u8],
    ) -> Result<Option<Self>, DescriptorError> {
        let path = path.into();
        let document: Value =
            serde_json::from_slice(contents).map_err(|source| DescriptorError::Json {
                path: path.clone(),
                source,
            })?;

        let Value::Object(mut object) = document else {
            return Ok(None);
        };

        if !object.get(DISCRIMINATOR_FIELD).is_some_and(is_truthy) {
            return Ok(None);
        }

        let template_id = ["template", "templateId"]
            .iter()
            .find_map(|key| match object.get(*key) {
                Some(Value::String(value)) if !value.trim().is_empty() => {
                    Some(value.trim().to_string())
                }
                _ => None,
            });

        let data = match object.remove("data") {
            None | Some(Value::Null) => RenderData::new(),
            Some(Value::Object(values)) => values,
            Some(_) => {
                return Err(DescriptorError::invalid_data(path, "`data` must be an object"));
            }
        };

        Ok(Some(Self {
            path,
            template_id,
            data,
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    pub fn data(&self) -> &RenderData {
        &self.data
    }

    /// Descriptor file name without its `.json` extension.
    pub fn stem(&self) -> &OsStr {
        self.path.file_stem().unwrap_or_default()
    }

    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Sibling path the artifact for `extension` is saved at.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        let mut name = self.stem().to_os_string();
        name.push(".");
        name.push(extension);
        self.directory().join(name)
    }
}

/// JavaScript truthiness: `false`, `null`, `0`, `NaN` and `""` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
