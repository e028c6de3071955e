use std::borrow::Cow;
use std::path::PathBuf;

use crate::device::GpuError;

/// Where the WGSL program comes from.
///
/// Whatever the source, the program must define `vs_main` and `fs_main`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ShaderSource {
    /// The built-in point shader ([`ShaderSource::EMBEDDED`]).
    #[default]
    Embedded,
    /// A WGSL file read at startup.
    File(PathBuf),
    Inline(String),
}

impl ShaderSource {
    /// Built-in program: passes position through and interpolates vertex color.
    pub const EMBEDDED: &'static str = include_str!("shaders/points.wgsl");

    /// Returns the program text, reading it from disk for [`ShaderSource::File`].
    pub fn load(&self) -> Result<Cow<'_, str>, GpuError> {
        match self {
            ShaderSource::Embedded => Ok(Cow::Borrowed(Self::EMBEDDED)),
            ShaderSource::Inline(text) => Ok(Cow::Borrowed(text.as_str())),
            ShaderSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|e| {
                    log::error!("couldn't read shader at {}: {e}", path.display());
                    GpuError::resource(
                        "shader source",
                        format!("couldn't read {}: {e}", path.display()),
                    )
                }),
        }
    }

    /// Debug label for the shader module.
    pub fn label(&self) -> String {
        match self {
            ShaderSource::Embedded => "prism embedded shader".to_string(),
            ShaderSource::File(path) => format!("prism shader {}", path.display()),
            ShaderSource::Inline(_) => "prism inline shader".to_string(),
        }
    }
}
