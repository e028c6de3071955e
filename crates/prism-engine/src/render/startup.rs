use thiserror::Error;

use crate::device::GpuError;

/// Ordered initialization stages. Each runs only if every earlier one succeeded.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StartupStage {
    CreateInstance,
    CreateSurface,
    RequestAdapter,
    RequestDevice,
    ConfigureSurface,
    CompileShader,
    CreatePipeline,
    UploadGeometry,
}

impl StartupStage {
    pub fn name(self) -> &'static str {
        match self {
            StartupStage::CreateInstance => "create instance",
            StartupStage::CreateSurface => "create surface",
            StartupStage::RequestAdapter => "request adapter",
            StartupStage::RequestDevice => "request device",
            StartupStage::ConfigureSurface => "configure surface",
            StartupStage::CompileShader => "compile shader",
            StartupStage::CreatePipeline => "create pipeline",
            StartupStage::UploadGeometry => "upload geometry",
        }
    }
}

impl std::fmt::Display for StartupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Initialization failure, tagged with the stage that failed.
#[derive(Debug, Error)]
#[error("startup failed at '{stage}': {source}")]
pub struct StartupError {
    pub stage: StartupStage,
    #[source]
    pub source: GpuError,
}

/// Runs one stage's result through logging and tags failures with the stage.
pub(crate) fn stage<T>(stage: StartupStage, result: Result<T, GpuError>) -> Result<T, StartupError> {
    match result {
        Ok(value) => {
            log::info!("startup: {stage} ok");
            Ok(value)
        }
        Err(source) => {
            log::error!("startup: {stage} failed: {source}");
            Err(StartupError { stage, source })
        }
    }
}
