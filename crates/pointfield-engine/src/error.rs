//! Error taxonomy for resource creation and pipeline initialization.
//!
//! Callers only branch on the fixed set of categories defined here. Raw device
//! failures (`AllocationError`) never escape on their own; they are wrapped in
//! the category of the resource that was being created.

use thiserror::Error;

use crate::device::SurfaceErrorAction;

/// Low-level failure reported while allocating a device object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("zero-sized allocation")]
    ZeroSized,

    #[error("requested {requested} exceeds the device limit of {limit}")]
    ExceedsLimit { requested: u64, limit: u64 },

    #[error("format {0:?} does not support the requested usage")]
    UnsupportedFormat(wgpu::TextureFormat),

    #[error("device is out of memory")]
    OutOfMemory,

    #[error("device rejected the allocation: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to create buffer `{label}`: {source}")]
pub struct BufferCreationError {
    pub label: String,
    #[source]
    pub source: AllocationError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to create texture `{label}`: {source}")]
pub struct TextureCreationError {
    pub label: String,
    #[source]
    pub source: AllocationError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryCreationError {
    /// A required program name is not declared by any source in the catalog.
    #[error("program library `{library}` has no program named `{name}`")]
    MissingProgram { library: String, name: String },

    #[error("failed to compile `{source_label}` for program library `{library}`: {source}")]
    Compile {
        library: String,
        source_label: String,
        #[source]
        source: AllocationError,
    },
}

impl LibraryCreationError {
    /// Name of the program that could not be resolved, if that is the cause.
    pub fn missing_program(&self) -> Option<&str> {
        match self {
            Self::MissingProgram { name, .. } => Some(name),
            Self::Compile { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineCreationError {
    #[error("pipeline `{pipeline}` references unknown {stage} program `{name}`")]
    MissingProgram {
        pipeline: String,
        stage: &'static str,
        name: String,
    },

    #[error("failed to create pipeline `{pipeline}`: {source}")]
    Rejected {
        pipeline: String,
        #[source]
        source: AllocationError,
    },
}

/// Failure of the startup initialization sequence.
///
/// Every variant is fatal to the initialization that raised it; none is
/// retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// A required hardware tier is absent and no degraded path exists.
    #[error("unsupported device: {reason}")]
    UnsupportedDevice { reason: String },

    #[error(transparent)]
    Buffer(#[from] BufferCreationError),

    #[error(transparent)]
    Library(#[from] LibraryCreationError),

    #[error(transparent)]
    Pipeline(#[from] PipelineCreationError),

    #[error(transparent)]
    Texture(#[from] TextureCreationError),
}

/// What the application does after surfacing an `InitError` to the user.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Recovery {
    /// The baseline graphics API is unusable; exit after acknowledgment.
    Terminate,
    /// Continue with reduced functionality once dismissed.
    Degrade,
}

impl InitError {
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::UnsupportedDevice { .. } => Recovery::Terminate,
            _ => Recovery::Degrade,
        }
    }
}

/// Failure that aborts one frame before anything is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The point buffer could not follow the requested occupancy.
    #[error(transparent)]
    Buffer(#[from] BufferCreationError),

    #[error("surface unavailable ({0:?})")]
    Surface(SurfaceErrorAction),
}

impl FrameError {
    /// Whether rendering cannot continue on this surface.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Surface(action) if action.is_fatal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unsupported_device_terminates() {
        let unsupported = InitError::UnsupportedDevice {
            reason: "no compute".into(),
        };
        assert_eq!(unsupported.recovery(), Recovery::Terminate);

        let texture = InitError::from(TextureCreationError {
            label: "render target".into(),
            source: AllocationError::ZeroSized,
        });
        assert_eq!(texture.recovery(), Recovery::Degrade);
    }

    #[test]
    fn library_error_names_the_program() {
        let err = LibraryCreationError::MissingProgram {
            library: "pointfield programs".into(),
            name: "blur_image".into(),
        };
        assert_eq!(err.missing_program(), Some("blur_image"));
        assert!(err.to_string().contains("`blur_image`"));
    }

    #[test]
    fn wrapped_errors_keep_their_message() {
        let inner = BufferCreationError {
            label: "points".into(),
            source: AllocationError::ExceedsLimit {
                requested: 10,
                limit: 4,
            },
        };
        let outer = InitError::from(inner.clone());
        assert_eq!(outer.to_string(), inner.to_string());
    }

    #[test]
    fn only_fatal_surface_errors_end_rendering() {
        let buffer = FrameError::from(BufferCreationError {
            label: "points".into(),
            source: AllocationError::ZeroSized,
        });
        assert!(!buffer.is_fatal());
        assert!(!FrameError::Surface(SurfaceErrorAction::SkipFrame).is_fatal());
        assert!(FrameError::Surface(SurfaceErrorAction::Fatal).is_fatal());
    }
}
