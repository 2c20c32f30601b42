use thiserror::Error;

/// Hard failures. Generation stops and returns no partial output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },
}

impl GenerationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        GenerationError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            GenerationError::InvalidParameter { field, .. } => field,
        }
    }
}

/// Soft problems, reported alongside a successful layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    // an optional template or material is absent, the feature is skipped
    MissingDependency {
        dependency: &'static str,
        feature: &'static str,
    },
    // a requested count was clamped to its configured maximum
    CapacityExceeded {
        resource: &'static str,
        requested: u32,
        allowed: u32,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingDependency { dependency, feature } => {
                write!(f, "{dependency} not assigned, skipping {feature}")
            }
            Diagnostic::CapacityExceeded {
                resource,
                requested,
                allowed,
            } => write!(f, "{requested} {resource} requested, clamped to {allowed}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;

// shared range checks for parameter validation
pub(crate) fn check_unit(field: &'static str, value: f32) -> Result<()> {
    check_range(field, value, 0.0, 1.0)
}

pub(crate) fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(GenerationError::invalid(
            field,
            format!("{value} is outside [{min}, {max}]"),
        ));
    }
    Ok(())
}

pub(crate) fn check_non_negative(field: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(GenerationError::invalid(
            field,
            format!("{value} must be a finite value >= 0"),
        ));
    }
    Ok(())
}

pub(crate) fn check_positive(field: &'static str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(GenerationError::invalid(field, "must be at least 1"));
    }
    Ok(())
}
