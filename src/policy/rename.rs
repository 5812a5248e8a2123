//! Cosmetic renaming of a project.
use super::StepContext;
use serde::Deserialize;

/// Configuration for [`Rename`]
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenameParams {
    /// The start of the new name
    pub prefix: String,
}

impl Default for RenameParams {
    fn default() -> Self {
        Self {
            prefix: "Fancy project".into(),
        }
    }
}

/// Renames the project every step to a label including the step number. Has no financial effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Rename {
    /// The start of the new name
    pub prefix: String,
}

impl Rename {
    /// Create a new policy
    pub fn new(params: RenameParams) -> Self {
        Self {
            prefix: params.prefix,
        }
    }

    /// Rename the project
    pub fn calculate(&self, step: u32, ctx: &mut StepContext) {
        *ctx.project_name = format!("{} in step {step}", self.prefix);
    }
}
