//! Canonical path rendering from the naming-template fields.

use crate::error::{ImcapError, ImcapResult};
use chrono::Local;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

/// Date stamp folded into the batch directory name. Computed once per
/// process run; a session that runs past midnight keeps the stamp it
/// started with.
static DATE_STAMP: Lazy<String> = Lazy::new(|| Local::now().format("%Y-%m-%d").to_string());

/// The process-wide date stamp used in batch directory names.
pub fn date_stamp() -> &'static str {
    &DATE_STAMP
}

/// Naming inputs for the next capture, rendered into a canonical
/// (potentially colliding) target path.
///
/// The canonical layout is
/// `root_dir/initials/experiment_id/<batch_id>_<date>/<base_name><extension>`.
///
/// Inputs are assumed pre-sanitized by the presentation layer (no path
/// separators inside components); this type only rejects empty components,
/// a relative root and an extension without its leading dot, and it rejects
/// them before anything is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    root_dir: PathBuf,
    initials: String,
    experiment_id: String,
    batch_id: String,
    base_name: String,
    extension: String,
}

impl PathTemplate {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        initials: impl Into<String>,
        experiment_id: impl Into<String>,
        batch_id: impl Into<String>,
        base_name: impl Into<String>,
        extension: impl Into<String>,
    ) -> ImcapResult<Self> {
        let root_dir = root_dir.into();
        if !root_dir.is_absolute() {
            return Err(ImcapError::InvalidTemplate(format!(
                "root_dir must be an absolute path, got {:?}",
                root_dir
            )));
        }

        let initials = non_empty("initials", initials.into())?;
        let experiment_id = non_empty("experiment_id", experiment_id.into())?;
        let batch_id = non_empty("batch_id", batch_id.into())?;
        let base_name = non_empty("base_name", base_name.into())?;
        let extension = valid_extension(extension.into())?;

        Ok(Self {
            root_dir,
            initials,
            experiment_id,
            batch_id,
            base_name,
            extension,
        })
    }

    /// Render the canonical path. Pure function of the current fields:
    /// no I/O, no side effects, no collision resolution.
    pub fn render(&self) -> PathBuf {
        self.directory()
            .join(format!("{}{}", self.base_name, self.extension))
    }

    /// The directory portion of the canonical path.
    pub fn directory(&self) -> PathBuf {
        self.root_dir
            .join(&self.initials)
            .join(&self.experiment_id)
            .join(format!("{}_{}", self.batch_id, date_stamp()))
    }

    /// Replace the base filename (e.g. when the operator selects a sample).
    /// Leaves extension and directory components untouched.
    pub fn set_subject(&mut self, new_base_name: &str) -> ImcapResult<()> {
        self.base_name = non_empty("base_name", new_base_name.to_string())?;
        Ok(())
    }

    /// Replace the file extension only.
    pub fn set_extension(&mut self, new_ext: &str) -> ImcapResult<()> {
        self.extension = valid_extension(new_ext.to_string())?;
        Ok(())
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn initials(&self) -> &str {
        &self.initials
    }

    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

fn non_empty(field: &str, value: String) -> ImcapResult<String> {
    if value.is_empty() {
        return Err(ImcapError::InvalidTemplate(format!(
            "{field} must not be empty"
        )));
    }
    Ok(value)
}

fn valid_extension(value: String) -> ImcapResult<String> {
    if value.is_empty() {
        return Err(ImcapError::InvalidTemplate(
            "extension must not be empty".into(),
        ));
    }
    if !value.starts_with('.') {
        return Err(ImcapError::InvalidTemplate(format!(
            "extension must begin with '.', got {value:?}"
        )));
    }
    Ok(value)
}
