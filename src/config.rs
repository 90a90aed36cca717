//! Retrofit configuration.
//!
//! Optional YAML document loaded with `--config`. Every key has a default, so
//! an empty file is valid:
//!
//! ```yaml
//! indent_width: 4
//! fresh_name_prefix: __macro_local_
//! disabled: [XCTUnwrap]
//! extensions: [swift]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ast::render::DEFAULT_INDENT_WIDTH;
use crate::errors::{configuration_error, io_error, ErrorKind, RetrofitError};
use crate::rewrite::fresh::DEFAULT_PREFIX;
use crate::syntax::is_identifier;

const MAX_INDENT_WIDTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrofitConfig {
    /// Spaces per nesting level in synthesized blocks.
    pub indent_width: usize,
    pub fresh_name_prefix: String,
    /// Legacy invocation names to leave untouched.
    pub disabled: Vec<String>,
    /// File extensions picked up when a directory is given.
    pub extensions: Vec<String>,
}

impl Default for RetrofitConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            fresh_name_prefix: DEFAULT_PREFIX.to_string(),
            disabled: Vec::new(),
            extensions: vec!["swift".to_string()],
        }
    }
}

impl RetrofitConfig {
    pub fn load(path: &Path) -> Result<Self, RetrofitError> {
        let contents = fs::read_to_string(path).map_err(|e| io_error(path, &e))?;
        let origin = path.display().to_string();
        Self::from_yaml(&contents, &origin)
    }

    pub fn from_yaml(contents: &str, origin: &str) -> Result<Self, RetrofitError> {
        let config: Self = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(contents).map_err(|e| {
                configuration_error(
                    ErrorKind::InvalidConfiguration {
                        message: format!("{origin}: {e}"),
                    },
                    origin,
                )
            })?
        };
        config.validate(origin)?;
        tracing::debug!(origin, ?config, "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self, origin: &str) -> Result<(), RetrofitError> {
        let invalid = |message: String| {
            Err(configuration_error(
                ErrorKind::InvalidConfiguration { message },
                origin,
            ))
        };

        if self.indent_width == 0 || self.indent_width > MAX_INDENT_WIDTH {
            return invalid(format!(
                "indent_width must be between 1 and {MAX_INDENT_WIDTH}, got {}",
                self.indent_width
            ));
        }
        if !is_identifier(&self.fresh_name_prefix) {
            return invalid(format!(
                "fresh_name_prefix `{}` is not an identifier",
                self.fresh_name_prefix
            ));
        }
        if self.extensions.is_empty() {
            return invalid("extensions must list at least one file extension".into());
        }
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return invalid(format!("extension `{bad}` must be non-empty and written without a dot"));
        }
        Ok(())
    }
}
