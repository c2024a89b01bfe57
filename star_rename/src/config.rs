/*
* Copyright 2022-2025 Crown Copyright
*
* Licensed under the Apache License, Version 2.0 (the "License");
* you may not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*     http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing, software
* distributed under the License is distributed on an "AS IS" BASIS,
* WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
* See the License for the specific language governing permissions and
* limitations under the License.
*/
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const DEFAULT_STAR_COLUMN: &str = "*";
pub const DEFAULT_PREFIX_DELIMITER: &str = "::";
pub const DEFAULT_TABLE_PREFIX: &str = "T";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("star column marker must not be empty")]
    EmptyStarColumn,
    #[error("prefix delimiter must not be empty")]
    EmptyPrefixDelimiter,
    #[error("table prefix must not be empty")]
    EmptyTablePrefix,
    #[error("prefix delimiter \"{delimiter}\" must not contain the star column marker \"{star}\"")]
    DelimiterContainsStar { delimiter: String, star: String },
}

/// Naming convention used to recognise and prefix star columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarColumnConfig {
    /// Star expanded columns have names starting with this
    star_column: String,
    /// Separates the table prefix from the original column name
    prefix_delimiter: String,
    /// Put in front of the scan id, e.g. "T" gives "T3"
    table_prefix: String,
}

impl StarColumnConfig {
    #[must_use]
    pub fn star_column(&self) -> &str {
        &self.star_column
    }

    #[must_use]
    pub fn prefix_delimiter(&self) -> &str {
        &self.prefix_delimiter
    }

    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }
}

impl Default for StarColumnConfig {
    fn default() -> Self {
        Self {
            star_column: DEFAULT_STAR_COLUMN.into(),
            prefix_delimiter: DEFAULT_PREFIX_DELIMITER.into(),
            table_prefix: DEFAULT_TABLE_PREFIX.into(),
        }
    }
}

impl Display for StarColumnConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "star column \"{}\", prefixed as \"{}<id>{}{}\"",
            self.star_column, self.table_prefix, self.prefix_delimiter, self.star_column
        )
    }
}

/// Builder for `StarColumnConfig`.
#[derive(Debug, Default)]
pub struct StarColumnConfigBuilder {
    config: StarColumnConfig,
}

impl StarColumnConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn star_column(mut self, star_column: impl Into<String>) -> Self {
        self.config.star_column = star_column.into();
        self
    }

    #[must_use]
    pub fn prefix_delimiter(mut self, prefix_delimiter: impl Into<String>) -> Self {
        self.config.prefix_delimiter = prefix_delimiter.into();
        self
    }

    #[must_use]
    pub fn table_prefix(mut self, table_prefix: impl Into<String>) -> Self {
        self.config.table_prefix = table_prefix.into();
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    /// If any part of the convention is empty or the delimiter contains the star
    /// marker, which would make prefixed names ambiguous.
    pub fn build(self) -> Result<StarColumnConfig, ConfigError> {
        let config = self.config;
        if config.star_column.is_empty() {
            return Err(ConfigError::EmptyStarColumn);
        }
        if config.prefix_delimiter.is_empty() {
            return Err(ConfigError::EmptyPrefixDelimiter);
        }
        if config.table_prefix.is_empty() {
            return Err(ConfigError::EmptyTablePrefix);
        }
        if config.prefix_delimiter.contains(&config.star_column) {
            return Err(ConfigError::DelimiterContainsStar {
                delimiter: config.prefix_delimiter,
                star: config.star_column,
            });
        }
        Ok(config)
    }
}
