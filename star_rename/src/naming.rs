//! Classification of star columns by name.
//!
//! A star column is an ordinary field whose name marks it as coming from a `*`
//! expansion. The rename pass asks a [`StarColumnNaming`] every question it has
//! about names, so the convention itself can be swapped out by the planner.
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
use crate::{config::StarColumnConfig, plan::ProjectExpr};
use arrow::datatypes::Schema;

/// Naming convention oracle consulted by the rename pass.
///
/// Answers must be consistent with the schemas passed in. The pass doesn't
/// cross-check them.
#[cfg_attr(test, mockall::automock)]
pub trait StarColumnNaming: Send + Sync {
    /// Is this the name of a star column that hasn't been prefixed yet?
    fn is_non_prefixed_star_column(&self, name: &str) -> bool;

    /// Is this the name of a star column that already carries a table prefix?
    fn is_prefixed_star_column(&self, name: &str) -> bool;

    /// Does any field of this schema come from a star expansion?
    fn contains_star_column(&self, schema: &Schema) -> bool;

    /// Does any column reference in `exprs` select a star column of `input_schema`?
    fn contains_star_column_in_project(&self, input_schema: &Schema, exprs: &[ProjectExpr])
    -> bool;

    /// Name given to star column `name` of the scan that was allocated `scan_id`.
    fn prefixed_name(&self, scan_id: u64, name: &str) -> String;
}

/// Convention driven by a [`StarColumnConfig`]: star columns start with the star
/// marker, prefixed ones look like `<table prefix><id><delimiter><star column>`.
#[derive(Debug, Clone, Default)]
pub struct ConventionNaming {
    config: StarColumnConfig,
}

impl ConventionNaming {
    #[must_use]
    pub fn new(config: StarColumnConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &StarColumnConfig {
        &self.config
    }
}

impl From<StarColumnConfig> for ConventionNaming {
    fn from(config: StarColumnConfig) -> Self {
        Self::new(config)
    }
}

impl StarColumnNaming for ConventionNaming {
    fn is_non_prefixed_star_column(&self, name: &str) -> bool {
        name.starts_with(self.config.star_column())
    }

    fn is_prefixed_star_column(&self, name: &str) -> bool {
        let marker = format!(
            "{}{}",
            self.config.prefix_delimiter(),
            self.config.star_column()
        );
        name.find(&marker).is_some_and(|pos| pos > 0)
    }

    fn contains_star_column(&self, schema: &Schema) -> bool {
        schema
            .fields()
            .iter()
            .any(|f| self.is_non_prefixed_star_column(f.name()))
    }

    fn contains_star_column_in_project(
        &self,
        input_schema: &Schema,
        exprs: &[ProjectExpr],
    ) -> bool {
        exprs
            .iter()
            .filter_map(ProjectExpr::as_column)
            .filter_map(|index| input_schema.fields().get(index))
            .any(|f| self.is_non_prefixed_star_column(f.name()))
    }

    fn prefixed_name(&self, scan_id: u64, name: &str) -> String {
        format!(
            "{}{scan_id}{}{name}",
            self.config.table_prefix(),
            self.config.prefix_delimiter()
        )
    }
}
