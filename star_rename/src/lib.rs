//! The `star_rename` crate implements the physical plan pass that stops star expanded
//! columns from clashing by name with each other or with regular columns.
//!
//! The pass is run once per compiled plan, after physical operators have been chosen
//! and before the plan is serialised for execution. Internally it prefixes star
//! columns per scan; at the plan boundary it restores the names the client expects.
//!
//! Naming conventions are pluggable through [`StarColumnNaming`]. The default
//! [`ConventionNaming`] is driven by a [`StarColumnConfig`].
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
use datafusion::error::Result;

mod config;
mod converter;
mod naming;
pub mod plan;
mod scan_id;
mod unique_names;
pub mod verify;

pub use config::{
    ConfigError, DEFAULT_PREFIX_DELIMITER, DEFAULT_STAR_COLUMN, DEFAULT_TABLE_PREFIX,
    StarColumnConfig, StarColumnConfigBuilder,
};
pub use converter::StarColumnConverter;
pub use naming::{ConventionNaming, StarColumnNaming};
pub use plan::{Operator, OperatorRef};
pub use scan_id::ScanIdGenerator;
pub use unique_names::make_unique_names;

/// Rewrite a plan using the default naming convention and the process wide scan ids.
///
/// # Examples
/// ```
/// # use std::sync::Arc;
/// # use arrow::datatypes::{DataType, Field, Schema};
/// # use star_rename::{insert_rename_project, Operator, plan::{Scan, Screen}};
/// # fn main() -> datafusion::error::Result<()> {
/// let scan = Operator::Scan(Scan::new("t", Arc::new(Schema::new(vec![
///     Field::new("*", DataType::Utf8, true),
///     Field::new("b", DataType::Int64, false),
/// ]))));
/// let plan = Arc::new(Operator::Screen(Screen::new(Arc::new(scan))));
///
/// let rewritten = insert_rename_project(Arc::clone(&plan))?;
///
/// assert_eq!(rewritten.schema(), plan.schema());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// If the plan is malformed.
pub fn insert_rename_project(plan: OperatorRef) -> Result<OperatorRef> {
    let naming = ConventionNaming::default();
    StarColumnConverter::new(&naming, ScanIdGenerator::global())
        .insert_rename_project(plan)
        .map(|result| result.data)
}
