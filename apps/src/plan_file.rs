//! JSON encoding of physical plans read by the command line tools.
//!
//! Each node is an object with a single key naming the operator, e.g.
//! `{"screen": {"input": {"scan": {"table": "t", "fields": [{"name": "*", "type": "Utf8"}]}}}}`.
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
use arrow::{
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
};
use datafusion::error::DataFusionError;
use log::debug;
use serde::Deserialize;
use star_rename::{
    Operator, OperatorRef,
    plan::{
        Exchange, Filter, Join, JoinType, Limit, Partitioning, ProjectExpr, Projection, Scan,
        Screen, Sort, SortKey, UnionAll, Writer,
    },
};
use std::{io::Read, str::FromStr, sync::Arc};
use thiserror::Error;

/// Plan file name meaning standard input.
pub const STDIN_PLAN: &str = "-";

#[derive(Error, Debug)]
pub enum PlanFileError {
    #[error("couldn't read plan from \"{path}\"")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("plan is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("unknown data type \"{name}\" for field \"{field}\"")]
    DataType {
        name: String,
        field: String,
        #[source]
        source: ArrowError,
    },
    #[error("invalid plan")]
    Plan(#[from] DataFusionError),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default = "nullable_by_default")]
    pub nullable: bool,
}

fn nullable_by_default() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ExprDef {
    /// Input field by position. Keeps the input field's name unless one is given.
    Column { column: usize, name: Option<String> },
    Computed {
        expr: String,
        #[serde(rename = "type")]
        data_type: String,
        name: String,
        #[serde(default = "nullable_by_default")]
        nullable: bool,
    },
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum JoinTypeDef {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl From<JoinTypeDef> for JoinType {
    fn from(def: JoinTypeDef) -> Self {
        match def {
            JoinTypeDef::Inner => Self::Inner,
            JoinTypeDef::Left => Self::Left,
            JoinTypeDef::Right => Self::Right,
            JoinTypeDef::Full => Self::Full,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKeyDef {
    pub column: usize,
    #[serde(default)]
    pub descending: bool,
}

/// One node of a plan file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PlanNode {
    Scan {
        table: String,
        fields: Vec<FieldDef>,
    },
    Project {
        exprs: Vec<ExprDef>,
        input: Box<PlanNode>,
        #[serde(default)]
        allow_duplicates: bool,
    },
    Join {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        #[serde(default)]
        join_type: JoinTypeDef,
        #[serde(default)]
        on: Vec<(usize, usize)>,
    },
    Filter {
        predicate: String,
        input: Box<PlanNode>,
    },
    Sort {
        keys: Vec<SortKeyDef>,
        input: Box<PlanNode>,
    },
    Limit {
        #[serde(default)]
        offset: usize,
        fetch: Option<usize>,
        input: Box<PlanNode>,
    },
    Exchange {
        hash_keys: Option<Vec<usize>>,
        input: Box<PlanNode>,
    },
    UnionAll {
        inputs: Vec<PlanNode>,
    },
    Screen {
        input: Box<PlanNode>,
    },
    Writer {
        location: String,
        input: Box<PlanNode>,
    },
}

impl PlanNode {
    /// Build the operator tree this node describes.
    ///
    /// # Errors
    /// If a type name is unknown or an operator is malformed.
    pub fn into_operator(self) -> Result<OperatorRef, PlanFileError> {
        let operator = match self {
            Self::Scan { table, fields } => {
                let fields = fields
                    .into_iter()
                    .map(FieldDef::into_field)
                    .collect::<Result<Vec<_>, _>>()?;
                Operator::Scan(Scan::new(table, Arc::new(Schema::new(fields))))
            }
            Self::Project {
                exprs,
                input,
                allow_duplicates,
            } => project(exprs, input.into_operator()?, allow_duplicates)?,
            Self::Join {
                left,
                right,
                join_type,
                on,
            } => Operator::Join(Join::try_new(
                left.into_operator()?,
                right.into_operator()?,
                join_type.into(),
                on,
            )?),
            Self::Filter { predicate, input } => {
                Operator::Filter(Filter::new(input.into_operator()?, predicate))
            }
            Self::Sort { keys, input } => Operator::Sort(Sort::try_new(
                input.into_operator()?,
                keys.into_iter()
                    .map(|key| SortKey {
                        column: key.column,
                        descending: key.descending,
                    })
                    .collect(),
            )?),
            Self::Limit {
                offset,
                fetch,
                input,
            } => Operator::Limit(Limit::new(input.into_operator()?, offset, fetch)),
            Self::Exchange { hash_keys, input } => Operator::Exchange(Exchange::try_new(
                input.into_operator()?,
                hash_keys.map_or(Partitioning::Single, Partitioning::Hash),
            )?),
            Self::UnionAll { inputs } => Operator::UnionAll(UnionAll::try_new(
                inputs
                    .into_iter()
                    .map(PlanNode::into_operator)
                    .collect::<Result<Vec<_>, _>>()?,
            )?),
            Self::Screen { input } => Operator::Screen(Screen::new(input.into_operator()?)),
            Self::Writer { location, input } => {
                Operator::Writer(Writer::new(input.into_operator()?, location))
            }
        };
        Ok(Arc::new(operator))
    }
}

impl FieldDef {
    fn into_field(self) -> Result<Field, PlanFileError> {
        let data_type = parse_type(&self.data_type, &self.name)?;
        Ok(Field::new(self.name, data_type, self.nullable))
    }
}

fn parse_type(name: &str, field: &str) -> Result<DataType, PlanFileError> {
    DataType::from_str(name).map_err(|source| PlanFileError::DataType {
        name: name.into(),
        field: field.into(),
        source,
    })
}

fn project(
    exprs: Vec<ExprDef>,
    input: OperatorRef,
    allow_duplicates: bool,
) -> Result<Operator, PlanFileError> {
    let input_schema = input.schema();
    let mut named = Vec::with_capacity(exprs.len());
    let mut fields = Vec::with_capacity(exprs.len());
    for def in exprs {
        let (expr, field) = match def {
            ExprDef::Column { column, name } => {
                let Some(input_field) = input_schema.fields().get(column) else {
                    return Err(DataFusionError::Plan(format!(
                        "column reference ${column} is out of range for input of {} fields",
                        input_schema.fields().len()
                    ))
                    .into());
                };
                let name = name.unwrap_or_else(|| input_field.name().clone());
                (
                    ProjectExpr::Column(column),
                    input_field.as_ref().clone().with_name(name),
                )
            }
            ExprDef::Computed {
                expr,
                data_type,
                name,
                nullable,
            } => {
                let data_type = parse_type(&data_type, &name)?;
                (
                    ProjectExpr::Computed {
                        expr,
                        data_type: data_type.clone(),
                        nullable,
                    },
                    Field::new(name, data_type, nullable),
                )
            }
        };
        named.push(expr);
        fields.push(field);
    }
    Ok(Operator::Project(Projection::try_new_with_schema(
        named,
        Arc::new(Schema::new(fields)),
        input,
        allow_duplicates,
    )?))
}

/// Decode a plan from JSON text.
///
/// # Errors
/// If the text isn't a valid plan.
pub fn parse_plan(json: &str) -> Result<OperatorRef, PlanFileError> {
    let node: PlanNode = serde_json::from_str(json)?;
    node.into_operator()
}

/// Read a plan from a file, or from standard input if `path` is [`STDIN_PLAN`].
///
/// # Errors
/// If the plan can't be read or isn't a valid plan.
pub fn read_plan(path: &str) -> Result<OperatorRef, PlanFileError> {
    let io_error = |source| PlanFileError::Io {
        path: path.into(),
        source,
    };
    let json = if path == STDIN_PLAN {
        let mut json = String::new();
        std::io::stdin()
            .read_to_string(&mut json)
            .map_err(io_error)?;
        json
    } else {
        std::fs::read_to_string(path).map_err(io_error)?
    };
    debug!("Read {} bytes of plan from {path}", json.len());
    parse_plan(&json)
}
