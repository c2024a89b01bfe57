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
use arrow::datatypes::{DataType, Field, Schema};
use datafusion::{
    common::tree_node::{TreeNode, TreeNodeRecursion},
    error::Result,
};
use star_rename::{
    Operator, OperatorRef,
    plan::{Filter, Join, JoinType, ProjectExpr, Projection, Scan, Screen, Writer, field_names},
};
use std::sync::Arc;

pub fn col_names<const N: usize>(names: [&str; N]) -> Vec<String> {
    names.into_iter().map(String::from).collect()
}

/// Scan of `table` with one nullable string field per name.
#[must_use]
pub fn scan(table: &str, names: &[&str]) -> OperatorRef {
    let fields = names
        .iter()
        .map(|name| Field::new(*name, DataType::Utf8, true))
        .collect::<Vec<_>>();
    Arc::new(Operator::Scan(Scan::new(table, Arc::new(Schema::new(fields)))))
}

#[must_use]
pub fn screen(input: OperatorRef) -> OperatorRef {
    Arc::new(Operator::Screen(Screen::new(input)))
}

#[must_use]
pub fn writer(input: OperatorRef, location: &str) -> OperatorRef {
    Arc::new(Operator::Writer(Writer::new(input, location)))
}

#[must_use]
pub fn filter(input: OperatorRef, predicate: &str) -> OperatorRef {
    Arc::new(Operator::Filter(Filter::new(input, predicate)))
}

/// Inner join on the first field of each side.
#[allow(clippy::missing_errors_doc)]
pub fn join(left: OperatorRef, right: OperatorRef) -> Result<OperatorRef> {
    Ok(Arc::new(Operator::Join(Join::try_new(
        left,
        right,
        JoinType::Inner,
        vec![(0, 0)],
    )?)))
}

/// Project input columns by position under the given names.
#[allow(clippy::missing_errors_doc)]
pub fn project_columns(input: OperatorRef, columns: &[(usize, &str)]) -> Result<OperatorRef> {
    let exprs = columns
        .iter()
        .map(|(index, name)| (ProjectExpr::column(*index), (*name).to_string()))
        .collect();
    Ok(Arc::new(Operator::Project(Projection::try_new(exprs, input)?)))
}

#[must_use]
pub fn field_names_of(plan: &OperatorRef) -> Vec<String> {
    field_names(&plan.schema())
}

/// Every projection in the plan, in pre-order.
#[allow(clippy::missing_errors_doc)]
pub fn projections(plan: &OperatorRef) -> Result<Vec<Projection>> {
    let mut found = Vec::new();
    plan.apply(|node| {
        if let Operator::Project(project) = node.as_ref() {
            found.push(project.clone());
        }
        Ok(TreeNodeRecursion::Continue)
    })?;
    Ok(found)
}

/// Number of projections reading straight from a scan.
#[allow(clippy::missing_errors_doc)]
pub fn projections_over_scans(plan: &OperatorRef) -> Result<usize> {
    Ok(projections(plan)?
        .iter()
        .filter(|project| matches!(project.input().as_ref(), Operator::Scan(_)))
        .count())
}
