//! Checks that a rewritten plan is safe to hand on to execution.
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
use crate::{
    naming::StarColumnNaming,
    plan::{Operator, OperatorRef, field_names},
};
use datafusion::{
    common::{
        plan_err,
        tree_node::{TreeNode, TreeNodeRecursion},
    },
    error::Result,
};
use std::{collections::HashSet, sync::Arc};

/// Every project must have distinct field names, except the one restoring the output
/// names: directly below a Screen or Writer, or a duplicate tolerant project at the root.
///
/// # Errors
/// Names the first project found with a repeated field name.
pub fn verify_unique_intermediate_names(plan: &OperatorRef) -> Result<()> {
    let mut boundaries: HashSet<*const Operator> = HashSet::new();
    if matches!(plan.as_ref(), Operator::Project(p) if p.allow_duplicates()) {
        boundaries.insert(Arc::as_ptr(plan));
    }
    let mut failure = None;
    plan.apply(|node| {
        match node.as_ref() {
            Operator::Screen(_) | Operator::Writer(_) => {
                for child in node.children() {
                    boundaries.insert(Arc::as_ptr(child));
                }
            }
            Operator::Project(project) if !boundaries.contains(&Arc::as_ptr(node)) => {
                let mut seen = HashSet::new();
                if let Some(name) = project
                    .schema()
                    .fields()
                    .iter()
                    .map(|f| f.name())
                    .find(|n| !seen.insert(*n))
                {
                    failure = Some(format!(
                        "{node} repeats field name \"{name}\" below the output boundary"
                    ));
                    return Ok(TreeNodeRecursion::Stop);
                }
            }
            _ => {}
        }
        Ok(TreeNodeRecursion::Continue)
    })?;
    match failure {
        Some(message) => plan_err!("{message}"),
        None => Ok(()),
    }
}

/// The plan's output must not show any table prefixed star column.
///
/// # Errors
/// Names the leaked field.
pub fn verify_no_prefix_leak(plan: &OperatorRef, naming: &dyn StarColumnNaming) -> Result<()> {
    match field_names(&plan.schema())
        .into_iter()
        .find(|name| naming.is_prefixed_star_column(name))
    {
        Some(name) => plan_err!("prefixed star column \"{name}\" is visible in the plan output"),
        None => Ok(()),
    }
}

/// Full check of a rewrite: output schema unchanged, distinct names inside and no
/// prefixed names leaking out.
///
/// # Errors
/// On the first property that doesn't hold.
pub fn verify_rewrite(
    original: &OperatorRef,
    rewritten: &OperatorRef,
    naming: &dyn StarColumnNaming,
) -> Result<()> {
    let (before, after) = (original.schema(), rewritten.schema());
    if before.fields() != after.fields() {
        return plan_err!(
            "rewrite changed the output schema from [{}] to [{}]",
            field_names(&before).join(", "),
            field_names(&after).join(", ")
        );
    }
    verify_unique_intermediate_names(rewritten)?;
    verify_no_prefix_leak(rewritten, naming)
}
