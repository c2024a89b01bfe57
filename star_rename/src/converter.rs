//! Physical plan pass that keeps star expanded columns apart from each other and from
//! regular columns.
//!
//! A star column from one scan and a regular or star column from somewhere else can
//! end up with the same name in one operator's output. Everything downstream of the
//! planner matches fields by name, so the pass renames:
//!
//! 1. a project above each star producing scan adds a unique table prefix to its star
//!    columns (`*` becomes `T3::*`);
//! 2. projects above those carry the prefixed names upwards;
//! 3. a project directly under the [`Screen`](crate::plan::Screen) or [`Writer`](crate::plan::Writer) puts the original names
//!    back so the client sees exactly the schema it asked for.
//!
//! Prefixing only starts once some operator is seen mixing a star column with other
//! columns. From then on every star producing scan reached in the same walk is
//! prefixed, even in sibling subtrees. Prefixing too much is harmless, prefixing too
//! little is not.
//!
//! A `Writer` clears that state once its own names are restored. If it sits below a
//! `Screen` after a prefixed sibling, the `Screen` no longer restores anything and
//! the prefixed names stay visible in its output.
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
    plan::{Operator, OperatorRef, ProjectExpr, Projection, Scan, field_names, rename_fields},
    scan_id::ScanIdGenerator,
    unique_names::make_unique_names,
};
use arrow::datatypes::SchemaRef;
use datafusion::{
    common::{
        internal_err,
        tree_node::{Transformed, TreeNode},
    },
    error::Result,
};
use log::{debug, info, log_enabled, trace};
use std::sync::Arc;

/// State of one walk over a plan. Never shared between walks.
#[derive(Debug, Default)]
struct RewriteState {
    /// Set once an operator mixes star columns with other columns
    prefixed_for_star: bool,
    prefix_projections: usize,
    boundary_projections: usize,
    elided_projections: usize,
}

/// Inserts the star column rename projections into a physical plan.
pub struct StarColumnConverter<'a> {
    naming: &'a dyn StarColumnNaming,
    scan_ids: &'a ScanIdGenerator,
}

impl<'a> StarColumnConverter<'a> {
    #[must_use]
    pub fn new(naming: &'a dyn StarColumnNaming, scan_ids: &'a ScanIdGenerator) -> Self {
        Self { naming, scan_ids }
    }

    /// Rewrite the plan rooted at `root`.
    ///
    /// The output schema of the returned root always equals that of `root`. If no
    /// renaming was needed the original plan is returned untransformed.
    ///
    /// # Errors
    /// If the plan is malformed, e.g. a column reference falls outside its input.
    pub fn insert_rename_project(&self, root: OperatorRef) -> Result<Transformed<OperatorRef>> {
        if log_enabled!(log::Level::Trace) {
            trace!("Plan before star column rename:\n{}", root.display_indent());
        }
        let mut state = RewriteState::default();
        let original_schema = root.schema();
        let is_terminal = matches!(root.as_ref(), Operator::Screen(_) | Operator::Writer(_));

        let mut result = self.visit(&root, &mut state)?;
        if !is_terminal && field_names(&result.data.schema()) != field_names(&original_schema) {
            // No Screen or Writer to restore the names, so restore them on top
            let restored = self.boundary_projection(result.data, &original_schema, &mut state)?;
            result = Transformed::yes(restored.data);
        }

        info!(
            "Star column rename: {} prefix project(s), {} boundary project(s), {} project(s) removed",
            state.prefix_projections, state.boundary_projections, state.elided_projections
        );
        if result.transformed && log_enabled!(log::Level::Trace) {
            trace!(
                "Plan after star column rename:\n{}",
                result.data.display_indent()
            );
        }
        Ok(result)
    }

    fn visit(
        &self,
        node: &OperatorRef,
        state: &mut RewriteState,
    ) -> Result<Transformed<OperatorRef>> {
        match node.as_ref() {
            Operator::Scan(scan) => self.visit_scan(node, scan, state),
            Operator::Project(project) => self.visit_project(node, project, state),
            Operator::Screen(screen) => self.visit_terminal(node, screen.input(), state),
            Operator::Writer(writer) => {
                let result = self.visit_terminal(node, writer.input(), state)?;
                // Later write branches get rewritten independently
                state.prefixed_for_star = false;
                Ok(result)
            }
            Operator::Join(_)
            | Operator::Filter(_)
            | Operator::Sort(_)
            | Operator::Limit(_)
            | Operator::Exchange(_)
            | Operator::UnionAll(_) => self.visit_other(node, state),
        }
    }

    /// Turn prefixing on if this node's output mixes a star column with anything else.
    fn detect_star_mixing(&self, node: &Operator, state: &mut RewriteState) {
        let schema = node.schema();
        if !state.prefixed_for_star
            && self.naming.contains_star_column(&schema)
            && schema.fields().len() > 1
        {
            debug!("{} mixes star columns with other columns", node.name());
            state.prefixed_for_star = true;
        }
    }

    fn visit_other(
        &self,
        node: &OperatorRef,
        state: &mut RewriteState,
    ) -> Result<Transformed<OperatorRef>> {
        self.detect_star_mixing(node, state);
        Arc::clone(node).map_children(|child| self.visit(&child, state))
    }

    fn visit_scan(
        &self,
        node: &OperatorRef,
        scan: &Scan,
        state: &mut RewriteState,
    ) -> Result<Transformed<OperatorRef>> {
        self.detect_star_mixing(node, state);
        if !state.prefixed_for_star || !self.naming.contains_star_column(scan.schema()) {
            return Ok(Transformed::no(Arc::clone(node)));
        }

        let scan_id = self.scan_ids.next_id();
        let names = scan
            .schema()
            .fields()
            .iter()
            .map(|f| {
                if self.naming.is_non_prefixed_star_column(f.name()) {
                    self.naming.prefixed_name(scan_id, f.name())
                } else {
                    f.name().clone()
                }
            })
            .collect::<Vec<_>>();
        debug!(
            "Prefixing star columns of scan {} as [{}]",
            scan.table(),
            names.join(", ")
        );
        state.prefix_projections += 1;
        let project = Projection::rename(Arc::clone(node), &names)?;
        Ok(Transformed::yes(Arc::new(Operator::Project(project))))
    }

    fn visit_project(
        &self,
        node: &OperatorRef,
        project: &Projection,
        state: &mut RewriteState,
    ) -> Result<Transformed<OperatorRef>> {
        let input_schema = project.input().schema();
        if !state.prefixed_for_star
            && self
                .naming
                .contains_star_column_in_project(&input_schema, project.exprs())
            && project.schema().fields().len() > 1
        {
            debug!("Project selects star columns alongside other columns");
            state.prefixed_for_star = true;
        }

        let child = self.visit(project.input(), state)?;
        let child_schema = child.data.schema();

        // A column reference whose input field got renamed below takes on the new
        // name, everything else keeps the name it was declared with
        let names = project
            .exprs()
            .iter()
            .zip(project.schema().fields().iter())
            .map(|(expr, field)| match expr {
                ProjectExpr::Column(index) => {
                    let (Some(before), Some(after)) = (
                        input_schema.fields().get(*index),
                        child_schema.fields().get(*index),
                    ) else {
                        return internal_err!(
                            "project references ${index} but its rewritten input has {} fields",
                            child_schema.fields().len()
                        );
                    };
                    Ok(if before.name() == after.name() {
                        field.name().clone()
                    } else {
                        after.name().clone()
                    })
                }
                ProjectExpr::Computed { .. } => Ok(field.name().clone()),
            })
            .collect::<Result<Vec<_>>>()?;
        let names = make_unique_names(&names);

        if !child.transformed && names == field_names(project.schema()) {
            return Ok(Transformed::no(Arc::clone(node)));
        }

        let rewritten = Projection::try_new_with_schema(
            project.exprs().to_vec(),
            rename_fields(project.schema(), &names),
            child.data,
            project.allow_duplicates(),
        )?;
        if rewritten.is_trivial() {
            debug!("Removing trivial project [{}]", names.join(", "));
            state.elided_projections += 1;
            return Ok(Transformed::yes(Arc::clone(rewritten.input())));
        }
        Ok(Transformed::yes(Arc::new(Operator::Project(rewritten))))
    }

    /// Screen and Writer: put the pre-rewrite names back just below the root.
    fn visit_terminal(
        &self,
        node: &OperatorRef,
        input: &OperatorRef,
        state: &mut RewriteState,
    ) -> Result<Transformed<OperatorRef>> {
        let original_schema = input.schema();
        let child = self.visit(input, state)?;

        let child = if state.prefixed_for_star {
            let child_transformed = child.transformed;
            let mut restored = self.boundary_projection(child.data, &original_schema, state)?;
            restored.transformed |= child_transformed;
            restored
        } else {
            child
        };
        if !child.transformed {
            return Ok(Transformed::no(Arc::clone(node)));
        }
        node.with_new_children(vec![child.data])
            .map(Transformed::yes)
    }

    /// Project `input` back onto `original_schema` by position. Names may repeat here
    /// since they must be exactly what the client expects to see.
    fn boundary_projection(
        &self,
        input: OperatorRef,
        original_schema: &SchemaRef,
        state: &mut RewriteState,
    ) -> Result<Transformed<OperatorRef>> {
        let width = original_schema.fields().len();
        let exprs = (0..width).map(ProjectExpr::Column).collect();
        let project =
            Projection::try_new_with_schema(exprs, Arc::clone(original_schema), input, width > 1)?;
        if project.is_trivial() {
            debug!("Output names are already the original ones");
            return Ok(Transformed::no(Arc::clone(project.input())));
        }
        debug!(
            "Restoring output names [{}]",
            field_names(original_schema).join(", ")
        );
        state.boundary_projections += 1;
        Ok(Transformed::yes(Arc::new(Operator::Project(project))))
    }
}

#[cfg(test)]
mod tests {
    use super::StarColumnConverter;
    use crate::{
        naming::{ConventionNaming, MockStarColumnNaming},
        plan::{
            Exchange, Filter, Join, JoinType, Limit, Operator, OperatorRef, Partitioning,
            ProjectExpr, Projection, Scan, Screen, Sort, SortKey, UnionAll, Writer, field_names,
        },
        scan_id::ScanIdGenerator,
        verify::{verify_no_prefix_leak, verify_rewrite},
    };
    use arrow::datatypes::{DataType, Field, Schema};
    use datafusion::{common::tree_node::Transformed, error::Result};
    use std::sync::Arc;
    use test_log::test;

    fn scan(table: &str, names: &[&str]) -> OperatorRef {
        let fields = names
            .iter()
            .map(|n| Field::new(*n, DataType::Utf8, true))
            .collect::<Vec<_>>();
        Arc::new(Operator::Scan(Scan::new(table, Arc::new(Schema::new(fields)))))
    }

    fn project(input: OperatorRef, exprs: Vec<(ProjectExpr, &str)>) -> Result<OperatorRef> {
        let exprs = exprs
            .into_iter()
            .map(|(expr, name)| (expr, name.to_string()))
            .collect();
        Ok(Arc::new(Operator::Project(Projection::try_new(exprs, input)?)))
    }

    fn join(left: OperatorRef, right: OperatorRef) -> Result<OperatorRef> {
        Ok(Arc::new(Operator::Join(Join::try_new(
            left,
            right,
            JoinType::Inner,
            vec![(0, 0)],
        )?)))
    }

    fn screen(input: OperatorRef) -> OperatorRef {
        Arc::new(Operator::Screen(Screen::new(input)))
    }

    fn convert(plan: &OperatorRef) -> Result<Transformed<OperatorRef>> {
        let naming = ConventionNaming::default();
        let scan_ids = ScanIdGenerator::new();
        StarColumnConverter::new(&naming, &scan_ids).insert_rename_project(Arc::clone(plan))
    }

    fn explain(plan: &OperatorRef) -> Vec<String> {
        plan.display_indent()
            .to_string()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn should_prefix_star_mixed_with_regular_column() -> Result<()> {
        // Given
        let plan = screen(scan("t1", &["*", "b"]));

        // When
        let result = convert(&plan)?;

        // Then
        assert!(result.transformed);
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  ProjectAllowDup: [$0 AS *, $1 AS b]",
                "    Project: [$0 AS T0::*, $1 AS b]",
                "      Scan: table=t1, fields=[*, b]",
            ]
        );
        assert_eq!(result.data.schema(), plan.schema());
        Ok(())
    }

    #[test]
    fn should_prefix_each_star_scan_of_a_join() -> Result<()> {
        // Given
        let plan = screen(join(scan("l", &["*"]), scan("r", &["*"]))?);

        // When
        let result = convert(&plan)?;

        // Then
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  ProjectAllowDup: [$0 AS *, $1 AS *]",
                "    Join: type=Inner, on=[($0, $0)]",
                "      Project: [$0 AS T0::*]",
                "        Scan: table=l, fields=[*]",
                "      Project: [$0 AS T1::*]",
                "        Scan: table=r, fields=[*]",
            ]
        );
        Ok(())
    }

    #[test]
    fn should_leave_plan_without_star_columns_untouched() -> Result<()> {
        // Given
        let plan = screen(project(
            scan("t", &["x", "y"]),
            vec![
                (ProjectExpr::column(0), "x"),
                (ProjectExpr::computed("a + 1", DataType::Int64), "a1"),
            ],
        )?);

        // When
        let result = convert(&plan)?;

        // Then
        assert!(!result.transformed);
        assert!(Arc::ptr_eq(&result.data, &plan));
        Ok(())
    }

    #[test]
    fn should_leave_single_star_scan_untouched() -> Result<()> {
        // Given
        let plan = screen(scan("t", &["*"]));

        // When
        let result = convert(&plan)?;

        // Then
        assert!(!result.transformed);
        assert!(Arc::ptr_eq(&result.data, &plan));
        Ok(())
    }

    #[test]
    fn should_keep_alias_when_input_name_is_unchanged() -> Result<()> {
        // Given
        let plan = screen(project(
            scan("t", &["*", "b"]),
            vec![(ProjectExpr::column(0), "all"), (ProjectExpr::column(1), "bee")],
        )?);

        // When
        let result = convert(&plan)?;

        // Then
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  ProjectAllowDup: [$0 AS all, $1 AS bee]",
                "    Project: [$0 AS T0::*, $1 AS bee]",
                "      Project: [$0 AS T0::*, $1 AS b]",
                "        Scan: table=t, fields=[*, b]",
            ]
        );
        Ok(())
    }

    #[test]
    fn should_remove_project_made_trivial_by_prefixing() -> Result<()> {
        // Given
        let inner = project(
            scan("t", &["*", "b"]),
            vec![(ProjectExpr::column(0), "*"), (ProjectExpr::column(1), "b")],
        )?;
        let plan = screen(Arc::new(Operator::Filter(Filter::new(inner, "b > 1"))));

        // When
        let result = convert(&plan)?;

        // Then
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  ProjectAllowDup: [$0 AS *, $1 AS b]",
                "    Filter: b > 1",
                "      Project: [$0 AS T0::*, $1 AS b]",
                "        Scan: table=t, fields=[*, b]",
            ]
        );
        Ok(())
    }

    #[test]
    fn should_make_propagated_names_unique() -> Result<()> {
        // Given
        let plan = screen(project(
            scan("t", &["*", "b"]),
            vec![
                (ProjectExpr::column(0), "*"),
                (ProjectExpr::column(1), "b"),
                (ProjectExpr::computed("'x'", DataType::Utf8), "T0::*"),
            ],
        )?);

        // When
        let result = convert(&plan)?;

        // Then
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  ProjectAllowDup: [$0 AS *, $1 AS b, $2 AS T0::*]",
                "    Project: [$0 AS T0::*, $1 AS b, 'x' AS T0::*0]",
                "      Project: [$0 AS T0::*, $1 AS b]",
                "        Scan: table=t, fields=[*, b]",
            ]
        );
        Ok(())
    }

    #[test]
    fn should_prefix_sibling_once_mixing_detected() -> Result<()> {
        // Given
        let left = project(
            Arc::new(Operator::Filter(Filter::new(scan("l", &["*", "k"]), "k > 0"))),
            vec![(ProjectExpr::column(1), "k")],
        )?;
        let right = project(scan("r", &["*"]), vec![(ProjectExpr::column(0), "v")])?;
        let plan = screen(join(left, right)?);

        // When
        let result = convert(&plan)?;

        // Then
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  ProjectAllowDup: [$0 AS k, $1 AS v]",
                "    Join: type=Inner, on=[($0, $0)]",
                "      Project: [$1 AS k]",
                "        Filter: k > 0",
                "          Project: [$0 AS T0::*, $1 AS k]",
                "            Scan: table=l, fields=[*, k]",
                "      Project: [$0 AS T1::*]",
                "        Scan: table=r, fields=[*]",
            ]
        );
        Ok(())
    }

    #[test]
    fn should_reset_prefixing_after_writer() -> Result<()> {
        // Given
        let first = Arc::new(Operator::Writer(Writer::new(scan("a", &["*", "x"]), "/out/a")));
        let second = Arc::new(Operator::Writer(Writer::new(scan("b", &["*"]), "/out/b")));
        let plan = screen(Arc::new(Operator::UnionAll(UnionAll::try_new(vec![
            first,
            Arc::clone(&second),
        ])?)));

        // When
        let result = convert(&plan)?;

        // Then
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  UnionAll",
                "    Writer: location=/out/a",
                "      ProjectAllowDup: [$0 AS *, $1 AS x]",
                "        Project: [$0 AS T0::*, $1 AS x]",
                "          Scan: table=a, fields=[*, x]",
                "    Writer: location=/out/b",
                "      Scan: table=b, fields=[*]",
            ]
        );
        let Operator::Screen(screen) = result.data.as_ref() else {
            panic!("Expected screen at root");
        };
        let Operator::UnionAll(union) = screen.input().as_ref() else {
            panic!("Expected union below screen");
        };
        assert!(Arc::ptr_eq(&union.inputs()[1], &second));
        Ok(())
    }

    #[test]
    fn should_keep_operator_parameters_when_rebuilding() -> Result<()> {
        // Given
        let sort = Arc::new(Operator::Sort(Sort::try_new(
            join(scan("l", &["*", "k"]), scan("r", &["*"]))?,
            vec![SortKey {
                column: 2,
                descending: true,
            }],
        )?));
        let limit = Arc::new(Operator::Limit(Limit::new(sort, 3, Some(5))));
        let exchange = Arc::new(Operator::Exchange(Exchange::try_new(
            limit,
            Partitioning::Hash(vec![2]),
        )?));
        let plan = screen(exchange);

        // When
        let result = convert(&plan)?;

        // Then
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  ProjectAllowDup: [$0 AS *, $1 AS k, $2 AS *]",
                "    Exchange: Hash([$2])",
                "      Limit: offset=3, fetch=5",
                "        Sort: [$2 DESC]",
                "          Join: type=Inner, on=[($0, $0)]",
                "            Project: [$0 AS T0::*, $1 AS k]",
                "              Scan: table=l, fields=[*, k]",
                "            Project: [$0 AS T1::*]",
                "              Scan: table=r, fields=[*]",
            ]
        );
        verify_rewrite(&plan, &result.data, &ConventionNaming::default())
    }

    #[test]
    fn should_leave_prefix_visible_when_writer_resets_before_screen() -> Result<()> {
        // Given
        let branch = Arc::new(Operator::Writer(Writer::new(scan("w", &["y"]), "/out/w")));
        let plan = screen(Arc::new(Operator::UnionAll(UnionAll::try_new(vec![
            scan("t", &["*", "x"]),
            branch,
        ])?)));

        // When
        let result = convert(&plan)?;

        // Then
        // The writer clears the flag so the screen adds no restoring project
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  UnionAll",
                "    Project: [$0 AS T0::*, $1 AS x]",
                "      Scan: table=t, fields=[*, x]",
                "    Writer: location=/out/w",
                "      Scan: table=w, fields=[y]",
            ]
        );
        assert_eq!(field_names(&plan.schema()), vec!["*", "x"]);
        assert_eq!(field_names(&result.data.schema()), vec!["T0::*", "x"]);
        assert!(verify_no_prefix_leak(&result.data, &ConventionNaming::default()).is_err());
        Ok(())
    }

    #[test]
    fn should_restore_names_above_non_terminal_root() -> Result<()> {
        // Given
        let plan = Arc::new(Operator::Filter(Filter::new(scan("t", &["*", "b"]), "b = 1")));

        // When
        let result = convert(&plan)?;

        // Then
        assert_eq!(
            explain(&result.data),
            vec![
                "ProjectAllowDup: [$0 AS *, $1 AS b]",
                "  Filter: b = 1",
                "    Project: [$0 AS T0::*, $1 AS b]",
                "      Scan: table=t, fields=[*, b]",
            ]
        );
        assert_eq!(result.data.schema(), plan.schema());
        Ok(())
    }

    #[test]
    fn should_use_strict_project_for_single_output_field() -> Result<()> {
        // Given
        let plan = screen(project(
            join(scan("l", &["*"]), scan("r", &["x"]))?,
            vec![(ProjectExpr::column(0), "*")],
        )?);

        // When
        let result = convert(&plan)?;

        // Then
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  Project: [$0 AS *]",
                "    Project: [$0 AS T0::*]",
                "      Join: type=Inner, on=[($0, $0)]",
                "        Project: [$0 AS T0::*]",
                "          Scan: table=l, fields=[*]",
                "        Scan: table=r, fields=[x]",
            ]
        );
        Ok(())
    }

    #[test]
    fn should_skip_boundary_when_output_names_survive() -> Result<()> {
        // Given
        let plan = screen(project(
            join(scan("l", &["*", "b"]), scan("r", &["c"]))?,
            vec![(ProjectExpr::column(2), "c")],
        )?);

        // When
        let result = convert(&plan)?;

        // Then
        assert!(result.transformed);
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  Project: [$2 AS c]",
                "    Join: type=Inner, on=[($0, $0)]",
                "      Project: [$0 AS T0::*, $1 AS b]",
                "        Scan: table=l, fields=[*, b]",
                "      Scan: table=r, fields=[c]",
            ]
        );
        Ok(())
    }

    #[test]
    fn should_report_malformed_plan() {
        // Given
        let plan = screen(scan("t", &["*", "b"]));
        let naming = ConventionNaming::default();
        let scan_ids = ScanIdGenerator::new();
        let mut broken = MockStarColumnNaming::new();
        broken.expect_contains_star_column().returning(|_| true);
        broken
            .expect_is_non_prefixed_star_column()
            .returning(|_| true);
        // Renaming both fields to the same string breaks the strict prefix project
        broken
            .expect_prefixed_name()
            .returning(|_, _| "same".to_string());

        // When
        let good = StarColumnConverter::new(&naming, &scan_ids)
            .insert_rename_project(Arc::clone(&plan));
        let bad = StarColumnConverter::new(&broken, &scan_ids).insert_rename_project(plan);

        // Then
        assert!(good.is_ok());
        let err = bad.expect_err("should fail");
        assert!(err.to_string().contains("duplicate field name \"same\""));
    }

    #[test]
    fn should_not_rename_when_oracle_finds_no_star_columns() -> Result<()> {
        // Given
        let plan = screen(join(scan("l", &["*", "a"]), scan("r", &["*"]))?);
        let scan_ids = ScanIdGenerator::new();
        let mut naming = MockStarColumnNaming::new();
        naming.expect_contains_star_column().returning(|_| false);
        naming
            .expect_contains_star_column_in_project()
            .returning(|_, _| false);
        naming.expect_is_non_prefixed_star_column().never();
        naming.expect_prefixed_name().never();

        // When
        let result = StarColumnConverter::new(&naming, &scan_ids)
            .insert_rename_project(Arc::clone(&plan))?;

        // Then
        assert!(!result.transformed);
        assert!(Arc::ptr_eq(&result.data, &plan));
        assert_eq!(scan_ids.next_id(), 0);
        Ok(())
    }

    #[test]
    fn should_follow_injected_naming_convention() -> Result<()> {
        // Given
        let plan = screen(join(scan("l", &["all", "a"]), scan("r", &["all"]))?);
        let scan_ids = ScanIdGenerator::starting_at(40);
        let mut naming = MockStarColumnNaming::new();
        naming
            .expect_is_non_prefixed_star_column()
            .returning(|name| name == "all");
        naming
            .expect_contains_star_column()
            .returning(|schema| schema.fields().iter().any(|f| f.name() == "all"));
        naming
            .expect_prefixed_name()
            .times(2)
            .returning(|id, name| format!("s{id}_{name}"));

        // When
        let result = StarColumnConverter::new(&naming, &scan_ids).insert_rename_project(plan)?;

        // Then
        assert_eq!(
            explain(&result.data),
            vec![
                "Screen",
                "  ProjectAllowDup: [$0 AS all, $1 AS a, $2 AS all]",
                "    Join: type=Inner, on=[($0, $0)]",
                "      Project: [$0 AS s40_all, $1 AS a]",
                "        Scan: table=l, fields=[all, a]",
                "      Project: [$0 AS s41_all]",
                "        Scan: table=r, fields=[all]",
            ]
        );
        Ok(())
    }
}
