//! The physical operator tree that the star column rename pass reads and rebuilds.
//!
//! Nodes are immutable and shared through [`Arc`]. Rewrites always build new nodes
//! and leave their input untouched, the same way `DataFusion` treats
//! `Arc<dyn ExecutionPlan>`.
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
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use datafusion::{
    common::{plan_err, tree_node::DynTreeNode},
    error::Result,
};
use std::{
    collections::HashSet,
    fmt::{Display, Formatter},
    sync::Arc,
};

pub mod display;

pub use display::IndentDisplay;

/// Shared reference to a plan node.
pub type OperatorRef = Arc<Operator>;

/// Name of the first field of the [`Writer`] summary output.
pub const WRITER_FRAGMENT_FIELD: &str = "Fragment";
/// Name of the second field of the [`Writer`] summary output.
pub const WRITER_RECORDS_FIELD: &str = "Number of records written";

/// A single output expression of a [`Projection`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectExpr {
    /// Pass through the input field at this position.
    Column(usize),
    /// Any other expression. The rename pass never looks inside it.
    Computed {
        expr: String,
        data_type: DataType,
        nullable: bool,
    },
}

impl ProjectExpr {
    #[must_use]
    pub fn column(index: usize) -> Self {
        Self::Column(index)
    }

    #[must_use]
    pub fn computed(expr: impl Into<String>, data_type: DataType) -> Self {
        Self::Computed {
            expr: expr.into(),
            data_type,
            nullable: true,
        }
    }

    /// Position of the referenced input field if this is a pure column reference.
    #[must_use]
    pub fn as_column(&self) -> Option<usize> {
        match self {
            Self::Column(index) => Some(*index),
            Self::Computed { .. } => None,
        }
    }

    /// Output field this expression produces under the given name.
    fn to_field(&self, name: &str, input_schema: &Schema) -> Result<Field> {
        match self {
            Self::Column(index) => {
                let Some(input_field) = input_schema.fields().get(*index) else {
                    return plan_err!(
                        "column reference ${index} is out of range for input of {} fields",
                        input_schema.fields().len()
                    );
                };
                Ok(Field::new(
                    name,
                    input_field.data_type().clone(),
                    input_field.is_nullable(),
                ))
            }
            Self::Computed {
                data_type,
                nullable,
                ..
            } => Ok(Field::new(name, data_type.clone(), *nullable)),
        }
    }
}

impl Display for ProjectExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Column(index) => write!(f, "${index}"),
            Self::Computed { expr, .. } => write!(f, "{expr}"),
        }
    }
}

/// Reads a table. Star columns only ever originate here.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    table: String,
    schema: SchemaRef,
}

impl Scan {
    #[must_use]
    pub fn new(table: impl Into<String>, schema: SchemaRef) -> Self {
        Self {
            table: table.into(),
            schema,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }
}

/// Computes one output field per expression over a single input.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    exprs: Vec<ProjectExpr>,
    schema: SchemaRef,
    input: OperatorRef,
    allow_duplicates: bool,
}

impl Projection {
    /// Create a projection from `(expression, output name)` pairs. Output types come
    /// from the input fields for column references and from the expression otherwise.
    ///
    /// # Errors
    /// If a column reference is out of range or two output names are equal.
    pub fn try_new(exprs: Vec<(ProjectExpr, String)>, input: OperatorRef) -> Result<Self> {
        let input_schema = input.schema();
        let fields = exprs
            .iter()
            .map(|(expr, name)| expr.to_field(name, &input_schema))
            .collect::<Result<Vec<_>>>()?;
        let exprs = exprs.into_iter().map(|(expr, _)| expr).collect();
        Self::try_new_with_schema(exprs, Arc::new(Schema::new(fields)), input, false)
    }

    /// Create a projection with an explicitly declared output schema.
    ///
    /// Set `allow_duplicates` only where the output must reproduce a schema that
    /// already had repeated names.
    ///
    /// # Errors
    /// If the expression and field counts differ, a column reference is out of
    /// range, or duplicate names appear when they are not allowed.
    pub fn try_new_with_schema(
        exprs: Vec<ProjectExpr>,
        schema: SchemaRef,
        input: OperatorRef,
        allow_duplicates: bool,
    ) -> Result<Self> {
        if exprs.len() != schema.fields().len() {
            return plan_err!(
                "projection has {} expressions but {} output fields",
                exprs.len(),
                schema.fields().len()
            );
        }
        let input_width = input.schema().fields().len();
        if let Some(index) = exprs
            .iter()
            .filter_map(ProjectExpr::as_column)
            .find(|index| *index >= input_width)
        {
            return plan_err!(
                "column reference ${index} is out of range for input of {input_width} fields"
            );
        }
        if !allow_duplicates {
            let mut seen = HashSet::new();
            if let Some(name) = schema.fields().iter().map(|f| f.name()).find(|n| !seen.insert(*n)) {
                return plan_err!("projection has duplicate field name \"{name}\"");
            }
        }
        Ok(Self {
            exprs,
            schema,
            input,
            allow_duplicates,
        })
    }

    /// Identity projection over `input` that gives its fields the given names.
    ///
    /// # Errors
    /// If the number of names differs from the input width or names repeat.
    pub fn rename(input: OperatorRef, names: &[String]) -> Result<Self> {
        let input_schema = input.schema();
        if names.len() != input_schema.fields().len() {
            return plan_err!(
                "cannot rename {} fields with {} names",
                input_schema.fields().len(),
                names.len()
            );
        }
        let exprs = (0..names.len()).map(ProjectExpr::Column).collect();
        let schema = rename_fields(&input_schema, names);
        Self::try_new_with_schema(exprs, schema, input, false)
    }

    #[must_use]
    pub fn exprs(&self) -> &[ProjectExpr] {
        &self.exprs
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    #[must_use]
    pub fn input(&self) -> &OperatorRef {
        &self.input
    }

    #[must_use]
    pub fn allow_duplicates(&self) -> bool {
        self.allow_duplicates
    }

    /// A projection is trivial when it passes its input straight through: every
    /// input field referenced once, in order, with the same name and type.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        let input_schema = self.input.schema();
        self.exprs.len() == input_schema.fields().len()
            && self
                .exprs
                .iter()
                .enumerate()
                .all(|(pos, expr)| expr.as_column() == Some(pos))
            && self
                .schema
                .fields()
                .iter()
                .zip(input_schema.fields().iter())
                .all(|(out, inp)| out.name() == inp.name() && out.data_type() == inp.data_type())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl Display for JoinType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Inner => "Inner",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Full => "Full",
        };
        write!(f, "{name}")
    }
}

/// Equi-join of two inputs. Output is the left fields followed by the right fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    left: OperatorRef,
    right: OperatorRef,
    join_type: JoinType,
    on: Vec<(usize, usize)>,
    schema: SchemaRef,
}

impl Join {
    /// # Errors
    /// If a join key refers past the end of its side's schema.
    pub fn try_new(
        left: OperatorRef,
        right: OperatorRef,
        join_type: JoinType,
        on: Vec<(usize, usize)>,
    ) -> Result<Self> {
        let left_schema = left.schema();
        let right_schema = right.schema();
        if let Some((l, r)) = on.iter().find(|(l, r)| {
            *l >= left_schema.fields().len() || *r >= right_schema.fields().len()
        }) {
            return plan_err!("join key (${l}, ${r}) is out of range");
        }
        let nullable_left = matches!(join_type, JoinType::Right | JoinType::Full);
        let nullable_right = matches!(join_type, JoinType::Left | JoinType::Full);
        let fields = widen(&left_schema, nullable_left)
            .chain(widen(&right_schema, nullable_right))
            .collect::<Vec<_>>();
        Ok(Self {
            left,
            right,
            join_type,
            on,
            schema: Arc::new(Schema::new(fields)),
        })
    }

    #[must_use]
    pub fn left(&self) -> &OperatorRef {
        &self.left
    }

    #[must_use]
    pub fn right(&self) -> &OperatorRef {
        &self.right
    }

    #[must_use]
    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    #[must_use]
    pub fn on(&self) -> &[(usize, usize)] {
        &self.on
    }
}

fn widen(schema: &Schema, nullable: bool) -> impl Iterator<Item = FieldRef> + '_ {
    schema.fields().iter().map(move |f| {
        if nullable && !f.is_nullable() {
            Arc::new(f.as_ref().clone().with_nullable(true))
        } else {
            Arc::clone(f)
        }
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    input: OperatorRef,
    predicate: String,
}

impl Filter {
    #[must_use]
    pub fn new(input: OperatorRef, predicate: impl Into<String>) -> Self {
        Self {
            input,
            predicate: predicate.into(),
        }
    }

    #[must_use]
    pub fn input(&self) -> &OperatorRef {
        &self.input
    }

    #[must_use]
    pub fn predicate(&self) -> &str {
        &self.predicate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub column: usize,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    input: OperatorRef,
    keys: Vec<SortKey>,
}

impl Sort {
    /// # Errors
    /// If a sort key refers past the end of the input schema.
    pub fn try_new(input: OperatorRef, keys: Vec<SortKey>) -> Result<Self> {
        let width = input.schema().fields().len();
        if let Some(key) = keys.iter().find(|k| k.column >= width) {
            return plan_err!("sort key ${} is out of range", key.column);
        }
        Ok(Self { input, keys })
    }

    #[must_use]
    pub fn input(&self) -> &OperatorRef {
        &self.input
    }

    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    input: OperatorRef,
    offset: usize,
    fetch: Option<usize>,
}

impl Limit {
    #[must_use]
    pub fn new(input: OperatorRef, offset: usize, fetch: Option<usize>) -> Self {
        Self {
            input,
            offset,
            fetch,
        }
    }

    #[must_use]
    pub fn input(&self) -> &OperatorRef {
        &self.input
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn fetch(&self) -> Option<usize> {
        self.fetch
    }
}

/// How an [`Exchange`] redistributes rows between fragments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Partitioning {
    Single,
    Hash(Vec<usize>),
}

/// Moves rows between execution fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    input: OperatorRef,
    partitioning: Partitioning,
}

impl Exchange {
    /// # Errors
    /// If a hash key refers past the end of the input schema.
    pub fn try_new(input: OperatorRef, partitioning: Partitioning) -> Result<Self> {
        if let Partitioning::Hash(keys) = &partitioning {
            let width = input.schema().fields().len();
            if let Some(key) = keys.iter().find(|k| **k >= width) {
                return plan_err!("hash key ${key} is out of range");
            }
        }
        Ok(Self {
            input,
            partitioning,
        })
    }

    #[must_use]
    pub fn input(&self) -> &OperatorRef {
        &self.input
    }

    #[must_use]
    pub fn partitioning(&self) -> &Partitioning {
        &self.partitioning
    }
}

/// Concatenates inputs of equal width. Field names come from the first input.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionAll {
    inputs: Vec<OperatorRef>,
}

impl UnionAll {
    /// # Errors
    /// If there are no inputs or the inputs differ in width.
    pub fn try_new(inputs: Vec<OperatorRef>) -> Result<Self> {
        let Some(first) = inputs.first() else {
            return plan_err!("union needs at least one input");
        };
        let width = first.schema().fields().len();
        if let Some(other) = inputs
            .iter()
            .map(|i| i.schema().fields().len())
            .find(|w| *w != width)
        {
            return plan_err!("union inputs have {width} and {other} fields");
        }
        Ok(Self { inputs })
    }

    #[must_use]
    pub fn inputs(&self) -> &[OperatorRef] {
        &self.inputs
    }
}

/// Returns rows to the client. Always the root of a query plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    input: OperatorRef,
}

impl Screen {
    #[must_use]
    pub fn new(input: OperatorRef) -> Self {
        Self { input }
    }

    #[must_use]
    pub fn input(&self) -> &OperatorRef {
        &self.input
    }
}

/// Writes its input to `location` and outputs a summary of what was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Writer {
    input: OperatorRef,
    location: String,
    schema: SchemaRef,
}

impl Writer {
    #[must_use]
    pub fn new(input: OperatorRef, location: impl Into<String>) -> Self {
        Self {
            input,
            location: location.into(),
            schema: Arc::new(Schema::new(vec![
                Field::new(WRITER_FRAGMENT_FIELD, DataType::Utf8, false),
                Field::new(WRITER_RECORDS_FIELD, DataType::Int64, false),
            ])),
        }
    }

    #[must_use]
    pub fn input(&self) -> &OperatorRef {
        &self.input
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }
}

/// A physical plan node.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Scan(Scan),
    Project(Projection),
    Join(Join),
    Filter(Filter),
    Sort(Sort),
    Limit(Limit),
    Exchange(Exchange),
    UnionAll(UnionAll),
    Screen(Screen),
    Writer(Writer),
}

impl Operator {
    /// Output schema of this node.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        match self {
            Self::Scan(scan) => Arc::clone(&scan.schema),
            Self::Project(project) => Arc::clone(&project.schema),
            Self::Join(join) => Arc::clone(&join.schema),
            Self::Filter(Filter { input, .. })
            | Self::Sort(Sort { input, .. })
            | Self::Limit(Limit { input, .. })
            | Self::Exchange(Exchange { input, .. })
            | Self::Screen(Screen { input }) => input.schema(),
            Self::UnionAll(union) => union.inputs[0].schema(),
            Self::Writer(writer) => Arc::clone(&writer.schema),
        }
    }

    /// Inputs of this node in order.
    #[must_use]
    pub fn children(&self) -> Vec<&OperatorRef> {
        match self {
            Self::Scan(_) => vec![],
            Self::Project(Projection { input, .. })
            | Self::Filter(Filter { input, .. })
            | Self::Sort(Sort { input, .. })
            | Self::Limit(Limit { input, .. })
            | Self::Exchange(Exchange { input, .. })
            | Self::Screen(Screen { input })
            | Self::Writer(Writer { input, .. }) => vec![input],
            Self::Join(join) => vec![&join.left, &join.right],
            Self::UnionAll(union) => union.inputs.iter().collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scan(_) => "Scan",
            Self::Project(project) if project.allow_duplicates => "ProjectAllowDup",
            Self::Project(_) => "Project",
            Self::Join(_) => "Join",
            Self::Filter(_) => "Filter",
            Self::Sort(_) => "Sort",
            Self::Limit(_) => "Limit",
            Self::Exchange(_) => "Exchange",
            Self::UnionAll(_) => "UnionAll",
            Self::Screen(_) => "Screen",
            Self::Writer(_) => "Writer",
        }
    }

    /// Rebuild this node over new inputs, keeping every other parameter. Schemas
    /// derived from the inputs are recomputed; a projection keeps its declared schema.
    ///
    /// # Errors
    /// If the number of children is wrong for this kind of node, or the rebuilt
    /// node fails validation against its new inputs.
    pub fn with_new_children(&self, children: Vec<OperatorRef>) -> Result<OperatorRef> {
        let expected = self.children().len();
        if !matches!(self, Self::UnionAll(_)) && children.len() != expected {
            return plan_err!(
                "{} expects {expected} children but got {}",
                self.name(),
                children.len()
            );
        }
        let mut children = children.into_iter();
        let node = match self {
            Self::Scan(scan) => Self::Scan(scan.clone()),
            Self::Project(project) => Self::Project(Projection::try_new_with_schema(
                project.exprs.clone(),
                Arc::clone(&project.schema),
                next_child(&mut children)?,
                project.allow_duplicates,
            )?),
            Self::Join(join) => Self::Join(Join::try_new(
                next_child(&mut children)?,
                next_child(&mut children)?,
                join.join_type,
                join.on.clone(),
            )?),
            Self::Filter(filter) => {
                Self::Filter(Filter::new(next_child(&mut children)?, &filter.predicate))
            }
            Self::Sort(sort) => {
                Self::Sort(Sort::try_new(next_child(&mut children)?, sort.keys.clone())?)
            }
            Self::Limit(limit) => Self::Limit(Limit::new(
                next_child(&mut children)?,
                limit.offset,
                limit.fetch,
            )),
            Self::Exchange(exchange) => Self::Exchange(Exchange::try_new(
                next_child(&mut children)?,
                exchange.partitioning.clone(),
            )?),
            Self::Screen(_) => Self::Screen(Screen::new(next_child(&mut children)?)),
            Self::Writer(writer) => {
                Self::Writer(Writer::new(next_child(&mut children)?, &writer.location))
            }
            Self::UnionAll(_) => Self::UnionAll(UnionAll::try_new(children.collect())?),
        };
        Ok(Arc::new(node))
    }

    /// Indented multi-line rendering of the plan rooted here.
    #[must_use]
    pub fn display_indent(&self) -> IndentDisplay<'_> {
        IndentDisplay::new(self)
    }
}

fn next_child(children: &mut impl Iterator<Item = OperatorRef>) -> Result<OperatorRef> {
    match children.next() {
        Some(child) => Ok(child),
        None => plan_err!("missing child operator"),
    }
}

impl DynTreeNode for Operator {
    fn arc_children(&self) -> Vec<&Arc<Self>> {
        self.children()
    }

    fn with_new_arc_children(
        &self,
        _arc_self: Arc<Self>,
        new_children: Vec<Arc<Self>>,
    ) -> Result<Arc<Self>> {
        self.with_new_children(new_children)
    }
}

/// Copy of `schema` with its fields renamed in order. Types, nullability and
/// metadata are kept.
#[must_use]
pub fn rename_fields(schema: &Schema, names: &[String]) -> SchemaRef {
    let fields = schema
        .fields()
        .iter()
        .zip(names)
        .map(|(field, name)| {
            Field::new(name, field.data_type().clone(), field.is_nullable())
                .with_metadata(field.metadata().clone())
        })
        .collect::<Vec<_>>();
    Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
}

/// Field names of a schema in order.
#[must_use]
pub fn field_names(schema: &Schema) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().clone()).collect()
}
