//! Explain-style rendering of operator trees.
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
use crate::plan::{Operator, Partitioning};
use std::fmt::{Display, Formatter, Result};

/// Writes one line per node, children indented two spaces below their parent.
pub struct IndentDisplay<'a> {
    root: &'a Operator,
}

impl<'a> IndentDisplay<'a> {
    pub(crate) fn new(root: &'a Operator) -> Self {
        Self { root }
    }
}

impl Display for IndentDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        fn write_node(f: &mut Formatter<'_>, node: &Operator, depth: usize) -> Result {
            writeln!(f, "{:indent$}{node}", "", indent = depth * 2)?;
            node.children()
                .into_iter()
                .try_for_each(|child| write_node(f, child, depth + 1))
        }
        write_node(f, self.root, 0)
    }
}

/// Single line description of a node without its children.
impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.name())?;
        match self {
            Self::Scan(scan) => write!(
                f,
                ": table={}, fields=[{}]",
                scan.table(),
                join_names(scan.schema().fields().iter().map(|field| field.name().as_str()))
            ),
            Self::Project(project) => {
                let exprs = project
                    .exprs()
                    .iter()
                    .zip(project.schema().fields().iter())
                    .map(|(expr, field)| format!("{expr} AS {}", field.name()))
                    .collect::<Vec<_>>();
                write!(f, ": [{}]", exprs.join(", "))
            }
            Self::Join(join) => {
                let on = join
                    .on()
                    .iter()
                    .map(|(l, r)| format!("(${l}, ${r})"))
                    .collect::<Vec<_>>();
                write!(f, ": type={}, on=[{}]", join.join_type(), on.join(", "))
            }
            Self::Filter(filter) => write!(f, ": {}", filter.predicate()),
            Self::Sort(sort) => {
                let keys = sort
                    .keys()
                    .iter()
                    .map(|k| format!("${} {}", k.column, if k.descending { "DESC" } else { "ASC" }))
                    .collect::<Vec<_>>();
                write!(f, ": [{}]", keys.join(", "))
            }
            Self::Limit(limit) => match limit.fetch() {
                Some(fetch) => write!(f, ": offset={}, fetch={fetch}", limit.offset()),
                None => write!(f, ": offset={}", limit.offset()),
            },
            Self::Exchange(exchange) => match exchange.partitioning() {
                Partitioning::Single => write!(f, ": Single"),
                Partitioning::Hash(keys) => write!(
                    f,
                    ": Hash([{}])",
                    keys.iter().map(|k| format!("${k}")).collect::<Vec<_>>().join(", ")
                ),
            },
            Self::UnionAll(_) | Self::Screen(_) => Ok(()),
            Self::Writer(writer) => write!(f, ": location={}", writer.location()),
        }
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
