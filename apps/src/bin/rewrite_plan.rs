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
use apps::{init_logging, read_plan};
use clap::Parser;
use human_panic::setup_panic;
use log::info;
use owo_colors::OwoColorize;
use star_rename::{
    ConventionNaming, DEFAULT_PREFIX_DELIMITER, DEFAULT_STAR_COLUMN, DEFAULT_TABLE_PREFIX,
    ScanIdGenerator, StarColumnConfigBuilder, StarColumnConverter, verify::verify_rewrite,
};
use std::sync::Arc;

/// Applies the star column rename pass to a physical plan.
///
/// The plan is read as JSON from a file (or standard input when given "-") and the
/// rewritten plan is printed to standard output, one operator per line.
///
#[derive(Parser, Debug)]
#[command(author, version)]
struct CmdLineArgs {
    /// Plan file in JSON, "-" reads standard input
    plan: String,
    /// Names starting with this are star expanded columns
    #[arg(long, default_value = DEFAULT_STAR_COLUMN)]
    star_column: String,
    /// Separates the table prefix from the star column name
    #[arg(long, default_value = DEFAULT_PREFIX_DELIMITER)]
    prefix_delimiter: String,
    /// Put in front of each scan id
    #[arg(long, default_value = DEFAULT_TABLE_PREFIX)]
    table_prefix: String,
    /// Check the rewritten plan and fail if it is unsafe to execute
    #[arg(short = 'v', long)]
    verify: bool,
    /// Print the plan as read before the rewritten plan
    #[arg(short = 'o', long)]
    show_original: bool,
}

fn main() -> color_eyre::Result<()> {
    // Install coloured errors
    color_eyre::install()?;

    // Install human readable panics
    setup_panic!();

    // Install and configure environment logger
    init_logging();

    let args = CmdLineArgs::parse();

    let config = StarColumnConfigBuilder::new()
        .star_column(args.star_column)
        .prefix_delimiter(args.prefix_delimiter)
        .table_prefix(args.table_prefix)
        .build()?;
    info!("Renaming with {config}");
    let naming = ConventionNaming::new(config);

    let plan = read_plan(&args.plan)?;
    if args.show_original {
        println!("{}", "Original plan:".bold());
        print!("{}", plan.display_indent());
    }

    let result = StarColumnConverter::new(&naming, ScanIdGenerator::global())
        .insert_rename_project(Arc::clone(&plan))?;
    if args.verify {
        verify_rewrite(&plan, &result.data, &naming)?;
        info!("Rewritten plan passed verification");
    }

    let heading = if result.transformed {
        "Rewritten plan:"
    } else {
        "Plan unchanged:"
    };
    println!("{}", heading.bold().green());
    print!("{}", result.data.display_indent());
    Ok(())
}
