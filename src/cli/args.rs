//! CLI argument definitions using clap
//!
//! Commands:
//! - odatakit render [query flags]
//! - odatakit query --data <path> [query flags]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Extended help: the query flags follow PostgREST, not the `$`-option syntax they render to
const LONG_ABOUT: &str = "\
Build protocol queries and run them against local data.

Query flags use the PostgREST textual dialect and are translated into
`$filter`, `$orderby`, `$select`, `$skip`, `$top`, `$count` and `$expand`:

  --where age=gte.30        eq, neq, gt, gte, lt, lte (a bare value means eq)
  --where name=like.%son    % at either end marks a suffix, prefix or substring match
  --where id=in.(1,2,3)     any of the listed values
  --where email=is.null     is.null or is.notnull
  --order name.desc,id      field.asc or field.desc, ascending when omitted
  --select id,name          `*` keeps every field
  --limit 10 --offset 20    page size and records to skip
  --count                   also request the total count";

/// odatakit - build protocol queries and run them against local data
#[derive(Parser, Debug)]
#[command(name = "odatakit")]
#[command(version, about, long_about = LONG_ABOUT)]
pub struct Cli {
    /// Path to a JSON client configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the protocol query parameters for a query
    Render {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Run a query against a JSON dataset with the mock engine
    Query {
        /// JSON file holding an array of records or `{"value": [...]}`
        #[arg(long)]
        data: PathBuf,

        #[command(flatten)]
        query: QueryArgs,
    },
}

/// Query flags in the PostgREST dialect (`field=op.value` filters, `field.desc`
/// ordering, `limit`/`offset` paging), translated to protocol options
#[derive(Args, Debug, Default, Clone)]
pub struct QueryArgs {
    /// Comma-separated fields to keep
    #[arg(long)]
    pub select: Option<String>,

    /// Comma-separated `field.asc|desc` entries
    #[arg(long)]
    pub order: Option<String>,

    /// Maximum number of records
    #[arg(long)]
    pub limit: Option<String>,

    /// Records to skip
    #[arg(long)]
    pub offset: Option<String>,

    /// Request the total count
    #[arg(long)]
    pub count: bool,

    /// Filter `field=op.value`, repeatable
    #[arg(long = "where", value_name = "FIELD=OP.VALUE")]
    pub filters: Vec<String>,

    /// Comma-separated navigation properties to expand
    #[arg(long)]
    pub expand: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
