//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;
use crate::execution::{Executor, MockEngine};
use crate::query::{parse_params, to_query_params, to_query_string, EntitySet, QueryOptions};

use super::args::{Cli, Command, QueryArgs};
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{read_dataset, write_error, write_response};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "ODATAKIT_LOG";

/// Parse arguments, run the command and report failures on stdout
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging();

    let result = run_command(cli);
    if let Err(e) = &result {
        write_error(e.code().code(), e.message())?;
    }
    result
}

/// Install the stderr log subscriber; `ODATAKIT_LOG` overrides the `warn` default
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed, e.g. by a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Dispatch a parsed command
pub fn run_command(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Render { query } => render(&config, &query).and_then(write_response),
        Command::Query { data, query: args } => query(&config, &data, &args).and_then(write_response),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<ClientConfig> {
    match path {
        Some(path) => {
            let config =
                ClientConfig::load(path).map_err(|e| CliError::config_error(e.to_string()))?;
            info!(path = %path.display(), "loaded config");
            Ok(config)
        }
        None => Ok(ClientConfig::default()),
    }
}

/// Turn query flags into options, capped by the configured maximum page size
pub fn build_options(config: &ClientConfig, args: &QueryArgs) -> CliResult<QueryOptions> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    let flags = [
        ("select", &args.select),
        ("order", &args.order),
        ("limit", &args.limit),
        ("offset", &args.offset),
        ("expand", &args.expand),
    ];
    for (key, value) in flags {
        if let Some(value) = value {
            pairs.push((key.to_string(), value.clone()));
        }
    }
    if args.count {
        pairs.push(("count".to_string(), "true".to_string()));
    }
    for filter in &args.filters {
        let (field, condition) = filter.split_once('=').ok_or_else(|| {
            CliError::new(
                CliErrorCode::QueryError,
                format!("filter must look like field=op.value: {}", filter),
            )
        })?;
        pairs.push((field.trim().to_string(), condition.trim().to_string()));
    }

    debug!(params = pairs.len(), "parsing query flags");
    Ok(parse_params(pairs, config.max_top)?)
}

/// Render the protocol parameters of a query
pub fn render(config: &ClientConfig, args: &QueryArgs) -> CliResult<Value> {
    let options = build_options(config, args)?;
    let params = to_query_params(&options);

    Ok(json!({
        "query": to_query_string(&params),
        "params": params
            .iter()
            .map(|(name, value)| json!({"name": name, "value": value}))
            .collect::<Vec<_>>(),
    }))
}

/// Run a query over a dataset file with the mock engine
pub fn query(config: &ClientConfig, data: &Path, args: &QueryArgs) -> CliResult<Value> {
    let options = build_options(config, args)?;
    let records = read_dataset(data)?;
    debug!(records = records.len(), "dataset loaded");

    let engine = MockEngine::new(records).with_default_top(config.default_top);
    let set = EntitySet::from_options(Arc::new(engine) as Arc<dyn Executor>, options);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| CliError::io_error(format!("cannot start runtime: {}", e)))?;

    runtime.block_on(async {
        let result = set.execute()?;
        let value = result.data().await?;
        let count = if set.options().count {
            Some(result.count().await?)
        } else {
            None
        };
        Ok::<_, CliError>(json!({ "count": count, "value": value }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args() -> QueryArgs {
        QueryArgs::default()
    }

    #[test]
    fn test_render() {
        let args = QueryArgs {
            select: Some("id,name".into()),
            order: Some("name.desc".into()),
            limit: Some("2".into()),
            count: true,
            filters: vec!["age=gte.30".into()],
            ..args()
        };

        let rendered = render(&ClientConfig::default(), &args).unwrap();

        assert_eq!(
            rendered["query"],
            "$count=true&$filter=age ge 30&$orderby=name desc&$select=id, name&$top=2"
        );
        assert_eq!(rendered["params"][0], json!({"name": "$count", "value": "true"}));
    }

    #[test]
    fn test_limit_capped_by_config() {
        let config = ClientConfig {
            max_top: 10,
            ..ClientConfig::default()
        };
        let args = QueryArgs {
            limit: Some("11".into()),
            ..args()
        };
        assert!(render(&config, &args).is_err());
    }

    #[test]
    fn test_malformed_filter_flag() {
        let args = QueryArgs {
            filters: vec!["age".into()],
            ..args()
        };
        assert!(build_options(&ClientConfig::default(), &args).is_err());
    }

    #[test]
    fn test_query_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.json");
        fs::write(
            &path,
            r#"[{"id":1,"name":"Carol","age":30},{"id":2,"name":"Ann","age":25},{"id":3,"name":"Bob","age":35}]"#,
        )
        .unwrap();

        let args = QueryArgs {
            select: Some("id".into()),
            order: Some("name.desc".into()),
            limit: Some("2".into()),
            count: true,
            filters: vec!["age=gte.30".into()],
            ..args()
        };

        let result = query(&ClientConfig::default(), &path, &args).unwrap();
        assert_eq!(result, json!({"count": 2, "value": [{"id": 1}, {"id": 3}]}));
    }
}
