use std::env;
use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;
use std::process::exit;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueHint};
use clap_verbosity_flag::{LogLevel, Verbosity};
use clio::{ClioPath, Output};
use log::{Metadata, Record};
use strum::VariantNames;

use crate::{json, sql_to_ast, sql_to_ir, translate, Dialect, Options};

/// Entrypoint of the `sql2cypher` binary
pub fn main() -> color_eyre::eyre::Result<()> {
    let cli = Cli::parse();

    static LOGGER: StderrLogger = StderrLogger;
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(cli.verbose.log_level_filter()))
        .map_err(|e| color_eyre::eyre::eyre!("{e}"))?;

    color_eyre::install()?;

    if let Err(error) = cli.command.run() {
        eprintln!("{error}");
        if backtrace_enabled() {
            eprintln!("{:#}", error.backtrace());
        }
        exit(1)
    }

    Ok(())
}

fn backtrace_enabled() -> bool {
    match env::var("RUST_LIB_BACKTRACE") {
        Ok(s) => s != "0",
        Err(_) => match env::var("RUST_BACKTRACE") {
            Ok(s) => s != "0",
            Err(_) => false,
        },
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = env!("CARGO_PKG_NAME"), about, version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbose: Verbosity<LoggingHelp>,
}

#[derive(Copy, Clone, Debug, Default)]
struct LoggingHelp;

impl LogLevel for LoggingHelp {
    /// Only errors are reported by default.
    fn default() -> Option<log::Level> {
        Some(log::Level::Error)
    }

    fn verbose_help() -> Option<&'static str> {
        Some("Increase logging verbosity")
    }

    fn verbose_long_help() -> Option<&'static str> {
        Some(
            r#"More `v`s, more verbose logging:
-v shows warnings
-vv shows info
-vvv shows debug
-vvvv shows trace"#,
        )
    }
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Translate SQL into Cypher
    Translate(TranslateArgs),

    #[command(subcommand)]
    Debug(DebugCommand),

    /// Show the SQL dialects accepted by `--dialect`
    #[command(name = "list-dialects")]
    ListDialects,
}

/// Commands meant for debugging, prone to change
#[derive(Subcommand, Debug, Clone)]
enum DebugCommand {
    /// Print the relational model the SQL parses into, as JSON
    Relational(TranslateArgs),

    /// Print the Cypher AST, as JSON
    Ast(TranslateArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct TranslateArgs {
    /// File to read SQL from; `-` for stdin
    #[arg(value_parser, default_value = "-", value_hint(ValueHint::FilePath))]
    input: ClioPath,

    /// File to write to; `-` for stdout
    #[arg(value_parser, default_value = "-", value_hint(ValueHint::FilePath))]
    output: Output,

    /// Put every clause on its own line
    #[arg(long)]
    pretty: bool,

    /// Always escape labels and relationship types
    #[arg(long)]
    escape_names: bool,

    /// SQL dialect to parse with
    #[arg(short, long, env = "SQL2CYPHER_DIALECT")]
    dialect: Option<Dialect>,

    /// Prefix of named parameters, in addition to `:name`
    #[arg(long)]
    param_prefix: Option<String>,

    /// Map a table to a label, as `Table=Label`
    #[arg(long = "table-mapping", value_parser = parse_pair)]
    table_mappings: Vec<(String, String)>,

    /// Map a join column to a relationship type, as `Table.column=TYPE`
    #[arg(long = "join-mapping", value_parser = parse_pair)]
    join_mappings: Vec<(String, String)>,

    /// Configuration property, as `s2c.prettyPrint=true`
    #[arg(short, long = "property", value_parser = parse_pair)]
    properties: Vec<(String, String)>,
}

fn parse_pair(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected `key=value`, got `{s}`")),
    }
}

impl TranslateArgs {
    fn options(&self) -> Result<Options> {
        let mut options = Options::from_properties(self.properties.iter().cloned())?;

        if self.pretty {
            options = options.with_pretty(true);
        }
        if self.escape_names {
            options = options.with_always_escape_names(true);
        }
        if let Some(dialect) = self.dialect {
            options = options.with_dialect(dialect);
        }
        if let Some(prefix) = &self.param_prefix {
            options = options.with_named_param_prefix(prefix);
        }
        for (table, label) in &self.table_mappings {
            options = options.with_table_mapping(table, label);
        }
        for (column, rel_type) in &self.join_mappings {
            options = options.with_join_column_mapping(column, rel_type);
        }
        log::debug!("options: {options:?}");
        Ok(options)
    }

    fn read_input(&self) -> Result<String> {
        // Don't wait for input without saying so.
        if self.input.path() == Path::new("-") && io::stdin().is_terminal() {
            #[cfg(unix)]
            eprintln!("Enter SQL, then press ctrl-d to translate:\n");
            #[cfg(windows)]
            eprintln!("Enter SQL, then press ctrl-z to translate:\n");
        }
        let mut sql = String::new();
        self.input.clone().open()?.read_to_string(&mut sql)?;
        Ok(sql)
    }

    fn write_output(&self, data: &str) -> io::Result<()> {
        let mut output = self.output.clone();
        output.write_all(data.as_bytes())?;
        output.write_all(b"\n")
    }
}

impl Command {
    /// Entrypoint called by [`main`]
    fn run(&self) -> Result<()> {
        let (args, output) = match self {
            Command::Translate(args) => {
                let sql = args.read_input()?;
                (args, translate(&sql, &args.options()?)?)
            }
            Command::Debug(DebugCommand::Relational(args)) => {
                let sql = args.read_input()?;
                let statement = sql_to_ast(&sql, &args.options()?)?;
                (args, serde_json::to_string_pretty(&statement)?)
            }
            Command::Debug(DebugCommand::Ast(args)) => {
                let sql = args.read_input()?;
                let statement = sql_to_ir(&sql, &args.options()?, None)?;
                (args, json::from_cypher(&statement)?)
            }
            Command::ListDialects => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(Dialect::VARIANTS.join("\n").as_bytes())?;
                stdout.write_all(b"\n")?;
                return Ok(());
            }
        };

        args.write_output(&output)?;
        Ok(())
    }
}

/// Writes log records to stderr.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[{} {}] {}",
                record.level(),
                record.module_path().unwrap_or_default(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn args(cli: &[&str]) -> TranslateArgs {
        let cli = Cli::try_parse_from(cli).unwrap();
        match cli.command {
            Command::Translate(args) | Command::Debug(DebugCommand::Ast(args)) => args,
            command => panic!("unexpected command {command:?}"),
        }
    }

    #[test]
    fn test_options_from_flags() {
        let args = args(&[
            "sql2cypher",
            "translate",
            "--pretty",
            "--table-mapping",
            "Orders=Order",
            "--join-mapping",
            "Orders.CustomerID=PURCHASED",
            "--property",
            "s2c.alwaysEscapeNames=true",
        ]);
        let options = args.options().unwrap();

        assert!(options.pretty);
        assert!(options.always_escape_names);
        assert_eq!(options.table_to_label_mappings["Orders"], "Order");
        assert_eq!(
            options.join_columns_to_type_mappings["Orders.CustomerID"],
            "PURCHASED"
        );
    }

    #[test]
    fn test_invalid_property() {
        let args = args(&["sql2cypher", "translate", "-p", "s2c.prettyPrint=maybe"]);
        assert_snapshot!(args.options().unwrap_err(), @"[E0004] Error: invalid configuration: `maybe` is not a valid value for `s2c.prettyPrint`: expected `true` or `false`");
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("Movies = Movie"),
            Ok(("Movies".to_string(), "Movie".to_string()))
        );
        assert!(parse_pair("Movies").is_err());
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["sql2cypher", "list-dialects"]).unwrap();
        assert_eq!(cli.verbose.log_level_filter(), log::LevelFilter::Error);

        let cli = Cli::try_parse_from(["sql2cypher", "-vvv", "list-dialects"]).unwrap();
        assert_eq!(cli.verbose.log_level_filter(), log::LevelFilter::Debug);

        let cli = Cli::try_parse_from(["sql2cypher", "list-dialects", "-q"]).unwrap();
        assert_eq!(cli.verbose.log_level_filter(), log::LevelFilter::Off);
    }

    #[test]
    fn test_input_defaults_to_stdin() {
        let args = args(&["sql2cypher", "translate"]);
        assert_eq!(args.input.path(), Path::new("-"));
        assert!(args.output.is_std());
    }

    #[test]
    fn test_read_input_from_file() {
        let path = env::temp_dir().join(format!("sql2cypher-cli-{}.sql", std::process::id()));
        std::fs::write(&path, "SELECT name FROM Person").unwrap();

        let args = args(&["sql2cypher", "translate", path.to_str().unwrap()]);
        let sql = args.read_input().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_snapshot!(translate(&sql, &args.options().unwrap()).unwrap(), @"MATCH (person:Person) RETURN person.name AS name");
    }
}
