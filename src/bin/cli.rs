use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame};
use schedule_expander::{
    ColumnAliases, ExpanderConfig, ExportFormat, ScheduleTable, dates, pipeline,
};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

const NO_EXECUTION_DATE_FLAG: &str = "--no-execution-date";

fn cell_text(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::Date(days) => dates::format_date(dates::date_from_i32(*days)),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    // Width in characters; headers carry accents.
    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, value) in values.iter().enumerate() {
            let pad = widths[ci].saturating_sub(value.chars().count());
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(pad));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  load <path> [media-type]           Expand a PDF or XLSX schedule (type from extension if omitted)\n  show                               Show the expanded rows (filtered if a filter is set)\n  summary                            Show expansion counters\n  dates                              List distinct execution dates\n  filter <DD/MM/YYYY>                Keep only rows for one execution date\n  clear                              Remove the date filter\n  export <path> [DD/MM/YYYY] [--no-execution-date]\n                                     Write .xlsx or .csv (by extension), optionally for one date\n  aliases show                       Show column aliases\n  aliases load <json_path>           Replace column aliases from a JSON file\n  aliases save <json_path>           Save column aliases to a JSON file\n  quit|exit                          Exit"
    );
}

fn print_aliases(aliases: &ColumnAliases) {
    for column in schedule_expander::CanonicalColumn::ALL {
        println!("{:<16}: {}", column.header(), aliases.aliases(column).join(", "));
    }
}

/// The loaded table and the optional execution-date view over it.
#[derive(Default)]
struct Session {
    table: Option<ScheduleTable>,
    filter: Option<(NaiveDate, ScheduleTable)>,
}

impl Session {
    fn current(&self) -> Option<&ScheduleTable> {
        match &self.filter {
            Some((_, view)) => Some(view),
            None => self.table.as_ref(),
        }
    }
}

fn load_config(args: &[String]) -> Result<ExpanderConfig, schedule_expander::ConfigError> {
    match args.iter().position(|a| a == "--config") {
        Some(idx) => match args.get(idx + 1) {
            Some(path) => ExpanderConfig::load(path),
            None => Err(schedule_expander::ConfigError::Invalid(
                "--config needs a path".into(),
            )),
        },
        None => ExpanderConfig::from_env(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(2);
        }
    };
    let mut session = Session::default();

    println!("Schedule Expander (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "load" => {
                let path = parts.next();
                let declared = parts.next();
                match path {
                    Some(path) => match pipeline::process_path(Path::new(path), declared, &config) {
                        Ok(table) => {
                            println!(
                                "Schedule loaded from {} ({})",
                                path,
                                table.summary().to_cli_summary()
                            );
                            println!("{}", render_df_as_text_table(table.dataframe()));
                            session.table = Some(table);
                            session.filter = None;
                        }
                        Err(e) => println!("Error: {}", e),
                    },
                    None => println!("Usage: load <path> [media-type]"),
                }
            }
            "show" => match session.current() {
                Some(table) => println!("{}", render_df_as_text_table(table.dataframe())),
                None => println!("No schedule loaded."),
            },
            "summary" => match session.current() {
                Some(table) => println!("{}", table.summary().to_cli_summary()),
                None => println!("No schedule loaded."),
            },
            "dates" => match session.table.as_ref().map(|t| t.execution_dates()) {
                Some(Ok(days)) => {
                    for day in days {
                        println!("{}", dates::format_date(day));
                    }
                }
                Some(Err(e)) => println!("Error: {}", e),
                None => println!("No schedule loaded."),
            },
            "filter" => {
                let Some(table) = session.table.as_ref() else {
                    println!("No schedule loaded.");
                    continue;
                };
                let Some(raw) = parts.next() else {
                    println!("Usage: filter <DD/MM/YYYY>");
                    continue;
                };
                let date = match pipeline::parse_filter_date(raw) {
                    Ok(d) => d,
                    Err(e) => {
                        println!("Error: {}", e);
                        continue;
                    }
                };
                match table.filter_by_execution_date(date) {
                    Ok(view) if view.is_empty() => {
                        println!("No activity runs on {}.", dates::format_date(date));
                    }
                    Ok(view) => {
                        println!(
                            "Filtered to {} ({} rows)",
                            dates::format_date(date),
                            view.len()
                        );
                        println!("{}", render_df_as_text_table(view.dataframe()));
                        session.filter = Some((date, view));
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "clear" => {
                session.filter = None;
                println!("Filter cleared.");
            }
            "export" => {
                let Some(table) = session.table.as_ref() else {
                    println!("No schedule loaded.");
                    continue;
                };
                let Some(path) = parts.next() else {
                    println!("Usage: export <path> [DD/MM/YYYY] [--no-execution-date]");
                    continue;
                };
                let mut include_execution_date = true;
                let mut date_arg = None;
                for arg in parts.by_ref() {
                    if arg == NO_EXECUTION_DATE_FLAG {
                        include_execution_date = false;
                    } else {
                        date_arg = Some(arg);
                    }
                }
                let filter = match date_arg {
                    Some(raw) => match pipeline::parse_filter_date(raw) {
                        Ok(d) => Some(d),
                        Err(e) => {
                            println!("Error: {}", e);
                            continue;
                        }
                    },
                    None => session.filter.as_ref().map(|(d, _)| *d),
                };
                let format = ExportFormat::from_file_name(path);
                match pipeline::render_download(
                    table,
                    filter,
                    format,
                    include_execution_date,
                    &config,
                ) {
                    Ok(download) => match fs::write(path, &download.bytes) {
                        Ok(_) => println!(
                            "Exported {} to {} (download name {}).",
                            format.extension(),
                            path,
                            download.file_name
                        ),
                        Err(e) => println!("Error writing {}: {}", path, e),
                    },
                    Err(e) => println!("Error: {}", e),
                }
            }
            "aliases" => match parts.next() {
                Some("show") | None => print_aliases(&config.aliases),
                Some("load") => match parts.next() {
                    Some(path) => match fs::read_to_string(path) {
                        Ok(contents) => match serde_json::from_str::<ColumnAliases>(&contents) {
                            Ok(aliases) => {
                                config.aliases = aliases;
                                println!("Aliases loaded from {}.", path);
                                print_aliases(&config.aliases);
                            }
                            Err(e) => println!("Invalid aliases JSON: {}", e),
                        },
                        Err(e) => println!("Error reading {}: {}", path, e),
                    },
                    None => println!("Usage: aliases load <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match serde_json::to_string_pretty(&config.aliases) {
                        Ok(json) => match fs::write(path, json) {
                            Ok(_) => println!("Aliases saved to {}.", path),
                            Err(e) => println!("Error writing {}: {}", path, e),
                        },
                        Err(e) => println!("Error serializing aliases: {}", e),
                    },
                    None => println!("Usage: aliases save <json_path>"),
                },
                Some(other) => {
                    println!("Unknown aliases command '{}'.", other);
                    println!("Usage: aliases show|load <json_path>|save <json_path>");
                }
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
