//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Print structured data in the selected format; table mode renders rows
    /// with `tabled`
    pub fn print_rows<T: Serialize + Tabled>(&self, rows: &[T]) {
        match self {
            OutputFormat::Table => {
                if rows.is_empty() {
                    println!("(none)");
                } else {
                    println!("{}", tabled::Table::new(rows));
                }
            }
            _ => self.print(&rows),
        }
    }

    pub fn print<T: Serialize>(&self, data: &T) {
        match self {
            OutputFormat::Json | OutputFormat::Table => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(data).unwrap_or_default());
            }
        }
    }
}
