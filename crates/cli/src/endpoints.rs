use crate::input::load_index;
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Handler")]
    handler: String,
    #[tabled(rename = "Location")]
    location: String,
}

pub fn run(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let index = load_index(input)?;
    let endpoints = chainscope_java::discover(&index);

    if endpoints.is_empty() {
        println!("No endpoints found.");
        return Ok(());
    }

    let rows: Vec<EndpointRow> = endpoints
        .into_iter()
        .map(|e| {
            let file = e.file.file_name().and_then(|n| n.to_str()).unwrap_or("-");
            EndpointRow {
                method: e.http_method.to_string(),
                path: e.path,
                handler: e.handler.to_string(),
                location: format!("{}:{}", file, e.line),
            }
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::psql()).to_string());
    Ok(())
}
