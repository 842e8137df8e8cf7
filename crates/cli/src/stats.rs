use crate::input::load_index;
use std::path::Path;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct DiagnosticRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Message")]
    message: String,
}

pub fn run(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let index = load_index(input)?;
    let stats = index.stats();

    println!("Files:       {}", stats.files);
    println!("Types:       {}", stats.types);
    println!("  classes    {}", stats.classes);
    println!("  interfaces {}", stats.interfaces);
    println!("  enums      {}", stats.enums);
    println!("Methods:     {}", stats.methods);
    println!("Calls:       {}", stats.calls);
    println!("Hierarchy:   {} edges", stats.hierarchy_edges);
    println!("Diagnostics: {}", stats.diagnostics);

    if !index.diagnostics().is_empty() {
        let rows: Vec<DiagnosticRow> = index
            .diagnostics()
            .iter()
            .map(|d| DiagnosticRow {
                kind: format!("{:?}", d.kind),
                path: d.path.display().to_string(),
                message: d.message.clone(),
            })
            .collect();
        println!("\n{}", Table::new(rows));
    }
    Ok(())
}
