//! Links command - parse a Link header value.

use colored::Colorize;
use csvlint::parse_link_header;

pub fn run(header: String, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let links = parse_link_header(&header)?;

    if links.is_empty() {
        println!("{}", "No links".yellow());
        return Ok(());
    }

    for link in &links {
        println!("{}", link.uri.white().bold());
        if !link.rel.is_empty() {
            println!("  rel:  {}", link.rel.join(" ").cyan());
        }
        if let Some(media_type) = link.media_type() {
            println!("  type: {}", media_type);
        }
        if verbose {
            for (name, value) in &link.params {
                println!("  {}={:?}", name, value);
            }
        }
    }

    Ok(())
}
