//! `ctrlboard filters` - values the dashboard filters offer.

use serde_json::json;

use ctrlboard_recon::{FilterIndex, Selection};

use crate::workspace::Workspace;
use crate::{print_json, CliError};

pub fn cmd_filters(
    ws: &Workspace,
    org: Option<&str>,
    sector: Option<&str>,
    json_output: bool,
) -> Result<(), CliError> {
    let snapshot = ws.snapshot()?;
    let index = FilterIndex::build(&snapshot.plan, ws.columns());

    // A narrowed listing: just the years one organization or sector offers.
    let selection = match (org, sector) {
        (Some(o), _) => Some(Selection::organization(o, 0)),
        (None, Some(s)) => Some(Selection::sector("", s, 0)),
        (None, None) => None,
    };

    if let Some(selection) = selection {
        let years = index.available_years(&selection);
        if json_output {
            print_json(&json!({
                "organization": org,
                "sector": sector,
                "years": years,
            }))?;
        } else if years.is_empty() {
            eprintln!("no years found");
        } else {
            let list: Vec<String> = years.iter().map(i64::to_string).collect();
            println!("{}", list.join("\n"));
        }
        return Ok(());
    }

    if json_output {
        print_json(&index)?;
    } else {
        print_index(&index);
    }
    Ok(())
}

fn print_index(index: &FilterIndex) {
    println!("sectors:");
    for sector in &index.sectors {
        println!("  {sector} {:?}", index.years_by_sector.get(sector).map(Vec::as_slice).unwrap_or(&[]));
    }
    println!("organizations:");
    for org in &index.organizations {
        println!(
            "  {org} {:?}",
            index.years_by_organization.get(org).map(Vec::as_slice).unwrap_or(&[])
        );
    }
}
