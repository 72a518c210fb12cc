//! Army command - validate and print army definitions

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::load_armies;

#[derive(Args)]
pub struct ArmyArgs {
    /// Directory of army JSON files (default: built-in armies)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Print the normalized armies as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run army command
pub fn run(args: ArmyArgs) -> Result<()> {
    let book = load_armies(args.dir.as_deref())?;
    let armies: Vec<_> = book.ids().into_iter().filter_map(|id| book.get(id)).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&armies)?);
        return Ok(());
    }

    for army in armies {
        println!("{} ({}): {} tokens", army.id, army.name, army.token_count());
        for entry in &army.entries {
            let token = &entry.token;
            let mut tags = Vec::new();
            if token.hq {
                tags.push("hq");
            }
            if token.instant {
                tags.push("instant");
            }
            if token.foundation {
                tags.push("foundation");
            }
            println!(
                "  {:>2}x {:<20} hp {:<2} init {:?} {}",
                entry.count,
                token.id,
                token.health,
                token.initiative,
                tags.join(" ")
            );
        }
    }
    Ok(())
}
