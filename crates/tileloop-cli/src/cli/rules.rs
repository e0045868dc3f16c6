//! Rules command implementation.

use anyhow::Result;
use clap::Args;
use tileloop::catalog::{self, Group};

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the rules command.
pub fn cmd_rules(args: &RulesArgs) -> Result<()> {
    if args.json {
        let entries: Vec<_> = catalog::entries().collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for group in [Group::RegularOneUniform, Group::SemiregularOneUniform, Group::TwoUniform] {
        println!("{}:", group.title());
        for entry in catalog::group(group) {
            if entry.notation.is_empty() || entry.name == entry.notation {
                println!("  {:<36} {}", entry.name, entry.rule);
            } else {
                println!("  {:<36} {}  [{}]", entry.name, entry.rule, entry.notation);
            }
        }
        println!();
    }
    println!("Pass a name or a rule string to `generate` or `level`; add --dual for the dual.");
    Ok(())
}
