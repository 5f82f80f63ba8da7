//! Edit command
//!
//! Console shell around the pure editor state machine. All mutations stay in
//! memory until the user confirms the apply step; the write is gated by the
//! concurrency token from the session's fetch. On conflict the staged edits
//! survive: the session rebases onto the fresh server state and the user can
//! review the new diff and retry.

use crate::config::Settings;
use colored::Colorize;
use geofence_core::client::DistributionApi;
use geofence_core::editor::{EditAction, EditorSession, RestrictionDiff, Transition};
use geofence_core::tables::CountryTable;
use geofence_core::{GeofenceError, RestrictionMode};
use std::io::Write;

pub async fn handle(distribution_id: &str, settings: &Settings) -> anyhow::Result<()> {
    let countries = crate::refdata::load_country_table(&settings.country_codes)?;
    let client = settings.cdn_client()?;

    let state = client.fetch(distribution_id).await?;
    super::print_summary(&state.summary);

    let mut token = state.token;
    let mut session = EditorSession::new(&countries, state.restriction);

    loop {
        println!();
        println!(
            "{}",
            super::describe_restriction(session.current(), &countries)
        );
        println!();
        println!("  1. Add country");
        println!("  2. Remove country");
        println!("  3. Change restriction mode");
        println!("  4. Clear all restrictions");
        println!("  5. Apply changes");
        println!("  6. Discard and exit");

        let Some(action) = read_action()? else {
            println!("{}", "invalid choice, enter 1-6".red());
            continue;
        };

        match session.apply(action) {
            Transition::Rejected(msg) => println!("{} {}", "rejected:".red(), msg),
            Transition::Noop(msg) => println!("{}", msg),
            Transition::Staged(msg) => println!("{}", msg),
            Transition::Exit => {
                println!("exiting without changes");
                return Ok(());
            }
            Transition::ConfirmApply(diff) => {
                if diff.is_empty() {
                    println!("no changes to apply");
                    continue;
                }
                print_diff(&diff, &countries);
                if !confirm("apply these changes to the distribution?")? {
                    println!("apply cancelled");
                    continue;
                }

                match client.update(distribution_id, session.current(), &token).await {
                    Ok(_) => {
                        session.mark_applied();
                        println!("{}", "changes applied".green());
                        return Ok(());
                    }
                    Err(e) if e.is_conflict() => {
                        println!(
                            "{} {}",
                            "conflict:".yellow(),
                            "the distribution changed since it was fetched"
                        );
                        let fresh = client.fetch(distribution_id).await?;
                        token = fresh.token;
                        session.rebase(fresh.restriction);
                        println!("fetched current server state; review the diff and retry apply");
                    }
                    Err(e @ GeofenceError::Validation(_)) => {
                        println!("{} {}", "rejected by server:".red(), e);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}

fn read_action() -> anyhow::Result<Option<EditAction>> {
    let choice = prompt("choice (1-6)")?;
    let action = match choice.as_str() {
        "1" => EditAction::Add(prompt("country code or name to add")?),
        "2" => EditAction::Remove(prompt("country code or name to remove")?),
        "3" => {
            let mode = prompt("mode (allow/deny/none)")?;
            match mode.to_lowercase().as_str() {
                "allow" | "allowlist" | "whitelist" => {
                    EditAction::SetMode(RestrictionMode::Allowlist)
                }
                "deny" | "denylist" | "blacklist" => EditAction::SetMode(RestrictionMode::Denylist),
                "none" => EditAction::SetMode(RestrictionMode::None),
                _ => return Ok(None),
            }
        }
        "4" => EditAction::ClearAll,
        "5" => EditAction::Apply,
        "6" => EditAction::Discard,
        _ => return Ok(None),
    };
    Ok(Some(action))
}

fn print_diff(diff: &RestrictionDiff, countries: &CountryTable) {
    println!("{}", "changes to apply:".bold());
    if let Some((from, to)) = diff.mode_change {
        println!("  mode: {} -> {}", from, to);
    }
    for code in &diff.added {
        println!("  {} {} ({})", "+".green(), countries.name_of(code), code);
    }
    for code in &diff.removed {
        println!("  {} {} ({})", "-".red(), countries.name_of(code), code);
    }
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    let answer = prompt(&format!("{} (yes/no)", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "yes" | "y"))
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
