use chrono::Utc;
use clap::Subcommand;
use std::time::Duration;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum GatherAction {
    /// Start gathering a material
    Start {
        /// Material id (see `materials`)
        material: String,
        /// Units to gather (defaults to gathering.default_quantity_goal)
        #[arg(long)]
        quantity: Option<u32>,
    },
    /// Credit elapsed time and print progress as JSON
    Status,
    /// Poll progress until the session completes
    Watch {
        /// Collect automatically once complete
        #[arg(long)]
        collect: bool,
        /// Poll interval override in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Collect a completed session into inventory and experience
    Collect,
    /// Abandon the current session
    Cancel,
}

pub fn run(action: GatherAction, character: Option<String>) -> CmdResult {
    let mut ctx = Context::open(character)?;
    let who = ctx.character.clone();

    match action {
        GatherAction::Start { material, quantity } => {
            let goal = quantity.unwrap_or(ctx.config.gathering.default_quantity_goal);
            let (_session, event) = ctx.service.start(&who, &material, goal, Utc::now())?;
            print_json(&event)?;
        }
        GatherAction::Status => {
            let status = ctx.service.status(&who, Utc::now())?;
            print_json(&status)?;
        }
        GatherAction::Watch {
            collect,
            interval_ms,
        } => {
            let interval = interval_ms
                .unwrap_or(ctx.config.gathering.poll_interval_ms)
                .max(1);
            loop {
                let status = ctx.service.status(&who, Utc::now())?;
                for event in &status.events {
                    print_json(event)?;
                }
                if status.progress.is_complete {
                    break;
                }
                std::thread::sleep(Duration::from_millis(interval));
            }
            if collect {
                let report = ctx.service.collect(&who, Utc::now())?;
                for event in &report.events {
                    print_json(event)?;
                }
            }
        }
        GatherAction::Collect => {
            let report = ctx.service.collect(&who, Utc::now())?;
            print_json(&report)?;
        }
        GatherAction::Cancel => {
            let event = ctx.service.cancel(&who, Utc::now())?;
            print_json(&event)?;
        }
    }
    Ok(())
}
