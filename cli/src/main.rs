use clap::{Parser, Subcommand};
use std::io::Write;

use rampart_cli::{commands, logging, readline, CliContext};
use rampart_core::Job;

#[derive(Parser)]
#[command(name = "rampart", about = "Collaborative raid mitigation planner")]
struct LaunchArgs {
    /// Plan to open (defaults to the configured plan)
    plan: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();
    let launch = LaunchArgs::parse();

    let mut ctx = CliContext::open(launch.plan).await?;
    println!(
        "plan '{}' open as {}; 'help' lists commands",
        ctx.session.plan_id(),
        ctx.session.session_id()
    );

    loop {
        let Some(line) = readline()? else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &mut ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    println!("quitting...");
    ctx.close().await;
    Ok(())
}

#[derive(Parser)]
#[command(name = "rampart", about = "plan commands", disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Switch to another plan
    Open { plan: String },
    /// List encounters, or pick one for this plan
    Encounter { id: Option<String> },
    /// Show the boss timeline with assignment counts
    Timeline,
    /// Show the party, or replace it (e.g. jobs WAR GNB WHM SCH)
    Jobs { jobs: Vec<Job> },
    /// Claim a job for a user, or release it
    Claim {
        job: Job,
        #[arg(short, long)]
        user: Option<String>,
        #[arg(short, long)]
        release: bool,
    },
    /// Show or set the tank slots (tanks [MAIN] [OFF])
    Tanks { main: Option<Job>, off: Option<Job> },
    /// Show or adjust level and health pools
    Health {
        #[arg(long)]
        level: Option<u8>,
        #[arg(long)]
        party_hp: Option<u32>,
        #[arg(long)]
        tank_hp: Option<u32>,
        #[arg(long)]
        potency: Option<f32>,
    },
    /// Whether an ability has a free use at an action
    Check { action: String, ability: String },
    /// Assign an ability to a boss action
    Assign {
        action: String,
        ability: String,
        #[arg(short, long)]
        position: Option<String>,
        #[arg(short, long)]
        job: Option<Job>,
    },
    /// Remove an assignment
    Unassign {
        action: String,
        ability: String,
        #[arg(short, long)]
        position: Option<String>,
    },
    /// Cast an assignment early (seconds before the action)
    Precast {
        action: String,
        ability: String,
        secs: f32,
        #[arg(short, long)]
        position: Option<String>,
    },
    /// Coverage and damage rollup for one action
    Mits {
        action: String,
        #[arg(short, long)]
        tank: Option<String>,
    },
    /// List abilities, optionally for one job
    Abilities { job: Option<Job> },
    /// Mark the action you are looking at, shown to other planners
    View { action: Option<String> },
    /// Connection and persistence state
    Status,
    /// Show the stored configuration
    Config,
    /// Set the display name used for claims
    Name { name: String },
    /// Flush pending edits and quit
    #[command(alias = "quit")]
    Exit,
}

async fn respond(line: &str, ctx: &mut CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: invalid quoting")?;
    args.insert(0, "rampart".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::Open { plan }) => commands::open_plan(ctx, &plan).await?,
        Some(Commands::Encounter { id }) => match id {
            Some(id) => commands::set_encounter(ctx, &id).await?,
            None => commands::list_encounters(ctx).await,
        },
        Some(Commands::Timeline) => commands::show_timeline(ctx).await?,
        Some(Commands::Jobs { jobs }) => {
            if jobs.is_empty() {
                commands::show_jobs(ctx).await;
            } else {
                commands::set_jobs(ctx, &jobs).await?;
            }
        }
        Some(Commands::Claim { job, user, release }) => {
            commands::claim(ctx, job, user.as_deref(), release).await?;
        }
        Some(Commands::Tanks { main, off }) => commands::set_tanks(ctx, main, off).await?,
        Some(Commands::Health {
            level,
            party_hp,
            tank_hp,
            potency,
        }) => commands::health(ctx, level, party_hp, tank_hp, potency).await?,
        Some(Commands::Check { action, ability }) => {
            commands::check(ctx, &action, &ability).await?;
        }
        Some(Commands::Assign {
            action,
            ability,
            position,
            job,
        }) => commands::assign(ctx, &action, &ability, position.as_deref(), job).await?,
        Some(Commands::Unassign {
            action,
            ability,
            position,
        }) => commands::unassign(ctx, &action, &ability, position.as_deref()).await?,
        Some(Commands::Precast {
            action,
            ability,
            secs,
            position,
        }) => commands::precast(ctx, &action, &ability, secs, position.as_deref()).await?,
        Some(Commands::Mits { action, tank }) => {
            commands::show_mitigations(ctx, &action, tank.as_deref()).await?;
        }
        Some(Commands::Abilities { job }) => commands::list_abilities(ctx, job).await,
        Some(Commands::View { action }) => commands::view(ctx, action.as_deref()).await?,
        Some(Commands::Status) => commands::show_status(ctx).await,
        Some(Commands::Config) => commands::show_config(ctx),
        Some(Commands::Name { name }) => commands::set_name(ctx, &name)?,
        Some(Commands::Exit) => return Ok(true),
        None => {}
    }
    Ok(false)
}
