//! Command implementations behind the interactive prompt
//!
//! Each command prints its result directly; errors come back as strings
//! the REPL writes under the prompt.

use chrono::Utc;

use rampart_core::catalog::{Job, MitigationValue, TargetMode};
use rampart_core::{HealthSettings, TankPosition};

use crate::context::CliContext;

// ─── Plan & encounter ────────────────────────────────────────────────────────

pub async fn open_plan(ctx: &mut CliContext, plan_id: &str) -> Result<(), String> {
    ctx.switch_plan(plan_id).await?;
    println!(
        "opened plan '{}' as {}",
        ctx.session.plan_id(),
        ctx.session.session_id()
    );
    Ok(())
}

pub async fn list_encounters(ctx: &CliContext) {
    let doc = ctx.session.document().await;
    println!("{:<20} {:<28} {:<8} ACTIONS", "ID", "NAME", "LENGTH");
    println!("{}", "-".repeat(66));
    for timeline in ctx.session.encounters().iter() {
        let marker = if timeline.id == doc.boss_id { " *" } else { "" };
        println!(
            "{:<20} {:<28} {:<8} {}{}",
            timeline.id,
            timeline.name,
            format_time(timeline.duration_secs),
            timeline.len(),
            marker
        );
    }
}

pub async fn set_encounter(ctx: &CliContext, id: &str) -> Result<(), String> {
    ctx.session.set_encounter(id).await.map_err(fail)?;
    let timeline = ctx.session.timeline().await.map_err(fail)?;
    println!(
        "encounter set to {} ({} actions over {})",
        timeline.name,
        timeline.len(),
        format_time(timeline.duration_secs)
    );
    Ok(())
}

pub async fn show_timeline(ctx: &CliContext) -> Result<(), String> {
    let timeline = ctx.session.timeline().await.map_err(fail)?;
    let doc = ctx.session.document().await;

    println!(
        "{} ({}) - {} actions over {}",
        timeline.name,
        timeline.id,
        timeline.len(),
        format_time(timeline.duration_secs)
    );
    println!(
        "{:<7} {:<20} {:<24} {:<20} {:<12} {:>8} ASSIGNED",
        "TIME", "ID", "NAME", "DAMAGE", "TARGET", "RAW"
    );
    println!("{}", "-".repeat(104));

    for action in timeline.actions() {
        let target = if action.dual_buster {
            "both tanks"
        } else if action.tank_buster {
            "tank"
        } else {
            "party"
        };
        let raw = action
            .raw_damage
            .map_or_else(|| "-".to_string(), |raw| raw.to_string());
        let hits = if action.hit_count > 1 {
            format!(" x{}", action.hit_count)
        } else {
            String::new()
        };
        let assigned = doc.assignments.get(&action.id).map_or(0, Vec::len);
        println!(
            "{:<7} {:<20} {:<24} {:<20} {:<12} {:>8} {}",
            format_time(action.time_secs),
            action.id,
            action.name,
            format!("{}{}", action.damage.label(), hits),
            target,
            raw,
            assigned
        );
    }
    Ok(())
}

// ─── Party ───────────────────────────────────────────────────────────────────

pub async fn show_jobs(ctx: &CliContext) {
    let doc = ctx.session.document().await;
    if doc.selected_jobs.0.is_empty() {
        println!("no party selected; use 'jobs WAR GNB WHM SCH ...'");
        return;
    }

    println!("{:<6} {:<16} {:<10} CLAIMED BY", "JOB", "NAME", "POSITION");
    println!("{}", "-".repeat(48));
    for selection in &doc.selected_jobs.0 {
        let name = Job::from_abbrev(&selection.job).map_or("?", |job| job.label());
        let position = doc
            .tank_positions
            .position_of(&selection.job)
            .map_or("-", |position| position_label(Some(position)));
        println!(
            "{:<6} {:<16} {:<10} {}",
            selection.job,
            name,
            position,
            selection.claimed_by.as_deref().unwrap_or("-")
        );
    }
}

pub async fn set_jobs(ctx: &CliContext, jobs: &[Job]) -> Result<(), String> {
    ctx.session.set_jobs(jobs).await.map_err(fail)?;
    let list: Vec<&str> = jobs.iter().map(|job| job.abbrev()).collect();
    println!("party set: {}", list.join(" "));
    Ok(())
}

pub async fn claim(
    ctx: &CliContext,
    job: Job,
    user: Option<&str>,
    release: bool,
) -> Result<(), String> {
    if release {
        ctx.session.claim_job(job, None).await.map_err(fail)?;
        println!("{} released", job.abbrev());
        return Ok(());
    }

    let user = match user {
        Some(user) => user.to_string(),
        None if !ctx.config.display_name.is_empty() => ctx.config.display_name.clone(),
        None => {
            return Err("no display name configured; pass --user or run 'name <you>'".to_string());
        }
    };
    ctx.session.claim_job(job, Some(&user)).await.map_err(fail)?;
    println!("{} claimed by {user}", job.abbrev());
    Ok(())
}

pub async fn set_tanks(
    ctx: &CliContext,
    main: Option<Job>,
    off: Option<Job>,
) -> Result<(), String> {
    if main.is_none() && off.is_none() {
        let doc = ctx.session.document().await;
        println!("MT: {}", doc.tank_positions.main_tank.as_deref().unwrap_or("-"));
        println!("OT: {}", doc.tank_positions.off_tank.as_deref().unwrap_or("-"));
        return Ok(());
    }

    ctx.session.set_tanks(main, off).await.map_err(fail)?;
    println!(
        "MT: {}  OT: {}",
        main.map_or("-", |job| job.abbrev()),
        off.map_or("-", |job| job.abbrev())
    );
    Ok(())
}

pub async fn health(
    ctx: &CliContext,
    level: Option<u8>,
    party_hp: Option<u32>,
    tank_hp: Option<u32>,
    potency: Option<f32>,
) -> Result<(), String> {
    let current = ctx.session.health_settings().await;
    if level.is_none() && party_hp.is_none() && tank_hp.is_none() && potency.is_none() {
        println!(
            "level {} | party HP {} | tank HP {} | healing per 100 potency {:.0}",
            current.level, current.party_max_hp, current.tank_max_hp,
            current.healing_per_100_potency
        );
        return Ok(());
    }

    let settings = HealthSettings {
        level: level.unwrap_or(current.level),
        party_max_hp: party_hp.unwrap_or(current.party_max_hp),
        tank_max_hp: tank_hp.unwrap_or(current.tank_max_hp),
        healing_per_100_potency: potency.unwrap_or(current.healing_per_100_potency),
    };
    ctx.session.set_health(settings).await.map_err(fail)?;
    println!(
        "level {} | party HP {} | tank HP {} | healing per 100 potency {:.0}",
        settings.level, settings.party_max_hp, settings.tank_max_hp,
        settings.healing_per_100_potency
    );
    Ok(())
}

// ─── Assignments ─────────────────────────────────────────────────────────────

pub async fn check(ctx: &CliContext, action: &str, ability: &str) -> Result<(), String> {
    let result = ctx
        .session
        .check_availability(ability, action)
        .await
        .map_err(fail)?;

    match &result.reason {
        Some(reason) => println!("unavailable: {reason}"),
        None => println!("available"),
    }
    println!("charges: {}/{}", result.charges_available, result.charges_total);
    if let Some((free, total)) = result.instances {
        println!("caster slots: {free}/{total}");
    }
    if let Some(stacks) = result.stacks_available {
        println!("pool stacks: {stacks}");
    }
    Ok(())
}

pub async fn assign(
    ctx: &CliContext,
    action: &str,
    ability: &str,
    position: Option<&str>,
    job: Option<Job>,
) -> Result<(), String> {
    let position = position.map(parse_position).transpose()?;
    let row = ctx
        .session
        .add_mitigation(action, ability, position, job)
        .await
        .map_err(fail)?;

    let name = ctx
        .session
        .catalog()
        .get(&row.ability_id)
        .map_or_else(|| row.ability_id.clone(), |a| a.name.clone());
    let caster = match (&row.caster_job, &row.caster) {
        (Some(job), Some(user)) => format!(" cast by {job} ({user})"),
        (Some(job), None) => format!(" cast by {job}"),
        _ => String::new(),
    };
    println!(
        "{name} -> {action} [{}]{caster}",
        position_label(row.position)
    );
    Ok(())
}

pub async fn unassign(
    ctx: &CliContext,
    action: &str,
    ability: &str,
    position: Option<&str>,
) -> Result<(), String> {
    let position = position.map(parse_position).transpose()?;
    ctx.session
        .remove_mitigation(action, ability, position)
        .await
        .map_err(fail)?;
    println!("{ability} removed from {action}");
    Ok(())
}

pub async fn precast(
    ctx: &CliContext,
    action: &str,
    ability: &str,
    secs: f32,
    position: Option<&str>,
) -> Result<(), String> {
    let position = position.map(parse_position).transpose()?;
    let stored = ctx
        .session
        .update_precast(action, ability, position, secs)
        .await
        .map_err(fail)?;
    println!("{ability} on {action} now cast {stored:.1}s early");
    Ok(())
}

pub async fn show_mitigations(
    ctx: &CliContext,
    action: &str,
    tank: Option<&str>,
) -> Result<(), String> {
    let filter = tank.map(parse_position).transpose()?;
    let summary = ctx
        .session
        .mitigation_summary(action, filter)
        .await
        .map_err(fail)?;

    let buster = if summary.targets_tanks {
        ", tank buster"
    } else {
        ""
    };
    println!(
        "{} ({}) at {} - {} damage{buster}",
        summary.action_name,
        summary.action_id,
        format_time(summary.time_secs),
        summary.damage_type.label()
    );

    if summary.active.is_empty() {
        println!("nothing assigned or inherited");
    } else {
        println!();
        println!(
            "{:<22} {:<20} {:<7} {:<6} {:<10} {:<13} LEFT",
            "ABILITY", "SOURCE", "CASTER", "POS", "MIT", "WINDOW"
        );
        println!("{}", "-".repeat(92));
        for effect in &summary.active {
            let window = format!(
                "{}-{}",
                format_time(effect.effective_start),
                format_time(effect.effective_end)
            );
            println!(
                "{:<22} {:<20} {:<7} {:<6} {:<10} {:<13} {:.1}s",
                effect.ability_name,
                effect.source_action,
                effect.caster_job.map_or("-", |job| job.abbrev()),
                position_label(effect.position),
                format_mitigation(effect.mitigation),
                window,
                effect.remaining_secs
            );
        }
    }

    println!();
    println!(
        "physical reduction: {:.1}%",
        summary.physical_reduction * 100.0
    );
    println!(
        "magical reduction:  {:.1}%",
        summary.magical_reduction * 100.0
    );
    if summary.barrier_total > 0.0 {
        println!("barrier:            {:.0} HP", summary.barrier_total);
    }
    if summary.healing_total > 0.0 {
        println!("healing:            {:.0} HP", summary.healing_total);
    }
    if let Some(residual) = summary.residual_damage {
        println!("expected hit:       {residual:.0}");
    }
    Ok(())
}

pub async fn list_abilities(ctx: &CliContext, job: Option<Job>) {
    let level = ctx.session.health_settings().await.level;
    let catalog = ctx.session.catalog();

    println!(
        "{:<18} {:<22} {:<18} {:>5} {:>5} {:<9} {:<7} NOTES",
        "ID", "NAME", "JOBS", "CD", "DUR", "MIT", "TARGET"
    );
    println!("{}", "-".repeat(100));

    for ability in catalog.iter() {
        if let Some(job) = job {
            if !ability.can_cast(job) {
                continue;
            }
        }
        let jobs: Vec<&str> = ability.jobs.iter().map(|job| job.abbrev()).collect();
        let mut notes = Vec::new();
        if ability.charges_at(level) > 1 {
            notes.push(format!("{} charges", ability.charges_at(level)));
        }
        if ability.role_shared {
            notes.push("role-shared".to_string());
        }
        if ability.consumes_stacks {
            notes.push("spends stack".to_string());
        }
        if ability.restores_stacks {
            notes.push("refills stacks".to_string());
        }
        if ability.barrier.is_some() {
            notes.push("barrier".to_string());
        }
        if ability.healing.is_some() {
            notes.push("heal".to_string());
        }
        if ability.potency_bonus.is_some() {
            notes.push("+heal potency".to_string());
        }
        if !ability.castable_at(level) {
            notes.push(format!("needs lvl {}", ability.level));
        }
        println!(
            "{:<18} {:<22} {:<18} {:>5.0} {:>5.1} {:<9} {:<7} {}",
            ability.id,
            ability.name,
            jobs.join("/"),
            ability.cooldown_at(level),
            ability.duration_at(level),
            format_mitigation(ability.mitigation_at(level)),
            target_label(ability.target),
            notes.join(", ")
        );
    }
}

// ─── Presence & status ───────────────────────────────────────────────────────

pub async fn view(ctx: &CliContext, action: Option<&str>) -> Result<(), String> {
    if let Some(action) = action {
        let timeline = ctx.session.timeline().await.map_err(fail)?;
        if timeline.action(action).is_none() {
            return Err(format!("error: unknown boss action '{action}'"));
        }
    }
    ctx.session.update_presence(action).await.map_err(fail)?;
    match action {
        Some(action) => println!("now looking at {action}"),
        None => println!("view cleared"),
    }
    Ok(())
}

pub async fn show_status(ctx: &CliContext) {
    let status = ctx.session.status().await;

    println!("plan:    {}", status.plan_id);
    println!("session: {}", status.session_id);
    println!(
        "boss:    {}",
        if status.boss_id.is_empty() {
            "-"
        } else {
            &status.boss_id
        }
    );
    println!(
        "sync:    {}",
        if status.blocked {
            "BLOCKED (read-only)"
        } else {
            "connected"
        }
    );

    println!();
    println!("{:<16} STATE", "FIELD");
    for (field, state) in &status.fields {
        println!("{:<16} {}", field.key(), state.label());
    }

    if !status.viewers.is_empty() {
        println!();
        println!("viewers:");
        let now = Utc::now().timestamp_millis();
        for viewer in &status.viewers {
            let age_secs = (now - viewer.updated_at).max(0) / 1000;
            println!(
                "  {:<24} looking at {:<20} ({age_secs}s ago)",
                viewer.session,
                viewer.selected_action.as_deref().unwrap_or("-")
            );
        }
    }
}

// ─── Configuration ───────────────────────────────────────────────────────────

pub fn show_config(ctx: &CliContext) {
    println!("display name:        {}", none_if_empty(&ctx.config.display_name));
    println!("default plan:        {}", ctx.config.default_plan);
    println!("plan directory:      {}", ctx.config.plan_dir().display());
    println!(
        "catalog directory:   {}",
        ctx.config
            .catalog_directory
            .as_deref()
            .unwrap_or("(bundled only)")
    );
    println!(
        "encounter directory: {}",
        ctx.config
            .encounter_directory
            .as_deref()
            .unwrap_or("(bundled only)")
    );
    println!(
        "loaded:              {} abilities, {} encounters",
        ctx.libraries.catalog.len(),
        ctx.libraries.encounters.len()
    );
}

pub fn set_name(ctx: &mut CliContext, name: &str) -> Result<(), String> {
    ctx.config.display_name = name.to_string();
    ctx.config.save().map_err(fail)?;
    println!("display name set to '{name}' (used for new claims; session ids pick it up on reconnect)");
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn fail(e: impl std::fmt::Display) -> String {
    format!("error: {e}")
}

fn none_if_empty(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}

pub fn parse_position(value: &str) -> Result<TankPosition, String> {
    match value.to_ascii_lowercase().as_str() {
        "mt" | "main" => Ok(TankPosition::MainTank),
        "ot" | "off" => Ok(TankPosition::OffTank),
        "shared" | "both" => Ok(TankPosition::Shared),
        other => Err(format!(
            "error: unknown tank position '{other}' (use mt, ot, or shared)"
        )),
    }
}

fn position_label(position: Option<TankPosition>) -> &'static str {
    match position {
        Some(TankPosition::MainTank) => "MT",
        Some(TankPosition::OffTank) => "OT",
        Some(TankPosition::Shared) => "both",
        None => "party",
    }
}

fn target_label(target: TargetMode) -> &'static str {
    match target {
        TargetMode::SelfTarget => "self",
        TargetMode::Single => "single",
        TargetMode::Party => "party",
        TargetMode::Area => "area",
    }
}

fn format_mitigation(value: Option<MitigationValue>) -> String {
    match value {
        Some(MitigationValue::Uniform(value)) => format!("{:.0}%", value * 100.0),
        Some(MitigationValue::Split { physical, magical }) => format!(
            "{:.0}%p/{:.0}%m",
            physical * 100.0,
            magical * 100.0
        ),
        None => "-".to_string(),
    }
}

fn format_time(secs: f32) -> String {
    let total = secs.max(0.0) as u32;
    format!("{}:{:02}", total / 60, total % 60)
}
