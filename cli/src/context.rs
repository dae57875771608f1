//! Shared state for the interactive planner

use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use rampart_core::context::{AppConfig, Libraries};
use rampart_core::session::PlanSession;
use rampart_core::sync::{FileStore, SyncNotice};

/// Session type the CLI drives: plans persisted as TOML files
pub type CliSession = PlanSession<FileStore>;

pub struct CliContext {
    pub config: AppConfig,
    pub libraries: Libraries,
    pub session: CliSession,
    notice_task: JoinHandle<()>,
}

impl CliContext {
    /// Load config and game data, then connect to the named plan (or the
    /// configured default).
    pub async fn open(plan: Option<String>) -> Result<Self, String> {
        let config = AppConfig::load();
        let libraries = Libraries::load(&config).map_err(|e| e.to_string())?;
        let plan_id = plan.unwrap_or_else(|| config.default_plan.clone());
        let (session, notice_task) = connect(&config, &libraries, &plan_id).await?;

        Ok(Self {
            config,
            libraries,
            session,
            notice_task,
        })
    }

    /// Flush and close the current session, then connect to another plan.
    pub async fn switch_plan(&mut self, plan_id: &str) -> Result<(), String> {
        self.close().await;
        let (session, notice_task) = connect(&self.config, &self.libraries, plan_id).await?;
        self.session = session;
        self.notice_task = notice_task;
        Ok(())
    }

    /// Persist pending edits and tear the session down.
    pub async fn close(&mut self) {
        if let Err(e) = self.session.flush().await {
            println!("warning: failed to persist pending edits: {e}");
        }
        self.session.shutdown().await;
        self.notice_task.abort();
    }
}

async fn connect(
    config: &AppConfig,
    libraries: &Libraries,
    plan_id: &str,
) -> Result<(CliSession, JoinHandle<()>), String> {
    let store = FileStore::open(config.plan_dir()).map_err(|e| e.to_string())?;
    let (session, mut notices) = PlanSession::open(
        Arc::new(store),
        plan_id,
        session_id(config),
        Arc::clone(&libraries.catalog),
        Arc::clone(&libraries.encounters),
    )
    .await
    .map_err(|e| e.to_string())?;

    // Sync problems surface behind the prompt as they happen.
    let notice_task = tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            match notice {
                SyncNotice::RolledBack { field } => {
                    println!();
                    println!(
                        "[sync] persist failed; '{}' reverted to its last saved value",
                        field.key()
                    );
                }
                SyncNotice::SubscriptionLost => {
                    println!();
                    println!("[sync] store subscription lost; plan is now read-only");
                }
            }
        }
    });

    Ok((session, notice_task))
}

/// Readable on other planners' screens, unique across reconnects.
fn session_id(config: &AppConfig) -> String {
    let tag = Uuid::new_v4().simple().to_string();
    let name = if config.display_name.is_empty() {
        "planner"
    } else {
        config.display_name.as_str()
    };
    format!("{name}-{}", &tag[..8])
}
