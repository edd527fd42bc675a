//! Periodic agent scheduling with per-agent single-flight.
//!
//! Each enabled agent gets its own ticker; the first run happens one full
//! interval after `start()`. Manual triggers go through the same lock as
//! ticks, so a trigger racing a tick never runs the agent twice. A run that
//! finds its agent busy is skipped, not queued. A failed run is retried up to
//! the agent's `max_retries` while still holding the lock.
//!
//! Locks held past the agent's `lock_timeout` are reported as stale but
//! never broken: the holder is still running and will release on completion.

use crate::{
    agent::{Agent, AgentName, AgentRunSummary},
    engine::RiskEngine,
    error::{RiskError, RiskResult},
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Another run of the same agent held the lock.
    Skipped,
    Completed(AgentRunSummary),
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerReceipt {
    pub triggered: bool,
    pub timestamp: DateTime<Utc>,
}

type RunningMap = Arc<Mutex<HashMap<AgentName, DateTime<Utc>>>>;

/// Removes its agent from the running map when dropped, whatever the outcome.
struct RunGuard {
    running: RunningMap,
    agent: AgentName,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.lock().remove(&self.agent);
    }
}

#[derive(Clone)]
pub struct AgentScheduler {
    engine: RiskEngine,
    agents: Arc<BTreeMap<AgentName, Arc<dyn Agent>>>,
    running: RunningMap,
}

impl AgentScheduler {
    /// Schedule the engine's standard roster.
    pub fn new(engine: RiskEngine) -> Self {
        let agents = engine.agents();
        Self::with_agents(engine, agents)
    }

    pub fn with_agents(engine: RiskEngine, agents: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            engine,
            agents: Arc::new(agents.into_iter().map(|a| (a.name(), a)).collect()),
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn is_running(&self, agent: AgentName) -> bool {
        self.running.lock().contains_key(&agent)
    }

    /// Agents currently holding their lock, with the time each run started.
    pub fn running_agents(&self) -> Vec<(AgentName, DateTime<Utc>)> {
        let mut running: Vec<_> = self.running.lock().iter().map(|(a, t)| (*a, *t)).collect();
        running.sort();
        running
    }

    fn try_lock(&self, agent: AgentName) -> Option<RunGuard> {
        let now = self.engine.now();
        let mut running = self.running.lock();
        if let Some(started) = running.get(&agent) {
            let held = now - *started;
            if held > self.engine.config.agent(agent).lock_timeout() {
                log::warn!(
                    "agent={agent} lock held for {}s, past its timeout; skipping",
                    held.num_seconds()
                );
            } else {
                log::warn!("agent={agent} already running; skipping");
            }
            return None;
        }
        running.insert(agent, now);
        Some(RunGuard { running: self.running.clone(), agent })
    }

    /// Run `agent` once across all organizations unless it is already running.
    pub async fn run_agent(&self, agent: AgentName) -> RunOutcome {
        let Some(runner) = self.agents.get(&agent).cloned() else {
            return RunOutcome::Failed(format!("agent {agent} is not registered"));
        };
        let Some(guard) = self.try_lock(agent) else {
            return RunOutcome::Skipped;
        };
        self.run_locked(agent, runner, guard).await
    }

    /// The lock is already held; `_guard` releases it when the run ends.
    async fn run_locked(&self, agent: AgentName, runner: Arc<dyn Agent>, _guard: RunGuard) -> RunOutcome {
        log::info!("agent={agent} run started");
        let started = std::time::Instant::now();
        let max_retries = self.engine.config.agent(agent).max_retries;
        let engine = self.engine.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let mut attempt = 0;
            let summary = loop {
                match runner.run(None) {
                    Ok(summary) => break summary,
                    Err(e) if attempt < max_retries => {
                        attempt += 1;
                        log::warn!("agent={agent} attempt {attempt}/{max_retries} failed, retrying: {e}");
                    }
                    Err(e) => return Err(e),
                }
            };
            if let Err(e) = engine.store.record_agent_run(agent.run_key(), engine.now()) {
                log::warn!("agent={agent} could not record last run: {e}");
            }
            Ok::<_, RiskError>(summary)
        })
        .await
        .map_err(|e| RiskError::Scheduler(format!("agent {agent} task failed: {e}")));

        match joined {
            Ok(Ok(summary)) => {
                log::info!("agent={agent} run finished in {}ms", started.elapsed().as_millis());
                RunOutcome::Completed(summary)
            }
            Ok(Err(e)) | Err(e) => {
                log::error!(
                    "agent={agent} run failed after {}ms: {e}",
                    started.elapsed().as_millis()
                );
                RunOutcome::Failed(e.to_string())
            }
        }
    }

    /// Take the agent's lock and start a run in the background.
    /// `triggered` is false when a run already holds the lock.
    pub async fn trigger(&self, name: &str) -> RiskResult<TriggerReceipt> {
        let (agent, runner) = AgentName::parse(name)
            .and_then(|a| self.agents.get(&a).map(|r| (a, r.clone())))
            .ok_or_else(|| RiskError::validation(format!("unknown agent '{name}'")))?;

        let timestamp = self.engine.now();
        let Some(guard) = self.try_lock(agent) else {
            return Ok(TriggerReceipt { triggered: false, timestamp });
        };

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_locked(agent, runner, guard).await;
        });
        log::info!("agent={agent} triggered manually");
        Ok(TriggerReceipt { triggered: true, timestamp })
    }

    /// Spawn one ticker per enabled agent.
    pub fn start(&self) -> SchedulerHandle {
        let (shutdown, rx) = watch::channel(false);
        let mut tasks = Vec::new();

        for agent in self.agents.keys().copied() {
            let config = self.engine.config.agent(agent);
            if !config.enabled {
                log::info!("agent={agent} disabled; not scheduled");
                continue;
            }
            let period = config.interval();
            let scheduler = self.clone();
            let mut rx = rx.clone();

            tasks.push(tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            scheduler.run_agent(agent).await;
                        }
                        _ = rx.changed() => break,
                    }
                }
                log::debug!("agent={agent} ticker stopped");
            }));
            log::info!("agent={agent} scheduled every {} min", config.interval_minutes);
        }

        SchedulerHandle { shutdown, tasks }
    }
}

pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop the tickers. A run already in progress finishes first.
    pub async fn shutdown(self) -> RiskResult<()> {
        // Receivers only go away when their task has already exited.
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            task.await
                .map_err(|e| RiskError::Scheduler(format!("ticker task failed: {e}")))?;
        }
        Ok(())
    }
}
