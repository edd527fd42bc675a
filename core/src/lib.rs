//! riskwatch-core: supply-chain risk scoring, alerting and escalation.
//!
//! Layering, bottom up:
//!   1. `types`, `entity`, `org_config`, `config`, `clock`: plain data
//!   2. `scoring`, `recommendation`, `risk_score`, `alert`: pure logic
//!   3. `store`: the only module that talks to SQLite
//!   4. `dispatcher`, `workflow`, `escalation`: alert handling over the store
//!   5. `agent`, `scheduler`: periodic evaluation
//!
//! `engine::RiskEngine` wires the layers together.

pub mod agent;
pub mod alert;
pub mod audit;
pub mod clock;
pub mod config;
pub mod demo;
pub mod dispatcher;
pub mod engine;
pub mod entity;
pub mod error;
pub mod escalation;
pub mod notify;
pub mod org_config;
pub mod recommendation;
pub mod risk_score;
pub mod scheduler;
pub mod scoring;
pub mod store;
pub mod types;
pub mod workflow;
