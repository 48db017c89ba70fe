// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Recalculation and simulation event fan-out
//!
//! Events are handed to a detached worker over an unbounded channel and
//! fanned out to in-process subscribers from there, so propagation never
//! blocks on delivery. Publication is best-effort throughout: a closed
//! channel or an absent subscriber is logged and swallowed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use crate::model::NodeRef;

/// Event payloads, discriminated by the wire names observers key on.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskEventKind {
    RecalculationStart {
        regulation_count: usize,
    },
    RecalculationProgress {
        regulation_id: String,
        fraction: f64,
    },
    RecalculationComplete {
        affected: Vec<NodeRef>,
    },
    RecalculationError {
        message: String,
    },
    ImpactUpdate {
        regulation_id: String,
        affected: usize,
    },
    RiskUpdate {
        entities: usize,
    },
    SimulationStart {
        simulation_id: String,
        regulation_id: String,
    },
    SimulationProgress {
        simulation_id: String,
        fraction: f64,
    },
    SimulationComplete {
        simulation_id: String,
        deltas: usize,
    },
    SimulationError {
        simulation_id: String,
        message: String,
    },
}

/// One published event: tenant scope, timestamp, payload.
#[derive(Debug, Clone, Serialize)]
pub struct RiskEvent {
    pub tenant_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: RiskEventKind,
}

impl RiskEvent {
    pub fn new(tenant_id: impl Into<String>, kind: RiskEventKind) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            timestamp: Utc::now(),
            kind,
        }
    }
}

/// Best-effort event fan-out, decoupled from the publishing path.
///
/// Must be created within a Tokio runtime; the worker task exits when the
/// hub is dropped and the channel closes.
pub struct ObserverHub {
    tx: mpsc::UnboundedSender<RiskEvent>,
    fanout: broadcast::Sender<RiskEvent>,
}

impl ObserverHub {
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<RiskEvent>();
        let (fanout, _) = broadcast::channel(256);
        let worker_fanout: broadcast::Sender<RiskEvent> = fanout.clone();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                // send only fails with zero subscribers; that is fine
                let _ = worker_fanout.send(event);
            }
            log::debug!("observer fan-out worker stopped");
        });

        Self { tx, fanout }
    }

    /// Queue an event for delivery. Never blocks, never fails the caller.
    pub fn publish(&self, tenant_id: &str, kind: RiskEventKind) {
        let event = RiskEvent::new(tenant_id, kind);
        if let Err(e) = self.tx.send(event) {
            log::warn!("dropping risk event for tenant {}: {}", tenant_id, e);
        }
    }

    /// Subscribe to the fan-out stream. Receivers see events for every
    /// tenant and filter on [`RiskEvent::tenant_id`].
    pub fn subscribe(&self) -> broadcast::Receiver<RiskEvent> {
        self.fanout.subscribe()
    }
}

impl Default for ObserverHub {
    fn default() -> Self {
        Self::new()
    }
}
