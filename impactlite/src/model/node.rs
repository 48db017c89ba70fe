// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Typed node identity
//!
//! Every participant in the dependency graph is a (kind, id) pair. The
//! tagged [`NodeRef`] is the canonical identity used on hot paths; its
//! `KIND:id` string rendering is a serialization convenience used for cache
//! keys and result maps.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::{ImpactError, ImpactResult};

/// The closed set of entity kinds that can participate in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Regulation,
    Department,
    Budget,
    Service,
    Kpi,
}

impl EntityKind {
    /// All kinds, in severity-weight order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Regulation,
        EntityKind::Department,
        EntityKind::Budget,
        EntityKind::Service,
        EntityKind::Kpi,
    ];

    /// Canonical uppercase name used in `KIND:id` node keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Regulation => "REGULATION",
            EntityKind::Department => "DEPARTMENT",
            EntityKind::Budget => "BUDGET",
            EntityKind::Service => "SERVICE",
            EntityKind::Kpi => "KPI",
        }
    }

    /// Multiplier applied when impact lands on a node of this kind.
    ///
    /// The table is applied uniformly to whatever the target kind is,
    /// including the > 1.0 entry for regulations on the target side.
    pub fn severity_weight(&self) -> f64 {
        match self {
            EntityKind::Regulation => 1.2,
            EntityKind::Department => 1.0,
            EntityKind::Budget => 0.9,
            EntityKind::Service => 0.8,
            EntityKind::Kpi => 0.7,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ImpactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGULATION" => Ok(EntityKind::Regulation),
            "DEPARTMENT" => Ok(EntityKind::Department),
            "BUDGET" => Ok(EntityKind::Budget),
            "SERVICE" => Ok(EntityKind::Service),
            "KPI" => Ok(EntityKind::Kpi),
            other => Err(ImpactError::Invalid(format!(
                "unknown entity kind: {}",
                other
            ))),
        }
    }
}

/// Identity of a graph participant: an entity kind plus its id.
///
/// Serializes as the canonical `KIND:id` string so result maps keyed by
/// `NodeRef` render with readable keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub kind: EntityKind,
    pub id: String,
}

impl NodeRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn regulation(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Regulation, id)
    }

    pub fn department(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Department, id)
    }

    pub fn budget(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Budget, id)
    }

    pub fn service(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Service, id)
    }

    pub fn kpi(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Kpi, id)
    }

    /// Canonical `KIND:id` node key.
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.id)
    }

    /// Parse a `KIND:id` node key back into a typed reference.
    pub fn parse(key: &str) -> ImpactResult<Self> {
        let (kind, id) = key
            .split_once(':')
            .ok_or_else(|| ImpactError::Invalid(format!("malformed node key: {}", key)))?;
        if id.is_empty() {
            return Err(ImpactError::Invalid(format!("empty node id in key: {}", key)));
        }
        Ok(Self::new(kind.parse::<EntityKind>()?, id))
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

impl Serialize for NodeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for NodeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = NodeRef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a KIND:id node key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<NodeRef, E> {
                NodeRef::parse(v).map_err(|e| E::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}
