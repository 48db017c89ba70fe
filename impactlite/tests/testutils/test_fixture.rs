//! Shared fixture for integration tests: an in-memory store plus a
//! fast-sweeping cache, with builders for the entities tests seed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use impactlite::cache::CacheConfig;
use impactlite::model::{
    Budget, Department, ImpactEdge, ImpactType, Kpi, NodeRef, Regulation, RegulationStatus,
    Service, Severity, Tenant,
};
use impactlite::propagation::{PropagationEngine, PropagationOptions};
use impactlite::{ImpactCache, MemoryStore};

pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<ImpactCache>,
    edge_seq: std::sync::atomic::AtomicU64,
}

impl TestFixture {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = CacheConfig {
            default_ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(60),
            graph_ttl: Duration::from_secs(60),
        };
        Self {
            store: Arc::new(MemoryStore::new()),
            cache: Arc::new(ImpactCache::new(config).expect("valid cache config")),
            edge_seq: std::sync::atomic::AtomicU64::new(1),
        }
    }

    pub fn engine(&self, tenant_id: &str, options: PropagationOptions) -> PropagationEngine {
        PropagationEngine::new(
            tenant_id,
            self.store.clone() as Arc<dyn impactlite::EntityStore>,
            self.cache.clone(),
            options,
        )
        .expect("valid propagation options")
    }

    pub fn add_tenant(&self, id: &str) {
        self.store.insert_tenant(Tenant {
            id: id.to_string(),
            code: id.to_uppercase(),
            name: format!("Tenant {}", id),
        });
    }

    pub fn effective(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn add_regulation(&self, tenant_id: &str, id: &str, severity: Severity) {
        self.add_regulation_effective(tenant_id, id, severity, Self::effective(2020));
    }

    pub fn add_regulation_effective(
        &self,
        tenant_id: &str,
        id: &str,
        severity: Severity,
        effective_date: DateTime<Utc>,
    ) {
        self.store
            .insert_regulation(Regulation {
                id: id.to_string(),
                tenant_id: tenant_id.to_string(),
                code: id.to_uppercase(),
                name: format!("Regulation {}", id),
                severity,
                status: RegulationStatus::Active,
                effective_date,
                expiration_date: None,
                version: 1,
                active: true,
            })
            .expect("unique regulation");
    }

    pub fn add_department(&self, tenant_id: &str, id: &str) {
        self.store.insert_department(Department {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            code: id.to_uppercase(),
            name: format!("Department {}", id),
            parent: None,
            active: true,
        });
    }

    pub fn add_budget(&self, tenant_id: &str, id: &str) {
        self.store.insert_budget(Budget {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            code: id.to_uppercase(),
            name: format!("Budget {}", id),
            amount: 100_000.0,
            currency: "USD".to_string(),
            fiscal_year: 2025,
            active: true,
        });
    }

    pub fn add_service(&self, tenant_id: &str, id: &str) {
        self.store.insert_service(Service {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            code: id.to_uppercase(),
            name: format!("Service {}", id),
            service_type: "internal".to_string(),
            status: "operational".to_string(),
            active: true,
        });
    }

    pub fn add_kpi(&self, tenant_id: &str, id: &str) {
        self.store.insert_kpi(Kpi {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            code: id.to_uppercase(),
            name: format!("KPI {}", id),
            unit: "%".to_string(),
            target: 99.0,
            current: 97.5,
            frequency: "monthly".to_string(),
            active: true,
        });
    }

    pub fn add_edge(
        &self,
        tenant_id: &str,
        source: NodeRef,
        target: NodeRef,
        weight: f64,
        impact_type: ImpactType,
    ) -> String {
        self.add_edge_with_condition(tenant_id, source, target, weight, impact_type, None)
    }

    pub fn add_edge_with_condition(
        &self,
        tenant_id: &str,
        source: NodeRef,
        target: NodeRef,
        weight: f64,
        impact_type: ImpactType,
        condition: Option<Value>,
    ) -> String {
        let seq = self
            .edge_seq
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let id = format!("edge-{}", seq);
        self.store
            .insert_edge(ImpactEdge {
                id: id.clone(),
                tenant_id: tenant_id.to_string(),
                source,
                target,
                impact_weight: weight,
                impact_type,
                impact_category: None,
                condition,
                active: true,
            })
            .expect("valid unique edge");
        id
    }
}

/// Compare floats with a tolerance suited to the score arithmetic.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} to be close to {}",
        actual,
        expected
    );
}
