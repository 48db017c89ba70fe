#[path = "testutils/mod.rs"]
mod testutils;

use std::sync::Arc;
use std::time::Duration;

use testutils::test_fixture::TestFixture;

use impactlite::graph::GraphBuilder;
use impactlite::model::{EntityKind, ImpactEdge, ImpactType, NodeRef, Severity};
use impactlite::observer::{ObserverHub, RiskEventKind};
use impactlite::propagation::CancelToken;
use impactlite::{EntityStore, ImpactCoordinator, ImpactError};

fn coordinator(fixture: &TestFixture) -> ImpactCoordinator {
    ImpactCoordinator::new(
        fixture.store.clone() as Arc<dyn EntityStore>,
        fixture.cache.clone(),
        Arc::new(ObserverHub::new()),
    )
}

fn builder(fixture: &TestFixture) -> GraphBuilder {
    GraphBuilder::new(
        fixture.store.clone() as Arc<dyn EntityStore>,
        fixture.cache.clone(),
    )
}

fn edge(id: &str, tenant: &str, source: NodeRef, target: NodeRef) -> ImpactEdge {
    ImpactEdge {
        id: id.to_string(),
        tenant_id: tenant.to_string(),
        source,
        target,
        impact_weight: 0.5,
        impact_type: ImpactType::Direct,
        impact_category: None,
        condition: None,
        active: true,
    }
}

#[tokio::test]
async fn edge_mutation_forces_graph_rebuild() {
    let fixture = TestFixture::new();
    fixture.add_tenant("t1");
    fixture.add_regulation("t1", "r1", Severity::High);
    fixture.add_department("t1", "d1");
    fixture.add_department("t1", "d2");
    fixture.add_edge(
        "t1",
        NodeRef::regulation("r1"),
        NodeRef::department("d1"),
        0.5,
        ImpactType::Direct,
    );

    let builder = builder(&fixture);
    let first = builder.build("t1").await.unwrap();
    assert_eq!(first.edge_count(), 1);

    // a second build without mutation reuses the cached graph
    let cached = builder.build("t1").await.unwrap();
    assert!(Arc::ptr_eq(&first, &cached));

    // mutate through the store, then run the documented wrapper
    let new_edge = edge(
        "e-new",
        "t1",
        NodeRef::department("d1"),
        NodeRef::department("d2"),
    );
    fixture.store.insert_edge(new_edge.clone()).unwrap();
    let coordinator = coordinator(&fixture);
    coordinator.edge_mutated(&new_edge, "created").await.unwrap();

    let rebuilt = builder.build("t1").await.unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(rebuilt.edge_count(), 2);
}

#[tokio::test]
async fn entity_and_regulation_wrappers_invalidate_the_graph() {
    let fixture = TestFixture::new();
    fixture.add_tenant("t1");
    fixture.add_regulation("t1", "r1", Severity::High);
    fixture.add_department("t1", "d1");
    fixture.add_edge(
        "t1",
        NodeRef::regulation("r1"),
        NodeRef::department("d1"),
        0.5,
        ImpactType::Direct,
    );

    let builder = builder(&fixture);
    let coordinator = coordinator(&fixture);

    let first = builder.build("t1").await.unwrap();
    coordinator
        .entity_mutated("t1", EntityKind::Department, "d1", "updated")
        .await
        .unwrap();
    let after_entity = builder.build("t1").await.unwrap();
    assert!(!Arc::ptr_eq(&first, &after_entity));

    coordinator
        .regulation_mutated("t1", "r1", "updated")
        .await
        .unwrap();
    let after_regulation = builder.build("t1").await.unwrap();
    assert!(!Arc::ptr_eq(&after_entity, &after_regulation));
}

#[tokio::test]
async fn wrappers_leave_an_audit_trail() {
    let fixture = TestFixture::new();
    fixture.add_tenant("t1");
    fixture.add_regulation("t1", "r1", Severity::High);
    fixture.add_department("t1", "d1");

    let coordinator = coordinator(&fixture);
    let e = edge("e1", "t1", NodeRef::regulation("r1"), NodeRef::department("d1"));
    fixture.store.insert_edge(e.clone()).unwrap();
    coordinator.edge_mutated(&e, "created").await.unwrap();
    coordinator
        .entity_mutated("t1", EntityKind::Department, "d1", "updated")
        .await
        .unwrap();
    coordinator
        .regulation_mutated("t1", "r1", "deleted")
        .await
        .unwrap();

    let actions: Vec<String> = fixture
        .store
        .audit_entries()
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(
        actions,
        vec!["edge.created", "entity.updated", "regulation.deleted"]
    );
}

#[tokio::test]
async fn validate_edge_enforces_domain_invariants() {
    let fixture = TestFixture::new();
    fixture.add_tenant("t1");
    fixture.add_tenant("t2");
    fixture.add_regulation("t1", "r1", Severity::High);
    fixture.add_department("t1", "d1");
    fixture.add_department("t2", "d2");

    let coordinator = coordinator(&fixture);

    // well-formed edge passes
    let ok = edge("e1", "t1", NodeRef::regulation("r1"), NodeRef::department("d1"));
    coordinator.validate_edge(&ok).await.unwrap();

    // self-loop
    let self_loop = edge("e2", "t1", NodeRef::department("d1"), NodeRef::department("d1"));
    assert!(matches!(
        coordinator.validate_edge(&self_loop).await.unwrap_err(),
        ImpactError::Invalid(_)
    ));

    // weight outside [0, 1]
    let mut heavy = ok.clone();
    heavy.id = "e3".to_string();
    heavy.impact_weight = 2.0;
    assert!(matches!(
        coordinator.validate_edge(&heavy).await.unwrap_err(),
        ImpactError::Invalid(_)
    ));

    // endpoint in another tenant
    let crossing = edge("e4", "t1", NodeRef::regulation("r1"), NodeRef::department("d2"));
    assert!(matches!(
        coordinator.validate_edge(&crossing).await.unwrap_err(),
        ImpactError::Invalid(_)
    ));

    // unknown endpoint
    let dangling = edge("e5", "t1", NodeRef::regulation("r1"), NodeRef::department("ghost"));
    assert!(matches!(
        coordinator.validate_edge(&dangling).await.unwrap_err(),
        ImpactError::NotFound(_)
    ));

    // duplicate of an existing active pair
    fixture.store.insert_edge(ok.clone()).unwrap();
    let mut duplicate = ok.clone();
    duplicate.id = "e6".to_string();
    assert!(matches!(
        coordinator.validate_edge(&duplicate).await.unwrap_err(),
        ImpactError::Conflict(_)
    ));
}

#[tokio::test]
async fn recalculation_replaces_impact_rows_and_publishes() {
    let fixture = TestFixture::new();
    fixture.add_tenant("t1");
    fixture.add_regulation("t1", "r1", Severity::Critical);
    fixture.add_department("t1", "d1");
    fixture.add_budget("t1", "b1");
    fixture.add_edge(
        "t1",
        NodeRef::regulation("r1"),
        NodeRef::department("d1"),
        0.8,
        ImpactType::Direct,
    );
    fixture.add_edge(
        "t1",
        NodeRef::department("d1"),
        NodeRef::budget("b1"),
        0.5,
        ImpactType::Direct,
    );

    let hub = Arc::new(ObserverHub::new());
    let mut events = hub.subscribe();
    let coordinator = ImpactCoordinator::new(
        fixture.store.clone() as Arc<dyn EntityStore>,
        fixture.cache.clone(),
        hub,
    );

    let scores = coordinator
        .run_recalculation("t1", &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(scores.len(), 2);

    let rows = fixture.store.regulation_impacts("r1");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.target != NodeRef::regulation("r1")));

    let mut kinds = Vec::new();
    while let Ok(Ok(event)) =
        tokio::time::timeout(Duration::from_millis(200), events.recv()).await
    {
        kinds.push(event.kind);
    }
    assert!(matches!(kinds[0], RiskEventKind::RecalculationStart { regulation_count: 1 }));
    assert!(kinds
        .iter()
        .any(|k| matches!(k, RiskEventKind::ImpactUpdate { .. })));
    assert!(kinds
        .iter()
        .any(|k| matches!(k, RiskEventKind::RiskUpdate { entities: 2 })));
    assert!(matches!(
        kinds.last().unwrap(),
        RiskEventKind::RecalculationComplete { .. }
    ));
}

#[tokio::test]
async fn cancelled_recalculation_surfaces_cancelled_error() {
    let fixture = TestFixture::new();
    fixture.add_tenant("t1");
    fixture.add_regulation("t1", "r1", Severity::Critical);
    fixture.add_department("t1", "d1");
    fixture.add_edge(
        "t1",
        NodeRef::regulation("r1"),
        NodeRef::department("d1"),
        0.8,
        ImpactType::Direct,
    );

    let coordinator = coordinator(&fixture);
    let token = CancelToken::new();
    token.cancel();

    let err = coordinator
        .run_recalculation("t1", &token)
        .await
        .unwrap_err();
    assert!(matches!(err, ImpactError::Cancelled(_)));
}

#[tokio::test]
async fn stale_graph_is_reused_until_invalidated() {
    let fixture = TestFixture::new();
    fixture.add_tenant("t1");
    fixture.add_regulation("t1", "r1", Severity::High);
    fixture.add_department("t1", "d1");
    fixture.add_edge(
        "t1",
        NodeRef::regulation("r1"),
        NodeRef::department("d1"),
        0.5,
        ImpactType::Direct,
    );

    let builder = builder(&fixture);
    let first = builder.build("t1").await.unwrap();

    // mutating the store without running the wrapper leaves the cached
    // graph in place until its tag is invalidated
    fixture
        .store
        .insert_edge(edge(
            "e-extra",
            "t1",
            NodeRef::department("d1"),
            NodeRef::regulation("r1"),
        ))
        .unwrap();
    let stale = builder.build("t1").await.unwrap();
    assert_eq!(stale.edge_count(), first.edge_count());

    fixture.cache.invalidate_edges("t1");
    let fresh = builder.build("t1").await.unwrap();
    assert_eq!(fresh.edge_count(), 2);
}
