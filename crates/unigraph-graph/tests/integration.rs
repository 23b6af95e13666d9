//! Integration tests for unigraph-graph against a live Neo4j instance.
//!
//! Point `NEO4J_URI` / `NEO4J_USERNAME` / `NEO4J_PASSWORD` at a server.
//! Run with: cargo test --package unigraph-graph --test integration -- --ignored
//!
//! Skipped automatically if Neo4j is not available.

use unigraph_core::{Campus, Degree, School, WideInt};
use unigraph_graph::{Catalog, GraphClient, GraphConfig, GraphError};

async fn connect_or_skip() -> Option<Catalog<GraphClient>> {
    let config = match unigraph_core::config::load("unigraph") {
        Ok(settings) => GraphConfig::from(settings.neo4j),
        Err(_) => GraphConfig::default(),
    };
    match GraphClient::connect(&config).await {
        Ok(client) => Some(Catalog::new(client)),
        Err(e) => {
            eprintln!("Skipping integration test (Neo4j not available): {e}");
            None
        }
    }
}

/// A key no other test run will collide with.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_degree_round_trip() {
    let Some(catalog) = connect_or_skip().await else {
        return;
    };
    let code = unique("deg");
    let degree = Degree {
        credits: Some(WideInt(123_456_789_012_345)),
        mark_cut_off: Some(9.5),
        ..Degree::new(code.clone(), "Integration Physics")
    };

    let created = catalog.create_degree(&degree).await.unwrap();
    assert_eq!(created, degree);

    let fetched = catalog.get_degree_by_code(&code).await.unwrap();
    assert_eq!(fetched.credits, Some(WideInt(123_456_789_012_345)));

    let err = catalog.create_degree(&degree).await.unwrap_err();
    assert!(matches!(err, GraphError::Conflict { .. }));

    catalog.delete_degree(&code).await.unwrap();
    assert!(catalog
        .get_degree_by_code(&code)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_links_and_aggregations() {
    let Some(catalog) = connect_or_skip().await else {
        return;
    };
    let school_name = unique("school");
    let campus_name = unique("campus");
    let code = unique("deg");

    catalog
        .create_school(&School {
            name: school_name.clone(),
            foundation: Some(WideInt(1850)),
            web: None,
        })
        .await
        .unwrap();
    catalog
        .create_campus(&Campus {
            name: campus_name.clone(),
            city: None,
        })
        .await
        .unwrap();
    catalog
        .create_degree(&Degree::new(code.clone(), "Integration Law"))
        .await
        .unwrap();

    catalog
        .teach_degree_to_school(&school_name, &code)
        .await
        .unwrap();
    catalog
        .locate_school_in_campus(&school_name, &campus_name)
        .await
        .unwrap();

    let degrees = catalog.degrees_by_campus(&campus_name).await.unwrap();
    assert_eq!(degrees, vec!["Integration Law".to_string()]);

    let schools = catalog.schools_with_degrees().await.unwrap();
    assert!(schools
        .iter()
        .any(|s| s.school == school_name && s.degrees == ["Integration Law"]));

    let err = catalog
        .teach_degree_to_school(&school_name, &unique("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::EndpointNotFound { .. }));

    // Cleanup
    catalog.delete_degree(&code).await.unwrap();
    catalog.delete_school(&school_name).await.unwrap();
    catalog.delete_campus(&campus_name).await.unwrap();
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_delete_missing_is_not_found() {
    let Some(catalog) = connect_or_skip().await else {
        return;
    };
    let err = catalog.delete_campus(&unique("campus")).await.unwrap_err();
    assert!(err.is_not_found());
}
