//! End-to-end reconciliation tests
//!
//! Each test drives the full workflow against a migrated Postgres and a
//! mock backbone server. They need DATABASE_URL and are ignored by
//! default; run them with `cargo test -- --ignored`.

mod common;

use common::{backbone_client, rank_table};
use serde_json::json;
use sqlx::PgPool;
use taxrec_engine::error::EngineError;
use taxrec_engine::models::{TaxonHints, TaxonId, TaxonRef, TaxonSubmission};
use taxrec_engine::reconcile::Reconciler;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reconciler(pool: PgPool, server_uri: &str) -> Reconciler {
    Reconciler::with_rank_table(pool, backbone_client(server_uri), rank_table())
}

/// Mounts the backbone responses for Gyraulus costulatus, a species the
/// backbone confirms with a family + genus ancestor chain.
async fn mount_costulatus(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/species/match"))
        .and(query_param("name", "Gyraulus costulatus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matchType": "EXACT",
            "confidence": 99,
            "usageKey": 2361902,
            "canonicalName": "Gyraulus costulatus",
            "scientificName": "Gyraulus costulatus (Krauss, 1848)",
            "rank": "SPECIES",
            "status": "ACCEPTED",
            "synonym": false
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/species/2361902"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": 2361902,
            "canonicalName": "Gyraulus costulatus",
            "scientificName": "Gyraulus costulatus (Krauss, 1848)",
            "authorship": "(Krauss, 1848)",
            "rank": "SPECIES",
            "taxonomicStatus": "ACCEPTED",
            "parentKey": 2361770,
            "parent": "Gyraulus",
            "synonym": false
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/species/2361902/parents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "key": 6574,
                "canonicalName": "Planorbidae",
                "scientificName": "Planorbidae Rafinesque, 1815",
                "rank": "FAMILY",
                "taxonomicStatus": "ACCEPTED",
                "synonym": false
            },
            {
                "key": 2361770,
                "canonicalName": "Gyraulus",
                "scientificName": "Gyraulus Charpentier, 1837",
                "rank": "GENUS",
                "taxonomicStatus": "ACCEPTED",
                "parentKey": 6574,
                "parent": "Planorbidae",
                "synonym": false
            }
        ])))
        .mount(server)
        .await;
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // requires a Postgres database
async fn confirmed_species_is_inserted_with_its_ancestor_chain(pool: PgPool) {
    let server = MockServer::start().await;
    mount_costulatus(&server).await;
    let engine = reconciler(pool.clone(), &server.uri());

    let id = engine
        .submit(TaxonSubmission::by_canonical_name("Gyraulus costulatus"))
        .await
        .unwrap();

    let (name, status, backbone_key, parent_id): (String, String, Option<i64>, Option<TaxonId>) =
        sqlx::query_as("SELECT name, status, backbone_key, parent_id FROM taxon WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(name, "Gyraulus costulatus");
    assert_eq!(status, "ACCEPTED");
    assert_eq!(backbone_key, Some(2361902));

    let (genus, genus_parent): (String, Option<TaxonId>) =
        sqlx::query_as("SELECT name, parent_id FROM taxon WHERE id = $1")
            .bind(parent_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(genus, "Gyraulus");

    let family: String = sqlx::query_scalar("SELECT name FROM taxon WHERE id = $1")
        .bind(genus_parent)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(family, "Planorbidae");

    let total: i64 = sqlx::query_scalar("SELECT count(*) FROM taxon")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 3);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // requires a Postgres database
async fn resubmission_returns_the_same_id_without_new_rows(pool: PgPool) {
    let server = MockServer::start().await;
    mount_costulatus(&server).await;
    let engine = reconciler(pool.clone(), &server.uri());

    let first = engine
        .submit(TaxonSubmission::by_canonical_name("Gyraulus costulatus"))
        .await
        .unwrap();
    let second = engine
        .submit(TaxonSubmission::by_canonical_name("Gyraulus costulatus"))
        .await
        .unwrap();
    assert_eq!(first, second);

    // A different spelling of the same taxon resolves through the
    // backbone key recheck instead of inserting a duplicate.
    Mock::given(method("GET"))
        .and(path("/species/match"))
        .and(query_param("name", "Gyraulus costulatus Krauss, 1848"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matchType": "EXACT",
            "confidence": 99,
            "usageKey": 2361902,
            "canonicalName": "Gyraulus costulatus",
            "rank": "SPECIES",
            "status": "ACCEPTED",
            "synonym": false
        })))
        .mount(&server)
        .await;
    let third = engine
        .submit(TaxonSubmission::by_scientific_name(
            "Gyraulus costulatus Krauss, 1848",
        ))
        .await
        .unwrap();
    assert_eq!(first, third);

    let total: i64 = sqlx::query_scalar("SELECT count(*) FROM taxon")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 3);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // requires a Postgres database
async fn stored_synonym_resolves_to_its_accepted_taxon(pool: PgPool) {
    let accepted_id: TaxonId = sqlx::query_scalar(
        r#"
        INSERT INTO taxon (name, name_auth, rank, status, backbone_key)
        VALUES ('Bulinus truncatus', 'Bulinus truncatus (Audouin, 1827)', 'SPECIES', 'ACCEPTED', 2362077)
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    sqlx::query(
        r#"
        INSERT INTO taxon (name, name_auth, rank, status, backbone_key, synonym_of_id)
        VALUES ('Physa truncata', 'Physa truncata Audouin, 1827', 'SPECIES', 'SYNONYM', 9906772, $1)
        "#,
    )
    .bind(accepted_id)
    .execute(&pool)
    .await
    .unwrap();

    let server = MockServer::start().await;
    let engine = reconciler(pool, &server.uri());

    let id = engine
        .submit(TaxonSubmission::by_key(9906772))
        .await
        .unwrap();
    assert_eq!(id, accepted_id);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // requires a Postgres database
async fn backbone_synonym_inserts_the_accepted_taxon_and_the_synonym_row(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/species/match"))
        .and(query_param("name", "Physa truncata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matchType": "EXACT",
            "confidence": 99,
            "usageKey": 9906772,
            "acceptedUsageKey": 2362077,
            "canonicalName": "Physa truncata",
            "rank": "SPECIES",
            "status": "SYNONYM",
            "synonym": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/species/9906772"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": 9906772,
            "canonicalName": "Physa truncata",
            "scientificName": "Physa truncata Audouin, 1827",
            "authorship": "Audouin, 1827",
            "rank": "SPECIES",
            "taxonomicStatus": "SYNONYM",
            "synonym": true,
            "acceptedKey": 2362077,
            "accepted": "Bulinus truncatus (Audouin, 1827)"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/species/2362077"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": 2362077,
            "canonicalName": "Bulinus truncatus",
            "scientificName": "Bulinus truncatus (Audouin, 1827)",
            "authorship": "(Audouin, 1827)",
            "rank": "SPECIES",
            "taxonomicStatus": "ACCEPTED",
            "synonym": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/species/2362077/parents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let engine = reconciler(pool.clone(), &server.uri());
    let id = engine
        .submit(TaxonSubmission::by_canonical_name("Physa truncata"))
        .await
        .unwrap();

    let accepted_name: String = sqlx::query_scalar("SELECT name FROM taxon WHERE id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(accepted_name, "Bulinus truncatus");

    let (status, parent_id, synonym_of_id): (String, Option<TaxonId>, Option<TaxonId>) =
        sqlx::query_as("SELECT status, parent_id, synonym_of_id FROM taxon WHERE name = $1")
            .bind("Physa truncata")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "SYNONYM");
    assert_eq!(parent_id, None);
    assert_eq!(synonym_of_id, Some(id));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // requires a Postgres database
async fn caller_supplied_synonym_links_to_the_stored_accepted_taxon(pool: PgPool) {
    let accepted_id: TaxonId = sqlx::query_scalar(
        r#"
        INSERT INTO taxon (name, name_auth, rank, status, backbone_key)
        VALUES ('Bulinus globosus', 'Bulinus globosus (Morelet, 1866)', 'SPECIES', 'ACCEPTED', 2362080)
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    // The backbone knows nothing about this name; the caller's synonym
    // target is the only synonymy information available.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/species/match"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matchType": "NONE",
            "confidence": 100
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/parser/name"))
        .and(query_param("name", "Physopsis globosa Morelet, 1866"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "parsed": true,
            "scientificName": "Physopsis globosa Morelet, 1866",
            "canonicalName": "Physopsis globosa",
            "rankMarker": "sp.",
            "genusOrAbove": "Physopsis",
            "specificEpithet": "globosa"
        }])))
        .mount(&server)
        .await;

    let engine = reconciler(pool.clone(), &server.uri());
    let submission = TaxonSubmission::by_scientific_name("Physopsis globosa Morelet, 1866")
        .with_hints(TaxonHints {
            synonym_of: Some(TaxonRef::by_canonical_name("Bulinus globosus")),
            ..TaxonHints::default()
        });
    let id = engine.submit(submission).await.unwrap();
    assert_eq!(id, accepted_id);

    let (status, parent_id, synonym_of_id): (String, Option<TaxonId>, Option<TaxonId>) =
        sqlx::query_as("SELECT status, parent_id, synonym_of_id FROM taxon WHERE name = $1")
            .bind("Physopsis globosa")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "SYNONYM");
    assert_eq!(parent_id, None);
    assert_eq!(synonym_of_id, Some(accepted_id));

    let total: i64 = sqlx::query_scalar("SELECT count(*) FROM taxon")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 2);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // requires a Postgres database
async fn unresolvable_parent_aborts_without_writes(pool: PgPool) {
    // NONE for every match: neither the taxon nor its parent exists in
    // the backbone.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/species/match"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matchType": "NONE",
            "confidence": 100
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/parser/name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "parsed": true,
            "scientificName": "Ferrissia clessiniana (Jickeli, 1882)",
            "canonicalName": "Ferrissia clessiniana",
            "rankMarker": "sp.",
            "genusOrAbove": "Ferrissia",
            "specificEpithet": "clessiniana"
        }])))
        .mount(&server)
        .await;

    let engine = reconciler(pool.clone(), &server.uri());
    let submission = TaxonSubmission::by_scientific_name("Ferrissia clessiniana (Jickeli, 1882)")
        .with_hints(TaxonHints {
            parent: TaxonRef::by_canonical_name("Ferrissia"),
            ..TaxonHints::default()
        });
    let err = engine.submit(submission).await.unwrap_err();
    assert!(matches!(err, EngineError::ParentNotFound(_)));

    let total: i64 = sqlx::query_scalar("SELECT count(*) FROM taxon")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // requires a Postgres database
async fn unknown_taxon_with_manual_fields_is_stored_as_doubtful(pool: PgPool) {
    let genus_id: TaxonId = sqlx::query_scalar(
        r#"
        INSERT INTO taxon (name, name_auth, rank, status, backbone_key)
        VALUES ('Gyraulus', 'Gyraulus Charpentier, 1837', 'GENUS', 'ACCEPTED', 2361770)
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/species/match"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matchType": "NONE",
            "confidence": 100
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/parser/name"))
        .and(query_param("name", "Gyraulus barthelemyi Mouthon, 2021"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "parsed": true,
            "scientificName": "Gyraulus barthelemyi Mouthon, 2021",
            "canonicalName": "Gyraulus barthelemyi",
            "rankMarker": "sp.",
            "genusOrAbove": "Gyraulus",
            "specificEpithet": "barthelemyi"
        }])))
        .mount(&server)
        .await;

    let engine = reconciler(pool.clone(), &server.uri());
    let submission = TaxonSubmission::by_scientific_name("Gyraulus barthelemyi Mouthon, 2021")
        .with_hints(TaxonHints {
            source: Some("Mouthon 2021".to_string()),
            parent: TaxonRef::by_canonical_name("Gyraulus"),
            ..TaxonHints::default()
        });
    let id = engine.submit(submission).await.unwrap();

    let (name, status, auth, source, parent_id): (
        String,
        String,
        Option<String>,
        Option<String>,
        Option<TaxonId>,
    ) = sqlx::query_as(
        "SELECT name, status, auth, source, parent_id FROM taxon WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(name, "Gyraulus barthelemyi");
    assert_eq!(status, "DOUBTFUL");
    assert_eq!(auth.as_deref(), Some("Mouthon, 2021"));
    assert_eq!(source.as_deref(), Some("Mouthon 2021"));
    assert_eq!(parent_id, Some(genus_id));
}
