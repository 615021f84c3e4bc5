mod common;

use common::Fixture;
use ensemble_graph::entity::Response as ResponseRow;
use ensemble_graph::query::fields;
use ensemble_graph::{Error, GraphConfig, Request, Session};
use serde_json::json;
use std::time::{Duration, Instant};

#[test]
fn test_missing_ensemble_is_null() {
    let fx = Fixture::new();
    fx.ensemble("prior", None);

    let response = fx.query("{ ensemble(id: 42) { id name } }");
    assert!(response.errors.is_empty());
    assert_eq!(response.get("ensemble"), Some(&json!(null)));
}

#[test]
fn test_ensemble_without_parent_has_no_update_source() {
    let fx = Fixture::new();
    let id = fx.ensemble("prior", None);

    let response = fx.query(&format!("{{ ensemble(id: {}) {{ name updateSource parent {{ id }} }} }}", id));
    assert!(response.errors.is_empty());
    assert_eq!(response.get("ensemble.name"), Some(&json!("prior")));
    assert_eq!(response.get("ensemble.updateSource"), Some(&json!(null)));
    assert_eq!(response.get("ensemble.parent"), Some(&json!(null)));
}

#[test]
fn test_update_source_names_parent_ensemble() {
    let fx = Fixture::new();
    let a = fx.ensemble("A", None);
    let b = fx.ensemble("B", None);
    fx.update("es_mda", a, b);

    let response = fx.execute(
        &Request::new("query Source($id: Int!) { ensemble(id: $id) { updateSource parent { algorithm ensembleReference { id } } } }")
            .with_variable("id", b),
    );
    assert!(response.errors.is_empty());
    assert_eq!(response.get("ensemble.updateSource"), Some(&json!("A")));
    assert_eq!(response.get("ensemble.parent.algorithm"), Some(&json!("es_mda")));
    assert_eq!(response.get("ensemble.parent.ensembleReference.id"), Some(&json!(a)));

    let children = fx.query(&format!("{{ ensemble(id: {}) {{ children {{ ensembleResult {{ name }} }} }} }}", a));
    assert_eq!(children.get("ensemble.children.0.ensembleResult.name"), Some(&json!("B")));
}

#[test]
fn test_dangling_update_source_is_field_error() {
    let fx = Fixture::new();
    let b = fx.ensemble("B", None);
    fx.update("es", 777, b);

    let response = fx.query(&format!("{{ ensemble(id: {}) {{ name updateSource }} }}", b));
    assert_eq!(response.get("ensemble.name"), Some(&json!("B")));
    assert_eq!(response.get("ensemble.updateSource"), Some(&json!(null)));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].extensions.code, "NOT_FOUND");
}

#[test]
fn test_all_ensembles_in_id_order() {
    let fx = Fixture::new();
    for name in ["first", "second", "third"] {
        fx.ensemble(name, None);
    }

    let first = fx.query("{ allEnsembles { name } }");
    let second = fx.query("{ allEnsembles { name } }");
    assert_eq!(
        first.data,
        Some(json!({ "allEnsembles": [{ "name": "first" }, { "name": "second" }, { "name": "third" }] }))
    );
    assert_eq!(first, second);
}

#[test]
fn test_response_name_comes_from_definition() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    let realization = fx.realization(ensemble, 0);
    let definition = fx.response_definition(ensemble, "GOR", fx.put_ints(&[0, 1, 2]));
    fx.response(realization, definition, fx.put_floats(&[0.5, 0.6, 0.7]));

    let response = fx.query(&format!(
        "{{ ensemble(id: {}) {{ realizations {{ index responses {{ name values }} }} }} }}",
        ensemble
    ));
    assert!(response.errors.is_empty());
    assert_eq!(response.get("ensemble.realizations.0.responses.0.name"), Some(&json!("GOR")));
    assert_eq!(
        response.get("ensemble.realizations.0.responses.0.values"),
        Some(&json!([0.5, 0.6, 0.7]))
    );
}

#[test]
fn test_dangling_response_definition_is_error() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    let realization = fx.realization(ensemble, 0);
    let values_ref = fx.put_floats(&[1.0]);
    let response_id = fx.response(realization, 404, values_ref);

    let session = fx.session();
    let row: ResponseRow = session.entities().get_by_id(response_id).unwrap().unwrap();
    assert!(matches!(fields::response_name(&session, &row), Err(Error::NotFound(_))));
    drop(session);

    let response = fx.query(&format!(
        "{{ ensemble(id: {}) {{ realizations {{ responses {{ name values }} }} }} }}",
        ensemble
    ));
    assert_eq!(response.get("ensemble.realizations.0.responses.0.name"), Some(&json!(null)));
    assert_eq!(response.get("ensemble.realizations.0.responses.0.values"), Some(&json!([1.0])));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        serde_json::to_value(&response.errors[0].path).unwrap(),
        json!(["ensemble", "realizations", 0, "responses", 0, "name"])
    );
}

#[test]
fn test_observation_values_resolve_exactly() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    let definition = fx.response_definition(ensemble, "FOPR", fx.put_ints(&[10, 20, 30]));
    let observation = fx.observation(
        "FOPR_OBS",
        fx.put_ints(&[0, 1, 2]),
        fx.put_ints(&[10, 20, 30]),
        fx.put_floats(&[1.0, 2.0, 3.0]),
        fx.put_floats(&[0.1, 0.2, 0.3]),
    );
    fx.link(observation, definition);

    let response = fx.query(&format!(
        "{{ ensemble(id: {}) {{ responseDefinitions {{ indexes observations {{ name values stds keyIndexes dataIndexes }} }} }} }}",
        ensemble
    ));
    assert!(response.errors.is_empty());
    assert_eq!(response.get("ensemble.responseDefinitions.0.indexes"), Some(&json!([10, 20, 30])));
    let observation = response.get("ensemble.responseDefinitions.0.observations.0").unwrap();
    assert_eq!(
        observation,
        &json!({
            "name": "FOPR_OBS",
            "values": [1.0, 2.0, 3.0],
            "stds": [0.1, 0.2, 0.3],
            "keyIndexes": [0, 1, 2],
            "dataIndexes": [10, 20, 30],
        })
    );
}

#[test]
fn test_observations_follow_link_order_with_duplicates() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    let definition = fx.response_definition(ensemble, "WOPR", fx.put_ints(&[0]));
    let other = fx.response_definition(ensemble, "WWCT", fx.put_ints(&[0]));
    let first = fx.simple_observation("first", &[1.0]);
    let second = fx.simple_observation("second", &[2.0]);
    let unrelated = fx.simple_observation("unrelated", &[3.0]);

    fx.link(second, definition);
    fx.link(first, definition);
    fx.link(unrelated, other);
    fx.link(second, definition);

    let session = fx.session();
    let names: Vec<String> = fields::observations(&session, definition)
        .unwrap()
        .into_iter()
        .map(|o| o.name)
        .collect();
    assert_eq!(names, vec!["second", "first", "second"]);

    let reverse: Vec<String> = fields::response_definitions(&session, second)
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(reverse, vec!["WOPR", "WOPR"]);
}

#[test]
fn test_link_to_missing_observation_is_error() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    let definition = fx.response_definition(ensemble, "WOPR", fx.put_ints(&[0]));
    fx.link(12345, definition);

    let session = fx.session();
    assert!(matches!(fields::observations(&session, definition), Err(Error::NotFound(_))));
}

#[test]
fn test_missing_blob_does_not_break_siblings() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    let definition = fx.response_definition(ensemble, "FOPR", fx.put_ints(&[0, 1]));
    let observation = fx.observation(
        "broken",
        fx.put_ints(&[0, 1]),
        fx.put_ints(&[0, 1]),
        fx.missing_blob(),
        fx.put_floats(&[0.5, 0.5]),
    );
    fx.link(observation, definition);

    let response = fx.query(&format!(
        "{{ ensemble(id: {}) {{ name responseDefinitions {{ observations {{ name values stds }} }} }} }}",
        ensemble
    ));
    assert!(response.data.is_some());
    assert_eq!(response.get("ensemble.name"), Some(&json!("prior")));
    let observation = response.get("ensemble.responseDefinitions.0.observations.0").unwrap();
    assert_eq!(observation, &json!({ "name": "broken", "values": null, "stds": [0.5, 0.5] }));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].extensions.code, "NOT_FOUND");
}

#[test]
fn test_malformed_payload_is_decode_error() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    let definition = fx.response_definition(ensemble, "FOPR", fx.put_blob(&[1, 2, 3]));

    let response = fx.query(&format!("{{ ensemble(id: {}) {{ responseDefinitions {{ id indexes }} }} }}", ensemble));
    assert_eq!(response.get("ensemble.responseDefinitions.0.id"), Some(&json!(definition)));
    assert_eq!(response.get("ensemble.responseDefinitions.0.indexes"), Some(&json!(null)));
    assert_eq!(response.errors[0].extensions.code, "DECODE_ERROR");
}

#[test]
fn test_parameters_and_priors() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    let realization = fx.realization(ensemble, 3);
    let definition = fx.parameter_definition(ensemble, "MULTFLT", "FAULTS");
    fx.parameter(realization, definition, fx.put_floats(&[0.75]));
    fx.prior(definition, "UNIFORM", r#"["MIN", "MAX"]"#, "[0.1, 0.9]");

    let response = fx.query(&format!(
        "{{ ensemble(id: {}) {{ parameterDefinitions {{ group priors {{ function parameterNames parameterValues }} parameters {{ name value realization {{ index }} }} }} }} }}",
        ensemble
    ));
    assert!(response.errors.is_empty());
    let definition = response.get("ensemble.parameterDefinitions.0").unwrap();
    assert_eq!(
        definition,
        &json!({
            "group": "FAULTS",
            "priors": [{ "function": "UNIFORM", "parameterNames": ["MIN", "MAX"], "parameterValues": [0.1, 0.9] }],
            "parameters": [{ "name": "MULTFLT", "value": 0.75, "realization": { "index": 3 } }],
        })
    );
}

#[test]
fn test_parameter_value_must_be_scalar() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    let realization = fx.realization(ensemble, 0);
    let definition = fx.parameter_definition(ensemble, "PORO", "FIELD");
    fx.parameter(realization, definition, fx.put_floats(&[0.2, 0.3]));

    let response = fx.query(&format!(
        "{{ ensemble(id: {}) {{ realizations {{ parameters {{ name value }} }} }} }}",
        ensemble
    ));
    assert_eq!(response.get("ensemble.realizations.0.parameters.0.name"), Some(&json!("PORO")));
    assert_eq!(response.errors[0].extensions.code, "DECODE_ERROR");
}

#[test]
fn test_project_and_aliases() {
    let fx = Fixture::new();
    let project = fx.project("drogon");
    let ensemble = fx.ensemble("prior", Some(project));

    let response = fx.query(&format!(
        "{{ e: ensemble(id: {}) {{ __typename project {{ name ensembles {{ id }} }} }} kind: __typename }}",
        ensemble
    ));
    assert!(response.errors.is_empty());
    assert_eq!(response.get("e.__typename"), Some(&json!("Ensemble")));
    assert_eq!(response.get("e.project.name"), Some(&json!("drogon")));
    assert_eq!(response.get("e.project.ensembles.0.id"), Some(&json!(ensemble)));
    assert_eq!(response.get("kind"), Some(&json!("Query")));
}

#[test]
fn test_raw_references_are_not_exposed() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    fx.response_definition(ensemble, "FOPR", fx.put_ints(&[0]));

    let response = fx.query(&format!("{{ ensemble(id: {}) {{ responseDefinitions {{ name indexesRef }} }} }}", ensemble));
    assert_eq!(response.get("ensemble.responseDefinitions.0.name"), Some(&json!("FOPR")));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].extensions.code, "QUERY_ERROR");
}

#[test]
fn test_root_errors_abort_request() {
    let fx = Fixture::new();
    fx.ensemble("prior", None);

    for query in [
        "{ ensembles { id } }",
        "{ ensemble { id } }",
        "{ ensemble(id: \"one\") { id } }",
        "{ ensemble(id: $missing) { id } }",
        "{ allEnsembles }",
        "{ allEnsembles { id ",
    ] {
        let response = fx.query(query);
        assert_eq!(response.data, None, "query {:?} was not aborted", query);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].extensions.code, "QUERY_ERROR");
    }
}

#[test]
fn test_selection_shape_errors_are_field_errors() {
    let fx = Fixture::new();
    let id = fx.ensemble("prior", None);

    let response = fx.query(&format!("{{ ensemble(id: {}) {{ name {{ x }} realizations project(id: 1) {{ id }} }} }}", id));
    assert_eq!(response.get("ensemble.name"), Some(&json!(null)));
    assert_eq!(response.get("ensemble.realizations"), Some(&json!(null)));
    assert_eq!(response.errors.len(), 3);
}

#[test]
fn test_variable_default_is_used() {
    let fx = Fixture::new();
    let id = fx.ensemble("prior", None);

    let response = fx.query(&format!("query Q($id: Int = {}) {{ ensemble(id: $id) {{ name }} }}", id));
    assert_eq!(response.get("ensemble.name"), Some(&json!("prior")));
}

#[test]
fn test_unavailable_store_aborts_request() {
    let dir = tempfile::tempdir().unwrap();
    let config = GraphConfig::new(dir.path().join("absent.db"), dir.path().join("absent-blobs.db"));

    assert!(matches!(Session::open(&config), Err(Error::StoreUnavailable(_))));

    let response = ensemble_graph::query::execute(&config, &Request::new("{ allEnsembles { id } }"));
    assert_eq!(response.data, None);
    assert_eq!(response.errors[0].extensions.code, "STORE_UNAVAILABLE");
}

#[test]
fn test_response_serializes_like_graphql() {
    let fx = Fixture::new();
    fx.ensemble("prior", None);

    let response = fx.query("{ allEnsembles { name } }");
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "data": { "allEnsembles": [{ "name": "prior" }] } })
    );

    let aborted = fx.query("{ nope }");
    let value = serde_json::to_value(&aborted).unwrap();
    assert_eq!(value["data"], json!(null));
    assert_eq!(value["errors"][0]["extensions"]["code"], json!("QUERY_ERROR"));
}

#[test]
fn test_repeated_selections_are_merged() {
    let fx = Fixture::new();
    let ensemble = fx.ensemble("prior", None);
    let realization = fx.realization(ensemble, 0);

    let response = fx.query(&format!(
        "{{ ensemble(id: {}) {{ realizations {{ id }} realizations {{ index }} }} }}",
        ensemble
    ));
    assert!(response.errors.is_empty());
    assert_eq!(
        response.get("ensemble.realizations"),
        Some(&json!([{ "id": realization, "index": 0 }]))
    );
}

#[test]
fn test_conflicting_aliases_abort_request() {
    let fx = Fixture::new();
    let a = fx.ensemble("A", None);
    let b = fx.ensemble("B", None);

    let response = fx.query(&format!(
        "{{ x: ensemble(id: {}) {{ name }} x: ensemble(id: {}) {{ id }} }}",
        a, b
    ));
    assert_eq!(response.data, None);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].extensions.code, "QUERY_ERROR");
    assert!(response.errors[0].message.contains("conflict"));
}

#[test]
fn test_locked_store_fails_fast() {
    let fx = Fixture::new();
    fx.ensemble("prior", None);

    let mut config = fx.config.clone();
    config.busy_timeout_ms = 200;
    fx.entities.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let started = Instant::now();
    let response = ensemble_graph::query::execute(&config, &Request::new("{ allEnsembles { id } }"));
    let elapsed = started.elapsed();
    fx.entities.execute_batch("COMMIT").unwrap();

    assert_eq!(response.data, None);
    assert_eq!(response.errors[0].extensions.code, "STORE_UNAVAILABLE");
    assert!(elapsed < Duration::from_secs(3), "waited {:?}", elapsed);
}

#[test]
fn test_concurrent_executions() {
    let fx = Fixture::new();
    for name in ["A", "B", "C"] {
        let ensemble = fx.ensemble(name, None);
        let realization = fx.realization(ensemble, 0);
        let definition = fx.response_definition(ensemble, "FOPR", fx.put_ints(&[0, 1]));
        fx.response(realization, definition, fx.put_floats(&[1.0, 2.0]));
    }
    let request = Request::new("{ allEnsembles { name realizations { responses { name values } } } }");
    let expected = fx.query(&request.query);
    assert!(expected.errors.is_empty());

    let config = &fx.config;
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| ensemble_graph::query::execute(config, &request)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
