//! Integration tests for the gateway route table builder.

use hermes_config::GatewayConfig;
use hermes_core::{AuthRequirement, Call, CallDescription, CommonErrorMessage, Empty};
use hermes_gateway::{GatewayError, GatewayRouteTable, GatewayTableBuilder};
use hermes_macros::Message;
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize, Message)]
struct ById {
    id: String,
}

fn call(namespace: &str, name: &str, template: &str, proxied: bool) -> CallDescription {
    let call: Call<ById, Empty, CommonErrorMessage> = if template.contains("{id}") {
        Call::builder(namespace, name)
            .method(Method::GET)
            .path(template)
            .auth(AuthRequirement::read())
            .proxy_to_gateway(proxied)
            .build()
            .unwrap()
    } else {
        Call::builder(namespace, name)
            .method(Method::GET)
            .path(template)
            .param("id")
            .auth(AuthRequirement::read())
            .proxy_to_gateway(proxied)
            .build()
            .unwrap()
    };
    call.description().as_ref().clone()
}

fn services() -> Vec<CallDescription> {
    vec![
        call("files", "get", "/api/files/{id}", true),
        call("files", "delete", "/api/files/{id}/delete", true),
        call("files.stats", "usage", "/api/files/stats/usage", true),
        call("projects", "get", "/api/projects/{id}", true),
        call("internal", "health", "/internal/health", false),
    ]
}

#[test]
fn test_only_proxied_calls_are_routed() {
    let table = GatewayTableBuilder::new().build(&services());

    let prefixes: Vec<&str> = table.routes().iter().map(|r| r.prefix.as_str()).collect();
    assert_eq!(
        prefixes,
        vec!["/api/files", "/api/files/stats/usage", "/api/projects"]
    );
    assert!(table.warnings().is_empty());
    assert!(table.resolve("/internal/health").is_none());
}

#[test]
fn test_same_namespace_sharing_is_not_a_conflict() {
    let table = GatewayTableBuilder::new().build(&services());
    let files = table.resolve("/api/files/abc/delete").unwrap();
    assert_eq!(files.namespace, "files");
    assert_eq!(files.name, "get");
    assert!(table.warnings().is_empty());
}

#[test]
fn test_cross_namespace_conflict_first_wins() {
    let descriptions = vec![
        call("files", "get", "/api/shared/{id}", true),
        call("projects", "get", "/api/shared/{id}/project", true),
    ];
    let table = GatewayTableBuilder::new().build(&descriptions);

    assert_eq!(table.len(), 1);
    assert_eq!(table.resolve("/api/shared/x").unwrap().namespace, "files");

    let conflict = &table.warnings()[0];
    assert_eq!(conflict.prefix, "/api/shared");
    assert_eq!(conflict.kept, "files.get");
    assert_eq!(conflict.dropped, "projects.get");
}

#[test]
fn test_longest_prefix_wins() {
    let table = GatewayTableBuilder::new().build(&services());
    assert_eq!(
        table.resolve("/api/files/stats/usage").unwrap().namespace,
        "files.stats"
    );
    assert_eq!(table.resolve("/api/files/stats").unwrap().namespace, "files");
}

#[test]
fn test_json_export() {
    let descriptions = vec![call("projects", "get", "/api/projects/{id}", true)];
    let table = GatewayTableBuilder::new().build(&descriptions);

    let exported: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
    assert_eq!(
        exported,
        json!({"routes": [{"prefix": "/api/projects", "namespace": "projects", "name": "get"}]})
    );

    let loaded = GatewayRouteTable::from_json(&table.to_json().unwrap()).unwrap();
    assert_eq!(loaded.routes(), table.routes());
    assert!(GatewayRouteTable::from_json(r#"{"routes": [{"prefix": "api"}]}"#).is_err());
}

#[test]
fn test_config_base_path_and_disable() {
    let config = GatewayConfig {
        enabled: true,
        base_path: "/edge".to_string(),
    };
    let table = GatewayTableBuilder::from_config(&config).unwrap().build(&services());
    assert!(table.resolve("/edge/api/projects/p1").is_some());
    assert!(table.resolve("/api/projects/p1").is_none());

    let disabled = GatewayConfig {
        enabled: false,
        ..GatewayConfig::default()
    };
    assert!(GatewayTableBuilder::from_config(&disabled)
        .unwrap()
        .build(&services())
        .is_empty());

    let relative = GatewayConfig {
        base_path: "edge".to_string(),
        ..GatewayConfig::default()
    };
    assert!(matches!(
        GatewayTableBuilder::from_config(&relative),
        Err(GatewayError::InvalidPrefix { prefix }) if prefix == "edge"
    ));
}
