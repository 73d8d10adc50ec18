//! A small projects service wired only through the facade.

use std::collections::HashMap;
use std::sync::Arc;

use hermes::prelude::*;
use hermes::dispatch::TopicStrategy;
use http::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Message)]
#[message(crate = "hermes::core")]
struct CreateProject {
    id: String,
    title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Message)]
#[message(crate = "hermes::core")]
struct ProjectRef {
    id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Message)]
#[message(crate = "hermes::core")]
struct Project {
    id: String,
    title: String,
}

const CONFIG: &str = r#"
[service]
name = "projects"

[dispatch]
topic_strategy = "per_call"

[dispatch.retry]
max_attempts = 2
initial_backoff_ms = 1
max_backoff_ms = 2

[gateway]
base_path = "/"
"#;

fn create() -> Call<CreateProject, Empty, CommonErrorMessage> {
    Call::builder("projects", "create")
        .method(Method::POST)
        .path("/api/projects")
        .body(BodyBinding::EntireBody)
        .auth(AuthRequirement::read_write())
        .dispatch(DispatchMode::LogOnly)
        .partition_key("id")
        .build()
        .unwrap()
}

fn get() -> Call<ProjectRef, Project, CommonErrorMessage> {
    Call::builder("projects", "get")
        .method(Method::GET)
        .path("/api/projects/{id}")
        .auth(AuthRequirement::read())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_command_then_query_through_materialized_view() {
    let config = ConfigLoader::new()
        .with_string(CONFIG, "toml")
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.dispatch.topic_strategy, TopicStrategy::PerCall);

    let log = Arc::new(InMemoryEventLog::new());
    let view: Arc<read_model::Projects> = Arc::default();

    let mut builder = RegistryBuilder::new(Dispatcher::from_config(log.clone(), &config.dispatch));
    let reader = Arc::clone(&view);
    builder
        .register_command(&create())
        .unwrap()
        .register(&get(), move |_ctx: RequestContext, req: ProjectRef| {
            let reader = Arc::clone(&reader);
            async move {
                reader.get(&req.id).ok_or_else(|| {
                    HandlerError::not_found(CommonErrorMessage::new(format!(
                        "no project {}",
                        req.id
                    )))
                })
            }
        })
        .unwrap();
    let registry = builder.build();

    let router = CallRouter::from_config(Arc::clone(&registry), &config)
        .with_principal_resolver(HeaderPrincipalResolver);
    let client = InProcessClient::new(Arc::new(router)).as_principal(Principal::user("alice"));

    let reply = client
        .call(
            &create(),
            &CreateProject {
                id: "p1".to_string(),
                title: "Apollo".to_string(),
            },
        )
        .await
        .unwrap();
    let ack = reply.acknowledgement().unwrap().clone();
    assert_eq!(ack.topic, "projects.create");

    // not applied yet
    let missing = client
        .call(&get(), &ProjectRef { id: "p1".to_string() })
        .await
        .unwrap_err();
    assert_eq!(missing.status(), Some(http::StatusCode::NOT_FOUND));

    let mut consumer = EventConsumer::new("projects.create");
    let applied = consumer
        .poll(&*log, 10, |event| {
            let view = Arc::clone(&view);
            async move {
                let request: CreateProject = serde_json::from_slice(&event.payload)?;
                view.insert(Project {
                    id: request.id,
                    title: request.title,
                });
                Ok::<(), anyhow::Error>(())
            }
        })
        .await
        .unwrap();
    assert_eq!(applied, 1);
    assert_eq!(consumer.last_applied(), ack.sequence);
    assert_eq!(log.events("projects.create")[0].key.as_deref(), Some("p1"));

    let project = client
        .call(&get(), &ProjectRef { id: "p1".to_string() })
        .await
        .unwrap()
        .into_response()
        .unwrap();
    assert_eq!(project.title, "Apollo");

    let table = GatewayTableBuilder::from_config(&config.gateway)
        .unwrap()
        .build(registry.descriptions());
    assert_eq!(table.resolve("/api/projects/p1").unwrap().namespace, "projects");
}

/// The read side materialized from `projects.create` events.
mod read_model {
    use parking_lot::RwLock;

    use super::{HashMap, Project};

    #[derive(Default)]
    pub struct Projects {
        by_id: RwLock<HashMap<String, Project>>,
    }

    impl Projects {
        pub fn insert(&self, project: Project) {
            self.by_id.write().insert(project.id.clone(), project);
        }

        pub fn get(&self, id: &str) -> Option<Project> {
            self.by_id.read().get(id).cloned()
        }
    }
}
