mod common;

use std::io::Write;
use std::time::Duration;

use aissembly::{
    AdapterDispatcher, AdapterKind, AdapterSpec, DispatchError, DispatcherConfig,
    InProcessResolver, Oracle, OracleDefinition, OracleRegistry, Pipeline, RunConfig, Value,
};
use mockito::Matcher;
use pretty_assertions::assert_eq;
use serde_json::json;

fn http_oracle(name: &str, url: String) -> OracleDefinition {
    OracleDefinition::new(name)
        .with_model("gpt-test")
        .with_adapter(AdapterSpec::new(AdapterKind::RemoteHttp).with_parameter("url", json!(url)))
}

fn prompt(text: &str) -> Vec<(String, Value)> {
    vec![("prompt".to_string(), Value::from(text))]
}

#[test]
fn test_remote_http_default_payload() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/ask")
        .match_body(Matcher::Json(json!({
            "model": "gpt-test",
            "name": "ask",
            "args": [1, "two"],
            "kwargs": {"prompt": "hello"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"output": "hi there", "tokens": 3}"#)
        .create();

    let mut registry = OracleRegistry::new();
    registry.register(http_oracle("ask", format!("{}/v1/ask", server.url())));
    let dispatcher = AdapterDispatcher::new(registry);

    let result = dispatcher
        .invoke("ask", &[Value::Integer(1), Value::from("two")], &prompt("hello"))
        .unwrap();
    mock.assert();

    let Value::Map(map) = result else {
        panic!("Expected map response, got {:?}", result);
    };
    assert_eq!(map.get("output"), Some(&Value::from("hi there")));
    assert_eq!(map.get("tokens"), Some(&Value::Integer(3)));
}

#[test]
fn test_remote_http_template_and_env_headers() {
    std::env::set_var("AISSEMBLY_DISPATCH_TEST_KEY", "k-123");
    let mut server = mockito::Server::new();
    let mock = server
        .mock("PUT", "/chat")
        .match_header("authorization", "Bearer k-123")
        .match_header("x-client", "aissembly")
        .match_body(Matcher::Json(json!({
            "model": "gpt-test",
            "messages": [{"role": "user", "content": "Summarize: tides"}],
            "input": ["tides"]
        })))
        .with_status(200)
        .with_body(r#""short summary""#)
        .create();

    let adapter = AdapterSpec::new(AdapterKind::RemoteHttp)
        .with_parameter("url", json!(format!("{}/chat", server.url())))
        .with_parameter("method", json!("put"))
        .with_parameter(
            "headers",
            json!({
                "Authorization": "Bearer ${env:AISSEMBLY_DISPATCH_TEST_KEY}",
                "X-Client": "aissembly"
            }),
        )
        .with_parameter(
            "payload",
            json!({
                "model": "${model}",
                "messages": [{"role": "user", "content": "Summarize: ${args.0}"}],
                "input": "${args}"
            }),
        );
    let mut registry = OracleRegistry::new();
    registry.register(
        OracleDefinition::new("summarize")
            .with_model("gpt-test")
            .with_adapter(adapter),
    );

    let result = AdapterDispatcher::new(registry)
        .invoke("summarize", &[Value::from("tides")], &[])
        .unwrap();
    mock.assert();
    assert_eq!(result, Value::from("short summary"));
}

#[test]
fn test_remote_http_failures() {
    let mut server = mockito::Server::new();
    let _unavailable = server
        .mock("POST", "/down")
        .with_status(503)
        .with_body("try later")
        .create();
    let _garbage = server
        .mock("POST", "/garbage")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create();

    let mut registry = OracleRegistry::new();
    registry.register(http_oracle("down", format!("{}/down", server.url())));
    registry.register(http_oracle("garbage", format!("{}/garbage", server.url())));
    let dispatcher = AdapterDispatcher::new(registry);

    match dispatcher.invoke("down", &[], &[]) {
        Err(DispatchError::AdapterInvocation(message)) => {
            assert!(message.contains("503"), "{}", message);
            assert!(message.contains("try later"), "{}", message);
        }
        other => panic!("Expected AdapterInvocation, got {:?}", other),
    }
    assert!(matches!(
        dispatcher.invoke("garbage", &[], &[]),
        Err(DispatchError::AdapterInvocation(_))
    ));
}

#[test]
fn test_unset_env_header_is_configuration_error() {
    let adapter = AdapterSpec::new(AdapterKind::RemoteHttp)
        .with_parameter("url", json!("http://127.0.0.1:9/unused"))
        .with_parameter(
            "headers",
            json!({"Authorization": "${env:AISSEMBLY_DISPATCH_UNSET_VAR}"}),
        );
    let mut registry = OracleRegistry::new();
    registry.register(OracleDefinition::new("ask").with_adapter(adapter));

    assert!(matches!(
        AdapterDispatcher::new(registry).invoke("ask", &[], &[]),
        Err(DispatchError::Configuration(_))
    ));
}

#[test]
fn test_unreachable_server_is_invocation_error() {
    let mut registry = OracleRegistry::new();
    registry.register(http_oracle("ask", "http://127.0.0.1:9/closed".to_string()));
    let dispatcher = AdapterDispatcher::new(registry).with_config(DispatcherConfig {
        request_timeout: Some(Duration::from_millis(500)),
    });
    assert!(matches!(
        dispatcher.invoke("ask", &[], &[]),
        Err(DispatchError::AdapterInvocation(_))
    ));
}

#[test]
fn test_registry_file_drives_pipeline() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/grade")
        .with_status(200)
        .with_body(r#"{"score": 0.75}"#)
        .create();

    let definitions = json!([
        {"name": "echo", "model": "local"},
        {
            "name": "grade",
            "model": "grader-1",
            "adapter": {"type": "http", "url": format!("{}/grade", server.url())}
        },
        {
            "name": "shout",
            "adapter": {"type": "local-function", "path": "text", "function": "upper"}
        }
    ]);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", definitions).unwrap();

    let registry = OracleRegistry::load(file.path()).unwrap();
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["echo", "grade", "shout"]);
    assert_eq!(registry.get("shout").unwrap().model, "unknown");

    let resolver = InProcessResolver::new().with_function("text", "upper", |args, _| {
        Ok(Value::from(args[0].to_string().to_uppercase()))
    });
    let env = Pipeline::new(RunConfig::default(), registry)
        .with_resolver(resolver)
        .run("let s = grade(\"essay\")[\"score\"]\nlet loud = shout(\"quiet\")\nlet e = echo(1)[\"model\"]\n")
        .unwrap();
    assert_eq!(env.get("s"), Some(&Value::Float(0.75)));
    assert_eq!(env.get("loud"), Some(&Value::from("QUIET")));
    assert_eq!(env.get("e"), Some(&Value::from("local")));
}

#[test]
fn test_bad_registry_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{\"name\": \"not a list\"}}").unwrap();
    assert!(matches!(
        OracleRegistry::load(file.path()),
        Err(DispatchError::Configuration(_))
    ));
    assert!(matches!(
        OracleRegistry::load("/nonexistent/oracles.json"),
        Err(DispatchError::Configuration(_))
    ));
}

#[test]
fn test_unsupported_adapter_kind() {
    let registry = OracleRegistry::from_json_str(
        r#"[{"name": "grpc_call", "adapter": {"type": "grpc", "endpoint": "x"}}]"#,
    )
    .unwrap();
    match AdapterDispatcher::new(registry).invoke("grpc_call", &[], &[]) {
        Err(DispatchError::Configuration(message)) => assert!(message.contains("grpc")),
        other => panic!("Expected Configuration error, got {:?}", other),
    }
}
