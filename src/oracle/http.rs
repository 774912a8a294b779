//! `remote-http` adapter: one blocking JSON request per oracle call.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use crate::eval::Value;

use super::definition::AdapterSpec;
use super::types::{DispatchError, DispatchResult};

lazy_static! {
    static ref ENV_REF: Regex = Regex::new(r"\$\{env:([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\$\{(model|name|args|kwargs)(?:\.([A-Za-z0-9_]+))?\}").unwrap();
}

/// What a payload template can refer to.
pub struct CallPayload<'a> {
    pub model: &'a str,
    pub name: &'a str,
    pub args: &'a [Value],
    pub kwargs: &'a [(String, Value)],
}

impl CallPayload<'_> {
    fn args_json(&self) -> JsonValue {
        JsonValue::Array(self.args.iter().map(JsonValue::from).collect())
    }

    fn kwargs_json(&self) -> JsonValue {
        JsonValue::Object(
            self.kwargs
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::from(v)))
                .collect::<Map<_, _>>(),
        )
    }

    fn default_body(&self) -> JsonValue {
        json!({
            "model": self.model,
            "name": self.name,
            "args": self.args_json(),
            "kwargs": self.kwargs_json(),
        })
    }

    fn lookup(&self, root: &str, field: Option<&str>) -> Option<JsonValue> {
        match (root, field) {
            ("model", None) => Some(JsonValue::String(self.model.to_string())),
            ("name", None) => Some(JsonValue::String(self.name.to_string())),
            ("args", None) => Some(self.args_json()),
            ("kwargs", None) => Some(self.kwargs_json()),
            ("args", Some(index)) => index
                .parse::<usize>()
                .ok()
                .and_then(|i| self.args.get(i))
                .map(JsonValue::from),
            ("kwargs", Some(key)) => self
                .kwargs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| JsonValue::from(v)),
            _ => None,
        }
    }

    /// Fills a payload template. A string that is exactly one placeholder is
    /// replaced by the JSON value; placeholders inside longer strings are
    /// interpolated as text.
    pub fn render(&self, template: &JsonValue) -> JsonValue {
        match template {
            JsonValue::String(text) => {
                if let Some(caps) = PLACEHOLDER.captures(text) {
                    if caps[0].len() == text.len() {
                        let field = caps.get(2).map(|m| m.as_str());
                        if let Some(value) = self.lookup(&caps[1], field) {
                            return value;
                        }
                    }
                }
                let rendered = PLACEHOLDER.replace_all(text, |caps: &Captures| {
                    let field = caps.get(2).map(|m| m.as_str());
                    match self.lookup(&caps[1], field) {
                        Some(JsonValue::String(s)) => s,
                        Some(other) => other.to_string(),
                        None => caps[0].to_string(),
                    }
                });
                JsonValue::String(rendered.into_owned())
            }
            JsonValue::Array(items) => {
                JsonValue::Array(items.iter().map(|item| self.render(item)).collect())
            }
            JsonValue::Object(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), self.render(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Request settings read from a `remote-http` adapter spec.
pub struct HttpAdapter {
    url: String,
    method: Method,
    headers: Vec<(String, SecretString)>,
    payload: Option<JsonValue>,
}

impl HttpAdapter {
    pub fn from_spec(spec: &AdapterSpec) -> DispatchResult<Self> {
        let url = spec.required_str("url")?.to_string();
        let method = spec
            .optional_str("method")?
            .unwrap_or("POST")
            .to_ascii_uppercase()
            .parse::<Method>()
            .map_err(|e| DispatchError::Configuration(format!("invalid HTTP method: {}", e)))?;

        let mut headers = Vec::new();
        match spec.parameters.get("headers") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Object(entries)) => {
                for (name, value) in entries {
                    let value = value.as_str().ok_or_else(|| {
                        DispatchError::Configuration(format!(
                            "header '{}' must be a string",
                            name
                        ))
                    })?;
                    headers.push((name.clone(), resolve_env_refs(value)?));
                }
            }
            Some(_) => {
                return Err(DispatchError::Configuration(
                    "headers must be an object of strings".to_string(),
                ))
            }
        }

        Ok(Self {
            url,
            method,
            headers,
            payload: spec.parameters.get("payload").cloned(),
        })
    }

    pub fn invoke(&self, client: &Client, call: &CallPayload<'_>) -> DispatchResult<Value> {
        let body = match &self.payload {
            Some(template) => call.render(template),
            None => call.default_body(),
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                DispatchError::Configuration(format!("invalid header name '{}': {}", name, e))
            })?;
            let mut value = HeaderValue::from_str(value.expose_secret()).map_err(|e| {
                DispatchError::Configuration(format!("invalid value for header {}: {}", name, e))
            })?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        debug!("{} {} for oracle {}", self.method, self.url, call.name);
        let response = client
            .request(self.method.clone(), &self.url)
            .headers(headers)
            .json(&body)
            .send()
            .map_err(|e| DispatchError::AdapterInvocation(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(DispatchError::AdapterInvocation(format!(
                "{} returned {}: {}",
                self.url, status, text
            )));
        }

        let json: JsonValue = response.json().map_err(|e| {
            DispatchError::AdapterInvocation(format!("response is not valid JSON: {}", e))
        })?;
        Ok(Value::from(json))
    }
}

/// Replaces every `${env:NAME}` with the variable's value.
fn resolve_env_refs(value: &str) -> DispatchResult<SecretString> {
    let mut missing = None;
    let resolved = ENV_REF.replace_all(value, |caps: &Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| {
            missing.get_or_insert_with(|| caps[1].to_string());
            String::new()
        })
    });
    match missing {
        Some(name) => Err(DispatchError::Configuration(format!(
            "environment variable {} is not set",
            name
        ))),
        None => Ok(SecretString::from(resolved.into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::AdapterKind;
    use pretty_assertions::assert_eq;

    fn call_payload<'a>(args: &'a [Value], kwargs: &'a [(String, Value)]) -> CallPayload<'a> {
        CallPayload {
            model: "m-1",
            name: "ask",
            args,
            kwargs,
        }
    }

    #[test]
    fn test_default_body() {
        let args = [Value::Integer(1)];
        let kwargs = [("prompt".to_string(), Value::from("hi"))];
        assert_eq!(
            call_payload(&args, &kwargs).default_body(),
            json!({"model": "m-1", "name": "ask", "args": [1], "kwargs": {"prompt": "hi"}})
        );
    }

    #[test]
    fn test_render_template() {
        let args = [Value::Integer(7)];
        let kwargs = [("prompt".to_string(), Value::from("hello"))];
        let template = json!({
            "model": "${model}",
            "input": "${kwargs}",
            "messages": [{"role": "user", "content": "Q(${args.0}): ${kwargs.prompt}"}],
            "untouched": "${other}",
            "n": 3
        });
        assert_eq!(
            call_payload(&args, &kwargs).render(&template),
            json!({
                "model": "m-1",
                "input": {"prompt": "hello"},
                "messages": [{"role": "user", "content": "Q(7): hello"}],
                "untouched": "${other}",
                "n": 3
            })
        );
    }

    #[test]
    fn test_env_header_resolution() {
        std::env::set_var("AISSEMBLY_TEST_TOKEN", "s3cret");
        let secret = resolve_env_refs("Bearer ${env:AISSEMBLY_TEST_TOKEN}").unwrap();
        assert_eq!(secret.expose_secret(), "Bearer s3cret");
        assert!(matches!(
            resolve_env_refs("${env:AISSEMBLY_SURELY_UNSET_VAR}"),
            Err(DispatchError::Configuration(_))
        ));
    }

    #[test]
    fn test_spec_requires_url() {
        let spec = AdapterSpec::new(AdapterKind::RemoteHttp);
        assert!(matches!(
            HttpAdapter::from_spec(&spec),
            Err(DispatchError::Configuration(_))
        ));
    }
}
