// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request as seen by the mock API server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

/// One canned answer of the mock API server
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(u16, String),
    /// Fail the transport, as a dropped connection would
    Fail,
}

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// Every request is recorded so tests can assert on the mutations issued.
/// Unmatched requests get a 404. A reply sequence is served in order and
/// its last reply repeats.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), Vec<Reply>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response for requests with this method and exact path
    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.on_sequence(method, path, vec![Reply::Respond(status, body.to_string())])
    }

    /// Answer successive requests with this method and path with `replies` in order
    pub fn on_sequence(self, method: &str, path: &str, replies: Vec<Reply>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), replies);
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Fail the transport for this request, as a dropped connection would
    pub fn fail(self, method: &str, path: &str) -> Self {
        self.on_sequence(method, path, vec![Reply::Fail])
    }

    /// Build a kube Client from this mock service; the mock stays inspectable
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests with this method and path
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<Reply> {
        let mut responses = self.responses.lock().unwrap();
        let replies = responses.get_mut(&(method.to_string(), path.to_string()))?;
        if replies.len() > 1 {
            Some(replies.remove(0))
        } else {
            replies.first().cloned()
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let bytes = req
                .into_body()
                .collect()
                .await
                .map(|collected| collected.to_bytes())
                .unwrap_or_default();
            let body = serde_json::from_slice(&bytes).ok();
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path: path.clone(),
                body,
            });

            let (status, body) = match response {
                Some(Reply::Respond(status, body)) => (status, body),
                Some(Reply::Fail) => return Err(format!("connection refused: {}", path).into()),
                None => (404, not_found_json("resource", &path)),
            };

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// API path of a namespaced ConfigMap
pub fn configmap_path(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{}/configmaps/{}", namespace, name)
}

/// API path of the ConfigMap collection in a namespace
pub fn configmaps_path(namespace: &str) -> String {
    format!("/api/v1/namespaces/{}/configmaps", namespace)
}

/// API path of a namespaced Secret
pub fn secret_path(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{}/secrets/{}", namespace, name)
}

/// API path of the Secret collection in a namespace
pub fn secrets_path(namespace: &str) -> String {
    format!("/api/v1/namespaces/{}/secrets", namespace)
}

pub fn label_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Create a mock ConfigMap JSON object
pub fn configmap_json(
    name: &str,
    namespace: &str,
    labels: &[(&str, &str)],
    data: &[(&str, &str)],
) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("uid-{}-{}", namespace, name),
            "resourceVersion": "100",
            "labels": label_map(labels),
        },
        "data": label_map(data),
    })
    .to_string()
}

/// Create a mock Secret JSON object; data values are given in plain text
pub fn secret_json(
    name: &str,
    namespace: &str,
    labels: &[(&str, &str)],
    data: &[(&str, &str)],
) -> String {
    let encoded: BTreeMap<String, k8s_openapi::ByteString> = data
        .iter()
        .map(|(k, v)| (k.to_string(), k8s_openapi::ByteString(v.as_bytes().to_vec())))
        .collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "type": "Opaque",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("uid-{}-{}", namespace, name),
            "resourceVersion": "100",
            "labels": label_map(labels),
        },
        "data": encoded,
    })
    .to_string()
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a Status failure response with the given code and reason
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// Create a 409 already exists response
pub fn already_exists_json(resource: &str, name: &str) -> String {
    status_json(
        409,
        "AlreadyExists",
        &format!("{} \"{}\" already exists", resource, name),
    )
}

/// One line of a watch response body
pub fn watch_event_line(event_type: &str, object: &str) -> String {
    format!("{{\"type\":\"{}\",\"object\":{}}}\n", event_type, object)
}
