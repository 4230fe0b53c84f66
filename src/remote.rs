// remote.rs - HTTP clients for the scene, camera and normal-estimation services
// Purpose: talk to an external simulator over JSON without retrying anything

use crate::capture::CaptureAdapter;
use crate::environment::EnvironmentController;
use crate::errors::{CollectorError, CollectorResult};
use crate::features::NormalEstimator;
use crate::point_cloud::PointCloud;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Point array payload shared by the capture and normals endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct CloudPayload {
    pub points: Vec<[f32; 4]>,
}

#[derive(Debug, Serialize)]
struct SpawnRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct NormalsResponse {
    cluster: Vec<[f32; 3]>,
}

pub fn build_client(timeout_secs: u64) -> CollectorResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CollectorError::network("building http client", e))
}

fn check(service: &str, response: Response) -> CollectorResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(CollectorError::service(
        service,
        format!("HTTP {status}: {}", body.trim()),
    ))
}

/// Scene control over `POST {base}/setup`, `/spawn` and `/delete`.
pub struct RemoteScene {
    client: Client,
    base_url: String,
}

impl RemoteScene {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn post<T: Serialize + ?Sized>(&self, operation: &str, body: &T) -> CollectorResult<()> {
        let url = format!("{}/{operation}", self.base_url);
        debug!(%url, "Scene request");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| CollectorError::network(format!("scene {operation}"), e))?;
        check(operation, response)
            .map(|_| ())
            .map_err(|e| CollectorError::environment(operation, e.to_string()))
    }
}

impl EnvironmentController for RemoteScene {
    fn initial_setup(&mut self) -> CollectorResult<()> {
        self.post("setup", &serde_json::json!({}))
    }

    fn spawn(&mut self, model_name: &str) -> CollectorResult<()> {
        self.post("spawn", &SpawnRequest { name: model_name })
    }

    fn delete(&mut self) -> CollectorResult<()> {
        self.post("delete", &serde_json::json!({}))
    }
}

/// Sensor capture over `GET {base}/capture`; a JSON `null` body is a null reading.
pub struct RemoteCamera {
    client: Client,
    url: String,
}

impl RemoteCamera {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/capture", base_url.trim_end_matches('/')),
        }
    }
}

impl CaptureAdapter for RemoteCamera {
    fn capture_sample(&mut self) -> CollectorResult<Option<PointCloud>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| CollectorError::network("capture", e))?;
        let payload: Option<CloudPayload> = check("capture", response)?
            .json()
            .map_err(|e| CollectorError::network("decoding capture", e))?;
        Ok(payload.map(|p| PointCloud::from_array(&p.points)))
    }
}

/// Normal estimation over `POST {normals_url}`.
pub struct RemoteNormals {
    client: Client,
    url: String,
}

impl RemoteNormals {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl NormalEstimator for RemoteNormals {
    fn get_normals(&mut self, cloud: &PointCloud) -> CollectorResult<Vec<[f32; 3]>> {
        let payload = CloudPayload {
            points: cloud.to_array(),
        };
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .map_err(|e| CollectorError::network("get_normals", e))?;
        let normals: NormalsResponse = check("get_normals", response)?
            .json()
            .map_err(|e| CollectorError::network("decoding normals", e))?;
        Ok(normals.cluster)
    }
}
