use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use seed_sweep_core::contract::{normalize_start_request, stable_contract_json, StartRequest};
use seed_sweep_core::seed_space::SeedSpaceModel;
use seed_sweep_core::tokens::random_hex_id;

use crate::adapters::invoke::DispatchInvoker;
use crate::logging::{log_error, log_info, log_warn};

const COMPONENT: &str = "start_handler";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Validates a job submission, assigns it a fresh job id and hands it to the
/// dispatch function without waiting for dispatch to finish.
pub fn handle_start_event(
    event: Value,
    seed_space: &SeedSpaceModel,
    invoker: &dyn DispatchInvoker,
) -> ApiGatewayResponse {
    handle_start_event_with_job_id(event, seed_space, invoker, random_hex_id())
}

pub fn handle_start_event_with_job_id(
    event: Value,
    seed_space: &SeedSpaceModel,
    invoker: &dyn DispatchInvoker,
    job_id: String,
) -> ApiGatewayResponse {
    let payload = match normalize_apigw_event(event) {
        Ok(value) => value,
        Err(message) => return validation_error_response(&job_id, &message),
    };

    let request = match serde_json::from_value::<StartRequest>(payload) {
        Ok(value) => value,
        Err(error) => {
            return validation_error_response(&job_id, &format!("Malformed request: {error}"))
        }
    };

    let job = match normalize_start_request(request, seed_space) {
        Ok(value) => value.into_job(job_id),
        Err(error) => return validation_error_response(&job_id, error.message()),
    };

    let payload = stable_contract_json(&job);
    if let Err(error) = invoker.invoke_dispatch_async(payload.as_bytes()) {
        log_error(
            COMPONENT,
            "dispatch_invoke_failed",
            &job.job_id,
            json!({ "error": error.clone() }),
        );
        return error_response(
            502,
            json!({
                "error": "dispatch_failed",
                "message": error,
                "job_id": job.job_id,
            }),
        );
    }

    log_info(
        COMPONENT,
        "job_submitted",
        &job.job_id,
        json!({ "prng": job.prng.clone(), "depth": job.depth }),
    );
    ApiGatewayResponse {
        status_code: 200,
        headers: json!({"Content-Type": "application/json"}),
        body: payload,
    }
}

fn normalize_apigw_event(event: Value) -> Result<Value, String> {
    let Some(object) = event.as_object() else {
        return Err("Request payload must be a JSON object".to_string());
    };

    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Null => Err("no http body".to_string()),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) if text.trim().is_empty() => Err("no http body".to_string()),
        Value::String(text) => {
            serde_json::from_str(text).map_err(|error| format!("Malformed JSON body: {error}"))
        }
        _ => Err("Request body must be a JSON object".to_string()),
    }
}

fn validation_error_response(job_id: &str, message: &str) -> ApiGatewayResponse {
    log_warn(
        COMPONENT,
        "start_request_rejected",
        job_id,
        json!({ "error": message }),
    );
    error_response(400, json!({ "error": message }))
}

fn error_response(status_code: u16, payload: Value) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body: payload.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use seed_sweep_core::contract::Job;

    use super::*;

    struct CapturingInvoker {
        payloads: Mutex<Vec<Vec<u8>>>,
        fail: bool,
    }

    impl CapturingInvoker {
        fn new() -> Self {
            Self {
                payloads: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn payloads(&self) -> Vec<Vec<u8>> {
            self.payloads.lock().expect("poisoned mutex").clone()
        }
    }

    impl DispatchInvoker for CapturingInvoker {
        fn invoke_dispatch_async(&self, payload: &[u8]) -> Result<(), String> {
            if self.fail {
                return Err("TooManyRequestsException".to_string());
            }
            self.payloads
                .lock()
                .expect("poisoned mutex")
                .push(payload.to_vec());
            Ok(())
        }
    }

    fn error_of(response: &ApiGatewayResponse) -> String {
        let body: Value = serde_json::from_str(&response.body).expect("body should parse");
        body["error"].as_str().unwrap_or_default().to_string()
    }

    #[test]
    fn rejects_unsupported_prng_without_dispatching() {
        let invoker = CapturingInvoker::new();
        let response = handle_start_event(
            json!({"body": "{\"observations\":[1,2],\"prng\":\"xorshift\",\"depth\":10}"}),
            &SeedSpaceModel::default(),
            &invoker,
        );

        assert_eq!(response.status_code, 400);
        assert_eq!(error_of(&response), "unsupported prng");
        assert_eq!(response.body, r#"{"error":"unsupported prng"}"#);
        assert!(invoker.payloads().is_empty());
    }

    #[test]
    fn rejects_missing_body() {
        let invoker = CapturingInvoker::new();
        let response =
            handle_start_event(json!({"body": ""}), &SeedSpaceModel::default(), &invoker);

        assert_eq!(response.status_code, 400);
        assert_eq!(error_of(&response), "no http body");
        assert!(invoker.payloads().is_empty());
    }

    #[test]
    fn rejects_malformed_json_body() {
        let invoker = CapturingInvoker::new();
        let response = handle_start_event(
            json!({"body": "{\"observations\":"}),
            &SeedSpaceModel::default(),
            &invoker,
        );

        assert_eq!(response.status_code, 400);
        assert!(error_of(&response).starts_with("Malformed JSON body"));
    }

    #[test]
    fn dispatches_job_with_assigned_id() {
        let invoker = CapturingInvoker::new();
        let response = handle_start_event_with_job_id(
            json!({
                "body": {
                    "observations": [1804289383, 846930886],
                    "prng": "glibc-rand",
                    "depth": 1000
                }
            }),
            &SeedSpaceModel::default(),
            &invoker,
            "0f0e0d0c0b0a09080706050403020100".to_string(),
        );

        assert_eq!(response.status_code, 200);
        let payloads = invoker.payloads();
        assert_eq!(payloads.len(), 1);

        let job: Job = serde_json::from_slice(&payloads[0]).expect("payload should parse");
        assert_eq!(job.job_id, "0f0e0d0c0b0a09080706050403020100");
        assert_eq!(job.prng, "glibc-rand");
        assert_eq!(job.observations, vec![1804289383, 846930886]);

        let echoed: Job = serde_json::from_str(&response.body).expect("body should parse");
        assert_eq!(echoed, job);
    }

    #[test]
    fn generated_job_ids_are_hex() {
        let invoker = CapturingInvoker::new();
        let response = handle_start_event(
            json!({"observations": [5], "prng": "java", "depth": 0}),
            &SeedSpaceModel::default(),
            &invoker,
        );

        assert_eq!(response.status_code, 200);
        let job: Job = serde_json::from_str(&response.body).expect("body should parse");
        assert_eq!(job.job_id.len(), 32);
        assert!(job.job_id.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn invoke_failure_maps_to_bad_gateway() {
        let invoker = CapturingInvoker {
            fail: true,
            ..CapturingInvoker::new()
        };
        let response = handle_start_event(
            json!({"body": {"observations": [1], "prng": "mt19937", "depth": 1}}),
            &SeedSpaceModel::default(),
            &invoker,
        );

        assert_eq!(response.status_code, 502);
        assert!(response.body.contains("TooManyRequestsException"));
    }
}
