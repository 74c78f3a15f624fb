//! Blocking client for the TensorFlow Serving REST predict API.

use log::error;
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use serde_json::{json, Value};

use crate::config::ServingConfig;
use crate::error::{Error, Result};
use crate::inference::Predictor;

/// Nested JSON arrays in row-major order; a 0-d array becomes a bare number.
pub fn to_nested_json(array: &ArrayViewD<'_, f32>) -> Value {
    if array.ndim() == 0 {
        return array
            .iter()
            .next()
            .map(|&v| Value::from(f64::from(v)))
            .unwrap_or(Value::Null);
    }
    Value::Array(array.outer_iter().map(|row| to_nested_json(&row)).collect())
}

/// `{"signature_name": ..., "inputs": [...]}` in the columnar request format.
pub fn predict_body(config: &ServingConfig, inputs: &ArrayViewD<'_, f32>) -> Value {
    json!({
        "signature_name": config.signature_name,
        "inputs": to_nested_json(inputs),
    })
}

/// Converts a rectangular nested JSON array of numbers into an array.
pub fn from_nested_json(value: &Value) -> Result<ArrayD<f32>> {
    let mut shape = Vec::new();
    let mut probe = value;
    while let Value::Array(items) = probe {
        shape.push(items.len());
        match items.first() {
            Some(first) => probe = first,
            None => break,
        }
    }

    let mut values = Vec::with_capacity(shape.iter().product());
    flatten_into(value, &shape, &mut values)?;
    Ok(ArrayD::from_shape_vec(IxDyn(&shape), values)?)
}

fn flatten_into(value: &Value, shape: &[usize], out: &mut Vec<f32>) -> Result<()> {
    match (value, shape.split_first()) {
        (Value::Array(items), Some((&len, rest))) => {
            if items.len() != len {
                return Err(Error::MalformedOutputs(format!(
                    "ragged array: expected {} elements, found {}",
                    len,
                    items.len()
                )));
            }
            for item in items {
                flatten_into(item, rest, out)?;
            }
            Ok(())
        }
        (Value::Number(n), None) => {
            let v = n
                .as_f64()
                .ok_or_else(|| Error::MalformedOutputs(format!("{} is not representable", n)))?;
            out.push(v as f32);
            Ok(())
        }
        (other, _) => Err(Error::MalformedOutputs(format!(
            "unexpected {} in outputs",
            match other {
                Value::Null => "null",
                Value::Bool(_) => "boolean",
                Value::String(_) => "string",
                Value::Object(_) => "object",
                Value::Array(_) => "nested array",
                Value::Number(_) => "number",
            }
        ))),
    }
}

/// Extracts the predictions from a predict response body.
///
/// A single-output signature answers `{"outputs": [...]}`; a multi-output one
/// answers `{"outputs": {"<name>": [...], ...}}`.
pub fn decode_outputs(body: &Value, output_name: &str) -> Result<ArrayD<f32>> {
    let outputs = body
        .get("outputs")
        .ok_or_else(|| Error::MissingOutputs("outputs".to_string()))?;
    match outputs {
        Value::Object(named) => {
            let output = named
                .get(output_name)
                .ok_or_else(|| Error::MissingOutputs(format!("outputs.{}", output_name)))?;
            from_nested_json(output)
        }
        other => from_nested_json(other),
    }
}

pub struct RestClient {
    agent: ureq::Agent,
    url: String,
    config: ServingConfig,
}

impl RestClient {
    pub fn new(config: ServingConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .build();
        Self {
            agent,
            url: config.predict_url(),
            config,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn post(&self, body: &Value) -> Result<Value> {
        let payload = serde_json::to_string(body)?;
        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(&payload)
            .map_err(|e| match e {
                ureq::Error::Status(code, response) => Error::HttpStatus {
                    code,
                    body: response.into_string().unwrap_or_default(),
                },
                ureq::Error::Transport(t) => Error::HttpTransport(t.to_string()),
            })?;
        Ok(serde_json::from_reader(response.into_reader())?)
    }
}

impl Predictor for RestClient {
    fn predict(&mut self, inputs: &ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        let body = predict_body(&self.config, inputs);
        let response = self.post(&body).inspect_err(|e| {
            error!("Request failed. Error: {}", e);
        })?;
        decode_outputs(&response, &self.config.output_name)
    }
}
