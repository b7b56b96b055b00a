//! Weather tool backed by WeatherAPI's current-conditions endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{Tool, ToolDescriptor, ToolError, ToolOutput};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

/// Validated input for `get_weather`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WeatherInput {
    pub location: String,
    #[serde(default)]
    pub unit: Option<TemperatureUnit>,
}

/// The `current` object of a WeatherAPI response.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CurrentConditions {
    pub temp_c: f64,
    pub temp_f: f64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub humidity: u32,
    pub condition: Condition,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Condition {
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: CurrentConditions,
}

/// Normalized reading returned to the model.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub temperature: i64,
    pub feels_like: i64,
    pub humidity: u32,
    pub description: String,
    pub unit: TemperatureUnit,
    pub location: String,
}

impl WeatherReading {
    pub fn from_conditions(
        conditions: CurrentConditions,
        unit: TemperatureUnit,
        location: String,
    ) -> Self {
        let (temperature, feels_like) = match unit {
            TemperatureUnit::Celsius => (conditions.temp_c, conditions.feelslike_c),
            TemperatureUnit::Fahrenheit => (conditions.temp_f, conditions.feelslike_f),
        };
        Self {
            temperature: round_half_up(temperature),
            feels_like: round_half_up(feels_like),
            humidity: conditions.humidity,
            description: conditions.condition.text,
            unit,
            location,
        }
    }
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Where current conditions come from.
#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, location: &str) -> Result<CurrentConditions, ToolError>;
}

/// WeatherAPI over HTTP.
pub struct WeatherApi {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl WeatherApi {
    pub fn new(api_key: Option<String>, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    fn current_url(&self) -> String {
        format!("{}/v1/current.json", self.base_url.trim_end_matches('/'))
    }
}

fn upstream(cause: impl std::fmt::Display) -> ToolError {
    ToolError::Upstream(format!("Failed to get weather data: {cause}"))
}

#[async_trait::async_trait]
impl WeatherSource for WeatherApi {
    async fn current(&self, location: &str) -> Result<CurrentConditions, ToolError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| upstream("no WeatherAPI key configured"))?;

        let response = self
            .http
            .get(self.current_url())
            .query(&[("key", key), ("q", location), ("aqi", "no")])
            .send()
            .await
            .map_err(upstream)?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "weather request rejected");
            return Err(upstream("Weather service unavailable"));
        }

        let body: CurrentResponse = response.json().await.map_err(upstream)?;
        Ok(body.current)
    }
}

/// `get_weather`: location and unit in, normalized reading out.
pub struct WeatherTool {
    source: Arc<dyn WeatherSource>,
}

impl WeatherTool {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self { source }
    }
}

#[async_trait::async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::Function {
            name: self.name().to_string(),
            description: "Get the current weather in a given location".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city and state, e.g. San Francisco, CA"
                    },
                    "unit": {
                        "type": "string",
                        "enum": ["celsius", "fahrenheit"],
                        "description": "The unit of temperature, either 'celsius' or 'fahrenheit'"
                    }
                },
                "required": ["location"]
            }),
        }
    }

    fn error_context(&self) -> String {
        "Error getting weather data".to_string()
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let input: WeatherInput = serde_json::from_value(input).map_err(ToolError::invalid)?;
        let unit = input.unit.unwrap_or_default();

        let conditions = self.source.current(&input.location).await?;
        let reading = WeatherReading::from_conditions(conditions, unit, input.location);
        let payload = serde_json::to_string(&reading).map_err(upstream)?;
        Ok(ToolOutput::Text(payload))
    }
}
