//! HTTP toxics applied through a proxy on the target

use serde::Serialize;
use tracing::info;

use super::{FaultConfig, FaultError};
use crate::defaults;
use crate::script::ParameterSet;

/// A single network toxic
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum HttpToxic {
    Latency,
    Timeout,
    RateLimit,
    DataLimit,
}

/// Parse a comma-separated toxic list, preserving order and skipping blanks.
pub fn parse_toxics(list: &str) -> Result<Vec<HttpToxic>, FaultError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<HttpToxic>().map_err(|_| FaultError::Unsupported {
                field: "HTTP_CHAOS_TYPE",
                value: s.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct HttpFaultConfig {
    pub toxics: Vec<HttpToxic>,
    /// Port the proxy listens on
    pub listen_port: u16,
    /// Port of the proxied service
    pub stream_port: u16,
    /// `upstream` or `downstream`
    pub stream_type: String,
    pub latency_ms: u64,
    pub request_timeout_ms: u64,
    pub rate_limit: u64,
    pub data_limit: u64,
}

impl Default for HttpFaultConfig {
    fn default() -> Self {
        Self {
            toxics: vec![HttpToxic::Latency],
            listen_port: defaults::DEFAULT_LISTEN_PORT,
            stream_port: defaults::DEFAULT_STREAM_PORT,
            stream_type: defaults::DEFAULT_STREAM_TYPE.to_string(),
            latency_ms: defaults::DEFAULT_LATENCY_MS,
            request_timeout_ms: defaults::DEFAULT_REQUEST_TIMEOUT_MS,
            rate_limit: defaults::DEFAULT_RATE_LIMIT,
            data_limit: defaults::DEFAULT_DATA_LIMIT,
        }
    }
}

impl HttpFaultConfig {
    /// Name of the proxy toxic, shared by inject and revert
    pub fn toxic_name(&self) -> String {
        format!("{}_chaos", self.stream_type)
    }

    fn value_of(&self, toxic: HttpToxic) -> u64 {
        match toxic {
            HttpToxic::Latency => self.latency_ms,
            HttpToxic::Timeout => self.request_timeout_ms,
            HttpToxic::RateLimit => self.rate_limit,
            HttpToxic::DataLimit => self.data_limit,
        }
    }
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(",")
}

pub(super) fn inject_parameters(config: &FaultConfig) -> Result<ParameterSet, FaultError> {
    let http = &config.http;
    if http.toxics.is_empty() {
        return Err(FaultError::Empty {
            field: "HTTP_CHAOS_TYPE",
        });
    }

    let toxic_types = join(http.toxics.iter());
    let toxic_values = join(http.toxics.iter().map(|t| http.value_of(*t)));

    info!(
        toxics = %toxic_types,
        values = %toxic_values,
        listen_port = http.listen_port,
        stream_port = http.stream_port,
        stream_type = %http.stream_type,
        "[Info]: Details of HTTP chaos"
    );

    Ok(ParameterSet::new()
        .with("InstallDependency", config.install_flag())
        .with("ToxicName", http.toxic_name())
        .with("ListenPort", http.listen_port.to_string())
        .with("StreamType", http.stream_type.as_str())
        .with("StreamPort", http.stream_port.to_string())
        .with("ToxicType", toxic_types)
        .with("ToxicValue", toxic_values))
}

pub(super) fn revert_parameters(config: &FaultConfig) -> Result<ParameterSet, FaultError> {
    Ok(ParameterSet::new().with("ToxicName", config.http.toxic_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FaultType, test_config};

    #[test]
    fn parses_toxic_list_in_order() {
        let toxics = parse_toxics("rate-limit, latency,,Data-Limit").unwrap();
        assert_eq!(
            toxics,
            [HttpToxic::RateLimit, HttpToxic::Latency, HttpToxic::DataLimit]
        );
        assert!(parse_toxics(" ").unwrap().is_empty());
    }

    #[test]
    fn unknown_toxic_is_unsupported() {
        assert_eq!(
            parse_toxics("latency,jitter"),
            Err(FaultError::Unsupported {
                field: "HTTP_CHAOS_TYPE",
                value: "jitter".to_string(),
            })
        );
    }

    #[test]
    fn inject_parameters_follow_script_contract() {
        let mut config = test_config(FaultType::Http);
        config.http.toxics = vec![HttpToxic::Latency, HttpToxic::Timeout];
        config.http.latency_ms = 1500;
        config.http.request_timeout_ms = 300;

        let params = inject_parameters(&config).unwrap();
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "InstallDependency",
                "ToxicName",
                "ListenPort",
                "StreamType",
                "StreamPort",
                "ToxicType",
                "ToxicValue",
            ]
        );
        assert_eq!(params.get("InstallDependency"), Some("True"));
        assert_eq!(params.get("ToxicName"), Some("upstream_chaos"));
        assert_eq!(params.get("ListenPort"), Some("20000"));
        assert_eq!(params.get("StreamPort"), Some("6379"));
        assert_eq!(params.get("ToxicType"), Some("latency,timeout"));
        assert_eq!(params.get("ToxicValue"), Some("1500,300"));
    }

    #[test]
    fn empty_toxic_list_fails_to_build() {
        let mut config = test_config(FaultType::Http);
        config.http.toxics.clear();
        assert_eq!(
            inject_parameters(&config),
            Err(FaultError::Empty {
                field: "HTTP_CHAOS_TYPE"
            })
        );
    }

    #[test]
    fn revert_uses_stream_specific_toxic_name() {
        let mut config = test_config(FaultType::Http);
        config.http.stream_type = "downstream".to_string();
        let params = revert_parameters(&config).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("ToxicName"), Some("downstream_chaos"));
    }
}
