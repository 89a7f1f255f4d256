//! Sequence mode for a chaos run

/// How targets are processed within one chaos iteration
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SequenceMode {
    /// One target at a time: inject, wait, revert, then the next target
    #[default]
    Serial,
    /// All targets at once: fan-out inject, wait, fan-in, fan-out revert
    Parallel,
}
