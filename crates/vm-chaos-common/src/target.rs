//! Target instance identifiers
//!
//! A target is either a plain instance id or, when scale-set addressing is
//! enabled, a `<scale-set>_<instance>` composite naming one member of a group.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Target parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    /// The target list contains no usable names
    #[error("no target instances provided")]
    Empty,

    /// A scale-set member name is not `<scale-set>_<instance>`
    #[error("scale-set member '{0}' must have the form <scale-set>_<instance>")]
    MalformedScaleSetMember(String),
}

/// An addressable remote instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A standalone instance
    Instance(String),
    /// A member of a scale set (auto scaling group)
    ScaleSetMember {
        scale_set: String,
        instance_id: String,
    },
}

impl Target {
    /// Parse a single target name.
    ///
    /// With `scale_set` enabled the name is split on the first `_`; both
    /// halves must be non-empty.
    pub fn parse(name: &str, scale_set: bool) -> Result<Self, TargetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TargetError::Empty);
        }
        if !scale_set {
            return Ok(Self::Instance(name.to_string()));
        }
        match name.split_once('_') {
            Some((group, id)) if !group.is_empty() && !id.is_empty() => Ok(Self::ScaleSetMember {
                scale_set: group.to_string(),
                instance_id: id.to_string(),
            }),
            _ => Err(TargetError::MalformedScaleSetMember(name.to_string())),
        }
    }

    /// The instance id the control plane addresses
    pub fn instance_id(&self) -> &str {
        match self {
            Self::Instance(id) => id,
            Self::ScaleSetMember { instance_id, .. } => instance_id,
        }
    }

    /// The owning scale set, if any
    pub fn scale_set(&self) -> Option<&str> {
        match self {
            Self::Instance(_) => None,
            Self::ScaleSetMember { scale_set, .. } => Some(scale_set),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(id) => f.write_str(id),
            Self::ScaleSetMember {
                scale_set,
                instance_id,
            } => write!(f, "{scale_set}_{instance_id}"),
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a comma-separated target list, preserving order.
///
/// Blank entries are skipped; an empty result is an error.
pub fn parse_targets(list: &str, scale_set: bool) -> Result<Vec<Target>, TargetError> {
    let targets = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Target::parse(s, scale_set))
        .collect::<Result<Vec<_>, _>>()?;

    if targets.is_empty() {
        return Err(TargetError::Empty);
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_instances_in_order() {
        let targets = parse_targets("i-0abc, i-0def ,i-0123", false).unwrap();
        let names: Vec<String> = targets.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["i-0abc", "i-0def", "i-0123"]);
        assert!(targets.iter().all(|t| t.scale_set().is_none()));
    }

    #[test]
    fn skips_blank_entries() {
        let targets = parse_targets("vm-1,,  ,vm-2,", false).unwrap();
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn empty_list_is_rejected() {
        assert_eq!(parse_targets("", false), Err(TargetError::Empty));
        assert_eq!(parse_targets(" , ,", true), Err(TargetError::Empty));
    }

    #[test]
    fn scale_set_members_split_on_first_underscore() {
        let target = Target::parse("web-asg_i-0abc_x", true).unwrap();
        assert_eq!(target.scale_set(), Some("web-asg"));
        assert_eq!(target.instance_id(), "i-0abc_x");
        assert_eq!(target.to_string(), "web-asg_i-0abc_x");
    }

    #[test]
    fn malformed_scale_set_member() {
        assert_eq!(
            Target::parse("no-separator", true),
            Err(TargetError::MalformedScaleSetMember("no-separator".to_string()))
        );
        assert!(Target::parse("_i-0abc", true).is_err());
        assert!(Target::parse("asg_", true).is_err());
    }

    #[test]
    fn underscore_is_literal_without_scale_set() {
        let target = Target::parse("my_vm", false).unwrap();
        assert_eq!(target, Target::Instance("my_vm".to_string()));
        assert_eq!(target.instance_id(), "my_vm");
    }

    #[test]
    fn serializes_as_display_string() {
        let target = Target::parse("asg_7", true).unwrap();
        assert_eq!(serde_json::to_string(&target).unwrap(), "\"asg_7\"");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn list_order_and_padding(ids in prop::collection::vec("[a-z0-9-]{1,12}", 1..8)) {
                let padded: Vec<String> = ids.iter().map(|id| format!(" {id} ")).collect();
                let targets = parse_targets(&padded.join(","), false).unwrap();
                let names: Vec<String> = targets.iter().map(ToString::to_string).collect();
                prop_assert_eq!(names, ids);
            }

            #[test]
            fn scale_set_display_is_input(group in "[a-z0-9-]{1,8}", id in "[a-z0-9_-]{1,12}") {
                let name = format!("{group}_{id}");
                let target = Target::parse(&name, true).unwrap();
                prop_assert_eq!(target.scale_set(), Some(group.as_str()));
                prop_assert_eq!(target.instance_id(), id.as_str());
                prop_assert_eq!(target.to_string(), name);
            }
        }
    }
}
