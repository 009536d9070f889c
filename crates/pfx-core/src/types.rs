//! Value types describing an advertisement
//!
//! - [`Prefix`]: *what* is advertised
//! - [`SourceId`]: *who* advertises it (node within an area)
//! - [`PrefixEntry`]: *how* traffic toward it should be forwarded
//! - [`PrefixKey`]: the key under which the distribution layer carries an
//!   advertisement

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An IP network address plus mask length
///
/// Always held in canonical form: host bits are cleared on construction, so
/// `10.0.0.7/24` and `10.0.0.0/24` are the same prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prefix(IpNet);

impl Prefix {
    /// Create a prefix from a network, truncating host bits
    pub fn new(net: IpNet) -> Self {
        Self(net.trunc())
    }

    /// The underlying network
    pub fn net(&self) -> IpNet {
        self.0
    }

    /// Mask length
    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// Whether this is an IPv4 prefix
    pub fn is_ipv4(&self) -> bool {
        matches!(self.0, IpNet::V4(_))
    }
}

impl From<IpNet> for Prefix {
    fn from(net: IpNet) -> Self {
        Self::new(net)
    }
}

impl FromStr for Prefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let net: IpNet = s
            .trim()
            .parse()
            .map_err(|e| Error::invalid_prefix(format!("{s}: {e}")))?;
        Ok(Self::new(net))
    }
}

impl TryFrom<String> for Prefix {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Prefix> for String {
    fn from(prefix: Prefix) -> Self {
        prefix.to_string()
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one independent advertiser: a node within an area
///
/// The same node advertising in two areas is two distinct sources.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId {
    /// Advertising node name
    pub node_name: String,
    /// Area the advertisement was received in
    pub area: String,
}

impl SourceId {
    /// Create a new source id
    pub fn new(node_name: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            area: area.into(),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.node_name, self.area)
    }
}

/// Route computation algorithm requested for a prefix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardingAlgorithm {
    /// Shortest path, equal-cost multipath
    #[default]
    SpEcmp,
    /// 2-shortest edge-disjoint paths, equal-cost multipath
    Ksp2EdEcmp,
    /// Shortest path, unequal-cost multipath
    SpUcmp,
}

/// Data-plane encapsulation used toward a prefix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardingType {
    /// Plain IP forwarding
    #[default]
    Ip,
    /// Segment-routing MPLS label forwarding
    SrMpls,
}

/// Origin of an advertised prefix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixType {
    #[default]
    Loopback,
    Default,
    Bgp,
    PrefixAllocator,
    Breeze,
    Rib,
    Config,
    Vip,
}

/// Preference metrics carried with an advertisement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefixMetrics {
    /// Higher wins
    #[serde(default)]
    pub path_preference: i32,
    /// Higher wins
    #[serde(default)]
    pub source_preference: i32,
    /// Lower wins
    #[serde(default)]
    pub distance: i32,
}

/// Attributes advertised by one source for one prefix
///
/// Compared by full structural equality: any field difference, including
/// purely informational ones like `tags`, counts as a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixEntry {
    #[serde(default)]
    pub prefix_type: PrefixType,
    #[serde(default)]
    pub forwarding_type: ForwardingType,
    #[serde(default)]
    pub forwarding_algorithm: ForwardingAlgorithm,
    /// Minimum number of nexthops required to program the route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_nexthop: Option<u64>,
    /// Label to push before forwarding (SR-MPLS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepend_label: Option<i32>,
    #[serde(default)]
    pub metrics: PrefixMetrics,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Areas the advertisement has traversed, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub area_stack: Vec<String>,
    /// UCMP weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
}

impl PrefixEntry {
    /// Create an entry with the given forwarding attributes
    pub fn new(forwarding_algorithm: ForwardingAlgorithm, forwarding_type: ForwardingType) -> Self {
        Self {
            forwarding_algorithm,
            forwarding_type,
            ..Self::default()
        }
    }

    pub fn with_prefix_type(mut self, prefix_type: PrefixType) -> Self {
        self.prefix_type = prefix_type;
        self
    }

    pub fn with_metrics(mut self, metrics: PrefixMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_area_stack(mut self, area_stack: Vec<String>) -> Self {
        self.area_stack = area_stack;
        self
    }

    pub fn with_min_nexthop(mut self, min_nexthop: u64) -> Self {
        self.min_nexthop = Some(min_nexthop);
        self
    }

    pub fn with_prepend_label(mut self, label: i32) -> Self {
        self.prepend_label = Some(label);
        self
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// The (algorithm, type) pair compared by conflict detection
    pub fn forwarding_info(&self) -> (ForwardingAlgorithm, ForwardingType) {
        (self.forwarding_algorithm, self.forwarding_type)
    }
}

const PREFIX_KEY_MARKER: &str = "prefix";

/// Key of one advertisement as carried by the distribution layer
///
/// String form: `prefix:<node>:<area>:[<prefix>]`. The node name may not
/// contain `:`, otherwise the string form would not parse back to the same
/// node and area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrefixKey {
    node_name: String,
    area: String,
    prefix: Prefix,
}

impl PrefixKey {
    /// Create a key from its parts
    ///
    /// Fails with [`Error::InvalidKey`] when the node name is empty or
    /// contains `:`, or the area is empty.
    pub fn new(
        node_name: impl Into<String>,
        area: impl Into<String>,
        prefix: Prefix,
    ) -> Result<Self> {
        let node_name = node_name.into();
        let area = area.into();

        if node_name.is_empty() {
            return Err(Error::invalid_key("empty node name"));
        }
        if node_name.contains(':') {
            return Err(Error::invalid_key(format!(
                "node name may not contain ':': {node_name}"
            )));
        }
        if area.is_empty() {
            return Err(Error::invalid_key(format!("empty area for node {node_name}")));
        }

        Ok(Self {
            node_name,
            area,
            prefix,
        })
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    /// The advertiser this key belongs to
    pub fn source_id(&self) -> SourceId {
        SourceId::new(self.node_name.clone(), self.area.clone())
    }
}

impl FromStr for PrefixKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix(PREFIX_KEY_MARKER)
            .and_then(|r| r.strip_prefix(':'))
            .ok_or_else(|| {
                Error::invalid_key(format!("missing '{PREFIX_KEY_MARKER}:' marker: {s}"))
            })?;

        // IPv6 prefixes contain ':' so the bracketed part is located from the end
        let open = rest
            .rfind(":[")
            .ok_or_else(|| Error::invalid_key(format!("missing bracketed prefix: {s}")))?;
        let bracketed = &rest[open + 2..];
        let prefix_str = bracketed
            .strip_suffix(']')
            .ok_or_else(|| Error::invalid_key(format!("unterminated prefix: {s}")))?;

        let (node_name, area) = rest[..open]
            .split_once(':')
            .ok_or_else(|| Error::invalid_key(format!("missing area: {s}")))?;

        let prefix = prefix_str
            .parse::<Prefix>()
            .map_err(|e| Error::invalid_key(format!("{s}: {e}")))?;

        Self::new(node_name, area, prefix)
    }
}

impl TryFrom<String> for PrefixKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<PrefixKey> for String {
    fn from(key: PrefixKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for PrefixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:[{}]",
            PREFIX_KEY_MARKER, self.node_name, self.area, self.prefix
        )
    }
}
