//! Named and literal network resolution.
//!
//! Every literal CIDR is parsed once and cached by its textual form, so a
//! network shared by several groups or rules is only parsed a single time.

use std::collections::HashMap;
use std::net::IpAddr;

use ipnet::IpNet;
use tracing::debug;

use crate::error::BuildError;
use crate::schema::NetworkGroupConfig;

/// Network groups and the literal-CIDR cache used while compiling rules.
#[derive(Debug, Default)]
pub struct NetworkTable {
    groups: HashMap<String, Vec<IpNet>>,
    cache: HashMap<String, IpNet>,
}

impl NetworkTable {
    /// Resolve every configured group into concrete networks.
    pub fn resolve(groups: &[NetworkGroupConfig]) -> Result<Self, BuildError> {
        let mut table = Self::default();

        for group in groups {
            if table.groups.contains_key(&group.name) {
                return Err(BuildError::DuplicateNetworkGroup {
                    name: group.name.clone(),
                });
            }
            if group.networks.is_empty() {
                return Err(BuildError::EmptyNetworkGroup {
                    name: group.name.clone(),
                });
            }

            let nets = group
                .networks
                .iter()
                .map(|value| table.parse_cached(value))
                .collect::<Result<Vec<_>, _>>()?;

            debug!(group = %group.name, networks = nets.len(), "resolved network group");
            table.groups.insert(group.name.clone(), nets);
        }

        Ok(table)
    }

    /// Resolve a rule's network references, preserving their order.
    ///
    /// Group names take precedence over literals; a reference that is
    /// neither a known group nor a parseable network is fatal.
    pub fn attach(&mut self, rule: usize, refs: &[String]) -> Result<Vec<IpNet>, BuildError> {
        let mut out = Vec::with_capacity(refs.len());

        for reference in refs {
            if let Some(nets) = self.groups.get(reference) {
                out.extend_from_slice(nets);
                continue;
            }

            match self.parse_cached(reference) {
                Ok(net) => out.push(net),
                Err(_) => {
                    return Err(BuildError::UnknownNetwork {
                        rule,
                        name: reference.clone(),
                    })
                }
            }
        }

        Ok(out)
    }

    pub fn group(&self, name: &str) -> Option<&[IpNet]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// Number of distinct literal networks parsed so far.
    pub fn parsed_len(&self) -> usize {
        self.cache.len()
    }

    fn parse_cached(&mut self, value: &str) -> Result<IpNet, BuildError> {
        if let Some(net) = self.cache.get(value) {
            return Ok(*net);
        }

        let net = parse_network(value).map_err(|source| BuildError::InvalidNetwork {
            value: value.to_string(),
            source,
        })?;
        self.cache.insert(value.to_string(), net);
        Ok(net)
    }
}

/// Parse a CIDR, accepting a bare address as a host route.
fn parse_network(value: &str) -> Result<IpNet, ipnet::AddrParseError> {
    let value = value.trim();
    match value.parse::<IpNet>() {
        Ok(net) => Ok(net.trunc()),
        Err(err) => value.parse::<IpAddr>().map(IpNet::from).map_err(|_| err),
    }
}
