// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, default values, and the [`RelayConfig`] loaded
//! from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `RELAY_CACHE_CAPACITY` | Maximum entries held by the shared cache | `1024` |
//! | `RELAY_DEDUP_PARTICIPANTS` | Drop already-registered participants on join | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use tracing::warn;

use crate::storage::DEFAULT_CAPACITY;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the shared cache capacity.
///
/// Sessions and mailboxes share this ceiling. Once reached, the least recently
/// used entry is evicted, which peers observe as lost state.
pub const CACHE_CAPACITY_ENV: &str = "RELAY_CACHE_CAPACITY";

/// Environment variable name for participant de-duplication on join.
///
/// Off by default: a rejoining peer is appended again.
pub const DEDUP_PARTICIPANTS_ENV: &str = "RELAY_DEDUP_PARTICIPANTS";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub cache_capacity: usize,
    pub dedup_participants: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cache_capacity: DEFAULT_CAPACITY,
            dedup_participants: false,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source. Invalid values fall
    /// back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = lookup(HOST_ENV)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);

        let cache_capacity = parse_or(
            CACHE_CAPACITY_ENV,
            lookup(CACHE_CAPACITY_ENV),
            defaults.cache_capacity,
        );
        let cache_capacity = if cache_capacity == 0 {
            warn!(variable = CACHE_CAPACITY_ENV, "Capacity must be positive, using 1");
            1
        } else {
            cache_capacity
        };

        Self {
            host,
            port: parse_or(PORT_ENV, lookup(PORT_ENV), defaults.port),
            cache_capacity,
            dedup_participants: parse_flag(
                DEDUP_PARTICIPANTS_ENV,
                lookup(DEDUP_PARTICIPANTS_ENV),
                defaults.dedup_participants,
            ),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Whether `LOG_FORMAT` selects JSON output.
pub fn json_logging() -> bool {
    env::var(LOG_FORMAT_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            warn!(
                variable = name,
                value = %raw,
                error = %e,
                default = %default,
                "Invalid value, using default"
            );
            default
        }
    }
}

fn parse_flag(name: &str, raw: Option<String>, default: bool) -> bool {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(variable = name, value = %raw, default, "Invalid flag, using default");
            default
        }
    }
}
