// podmanager-cli - CLI for the podmanager management API
// Copyright (C) 2024 podmanager-cli contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_SERVER: &str = "https://gigapod.myelintek.com";

/// Credentials persisted by `login` and read once per invocation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Session {
    pub target_server: String,
    pub access_token: String,
    /// Unix seconds from the token's `exp` claim; empty when the token carries none.
    #[serde(default)]
    pub expire_at: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
    #[error("credential file {0:?} is not valid base64-encoded JSON")]
    Corrupt(PathBuf),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No valid token found. Please login first.")]
    NotLoggedIn,
    #[error("Token expired at {0}. Please login again.")]
    Expired(String),
}

impl Session {
    pub fn new(target_server: &str, access_token: &str) -> Result<Self> {
        let expire_at = token_expiry(access_token)?
            .map(|exp| exp.to_string())
            .unwrap_or_default();
        Ok(Self {
            target_server: target_server.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            expire_at,
        })
    }

    /// An unreadable expiry counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let raw = self.expire_at.trim();
        if raw.is_empty() {
            return false;
        }
        match raw.parse::<f64>() {
            Ok(exp) => (exp as i64) <= now.timestamp(),
            Err(_) => true,
        }
    }

    pub fn masked(&self) -> Self {
        Self {
            access_token: "*****".into(),
            ..self.clone()
        }
    }

    fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self).context("serializing credentials")?;
        Ok(STANDARD.encode(json))
    }

    fn decode(contents: &str, path: &Path) -> Result<Self> {
        let bytes = STANDARD
            .decode(contents.trim())
            .map_err(|_| ConfigError::Corrupt(path.to_path_buf()))?;
        let session =
            serde_json::from_slice(&bytes).map_err(|_| ConfigError::Corrupt(path.to_path_buf()))?;
        Ok(session)
    }
}

pub fn config_path() -> Result<PathBuf> {
    if let Ok(custom) = env::var("PODMANAGER_CLI_CONFIG_DIR") {
        return Ok(PathBuf::from(custom).join("config"));
    }
    let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
    Ok(base.join("podmanager").join("cli").join("config"))
}

/// Loads the stored session, rejecting missing or expired credentials with [`AuthError`].
pub fn load() -> Result<Session> {
    let session = read()?.ok_or(AuthError::NotLoggedIn)?;
    if session.access_token.trim().is_empty() {
        return Err(AuthError::NotLoggedIn.into());
    }
    if session.is_expired(Utc::now()) {
        return Err(AuthError::Expired(session.expire_at).into());
    }
    Ok(session)
}

/// Reads the stored session as-is, without checking its expiry.
pub fn read() -> Result<Option<Session>> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
    Session::decode(&contents, &path).map(Some)
}

pub fn save(session: &Session) -> Result<PathBuf> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    fs::write(&path, session.encode()?).with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

/// Removes the credential file. Returns whether one existed.
pub fn clear() -> Result<bool> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).with_context(|| format!("removing {:?}", path))?;
    Ok(true)
}

/// Reads the `exp` claim of a JWT without verifying its signature.
pub fn token_expiry(token: &str) -> Result<Option<i64>> {
    let Some(payload) = token.split('.').nth(1) else {
        return Ok(None);
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .context("decoding token payload")?;
    let claims: Value = serde_json::from_slice(&bytes).context("parsing token claims")?;
    Ok(claims
        .get("exp")
        .and_then(|exp| exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))))
}
