//! Read access to compiled contract artifacts.
//!
//! Artifacts follow the Hardhat output layout:
//! `<root>/<source path>/<ContractName>.json` with a sibling
//! `<ContractName>.dbg.json` that points at the `build-info` file holding
//! the compiler version and standard-JSON input used for verification.

use ethers::abi::Abi;
use ethers::types::Bytes;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

const BUILD_INFO_DIR: &str = "build-info";
const DBG_SUFFIX: &str = ".dbg.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found for contract '{0}'")]
    NotFound(String),
    #[error("Contract name '{name}' is ambiguous, use one of: {candidates}")]
    Ambiguous { name: String, candidates: String },
    #[error("Unable to read artifact {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("Malformed artifact {path}: {reason}")]
    Malformed { path: String, reason: String },
    #[error("Contract '{0}' has no deployable bytecode")]
    NotDeployable(String),
    #[error("No build info recorded for contract '{0}'")]
    MissingBuildInfo(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    source_name: String,
    abi: Abi,
    bytecode: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: String,
}

/// A compiled contract: interface plus creation bytecode.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
    path: PathBuf,
}

/// Compiler inputs recorded for a build.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    pub input: serde_json::Value,
}

impl Artifact {
    /// `source:Name`, the form block explorers expect.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ensure_deployable(&self) -> Result<(), ArtifactError> {
        if self.bytecode.is_empty() {
            return Err(ArtifactError::NotDeployable(
                self.contract_name.clone(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `name`, either a bare contract name or `source:Name`.
    pub fn resolve(&self, name: &str) -> Result<Artifact, ArtifactError> {
        let path = match name.rsplit_once(':') {
            Some((source, contract)) => {
                let path =
                    self.root.join(source).join(format!("{}.json", contract));
                if !path.is_file() {
                    return Err(ArtifactError::NotFound(name.to_string()));
                }
                path
            }
            None => self.find_unique(name)?,
        };

        log::debug!("Resolved artifact {} => {}", name, path.display());
        load_artifact(&path)
    }

    pub fn build_info(
        &self,
        artifact: &Artifact,
    ) -> Result<BuildInfo, ArtifactError> {
        let file_name = artifact
            .path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&artifact.contract_name);
        let dbg_path = artifact.path.with_file_name(format!(
            "{}{}",
            file_name, DBG_SUFFIX
        ));

        if !dbg_path.is_file() {
            return Err(ArtifactError::MissingBuildInfo(
                artifact.contract_name.clone(),
            ));
        }

        let dbg: DebugFile = read_json(&dbg_path)?;
        let build_info_path = dbg_path
            .parent()
            .unwrap_or(&self.root)
            .join(&dbg.build_info);

        read_json(&build_info_path)
    }

    fn find_unique(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let file_name = format!("{}.json", name);
        let mut matches = Vec::new();
        collect_matches(&self.root, &file_name, &mut matches)?;

        match matches.len() {
            0 => Err(ArtifactError::NotFound(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => {
                let candidates = matches
                    .iter()
                    .filter_map(|path| {
                        let source = path.parent()?.strip_prefix(&self.root).ok()?;
                        Some(format!("{}:{}", source.display(), name))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(ArtifactError::Ambiguous {
                    name: name.to_string(),
                    candidates,
                })
            }
        }
    }
}

fn collect_matches(
    dir: &Path,
    file_name: &str,
    matches: &mut Vec<PathBuf>,
) -> Result<(), ArtifactError> {
    let entries = fs::read_dir(dir).map_err(|err| ArtifactError::Read {
        path: dir.display().to_string(),
        reason: err.to_string(),
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().map_or(false, |n| n == BUILD_INFO_DIR) {
                continue;
            }
            collect_matches(&path, file_name, matches)?;
        } else if path.file_name().map_or(false, |n| n == file_name) {
            matches.push(path);
        }
    }

    Ok(())
}

fn load_artifact(path: &Path) -> Result<Artifact, ArtifactError> {
    let raw: HardhatArtifact = read_json(path)?;

    let bytecode = crate::clean_hex_string(&raw.bytecode);
    let bytecode = hex::decode(bytecode).map_err(|err| {
        ArtifactError::Malformed {
            path: path.display().to_string(),
            reason: format!("bytecode is not plain hex (unlinked libraries?): {}", err),
        }
    })?;

    Ok(Artifact {
        contract_name: raw.contract_name,
        source_name: raw.source_name,
        abi: raw.abi,
        bytecode: Bytes::from(bytecode),
        path: path.to_path_buf(),
    })
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, ArtifactError> {
    let content = fs::read_to_string(path).map_err(|err| ArtifactError::Read {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|err| ArtifactError::Malformed {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}
