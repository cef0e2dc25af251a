//! Source verification against an Etherscan-compatible explorer.

use std::time::Duration;

use chainkit_common::artifacts::{Artifact, ArtifactStore};
use ethers::{
    abi::Token,
    etherscan::{
        verify::{CodeFormat, VerifyContract},
        Client,
    },
    types::{Address, Chain as NamedChain},
};

use crate::errors::TaskError;

const VERIFICATION_POLL_INTERVAL: Duration = Duration::from_secs(10);
const VERIFICATION_MAX_POLLS: usize = 12;

/// What the verifier is asked to match.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRequest {
    pub address: Address,
    pub constructor_args: Vec<Token>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
}

/// Interpretation of an explorer status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    AlreadyVerified,
    Failed(String),
}

impl VerificationStatus {
    pub fn classify(message: &str) -> Self {
        let lowered = message.to_lowercase();
        if lowered.contains("pending in queue") {
            VerificationStatus::Pending
        } else if lowered.contains("already verified") {
            VerificationStatus::AlreadyVerified
        } else if lowered.contains("pass - verified") {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Failed(message.to_string())
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Verifier {
    async fn verify(
        &self,
        artifact: &Artifact,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, TaskError>;
}

pub struct EtherscanVerifier {
    client: Client,
    artifacts: ArtifactStore,
    poll_interval: Duration,
    max_polls: usize,
}

impl EtherscanVerifier {
    pub fn new(
        chain_id: u64,
        api_key: &str,
        artifacts: ArtifactStore,
    ) -> Result<Self, TaskError> {
        let chain = NamedChain::try_from(chain_id).map_err(|_| {
            TaskError::Config(format!(
                "Chain id {} has no known block explorer",
                chain_id
            ))
        })?;

        let client = Client::new(chain, api_key).map_err(|err_code| {
            TaskError::Config(format!(
                "Unable to create explorer client for {} :: {}",
                chain, err_code
            ))
        })?;

        Ok(Self {
            client,
            artifacts,
            poll_interval: VERIFICATION_POLL_INTERVAL,
            max_polls: VERIFICATION_MAX_POLLS,
        })
    }

    fn build_submission(
        &self,
        artifact: &Artifact,
        request: &VerificationRequest,
    ) -> Result<VerifyContract, TaskError> {
        let build_info = self.artifacts.build_info(artifact)?;

        let source = serde_json::to_string(&build_info.input).map_err(|err_code| {
            TaskError::Verification(format!(
                "Unable to serialize compiler input :: {}",
                err_code
            ))
        })?;

        let constructor_args = (!request.constructor_args.is_empty())
            .then(|| hex::encode(ethers::abi::encode(&request.constructor_args)));

        Ok(VerifyContract::new(
            request.address,
            artifact.fully_qualified_name(),
            source,
            format!("v{}", build_info.solc_long_version),
        )
        .code_format(CodeFormat::StandardJsonInput)
        .constructor_arguments(constructor_args))
    }

    async fn poll_status(&self, guid: &str) -> Result<VerificationOutcome, TaskError> {
        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let message = match self
                .client
                .check_contract_verification_status(guid)
                .await
            {
                Ok(response) => response.result,
                Err(err_code) => err_code.to_string(),
            };

            log::info!(
                "Verification {} status [{}/{}] :: {}",
                guid,
                attempt,
                self.max_polls,
                message
            );

            match VerificationStatus::classify(&message) {
                VerificationStatus::Pending => continue,
                VerificationStatus::Verified => {
                    return Ok(VerificationOutcome::Verified)
                }
                VerificationStatus::AlreadyVerified => {
                    return Ok(VerificationOutcome::AlreadyVerified)
                }
                VerificationStatus::Failed(reason) => {
                    return Err(TaskError::Verification(reason))
                }
            }
        }

        Err(TaskError::Verification(format!(
            "Verification {} still pending after {} checks",
            guid, self.max_polls
        )))
    }
}

impl Verifier for EtherscanVerifier {
    async fn verify(
        &self,
        artifact: &Artifact,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, TaskError> {
        let submission = self.build_submission(artifact, request)?;

        let response = match self
            .client
            .submit_contract_verification(&submission)
            .await
        {
            Ok(response) => response,
            Err(err_code) => {
                return match VerificationStatus::classify(&err_code.to_string()) {
                    VerificationStatus::AlreadyVerified => {
                        Ok(VerificationOutcome::AlreadyVerified)
                    }
                    _ => Err(TaskError::Verification(err_code.to_string())),
                }
            }
        };

        if response.status != "1" {
            return match VerificationStatus::classify(&response.result) {
                VerificationStatus::AlreadyVerified => {
                    Ok(VerificationOutcome::AlreadyVerified)
                }
                _ => Err(TaskError::Verification(response.result)),
            };
        }

        log::info!(
            "Submitted {} at {:#x} for verification, guid={}",
            artifact.fully_qualified_name(),
            request.address,
            response.result
        );

        self.poll_status(&response.result).await
    }
}
