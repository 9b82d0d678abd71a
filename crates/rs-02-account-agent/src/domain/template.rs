//! # Transaction Templates
//!
//! Callers describe a transaction with a `TransactionTemplate`; the agent
//! fills in the nonce and defaults to produce a `TransactionRequest`.

use super::errors::TemplateError;
use crate::config::AgentConfig;
use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};

/// Caller-supplied transaction fields. Unset fields take agent defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTemplate {
    /// Gas budget; defaults to `AgentConfig::default_gas`.
    pub gas: Option<u64>,
    /// Gas price in wei; defaults to `AgentConfig::gas_price`.
    pub gas_price: Option<U256>,
    /// Recipient; `None` deploys a contract from `data`.
    pub to: Option<Address>,
    /// Native value transferred.
    pub value: U256,
    /// Call data.
    pub data: Vec<u8>,
    /// Must match the agent's chain id when set.
    pub chain_id: Option<u64>,
}

impl TransactionTemplate {
    /// Contract call.
    pub fn call(to: Address, data: impl Into<Vec<u8>>) -> Self {
        Self {
            to: Some(to),
            data: data.into(),
            ..Default::default()
        }
    }

    /// Plain value transfer.
    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to: Some(to),
            value,
            ..Default::default()
        }
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Check the template against the agent configuration.
    pub fn validate(&self, config: &AgentConfig) -> Result<(), TemplateError> {
        if self.gas == Some(0) {
            return Err(TemplateError::ZeroGas);
        }
        if self.to.is_none() && self.data.is_empty() {
            return Err(TemplateError::EmptyTransaction);
        }
        match self.chain_id {
            Some(actual) if actual != config.chain_id => Err(TemplateError::ChainIdMismatch {
                expected: config.chain_id,
                actual,
            }),
            _ => Ok(()),
        }
    }

    /// Merge nonce and defaults into a request ready for signing.
    pub fn resolve(self, nonce: u64, config: &AgentConfig) -> Result<TransactionRequest, TemplateError> {
        self.validate(config)?;
        Ok(TransactionRequest {
            nonce,
            gas: self.gas.unwrap_or(config.default_gas),
            gas_price: self.gas_price.or(config.gas_price),
            to: self.to,
            value: self.value,
            data: self.data,
            chain_id: config.chain_id,
        })
    }
}

/// A fully specified transaction, handed to the chain client for signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub nonce: u64,
    pub gas: u64,
    /// `None` lets the client pick a price.
    pub gas_price: Option<U256>,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
}
