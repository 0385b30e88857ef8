use alloy::{contract::Error as ContractError, transports::RpcError};

/// Where a failed contract interaction originated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The node or the transport failed; the contract was never evaluated.
    Node,
    /// The contract reverted or its return data could not be decoded.
    Contract,
}

pub trait ContractErrorExt {
    /// Returns whether a given error is a node error. Everything else,
    /// including transport errors that carry revert data, is a contract error.
    fn is_node_error(&self) -> bool;

    fn kind(&self) -> ErrorKind {
        if self.is_node_error() {
            ErrorKind::Node
        } else {
            ErrorKind::Contract
        }
    }
}

impl ContractErrorExt for ContractError {
    fn is_node_error(&self) -> bool {
        // In alloy some contract errors are "hidden" inside transport errors, so
        // transport errors have to be checked for revert data to rule out
        // contract errors.
        //
        // NOTE: alloy's decoding functions can't be used here because they
        // require the revert data to *not* be empty, otherwise they return
        // `None` as if a revert wasn't present at all.
        match self {
            ContractError::TransportError(RpcError::ErrorResp(err)) => {
                let no_revert_data = err.as_revert_data().is_none();
                tracing::debug!(?err, %no_revert_data, "transport rpc error");
                no_revert_data
            }
            ContractError::TransportError(_) => true,
            _ => false,
        }
    }
}

/// Create an arbitrary alloy error that will convert into a "contract" error.
/// Useful for testing.
#[cfg(any(test, feature = "test-util"))]
pub fn testing_alloy_contract_error() -> alloy::contract::Error {
    alloy::contract::Error::NotADeploymentTransaction
}

/// Create an arbitrary alloy error that will convert into a "node" error.
/// Useful for testing.
#[cfg(any(test, feature = "test-util"))]
pub fn testing_alloy_node_error() -> alloy::contract::Error {
    alloy::contract::Error::TransportError(alloy::transports::TransportError::ErrorResp(
        alloy::rpc::json_rpc::ErrorPayload::internal_error(),
    ))
}
