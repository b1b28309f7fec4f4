//! Thin JSON-RPC surface over `obscura_core::facade::Core`. Mirrors the
//! façade's own method names 1:1 rather than inventing a parallel API.

use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use obscura_core::address::Address;
use obscura_core::vm::VmAdapter;
use std::sync::Arc;

/// Published RPC protocol version. Bump whenever a method's shape changes
/// in a client-visible way.
pub const RPC_PUBLIC_API_VERSION: u32 = 1;

fn bad_request(message: impl ToString) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(-32602, message.to_string(), None::<()>)
}

#[rpc(server)]
pub trait ObscuraApi {
    #[method(name = "getBalance")]
    fn get_balance(&self, address_base58: String) -> RpcResult<u64>;

    #[method(name = "getTopBlockDepth")]
    fn get_top_block_depth(&self) -> RpcResult<u64>;

    #[method(name = "getTransactionOutput")]
    fn get_transaction_output(&self, tx_hash_hex: String) -> RpcResult<String>;
}

pub struct ObscuraRpcServer<V: VmAdapter + 'static> {
    core: Arc<obscura_core::facade::Core<V>>,
}

impl<V: VmAdapter + 'static> ObscuraRpcServer<V> {
    pub fn new(core: Arc<obscura_core::facade::Core<V>>) -> Self {
        Self { core }
    }
}

impl<V: VmAdapter + 'static> ObscuraApiServer for ObscuraRpcServer<V> {
    fn get_balance(&self, address_base58: String) -> RpcResult<u64> {
        let address = Address::from_base58(&address_base58).map_err(bad_request)?;
        Ok(self.core.balance(&address))
    }

    fn get_top_block_depth(&self) -> RpcResult<u64> {
        Ok(self.core.top_block().depth)
    }

    fn get_transaction_output(&self, tx_hash_hex: String) -> RpcResult<String> {
        let bytes = hex::decode(&tx_hash_hex).map_err(bad_request)?;
        if bytes.len() != 32 {
            return Err(bad_request("tx hash must be 32 bytes"));
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(hex::encode(self.core.transaction_output(&hash)))
    }
}
