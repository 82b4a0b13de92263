//! Plugin gRPC client
//!
//! Implements the unary `TransactionCheck` call against a registered plugin
//! using tonic's low-level `Grpc` client with a raw-bytes codec. The channel
//! is created lazily, so constructing a client never performs I/O; the
//! connection is established on first use and reused afterwards.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes};
use tokio::net::UnixStream;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint, Uri};
use tonic::{Request, Status};
use tower::service_fn;

use super::Transport;
use super::messages::{TransactionId, WriteResponse};
use crate::errors::{GatewayError, GatewayResult};

/// gRPC method path for Plugin.TransactionCheck
const TRANSACTION_CHECK_PATH: &str = "/plugin.v1.Plugin/TransactionCheck";

/// Transport-level failure while talking to a plugin.
///
/// These are never retried by the gateway; the command handler surfaces them
/// as `FailedTransactionCommand` and callers may re-poll.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Connection could not be established or was lost mid-call
    #[error("transport error: {0}")]
    Transport(String),

    /// The plugin answered with a non-OK gRPC status (includes timeouts,
    /// which tonic reports as a cancelled/deadline status)
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The reply could not be decoded as a WriteResponse
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Capability required of anything that can answer a transaction status
/// check. The production implementation is [`GrpcPluginClient`]; tests
/// substitute doubles.
#[async_trait]
pub trait PluginClient: Send + Sync {
    /// Ask the plugin for the current write status of a transaction
    async fn check_transaction(&self, transaction_id: &str) -> Result<WriteResponse, ClientError>;
}

/// gRPC client for a single registered plugin
#[derive(Debug)]
pub struct GrpcPluginClient {
    channel: Channel,
}

impl GrpcPluginClient {
    /// Build a lazily-connecting client for the given plugin address.
    ///
    /// TCP addresses are `host:port`; unix addresses are socket paths. The
    /// timeout bounds every RPC made through this client, including
    /// connection establishment.
    pub fn new(address: &str, transport: Transport, timeout: Duration) -> GatewayResult<Self> {
        let channel = match transport {
            Transport::Tcp => {
                let endpoint = Endpoint::try_from(format!("http://{}", address))
                    .map_err(|_| GatewayError::InvalidPluginAddress(address.to_string()))?;
                endpoint
                    .timeout(timeout)
                    .connect_timeout(timeout)
                    .connect_lazy()
            }
            Transport::Unix => {
                if address.is_empty() {
                    return Err(GatewayError::InvalidPluginAddress(
                        "unix socket path must not be empty".to_string(),
                    ));
                }
                let path = PathBuf::from(address);
                // The URI is required by the endpoint builder but unused for
                // unix sockets; the connector supplies the stream.
                Endpoint::from_static("http://plugin.sock")
                    .timeout(timeout)
                    .connect_timeout(timeout)
                    .connect_with_connector_lazy(service_fn(move |_: Uri| {
                        UnixStream::connect(path.clone())
                    }))
            }
        };

        Ok(Self { channel })
    }
}

#[async_trait]
impl PluginClient for GrpcPluginClient {
    async fn check_transaction(&self, transaction_id: &str) -> Result<WriteResponse, ClientError> {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());

        grpc.ready()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let codec = RawCodec;
        let path = PathAndQuery::from_static(TRANSACTION_CHECK_PATH);
        let request = Request::new(TransactionId::new(transaction_id).encode());

        let response = grpc
            .unary(request, path, codec)
            .await
            .map_err(|status| ClientError::Rpc(format_status(&status)))?;

        WriteResponse::decode(&response.into_inner())
            .map_err(|e| ClientError::Protocol(e.to_string()))
    }
}

fn format_status(status: &Status) -> String {
    format!("{:?}: {}", status.code(), status.message())
}

/// Raw-bytes codec: messages are encoded/decoded by the caller, the codec
/// only moves bytes through tonic's framing
#[derive(Debug, Clone, Default)]
struct RawCodec;

impl tonic::codec::Codec for RawCodec {
    type Encode = Vec<u8>;
    type Decode = Bytes;
    type Encoder = RawEncoder;
    type Decoder = RawDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        RawEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        RawDecoder
    }
}

#[derive(Debug, Clone, Default)]
struct RawEncoder;

impl tonic::codec::Encoder for RawEncoder {
    type Item = Vec<u8>;
    type Error = Status;

    fn encode(
        &mut self,
        item: Self::Item,
        dst: &mut tonic::codec::EncodeBuf<'_>,
    ) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct RawDecoder;

impl tonic::codec::Decoder for RawDecoder {
    type Item = Bytes;
    type Error = Status;

    fn decode(
        &mut self,
        src: &mut tonic::codec::DecodeBuf<'_>,
    ) -> Result<Option<Self::Item>, Self::Error> {
        let remaining = src.remaining();
        if remaining == 0 {
            Ok(None)
        } else {
            Ok(Some(src.copy_to_bytes(remaining)))
        }
    }
}
