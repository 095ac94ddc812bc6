use std::cmp;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{error, trace, warn};
use tokio::time;

use codec::fetch;
use model::error::BrokerError;
use model::fetch::{
    FetchPartitionResponse, FetchRequest, FetchResponse, IsolationLevel, MultiFetchRequest,
    MultiFetchResponse,
};
use model::record::RecordReader;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::request::Request;
use crate::response::Response;
use crate::round_trip::RoundTrip;

/// `Client` issues Fetch-family requests through a pluggable round-trip
/// transport. Each operation is one synchronous request/response exchange;
/// retry policy, if any, belongs to the caller.
pub struct Client<T> {
    transport: T,
    config: Arc<ClientConfig>,
}

impl<T> Client<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl<T: RoundTrip> Client<T> {
    /// Fetch records from a single topic-partition.
    ///
    /// Broker-reported errors do not fail the call; they come back in
    /// [`FetchResponse::error`]. A reply without the requested topic or
    /// partition section fails with [`ClientError::NoTopic`] or
    /// [`ClientError::NoPartition`].
    pub async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse, ClientError> {
        let version = self.config.api_version;
        check_isolation_level(version, req.isolation_level)?;

        let timeout = cmp::min(self.config.request_timeout, req.effective_max_wait());

        let mut wire = fetch::Request::new(version);
        wire.max_wait_ms = timeout.as_millis() as i32;
        wire.min_bytes = req.min_bytes as i32;
        wire.max_bytes = req.max_bytes as i32;
        wire.isolation_level = req.isolation_level.into();
        wire.topics = vec![fetch::RequestTopic {
            topic: req.topic.clone(),
            partitions: vec![fetch::RequestPartition {
                partition: req.partition,
                current_leader_epoch: fetch::NO_LEADER_EPOCH,
                fetch_offset: req.offset,
                log_start_offset: fetch::NO_LOG_START_OFFSET,
                partition_max_bytes: req.max_bytes as i32,
            }],
        }];

        let response = self
            .round_trip(&req.addr, Request::fetch(timeout, wire), timeout)
            .await
            .map_err(|e| {
                warn!("Fetch to {} failed. Cause: {}", req.addr, e);
                e
            })?;
        let response = expect_fetch(response, version)?;

        let topic = response
            .topics
            .into_iter()
            .next()
            .ok_or(ClientError::NoTopic)?;
        let partition = topic
            .partitions
            .into_iter()
            .next()
            .ok_or(ClientError::NoPartition)?;

        // A partition-level error code overrides the response-level one.
        let error = BrokerError::new(partition.error_code, "")
            .or_else(|| BrokerError::new(response.error_code, ""));

        Ok(FetchResponse {
            throttle: throttle_duration(response.throttle_time_ms),
            topic: topic.topic,
            partition: partition.partition,
            high_watermark: partition.high_watermark,
            last_stable_offset: partition.last_stable_offset,
            log_start_offset: partition.log_start_offset,
            error,
            records: partition
                .records
                .map(RecordReader::new)
                .unwrap_or_else(RecordReader::empty),
        })
    }

    /// Fetch records from many topic-partitions on one broker in a single
    /// wire request. The broker applies the size and wait bounds to the
    /// response as a whole.
    ///
    /// Per-partition errors land on the matching
    /// [`FetchPartitionResponse::error`] and leave sibling partitions
    /// usable; only transport and decode failures abort the call.
    pub async fn multi_fetch(
        &self,
        req: &MultiFetchRequest,
    ) -> Result<MultiFetchResponse, ClientError> {
        let version = self.config.api_version;
        check_isolation_level(version, req.isolation_level)?;

        let topics: Vec<fetch::RequestTopic> = req
            .requests
            .iter()
            .map(|(topic, partitions)| fetch::RequestTopic {
                topic: topic.clone(),
                partitions: partitions
                    .iter()
                    .map(|partition| {
                        let max_bytes = if partition.max_bytes > 0 {
                            partition.max_bytes
                        } else {
                            req.max_bytes
                        };
                        fetch::RequestPartition {
                            partition: partition.partition,
                            current_leader_epoch: fetch::NO_LEADER_EPOCH,
                            fetch_offset: partition.offset,
                            log_start_offset: fetch::NO_LOG_START_OFFSET,
                            partition_max_bytes: max_bytes as i32,
                        }
                    })
                    .collect(),
            })
            .collect();

        // Guard against silently fetching nothing; rejected before any I/O.
        if topics.is_empty() {
            return Err(ClientError::NoTopic);
        }

        let timeout = cmp::min(self.config.request_timeout, req.effective_max_wait());

        let mut wire = fetch::Request::new(version);
        wire.max_wait_ms = timeout.as_millis() as i32;
        wire.min_bytes = req.min_bytes as i32;
        wire.max_bytes = req.max_bytes as i32;
        wire.isolation_level = req.isolation_level.into();
        wire.topics = topics;

        let response = self
            .round_trip(&req.addr, Request::fetch(timeout, wire), timeout)
            .await
            .map_err(|e| {
                warn!("MultiFetch to {} failed. Cause: {}", req.addr, e);
                e
            })?;
        let response = expect_fetch(response, version)?;

        let mut responses = HashMap::with_capacity(response.topics.len());
        for topic in response.topics {
            let partitions = topic
                .partitions
                .into_iter()
                .map(|partition| FetchPartitionResponse {
                    partition: partition.partition,
                    error: BrokerError::new(partition.error_code, ""),
                    high_watermark: partition.high_watermark,
                    last_stable_offset: partition.last_stable_offset,
                    log_start_offset: partition.log_start_offset,
                    records: partition
                        .records
                        .map(RecordReader::new)
                        .unwrap_or_else(RecordReader::empty),
                })
                .collect();
            responses.insert(topic.topic, partitions);
        }

        Ok(MultiFetchResponse {
            throttle: throttle_duration(response.throttle_time_ms),
            responses,
            error: BrokerError::new(response.error_code, ""),
        })
    }

    async fn round_trip(
        &self,
        addr: &str,
        request: Request,
        timeout: Duration,
    ) -> Result<Response, ClientError> {
        trace!("Sending {} to {}", request, addr);
        time::timeout(timeout, self.transport.round_trip(addr, request))
            .await
            .map_err(|_| {
                warn!("No response from {} within {:?}", addr, timeout);
                ClientError::RpcTimeout { timeout }
            })?
    }
}

fn expect_fetch(
    response: Response,
    version: fetch::ApiVersion,
) -> Result<fetch::Response, ClientError> {
    match response {
        Response::Fetch(response) if response.version == version => Ok(response),
        other => {
            error!(
                "Expected a Fetch[v{}] response, got {:?}",
                i16::from(version),
                other
            );
            Err(ClientError::UnexpectedResponse)
        }
    }
}

fn check_isolation_level(
    version: fetch::ApiVersion,
    level: IsolationLevel,
) -> Result<(), ClientError> {
    if level == IsolationLevel::ReadCommitted && !version.supports_isolation_level() {
        return Err(ClientError::UnsupportedIsolationLevel(level, version));
    }
    Ok(())
}

fn throttle_duration(throttle_time_ms: i32) -> Duration {
    Duration::from_millis(throttle_time_ms.max(0) as u64)
}
