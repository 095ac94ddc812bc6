//! Fetch and Multi-Fetch behavior against a scripted transport.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use bytes::Bytes;

use client::{Client, ClientConfig, ClientError, Request, RequestExtension, Response, RoundTrip};
use codec::fetch::{self, ApiVersion};
use model::error::ErrorCode;
use model::fetch::{FetchPartitionRequest, FetchRequest, IsolationLevel, MultiFetchRequest};
use model::record::{encode_batch, Record};

enum Reply {
    Respond(Result<Response, ClientError>),
    Hang,
}

#[derive(Default)]
struct State {
    calls: usize,
    requests: Vec<Request>,
    replies: Vec<Reply>,
}

/// A transport that records every request and answers from a script.
#[derive(Clone, Default)]
struct ScriptedTransport {
    state: Rc<RefCell<State>>,
}

impl ScriptedTransport {
    fn reply_with(response: Response) -> Self {
        let transport = Self::default();
        transport
            .state
            .borrow_mut()
            .replies
            .push(Reply::Respond(Ok(response)));
        transport
    }

    fn hanging() -> Self {
        let transport = Self::default();
        transport.state.borrow_mut().replies.push(Reply::Hang);
        transport
    }

    fn calls(&self) -> usize {
        self.state.borrow().calls
    }

    fn sent_fetch(&self, index: usize) -> fetch::Request {
        let state = self.state.borrow();
        let RequestExtension::Fetch(ref wire) = state.requests[index].extension;
        wire.clone()
    }
}

impl RoundTrip for ScriptedTransport {
    async fn round_trip(&self, _addr: &str, request: Request) -> Result<Response, ClientError> {
        let reply = {
            let mut state = self.state.borrow_mut();
            state.calls += 1;
            state.requests.push(request);
            if state.replies.is_empty() {
                Reply::Respond(Err(ClientError::ClientInternal))
            } else {
                state.replies.remove(0)
            }
        };
        match reply {
            Reply::Respond(result) => result,
            Reply::Hang => std::future::pending().await,
        }
    }
}

fn config(version: ApiVersion) -> ClientConfig {
    ClientConfig {
        api_version: version,
        ..Default::default()
    }
}

fn record(offset: i64, value: &'static str) -> Record {
    Record {
        offset,
        timestamp: 1_690_000_000_000 + offset,
        key: None,
        value: Some(Bytes::from_static(value.as_bytes())),
        headers: Vec::new(),
    }
}

fn partition_response(partition: i32) -> fetch::ResponsePartition {
    fetch::ResponsePartition {
        partition,
        ..Default::default()
    }
}

fn single_partition_reply(
    version: ApiVersion,
    topic: &str,
    partition: fetch::ResponsePartition,
) -> Response {
    let mut response = fetch::Response::new(version);
    response.topics = vec![fetch::ResponseTopic {
        topic: topic.to_owned(),
        partitions: vec![partition],
    }];
    Response::Fetch(response)
}

fn events_request() -> FetchRequest {
    FetchRequest {
        addr: "localhost:9092".to_owned(),
        topic: "events".to_owned(),
        partition: 0,
        offset: 42,
        max_wait: Duration::from_millis(500),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_fetch_fails_on_reply_without_topics() {
    let transport = ScriptedTransport::reply_with(Response::Fetch(fetch::Response::new(
        ApiVersion::V11,
    )));
    let client = Client::new(transport, config(ApiVersion::V11));

    let res = client.fetch(&events_request()).await;
    assert_eq!(Err(ClientError::NoTopic), res.map(|_| ()));
}

#[tokio::test]
async fn test_fetch_fails_on_topic_without_partitions() {
    let mut reply = fetch::Response::new(ApiVersion::V11);
    reply.topics = vec![fetch::ResponseTopic {
        topic: "events".to_owned(),
        partitions: Vec::new(),
    }];
    let transport = ScriptedTransport::reply_with(Response::Fetch(reply));
    let client = Client::new(transport, config(ApiVersion::V11));

    let res = client.fetch(&events_request()).await;
    assert_eq!(Err(ClientError::NoPartition), res.map(|_| ()));
}

#[tokio::test]
async fn test_fetch_substitutes_empty_reader_when_no_records() {
    let reply = single_partition_reply(ApiVersion::V11, "events", partition_response(0));
    let transport = ScriptedTransport::reply_with(reply);
    let client = Client::new(transport, config(ApiVersion::V11));

    let mut response = client.fetch(&events_request()).await.unwrap();
    assert!(response.error.is_none());
    assert!(response.records.next().is_none());
}

#[tokio::test]
async fn test_partition_error_overrides_response_error() {
    let mut partition = partition_response(0);
    partition.error_code = ErrorCode::OffsetOutOfRange.into();
    let mut reply = fetch::Response::new(ApiVersion::V11);
    reply.error_code = ErrorCode::NotLeaderOrFollower.into();
    reply.topics = vec![fetch::ResponseTopic {
        topic: "events".to_owned(),
        partitions: vec![partition],
    }];
    let transport = ScriptedTransport::reply_with(Response::Fetch(reply));
    let client = Client::new(transport, config(ApiVersion::V11));

    let response = client.fetch(&events_request()).await.unwrap();
    assert_eq!(
        ErrorCode::OffsetOutOfRange,
        response.error.unwrap().code()
    );
}

#[tokio::test]
async fn test_response_error_applies_when_partition_is_clean() {
    let mut reply = fetch::Response::new(ApiVersion::V11);
    reply.error_code = ErrorCode::FetchSessionIdNotFound.into();
    reply.topics = vec![fetch::ResponseTopic {
        topic: "events".to_owned(),
        partitions: vec![partition_response(0)],
    }];
    let transport = ScriptedTransport::reply_with(Response::Fetch(reply));
    let client = Client::new(transport, config(ApiVersion::V11));

    let response = client.fetch(&events_request()).await.unwrap();
    assert_eq!(
        ErrorCode::FetchSessionIdNotFound,
        response.error.unwrap().code()
    );
}

#[tokio::test]
async fn test_fetch_end_to_end_yields_records_in_order() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut partition = partition_response(0);
    partition.high_watermark = 100;
    partition.records = Some(encode_batch(&[record(42, "a"), record(43, "b")]));
    let mut reply = fetch::Response::new(ApiVersion::V11);
    reply.throttle_time_ms = 25;
    reply.topics = vec![fetch::ResponseTopic {
        topic: "events".to_owned(),
        partitions: vec![partition],
    }];
    let transport = ScriptedTransport::reply_with(Response::Fetch(reply));
    let client = Client::new(transport.clone(), config(ApiVersion::V11));

    let mut response = client.fetch(&events_request()).await.unwrap();
    assert_eq!("events", response.topic);
    assert_eq!(0, response.partition);
    assert_eq!(100, response.high_watermark);
    assert_eq!(Duration::from_millis(25), response.throttle);
    assert!(response.error.is_none());

    let offsets: Vec<i64> = response
        .records
        .by_ref()
        .map(|r| r.unwrap().offset)
        .collect();
    assert_eq!(vec![42, 43], offsets);
    assert!(response.records.next().is_none());
    response.records.release();

    // The wire request carried the caller's offset and the consumer sentinels.
    let wire = transport.sent_fetch(0);
    assert_eq!(fetch::CONSUMER_REPLICA_ID, wire.replica_id);
    assert_eq!(fetch::NO_SESSION_ID, wire.session_id);
    assert_eq!(500, wire.max_wait_ms);
    assert_eq!(42, wire.topics[0].partitions[0].fetch_offset);
}

#[tokio::test]
async fn test_fetch_times_out_when_transport_hangs() {
    let transport = ScriptedTransport::hanging();
    let client = Client::new(transport, config(ApiVersion::V11));

    let request = FetchRequest {
        max_wait: Duration::from_millis(20),
        ..events_request()
    };
    let res = client.fetch(&request).await;
    assert_eq!(
        Err(ClientError::RpcTimeout {
            timeout: Duration::from_millis(20)
        }),
        res.map(|_| ())
    );
}

#[tokio::test]
async fn test_fetch_rejects_read_committed_below_v4() {
    let transport = ScriptedTransport::default();
    let client = Client::new(transport.clone(), config(ApiVersion::V2));

    let request = FetchRequest {
        isolation_level: IsolationLevel::ReadCommitted,
        ..events_request()
    };
    let res = client.fetch(&request).await;
    assert_eq!(
        Err(ClientError::UnsupportedIsolationLevel(
            IsolationLevel::ReadCommitted,
            ApiVersion::V2
        )),
        res.map(|_| ())
    );
    assert_eq!(0, transport.calls());
}

#[tokio::test]
async fn test_fetch_rejects_version_mismatch_reply() {
    let reply = single_partition_reply(ApiVersion::V4, "events", partition_response(0));
    let transport = ScriptedTransport::reply_with(reply);
    let client = Client::new(transport, config(ApiVersion::V11));

    let res = client.fetch(&events_request()).await;
    assert_eq!(Err(ClientError::UnexpectedResponse), res.map(|_| ()));
}

#[tokio::test]
async fn test_multi_fetch_rejects_empty_request_before_io() {
    let transport = ScriptedTransport::default();
    let client = Client::new(transport.clone(), config(ApiVersion::V11));

    let request = MultiFetchRequest {
        addr: "localhost:9092".to_owned(),
        ..Default::default()
    };
    let res = client.multi_fetch(&request).await;
    assert_eq!(Err(ClientError::NoTopic), res.map(|_| ()));
    assert_eq!(0, transport.calls());
}

#[tokio::test]
async fn test_multi_fetch_partition_max_bytes_falls_back() {
    let reply = single_partition_reply(ApiVersion::V11, "events", partition_response(0));
    let transport = ScriptedTransport::reply_with(reply);
    let client = Client::new(transport.clone(), config(ApiVersion::V11));

    let mut requests = HashMap::new();
    requests.insert(
        "events".to_owned(),
        vec![
            FetchPartitionRequest {
                partition: 0,
                offset: 0,
                max_bytes: 0,
            },
            FetchPartitionRequest {
                partition: 1,
                offset: 0,
                max_bytes: 4096,
            },
        ],
    );
    let request = MultiFetchRequest {
        addr: "localhost:9092".to_owned(),
        requests,
        max_bytes: 1 << 20,
        ..Default::default()
    };
    client.multi_fetch(&request).await.unwrap();

    let wire = transport.sent_fetch(0);
    let partitions = &wire.topics[0].partitions;
    assert_eq!(1 << 20, partitions[0].partition_max_bytes);
    assert_eq!(4096, partitions[1].partition_max_bytes);
}

#[tokio::test]
async fn test_multi_fetch_keeps_per_partition_errors_independent() {
    let mut errored = partition_response(1);
    errored.error_code = ErrorCode::UnknownTopicOrPartition.into();
    let mut reply = fetch::Response::new(ApiVersion::V11);
    reply.topics = vec![
        fetch::ResponseTopic {
            topic: "a".to_owned(),
            partitions: vec![partition_response(0)],
        },
        fetch::ResponseTopic {
            topic: "b".to_owned(),
            partitions: vec![errored],
        },
    ];
    let transport = ScriptedTransport::reply_with(Response::Fetch(reply));
    let client = Client::new(transport, config(ApiVersion::V11));

    let mut requests = HashMap::new();
    requests.insert(
        "a".to_owned(),
        vec![FetchPartitionRequest {
            partition: 0,
            offset: 0,
            max_bytes: 0,
        }],
    );
    requests.insert(
        "b".to_owned(),
        vec![FetchPartitionRequest {
            partition: 1,
            offset: 5,
            max_bytes: 0,
        }],
    );
    let request = MultiFetchRequest {
        addr: "localhost:9092".to_owned(),
        requests,
        ..Default::default()
    };
    let mut response = client.multi_fetch(&request).await.unwrap();

    assert!(response.error.is_none());
    assert_eq!(2, response.responses.len());

    let a = &mut response.responses.get_mut("a").unwrap()[0];
    assert!(a.error.is_none());
    assert!(a.records.next().is_none());

    let b = &response.responses["b"][0];
    assert_eq!(1, b.partition);
    assert_eq!(
        ErrorCode::UnknownTopicOrPartition,
        b.error.as_ref().unwrap().code()
    );
}
