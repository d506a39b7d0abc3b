// error_code values:
//   0  SUCCEEDED
//   1  LOG_GAP
//   2  LOG_STALE
//   3  TERM_OUT_OF_DATE
//   4  NOT_A_LEADER
//   5  HOST_STOPPED
//   6  TOO_MANY_REQUESTS
//   7  EXCEPTION
//   8  NOT_READY
//   9  BAD_STATE
//   10 WAL_FAIL
//   11 WRONG_LEADER
//   12 UNKNOWN_PART

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAskForVoteRequest {
    #[prost(uint32, tag = "1")]
    pub space: u32,
    #[prost(uint32, tag = "2")]
    pub part: u32,
    #[prost(string, tag = "3")]
    pub candidate_addr: ::prost::alloc::string::String,
    #[prost(uint64, tag = "4")]
    pub term: u64,
    #[prost(uint64, tag = "5")]
    pub last_log_id: u64,
    #[prost(uint64, tag = "6")]
    pub last_log_term: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAskForVoteResponse {
    #[prost(int32, tag = "1")]
    pub error_code: i32,
    #[prost(uint64, tag = "2")]
    pub current_term: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLogEntry {
    #[prost(uint64, tag = "1")]
    pub cluster: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub msg: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAppendLogRequest {
    #[prost(uint32, tag = "1")]
    pub space: u32,
    #[prost(uint32, tag = "2")]
    pub part: u32,
    #[prost(uint64, tag = "3")]
    pub current_term: u64,
    /// The last log id the leader wants this follower to reach.
    #[prost(uint64, tag = "4")]
    pub last_log_id: u64,
    #[prost(uint64, tag = "5")]
    pub committed_log_id: u64,
    #[prost(string, tag = "6")]
    pub leader_addr: ::prost::alloc::string::String,
    /// Position of the entry preceding the batch.
    #[prost(uint64, tag = "7")]
    pub last_log_term_sent: u64,
    #[prost(uint64, tag = "8")]
    pub last_log_id_sent: u64,
    /// Term shared by every entry of the batch; 0 for a heartbeat.
    #[prost(uint64, tag = "9")]
    pub log_term: u64,
    #[prost(message, repeated, tag = "10")]
    pub entries: ::prost::alloc::vec::Vec<ProtoLogEntry>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAppendLogResponse {
    #[prost(int32, tag = "1")]
    pub error_code: i32,
    #[prost(uint64, tag = "2")]
    pub current_term: u64,
    #[prost(string, tag = "3")]
    pub leader_addr: ::prost::alloc::string::String,
    #[prost(uint64, tag = "4")]
    pub committed_log_id: u64,
    #[prost(uint64, tag = "5")]
    pub last_log_id: u64,
    #[prost(uint64, tag = "6")]
    pub last_log_term: u64,
}
#[doc = r" Generated client implementations."]
pub mod grpc_raftex_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    pub struct GrpcRaftexClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcRaftexClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcRaftexClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        pub async fn ask_for_vote(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoAskForVoteRequest>,
        ) -> Result<tonic::Response<super::ProtoAskForVoteResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/raftex.GrpcRaftex/AskForVote");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn append_log(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoAppendLogRequest>,
        ) -> Result<tonic::Response<super::ProtoAppendLogResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/raftex.GrpcRaftex/AppendLog");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcRaftexClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcRaftexClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcRaftexClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_raftex_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcRaftexServer."]
    #[async_trait]
    pub trait GrpcRaftex: Send + Sync + 'static {
        async fn ask_for_vote(
            &self,
            request: tonic::Request<super::ProtoAskForVoteRequest>,
        ) -> Result<tonic::Response<super::ProtoAskForVoteResponse>, tonic::Status>;
        async fn append_log(
            &self,
            request: tonic::Request<super::ProtoAppendLogRequest>,
        ) -> Result<tonic::Response<super::ProtoAppendLogResponse>, tonic::Status>;
    }
    #[derive(Debug)]
    pub struct GrpcRaftexServer<T: GrpcRaftex> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcRaftex> GrpcRaftexServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcRaftexServer<T>
    where
        T: GrpcRaftex,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/raftex.GrpcRaftex/AskForVote" => {
                    #[allow(non_camel_case_types)]
                    struct AskForVoteSvc<T: GrpcRaftex>(pub Arc<T>);
                    impl<T: GrpcRaftex> tonic::server::UnaryService<super::ProtoAskForVoteRequest>
                        for AskForVoteSvc<T>
                    {
                        type Response = super::ProtoAskForVoteResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoAskForVoteRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).ask_for_vote(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = AskForVoteSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/raftex.GrpcRaftex/AppendLog" => {
                    #[allow(non_camel_case_types)]
                    struct AppendLogSvc<T: GrpcRaftex>(pub Arc<T>);
                    impl<T: GrpcRaftex> tonic::server::UnaryService<super::ProtoAppendLogRequest> for AppendLogSvc<T> {
                        type Response = super::ProtoAppendLogResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoAppendLogRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).append_log(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = AppendLogSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcRaftex> Clone for GrpcRaftexServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcRaftex> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcRaftex> tonic::transport::NamedService for GrpcRaftexServer<T> {
        const NAME: &'static str = "raftex.GrpcRaftex";
    }
}
