use crate::commitlog::WalPolicy;
use crate::replica::{HostOptions, PartOptions, RetryPolicy};
use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct RaftOptions {
    pub heartbeat_interval: Option<Duration>,
    pub election_timeout_min: Option<Duration>,
    pub election_timeout_max: Option<Duration>,
    pub rpc_timeout: Option<Duration>,
    pub max_batch_size: Option<usize>,
    pub max_appendlog_batch_size: Option<usize>,
    pub max_outstanding_requests: Option<usize>,
    pub retry_policy: Option<RetryPolicy>,
    pub wal_policy: Option<WalPolicy>,
}

#[derive(Debug)]
pub(super) struct RaftOptionsValidated {
    pub heartbeat_interval: Duration,
    pub election_timeout_min: Duration,
    pub election_timeout_max: Duration,
    pub rpc_timeout: Duration,
    pub max_batch_size: usize,
    pub max_appendlog_batch_size: usize,
    pub max_outstanding_requests: usize,
    pub retry_policy: RetryPolicy,
    pub wal_policy: WalPolicy,
}

impl RaftOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.heartbeat_interval >= self.election_timeout_min {
            return Err("Election minimum timeout must be greater than the leader's heartbeat");
        }
        if self.election_timeout_min >= self.election_timeout_max {
            return Err("Election minimum timeout must be less than maximum timeout");
        }
        if self.rpc_timeout >= self.election_timeout_min {
            return Err("RPC timeout must be less than the election minimum timeout");
        }
        if self.max_batch_size == 0 {
            return Err("Write buffer size must be positive");
        }
        if self.max_appendlog_batch_size == 0 {
            return Err("AppendLog batch size must be positive");
        }
        if self.max_outstanding_requests == 0 {
            return Err("Outstanding request limit must be positive");
        }
        if self.wal_policy.file_size == 0 || self.wal_policy.buffer_size == 0 || self.wal_policy.num_buffers == 0 {
            return Err("WAL file size, buffer size and buffer count must be positive");
        }

        Ok(())
    }

    pub fn part_options(&self) -> PartOptions {
        PartOptions {
            heartbeat_interval: self.heartbeat_interval,
            election_timeout_min: self.election_timeout_min,
            election_timeout_max: self.election_timeout_max,
            max_batch_size: self.max_batch_size,
            host: HostOptions {
                max_appendlog_batch_size: self.max_appendlog_batch_size,
                max_outstanding_requests: self.max_outstanding_requests,
                retry_policy: self.retry_policy.clone(),
            },
        }
    }
}

impl TryFrom<RaftOptions> for RaftOptionsValidated {
    type Error = &'static str;

    fn try_from(options: RaftOptions) -> Result<Self, Self::Error> {
        let values = RaftOptionsValidated {
            heartbeat_interval: options.heartbeat_interval.unwrap_or(Duration::from_millis(100)),
            election_timeout_min: options.election_timeout_min.unwrap_or(Duration::from_millis(500)),
            election_timeout_max: options.election_timeout_max.unwrap_or(Duration::from_millis(1500)),
            rpc_timeout: options.rpc_timeout.unwrap_or(Duration::from_millis(300)),
            max_batch_size: options.max_batch_size.unwrap_or(256),
            max_appendlog_batch_size: options.max_appendlog_batch_size.unwrap_or(128),
            max_outstanding_requests: options.max_outstanding_requests.unwrap_or(1024),
            retry_policy: options.retry_policy.unwrap_or_default(),
            wal_policy: options.wal_policy.unwrap_or_default(),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = RaftOptionsValidated::try_from(RaftOptions::default()).unwrap();

        assert_eq!(options.heartbeat_interval, Duration::from_millis(100));
        assert_eq!(options.rpc_timeout, Duration::from_millis(300));
        assert_eq!(options.max_appendlog_batch_size, 128);
        assert_eq!(options.wal_policy.num_buffers, 2);
        let part = options.part_options();
        assert_eq!(part.host.max_outstanding_requests, 1024);
        assert_eq!(part.election_timeout_max, Duration::from_millis(1500));
        assert_eq!(part.max_batch_size, 256);
    }

    #[test]
    fn rejects_inconsistent_timeouts() {
        let slow_heartbeat = RaftOptions {
            heartbeat_interval: Some(Duration::from_millis(600)),
            ..RaftOptions::default()
        };
        let inverted = RaftOptions {
            election_timeout_min: Some(Duration::from_millis(800)),
            election_timeout_max: Some(Duration::from_millis(700)),
            ..RaftOptions::default()
        };
        let slow_rpc = RaftOptions {
            rpc_timeout: Some(Duration::from_millis(500)),
            ..RaftOptions::default()
        };

        assert!(RaftOptionsValidated::try_from(slow_heartbeat).is_err());
        assert!(RaftOptionsValidated::try_from(inverted).is_err());
        assert!(RaftOptionsValidated::try_from(slow_rpc).is_err());
    }

    #[test]
    fn rejects_empty_limits() {
        let no_batch = RaftOptions {
            max_appendlog_batch_size: Some(0),
            ..RaftOptions::default()
        };
        let no_write_buffer = RaftOptions {
            max_batch_size: Some(0),
            ..RaftOptions::default()
        };
        let no_buffers = RaftOptions {
            wal_policy: Some(WalPolicy {
                num_buffers: 0,
                ..WalPolicy::default()
            }),
            ..RaftOptions::default()
        };

        assert!(RaftOptionsValidated::try_from(no_batch).is_err());
        assert!(RaftOptionsValidated::try_from(no_write_buffer).is_err());
        assert!(RaftOptionsValidated::try_from(no_buffers).is_err());
    }
}
