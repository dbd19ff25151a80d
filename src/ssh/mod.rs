pub mod known_hosts;
pub mod resolver;
pub mod session;
pub mod ssh_config;
pub mod tokio_client;

pub use known_hosts::StrictHostKeyChecking;
pub use resolver::{ConnectionParams, Credential, ResolveError, SshConfigResolver, TargetResolver};
pub use session::{ChannelOutput, Connector, ExecChannel, RemoteSession, SessionError};
pub use tokio_client::RusshConnector;
