pub mod config;
pub mod connector;
pub mod error;
pub mod message;
pub mod secrets;

pub use config::{ConnectorConfig, PluginOptions};
pub use connector::{Channels, Plugin, Tap, Target};
pub use error::{ConnectorError, ErrorKind};
pub use message::{
    ActivateVersionMessage, Message, MessageType, MessageWriter, RecordMessage, SchemaMessage,
    StateMessage,
};
pub use secrets::{is_common_secret_key, SecretString};
