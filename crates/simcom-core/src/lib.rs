//! SimCom core library
//!
//! This crate provides the pieces of SimCom that know nothing about threads,
//! voice clients or simulators:
//!
//! - **Frequency tags**: channel names such as `"Tower - 118.300"` carry the
//!   COM frequency they represent, held as integer hundredths of a MHz
//! - **Channel directory**: the session's channel tree, indexed by id, with
//!   lazily derived depth and pre-order listing
//! - **Resolver**: finds the channel tagged with a tuned frequency under a
//!   chosen root
//! - **Radio readings**: the snapshot a simulator pushes on every poll
//!
//! # Example
//!
//! ```rust
//! use simcom_core::{ChannelDirectory, ChannelEntry, ChannelId, Frequency};
//!
//! let mut directory = ChannelDirectory::new();
//! directory.load_snapshot([
//!     ChannelEntry::new(1, "Lobby", 0),
//!     ChannelEntry::new(2, "Tower - 118.300", 1),
//!     ChannelEntry::new(3, "Ground - 121.900", 1),
//! ]);
//!
//! let tuned: Frequency = "121.90".parse().unwrap();
//! assert_eq!(directory.resolve(tuned, Some(ChannelId(1))), Some(ChannelId(3)));
//! ```

pub mod directory;
pub mod error;
pub mod frequency;
pub mod radio;
pub mod resolver;

pub use directory::{ChannelDirectory, ChannelEntry, ChannelId, ChannelInfo, ChannelNode, Preorder};
pub use error::{DirectoryError, FrequencyError};
pub use frequency::{parse_tag, Frequency, TAG_DELIMITER};
pub use radio::{ComSelector, SimComData};
pub use resolver::{resolve, ResolverQuery};
