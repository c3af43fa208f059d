//! mediatidy - organize photos and videos into a deduplicated archive
//!
//! This library walks a source directory, drops byte-identical duplicates,
//! dates each image or video (EXIF date taken, else modification time) and
//! moves it to `<target>/<images|videos>/<YYYY>/<MM>/<DD-MM-YYYY-HH-MM-SS>[-NN].<ext>`.
//! A dry-run mode reports the same decisions without touching the filesystem.

pub mod cli;
pub mod config;
pub mod date_resolver;
pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod media_kind;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod transfer;

pub use config::{CompiledFilters, ConfigError, OrganizerConfig};
pub use date_resolver::{DateProvider, DateResolver};
pub use error::{OrganizeError, OrganizeResult};
pub use media_kind::MediaKind;
pub use pipeline::{FileOutcome, OrganizePipeline, RunOptions, RunReport};
pub use transfer::{FileSystem, Transfer};

pub use cli::{Cli, run_cli};
