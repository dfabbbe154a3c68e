//! Upload and download engines: the chunked transfer state machines that
//! sit between the command dispatcher and the catalogs/storage.

pub mod download;
pub mod upload;

pub use download::DownloadEngine;
pub use upload::UploadEngine;
