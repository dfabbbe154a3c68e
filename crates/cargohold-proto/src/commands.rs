//! Command code table.
//!
//! Command codes are fixed integers grouped by range (authentication
//! 100-111, file operations 200-231, directory operations 240-251, status
//! 300-301). A response code is always the request code plus one; this
//! module is the single place that relationship is encoded so handlers never
//! hand-compute it.

/// A command code paired with a human-readable name, used for logging and
/// for validating the request/response numbering scheme in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandCode(pub i32);

impl CommandCode {
    /// Login.
    pub const LOGIN_REQUEST: i32 = 100;
    /// Response to [`Self::LOGIN_REQUEST`].
    pub const LOGIN_RESPONSE: i32 = 101;
    /// Logout.
    pub const LOGOUT_REQUEST: i32 = 102;
    /// Response to [`Self::LOGOUT_REQUEST`].
    pub const LOGOUT_RESPONSE: i32 = 103;
    /// Create a new account.
    pub const CREATE_ACCOUNT_REQUEST: i32 = 110;
    /// Response to [`Self::CREATE_ACCOUNT_REQUEST`].
    pub const CREATE_ACCOUNT_RESPONSE: i32 = 111;

    /// List files visible to the caller.
    pub const FILE_LIST_REQUEST: i32 = 200;
    /// Response to [`Self::FILE_LIST_REQUEST`].
    pub const FILE_LIST_RESPONSE: i32 = 201;
    /// Begin a chunked upload.
    pub const UPLOAD_INIT_REQUEST: i32 = 210;
    /// Response to [`Self::UPLOAD_INIT_REQUEST`].
    pub const UPLOAD_INIT_RESPONSE: i32 = 211;
    /// Append one chunk to an in-progress upload.
    pub const UPLOAD_CHUNK_REQUEST: i32 = 212;
    /// Response to [`Self::UPLOAD_CHUNK_REQUEST`].
    pub const UPLOAD_CHUNK_RESPONSE: i32 = 213;
    /// Finalize a completed upload.
    pub const UPLOAD_COMPLETE_REQUEST: i32 = 214;
    /// Response to [`Self::UPLOAD_COMPLETE_REQUEST`].
    pub const UPLOAD_COMPLETE_RESPONSE: i32 = 215;
    /// Begin a chunked download.
    pub const DOWNLOAD_INIT_REQUEST: i32 = 220;
    /// Response to [`Self::DOWNLOAD_INIT_REQUEST`].
    pub const DOWNLOAD_INIT_RESPONSE: i32 = 221;
    /// Fetch one chunk of a file being downloaded.
    pub const DOWNLOAD_CHUNK_REQUEST: i32 = 222;
    /// Response to [`Self::DOWNLOAD_CHUNK_REQUEST`].
    pub const DOWNLOAD_CHUNK_RESPONSE: i32 = 223;
    /// Acknowledge a finished download.
    pub const DOWNLOAD_COMPLETE_REQUEST: i32 = 224;
    /// Response to [`Self::DOWNLOAD_COMPLETE_REQUEST`].
    pub const DOWNLOAD_COMPLETE_RESPONSE: i32 = 225;
    /// Delete a file.
    pub const FILE_DELETE_REQUEST: i32 = 230;
    /// Response to [`Self::FILE_DELETE_REQUEST`].
    pub const FILE_DELETE_RESPONSE: i32 = 231;

    /// Create a directory.
    pub const DIRECTORY_CREATE_REQUEST: i32 = 240;
    /// Response to [`Self::DIRECTORY_CREATE_REQUEST`].
    pub const DIRECTORY_CREATE_RESPONSE: i32 = 241;
    /// List the subdirectories of a directory.
    pub const DIRECTORY_LIST_REQUEST: i32 = 242;
    /// Response to [`Self::DIRECTORY_LIST_REQUEST`].
    pub const DIRECTORY_LIST_RESPONSE: i32 = 243;
    /// Rename a directory.
    pub const DIRECTORY_RENAME_REQUEST: i32 = 244;
    /// Response to [`Self::DIRECTORY_RENAME_REQUEST`].
    pub const DIRECTORY_RENAME_RESPONSE: i32 = 245;
    /// Delete a directory, optionally recursively.
    pub const DIRECTORY_DELETE_REQUEST: i32 = 246;
    /// Response to [`Self::DIRECTORY_DELETE_REQUEST`].
    pub const DIRECTORY_DELETE_RESPONSE: i32 = 247;
    /// Move one or more files into another directory.
    pub const FILE_MOVE_REQUEST: i32 = 248;
    /// Response to [`Self::FILE_MOVE_REQUEST`].
    pub const FILE_MOVE_RESPONSE: i32 = 249;
    /// List both files and subdirectories of a directory.
    pub const DIRECTORY_CONTENTS_REQUEST: i32 = 250;
    /// Response to [`Self::DIRECTORY_CONTENTS_REQUEST`].
    pub const DIRECTORY_CONTENTS_RESPONSE: i32 = 251;

    /// Generic success, used for unsolicited acknowledgements.
    pub const SUCCESS: i32 = 300;
    /// Generic or unsolicited error.
    pub const ERROR: i32 = 301;

    const REQUEST_CODES: &'static [i32] = &[
        Self::LOGIN_REQUEST,
        Self::LOGOUT_REQUEST,
        Self::CREATE_ACCOUNT_REQUEST,
        Self::FILE_LIST_REQUEST,
        Self::UPLOAD_INIT_REQUEST,
        Self::UPLOAD_CHUNK_REQUEST,
        Self::UPLOAD_COMPLETE_REQUEST,
        Self::DOWNLOAD_INIT_REQUEST,
        Self::DOWNLOAD_CHUNK_REQUEST,
        Self::DOWNLOAD_COMPLETE_REQUEST,
        Self::FILE_DELETE_REQUEST,
        Self::DIRECTORY_CREATE_REQUEST,
        Self::DIRECTORY_LIST_REQUEST,
        Self::DIRECTORY_RENAME_REQUEST,
        Self::DIRECTORY_DELETE_REQUEST,
        Self::FILE_MOVE_REQUEST,
        Self::DIRECTORY_CONTENTS_REQUEST,
    ];

    /// True if `code` is a request code defined by this table.
    #[must_use]
    pub fn is_request(code: i32) -> bool {
        Self::REQUEST_CODES.contains(&code)
    }

    /// True if this command requires an authenticated session.
    ///
    /// Only login and account creation are reachable from `AuthRequired`.
    #[must_use]
    pub fn requires_authentication(code: i32) -> bool {
        !matches!(code, Self::LOGIN_REQUEST | Self::CREATE_ACCOUNT_REQUEST)
    }

    /// The response code for a request code, by the fixed `request + 1` rule.
    ///
    /// Returns `None` if `code` is not one of the request codes in this
    /// table; callers use this to detect a programming error rather than a
    /// protocol error, since the mapping is exhaustively fixed at compile
    /// time.
    #[must_use]
    pub fn response_for(code: i32) -> Option<i32> {
        Self::is_request(code).then_some(code + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_is_always_request_plus_one() {
        for &request in CommandCode::REQUEST_CODES {
            assert_eq!(CommandCode::response_for(request), Some(request + 1));
        }
    }

    #[test]
    fn unknown_code_has_no_response() {
        assert_eq!(CommandCode::response_for(CommandCode::SUCCESS), None);
        assert_eq!(CommandCode::response_for(9999), None);
    }

    #[test]
    fn only_login_and_create_account_are_pre_auth() {
        assert!(!CommandCode::requires_authentication(CommandCode::LOGIN_REQUEST));
        assert!(!CommandCode::requires_authentication(CommandCode::CREATE_ACCOUNT_REQUEST));
        assert!(CommandCode::requires_authentication(CommandCode::FILE_LIST_REQUEST));
        assert!(CommandCode::requires_authentication(CommandCode::LOGOUT_REQUEST));
    }
}
