use camino::Utf8PathBuf;

/// Error types for the geolook library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// MMDB database file was not found at the expected path.
    #[error("database not found: {path}")]
    DatabaseNotFound { path: Utf8PathBuf },

    /// MMDB database file exists but could not be opened.
    #[error("failed to open database {path}")]
    OpenDatabase {
        path: Utf8PathBuf,
        #[source]
        source: maxminddb::MaxMindDbError,
    },

    /// IP address lookup failed in the MMDB database.
    #[error("lookup failed for {ip}")]
    LookupFailed {
        ip: String,
        #[source]
        source: maxminddb::MaxMindDbError,
    },

    /// The database holds no record for the address.
    #[error("the address {ip} is not in the {database} database")]
    AddressNotFound { ip: String, database: &'static str },

    /// The lookup key is not a legal IPv4 literal.
    #[error("'{ip}' does not appear to be an IPv4 address")]
    InvalidAddress { ip: String },

    /// A named column does not exist in the table.
    #[error("column not found: {column}")]
    UnknownColumn { column: String },

    /// JSON input is neither a list of records nor a mapping of lists.
    #[error("unsupported JSON structure: {reason}")]
    UnsupportedJson { reason: String },

    /// No database directory was configured or supplied.
    #[error("no database path provided")]
    MissingDbPath,
}

/// Convenience type alias for Results using the library error.
pub type Result<T> = std::result::Result<T, Error>;
