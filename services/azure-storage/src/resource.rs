use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sasflow_core::{Error, Result};

/// Characters escaped in a blob url path segment.
static PATH_SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The location of one blob, validated once and shared by the uploader and
/// the SAS signer so both address exactly the same object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobPath {
    root: String,
    account: String,
    container: String,
    prefix: String,
    name: String,
}

impl BlobPath {
    /// Build a blob path from the storage root url, container, prefix and
    /// object name.
    ///
    /// - `root` must be an `http(s)` url; the account is its first host label.
    /// - `prefix` may be empty; surrounding `/` are ignored.
    /// - `container` and `name` must be non-empty and free of `/`.
    pub fn new(
        root: impl AsRef<str>,
        container: impl AsRef<str>,
        prefix: impl AsRef<str>,
        name: impl AsRef<str>,
    ) -> Result<Self> {
        let root = root.as_ref();
        let uri: http::Uri = root.parse().map_err(|e| {
            Error::request_invalid("storage root is not a valid url")
                .with_source(e)
                .with_context(format!("root: {root}"))
        })?;
        match uri.scheme_str() {
            Some("https") | Some("http") => {}
            _ => {
                return Err(Error::request_invalid("storage root must be an http(s) url")
                    .with_context(format!("root: {root}")))
            }
        }
        let account = uri
            .host()
            .and_then(|h| h.split('.').next())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                Error::request_invalid("storage root has no account host label")
                    .with_context(format!("root: {root}"))
            })?
            .to_string();

        let container = container.as_ref();
        if container.is_empty() || container.contains('/') {
            return Err(Error::request_invalid("invalid container name")
                .with_context(format!("container: {container}")));
        }
        let name = name.as_ref();
        if name.is_empty() || name.contains('/') {
            return Err(
                Error::request_invalid("invalid blob name").with_context(format!("name: {name}"))
            );
        }

        let root = if root.ends_with('/') {
            root.to_string()
        } else {
            format!("{root}/")
        };

        Ok(Self {
            root,
            account,
            container: container.to_string(),
            prefix: prefix.as_ref().trim_matches('/').to_string(),
            name: name.to_string(),
        })
    }

    /// Storage account name.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Storage root url, always ending with `/`.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Blob name without container or prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `{container}/{prefix}/{name}`, with the prefix omitted when empty.
    fn relative(&self) -> String {
        if self.prefix.is_empty() {
            format!("{}/{}", self.container, self.name)
        } else {
            format!("{}/{}/{}", self.container, self.prefix, self.name)
        }
    }

    /// The blob url, each path segment percent-encoded.
    pub fn url(&self) -> String {
        let path = self
            .relative()
            .split('/')
            .map(|seg| utf8_percent_encode(seg, PATH_SEGMENT_ENCODE_SET).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}{path}", self.root)
    }

    /// The canonicalized resource signed into a SAS: `/blob/{account}/{container}/{prefix}/{name}`.
    pub fn canonical_resource(&self) -> String {
        format!("/blob/{}/{}", self.account, self.relative())
    }
}
