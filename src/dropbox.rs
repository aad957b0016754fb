use std::str::FromStr;
use std::time::Duration;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{DropboxError, Recoverable, Result, normalize_error};
use crate::transport::{ApiRequest, ApiResponse, DEFAULT_TIMEOUT, HttpTransport, Transport};

pub const DEFAULT_API_BASE_URL: &str = "https://api.dropboxapi.com/2";
pub const DEFAULT_CONTENT_BASE_URL: &str = "https://content.dropboxapi.com/2";
const API_ARG_HEADER: &str = "Dropbox-API-Arg";

// --- Request options ---

#[derive(Debug, Clone, Default)]
pub struct ListFolderOptions {
    pub recursive: bool,
    pub limit: Option<u32>,
    pub include_media_info: bool,
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub path: Option<String>,
    pub max_results: Option<u64>,
    pub file_extensions: Vec<String>,
    pub file_categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportFormat {
    #[default]
    Markdown,
    Html,
    PlainText,
}

impl ImportFormat {
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::PlainText => "plain_text",
        }
    }
}

impl FromStr for ImportFormat {
    type Err = DropboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "plain_text" | "text" | "txt" => Ok(Self::PlainText),
            other => Err(DropboxError::input(format!(
                "unknown import format: {other} (expected markdown, html or plain_text)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Markdown,
    Html,
}

impl ExportFormat {
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = DropboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            other => Err(DropboxError::input(format!(
                "unknown export format: {other} (expected markdown or html)"
            ))),
        }
    }
}

/// How `files/paper/update` merges new content into an existing document.
///
/// `Update` requires a `paper_revision`; without one the upstream call is still
/// made and its error surfaced as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePolicy {
    #[default]
    Overwrite,
    Update,
    Append,
    Prepend,
}

impl UpdatePolicy {
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Update => "update",
            Self::Append => "append",
            Self::Prepend => "prepend",
        }
    }
}

impl FromStr for UpdatePolicy {
    type Err = DropboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "update" => Ok(Self::Update),
            "append" => Ok(Self::Append),
            "prepend" => Ok(Self::Prepend),
            other => Err(DropboxError::input(format!(
                "unknown update policy: {other} (expected overwrite, update, append or prepend)"
            ))),
        }
    }
}

// --- Client ---

pub struct Dropbox<T: Transport = HttpTransport> {
    transport: T,
    api_base_url: String,
    content_base_url: String,
    timeout: Duration,
}

impl<T: Transport> Dropbox<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            content_base_url: DEFAULT_CONTENT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_urls(mut self, api: &str, content: &str) -> Self {
        self.api_base_url = api.trim_end_matches('/').to_string();
        self.content_base_url = content.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[cfg(test)]
    fn transport(&self) -> &T {
        &self.transport
    }

    // --- Executor ---

    /// Calls a JSON RPC endpoint and decodes the response.
    ///
    /// An empty success body decodes as `{}`.
    pub fn rpc<R: DeserializeOwned>(&self, endpoint: &str, body: Option<&Value>) -> Result<R> {
        let url = format!("{}/{}", self.api_base_url, endpoint);
        let mut request = ApiRequest::post(url, self.timeout);
        if let Some(body) = body {
            let encoded = serde_json::to_vec(body)
                .map_err(|e| DropboxError::input(format!("failed to encode {endpoint} body: {e}")))?;
            request = request
                .header("Content-Type", "application/json")
                .body(encoded);
        }

        debug!("rpc {endpoint}");
        let response = self.transport.send(request)?;
        let text = response.text();
        if !response.ok() {
            return Err(DropboxError::Api(normalize_error(
                &text,
                Some(response.status),
                "API request failed",
            )));
        }

        let value = if text.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&text).map_err(|e| parse_error(endpoint, &response, e))?
        };
        serde_json::from_value(value).map_err(|e| parse_error(endpoint, &response, e))
    }

    /// Calls a content-download endpoint; the argument travels in a header.
    pub fn download(&self, endpoint: &str, arg: &Value) -> Result<ApiResponse> {
        let url = format!("{}/{}", self.content_base_url, endpoint);
        let request = ApiRequest::post(url, self.timeout).header(API_ARG_HEADER, api_arg_header(arg)?);

        debug!("download {endpoint}");
        let response = self.transport.send(request)?;
        if !response.ok() {
            return Err(DropboxError::Api(normalize_error(
                &response.text(),
                Some(response.status),
                "Download failed",
            )));
        }
        Ok(response)
    }

    /// Calls a content-upload endpoint with raw bytes as the body.
    ///
    /// A success must carry a JSON result; an empty or non-JSON body is a parse
    /// error rather than an empty result.
    pub fn upload<R: DeserializeOwned>(&self, endpoint: &str, arg: &Value, content: Vec<u8>) -> Result<R> {
        let url = format!("{}/{}", self.content_base_url, endpoint);
        let request = ApiRequest::post(url, self.timeout)
            .header(API_ARG_HEADER, api_arg_header(arg)?)
            .header("Content-Type", "application/octet-stream")
            .body(content);

        debug!("upload {endpoint}");
        let response = self.transport.send(request)?;
        let text = response.text();
        if !response.ok() {
            return Err(DropboxError::Api(normalize_error(
                &text,
                Some(response.status),
                "Upload failed",
            )));
        }
        serde_json::from_str(&text).map_err(|e| parse_error(endpoint, &response, e))
    }

    // --- Account / files ---

    pub fn current_account(&self) -> Result<Account> {
        self.rpc("users/get_current_account", None)
    }

    pub fn list_folder(&self, path: &str, opts: &ListFolderOptions) -> Result<ListFolderResult> {
        let mut body = json!({
            "path": normalize_path(path),
            "recursive": opts.recursive,
            "include_media_info": opts.include_media_info,
            "include_deleted": opts.include_deleted,
        });
        if let Some(limit) = opts.limit {
            body["limit"] = json!(limit);
        }
        self.rpc("files/list_folder", Some(&body))
    }

    pub fn list_folder_continue(&self, cursor: &str) -> Result<ListFolderResult> {
        let cursor = require(cursor, "cursor")?;
        self.rpc(
            "files/list_folder/continue",
            Some(&json!({ "cursor": cursor })),
        )
    }

    pub fn search(&self, query: &str, opts: &SearchOptions) -> Result<SearchResult> {
        let query = require(query, "search query")?;
        let mut options = Map::new();
        if let Some(path) = opts.path.as_deref() {
            options.insert("path".into(), json!(normalize_path(path)));
        }
        if let Some(max) = opts.max_results {
            options.insert("max_results".into(), json!(max));
        }
        if !opts.file_extensions.is_empty() {
            options.insert("file_extensions".into(), json!(opts.file_extensions));
        }
        if !opts.file_categories.is_empty() {
            options.insert("file_categories".into(), json!(opts.file_categories));
        }

        let mut body = json!({ "query": query });
        if !options.is_empty() {
            body["options"] = Value::Object(options);
        }
        self.rpc("files/search_v2", Some(&body))
    }

    pub fn get_metadata(&self, path: &str, include_media_info: bool) -> Result<Metadata> {
        let path = require_path(path)?;
        self.rpc(
            "files/get_metadata",
            Some(&json!({ "path": path, "include_media_info": include_media_info })),
        )
    }

    pub fn download_file(&self, path: &str) -> Result<Vec<u8>> {
        let path = require_path(path)?;
        let response = self.download("files/download", &json!({ "path": path }))?;
        Ok(response.into_bytes())
    }

    /// Reads a document back in the requested export format.
    pub fn export(&self, path: &str, format: ExportFormat) -> Result<String> {
        let path = require_path(path)?;
        let response = self.download(
            "files/export",
            &json!({ "path": path, "export_format": format.as_api_str() }),
        )?;
        Ok(response.text())
    }

    pub fn move_entry(&self, from: &str, to: &str) -> Result<MoveResult> {
        let from = require_path(from)?;
        let to = require_path(to)?;
        self.rpc(
            "files/move_v2",
            Some(&json!({
                "from_path": from,
                "to_path": to,
                "allow_shared_folder": true,
                "autorename": false,
            })),
        )
    }

    // --- Documents ---

    fn paper_create(&self, path: &str, content: &[u8], format: ImportFormat) -> Result<DocumentResult> {
        self.upload(
            "files/paper/create",
            &json!({ "path": path, "import_format": format.as_api_str() }),
            content.to_vec(),
        )
    }

    /// Creates a document at `path`.
    ///
    /// Some shared locations reject creation with `invalid_file_extension`. In
    /// that case the document is created at the root under the same file name
    /// and moved into place; the reported path is the move destination.
    pub fn create_document(&self, path: &str, content: &[u8], format: ImportFormat) -> Result<DocumentResult> {
        let path = require_path(path)?;
        if content.is_empty() {
            return Err(DropboxError::input("document content is empty"));
        }

        let err = match self.paper_create(&path, content, format) {
            Ok(mut result) => {
                if result.result_path.is_empty() {
                    result.result_path = path;
                }
                return Ok(result);
            }
            Err(err) => err,
        };
        if err.recoverable() != Some(Recoverable::InvalidFileExtension) {
            return Err(err);
        }
        let temp_path = match file_name(&path) {
            Some(name) if format!("/{name}") != path => format!("/{name}"),
            _ => return Err(err),
        };

        info!("create at {path} rejected ({err}); creating at {temp_path} and moving");
        let mut result = self.paper_create(&temp_path, content, format)?;
        let moved = self.move_entry(&temp_path, &path).inspect_err(|e| {
            warn!("moving {temp_path} to {path} failed ({e}); the document was left at {temp_path}");
        })?;
        result.result_path = moved.metadata.path_display.unwrap_or(path);
        Ok(result)
    }

    pub fn update_document(
        &self,
        path: &str,
        content: &[u8],
        format: ImportFormat,
        policy: UpdatePolicy,
        revision: Option<i64>,
    ) -> Result<DocumentResult> {
        let path = require_path(path)?;
        if content.is_empty() {
            return Err(DropboxError::input("document content is empty"));
        }
        if policy == UpdatePolicy::Update && revision.is_none() {
            debug!("update policy without paper_revision; relying on upstream validation");
        }

        let mut arg = json!({
            "path": path,
            "import_format": format.as_api_str(),
            "doc_update_policy": policy.as_api_str(),
        });
        if let Some(rev) = revision {
            arg["paper_revision"] = json!(rev);
        }

        let mut result: DocumentResult = self.upload("files/paper/update", &arg, content.to_vec())?;
        if result.result_path.is_empty() {
            result.result_path = path;
        }
        Ok(result)
    }

    // --- Sharing ---

    pub fn list_shared_links(&self, path: &str) -> Result<ListSharedLinksResult> {
        let path = require_path(path)?;
        self.rpc(
            "sharing/list_shared_links",
            Some(&json!({ "path": path, "direct_only": true })),
        )
    }

    pub fn create_shared_link(&self, path: &str) -> Result<SharedLink> {
        let path = require_path(path)?;
        self.rpc(
            "sharing/create_shared_link_with_settings",
            Some(&json!({
                "path": path,
                "settings": { "requested_visibility": "public" },
            })),
        )
    }

    /// Returns the first existing direct link for `path`, creating a public one
    /// when none exists.
    pub fn get_shared_link(&self, path: &str) -> Result<SharedLink> {
        let listed = self.list_shared_links(path)?;
        if let Some(link) = listed.links.into_iter().next() {
            return Ok(link);
        }

        match self.create_shared_link(path) {
            Ok(link) => Ok(link),
            Err(err) if err.recoverable() == Some(Recoverable::SharedLinkAlreadyExists) => {
                match embedded_link(&err) {
                    Some(link) => {
                        info!("shared link for {path} already existed; using it");
                        Ok(link)
                    }
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}

// --- Response types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tagged {
    #[serde(rename = ".tag")]
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountName {
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub name: AccountName,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub account_type: Option<Tagged>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = ".tag")]
    pub kind: EntryKind,
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub path_lower: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub client_modified: Option<String>,
    #[serde(default)]
    pub server_modified: Option<String>,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub media_info: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    pub fn display_path(&self) -> &str {
        self.path_display
            .as_deref()
            .or(self.path_lower.as_deref())
            .unwrap_or(&self.name)
    }

    pub fn is_paper(&self) -> bool {
        self.kind == EntryKind::File && self.name.to_ascii_lowercase().ends_with(".paper")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFolderResult {
    #[serde(default)]
    pub entries: Vec<Metadata>,
    #[serde(default)]
    pub cursor: String,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatchMetadata {
    #[serde(rename = ".tag")]
    pub tag: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    pub metadata: SearchMatchMetadata,
    #[serde(default)]
    pub match_type: Option<Tagged>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub matches: Vec<SearchMatch>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl SearchResult {
    pub fn entries(&self) -> impl Iterator<Item = &Metadata> {
        self.matches.iter().filter_map(|m| m.metadata.metadata.as_ref())
    }
}

/// Result of a document create or update.
///
/// After a create-then-move recovery `result_path` names the final location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    #[serde(default)]
    pub result_path: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub paper_revision: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResult {
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedLink {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path_lower: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSharedLinksResult {
    #[serde(default)]
    pub links: Vec<SharedLink>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub cursor: Option<String>,
}

// --- Helpers ---

/// Maps `/` and the empty string to the root (`""`), and adds a leading slash
/// to relative paths. Id-style references (`id:..`, `rev:..`, `ns:..`) pass
/// through untouched.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if ["id:", "rev:", "ns:"].iter().any(|p| path.starts_with(p)) {
        return path.to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn require(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DropboxError::input(format!("{what} is required")));
    }
    Ok(value.to_string())
}

fn require_path(path: &str) -> Result<String> {
    let path = normalize_path(path);
    if path.is_empty() {
        return Err(DropboxError::input("path is required and cannot be the root"));
    }
    Ok(path)
}

fn file_name(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|s| !s.is_empty())
}

/// JSON for the argument header. Header values must be ASCII, so everything
/// from 0x7f up is written as `\uXXXX` escapes.
fn api_arg_header(arg: &Value) -> Result<String> {
    let encoded = serde_json::to_string(arg)
        .map_err(|e| DropboxError::input(format!("failed to encode API argument: {e}")))?;
    let mut out = String::with_capacity(encoded.len());
    for c in encoded.chars() {
        if (c as u32) < 0x7f {
            out.push(c);
        } else {
            let mut units = [0_u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    Ok(out)
}

fn parse_error(endpoint: &str, response: &ApiResponse, err: serde_json::Error) -> DropboxError {
    DropboxError::Parse {
        endpoint: endpoint.to_string(),
        status: response.status,
        message: err.to_string(),
        body: response.text(),
    }
}

fn embedded_link(err: &DropboxError) -> Option<SharedLink> {
    let data = err.data()?;
    let metadata = data
        .get("error")?
        .get("shared_link_already_exists")?
        .get("metadata")?
        .clone();
    serde_json::from_value(metadata).ok()
}
