use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use quotenote_core::config::BootstrapConfig;
use quotenote_core::db::{KeyValueStore, LibSqlKeyValueStore};
use quotenote_core::models::parse_tag_list;
use quotenote_core::storage::{
    LocalAdapter, QuoteCollection, RemoteAdapter, SupabaseQuoteCollection,
};
use quotenote_core::{AuthState, Quote, QuoteId, QuoteStore, StorageRouter};
use serde::Serialize;

use crate::auth::{AuthSession, SupabaseAuthService};
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub const DB_PATH_ENV: &str = "QUOTENOTE_DB_PATH";
const SHORT_ID_LEN: usize = 13;

/// Storage router plus the auth facts every quote command runs under
pub struct QuoteContext<K, C> {
    pub router: StorageRouter<K, C>,
    pub auth: AuthState,
}

impl<K: KeyValueStore, C: QuoteCollection> QuoteContext<K, C> {
    pub const fn new(router: StorageRouter<K, C>, auth: AuthState) -> Self {
        Self { router, auth }
    }

    pub async fn load(&self) -> QuoteStore {
        self.router.load(&self.auth).await
    }
}

pub type CliContext = QuoteContext<LibSqlKeyValueStore, SupabaseQuoteCollection>;

#[derive(Debug, Serialize)]
pub struct QuoteListItem {
    pub id: String,
    pub text: String,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub relative_time: String,
}

/// Open device storage and, when signed in, the cloud collection for `profile`
pub async fn open_context(db_path: &Path, profile: Option<&str>) -> Result<CliContext, CliError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let local = LocalAdapter::new(LibSqlKeyValueStore::open(db_path).await?);

    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile);
    let bootstrap = config.bootstrap_config(&profile_name);

    let Some(session) = restore_session(&profile_name, &bootstrap).await else {
        return Ok(QuoteContext::new(
            StorageRouter::new(local, RemoteAdapter::not_configured()),
            AuthState::Anonymous,
        ));
    };

    let remote = match bootstrap.supabase_credentials() {
        Some((url, anon_key)) => RemoteAdapter::new(SupabaseQuoteCollection::new(
            url,
            anon_key,
            session.access_token.clone(),
        )?),
        None => RemoteAdapter::not_configured(),
    };
    tracing::debug!("Using cloud storage for profile '{}'", profile_name);
    Ok(QuoteContext::new(
        StorageRouter::new(local, remote),
        session.auth_state(),
    ))
}

/// Signed-in session for the profile; auth problems degrade to anonymous use
async fn restore_session(profile_name: &str, config: &BootstrapConfig) -> Option<AuthSession> {
    let service = match SupabaseAuthService::new_for_config(profile_name, config) {
        Ok(Some(service)) => service,
        Ok(None) => return None,
        Err(error) => {
            tracing::warn!("Cloud auth unavailable: {}", error);
            return None;
        }
    };

    match service.restore_session().await {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!("Failed to restore session for '{}': {}", profile_name, error);
            None
        }
    }
}

/// Find a quote by exact id or unique id prefix
pub fn resolve_quote<'a>(store: &'a QuoteStore, query: &str) -> Result<&'a Quote, CliError> {
    let query = normalize_quote_identifier(query)?;
    if let Some(quote) = store.find(&QuoteId::from(query.as_str())) {
        return Ok(quote);
    }

    let matches = store
        .quotes
        .iter()
        .filter(|quote| quote.id.as_str().starts_with(&query))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(CliError::QuoteNotFound(query)),
        [quote] => Ok(*quote),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|quote| short_id(&quote.id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousQuoteId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &QuoteId) -> String {
    id.as_str().chars().take(SHORT_ID_LEN).collect()
}

pub fn format_quote_lines(quotes: &[&Quote]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    quotes
        .iter()
        .map(|quote| {
            let id = short_id(&quote.id);
            let preview = quote_preview(&quote.text, 40);
            let author = quote.author.as_deref().unwrap_or("-");
            let author = quote_preview(author, 20);
            let relative_time = format_relative_time(quote.created_at, now_ms);
            let tags = render_tags(&quote.tags);

            if tags.is_empty() {
                format!("{id:<13}  {preview:<40}  {author:<20}  {relative_time}")
            } else {
                format!("{id:<13}  {preview:<40}  {author:<20}  {relative_time:<10}  {tags}")
            }
        })
        .collect()
}

/// Multi-line rendering used by `show` and `random`
pub fn render_quote(quote: &Quote) -> String {
    let mut lines = vec![format!("\"{}\"", quote.text)];
    if let Some(author) = quote.author.as_deref() {
        lines.push(format!("    - {author}"));
    }
    if !quote.tags.is_empty() {
        lines.push(render_tags(&quote.tags));
    }

    let mut meta = format!("{}  added {}", quote.id, format_timestamp(quote.created_at));
    if let Some(updated_at) = quote.updated_at {
        meta.push_str(&format!(", edited {}", format_timestamp(updated_at)));
    }
    lines.push(meta);
    lines.join("\n")
}

pub fn quote_to_list_item(quote: &Quote) -> QuoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    QuoteListItem {
        id: quote.id.to_string(),
        text: quote.text.clone(),
        author: quote.author.clone(),
        tags: quote.tags.clone(),
        created_at: quote.created_at,
        updated_at: quote.updated_at,
        relative_time: format_relative_time(quote.created_at, now_ms),
    }
}

pub fn quote_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn render_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Tags from an optional comma-separated flag value
pub fn parse_tags_flag(raw: Option<&str>) -> Vec<String> {
    raw.map(parse_tag_list).unwrap_or_default()
}

/// Quote text from arguments, then piped stdin, then `$EDITOR`
pub fn resolve_quote_text(text_parts: &[String]) -> Result<String, CliError> {
    if let Some(text) = normalize_content(&text_parts.join(" ")) {
        return Ok(text);
    }

    if let Some(text) = read_piped_stdin()? {
        return Ok(text);
    }

    if let Some(text) = capture_editor_input()? {
        return Ok(text);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_quote_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyQuoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input() -> Result<Option<String>, CliError> {
    capture_editor_input_with_initial("")
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_quote_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_quote_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("quotenote-{}-{now}.txt", std::process::id()))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotenote")
        .join("quotenote.db")
}
