use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use pretty_assertions::assert_eq;
use quotenote_core::config::BootstrapConfig;
use quotenote_core::db::{LibSqlKeyValueStore, MemoryKeyValueStore};
use quotenote_core::storage::{
    LocalAdapter, MemoryQuoteCollection, QuoteCollection, QuoteDocument, RemoteAdapter,
};
use quotenote_core::{AuthState, Quote, QuoteId, QuoteInput, QuoteStore, StorageRouter};

use crate::cli::{CompletionShell, InterfaceMode};
use crate::commands::add::add_quote;
use crate::commands::common::{
    default_editor, format_relative_time, format_timestamp, normalize_content,
    normalize_quote_identifier, parse_tags_flag, quote_preview, render_quote, resolve_quote,
    QuoteContext,
};
use crate::commands::completions::run_completions;
use crate::commands::config::{
    merge_profile_sources, missing_profile_fields, normalize_bootstrap_url, resolve_bootstrap_url,
};
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, QuoteEdits};
use crate::commands::interface::{interface_label, run_interface};
use crate::commands::migrate::{migrate_local_quotes, run_migrate};
use crate::commands::tags::format_tag_lines;
use crate::config_profiles::CliProfile;
use crate::error::CliError;

type MemoryContext = QuoteContext<MemoryKeyValueStore, MemoryQuoteCollection>;

fn memory_context(
    kv: &MemoryKeyValueStore,
    collection: &MemoryQuoteCollection,
    auth: AuthState,
) -> MemoryContext {
    QuoteContext::new(
        StorageRouter::new(
            LocalAdapter::new(kv.clone()),
            RemoteAdapter::new(collection.clone()),
        ),
        auth,
    )
}

fn anonymous_context() -> MemoryContext {
    memory_context(
        &MemoryKeyValueStore::new(),
        &MemoryQuoteCollection::new(),
        AuthState::Anonymous,
    )
}

fn input(text: &str, author: Option<&str>, tags: &[&str]) -> QuoteInput {
    QuoteInput::new(
        text,
        author.map(str::to_string),
        tags.iter().map(|tag| (*tag).to_string()),
    )
    .unwrap()
}

fn quote_with_id(id: &str, text: &str) -> Quote {
    Quote {
        id: QuoteId::from(id),
        text: text.to_string(),
        author: None,
        tags: Vec::new(),
        created_at: 1_700_000_000_000,
        updated_at: None,
        user_id: None,
    }
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn normalize_quote_identifier_rejects_empty() {
    assert!(matches!(
        normalize_quote_identifier("   "),
        Err(CliError::EmptyQuoteId)
    ));
    assert_eq!(normalize_quote_identifier(" abc ").unwrap(), "abc");
}

#[test]
fn parse_tags_flag_splits_and_drops_blanks() {
    assert_eq!(
        parse_tags_flag(Some(" wisdom, ,life ")),
        vec!["wisdom".to_string(), "life".to_string()]
    );
    assert!(parse_tags_flag(None).is_empty());
}

#[test]
fn normalize_bootstrap_url_requires_http_scheme() {
    assert!(normalize_bootstrap_url("https://api.example.com/v1/bootstrap".to_string()).is_ok());
    assert!(normalize_bootstrap_url("api.example.com/v1/bootstrap".to_string()).is_err());
    assert_eq!(
        normalize_bootstrap_url(" https://api.example.com/bootstrap/ ".to_string()).unwrap(),
        "https://api.example.com/bootstrap"
    );
}

#[test]
fn resolve_bootstrap_url_prefers_explicit_manifest_url() {
    let resolved = resolve_bootstrap_url(
        Some("https://api.example.com/v1/bootstrap".to_string()),
        Some("https://ignored.example.com".to_string()),
    )
    .unwrap();
    assert_eq!(
        resolved.as_deref(),
        Some("https://api.example.com/v1/bootstrap")
    );
}

#[test]
fn merge_profile_sources_prefers_explicit_then_manifest() {
    let explicit = BootstrapConfig {
        supabase_url: Some("https://explicit.supabase.co".to_string()),
        ..Default::default()
    };
    let manifest = BootstrapConfig {
        supabase_url: Some("https://manifest.supabase.co".to_string()),
        supabase_anon_key: Some("manifest-anon".to_string()),
        ..Default::default()
    };

    let merged = merge_profile_sources(explicit, manifest, &CliProfile::default());
    assert_eq!(
        merged.supabase_credentials(),
        Some((
            "https://explicit.supabase.co".to_string(),
            "manifest-anon".to_string()
        ))
    );
}

#[test]
fn missing_profile_fields_lists_absent_credentials() {
    let mut profile = CliProfile::default();
    assert_eq!(
        missing_profile_fields(&profile),
        vec!["supabase_url", "supabase_anon_key"]
    );

    profile.supabase_url = Some("https://demo.supabase.co".to_string());
    profile.supabase_anon_key = Some("anon".to_string());
    assert!(missing_profile_fields(&profile).is_empty());
}

#[test]
fn format_relative_time_units() {
    let now = 1_700_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 5 * 60_000, now), "5m ago");
    assert_eq!(format_relative_time(now - 3 * 60 * 60_000, now), "3h ago");
    assert_eq!(format_relative_time(now - 2 * 24 * 60 * 60_000, now), "2d ago");
}

#[test]
fn quote_preview_truncates_with_ellipsis() {
    let preview = quote_preview("This is a very long quote that keeps going", 12);
    assert_eq!(preview, "This is a...");
    assert_eq!(quote_preview("first\nsecond", 40), "first");
}

#[test]
fn format_timestamp_returns_utc_label() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00 UTC");
}

#[test]
fn render_quote_includes_author_and_tags() {
    let mut quote = quote_with_id("q-1", "Stay hungry.");
    quote.author = Some("Steve Jobs".to_string());
    quote.tags = vec!["life".to_string(), "work".to_string()];

    let rendered = render_quote(&quote);
    assert!(rendered.starts_with("\"Stay hungry.\""));
    assert!(rendered.contains("    - Steve Jobs"));
    assert!(rendered.contains("#life #work"));
    assert!(rendered.contains("q-1  added"));
}

#[test]
fn resolve_quote_supports_exact_and_prefix_id() {
    let store = QuoteStore::from_quotes(vec![
        quote_with_id("0190aaaa-1111", "first"),
        quote_with_id("0190bbbb-2222", "second"),
    ]);

    assert_eq!(resolve_quote(&store, "0190aaaa-1111").unwrap().text, "first");
    assert_eq!(resolve_quote(&store, " 0190bb ").unwrap().text, "second");
}

#[test]
fn resolve_quote_rejects_ambiguous_prefix() {
    let store = QuoteStore::from_quotes(vec![
        quote_with_id("0190aaaa-1111", "first"),
        quote_with_id("0190bbbb-2222", "second"),
    ]);

    let error = resolve_quote(&store, "0190").unwrap_err();
    assert!(matches!(error, CliError::AmbiguousQuoteId(_)));
    assert!(error.to_string().contains("ambiguous"));
}

#[test]
fn resolve_quote_rejects_missing_quote() {
    let store = QuoteStore::from_quotes(vec![quote_with_id("0190aaaa-1111", "first")]);
    assert!(matches!(
        resolve_quote(&store, "ffff"),
        Err(CliError::QuoteNotFound(query)) if query == "ffff"
    ));
}

#[test]
fn quote_edits_keep_unchanged_fields() {
    let mut quote = quote_with_id("q-1", "Original");
    quote.author = Some("Someone".to_string());
    quote.tags = vec!["old".to_string()];

    let edits = QuoteEdits {
        text: Some("Updated".to_string()),
        ..Default::default()
    };
    assert_eq!(
        edits.apply_to(&quote).unwrap(),
        input("Updated", Some("Someone"), &["old"])
    );
}

#[test]
fn quote_edits_clear_author_and_tags_with_empty_values() {
    let mut quote = quote_with_id("q-1", "Original");
    quote.author = Some("Someone".to_string());
    quote.tags = vec!["old".to_string()];

    let edits = QuoteEdits {
        author: Some(String::new()),
        tags: Some(String::new()),
        ..Default::default()
    };
    assert_eq!(edits.apply_to(&quote).unwrap(), input("Original", None, &[]));

    let blank = QuoteEdits {
        text: Some("   ".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        blank.apply_to(&quote),
        Err(CliError::EmptyEditedContent)
    ));
}

#[test]
fn format_tag_lines_counts_quotes_per_tag() {
    let mut first = quote_with_id("q-1", "one");
    first.tags = vec!["life".to_string(), "work".to_string()];
    let mut second = quote_with_id("q-2", "two");
    second.tags = vec!["life".to_string()];
    let store = QuoteStore::from_quotes(vec![first, second]);

    assert_eq!(
        format_tag_lines(&store),
        vec!["#life (2)".to_string(), "#work (1)".to_string()]
    );
}

#[test]
fn interface_mode_maps_to_flag() {
    assert!(InterfaceMode::Quotes.is_forced());
    assert!(!InterfaceMode::Landing.is_forced());
    assert_eq!(interface_label(InterfaceMode::from_flag(true)), "quotes");
    assert_eq!(interface_label(InterfaceMode::from_flag(false)), "landing");
}

#[tokio::test(flavor = "multi_thread")]
async fn add_quote_returns_stored_quote_on_device() {
    let ctx = anonymous_context();

    let quote = add_quote(&ctx, input("Be bold.", Some("Anon"), &["courage"]))
        .await
        .unwrap();

    let store = ctx.load().await;
    assert_eq!(store.find(&quote.id), Some(&quote));
    assert_eq!(store.tags, vec!["courage".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn add_quote_uses_cloud_id_when_signed_in() {
    let kv = MemoryKeyValueStore::new();
    let collection = MemoryQuoteCollection::new();
    let ctx = memory_context(&kv, &collection, AuthState::user("alice"));

    let quote = add_quote(&ctx, input("Cloud quote", None, &[]))
        .await
        .unwrap();

    let documents = collection.documents().await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id, quote.id.as_str());
    assert!(!ctx.router.has_local_quotes().await);
}

/// Collection where another device saves a quote right after every insert
#[derive(Clone, Default)]
struct BusyCollection {
    inner: MemoryQuoteCollection,
}

impl QuoteCollection for BusyCollection {
    async fn list_for_user(&self, user_id: &str) -> quotenote_core::Result<Vec<QuoteDocument>> {
        self.inner.list_for_user(user_id).await
    }

    async fn insert(
        &self,
        user_id: &str,
        input: &QuoteInput,
    ) -> quotenote_core::Result<QuoteDocument> {
        let document = self.inner.insert(user_id, input).await?;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let other = QuoteInput::new("From another device", None, Vec::<String>::new())?;
        self.inner.insert(user_id, &other).await?;
        Ok(document)
    }

    async fn update(
        &self,
        user_id: &str,
        id: &QuoteId,
        input: &QuoteInput,
    ) -> quotenote_core::Result<Option<QuoteDocument>> {
        self.inner.update(user_id, id, input).await
    }

    async fn delete(&self, user_id: &str, id: &QuoteId) -> quotenote_core::Result<bool> {
        self.inner.delete(user_id, id).await
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn add_quote_returns_own_quote_when_another_device_writes() {
    let ctx = QuoteContext::new(
        StorageRouter::new(
            LocalAdapter::new(MemoryKeyValueStore::new()),
            RemoteAdapter::new(BusyCollection::default()),
        ),
        AuthState::user("alice"),
    );

    let quote = add_quote(&ctx, input("Mine", None, &[])).await.unwrap();

    assert_eq!(quote.text, "Mine");
    assert_eq!(ctx.load().await.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_delete_removes_quote_by_prefix() {
    let ctx = anonymous_context();
    let keep = add_quote(&ctx, input("keep", None, &["a"])).await.unwrap();
    let drop = add_quote(&ctx, input("drop", None, &["b"])).await.unwrap();

    run_delete(&ctx, drop.id.as_str()).await.unwrap();

    let store = ctx.load().await;
    assert!(store.find(&drop.id).is_none());
    assert!(store.find(&keep.id).is_some());
    assert_eq!(store.tags, vec!["a".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_delete_rejects_unknown_quote() {
    let ctx = anonymous_context();
    add_quote(&ctx, input("only", None, &[])).await.unwrap();

    assert!(matches!(
        run_delete(&ctx, "no-such-id").await,
        Err(CliError::QuoteNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn run_edit_applies_flag_edits() {
    let ctx = anonymous_context();
    let quote = add_quote(&ctx, input("Draft", Some("Me"), &["old"]))
        .await
        .unwrap();

    run_edit(
        &ctx,
        quote.id.as_str(),
        QuoteEdits {
            text: Some("Final".to_string()),
            tags: Some("new, shiny".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let store = ctx.load().await;
    let edited = store.find(&quote.id).unwrap();
    assert_eq!(edited.text, "Final");
    assert_eq!(edited.author.as_deref(), Some("Me"));
    assert_eq!(edited.created_at, quote.created_at);
    assert!(edited.updated_at.is_some());
    assert_eq!(store.tags, vec!["new".to_string(), "shiny".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_interface_persists_forced_mode_on_device() {
    let kv = MemoryKeyValueStore::new();
    let collection = MemoryQuoteCollection::new();
    let ctx = memory_context(&kv, &collection, AuthState::Anonymous);

    run_interface(&ctx, Some(InterfaceMode::Quotes)).await.unwrap();
    assert!(ctx.load().await.force_quotes_interface);

    run_interface(&ctx, Some(InterfaceMode::Landing)).await.unwrap();
    assert!(!ctx.load().await.force_quotes_interface);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_migrate_requires_sign_in() {
    let ctx = anonymous_context();
    assert!(matches!(
        run_migrate(&ctx).await,
        Err(CliError::NotSignedIn)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn migrate_local_quotes_copies_once() {
    let kv = MemoryKeyValueStore::new();
    let collection = MemoryQuoteCollection::new();
    let offline_ctx = memory_context(&kv, &collection, AuthState::Anonymous);
    add_quote(&offline_ctx, input("Be bold.", None, &["courage"]))
        .await
        .unwrap();

    let signed_in = memory_context(&kv, &collection, AuthState::user("alice"));
    assert_eq!(
        migrate_local_quotes(&signed_in).await,
        "Copied quotes from this device to your cloud collection."
    );
    assert_eq!(
        migrate_local_quotes(&signed_in).await,
        "Nothing was copied; your cloud collection already has these quotes."
    );

    let cloud = signed_in.load().await;
    assert_eq!(cloud.len(), 1);
    assert_eq!(cloud.quotes[0].text, "Be bold.");
}

#[tokio::test(flavor = "multi_thread")]
async fn migrate_local_quotes_reports_quotes_left_behind() {
    let kv = MemoryKeyValueStore::new();
    let collection = MemoryQuoteCollection::new();
    let offline_ctx = memory_context(&kv, &collection, AuthState::Anonymous);
    add_quote(&offline_ctx, input("First", None, &[]))
        .await
        .unwrap();
    add_quote(&offline_ctx, input("Second", None, &[]))
        .await
        .unwrap();

    let signed_in = memory_context(&kv, &collection, AuthState::user("alice"));
    collection.reject_next_inserts(1);
    assert_eq!(
        migrate_local_quotes(&signed_in).await,
        "Copied 1 of 2 quotes; 1 could not be uploaded and remain only on this device."
    );

    assert_eq!(
        migrate_local_quotes(&signed_in).await,
        "Copied quotes from this device to your cloud collection."
    );
    assert_eq!(signed_in.load().await.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn migrate_local_quotes_reports_empty_device() {
    let ctx = memory_context(
        &MemoryKeyValueStore::new(),
        &MemoryQuoteCollection::new(),
        AuthState::user("alice"),
    );
    assert_eq!(
        migrate_local_quotes(&ctx).await,
        "No quotes on this device to copy."
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn quotes_survive_reopening_database_file() {
    let db_path = unique_test_db_path();

    let saved = {
        let ctx: MemoryBackedFileContext = file_context(&db_path).await;
        add_quote(&ctx, input("Persist me", Some("Disk"), &["io"]))
            .await
            .unwrap()
    };

    let reopened = file_context(&db_path).await;
    let store = reopened.load().await;
    assert_eq!(store.find(&saved.id), Some(&saved));
    assert_eq!(store.tags, vec!["io".to_string()]);

    cleanup_db_files(&db_path);
}

#[test]
fn run_completions_writes_bash_script_file() {
    let output_path = std::env::temp_dir().join(format!(
        "quotenote-completions-test-{}.bash",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos())
    ));

    run_completions(CompletionShell::Bash, Some(&output_path)).unwrap();

    let script = std::fs::read_to_string(&output_path).unwrap();
    assert!(script.contains("_quotenote()"));
    assert!(script.contains("complete -F _quotenote"));

    let _ = std::fs::remove_file(output_path);
}

type MemoryBackedFileContext = QuoteContext<LibSqlKeyValueStore, MemoryQuoteCollection>;

async fn file_context(path: &PathBuf) -> MemoryBackedFileContext {
    QuoteContext::new(
        StorageRouter::new(
            LocalAdapter::new(LibSqlKeyValueStore::open(path).await.unwrap()),
            RemoteAdapter::not_configured(),
        ),
        AuthState::Anonymous,
    )
}

fn unique_test_db_path() -> PathBuf {
    static NEXT_TEST_DB_ID: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let sequence = NEXT_TEST_DB_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("quotenote-cli-test-{timestamp}-{sequence}.db"))
}

fn cleanup_db_files(path: &PathBuf) {
    // On Windows, libsql can keep file handles alive briefly after drop.
    if cfg!(windows) {
        return;
    }

    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
}
