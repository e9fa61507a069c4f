//! Command handlers module.
//!
//! Each handler resolves its path arguments against the session's current
//! directory, confines them to the root in effect, and runs one core
//! operation. Errors become a single reply line carrying the status code of
//! their kind.

use log::info;
use std::path::Path;
use tokio::fs;

use crate::client::Session;
use crate::config::{RootContext, StartupConfig};
use crate::error::{ExplorerError, Result, error_reply};
use crate::multipart::decode_multipart;
use crate::protocol::responses::{
    BAD_REQUEST, GOODBYE, OK, OPENING, PARTIAL, PAYLOAD_TOO_LARGE, TRANSFER_COMPLETE,
    UNKNOWN_COMMAND, format_response,
};
use crate::protocol::{Command, CommandData, CommandResult, CommandStatus};
use crate::relocate::{Relocator, delete};
use crate::storage::{
    ConfinedPath, Listing, confine, list_directory, prepare_file_retrieval, resolve_cwd_path,
    store_uploads,
};

/// Dispatches a received command to its corresponding handler.
pub async fn handle_command(
    session: &mut Session,
    command: &Command,
    root: &RootContext,
    config: &StartupConfig,
) -> CommandResult {
    let outcome = match command {
        Command::Quit => Ok(handle_cmd_quit()),
        Command::Pwd => Ok(handle_cmd_pwd(session)),
        Command::Root(path) => handle_cmd_root(session, path.as_deref(), root).await,
        Command::Cwd(path) => handle_cmd_cwd(session, path, root).await,
        Command::List(path) => handle_cmd_list(session, path.as_deref(), root).await,
        Command::Retr(path) => handle_cmd_retr(session, path, root).await,
        Command::From(path) => handle_cmd_from(session, path, root).await,
        Command::Rnto(path) => handle_cmd_relocate(session, path, root, Relocation::Rename).await,
        Command::Cpto(path) => handle_cmd_relocate(session, path, root, Relocation::Copy).await,
        Command::Mvto(path) => handle_cmd_relocate(session, path, root, Relocation::Move).await,
        Command::Dele(path) => handle_cmd_dele(session, path, root).await,
        Command::Upld {
            length,
            content_type,
        } => Ok(handle_cmd_upld(*length, content_type, config)),
        Command::Invalid(reason) => Ok(CommandResult::failure(
            reason.as_str(),
            format_response(BAD_REQUEST, reason),
        )),
        Command::Unknown(_) => Ok(CommandResult::failure(
            "Unknown command",
            format_response(UNKNOWN_COMMAND, "Unknown command"),
        )),
    };

    outcome.unwrap_or_else(|e| CommandResult::failure(e.to_string(), error_reply(&e)))
}

/// Decodes an upload body received after a `150` reply and stores its files
/// under the session's current directory.
pub async fn handle_upload(
    session: &Session,
    body: &[u8],
    content_type: &str,
    root: &RootContext,
) -> CommandResult {
    let outcome = async {
        let parts = decode_multipart(body, content_type)?;
        let root = root.get().await;
        store_uploads(&root, session.current_dir(), &parts).await
    }
    .await;

    match outcome {
        Ok(report) if report.is_complete() => CommandResult::success(format_response(
            OK,
            &format!(
                "Stored {} file(s) in {}",
                report.stored.len(),
                report.directory
            ),
        )),
        Ok(report) => {
            let failures: Vec<String> = report
                .failed
                .iter()
                .map(|(name, e)| format!("{name} ({e})"))
                .collect();
            CommandResult::failure(
                "Partial upload",
                format_response(
                    PARTIAL,
                    &format!(
                        "Stored {} file(s) in {}; failed: {}",
                        report.stored.len(),
                        report.directory,
                        failures.join(", ")
                    ),
                ),
            )
        }
        Err(e) => CommandResult::failure(e.to_string(), error_reply(&e)),
    }
}

/// Confines a command argument taken relative to the session directory.
async fn confine_arg(session: &Session, arg: &str, root: &RootContext) -> Result<ConfinedPath> {
    let root = root.get().await;
    confine(&root, resolve_cwd_path(session.current_dir(), arg))
}

fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(GOODBYE, "Goodbye")),
        data: None,
    }
}

fn handle_cmd_pwd(session: &Session) -> CommandResult {
    let shown = if session.current_dir().is_empty() {
        "."
    } else {
        session.current_dir()
    };
    CommandResult::success(format_response(OK, shown))
}

/// Shows the root, or replaces it for every connection. Replacing also
/// returns this session to the new root.
async fn handle_cmd_root(
    session: &mut Session,
    path: Option<&str>,
    root: &RootContext,
) -> Result<CommandResult> {
    let Some(path) = path else {
        let current = root.get().await;
        return Ok(CommandResult::success(format_response(
            OK,
            &current.to_string_lossy(),
        )));
    };

    let updated = root.set(path).await?;
    session.set_current_dir(String::new());
    session.set_pending_source(None);
    info!("Root replaced with {}", updated.display());
    Ok(CommandResult::success(format_response(
        OK,
        &format!("Root set to {}", updated.display()),
    )))
}

async fn handle_cmd_cwd(
    session: &mut Session,
    path: &str,
    root: &RootContext,
) -> Result<CommandResult> {
    let target = confine_arg(session, path, root).await?;
    let metadata = fs::metadata(target.as_path())
        .await
        .map_err(|e| ExplorerError::from_io(e, target.display_name()))?;
    if !metadata.is_dir() {
        return Err(ExplorerError::InvalidArgument(format!(
            "{} is not a directory",
            target.display_name()
        )));
    }

    let new_dir = target.relative().to_string_lossy().into_owned();
    session.set_current_dir(new_dir);
    Ok(CommandResult::success(format_response(
        OK,
        &format!("Current directory is {}", target.display_name()),
    )))
}

async fn handle_cmd_list(
    session: &Session,
    path: Option<&str>,
    root: &RootContext,
) -> Result<CommandResult> {
    let target = confine_arg(session, path.unwrap_or(""), root).await?;
    let listing = list_directory(&target).await?;
    Ok(CommandResult::success(listing_reply(&listing)))
}

/// `150` header, one line per entry, then a `226` trailer that counts the
/// entries which could not be inspected.
fn listing_reply(listing: &Listing) -> String {
    let mut message = format_response(
        OPENING,
        &format!(
            "Listing {} ({} entries)",
            listing.path,
            listing.entries.len()
        ),
    );
    for entry in &listing.entries {
        message.push_str(&entry.to_line());
        message.push_str("\r\n");
    }

    let trailer = if listing.skipped.is_empty() {
        "Listing complete".to_string()
    } else {
        format!("Listing complete, {} skipped", listing.skipped.len())
    };
    message.push_str(&format_response(TRANSFER_COMPLETE, &trailer));
    message
}

async fn handle_cmd_retr(session: &Session, path: &str, root: &RootContext) -> Result<CommandResult> {
    let target = confine_arg(session, path, root).await?;
    let (file, size) = prepare_file_retrieval(&target).await?;

    Ok(CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(OPENING, &format!("{size} bytes"))),
        data: Some(CommandData::File { path: file, size }),
    })
}

async fn handle_cmd_from(
    session: &mut Session,
    path: &str,
    root: &RootContext,
) -> Result<CommandResult> {
    let source = confine_arg(session, path, root).await?;
    fs::symlink_metadata(source.as_path())
        .await
        .map_err(|e| ExplorerError::from_io(e, source.display_name()))?;

    let relative = source.relative().to_string_lossy().into_owned();
    session.set_pending_source(Some(relative));
    Ok(CommandResult::success(format_response(
        OK,
        &format!("Source is {}", source.display_name()),
    )))
}

#[derive(Debug, Clone, Copy)]
enum Relocation {
    Rename,
    Copy,
    Move,
}

/// Renames, copies or moves the pending `FROM` source. The pending source
/// is consumed whatever the outcome.
async fn handle_cmd_relocate(
    session: &mut Session,
    path: &str,
    root: &RootContext,
    op: Relocation,
) -> Result<CommandResult> {
    let source = session.take_pending_source().ok_or_else(|| {
        ExplorerError::InvalidArgument("send FROM <path> before relocating".into())
    })?;

    let root_path = root.get().await;
    let source = confine(&root_path, Path::new(&source))?;
    let dest = confine(&root_path, resolve_cwd_path(session.current_dir(), path))?;

    let relocator = Relocator::new();
    let (verb, landed) = match op {
        Relocation::Rename => ("Renamed", relocator.rename(&source, &dest).await?),
        Relocation::Copy => ("Copied", relocator.copy(&source, &dest).await?),
        Relocation::Move => ("Moved", relocator.move_entry(&source, &dest).await?),
    };

    Ok(CommandResult::success(format_response(
        OK,
        &format!(
            "{} {} to {}",
            verb,
            source.display_name(),
            landed.display_name()
        ),
    )))
}

async fn handle_cmd_dele(session: &Session, path: &str, root: &RootContext) -> Result<CommandResult> {
    let root_path = root.get().await;
    let target = confine(&root_path, resolve_cwd_path(session.current_dir(), path))?;
    delete(&root_path, &target, session.current_dir()).await?;

    Ok(CommandResult::success(format_response(
        OK,
        &format!("Deleted {}", target.display_name()),
    )))
}

/// Accepts or refuses an upload announcement before any body byte is read.
fn handle_cmd_upld(length: u64, content_type: &str, config: &StartupConfig) -> CommandResult {
    if length > config.max_upload_size_bytes() {
        return CommandResult::failure(
            "Upload too large",
            format_response(
                PAYLOAD_TOO_LARGE,
                &format!(
                    "Upload exceeds {} MB",
                    config.max_upload_size_mb
                ),
            ),
        );
    }

    CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(OPENING, &format!("Ready for {length} bytes"))),
        data: Some(CommandData::AwaitUpload {
            length,
            content_type: content_type.to_string(),
        }),
    }
}
