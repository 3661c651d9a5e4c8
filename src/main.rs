use anyhow::{Result, anyhow};
use clap::Parser;
use lecturecam::lecturecam_core::calendar::{
    DateRange, DirectoryCalendar, EventChanges, NewEvent, RemoteBackend, UnifiedEvent,
    delete_event, edit_event, sync,
};
use lecturecam::lecturecam_core::classify::{classify, matching_event, resolve_folder_name};
use lecturecam::lecturecam_core::dates::{
    format_display, get_current_time, get_local_tz, parse_day_span, parse_iso,
};
use lecturecam::lecturecam_core::organizer::{
    self, DeleteOutcome, MoveOutcome, SaveOptions,
};
use lecturecam::lecturecam_core::output::{format_events, format_hits, format_photos};
use lecturecam::lecturecam_core::search::search;
use lecturecam::lecturecam_core::settings::{self, AuthSession};
use lecturecam::lecturecam_core::sidecar::{read_metadata_or_default, sidecar_path_for};
use lecturecam::lecturecam_core::{
    Cli, Commands, LecturecamError, Library, native_calendar, remote_backend,
};
use simplelog::{CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, WriteLogger};
use std::fs::File;

/// Fail unless the folder is present on disk.
fn require_folder(lib: &Library, folder: &str) -> Result<()> {
    if !lib.folder_dir(folder).is_dir() {
        return Err(LecturecamError::FolderNotFound(folder.to_string()).into());
    }
    Ok(())
}

/// Look up an app-owned event for editing or deletion.
fn stored_event(lib: &Library, id: &str) -> Result<UnifiedEvent> {
    lib.local_events().get(id).ok_or_else(|| {
        if id.starts_with("native_") {
            anyhow!("'{}' belongs to the device calendar and cannot be changed here", id)
        } else {
            anyhow!("No event with id '{}'", id)
        }
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize loggers
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )];

    if cli.log {
        loggers.push(WriteLogger::new(
            cli.log_level,
            Config::default(),
            File::create("lecturecam.log")?,
        ));
    }

    CombinedLogger::init(loggers)?;

    let native = native_calendar(cli.calendar_dir.as_deref());
    let http_backend = remote_backend(cli.backend.as_deref());
    let backend: Option<&dyn RemoteBackend> =
        http_backend.as_ref().map(|b| b as &dyn RemoteBackend);
    let no_backend = || {
        anyhow!("No calendar backend configured; pass --backend or set LECTURECAM_BACKEND")
    };

    match cli.command {
        Commands::Create { library_dir } => {
            Library::create(&library_dir)?;
            println!("Created library at {}", library_dir.display());
            println!("  photos/  - one folder per class");
        }

        Commands::Folders { library_dir } => {
            let lib = Library::open(&library_dir)?;
            let folders = lib.folders()?;
            if folders.is_empty() {
                println!("No folders yet");
            }
            for folder in folders {
                println!("{}", folder);
            }
            if !settings::is_onboarded(lib.database()) {
                eprintln!(
                    "Tip: choose the calendars that feed your schedule with `lecturecam calendars {} --select <ids>`",
                    library_dir.display()
                );
            }
        }

        Commands::CreateFolder { library_dir, name } => {
            let lib = Library::open(&library_dir)?;
            let name = organizer::create_folder(&lib, &name)?;
            println!("Created folder '{}'", name);
        }

        Commands::RenameFolder {
            library_dir,
            old_name,
            new_name,
        } => {
            let lib = Library::open(&library_dir)?;
            organizer::rename_folder(&lib, &old_name, &new_name)?;
            println!("Renamed '{}' to '{}'", old_name, new_name.trim());
        }

        Commands::Sessions {
            library_dir,
            folder,
        } => {
            let lib = Library::open(&library_dir)?;
            require_folder(&lib, &folder)?;
            for session in lib.sessions(&folder)? {
                println!("{}", session);
            }
        }

        Commands::List {
            library_dir,
            folder,
            session,
            output,
        } => {
            let lib = Library::open(&library_dir)?;
            require_folder(&lib, &folder)?;
            let records = lib.photos_in(&folder, session.as_deref())?;
            println!("{}", format_photos(&records, &output));
        }

        Commands::Capture {
            library_dir,
            image,
            time,
            folder,
            session,
            name,
            note,
            subject,
        } => {
            let lib = Library::open(&library_dir)?;
            let sources = lib.event_sources(&*native, backend);
            let options = SaveOptions {
                time: time.as_deref().map(parse_iso).transpose()?,
                folder,
                session,
                name,
                note,
                subject,
            };
            let saved = organizer::save_photo(&lib, &sources, &image, options)?;
            println!(
                "Saved {} to '{}' (session {})",
                saved.photo.file_name(),
                saved.photo.folder,
                saved.metadata.session
            );
        }

        Commands::Move {
            library_dir,
            folder,
            file,
            target_folder,
            session,
        } => {
            let lib = Library::open(&library_dir)?;
            let photo = lib.photo(&folder, &file)?;
            let session = session.unwrap_or_else(|| {
                read_metadata_or_default(&sidecar_path_for(&photo.image_path)).session
            });
            match organizer::move_photo(&lib, &photo, &target_folder, &session)? {
                MoveOutcome::NoChange => {
                    println!("{} is already in '{}' ({})", file, folder, session);
                }
                MoveOutcome::Moved(moved) => {
                    println!("Moved {} to '{}' ({})", file, moved.folder, session);
                }
            }
        }

        Commands::Note {
            library_dir,
            folder,
            file,
            note,
        } => {
            let lib = Library::open(&library_dir)?;
            let photo = lib.photo(&folder, &file)?;
            organizer::update_note(&lib, &photo, &note)?;
            println!("Saved note for {}", file);
        }

        Commands::Delete {
            library_dir,
            folder,
            file,
        } => {
            let lib = Library::open(&library_dir)?;
            let photo = lib.photo(&folder, &file)?;
            let mut view = lib.photos_in(&folder, None)?;
            if !view.iter().any(|r| r.uri == photo.uri()) {
                // cached before the file appeared
                lib.cache().clear(&folder)?;
                view = lib.photos_in(&folder, None)?;
            }
            let index = view
                .iter()
                .position(|r| r.uri == photo.uri())
                .ok_or_else(|| anyhow!("{} is not listed in '{}'", file, folder))?;

            match organizer::delete_photo(&lib, &view, index)? {
                DeleteOutcome::NavigateAway => {
                    println!("Deleted {}. No photos left in '{}'", file, folder);
                }
                DeleteOutcome::Advance { index, remaining } => {
                    println!("Deleted {}. Next: {}", file, remaining[index].name);
                }
            }
        }

        Commands::Refresh { library_dir } => {
            let lib = Library::open(&library_dir)?;
            let cleared = lib.cache().clear_all()?;
            println!("Cleared {} cached folder listing(s)", cleared);
        }

        Commands::Search {
            library_dir,
            query,
            folder,
            output,
        } => {
            let lib = Library::open(&library_dir)?;
            if let Some(folder) = folder.as_deref() {
                require_folder(&lib, folder)?;
            }
            let hits = search(&lib, &query, folder.as_deref())?;
            println!("{}", format_hits(&hits, &output));
        }

        Commands::Classify { library_dir, time } => {
            let lib = Library::open(&library_dir)?;
            let at = match time {
                Some(time) => parse_iso(&time)?,
                None => get_current_time(),
            };
            let sources = lib.event_sources(&*native, backend);
            let events = sources.load(&DateRange::day_of(&at));
            let folder = resolve_folder_name(&classify(&at, &events), &lib.folders()?);
            match matching_event(&at, &events) {
                Some(event) => println!(
                    "{} ({} {} - {})",
                    folder,
                    event.source,
                    format_display(&event.start_date),
                    format_display(&event.end_date)
                ),
                None => println!("{}", folder),
            }
        }

        Commands::Organize { library_dir } => {
            let lib = Library::open(&library_dir)?;
            let sources = lib.event_sources(&*native, backend);
            let report = organizer::organize_unorganized(&lib, &sources)?;

            println!("\nOrganize complete!");
            println!("  {} photos examined", report.examined);
            println!("  {} photos filed", report.moved);
            if report.unmatched > 0 {
                println!("  {} still unorganized", report.unmatched);
            }
            if report.failed > 0 {
                println!("  {} failed (see log)", report.failed);
            }
        }

        Commands::Schedule {
            library_dir,
            date,
            output,
        } => {
            let lib = Library::open(&library_dir)?;
            let (first, last) = match date {
                Some(date) => parse_day_span(&date)?,
                None => {
                    let today = get_current_time().date();
                    (today, today)
                }
            };
            let range = DateRange::for_days(first, last, get_local_tz())?;
            let sources = lib.event_sources(&*native, backend);
            let events = sources.load(&range);
            println!("{}", format_events(&events, &output));
        }

        Commands::AddEvent {
            library_dir,
            title,
            start,
            end,
            location,
            notes,
        } => {
            let lib = Library::open(&library_dir)?;
            let range = DateRange::new(parse_iso(&start)?, parse_iso(&end)?)?;
            let event = lib.local_events().add(NewEvent {
                title,
                start_date: range.start,
                end_date: range.end,
                location,
                notes,
            })?;
            println!("Added event {}", event.id);
        }

        Commands::EditEvent {
            library_dir,
            id,
            title,
            start,
            end,
            location,
            notes,
        } => {
            let lib = Library::open(&library_dir)?;
            let event = stored_event(&lib, &id)?;
            let changes = EventChanges {
                title,
                start_date: start.as_deref().map(parse_iso).transpose()?,
                end_date: end.as_deref().map(parse_iso).transpose()?,
                location,
                notes,
            };
            let session = settings::auth_session(lib.database());
            let remote = backend.zip(session.as_ref().map(|s| s.token.as_str()));
            let updated = edit_event(&lib.local_events(), remote, &event, changes)?;
            println!("Updated event {}", updated.id);
        }

        Commands::DeleteEvent { library_dir, id } => {
            let lib = Library::open(&library_dir)?;
            let event = stored_event(&lib, &id)?;
            let session = settings::auth_session(lib.database());
            let remote = backend.zip(session.as_ref().map(|s| s.token.as_str()));
            delete_event(&lib.local_events(), remote, &event)?;
            println!("Deleted event {}", id);
        }

        Commands::Calendars {
            library_dir,
            select,
        } => {
            let lib = Library::open(&library_dir)?;
            let db = lib.database();

            if let Some(ids) = select {
                let ids: Vec<String> = ids
                    .into_iter()
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .collect();
                settings::set_calendar_ids(db, &ids)?;
                settings::mark_onboarded(db)?;
                println!("Using {} calendar(s)", ids.len());
                return Ok(());
            }

            let selected = settings::calendar_ids(db);
            match cli.calendar_dir.as_deref() {
                Some(dir) => {
                    for id in DirectoryCalendar::new(dir).calendar_ids()? {
                        let mark = if selected.contains(&id) { "*" } else { " " };
                        println!("{} {}", mark, id);
                    }
                }
                None => {
                    for id in &selected {
                        println!("* {}", id);
                    }
                    eprintln!("No calendar directory configured; pass --calendar-dir to list available calendars");
                }
            }
        }

        Commands::Login {
            library_dir,
            username,
            password,
        } => {
            let lib = Library::open(&library_dir)?;
            let backend = backend.ok_or_else(no_backend)?;
            let session = backend.login(&username, &password)?;
            settings::save_auth_session(lib.database(), &session)?;
            println!("Logged in as {}", session.username);
        }

        Commands::Logout { library_dir } => {
            let lib = Library::open(&library_dir)?;
            settings::clear_auth_session(lib.database())?;
            println!("Logged out");
        }

        Commands::Sync { library_dir } => {
            let lib = Library::open(&library_dir)?;
            let backend = backend.ok_or_else(no_backend)?;
            let AuthSession { token, username } = settings::auth_session(lib.database())
                .ok_or(LecturecamError::NotAuthenticated)?;

            let report = sync(&lib.local_events(), backend, &token)?;
            println!("\nSync complete for {}!", username);
            println!("  {} events pushed", report.pushed);
            println!("  {} backend events refreshed", report.refreshed);
            if report.failed > 0 {
                println!("  {} events still pending", report.failed);
            }
        }
    }

    Ok(())
}
